//! Bookmark commands - add, update, remove and flag toggles.

use crate::app::App;
use tagmark_core::{Bookmark, BookmarkDraft, BookmarkId, BookmarkPatch, CategoryId, Config};

/// Arguments of the add command.
pub struct AddArgs {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
}

/// Arguments of the update command.
pub struct UpdateArgs {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

impl UpdateArgs {
    fn into_patch(self) -> BookmarkPatch {
        BookmarkPatch {
            title: self.title,
            url: self.url,
            description: self.description.map(non_empty),
            notes: self.notes.map(non_empty),
            category_id: self.category.map(|c| non_empty(c).map(CategoryId::from)),
            tags: if self.clear_tags {
                Some(Vec::new())
            } else if self.tags.is_empty() {
                None
            } else {
                Some(self.tags)
            },
            favorite: None,
            archived: None,
        }
    }
}

/// An empty argument clears the field.
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Run the add command.
pub fn add(config: Config, args: AddArgs) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let draft = BookmarkDraft {
        title: args.title,
        url: args.url,
        description: args.description,
        notes: args.notes,
        category_id: args.category.map(CategoryId::from),
        tags: args.tags,
        favorite: args.favorite,
        ..Default::default()
    };

    if let Some(category_id) = &draft.category_id {
        if app.categories.get_category(category_id)?.is_none() {
            anyhow::bail!("Unknown category: {}", category_id);
        }
    }

    let bookmark = app.bookmarks.create_bookmark(draft)?;
    println!("Added {}", bookmark.id);
    print_bookmark(&bookmark);

    Ok(())
}

/// Run the update command.
pub fn update(config: Config, id: &str, args: UpdateArgs) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let patch = args.into_patch();
    if patch.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let bookmark = app.bookmarks.update_bookmark(&BookmarkId::new(id), patch)?;
    println!("Updated {}", bookmark.id);
    print_bookmark(&bookmark);

    Ok(())
}

/// Run the remove command.
pub fn remove(config: Config, id: &str) -> anyhow::Result<()> {
    let app = App::new(config)?;
    app.bookmarks.delete_bookmark(&BookmarkId::new(id))?;
    println!("Removed {}", id);
    Ok(())
}

/// Run the favorite command.
pub fn toggle_favorite(config: Config, id: &str) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let bookmark = app.bookmarks.toggle_favorite(&BookmarkId::new(id))?;
    let state = if bookmark.favorite { "★ favorite" } else { "not a favorite" };
    println!("{} is now {}", bookmark.id, state);
    Ok(())
}

/// Run the archive command.
pub fn toggle_archive(config: Config, id: &str) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let bookmark = app.bookmarks.toggle_archive(&BookmarkId::new(id))?;
    let state = if bookmark.archived { "archived" } else { "restored" };
    println!("{} {}", bookmark.id, state);
    Ok(())
}

fn print_bookmark(bookmark: &Bookmark) {
    println!("  Title: {}", bookmark.title);
    if !bookmark.url.is_empty() {
        println!("  URL:   {}", bookmark.url);
    }
    if !bookmark.tags.is_empty() {
        println!("  Tags:  {}", bookmark.tags.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_args() -> UpdateArgs {
        UpdateArgs {
            title: None,
            url: None,
            description: None,
            notes: None,
            category: None,
            tags: Vec::new(),
            clear_tags: false,
        }
    }

    #[test]
    fn test_empty_update_is_empty_patch() {
        assert!(update_args().into_patch().is_empty());
    }

    #[test]
    fn test_empty_string_clears_field() {
        let patch = UpdateArgs {
            notes: Some(String::new()),
            category: Some(String::new()),
            ..update_args()
        }
        .into_patch();

        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.category_id, Some(None));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn test_clear_tags() {
        let patch = UpdateArgs {
            clear_tags: true,
            ..update_args()
        }
        .into_patch();
        assert_eq!(patch.tags, Some(Vec::new()));

        let patch = UpdateArgs {
            tags: vec!["a".to_string()],
            ..update_args()
        }
        .into_patch();
        assert_eq!(patch.tags, Some(vec!["a".to_string()]));
    }
}
