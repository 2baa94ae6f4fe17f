//! Record services: the write path that keeps the store, the search index
//! and tag bookkeeping in step.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  persist   ┌───────────────┐
//! │ BookmarkService  │ ─────────▶ │ BookmarkStore │
//! │  (write mutex)   │            └───────────────┘
//! │                  │  then index ┌─────────────┐
//! │                  │ ──────────▶ │ SearchIndex │
//! └──────────────────┘             └─────────────┘
//! ```
//!
//! Every mutation is persisted first and applied to the index second, so a
//! failed write never leaves the index ahead of the store. Mutations are
//! serialized by a per-service mutex; searches never take it.

use crate::error::{Result, TagmarkError};
use crate::index::SearchIndex;
use crate::search::{SearchOptions, SearchResult};
use crate::store::{BookmarkStore, ChangeEvent};
use crate::types::{
    now_millis, Bookmark, BookmarkId, Category, CategoryId, IndexStats, Tag, TagId, Timestamp,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Title given to bookmarks created without one
pub const DEFAULT_BOOKMARK_TITLE: &str = "Untitled";
/// Name given to categories created without one
pub const DEFAULT_CATEGORY_NAME: &str = "Untitled Category";

// === Inputs ===

/// Fields for a new bookmark.
#[derive(Debug, Clone, Default)]
pub struct BookmarkDraft {
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub category_id: Option<CategoryId>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub archived: bool,
    /// Creation time override, used by imports
    pub created_at: Option<Timestamp>,
}

impl BookmarkDraft {
    pub fn new(url: impl Into<String>) -> Self {
        BookmarkDraft {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// Changes to an existing bookmark. `None` leaves a field untouched; for
/// optional fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub category_id: Option<Option<CategoryId>>,
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
}

impl BookmarkPatch {
    /// True if applying the patch cannot change anything
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.category_id.is_none()
            && self.tags.is_none()
            && self.favorite.is_none()
            && self.archived.is_none()
    }

    fn apply(self, bookmark: &mut Bookmark) {
        if let Some(title) = self.title {
            bookmark.title = title;
        }
        if let Some(url) = self.url {
            bookmark.url = url;
        }
        if let Some(description) = self.description {
            bookmark.description = description;
        }
        if let Some(notes) = self.notes {
            bookmark.notes = notes;
        }
        if let Some(category_id) = self.category_id {
            bookmark.category_id = category_id;
        }
        if let Some(tags) = self.tags {
            bookmark.tags = normalize_tags(tags);
        }
        if let Some(favorite) = self.favorite {
            bookmark.favorite = favorite;
        }
        if let Some(archived) = self.archived {
            bookmark.archived = archived;
        }
    }
}

/// Fields for a new category.
#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<CategoryId>,
}

impl CategoryDraft {
    pub fn named(name: impl Into<String>) -> Self {
        CategoryDraft {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<CategoryId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Changes to an existing category, with the same conventions as
/// [`BookmarkPatch`].
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub parent_id: Option<Option<CategoryId>>,
}

/// Trim tags, drop empty ones and remove duplicates keeping first occurrence.
pub fn normalize_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

// === Bookmarks ===

/// Bookmark CRUD with search index and tag usage maintenance.
pub struct BookmarkService<S: BookmarkStore> {
    store: Arc<S>,
    index: Arc<SearchIndex>,
    write_lock: Mutex<()>,
    initialized: AtomicBool,
}

impl<S: BookmarkStore> BookmarkService<S> {
    pub fn new(store: Arc<S>, index: Arc<SearchIndex>) -> Self {
        BookmarkService {
            store,
            index,
            write_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Build the search index from the store. Only the first call does work.
    pub fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let bookmarks = self.store.all_bookmarks()?;
        self.index.rebuild_index(&bookmarks);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Discard the index and rebuild it from the store.
    #[instrument(skip(self))]
    pub fn reindex(&self) -> Result<IndexStats> {
        let _guard = self.write_lock.lock();
        let bookmarks = self.store.all_bookmarks()?;
        self.index.rebuild_index(&bookmarks);
        self.initialized.store(true, Ordering::Release);
        Ok(self.index.stats())
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    #[instrument(skip_all, fields(url = %draft.url))]
    pub fn create_bookmark(&self, draft: BookmarkDraft) -> Result<Bookmark> {
        let _guard = self.write_lock.lock();

        let now = now_millis();
        let title = draft
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BOOKMARK_TITLE.to_string());

        let mut bookmark = Bookmark::new(BookmarkId::generate(), title, draft.url)
            .with_tags(normalize_tags(draft.tags))
            .with_timestamps(draft.created_at.unwrap_or(now), now)
            .with_favorite(draft.favorite)
            .with_archived(draft.archived);
        bookmark.description = draft.description;
        bookmark.notes = draft.notes;
        bookmark.category_id = draft.category_id;

        self.store.put_bookmark(&bookmark)?;
        self.index.apply_change(ChangeEvent::created(bookmark.clone()));
        for tag in &bookmark.tags {
            self.adjust_tag_usage(tag, 1)?;
        }

        info!(id = %bookmark.id, "Bookmark created");
        Ok(bookmark)
    }

    pub fn update_bookmark(&self, id: &BookmarkId, patch: BookmarkPatch) -> Result<Bookmark> {
        let _guard = self.write_lock.lock();
        self.update_locked(id, patch)
    }

    fn update_locked(&self, id: &BookmarkId, patch: BookmarkPatch) -> Result<Bookmark> {
        let previous = self
            .store
            .get_bookmark(id)?
            .ok_or_else(|| TagmarkError::bookmark_not_found(id.as_str()))?;

        let mut bookmark = previous.clone();
        patch.apply(&mut bookmark);
        bookmark.id = previous.id.clone();
        bookmark.created_at = previous.created_at;
        bookmark.updated_at = now_millis().max(previous.updated_at);

        self.store.put_bookmark(&bookmark)?;
        self.index.apply_change(ChangeEvent::updated(bookmark.clone()));

        for tag in bookmark.tags.iter().filter(|t| !previous.tags.contains(t)) {
            self.adjust_tag_usage(tag, 1)?;
        }
        for tag in previous.tags.iter().filter(|t| !bookmark.tags.contains(t)) {
            self.adjust_tag_usage(tag, -1)?;
        }

        debug!(id = %bookmark.id, "Bookmark updated");
        Ok(bookmark)
    }

    pub fn delete_bookmark(&self, id: &BookmarkId) -> Result<()> {
        let _guard = self.write_lock.lock();

        let existing = self
            .store
            .get_bookmark(id)?
            .ok_or_else(|| TagmarkError::bookmark_not_found(id.as_str()))?;

        self.store.delete_bookmark(id)?;
        self.index.apply_change(ChangeEvent::deleted(id.clone()));
        for tag in &existing.tags {
            self.adjust_tag_usage(tag, -1)?;
        }

        info!(id = %id, "Bookmark deleted");
        Ok(())
    }

    pub fn get_bookmark(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        self.store.get_bookmark(id)
    }

    pub fn all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.store.all_bookmarks()
    }

    pub fn search(&self, options: &SearchOptions) -> Vec<SearchResult> {
        self.index.search(options)
    }

    pub fn toggle_favorite(&self, id: &BookmarkId) -> Result<Bookmark> {
        let _guard = self.write_lock.lock();
        let current = self
            .store
            .get_bookmark(id)?
            .ok_or_else(|| TagmarkError::bookmark_not_found(id.as_str()))?;
        let patch = BookmarkPatch {
            favorite: Some(!current.favorite),
            ..Default::default()
        };
        self.update_locked(id, patch)
    }

    pub fn toggle_archive(&self, id: &BookmarkId) -> Result<Bookmark> {
        let _guard = self.write_lock.lock();
        let current = self
            .store
            .get_bookmark(id)?
            .ok_or_else(|| TagmarkError::bookmark_not_found(id.as_str()))?;
        let patch = BookmarkPatch {
            archived: Some(!current.archived),
            ..Default::default()
        };
        self.update_locked(id, patch)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn adjust_tag_usage(&self, name: &str, delta: i64) -> Result<()> {
        match self.store.find_tag_by_name(name)? {
            Some(mut tag) => {
                let usage = (i64::from(tag.usage_count) + delta).max(0);
                tag.usage_count = u32::try_from(usage).unwrap_or(u32::MAX);
                self.store.put_tag(&tag)
            }
            None if delta > 0 => {
                debug!(tag = name, "Creating tag");
                self.store.put_tag(&Tag::new(name, 1))
            }
            None => Ok(()),
        }
    }
}

impl<S: BookmarkStore> std::fmt::Debug for BookmarkService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookmarkService")
            .field("index", &self.index)
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish()
    }
}

// === Categories ===

/// Category CRUD with tree constraints.
pub struct CategoryService<S: BookmarkStore> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: BookmarkStore> CategoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        CategoryService {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn create_category(&self, draft: CategoryDraft) -> Result<Category> {
        let _guard = self.write_lock.lock();

        if let Some(parent_id) = &draft.parent_id {
            self.require(parent_id)?;
        }

        let now = now_millis();
        let category = Category {
            id: CategoryId::generate(),
            name: draft
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY_NAME.to_string()),
            description: draft.description,
            color: draft.color,
            icon: draft.icon,
            parent_id: draft.parent_id,
            created_at: now,
            updated_at: now,
        };

        self.store.put_category(&category)?;
        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub fn update_category(&self, id: &CategoryId, patch: CategoryPatch) -> Result<Category> {
        let _guard = self.write_lock.lock();

        let mut category = self.require(id)?;
        if let Some(Some(parent_id)) = &patch.parent_id {
            self.check_parent(id, parent_id)?;
        }

        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        if let Some(color) = patch.color {
            category.color = color;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon;
        }
        if let Some(parent_id) = patch.parent_id {
            category.parent_id = parent_id;
        }
        category.updated_at = now_millis().max(category.updated_at);

        self.store.put_category(&category)?;
        debug!(id = %id, "Category updated");
        Ok(category)
    }

    /// Delete a category that has no subcategories and no bookmarks.
    pub fn delete_category(&self, id: &CategoryId) -> Result<()> {
        let _guard = self.write_lock.lock();

        self.require(id)?;

        let has_children = self
            .store
            .all_categories()?
            .iter()
            .any(|category| category.parent_id.as_ref() == Some(id));
        if has_children {
            return Err(TagmarkError::CategoryHasChildren { id: id.to_string() });
        }

        let bookmarks = self.store.bookmarks_in_category(id)?.len();
        if bookmarks > 0 {
            return Err(TagmarkError::CategoryInUse {
                id: id.to_string(),
                bookmarks,
            });
        }

        self.store.delete_category(id)?;
        info!(id = %id, "Category deleted");
        Ok(())
    }

    pub fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        self.store.get_category(id)
    }

    pub fn all_categories(&self) -> Result<Vec<Category>> {
        self.store.all_categories()
    }

    /// Categories without a parent
    pub fn root_categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .store
            .all_categories()?
            .into_iter()
            .filter(|category| category.parent_id.is_none())
            .collect())
    }

    fn require(&self, id: &CategoryId) -> Result<Category> {
        self.store
            .get_category(id)?
            .ok_or_else(|| TagmarkError::CategoryNotFound { id: id.to_string() })
    }

    /// Walk up from `parent_id`; reaching `id` means the move forms a cycle.
    fn check_parent(&self, id: &CategoryId, parent_id: &CategoryId) -> Result<()> {
        let mut visited = HashSet::new();
        let mut current = Some(self.require(parent_id)?);

        while let Some(ancestor) = current {
            if &ancestor.id == id {
                return Err(TagmarkError::CategoryCycle {
                    id: id.to_string(),
                    parent: parent_id.to_string(),
                });
            }
            if !visited.insert(ancestor.id.clone()) {
                break;
            }
            current = match &ancestor.parent_id {
                Some(next) => self.store.get_category(next)?,
                None => None,
            };
        }
        Ok(())
    }
}

// === Tags ===

/// Read access and maintenance for tag records. Usage counts are owned by
/// [`BookmarkService`].
pub struct TagService<S: BookmarkStore> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: BookmarkStore> TagService<S> {
    pub fn new(store: Arc<S>) -> Self {
        TagService {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        self.store.all_tags()
    }

    /// Most used tags first, ties by name.
    pub fn popular_tags(&self, limit: usize) -> Result<Vec<Tag>> {
        let mut tags = self.store.all_tags()?;
        tags.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        tags.truncate(limit);
        Ok(tags)
    }

    pub fn update_tag_color(&self, id: &TagId, color: Option<String>) -> Result<Tag> {
        let _guard = self.write_lock.lock();
        let mut tag = self.require(id)?;
        tag.color = color;
        self.store.put_tag(&tag)?;
        Ok(tag)
    }

    /// Delete a tag no bookmark uses.
    pub fn delete_tag(&self, id: &TagId) -> Result<()> {
        let _guard = self.write_lock.lock();
        let tag = self.require(id)?;
        if tag.usage_count > 0 {
            return Err(TagmarkError::TagInUse {
                id: id.to_string(),
                usage_count: tag.usage_count,
            });
        }
        self.store.delete_tag(id)?;
        info!(name = %tag.name, "Tag deleted");
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.store.find_tag_by_name(name)
    }

    fn require(&self, id: &TagId) -> Result<Tag> {
        self.store
            .get_tag(id)?
            .ok_or_else(|| TagmarkError::TagNotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn services() -> (
        Arc<MemoryStore>,
        BookmarkService<MemoryStore>,
        CategoryService<MemoryStore>,
        TagService<MemoryStore>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(SearchIndex::new());
        (
            store.clone(),
            BookmarkService::new(store.clone(), index),
            CategoryService::new(store.clone()),
            TagService::new(store),
        )
    }

    fn usage(tags: &TagService<MemoryStore>, name: &str) -> Option<u32> {
        tags.find_by_name(name).unwrap().map(|tag| tag.usage_count)
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(
            normalize_tags([" rust ", "", "web", "rust", "  "]),
            vec!["rust", "web"]
        );
    }

    #[test]
    fn test_create_defaults() {
        let (store, bookmarks, _, tags) = services();
        let created = bookmarks
            .create_bookmark(BookmarkDraft::new("https://example.com").with_tag("web").with_tag("web "))
            .unwrap();

        assert_eq!(created.title, DEFAULT_BOOKMARK_TITLE);
        assert_eq!(created.tags, vec!["web"]);
        assert_eq!(created.id.as_str().len(), 32);
        assert_eq!(store.get_bookmark(&created.id).unwrap(), Some(created.clone()));
        assert!(bookmarks.index().contains(&created.id));
        assert_eq!(usage(&tags, "web"), Some(1));
    }

    #[test]
    fn test_create_is_searchable() {
        let (_, bookmarks, _, _) = services();
        let created = bookmarks
            .create_bookmark(BookmarkDraft::new("https://doc.rust-lang.org").with_title("Rust Book"))
            .unwrap();

        let results = bookmarks.search(&SearchOptions::new("rust"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bookmark.id, created.id);
    }

    #[test]
    fn test_update_merges_and_reindexes() {
        let (_, bookmarks, _, tags) = services();
        let created = bookmarks
            .create_bookmark(
                BookmarkDraft::new("https://a.example")
                    .with_title("Old Title")
                    .with_description("keep me")
                    .with_tag("alpha")
                    .with_tag("beta"),
            )
            .unwrap();

        let patch = BookmarkPatch {
            title: Some("New Title".to_string()),
            tags: Some(vec!["beta".to_string(), "gamma".to_string()]),
            ..Default::default()
        };
        let updated = bookmarks.update_bookmark(&created.id, patch).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.description.as_deref(), Some("keep me"));

        assert!(bookmarks.search(&SearchOptions::new("old")).is_empty());
        assert_eq!(bookmarks.search(&SearchOptions::new("new")).len(), 1);

        assert_eq!(usage(&tags, "alpha"), Some(0));
        assert_eq!(usage(&tags, "beta"), Some(1));
        assert_eq!(usage(&tags, "gamma"), Some(1));
    }

    #[test]
    fn test_update_can_clear_optional_field() {
        let (_, bookmarks, _, _) = services();
        let created = bookmarks
            .create_bookmark(BookmarkDraft::new("").with_notes("temporary"))
            .unwrap();

        let patch = BookmarkPatch {
            notes: Some(None),
            ..Default::default()
        };
        let updated = bookmarks.update_bookmark(&created.id, patch).unwrap();
        assert_eq!(updated.notes, None);
        assert!(bookmarks.search(&SearchOptions::new("temporary")).is_empty());
    }

    #[test]
    fn test_update_missing() {
        let (_, bookmarks, _, _) = services();
        let result = bookmarks.update_bookmark(&BookmarkId::new("nope"), BookmarkPatch::default());
        assert!(matches!(result, Err(TagmarkError::BookmarkNotFound { .. })));
    }

    #[test]
    fn test_delete() {
        let (store, bookmarks, _, tags) = services();
        let created = bookmarks
            .create_bookmark(BookmarkDraft::new("").with_title("Gone soon").with_tag("tmp"))
            .unwrap();

        bookmarks.delete_bookmark(&created.id).unwrap();

        assert!(store.get_bookmark(&created.id).unwrap().is_none());
        assert!(bookmarks.search(&SearchOptions::new("gone")).is_empty());
        // zero-usage tags are kept
        assert_eq!(usage(&tags, "tmp"), Some(0));

        let again = bookmarks.delete_bookmark(&created.id);
        assert!(matches!(again, Err(TagmarkError::BookmarkNotFound { .. })));
    }

    #[test]
    fn test_tag_usage_counts_across_bookmarks() {
        let (_, bookmarks, _, tags) = services();
        let a = bookmarks
            .create_bookmark(BookmarkDraft::new("").with_tag("shared"))
            .unwrap();
        bookmarks
            .create_bookmark(BookmarkDraft::new("").with_tag("shared"))
            .unwrap();
        assert_eq!(usage(&tags, "shared"), Some(2));

        bookmarks.delete_bookmark(&a.id).unwrap();
        assert_eq!(usage(&tags, "shared"), Some(1));
    }

    #[test]
    fn test_toggles() {
        let (_, bookmarks, _, _) = services();
        let created = bookmarks.create_bookmark(BookmarkDraft::new("")).unwrap();

        assert!(bookmarks.toggle_favorite(&created.id).unwrap().favorite);
        assert!(!bookmarks.toggle_favorite(&created.id).unwrap().favorite);
        assert!(bookmarks.toggle_archive(&created.id).unwrap().archived);

        let archived = bookmarks.search(&SearchOptions::browse().with_archived(true));
        assert_eq!(archived.len(), 1);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_bookmark(&Bookmark::new("b1", "Preloaded", ""))
            .unwrap();
        let index = Arc::new(SearchIndex::new());
        let bookmarks = BookmarkService::new(store.clone(), index.clone());

        bookmarks.initialize().unwrap();
        let generation = index.generation();
        bookmarks.initialize().unwrap();

        assert_eq!(index.generation(), generation);
        assert_eq!(bookmarks.stats().document_count, 1);
    }

    #[test]
    fn test_reindex_recovers_from_drift() {
        let (store, bookmarks, _, _) = services();
        store
            .put_bookmark(&Bookmark::new("b1", "Written behind the index", ""))
            .unwrap();
        assert!(bookmarks.search(&SearchOptions::new("behind")).is_empty());

        let stats = bookmarks.reindex().unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(bookmarks.search(&SearchOptions::new("behind")).len(), 1);
    }

    #[test]
    fn test_category_lifecycle() {
        let (_, bookmarks, categories, _) = services();
        let parent = categories.create_category(CategoryDraft::default()).unwrap();
        assert_eq!(parent.name, DEFAULT_CATEGORY_NAME);

        let child = categories
            .create_category(CategoryDraft::named("Child").with_parent(parent.id.clone()))
            .unwrap();
        assert_eq!(categories.root_categories().unwrap(), vec![parent.clone()]);

        let result = categories.delete_category(&parent.id);
        assert!(matches!(result, Err(TagmarkError::CategoryHasChildren { .. })));

        let filed = bookmarks
            .create_bookmark(BookmarkDraft::new("").with_category(child.id.clone()))
            .unwrap();
        let result = categories.delete_category(&child.id);
        assert!(matches!(
            result,
            Err(TagmarkError::CategoryInUse { bookmarks: 1, .. })
        ));

        bookmarks.delete_bookmark(&filed.id).unwrap();
        categories.delete_category(&child.id).unwrap();
        categories.delete_category(&parent.id).unwrap();
        assert!(categories.all_categories().unwrap().is_empty());
    }

    #[test]
    fn test_category_unknown_parent() {
        let (_, _, categories, _) = services();
        let result = categories.create_category(CategoryDraft::named("x").with_parent("missing"));
        assert!(matches!(result, Err(TagmarkError::CategoryNotFound { .. })));
    }

    #[test]
    fn test_update_category() {
        let (_, _, categories, _) = services();
        let category = categories.create_category(CategoryDraft::named("Work")).unwrap();

        let patch = CategoryPatch {
            name: Some("Office".to_string()),
            color: Some(Some("#ff0000".to_string())),
            ..Default::default()
        };
        let updated = categories.update_category(&category.id, patch).unwrap();
        assert_eq!(updated.name, "Office");
        assert_eq!(updated.color.as_deref(), Some("#ff0000"));

        let self_parent = CategoryPatch {
            parent_id: Some(Some(category.id.clone())),
            ..Default::default()
        };
        let result = categories.update_category(&category.id, self_parent);
        assert!(matches!(result, Err(TagmarkError::CategoryCycle { .. })));
    }

    #[test]
    fn test_update_category_rejects_indirect_cycle() {
        let (_, _, categories, _) = services();
        let a = categories.create_category(CategoryDraft::named("A")).unwrap();
        let b = categories
            .create_category(CategoryDraft::named("B").with_parent(a.id.clone()))
            .unwrap();
        let c = categories
            .create_category(CategoryDraft::named("C").with_parent(b.id.clone()))
            .unwrap();

        let under_grandchild = CategoryPatch {
            parent_id: Some(Some(c.id.clone())),
            ..Default::default()
        };
        let err = categories.update_category(&a.id, under_grandchild).unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(categories.root_categories().unwrap(), vec![a.clone()]);

        // moving a leaf elsewhere is still fine
        let to_root_sibling = CategoryPatch {
            parent_id: Some(Some(a.id.clone())),
            ..Default::default()
        };
        let moved = categories.update_category(&c.id, to_root_sibling).unwrap();
        assert_eq!(moved.parent_id, Some(a.id));
    }

    #[test]
    fn test_popular_tags_and_delete() {
        let (_, bookmarks, _, tags) = services();
        let only = bookmarks
            .create_bookmark(BookmarkDraft::new("").with_tag("b").with_tag("c"))
            .unwrap();
        bookmarks
            .create_bookmark(BookmarkDraft::new("").with_tag("c").with_tag("a"))
            .unwrap();

        let names: Vec<String> = tags
            .popular_tags(10)
            .unwrap()
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(tags.popular_tags(1).unwrap().len(), 1);

        let b = tags.find_by_name("b").unwrap().unwrap();
        let result = tags.delete_tag(&b.id);
        assert!(matches!(result, Err(TagmarkError::TagInUse { usage_count: 1, .. })));

        bookmarks.delete_bookmark(&only.id).unwrap();
        tags.delete_tag(&b.id).unwrap();
        assert!(tags.find_by_name("b").unwrap().is_none());
    }

    #[test]
    fn test_update_tag_color() {
        let (_, bookmarks, _, tags) = services();
        bookmarks
            .create_bookmark(BookmarkDraft::new("").with_tag("red"))
            .unwrap();
        let tag = tags.find_by_name("red").unwrap().unwrap();

        let updated = tags
            .update_tag_color(&tag.id, Some("#f00".to_string()))
            .unwrap();
        assert_eq!(updated.color.as_deref(), Some("#f00"));

        let missing = tags.update_tag_color(&TagId::new("none"), None);
        assert!(matches!(missing, Err(TagmarkError::TagNotFound { .. })));
    }
}
