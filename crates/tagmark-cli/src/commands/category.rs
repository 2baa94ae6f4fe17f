//! Category commands - add, remove and list.

use crate::app::App;
use crate::CategoryCommand;
use std::collections::HashMap;
use tagmark_core::{BookmarkStore, Category, CategoryDraft, CategoryId, Config};

/// Run a category subcommand.
pub fn run(config: Config, command: CategoryCommand) -> anyhow::Result<()> {
    let app = App::new(config)?;

    match command {
        CategoryCommand::Add {
            name,
            parent,
            color,
        } => {
            let draft = CategoryDraft {
                color,
                parent_id: parent.map(CategoryId::from),
                ..CategoryDraft::named(name)
            };
            let category = app.categories.create_category(draft)?;
            println!("Added category {} ({})", category.name, category.id);
        }
        CategoryCommand::Remove { id } => {
            app.categories.delete_category(&CategoryId::new(id.as_str()))?;
            println!("Removed category {}", id);
        }
        CategoryCommand::List => {
            let categories = app.categories.all_categories()?;
            if categories.is_empty() {
                println!("No categories.");
                return Ok(());
            }

            let mut counts: HashMap<CategoryId, usize> = HashMap::new();
            for bookmark in app.store.all_bookmarks()? {
                if let Some(category_id) = bookmark.category_id {
                    *counts.entry(category_id).or_insert(0) += 1;
                }
            }

            for line in render_tree(&categories, &counts) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Indented tree lines, roots first, children under their parent.
fn render_tree(categories: &[Category], counts: &HashMap<CategoryId, usize>) -> Vec<String> {
    let mut children: HashMap<Option<&CategoryId>, Vec<&Category>> = HashMap::new();
    for category in categories {
        children
            .entry(category.parent_id.as_ref())
            .or_default()
            .push(category);
    }

    let mut lines = Vec::new();
    let mut stack: Vec<(&Category, usize)> = children
        .get(&None)
        .map(|roots| roots.iter().rev().map(|c| (*c, 0)).collect())
        .unwrap_or_default();

    while let Some((category, depth)) = stack.pop() {
        lines.push(format!(
            "{}{} ({}) [{}]",
            "  ".repeat(depth),
            category.name,
            category.id,
            counts.get(&category.id).copied().unwrap_or(0)
        ));
        if let Some(kids) = children.get(&Some(&category.id)) {
            stack.extend(kids.iter().rev().map(|c| (*c, depth + 1)));
        }
    }

    lines
}
