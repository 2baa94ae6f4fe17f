//! Export and import commands - JSON round trip of the whole database.

use crate::app::App;
use std::path::Path;
use tagmark_core::Config;

/// Run the export command.
pub fn export(config: Config, path: &Path) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let records = app.store.export_json(path)?;
    println!("Exported {} records to {}", records, path.display());
    Ok(())
}

/// Run the import command. Existing data is replaced.
pub fn import(config: Config, path: &Path) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let snapshot = app.store.import_json(path)?;
    let stats = app.bookmarks.reindex()?;

    println!(
        "Imported {} bookmarks, {} categories, {} tags",
        snapshot.bookmarks.len(),
        snapshot.categories.len(),
        snapshot.tags.len()
    );
    println!("Indexed {} terms", stats.term_count);
    Ok(())
}
