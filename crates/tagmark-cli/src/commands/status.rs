//! Status command - show index and database statistics.

use crate::app::App;
use tagmark_core::{BookmarkStore, Config};

/// Run the status command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let stats = app.bookmarks.stats();
    let snapshot = app.store.snapshot()?;

    println!("Tagmark Status");
    println!("==============");
    println!();

    if snapshot.bookmarks.is_empty() {
        println!("No bookmarks yet. Add one with 'tagmark add <url>'.");
    }

    let favorites = snapshot.bookmarks.iter().filter(|b| b.favorite).count();
    let archived = snapshot.bookmarks.iter().filter(|b| b.archived).count();
    let latest = snapshot.bookmarks.iter().map(|b| b.updated_at).max();

    println!("Database:");
    println!("  Bookmarks:   {}", snapshot.bookmarks.len());
    println!("  Favorites:   {}", favorites);
    println!("  Archived:    {}", archived);
    println!("  Categories:  {}", snapshot.categories.len());
    println!("  Tags:        {}", snapshot.tags.len());
    if let Some(updated) = latest {
        println!("  Last change: {}", super::format_timestamp(updated));
    }

    println!();
    println!("Search index:");
    println!("  Documents:   {}", stats.document_count);
    println!("  Terms:       {}", stats.term_count);
    println!(
        "  Parallel at: {}",
        match app.config.search.parallel_threshold {
            0 => "never".to_string(),
            n => format!("{} candidates", n),
        }
    );

    // Show data location
    println!();
    println!("Database file: {}", app.store.database_path().display());
    if !app.store.exists() {
        println!("  (not written yet)");
    }

    Ok(())
}
