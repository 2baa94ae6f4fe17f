//! Clear command - delete the bookmark database and its backup.

use std::io::{self, BufRead, Write};
use tagmark_core::{Config, DatabaseSnapshot, FileStore};

/// Run the clear command.
pub fn run(config: Config, skip_confirm: bool) -> anyhow::Result<()> {
    let store = FileStore::new(config.data_dir()?);

    if !store.exists() && !store.backup_path().exists() {
        println!("No database at {}. Nothing to clear.", store.database_path().display());
        return Ok(());
    }

    // A corrupted database can still be cleared; only the summary is lost.
    let contents = store.load().ok();
    println!("{}", describe(&store, contents.as_ref()));

    if !skip_confirm {
        print!("Delete every bookmark, category and tag? [y/N] ");
        io::stdout().flush()?;
        if !confirmed(io::stdin().lock())? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.clear()?;
    println!("Database cleared.");

    Ok(())
}

/// What a clear would remove.
fn describe(store: &FileStore, contents: Option<&DatabaseSnapshot>) -> String {
    let mut lines = vec![format!("Database: {}", store.database_path().display())];
    match contents {
        Some(snapshot) => lines.push(format!(
            "  {} bookmarks, {} categories, {} tags",
            snapshot.bookmarks.len(),
            snapshot.categories.len(),
            snapshot.tags.len()
        )),
        None => lines.push("  (unreadable)".to_string()),
    }
    if store.backup_path().exists() {
        lines.push(format!("Backup:   {}", store.backup_path().display()));
    }
    lines.join("\n")
}

/// Read one answer line; only "y" or "yes" confirms.
fn confirmed(mut input: impl BufRead) -> io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
