//! Tags command - list tags by popularity.

use crate::app::App;
use tagmark_core::Config;

/// Run the tags command.
pub fn run(config: Config, limit: usize) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let tags = app.tags.popular_tags(limit)?;

    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }

    let width = tags.iter().map(|t| t.name.chars().count()).max().unwrap_or(0);
    for tag in &tags {
        println!("{:<width$}  {:>5}", tag.name, tag.usage_count, width = width);
    }

    Ok(())
}
