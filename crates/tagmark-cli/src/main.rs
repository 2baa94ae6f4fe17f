//! # Tagmark CLI
//!
//! Command-line interface for the Tagmark bookmark manager.
//!
//! ## Commands
//!
//! - `tagmark add <url>` - Save a bookmark
//! - `tagmark search [query]` - Ranked search with inline filters
//! - `tagmark update <id>` / `tagmark remove <id>` - Edit or delete
//! - `tagmark status` - Show index and database statistics
//!
//! ## Example Usage
//!
//! ```bash
//! # Save a bookmark with two tags
//! tagmark add https://doc.rust-lang.org/book/ --title "The Rust Book" -t rust -t docs
//!
//! # Search favorites tagged rust, newest first
//! tagmark search "borrow checker is:fav #rust sort:created"
//!
//! # Machine-readable output
//! tagmark search ownership --output json
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tagmark_core::{SortBy, SortOrder};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tagmark - Tagged bookmarks with ranked full-text search
#[derive(Parser)]
#[command(name = "tagmark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TAGMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new bookmark
    Add {
        /// Target URL
        url: String,

        /// Display title (defaults to "Untitled")
        #[arg(long)]
        title: Option<String>,

        /// Short description
        #[arg(short, long)]
        description: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Category id
        #[arg(long)]
        category: Option<String>,

        /// Tag (can be used multiple times)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Mark as favorite
        #[arg(short, long)]
        favorite: bool,
    },

    /// Change fields of an existing bookmark
    Update {
        /// Bookmark id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// New description (empty string clears it)
        #[arg(short, long)]
        description: Option<String>,

        /// New notes (empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,

        /// New category id (empty string clears it)
        #[arg(long)]
        category: Option<String>,

        /// Replace the tag list (can be used multiple times)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Delete a bookmark
    #[command(alias = "rm")]
    Remove {
        /// Bookmark id
        id: String,
    },

    /// Toggle the favorite flag
    Favorite {
        /// Bookmark id
        id: String,
    },

    /// Toggle the archived flag
    Archive {
        /// Bookmark id
        id: String,
    },

    /// Search bookmarks
    #[command(alias = "s")]
    Search {
        /// Query text; supports tag:, #tag, cat:, is:fav, is:archived,
        /// sort:, order: and limit:
        query: Vec<String>,

        /// Require a tag (can be used multiple times)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Restrict to a category id
        #[arg(long)]
        category: Option<String>,

        /// Favorites only
        #[arg(short, long)]
        favorite: bool,

        /// Archived only
        #[arg(short, long)]
        archived: bool,

        /// Sort key (relevance, title, created, updated)
        #[arg(short, long)]
        sort: Option<SortBy>,

        /// Sort direction (asc, desc)
        #[arg(long)]
        order: Option<SortOrder>,

        /// Maximum number of results (0 = no limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show index status and statistics
    Status,

    /// List tags, most used first
    Tags {
        /// Maximum number of tags to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Write every record to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Replace every record with the contents of a JSON export
    Import {
        /// Source file
        file: PathBuf,
    },

    /// Delete the database and all data
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// Create a category
    Add {
        /// Category name
        name: String,

        /// Parent category id
        #[arg(long)]
        parent: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete an empty category
    Remove {
        /// Category id
        id: String,
    },

    /// List categories as a tree
    List,
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => tagmark_core::Config::load_from(path)?,
        None => tagmark_core::Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Add {
            url,
            title,
            description,
            notes,
            category,
            tags,
            favorite,
        } => commands::bookmark::add(
            config,
            commands::bookmark::AddArgs {
                url,
                title,
                description,
                notes,
                category,
                tags,
                favorite,
            },
        ),
        Commands::Update {
            id,
            title,
            url,
            description,
            notes,
            category,
            tags,
            clear_tags,
        } => commands::bookmark::update(
            config,
            &id,
            commands::bookmark::UpdateArgs {
                title,
                url,
                description,
                notes,
                category,
                tags,
                clear_tags,
            },
        ),
        Commands::Remove { id } => commands::bookmark::remove(config, &id),
        Commands::Favorite { id } => commands::bookmark::toggle_favorite(config, &id),
        Commands::Archive { id } => commands::bookmark::toggle_archive(config, &id),
        Commands::Search {
            query,
            tags,
            category,
            favorite,
            archived,
            sort,
            order,
            limit,
            output,
        } => commands::search::run(
            config,
            &query.join(" "),
            commands::search::Overrides {
                tags,
                category,
                favorite,
                archived,
                sort,
                order,
                limit,
            },
            output,
        ),
        Commands::Status => commands::status::run(config),
        Commands::Tags { limit } => commands::tags::run(config, limit),
        Commands::Category(command) => commands::category::run(config, command),
        Commands::Export { file } => commands::transfer::export(config, &file),
        Commands::Import { file } => commands::transfer::import(config, &file),
        Commands::Clear { yes } => commands::clear::run(config, yes),
    }
}
