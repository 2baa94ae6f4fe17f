//! # Tagmark Core Library
//!
//! This crate provides the search index, record storage, and services for
//! the Tagmark bookmark manager. Storage is abstracted behind the
//! [`BookmarkStore`] trait so the index and services run the same against
//! the in-memory store used in tests and the on-disk [`FileStore`].
//!
//! ## Architecture
//!
//! - **Types** (`types`): Bookmarks, categories, tags and their ids
//! - **Tokenizer** (`tokenizer`): Text normalization and term extraction
//! - **Index** (`index`): In-memory inverted index with ranked search
//! - **Search** (`search`): Search options, scoring constants and query parsing
//! - **Store** (`store`): Record store trait and in-memory store
//! - **Persistence** (`persistence`): On-disk database file
//! - **Service** (`service`): Write path keeping store, index and tags in step
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```
//! use tagmark_core::{Bookmark, SearchIndex, SearchOptions};
//!
//! let index = SearchIndex::new();
//! index.add_bookmark(&Bookmark::new("b1", "Rust Guide", "https://rust-lang.org"));
//!
//! let results = index.search(&SearchOptions::new("rust"));
//! assert_eq!(results[0].bookmark.id.as_str(), "b1");
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod persistence;
pub mod search;
pub mod service;
pub mod store;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TagmarkError};
pub use index::{IndexOptions, SearchIndex};
pub use persistence::FileStore;
pub use search::{parse_query, MatchedField, SearchOptions, SearchResult, SortBy, SortOrder};
pub use service::{
    BookmarkDraft, BookmarkPatch, BookmarkService, CategoryDraft, CategoryPatch, CategoryService,
    TagService,
};
pub use store::{BookmarkStore, ChangeEvent, ChangeKind, DatabaseSnapshot, MemoryStore};
pub use types::{Bookmark, BookmarkId, Category, CategoryId, IndexStats, Tag, TagId, Timestamp};
