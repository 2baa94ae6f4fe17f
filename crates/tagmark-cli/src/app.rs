//! Application state management.

use std::sync::Arc;
use tagmark_core::{
    BookmarkService, CategoryService, Config, FileStore, SearchIndex, TagService,
};
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// Record persistence
    pub store: Arc<FileStore>,

    /// The search index
    pub index: Arc<SearchIndex>,

    pub bookmarks: BookmarkService<FileStore>,
    pub categories: CategoryService<FileStore>,
    pub tags: TagService<FileStore>,
}

impl App {
    /// Open the database and build the search index.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let data_dir = config.data_dir()?;
        let store = Arc::new(FileStore::open_or_restore(&data_dir)?.with_compression(config.storage.compress));
        let index = Arc::new(SearchIndex::with_options(config.index_options()));

        let bookmarks = BookmarkService::new(store.clone(), index.clone());
        bookmarks.initialize()?;

        info!(
            data_dir = %data_dir.display(),
            bookmarks = index.len(),
            "Application initialized"
        );

        Ok(App {
            categories: CategoryService::new(store.clone()),
            tags: TagService::new(store.clone()),
            config,
            store,
            index,
            bookmarks,
        })
    }
}
