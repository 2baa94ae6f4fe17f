//! Record store traits and change notifications.
//!
//! This module defines the abstract interface the service layer uses for
//! durable data. The search index never talks to a store: the service writes
//! to the store first, then forwards the same change to the index as a
//! [`ChangeEvent`].
//!
//! ## Implementing a New Store
//!
//! 1. Implement [`BookmarkStore`] (get/put/delete/all per entity type)
//! 2. Make every mutation durable before returning `Ok`
//! 3. Return records from the `all_*` methods in a stable order

use crate::error::Result;
use crate::types::{Bookmark, BookmarkId, Category, CategoryId, Tag, TagId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Current version of the snapshot layout
pub const SNAPSHOT_VERSION: u32 = 1;

/// A complete copy of every record in a store.
///
/// This is both the unit of import/export and the payload of the on-disk
/// database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    pub version: u32,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Default for DatabaseSnapshot {
    fn default() -> Self {
        DatabaseSnapshot {
            version: SNAPSHOT_VERSION,
            bookmarks: Vec::new(),
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl DatabaseSnapshot {
    /// Total number of records of all types
    pub fn record_count(&self) -> usize {
        self.bookmarks.len() + self.categories.len() + self.tags.len()
    }
}

/// The kind of change applied to a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new bookmark was stored
    Created,

    /// An existing bookmark was replaced
    Updated,

    /// A bookmark was deleted
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// A bookmark change that has already been persisted.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The kind of change
    pub kind: ChangeKind,

    /// Bookmark affected by the change
    pub bookmark_id: BookmarkId,

    /// New content for creates and updates; `None` for deletes
    pub bookmark: Option<Bookmark>,
}

impl ChangeEvent {
    /// Create a create event
    pub fn created(bookmark: Bookmark) -> Self {
        ChangeEvent {
            kind: ChangeKind::Created,
            bookmark_id: bookmark.id.clone(),
            bookmark: Some(bookmark),
        }
    }

    /// Create an update event
    pub fn updated(bookmark: Bookmark) -> Self {
        ChangeEvent {
            kind: ChangeKind::Updated,
            bookmark_id: bookmark.id.clone(),
            bookmark: Some(bookmark),
        }
    }

    /// Create a delete event
    pub fn deleted(bookmark_id: BookmarkId) -> Self {
        ChangeEvent {
            kind: ChangeKind::Deleted,
            bookmark_id,
            bookmark: None,
        }
    }
}

/// Abstract key-value store for bookmarks, categories and tags.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the service layer shares a store
/// behind an `Arc` and serializes its own mutations.
///
/// ## Error Handling
///
/// Deleting a missing record is not an error: the `delete_*` methods return
/// `Ok(false)`. Errors are reserved for I/O and encoding failures.
pub trait BookmarkStore: Send + Sync {
    fn get_bookmark(&self, id: &BookmarkId) -> Result<Option<Bookmark>>;

    /// Insert or replace a bookmark
    fn put_bookmark(&self, bookmark: &Bookmark) -> Result<()>;

    fn delete_bookmark(&self, id: &BookmarkId) -> Result<bool>;

    /// All bookmarks, ordered by creation time then id
    fn all_bookmarks(&self) -> Result<Vec<Bookmark>>;

    fn get_category(&self, id: &CategoryId) -> Result<Option<Category>>;

    fn put_category(&self, category: &Category) -> Result<()>;

    fn delete_category(&self, id: &CategoryId) -> Result<bool>;

    /// All categories, ordered by creation time then id
    fn all_categories(&self) -> Result<Vec<Category>>;

    fn get_tag(&self, id: &TagId) -> Result<Option<Tag>>;

    fn put_tag(&self, tag: &Tag) -> Result<()>;

    fn delete_tag(&self, id: &TagId) -> Result<bool>;

    /// All tags, ordered by name
    fn all_tags(&self) -> Result<Vec<Tag>>;

    /// Copy every record out of the store
    fn snapshot(&self) -> Result<DatabaseSnapshot>;

    /// Discard every record and load the snapshot instead
    fn replace_all(&self, snapshot: DatabaseSnapshot) -> Result<()>;

    /// Bookmarks filed under a category
    fn bookmarks_in_category(&self, category_id: &CategoryId) -> Result<Vec<Bookmark>> {
        Ok(self
            .all_bookmarks()?
            .into_iter()
            .filter(|b| b.category_id.as_ref() == Some(category_id))
            .collect())
    }

    /// Look a tag up by its unique name
    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.all_tags()?.into_iter().find(|t| t.name == name))
    }
}

#[derive(Debug, Default)]
struct Tables {
    bookmarks: HashMap<BookmarkId, Bookmark>,
    categories: HashMap<CategoryId, Category>,
    tags: HashMap<TagId, Tag>,
}

impl Tables {
    fn from_snapshot(snapshot: DatabaseSnapshot) -> Self {
        Tables {
            bookmarks: snapshot
                .bookmarks
                .into_iter()
                .map(|b| (b.id.clone(), b))
                .collect(),
            categories: snapshot
                .categories
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            tags: snapshot.tags.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}

/// A store that keeps everything in memory.
///
/// Used directly in tests and as the working image behind
/// [`FileStore`](crate::persistence::FileStore).
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a snapshot
    pub fn from_snapshot(snapshot: DatabaseSnapshot) -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::from_snapshot(snapshot)),
        }
    }

    /// Number of stored bookmarks
    pub fn bookmark_count(&self) -> usize {
        self.tables.read().bookmarks.len()
    }
}

impl BookmarkStore for MemoryStore {
    fn get_bookmark(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        Ok(self.tables.read().bookmarks.get(id).cloned())
    }

    fn put_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        self.tables
            .write()
            .bookmarks
            .insert(bookmark.id.clone(), bookmark.clone());
        Ok(())
    }

    fn delete_bookmark(&self, id: &BookmarkId) -> Result<bool> {
        Ok(self.tables.write().bookmarks.remove(id).is_some())
    }

    fn all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let mut bookmarks: Vec<Bookmark> = self.tables.read().bookmarks.values().cloned().collect();
        bookmarks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bookmarks)
    }

    fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.read().categories.get(id).cloned())
    }

    fn put_category(&self, category: &Category) -> Result<()> {
        self.tables
            .write()
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        Ok(self.tables.write().categories.remove(id).is_some())
    }

    fn all_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    fn get_tag(&self, id: &TagId) -> Result<Option<Tag>> {
        Ok(self.tables.read().tags.get(id).cloned())
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        self.tables.write().tags.insert(tag.id.clone(), tag.clone());
        Ok(())
    }

    fn delete_tag(&self, id: &TagId) -> Result<bool> {
        Ok(self.tables.write().tags.remove(id).is_some())
    }

    fn all_tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.tables.read().tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn snapshot(&self) -> Result<DatabaseSnapshot> {
        Ok(DatabaseSnapshot {
            version: SNAPSHOT_VERSION,
            bookmarks: self.all_bookmarks()?,
            categories: self.all_categories()?,
            tags: self.all_tags()?,
        })
    }

    fn replace_all(&self, snapshot: DatabaseSnapshot) -> Result<()> {
        *self.tables.write() = Tables::from_snapshot(snapshot);
        Ok(())
    }
}
