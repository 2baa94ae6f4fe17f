//! Core data types for Tagmark.
//!
//! This module defines the records shared by the search index, the record
//! store and the service layer. These types are designed to be:
//!
//! - **Serializable**: bincode for the database file, camelCase JSON for
//!   export and import
//! - **Owned**: the index keeps its own copy of every bookmark it indexes,
//!   so every type here is a plain value with `Clone`

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Generate a fresh, collision-resistant identifier
            pub fn generate() -> Self {
                $name(uuid::Uuid::new_v4().simple().to_string())
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique, immutable identifier of a bookmark.
    BookmarkId
);

string_id!(
    /// Identifier of a category. Bookmarks reference categories by id only.
    CategoryId
);

string_id!(
    /// Identifier of a tag record.
    TagId
);

/// A saved link. This is the document the search index tokenizes and ranks.
///
/// ## Design Notes
///
/// - `tags` is an ordered set: insertion order is kept, duplicates are
///   rejected by the service layer before a bookmark is stored
/// - `created_at` never changes after creation; `updated_at` moves forward on
///   every update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique identifier
    pub id: BookmarkId,

    /// Display title
    pub title: String,

    /// Target URL, stored as entered
    pub url: String,

    /// Optional short description
    #[serde(default)]
    pub description: Option<String>,

    /// Optional free-form notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Category this bookmark is filed under, if any
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Tag names, in the order they were added
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation time
    pub created_at: Timestamp,

    /// Last modification time
    pub updated_at: Timestamp,

    /// Marked as favorite
    #[serde(default)]
    pub favorite: bool,

    /// Archived (hidden from the default listing by most front ends)
    #[serde(default)]
    pub archived: bool,
}

impl Bookmark {
    /// Create a bookmark with the given id, title and URL.
    ///
    /// Both timestamps are set to the current time.
    pub fn new(id: impl Into<BookmarkId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let now = now_millis();
        Bookmark {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            description: None,
            notes: None,
            category_id: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            favorite: false,
            archived: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the category
    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Replace the tag list
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set both timestamps
    pub fn with_timestamps(mut self, created_at: Timestamp, updated_at: Timestamp) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Set the favorite flag
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// Set the archived flag
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    /// Check whether the bookmark carries this exact tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A category bookmarks can be filed under. Categories form a tree through
/// `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A tag record with its usage bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,

    /// Tag name, unique across the store
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,

    pub created_at: Timestamp,

    /// Number of bookmarks currently carrying this tag
    pub usage_count: u32,
}

impl Tag {
    /// Create a tag with a fresh id and the given usage count
    pub fn new(name: impl Into<String>, usage_count: u32) -> Self {
        Tag {
            id: TagId::generate(),
            name: name.into(),
            color: None,
            created_at: now_millis(),
            usage_count,
        }
    }
}

/// Diagnostic statistics about the search index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of distinct terms with a non-empty posting list
    pub term_count: usize,

    /// Number of documents in the index's cache
    pub document_count: usize,
}
