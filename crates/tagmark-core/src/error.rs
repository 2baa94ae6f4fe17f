//! Error types for Tagmark core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while higher-level code can use `anyhow` for
//! convenient error handling.
//!
//! The search index itself never returns errors: malformed or missing fields
//! simply contribute fewer terms. Everything here belongs to the store,
//! service and configuration layers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TagmarkError
pub type Result<T> = std::result::Result<T, TagmarkError>;

/// Core error types for Tagmark operations.
#[derive(Error, Debug)]
pub enum TagmarkError {
    // === Record Errors ===
    /// No bookmark with this id exists in the store
    #[error("bookmark not found: {id}")]
    BookmarkNotFound { id: String },

    /// No category with this id exists in the store
    #[error("category not found: {id}")]
    CategoryNotFound { id: String },

    /// No tag with this id exists in the store
    #[error("tag not found: {id}")]
    TagNotFound { id: String },

    // === Constraint Errors ===
    /// A category that still has subcategories cannot be deleted
    #[error("category {id} has subcategories and cannot be deleted")]
    CategoryHasChildren { id: String },

    /// A category still referenced by bookmarks cannot be deleted
    #[error("category {id} is used by {bookmarks} bookmark(s) and cannot be deleted")]
    CategoryInUse { id: String, bookmarks: usize },

    /// The requested parent would make a category its own ancestor
    #[error("category {parent} cannot be the parent of {id}: it would form a cycle")]
    CategoryCycle { id: String, parent: String },

    /// A tag that is still in use cannot be deleted
    #[error("tag {id} is still used by {usage_count} bookmark(s) and cannot be deleted")]
    TagInUse { id: String, usage_count: u32 },

    // === Query Errors ===
    /// The inline query syntax could not be parsed
    #[error("invalid query {input:?}: {reason}")]
    InvalidQuery { input: String, reason: String },

    // === Store Errors ===
    /// The database file is missing
    #[error("database not found at {path}")]
    StoreNotFound { path: PathBuf },

    /// The database file exists but is corrupted or unreadable
    #[error("database is corrupted: {reason}")]
    StoreCorrupted { reason: String },

    /// The database file was written by a newer format version
    #[error("database version mismatch: found {found}, expected {expected}")]
    StoreVersionMismatch { found: u32, expected: u32 },

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    // === Internal Errors ===
    /// Internal error that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl TagmarkError {
    /// Returns true if the error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TagmarkError::BookmarkNotFound { .. }
                | TagmarkError::CategoryNotFound { .. }
                | TagmarkError::TagNotFound { .. }
        )
    }

    /// Returns true if a referential constraint refused the operation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            TagmarkError::CategoryHasChildren { .. }
                | TagmarkError::CategoryInUse { .. }
                | TagmarkError::CategoryCycle { .. }
                | TagmarkError::TagInUse { .. }
        )
    }

    /// Returns true if the database file should be restored from backup
    pub fn requires_restore(&self) -> bool {
        matches!(
            self,
            TagmarkError::StoreCorrupted { .. } | TagmarkError::StoreVersionMismatch { .. }
        )
    }

    /// Create a bookmark-not-found error
    pub fn bookmark_not_found(id: impl Into<String>) -> Self {
        TagmarkError::BookmarkNotFound { id: id.into() }
    }

    /// Create a store corruption error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        TagmarkError::StoreCorrupted {
            reason: reason.into(),
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(input: impl Into<String>, reason: impl Into<String>) -> Self {
        TagmarkError::InvalidQuery {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        TagmarkError::Serialization(reason.into())
    }
}

impl From<bincode::Error> for TagmarkError {
    fn from(err: bincode::Error) -> Self {
        TagmarkError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TagmarkError {
    fn from(err: serde_json::Error) -> Self {
        TagmarkError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(TagmarkError::bookmark_not_found("b1").is_not_found());
        assert!(TagmarkError::TagNotFound {
            id: "t1".to_string()
        }
        .is_not_found());
        assert!(!TagmarkError::corrupted("bad magic").is_not_found());
    }

    #[test]
    fn test_constraint_violation() {
        let err = TagmarkError::CategoryInUse {
            id: "c1".to_string(),
            bookmarks: 3,
        };
        assert!(err.is_constraint_violation());
        assert!(!err.requires_restore());
        assert_eq!(
            err.to_string(),
            "category c1 is used by 3 bookmark(s) and cannot be deleted"
        );
    }

    #[test]
    fn test_requires_restore() {
        assert!(TagmarkError::corrupted("checksum").requires_restore());
        assert!(TagmarkError::StoreVersionMismatch {
            found: 9,
            expected: 1
        }
        .requires_restore());
        assert!(!TagmarkError::StoreNotFound {
            path: PathBuf::from("/tmp/x")
        }
        .requires_restore());
    }
}
