//! Subcommand implementations.

pub mod bookmark;
pub mod category;
pub mod clear;
pub mod search;
pub mod status;
pub mod tags;
pub mod transfer;

/// Render a millisecond timestamp for humans.
pub fn format_timestamp(millis: tagmark_core::Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
