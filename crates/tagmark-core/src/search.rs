//! Query model for Tagmark searches.
//!
//! This module describes *what* a search asks for; the [`SearchIndex`]
//! decides *how* to answer it. It provides:
//!
//! - [`SearchOptions`]: free text plus structured filters, sort and limit
//! - The filter predicate shared by browsing and ranked search
//! - [`SearchResult`] and [`MatchedField`] for ranked output
//! - [`parse_query`]: inline search-box syntax (`tag:rust is:fav sort:title`)
//!
//! [`SearchIndex`]: crate::index::SearchIndex

use crate::error::{Result, TagmarkError};
use crate::types::{Bookmark, CategoryId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Bonus for a query term contained in the title
pub const TITLE_BONUS: u32 = 10;
/// Bonus for a query term contained in any tag
pub const TAG_BONUS: u32 = 8;
/// Bonus for a query term contained in the description
pub const DESCRIPTION_BONUS: u32 = 5;
/// Bonus for a query term contained in the notes
pub const NOTES_BONUS: u32 = 3;

/// Ordering key for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Ranked by score
    #[default]
    Relevance,
    /// Alphabetical by title
    Title,
    /// By creation time
    CreatedAt,
    /// By last modification time
    UpdatedAt,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" | "score" => Ok(SortBy::Relevance),
            "title" | "name" => Ok(SortBy::Title),
            "created" | "createdat" | "created_at" => Ok(SortBy::CreatedAt),
            "updated" | "updatedat" | "updated_at" => Ok(SortBy::UpdatedAt),
            _ => Err(format!("unknown sort key: {}", s)),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Relevance => write!(f, "relevance"),
            SortBy::Title => write!(f, "title"),
            SortBy::CreatedAt => write!(f, "created"),
            SortBy::UpdatedAt => write!(f, "updated"),
        }
    }
}

/// Direction applied on top of the [`SortBy`] comparator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// A search request.
///
/// An empty `query` means "browse": every document passing the filters is
/// returned unranked. Text matching is OR across query terms; filters are
/// AND across each other and across requested tags.
///
/// # Example
/// ```
/// use tagmark_core::{SearchOptions, SortBy};
///
/// let options = SearchOptions::new("rust guide")
///     .with_tag("lang")
///     .with_favorite(true)
///     .sort_by(SortBy::Title)
///     .with_limit(20);
/// assert_eq!(options.limit, Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Free text, tokenized like indexed content
    pub query: String,

    /// Exact category match
    pub category_id: Option<CategoryId>,

    /// Every listed tag must be present on the document
    pub tags: Vec<String>,

    /// Exact favorite flag match when set
    pub favorite: Option<bool>,

    /// Exact archived flag match when set
    pub archived: Option<bool>,

    pub sort_by: SortBy,

    pub sort_order: SortOrder,

    /// Maximum number of results; `None` or `Some(0)` is unbounded
    pub limit: Option<usize>,
}

impl SearchOptions {
    /// Create options for a free-text query with no filters.
    pub fn new(query: impl Into<String>) -> Self {
        SearchOptions {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Options that match every document.
    pub fn browse() -> Self {
        SearchOptions::default()
    }

    /// Restrict to one category
    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Require a tag (may be called repeatedly)
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Require the favorite flag to equal `favorite`
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    /// Require the archived flag to equal `archived`
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    /// Set the sort key
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Set the sort direction
    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The effective result cap, if any.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Check a document against the structured filters.
    ///
    /// Text relevance plays no part here.
    pub fn matches_filters(&self, bookmark: &Bookmark) -> bool {
        if let Some(category_id) = &self.category_id {
            if bookmark.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }

        if !self.tags.iter().all(|tag| bookmark.has_tag(tag)) {
            return false;
        }

        if self.favorite.is_some_and(|favorite| bookmark.favorite != favorite) {
            return false;
        }

        if self.archived.is_some_and(|archived| bookmark.archived != archived) {
            return false;
        }

        true
    }

    /// Compare two results according to `sort_by` and `sort_order`.
    ///
    /// The key comparison is ascending; `Desc` reverses it, so relevance
    /// with the default order puts the highest score first.
    pub fn compare(&self, a: &SearchResult, b: &SearchResult) -> Ordering {
        let ordering = match self.sort_by {
            SortBy::Relevance => a.score.cmp(&b.score),
            SortBy::Title => compare_titles(&a.bookmark.title, &b.bookmark.title),
            SortBy::CreatedAt => a.bookmark.created_at.cmp(&b.bookmark.created_at),
            SortBy::UpdatedAt => a.bookmark.updated_at.cmp(&b.bookmark.updated_at),
        };

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Title order on folded keys, falling back to the raw strings so that
/// "apple" and "Apple" still order deterministically.
fn compare_titles(a: &str, b: &str) -> Ordering {
    title_sort_key(a)
        .cmp(&title_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// Primary collation key: NFD-decomposed, combining marks stripped,
/// lower-cased. "Éclair" keys as "eclair".
pub fn title_sort_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// The bookmark field that earned a scoring bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Title,
    Tags,
    Description,
    Notes,
}

impl MatchedField {
    /// Bonus awarded the first time this field matches a query term
    pub fn bonus(&self) -> u32 {
        match self {
            MatchedField::Title => TITLE_BONUS,
            MatchedField::Tags => TAG_BONUS,
            MatchedField::Description => DESCRIPTION_BONUS,
            MatchedField::Notes => NOTES_BONUS,
        }
    }
}

impl fmt::Display for MatchedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedField::Title => write!(f, "title"),
            MatchedField::Tags => write!(f, "tags"),
            MatchedField::Description => write!(f, "description"),
            MatchedField::Notes => write!(f, "notes"),
        }
    }
}

/// A search result with relevance scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index's copy of the matching bookmark
    pub bookmark: Bookmark,

    /// Relevance score (higher is more relevant; 0 when browsing)
    pub score: u32,

    /// Fields that earned a bonus, in the order they first matched
    pub matched_fields: Vec<MatchedField>,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(bookmark: Bookmark, score: u32, matched_fields: Vec<MatchedField>) -> Self {
        SearchResult {
            bookmark,
            score,
            matched_fields,
        }
    }

    /// An unranked result, as produced by browsing
    pub fn unranked(bookmark: Bookmark) -> Self {
        SearchResult::new(bookmark, 0, Vec::new())
    }
}

// === Query Parsing ===

/// Parse a search-box string into [`SearchOptions`].
///
/// # Query Syntax
///
/// - `words` - free text, matched against indexed terms
/// - `tag:a,b` or `#a` - require tags
/// - `cat:id` / `category:id` - restrict to a category
/// - `is:fav` / `-is:fav` - favorites only / non-favorites only
/// - `is:archived` / `-is:archived` - archived only / live only
/// - `sort:relevance|title|created|updated` - sort key
/// - `order:asc|desc` - sort direction
/// - `limit:n` - result cap
pub fn parse_query(input: &str) -> Result<SearchOptions> {
    let input = input.trim();
    let mut options = SearchOptions::default();
    let mut text_parts = Vec::new();

    for part in input.split_whitespace() {
        if let Some(tags) = part.strip_prefix("tag:") {
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                options = options.with_tag(tag);
            }
        } else if let Some(tag) = part.strip_prefix('#').filter(|t| !t.is_empty()) {
            options = options.with_tag(tag);
        } else if let Some(category) = part
            .strip_prefix("cat:")
            .or_else(|| part.strip_prefix("category:"))
            .filter(|c| !c.is_empty())
        {
            options = options.with_category(category);
        } else if let Some(flag) = part.strip_prefix("is:") {
            apply_flag(&mut options, input, flag, true)?;
        } else if let Some(flag) = part.strip_prefix("-is:") {
            apply_flag(&mut options, input, flag, false)?;
        } else if let Some(key) = part.strip_prefix("sort:") {
            options.sort_by = key
                .parse()
                .map_err(|reason: String| TagmarkError::invalid_query(input, reason))?;
        } else if let Some(order) = part.strip_prefix("order:") {
            options.sort_order = order
                .parse()
                .map_err(|reason: String| TagmarkError::invalid_query(input, reason))?;
        } else if let Some(limit) = part.strip_prefix("limit:") {
            let limit = limit.parse::<usize>().map_err(|e| {
                TagmarkError::invalid_query(input, format!("bad limit {:?}: {}", limit, e))
            })?;
            options.limit = Some(limit);
        } else {
            text_parts.push(part);
        }
    }

    options.query = text_parts.join(" ");
    Ok(options)
}

fn apply_flag(options: &mut SearchOptions, input: &str, flag: &str, value: bool) -> Result<()> {
    match flag.to_lowercase().as_str() {
        "fav" | "favorite" | "favourite" => options.favorite = Some(value),
        "archived" | "archive" => options.archived = Some(value),
        other => {
            return Err(TagmarkError::invalid_query(
                input,
                format!("unknown flag: is:{}", other),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bookmark(tags: &[&str]) -> Bookmark {
        Bookmark::new("b1", "Title", "https://example.com").with_tags(tags.iter().copied())
    }

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.sort_by, SortBy::Relevance);
        assert_eq!(options.sort_order, SortOrder::Desc);
        assert_eq!(options.effective_limit(), None);
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let options = SearchOptions::new("x").with_limit(0);
        assert_eq!(options.effective_limit(), None);
        assert_eq!(options.with_limit(3).effective_limit(), Some(3));
    }

    #[test]
    fn test_filter_tags_and_semantics() {
        let bookmark = make_bookmark(&["a", "b"]);

        assert!(SearchOptions::browse().with_tag("a").matches_filters(&bookmark));
        assert!(SearchOptions::browse()
            .with_tag("a")
            .with_tag("b")
            .matches_filters(&bookmark));
        assert!(!SearchOptions::browse()
            .with_tag("a")
            .with_tag("c")
            .matches_filters(&bookmark));
    }

    #[test]
    fn test_filter_tags_exact_equality() {
        let bookmark = make_bookmark(&["Rust"]);
        assert!(!SearchOptions::browse().with_tag("rust").matches_filters(&bookmark));
    }

    #[test]
    fn test_filter_category() {
        let bookmark = make_bookmark(&[]).with_category("work");

        assert!(SearchOptions::browse().with_category("work").matches_filters(&bookmark));
        assert!(!SearchOptions::browse().with_category("home").matches_filters(&bookmark));
        assert!(!SearchOptions::browse()
            .with_category("work")
            .matches_filters(&make_bookmark(&[])));
    }

    #[test]
    fn test_filter_flags() {
        let bookmark = make_bookmark(&[]).with_favorite(true);

        assert!(SearchOptions::browse().with_favorite(true).matches_filters(&bookmark));
        assert!(!SearchOptions::browse().with_favorite(false).matches_filters(&bookmark));
        assert!(SearchOptions::browse().with_archived(false).matches_filters(&bookmark));
        assert!(!SearchOptions::browse().with_archived(true).matches_filters(&bookmark));
    }

    #[test]
    fn test_compare_relevance_desc_puts_highest_first() {
        let options = SearchOptions::new("x");
        let high = SearchResult::new(make_bookmark(&[]), 20, vec![]);
        let low = SearchResult::new(make_bookmark(&[]), 3, vec![]);

        assert_eq!(options.compare(&high, &low), Ordering::Less);
        assert_eq!(
            options.sort_order(SortOrder::Asc).compare(&high, &low),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_created_asc_puts_earliest_first() {
        let options = SearchOptions::browse()
            .sort_by(SortBy::CreatedAt)
            .sort_order(SortOrder::Asc);
        let early = SearchResult::unranked(make_bookmark(&[]).with_timestamps(1, 1));
        let late = SearchResult::unranked(make_bookmark(&[]).with_timestamps(5, 5));

        assert_eq!(options.compare(&early, &late), Ordering::Less);
    }

    #[test]
    fn test_compare_titles_case_insensitive() {
        assert_eq!(compare_titles("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_titles("Apple", "apple"), Ordering::Less);
        assert_eq!(compare_titles("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_compare_titles_folds_accents() {
        assert_eq!(title_sort_key("Éclair"), "eclair");
        assert_eq!(compare_titles("Éclair", "Fudge"), Ordering::Less);
        assert_eq!(compare_titles("Zebra", "Éclair"), Ordering::Greater);
        // folded keys tie, raw strings break it
        assert_ne!(compare_titles("Eclair", "Éclair"), Ordering::Equal);
    }

    #[test]
    fn test_parse_query_plain_text() {
        let options = parse_query("  rust   guide ").unwrap();
        assert_eq!(options.query, "rust guide");
        assert!(options.tags.is_empty());
    }

    #[test]
    fn test_parse_query_filters() {
        let options = parse_query("rust tag:lang,systems #book cat:dev is:fav -is:archived").unwrap();

        assert_eq!(options.query, "rust");
        assert_eq!(options.tags, vec!["lang", "systems", "book"]);
        assert_eq!(options.category_id, Some(CategoryId::new("dev")));
        assert_eq!(options.favorite, Some(true));
        assert_eq!(options.archived, Some(false));
    }

    #[test]
    fn test_parse_query_sort_and_limit() {
        let options = parse_query("sort:title order:asc limit:5").unwrap();

        assert!(options.query.is_empty());
        assert_eq!(options.sort_by, SortBy::Title);
        assert_eq!(options.sort_order, SortOrder::Asc);
        assert_eq!(options.limit, Some(5));
    }

    #[test]
    fn test_parse_query_duplicate_tags() {
        let options = parse_query("tag:a #a tag:a,b").unwrap();
        assert_eq!(options.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_query_errors() {
        assert!(matches!(
            parse_query("sort:colour"),
            Err(TagmarkError::InvalidQuery { .. })
        ));
        assert!(matches!(
            parse_query("order:sideways"),
            Err(TagmarkError::InvalidQuery { .. })
        ));
        assert!(matches!(
            parse_query("limit:ten"),
            Err(TagmarkError::InvalidQuery { .. })
        ));
        assert!(matches!(
            parse_query("is:pinned"),
            Err(TagmarkError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_matched_field_bonus() {
        assert_eq!(MatchedField::Title.bonus(), 10);
        assert_eq!(MatchedField::Tags.bonus(), 8);
        assert_eq!(MatchedField::Description.bonus(), 5);
        assert_eq!(MatchedField::Notes.bonus(), 3);
        assert_eq!(MatchedField::Notes.to_string(), "notes");
    }
}
