//! In-memory inverted index for ranked bookmark search.
//!
//! The `SearchIndex` is the central data structure of Tagmark. It supports:
//!
//! - Full rebuilds from a snapshot of the record store
//! - Incremental add/update/remove driven by store changes
//! - Ranked, filtered, sorted search with optional parallel scoring
//!
//! ## Architecture
//!
//! - A `HashMap<String, PostingList>` maps each term to the documents that
//!   contain it and how often
//! - A `HashMap<BookmarkId, IndexedDocument>` caches the index's own copy of
//!   every document, together with an insertion sequence used to keep ties
//!   in a stable order
//!
//! Both maps live behind one `RwLock`, so a mutation is never observed half
//! applied and an update's remove+add is atomic with respect to searches.
//!
//! Removal and scoring re-derive terms from the cached copy, never from a
//! caller-supplied bookmark, so postings and cache always describe the same
//! version of a document.

use crate::search::{MatchedField, SearchOptions, SearchResult};
use crate::store::{ChangeEvent, ChangeKind};
use crate::tokenizer::{extract_terms, term_frequencies, tokenize};
use crate::types::{Bookmark, BookmarkId, IndexStats};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

/// Default candidate count at which scoring switches to Rayon
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// Document id to in-document term frequency (always >= 1)
pub type PostingList = HashMap<BookmarkId, u32>;

/// Tuning knobs for the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Score candidates in parallel once there are at least this many.
    /// Zero disables parallel scoring.
    pub parallel_threshold: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    bookmark: Bookmark,
    sequence: u64,
}

#[derive(Debug, Default)]
struct IndexState {
    postings: HashMap<String, PostingList>,
    documents: HashMap<BookmarkId, IndexedDocument>,
    next_sequence: u64,
}

impl IndexState {
    fn insert(&mut self, bookmark: &Bookmark) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        for term in extract_terms(bookmark) {
            *self
                .postings
                .entry(term)
                .or_default()
                .entry(bookmark.id.clone())
                .or_insert(0) += 1;
        }

        self.documents.insert(
            bookmark.id.clone(),
            IndexedDocument {
                bookmark: bookmark.clone(),
                sequence,
            },
        );
    }

    fn remove(&mut self, id: &BookmarkId) -> bool {
        let Some(document) = self.documents.remove(id) else {
            return false;
        };

        for term in term_frequencies(&document.bookmark).into_keys() {
            if let Entry::Occupied(mut entry) = self.postings.entry(term) {
                entry.get_mut().remove(id);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
        }

        true
    }

    fn clear(&mut self) {
        self.postings.clear();
        self.documents.clear();
        self.next_sequence = 0;
    }

    /// Documents appearing in at least one query term's posting list.
    fn candidates(&self, query_terms: &[String]) -> Vec<&IndexedDocument> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for term in query_terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            for id in postings.keys() {
                if seen.insert(id) {
                    if let Some(document) = self.documents.get(id) {
                        candidates.push(document);
                    }
                }
            }
        }

        candidates
    }

    /// Score a cached document against the query terms.
    ///
    /// Each query term adds the document's stored frequency. A term that is
    /// one of the document's own terms also unlocks the field bonuses; each
    /// bonus is awarded at most once per document.
    fn score(&self, bookmark: &Bookmark, query_terms: &[String]) -> (u32, Vec<MatchedField>) {
        let mut score = 0u32;
        let mut matched = Vec::new();
        let mut document_terms: Option<Vec<String>> = None;

        for term in query_terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            score += postings.get(&bookmark.id).copied().unwrap_or(0);

            let terms = document_terms.get_or_insert_with(|| extract_terms(bookmark));
            if !terms.contains(term) {
                continue;
            }

            for field in fields_containing(bookmark, term) {
                if !matched.contains(&field) {
                    matched.push(field);
                    score += field.bonus();
                }
            }
        }

        (score, matched)
    }

    fn ranked_result(&self, document: &IndexedDocument, query_terms: &[String]) -> (u64, SearchResult) {
        let (score, matched) = self.score(&document.bookmark, query_terms);
        (
            document.sequence,
            SearchResult::new(document.bookmark.clone(), score, matched),
        )
    }
}

/// Fields whose raw, lower-cased value contains `term` as a substring.
fn fields_containing(bookmark: &Bookmark, term: &str) -> Vec<MatchedField> {
    let contains = |text: &str| text.to_lowercase().contains(term);
    let mut fields = Vec::with_capacity(4);

    if contains(&bookmark.title) {
        fields.push(MatchedField::Title);
    }
    if bookmark.tags.iter().any(|tag| contains(tag.as_str())) {
        fields.push(MatchedField::Tags);
    }
    if bookmark.description.as_deref().is_some_and(contains) {
        fields.push(MatchedField::Description);
    }
    if bookmark.notes.as_deref().is_some_and(contains) {
        fields.push(MatchedField::Notes);
    }

    fields
}

/// The inverted index over all bookmarks.
///
/// This structure is designed for concurrent access:
/// - Multiple readers can search simultaneously
/// - Mutations are serialized via an internal write lock
///
/// Callers must still order mutations themselves (persist, then index) so
/// that the index follows the record store; see
/// [`BookmarkService`](crate::service::BookmarkService).
///
/// ## Example
///
/// ```rust
/// use tagmark_core::{Bookmark, SearchIndex, SearchOptions};
///
/// let index = SearchIndex::new();
/// index.add_bookmark(&Bookmark::new("1", "Rust Guide", "https://rust-lang.org"));
///
/// let results = index.search(&SearchOptions::new("rust"));
/// assert_eq!(results.len(), 1);
/// ```
pub struct SearchIndex {
    state: RwLock<IndexState>,

    options: IndexOptions,

    /// Bumped on every mutation
    generation: AtomicU64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::with_options(IndexOptions::default())
    }

    /// Create an empty index with explicit tuning.
    pub fn with_options(options: IndexOptions) -> Self {
        SearchIndex {
            state: RwLock::new(IndexState::default()),
            options,
            generation: AtomicU64::new(0),
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Check if the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.state.read().documents.is_empty()
    }

    /// Term and document counts.
    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            term_count: state.postings.len(),
            document_count: state.documents.len(),
        }
    }

    /// Get the current generation (modification counter).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The index's copy of a document.
    pub fn get(&self, id: &BookmarkId) -> Option<Bookmark> {
        self.state
            .read()
            .documents
            .get(id)
            .map(|document| document.bookmark.clone())
    }

    /// Check whether a document is indexed.
    pub fn contains(&self, id: &BookmarkId) -> bool {
        self.state.read().documents.contains_key(id)
    }

    /// Stored frequency of `term` in a document, if it has a posting.
    pub fn term_frequency(&self, term: &str, id: &BookmarkId) -> Option<u32> {
        self.state
            .read()
            .postings
            .get(term)
            .and_then(|postings| postings.get(id))
            .copied()
    }

    /// Add a document to the index.
    ///
    /// The index stores its own clone of the bookmark. The id must not
    /// already be indexed: adding twice without a removal in between leaves
    /// the old postings in place and doubles frequencies. Use
    /// [`update_bookmark`](Self::update_bookmark) for documents that may
    /// already exist.
    pub fn add_bookmark(&self, bookmark: &Bookmark) {
        self.state.write().insert(bookmark);
        self.generation.fetch_add(1, Ordering::Release);
        debug!(id = %bookmark.id, "Indexed bookmark");
    }

    /// Replace a document: full removal of the old postings, then insertion.
    pub fn update_bookmark(&self, bookmark: &Bookmark) {
        {
            let mut state = self.state.write();
            state.remove(&bookmark.id);
            state.insert(bookmark);
        }
        self.generation.fetch_add(1, Ordering::Release);
        debug!(id = %bookmark.id, "Reindexed bookmark");
    }

    /// Remove a document. Unknown ids are ignored.
    pub fn remove_bookmark(&self, id: &BookmarkId) {
        let removed = self.state.write().remove(id);
        if removed {
            self.generation.fetch_add(1, Ordering::Release);
            debug!(id = %id, "Removed bookmark from index");
        }
    }

    /// Discard all state and index `bookmarks` in order.
    #[instrument(skip_all, fields(documents = bookmarks.len()))]
    pub fn rebuild_index(&self, bookmarks: &[Bookmark]) {
        let term_count = {
            let mut state = self.state.write();
            state.clear();
            for bookmark in bookmarks {
                state.insert(bookmark);
            }
            state.postings.len()
        };
        self.generation.fetch_add(1, Ordering::Release);

        info!(
            documents = bookmarks.len(),
            terms = term_count,
            "Search index rebuilt"
        );
    }

    /// Apply a persisted change to the index.
    pub fn apply_change(&self, event: ChangeEvent) {
        debug!(kind = %event.kind, id = %event.bookmark_id, "Applying change event");

        match (event.kind, event.bookmark) {
            (ChangeKind::Created, Some(bookmark)) => self.add_bookmark(&bookmark),
            (ChangeKind::Updated, Some(bookmark)) => self.update_bookmark(&bookmark),
            (ChangeKind::Deleted, _) => self.remove_bookmark(&event.bookmark_id),
            (kind, None) => {
                warn!(kind = %kind, id = %event.bookmark_id, "Change event without bookmark ignored");
            }
        }
    }

    /// Search the index.
    ///
    /// With an empty query every document passing the filters is returned
    /// with score 0. Otherwise every document containing at least one query
    /// term is a candidate; candidates passing the filters are scored.
    /// Results are then sorted (stable, ties in insertion order) and
    /// truncated to the limit.
    pub fn search(&self, options: &SearchOptions) -> Vec<SearchResult> {
        let query_terms = tokenize(&options.query);

        let mut hits: Vec<(u64, SearchResult)> = {
            let state = self.state.read();

            if query_terms.is_empty() {
                state
                    .documents
                    .values()
                    .filter(|document| options.matches_filters(&document.bookmark))
                    .map(|document| {
                        (
                            document.sequence,
                            SearchResult::unranked(document.bookmark.clone()),
                        )
                    })
                    .collect()
            } else {
                let candidates: Vec<&IndexedDocument> = state
                    .candidates(&query_terms)
                    .into_iter()
                    .filter(|document| options.matches_filters(&document.bookmark))
                    .collect();

                if self.use_parallel(candidates.len()) {
                    let state = &*state;
                    candidates
                        .par_iter()
                        .map(|document| state.ranked_result(document, &query_terms))
                        .collect()
                } else {
                    candidates
                        .iter()
                        .map(|document| state.ranked_result(document, &query_terms))
                        .collect()
                }
            }
        };

        hits.sort_unstable_by_key(|(sequence, _)| *sequence);
        let mut results: Vec<SearchResult> = hits.into_iter().map(|(_, result)| result).collect();
        results.sort_by(|a, b| options.compare(a, b));

        if let Some(limit) = options.effective_limit() {
            results.truncate(limit);
        }

        debug!(
            query = %options.query,
            terms = query_terms.len(),
            results = results.len(),
            "Search complete"
        );

        results
    }

    fn use_parallel(&self, candidates: usize) -> bool {
        self.options.parallel_threshold > 0 && candidates >= self.options.parallel_threshold
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("SearchIndex")
            .field("documents", &stats.document_count)
            .field("terms", &stats.term_count)
            .field("generation", &self.generation())
            .finish()
    }
}
