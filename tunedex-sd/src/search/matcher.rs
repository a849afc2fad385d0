//! Threshold fuzzy matching over normalized catalog names
//!
//! Scoring is normalized Levenshtein distance: `1.0 - similarity` as
//! computed by [`strsim::normalized_levenshtein`], so 0.0 is identical
//! and 1.0 is maximally different. A candidate survives when its score
//! is at or below the caller's threshold.

use std::cmp::Ordering;

use tunedex_common::models::CatalogEntry;

use super::normalize::{normalize, normalize_opt};

/// A catalog entry paired with its precomputed normalized key
///
/// Keys are computed once when the catalog loads, not per query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: CatalogEntry,
    pub key: String,
}

impl Candidate {
    pub fn new(entry: CatalogEntry) -> Self {
        let key = normalize_opt(entry.display_name.as_deref());
        Self { entry, key }
    }
}

/// One surviving candidate with its distance from the query
#[derive(Debug, Clone)]
pub struct ScoredMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub score: f64,
}

/// Search results split into exact and partial buckets
///
/// A candidate appears in `exact` when its normalized key equals the
/// normalized query, in `partial` when it merely survives the threshold.
/// No candidate appears in both. Each bucket is sorted by ascending
/// score; equal scores keep catalog order.
#[derive(Debug, Default)]
pub struct MatchSet<'a> {
    pub exact: Vec<ScoredMatch<'a>>,
    pub partial: Vec<ScoredMatch<'a>>,
}

impl MatchSet<'_> {
    pub fn len(&self) -> usize {
        self.exact.len() + self.partial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.partial.is_empty()
    }
}

/// Match `query` against `candidates`, keeping scores at or below
/// `threshold`
///
/// An empty (or whitespace-only, or article-only) query matches nothing.
/// Candidates with empty keys score 1.0 against any non-empty query, so
/// they only survive a threshold of 1.0 or higher.
pub fn search<'a>(query: &str, candidates: &'a [Candidate], threshold: f64) -> MatchSet<'a> {
    let key = normalize(query);
    if key.is_empty() || candidates.is_empty() {
        return MatchSet::default();
    }

    let mut exact = Vec::new();
    let mut partial = Vec::new();

    for candidate in candidates {
        let score = 1.0 - strsim::normalized_levenshtein(&key, &candidate.key);
        if score > threshold {
            continue;
        }
        let scored = ScoredMatch {
            entry: &candidate.entry,
            score,
        };
        if candidate.key == key {
            exact.push(scored);
        } else {
            partial.push(scored);
        }
    }

    // sort_by is stable, so equal scores keep their catalog order
    exact.sort_by(|a, b| score_order(a.score, b.score));
    partial.sort_by(|a, b| score_order(a.score, b.score));

    MatchSet { exact, partial }
}

fn score_order(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
