//! Fuzzy catalog search endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tunedex_common::models::{CatalogEntry, CatalogKind};

use crate::search::ScoredMatch;
use crate::AppState;

use super::{parse_kind, ApiError};

/// Default maximum score when the client sends none
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Query parameters for catalog search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Dataset to search (songs, artists, genres, styles)
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Query text; blank matches nothing
    #[serde(default)]
    pub q: String,

    /// Maximum score to keep (0.0 = identical, 1.0 = keep everything)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_kind() -> String {
    "artists".to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// One match with its distance from the query
#[derive(Debug, Serialize)]
pub struct MatchPayload {
    pub entry: CatalogEntry,
    pub score: f64,
}

/// Search response with both match buckets
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub kind: CatalogKind,
    pub query: String,
    pub threshold: f64,
    /// Size of the candidate pool searched; 0 when the catalog could
    /// not be loaded
    pub candidate_count: usize,
    pub exact: Vec<MatchPayload>,
    pub partial: Vec<MatchPayload>,
}

/// GET /api/search?kind=artists&q=the+beatles&threshold=0.4
///
/// An unavailable catalog degrades to an empty result rather than an
/// error; `candidate_count` tells the two cases apart.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let kind = parse_kind(&params.kind)?;

    let candidates = match state.catalog.candidates(kind).await {
        Some(candidates) => candidates,
        None => {
            warn!(kind = %kind, "catalog unavailable, returning empty search result");
            return Ok(Json(SearchResponse {
                kind,
                query: params.q,
                threshold: params.threshold,
                candidate_count: 0,
                exact: Vec::new(),
                partial: Vec::new(),
            }));
        }
    };

    let matches = crate::search::search(&params.q, &candidates, params.threshold);
    debug!(
        kind = %kind,
        query = %params.q,
        exact = matches.exact.len(),
        partial = matches.partial.len(),
        "search complete"
    );

    Ok(Json(SearchResponse {
        kind,
        query: params.q,
        threshold: params.threshold,
        candidate_count: candidates.len(),
        exact: to_payload(matches.exact),
        partial: to_payload(matches.partial),
    }))
}

fn to_payload(matches: Vec<ScoredMatch<'_>>) -> Vec<MatchPayload> {
    matches
        .into_iter()
        .map(|m| MatchPayload {
            entry: m.entry.clone(),
            score: m.score,
        })
        .collect()
}
