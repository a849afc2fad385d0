//! Raw catalog access endpoints
//!
//! Pass-through views over the chunk store for clients that page the
//! catalog themselves instead of searching. Unavailable data surfaces
//! as JSON `null`, mirroring the loader's fail-soft contract.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use tunedex_common::models::{CatalogEntry, CatalogKind, ChunkIndex};

use crate::AppState;

use super::{parse_kind, ApiError};

/// Records returned when the client omits `end`
const DEFAULT_RANGE_LEN: usize = 100;

/// GET /api/catalog/:kind/index
///
/// The dataset's chunk geometry, or `null` when the index cannot be
/// loaded.
pub async fn catalog_index(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Option<ChunkIndex>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let index = state.catalog.store().load_index(kind).await;
    if index.is_none() {
        warn!(kind = %kind, "chunk index unavailable");
    }
    Ok(Json(index))
}

/// Query parameters for a record range
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    /// First record position (0-based, inclusive)
    #[serde(default)]
    pub start: usize,

    /// One past the last position; defaults to `start + 100`
    pub end: Option<usize>,
}

/// Record range response
#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub kind: CatalogKind,
    pub start: usize,
    pub end: usize,
    pub count: usize,
    /// `null` when the dataset index could not be loaded
    pub records: Option<Vec<CatalogEntry>>,
}

/// GET /api/catalog/:kind?start=25&end=45
pub async fn catalog_range(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let start = params.start;
    let end = params
        .end
        .unwrap_or_else(|| start.saturating_add(DEFAULT_RANGE_LEN));

    let records = state.catalog.store().load_range(kind, start, end).await;
    if records.is_none() {
        warn!(kind = %kind, start, end, "catalog range unavailable");
    }

    Ok(Json(RangeResponse {
        kind,
        start,
        end,
        count: records.as_ref().map_or(0, Vec::len),
        records,
    }))
}
