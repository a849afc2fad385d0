//! Chunked catalog loading
//!
//! Datasets are published as `{kind}-chunks/index.json` (geometry) plus
//! 1-based `{kind}-chunks/chunk_{n}.json` files, with an optional
//! unchunked `{kind}.json` fallback. Every loader here is fail-soft:
//! any fetch or parse problem becomes `None` (or a result missing that
//! chunk's records for per-chunk failures), never an error.
//! Degradations are logged at `warn` so operators can see what callers
//! cannot.

use std::sync::Arc;

use futures::future;
use serde::de::DeserializeOwned;
use tracing::warn;

use tunedex_common::models::{CatalogEntry, CatalogKind, ChunkIndex};

use super::source::DataSource;

/// Fail-soft reader for chunked catalog datasets
pub struct ChunkStore {
    source: Arc<dyn DataSource>,
}

impl ChunkStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Load the chunk geometry for a dataset
    ///
    /// Returns `None` when the index is missing, malformed, or declares
    /// a zero chunk size (which would poison all position arithmetic).
    pub async fn load_index(&self, kind: CatalogKind) -> Option<ChunkIndex> {
        let path = format!("{}-chunks/index.json", kind);
        let index: ChunkIndex = self.fetch_json(&path).await?;
        if !index.is_usable() {
            warn!(kind = %kind, "chunk index declares zero chunkSize, treating dataset as unavailable");
            return None;
        }
        Some(index)
    }

    /// Load one 1-based chunk as a record array
    pub async fn load_chunk(&self, kind: CatalogKind, number: usize) -> Option<Vec<CatalogEntry>> {
        let path = format!("{}-chunks/chunk_{}.json", kind, number);
        self.fetch_json(&path).await
    }

    /// Load the entire dataset by fetching all chunks concurrently
    ///
    /// Chunks that fail to load are skipped (with a warning) rather than
    /// failing the whole load; the result is `None` only when the index
    /// itself is unavailable. Records always appear in chunk-number
    /// order no matter which fetches finish first.
    pub async fn load_all(&self, kind: CatalogKind) -> Option<Vec<CatalogEntry>> {
        let index = self.load_index(kind).await?;
        Some(self.load_chunk_run(kind, 1, index.total_chunks).await)
    }

    /// Load the half-open record range `start..end` (0-based positions)
    ///
    /// Fetches only the chunks covering the range and keeps the records
    /// whose global position falls inside it, so a range ending on a
    /// chunk boundary consumes its final chunk whole and a range
    /// overhanging the final short chunk returns what exists. A chunk
    /// that fails to load leaves a gap in the window; records outside
    /// the requested positions are never returned. An empty or inverted
    /// range yields an empty vec.
    pub async fn load_range(
        &self,
        kind: CatalogKind,
        start: usize,
        end: usize,
    ) -> Option<Vec<CatalogEntry>> {
        let index = self.load_index(kind).await?;
        if start >= end || index.total_chunks == 0 {
            return Some(Vec::new());
        }

        let first = index.chunk_for(start);
        let last = end.div_ceil(index.chunk_size).min(index.total_chunks);
        if first > last {
            // Range lies entirely past the dataset
            return Some(Vec::new());
        }

        // join_all yields results in input order, so chunks arrive in
        // chunk-number order regardless of fetch completion order
        let fetches = (first..=last).map(|number| self.load_chunk(kind, number));
        let results = future::join_all(fetches).await;

        // Carve by global position rather than slicing the concatenation,
        // so a missing chunk cannot shift later records into the window
        let mut records = Vec::new();
        for (offset, chunk) in results.into_iter().enumerate() {
            let number = first + offset;
            match chunk {
                Some(entries) => {
                    let base = (number - 1) * index.chunk_size;
                    for (i, entry) in entries.into_iter().enumerate() {
                        let position = base + i;
                        if position >= start && position < end {
                            records.push(entry);
                        }
                    }
                }
                None => {
                    warn!(kind = %kind, chunk = number, "skipping unavailable chunk");
                }
            }
        }
        Some(records)
    }

    /// Load the unchunked `{kind}.json` dataset in one fetch
    ///
    /// Fallback for datasets small enough that the publisher never split
    /// them.
    pub async fn load_full(&self, kind: CatalogKind) -> Option<Vec<CatalogEntry>> {
        let path = format!("{}.json", kind);
        self.fetch_json(&path).await
    }

    /// Fetch chunks `first..=last` concurrently, concatenated in chunk
    /// order, skipping failures
    async fn load_chunk_run(
        &self,
        kind: CatalogKind,
        first: usize,
        last: usize,
    ) -> Vec<CatalogEntry> {
        if first > last {
            return Vec::new();
        }

        // join_all yields results in input order, so the concatenation is
        // ordered by chunk number regardless of fetch completion order
        let fetches = (first..=last).map(|number| self.load_chunk(kind, number));
        let results = future::join_all(fetches).await;

        let mut records = Vec::new();
        for (offset, chunk) in results.into_iter().enumerate() {
            match chunk {
                Some(mut entries) => records.append(&mut entries),
                None => {
                    warn!(kind = %kind, chunk = first + offset, "skipping unavailable chunk");
                }
            }
        }
        records
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let bytes = match self.source.fetch(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path, error = %e, "catalog fetch failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path, error = %e, "catalog payload is not valid JSON");
                None
            }
        }
    }
}
