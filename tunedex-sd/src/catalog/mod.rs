//! Catalog loading and the session-scoped candidate cache
//!
//! [`Catalog`] owns one in-memory copy of each dataset for the life of
//! the process. Datasets load on first use: the chunked layout first,
//! then the unchunked single-file fallback. Failed loads are never
//! cached, so the next request retries from scratch.

pub mod chunks;
pub mod source;

pub use chunks::ChunkStore;
pub use source::{select_source, DataSource, FetchError, FileDataSource, HttpDataSource};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use tunedex_common::events::{EventBus, TunedexEvent};
use tunedex_common::models::CatalogKind;

use crate::search::Candidate;

/// Session-scoped catalog cache with precomputed match candidates
pub struct Catalog {
    store: ChunkStore,
    bus: EventBus,
    loaded: RwLock<HashMap<CatalogKind, Arc<Vec<Candidate>>>>,
}

impl Catalog {
    pub fn new(store: ChunkStore, bus: EventBus) -> Self {
        Self {
            store,
            bus,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Candidates for one dataset, loading and caching on first use
    ///
    /// Returns `None` when neither the chunked layout nor the unchunked
    /// fallback could be loaded. Two concurrent first loads may both
    /// fetch; the last insert wins with identical data.
    pub async fn candidates(&self, kind: CatalogKind) -> Option<Arc<Vec<Candidate>>> {
        if let Some(cached) = self.loaded.read().await.get(&kind) {
            return Some(cached.clone());
        }

        let records = match self.store.load_all(kind).await {
            Some(records) => records,
            None => {
                warn!(kind = %kind, "chunked load failed, trying unchunked dataset");
                self.store.load_full(kind).await?
            }
        };

        let candidates: Arc<Vec<Candidate>> =
            Arc::new(records.into_iter().map(Candidate::new).collect());
        info!(kind = %kind, records = candidates.len(), "catalog loaded");
        self.bus.emit_lossy(TunedexEvent::CatalogLoaded {
            kind,
            records: candidates.len(),
            timestamp: Utc::now(),
        });

        self.loaded
            .write()
            .await
            .insert(kind, candidates.clone());
        Some(candidates)
    }

    /// Direct access to the chunk loader, for range and index endpoints
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }
}
