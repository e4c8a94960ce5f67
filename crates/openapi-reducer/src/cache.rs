//! Optional time-bounded cache of reduced specs

use crate::error::SpecResult;
use crate::loader::{SpecLoader, SpecSource};
use crate::reducer::SpecReducer;
use crate::types::{ReduceOptions, ReducedSpec};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct CachedSpec {
    spec: Arc<ReducedSpec>,
    loaded_at: Instant,
}

/// Reduced specs keyed by source location and the options they were reduced with.
///
/// Without a TTL nothing is stored and every call loads and reduces again.
pub struct SpecCache {
    ttl: Option<Duration>,
    entries: RwLock<HashMap<(SpecSource, ReduceOptions), CachedSpec>>,
}

impl SpecCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Return `source` reduced with `options`, loading it if missing or stale
    pub async fn get_or_load(
        &self,
        source: &SpecSource,
        loader: &SpecLoader,
        options: &ReduceOptions,
    ) -> SpecResult<Arc<ReducedSpec>> {
        let Some(ttl) = self.ttl else {
            let raw = loader.load(source).await?;
            return Ok(Arc::new(SpecReducer::reduce(&raw, options)?));
        };

        let key = (source.clone(), *options);
        if let Some(cached) = self.entries.read().await.get(&key) {
            if cached.loaded_at.elapsed() < ttl {
                debug!("Using cached spec for {}", source);
                return Ok(cached.spec.clone());
            }
        }

        let raw = loader.load(source).await?;
        let spec = Arc::new(SpecReducer::reduce(&raw, options)?);

        self.entries.write().await.insert(
            key,
            CachedSpec {
                spec: spec.clone(),
                loaded_at: Instant::now(),
            },
        );

        Ok(spec)
    }

    /// Drop every entry loaded from `source`
    pub async fn invalidate(&self, source: &SpecSource) {
        self.entries
            .write()
            .await
            .retain(|(cached, _), _| cached != source);
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
