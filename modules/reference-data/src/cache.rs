use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::{IndexSchema, ReferenceData, SpeciesList};

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

/// Serves reference data from memory for `ttl` after a successful fetch.
///
/// A zero TTL disables caching and every call goes to `inner`. Failed
/// fetches are never stored.
pub struct CachedReferenceData<R> {
    inner: R,
    ttl: Duration,
    schema: RwLock<Option<Entry<IndexSchema>>>,
    species: RwLock<Option<Entry<SpeciesList>>>,
}

impl<R: ReferenceData> CachedReferenceData<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            schema: RwLock::new(None),
            species: RwLock::new(None),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

async fn get_or_fetch<T, F, Fut>(
    slot: &RwLock<Option<Entry<T>>>,
    ttl: Duration,
    what: &'static str,
    fetch: F,
) -> Result<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if ttl.is_zero() {
        return fetch().await;
    }

    if let Some(entry) = slot.read().await.as_ref() {
        if entry.fetched_at.elapsed() < ttl {
            debug!(what, "Reference data cache hit");
            return Ok(entry.value.clone());
        }
    }

    let mut guard = slot.write().await;
    // Another request may have refreshed while we waited for the lock.
    if let Some(entry) = guard.as_ref() {
        if entry.fetched_at.elapsed() < ttl {
            return Ok(entry.value.clone());
        }
    }

    debug!(what, "Reference data cache miss");
    let value = fetch().await?;
    *guard = Some(Entry {
        value: value.clone(),
        fetched_at: Instant::now(),
    });
    Ok(value)
}

#[async_trait]
impl<R: ReferenceData> ReferenceData for CachedReferenceData<R> {
    async fn index_schema(&self) -> Result<IndexSchema> {
        get_or_fetch(&self.schema, self.ttl, "index_schema", || {
            self.inner.index_schema()
        })
        .await
    }

    async fn species(&self) -> Result<SpeciesList> {
        get_or_fetch(&self.species, self.ttl, "species", || self.inner.species()).await
    }
}
