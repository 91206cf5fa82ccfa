//! Last-known-good cache for live market artifacts
//!
//! Each artifact (index snapshot, ticker tape) owns one cache. The cache moves
//! through three states:
//!
//! - `Empty`: nothing fetched successfully yet in this process
//! - `Fresh`: holds the result of the latest successful fetch while the market is open
//! - `Frozen`: holds the last fresh value because the market is closed or a fetch failed
//!
//! New values are built off-cache and published with a single assignment under
//! the write lock. The lock is never held across a provider request.

use crate::error::FetchError;
use std::fmt;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState<T> {
    Empty,
    Fresh(T),
    Frozen(T),
}

impl<T> CacheState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            CacheState::Empty => None,
            CacheState::Fresh(v) | CacheState::Frozen(v) => Some(v),
        }
    }

    pub fn phase(&self) -> CachePhase {
        match self {
            CacheState::Empty => CachePhase::Empty,
            CacheState::Fresh(_) => CachePhase::Fresh,
            CacheState::Frozen(_) => CachePhase::Frozen,
        }
    }
}

/// State name without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    Empty,
    Fresh,
    Frozen,
}

impl fmt::Display for CachePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePhase::Empty => write!(f, "empty"),
            CachePhase::Fresh => write!(f, "fresh"),
            CachePhase::Frozen => write!(f, "frozen"),
        }
    }
}

/// What a refresh produced
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Fetched just now
    Fresh(T),
    /// Previously cached value, served unchanged
    Frozen(T),
    /// Market closed and nothing cached yet
    MarketClosed,
    /// Fetch failed and nothing cached yet
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) | Lookup::Frozen(v) => Some(v),
            Lookup::MarketClosed | Lookup::Unavailable => None,
        }
    }
}

pub struct SnapshotCache<T> {
    name: &'static str,
    state: RwLock<CacheState<T>>,
}

impl<T: Clone + Send + Sync> SnapshotCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(CacheState::Empty),
        }
    }

    /// Current state, cloned
    pub async fn get(&self) -> CacheState<T> {
        self.state.read().await.clone()
    }

    /// Replace the cached value; the cache becomes `Fresh`
    pub async fn publish(&self, value: T) {
        *self.state.write().await = CacheState::Fresh(value);
        debug!(cache = self.name, "Published fresh value");
    }

    /// Mark the cached value as frozen and return it, if any
    pub async fn freeze(&self) -> Option<T> {
        let mut state = self.state.write().await;
        *state = match std::mem::replace(&mut *state, CacheState::Empty) {
            CacheState::Fresh(value) => CacheState::Frozen(value),
            other => other,
        };
        state.value().cloned()
    }

    /// Apply one refresh request.
    ///
    /// Closed market: no fetch, the cached value is served. Open market: fetch
    /// and publish on success, otherwise fall back to the cached value.
    pub async fn refresh<F, Fut>(&self, market_open: bool, fetch: F) -> Lookup<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if !market_open {
            return match self.freeze().await {
                Some(value) => Lookup::Frozen(value),
                None => Lookup::MarketClosed,
            };
        }

        match fetch().await {
            Ok(value) => {
                self.publish(value.clone()).await;
                Lookup::Fresh(value)
            }
            Err(e) => {
                let fallback = self.freeze().await;
                warn!(
                    cache = self.name,
                    error = %e,
                    has_fallback = fallback.is_some(),
                    "Refresh failed, serving cached value"
                );
                match fallback {
                    Some(value) => Lookup::Frozen(value),
                    None => Lookup::Unavailable,
                }
            }
        }
    }
}
