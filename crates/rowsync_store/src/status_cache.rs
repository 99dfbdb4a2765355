//! Cached symbolic-status-to-id lookup.

use crate::backend::{RowBackend, SelectQuery, TableRef};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// The backend-assigned identifiers for the two lifecycle statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIds {
    /// Identifier of the "active" status.
    pub active: i64,
    /// Identifier of the "inactive" status.
    pub inactive: i64,
}

/// Refresh policy for the status cache.
///
/// The default never expires — the status table changes only with a
/// deployment, and a restart repopulates the cache. Tests and deployments
/// that do rotate status rows can inject a TTL or call
/// [`StatusCache::invalidate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// Entries older than this are refetched; `None` never expires.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Entries live for the whole process.
    #[must_use]
    pub fn never_expires() -> Self {
        Self { ttl: None }
    }

    /// Entries are refetched after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedIds {
    ids: StatusIds,
    fetched_at: Instant,
}

/// Read-through cache over the backend status table.
///
/// The first `resolve` queries the backend for the rows named "active"
/// and "inactive"; later calls return the cached pair without a round
/// trip. The populate race between concurrent first callers is benign:
/// both compute the same pair from the same table.
pub struct StatusCache {
    backend: Arc<dyn RowBackend>,
    target: TableRef,
    name_column: String,
    id_column: String,
    policy: CachePolicy,
    cached: RwLock<Option<CachedIds>>,
}

/// Symbolic name of the active status.
pub(crate) const ACTIVE: &str = "active";
/// Symbolic name of the inactive status.
pub(crate) const INACTIVE: &str = "inactive";

impl StatusCache {
    /// Creates a cache over `target`, reading `name_column` and
    /// `id_column` from its rows.
    pub fn new(
        backend: Arc<dyn RowBackend>,
        target: TableRef,
        name_column: impl Into<String>,
        id_column: impl Into<String>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            backend,
            target,
            name_column: name_column.into(),
            id_column: id_column.into(),
            policy,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached status ids, fetching from the backend when the
    /// cache is empty, expired, or invalidated.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the status query fails, or
    /// [`StoreError::StatusMissing`] when either symbolic name is absent
    /// from the table.
    pub fn resolve(&self) -> StoreResult<StatusIds> {
        if let Some(cached) = *self.cached.read() {
            if !self.expired(&cached) {
                return Ok(cached.ids);
            }
        }

        let mut slot = self.cached.write();
        // Double-check: another request may have refreshed while we
        // waited for the write lock.
        if let Some(cached) = *slot {
            if !self.expired(&cached) {
                return Ok(cached.ids);
            }
        }

        let ids = self.fetch()?;
        *slot = Some(CachedIds {
            ids,
            fetched_at: Instant::now(),
        });
        debug!(active = ids.active, inactive = ids.inactive, "status ids cached");
        Ok(ids)
    }

    /// Drops the cached pair; the next `resolve` refetches.
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    fn expired(&self, cached: &CachedIds) -> bool {
        match self.policy.ttl {
            Some(ttl) => cached.fetched_at.elapsed() >= ttl,
            None => false,
        }
    }

    fn fetch(&self) -> StoreResult<StatusIds> {
        let rows = self.backend.select(&self.target, &SelectQuery::new())?;

        let id_for = |name: &str| -> StoreResult<i64> {
            rows.iter()
                .find(|row| {
                    row.get(&self.name_column).and_then(Value::as_str) == Some(name)
                })
                .and_then(|row| row.get(&self.id_column).and_then(Value::as_i64))
                .ok_or_else(|| StoreError::StatusMissing(name.to_string()))
        };

        Ok(StatusIds {
            active: id_for(ACTIVE)?,
            inactive: id_for(INACTIVE)?,
        })
    }
}
