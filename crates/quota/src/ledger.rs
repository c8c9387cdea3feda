//! The quota ledger: a persistent, atomic per-session per-day counter.
//!
//! Canonical per the Open Question resolution in `DESIGN.md`: in-memory
//! state backed by a single JSON document, guarded by one mutex so that
//! `check` and `increment` against the same key never interleave and so
//! that persistence writes are always serialized (spec §4.1, §9).

use crate::limits::{ServiceLimits, ServiceType};
use crate::usage::SessionDailyUsage;
use chrono::{NaiveDate, Utc};
use gateway_gax::GatewayError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// The result of a `check` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub current: u32,
    pub limit: u32,
    pub remaining: u32,
}

struct State {
    rows: HashMap<String, SessionDailyUsage>,
}

/// Per-(session, date, service) usage counters, persisted to a single
/// JSON file with atomic (write-tmp-then-rename) replacement.
pub struct QuotaLedger {
    path: PathBuf,
    limits: ServiceLimits,
    state: Mutex<State>,
}

impl QuotaLedger {
    /// Loads existing rows from `path` if present, otherwise starts empty.
    /// The file (and its parent directory) is created on first write.
    pub async fn open(path: impl Into<PathBuf>, limits: ServiceLimits) -> Result<Self, GatewayError> {
        let path = path.into();
        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| GatewayError::QuotaIo(format!("corrupt ledger file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(GatewayError::QuotaIo(format!("reading {path:?}: {e}"))),
        };
        Ok(Self {
            path,
            limits,
            state: Mutex::new(State { rows }),
        })
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Resolves today's `(session, date)` row (creating it at zero if
    /// absent) and reports whether another generation is allowed.
    pub async fn check(&self, session_id: &str, service: ServiceType) -> Result<QuotaCheck, GatewayError> {
        let mut guard = self.state.lock().await;
        let key = SessionDailyUsage::key(session_id, Self::today());
        let row = guard
            .rows
            .entry(key)
            .or_insert_with(|| SessionDailyUsage::new(session_id.to_string(), Self::today()));

        let limit = self.limits.for_service(service);
        let current = row.count(service);
        Ok(QuotaCheck {
            allowed: current < limit,
            current,
            limit,
            remaining: limit.saturating_sub(current),
        })
    }

    /// Re-checks and, if still allowed, increments the counter for
    /// `service` and persists the result. The recheck inside the lock is
    /// what makes check-then-increment safe under concurrency (spec §4.1).
    pub async fn increment(&self, session_id: &str, service: ServiceType) -> Result<(), GatewayError> {
        let mut guard = self.state.lock().await;
        let key = SessionDailyUsage::key(session_id, Self::today());
        let row = guard
            .rows
            .entry(key)
            .or_insert_with(|| SessionDailyUsage::new(session_id.to_string(), Self::today()));

        let limit = self.limits.for_service(service);
        let current = row.count(service);
        if current >= limit {
            return Err(GatewayError::QuotaExceeded {
                session: session_id.to_string(),
                service: service.as_str().to_string(),
                current,
                limit,
            });
        }
        row.increment(service);
        self.persist(&guard).await
    }

    async fn persist(&self, guard: &State) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GatewayError::QuotaIo(format!("creating {parent:?}: {e}")))?;
        }
        let bytes = serde_json::to_vec_pretty(&guard.rows)
            .map_err(|e| GatewayError::QuotaIo(format!("serializing ledger: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| GatewayError::QuotaIo(format!("writing {tmp_path:?}: {e}")))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| GatewayError::QuotaIo(format!("renaming into {:?}: {e}", self.path)))?;
        Ok(())
    }

    /// Snapshot of all rows, for the stats API and tests. Not part of the
    /// hot check/increment path.
    pub(crate) async fn snapshot(&self) -> Vec<SessionDailyUsage> {
        self.state.lock().await.rows.values().cloned().collect()
    }

    /// Removes rows older than `retention_days`, persists, and returns
    /// the number of rows removed.
    pub async fn cleanup(&self, retention_days: i64) -> Result<usize, GatewayError> {
        let cutoff = Self::today() - chrono::Duration::days(retention_days);
        let mut guard = self.state.lock().await;
        let before = guard.rows.len();
        guard.rows.retain(|_, row| row.date >= cutoff);
        let removed = before - guard.rows.len();
        if removed > 0 {
            self.persist(&guard).await?;
        }
        Ok(removed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
