//! Step history tracking.
//!
//! Each step's completion is recorded in an append-only log keyed by
//! `{migration_id}_{step_suffix}` before the executor advances. The suffix
//! is a zero-padded 3-digit string, so identifiers sort in execution order
//! and a resumed run can skip exactly the steps that finished. Storage
//! mechanics live with the caller; this module defines the contract plus an
//! in-memory implementation for tests and embedded tooling.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{MigrateError, Result};

/// Tool version stamped on every history entry.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A record of one applied step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    /// Step identifier, `{migration_id}_{step_suffix}`.
    pub id: String,
    /// Tool version that applied the step.
    pub version: String,
    /// When the step was recorded.
    pub applied_at: DateTime<Utc>,
}

/// Append-only log of applied migration steps.
#[async_trait]
pub trait StepHistory: Send + Sync {
    /// Ensures the backing log exists. Idempotent.
    async fn ensure_log(&self) -> Result<()>;

    /// Records a step as applied.
    async fn record_applied(&self, step_id: &str, version: &str) -> Result<()>;

    /// Removes one step record (for reverts).
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::StepNotRecorded`] if the identifier is not in
    /// the log.
    async fn record_unapplied(&self, step_id: &str) -> Result<()>;

    /// Checks whether a step has been recorded.
    async fn is_applied(&self, step_id: &str) -> Result<bool> {
        Ok(self.applied_ids().await?.iter().any(|id| id == step_id))
    }

    /// Returns all recorded step identifiers, sorted.
    async fn applied_ids(&self) -> Result<Vec<String>>;

    /// Returns the recorded step identifiers of one migration, sorted in
    /// execution order.
    async fn applied_for_migration(&self, migration_id: &str) -> Result<Vec<String>> {
        let prefix = format!("{migration_id}_");
        Ok(self
            .applied_ids()
            .await?
            .into_iter()
            .filter(|id| id.starts_with(&prefix))
            .collect())
    }

    /// Counts recorded steps.
    async fn count_applied(&self) -> Result<usize> {
        Ok(self.applied_ids().await?.len())
    }
}

/// In-memory step history.
///
/// Used by tests and by tooling that plans against a hypothetical state.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: Mutex<BTreeMap<String, AppliedStep>>,
}

impl InMemoryHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry, sorted by identifier.
    pub async fn entries(&self) -> Vec<AppliedStep> {
        self.entries.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl StepHistory for InMemoryHistory {
    async fn ensure_log(&self) -> Result<()> {
        Ok(())
    }

    async fn record_applied(&self, step_id: &str, version: &str) -> Result<()> {
        self.entries.lock().await.insert(
            step_id.to_string(),
            AppliedStep {
                id: step_id.to_string(),
                version: version.to_string(),
                applied_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn record_unapplied(&self, step_id: &str) -> Result<()> {
        if self.entries.lock().await.remove(step_id).is_none() {
            return Err(MigrateError::StepNotRecorded(step_id.to_string()));
        }
        Ok(())
    }

    async fn is_applied(&self, step_id: &str) -> Result<bool> {
        Ok(self.entries.lock().await.contains_key(step_id))
    }

    async fn applied_ids(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}
