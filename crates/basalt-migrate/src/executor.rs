//! Step execution.
//!
//! The executor applies an ordered step sequence one step at a time: render
//! the operation's DDL, execute it, record completion in the history log,
//! then advance. The engine has no transactional DDL, so the per-step
//! record is what makes a crashed migration resumable: a re-run skips every
//! recorded step and the dialect's idempotent DDL absorbs the one step
//! whose record may have been lost.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dialect::MigrationDialect;
use crate::error::{MigrateError, Result};
use crate::history::{StepHistory, PRODUCT_VERSION};
use crate::step::Step;

/// Executes DDL statements against a schema.
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Executes one DDL statement.
    async fn execute_ddl(&self, sql: &str) -> Result<()>;
}

/// Applies migration steps against a backend, recording progress per step.
pub struct StepExecutor<D, B, H> {
    dialect: D,
    backend: B,
    history: H,
    dry_run: bool,
}

impl<D, B, H> StepExecutor<D, B, H>
where
    D: MigrationDialect,
    B: SchemaBackend,
    H: StepHistory,
{
    /// Creates a new step executor.
    pub fn new(dialect: D, backend: B, history: H) -> Self {
        Self {
            dialect,
            backend,
            history,
            dry_run: false,
        }
    }

    /// Enables dry-run mode (DDL is printed but not executed or recorded).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Ensures the history log exists.
    pub async fn init(&self) -> Result<()> {
        if !self.dry_run {
            self.history.ensure_log().await?;
        }
        Ok(())
    }

    /// Returns the history log.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Applies a migration's steps strictly in `step_number` order.
    ///
    /// Steps already present in the history log are skipped, so a migration
    /// interrupted mid-way can be re-run as-is.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::OutOfOrderStep`] if the step sequence is not
    /// contiguous from 1; otherwise propagates backend and history errors.
    pub async fn apply(&self, migration_id: &str, steps: &[Step]) -> Result<()> {
        for (position, step) in steps.iter().enumerate() {
            if step.step_number != position + 1 {
                return Err(MigrateError::OutOfOrderStep {
                    expected: position + 1,
                    found: step.step_number,
                });
            }
            self.apply_step(migration_id, step).await?;
        }
        Ok(())
    }

    /// Applies a single step.
    async fn apply_step(&self, migration_id: &str, step: &Step) -> Result<()> {
        let step_id = step.id(migration_id);

        info!(
            step = %step_id,
            description = %step.description,
            "Applying step"
        );

        if !self.dry_run && self.history.is_applied(&step_id).await? {
            warn!(step = %step_id, "Step already recorded, skipping");
            return Ok(());
        }

        for sql in self.dialect.generate_sql(&step.operation) {
            debug!(sql = %sql, "Executing DDL");

            if self.dry_run {
                println!("{sql};");
            } else {
                self.backend.execute_ddl(&sql).await?;
            }
        }

        if !self.dry_run {
            self.history.record_applied(&step_id, PRODUCT_VERSION).await?;
        }

        info!(step = %step_id, "Step recorded");
        Ok(())
    }

    /// Removes one step's history record (for reverts).
    pub async fn forget(&self, migration_id: &str, step: &Step) -> Result<()> {
        let step_id = step.id(migration_id);
        warn!(step = %step_id, "Removing step record");
        self.history.record_unapplied(&step_id).await
    }

    /// Returns the steps of a migration that are not yet recorded.
    pub async fn pending<'a>(
        &self,
        migration_id: &str,
        steps: &'a [Step],
    ) -> Result<Vec<&'a Step>> {
        let applied = self.history.applied_for_migration(migration_id).await?;
        Ok(steps
            .iter()
            .filter(|step| !applied.contains(&step.id(migration_id)))
            .collect())
    }

    /// Renders the DDL for a step sequence without executing it.
    pub fn sql_for(&self, steps: &[Step]) -> Vec<String> {
        let mut all_sql = Vec::new();
        for step in steps {
            all_sql.extend(self.dialect.generate_sql(&step.operation));
        }
        all_sql
    }
}
