//! Error types for the migration system.

use crate::classify::Phase;

/// Errors that can occur while splitting or executing a migration.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Derived objects within one phase depend on each other in a cycle.
    #[error("Dependency cycle in phase {} between: {}", phase.rank(), objects.join(", "))]
    DependencyCycle {
        /// The phase whose bucket contains the cycle.
        phase: Phase,
        /// The objects participating in the cycle, sorted by name.
        objects: Vec<String>,
    },

    /// The migration has more operations than the step suffix can number.
    #[error("Migration has {count} operations but step suffixes only number up to {limit}")]
    TooManySteps {
        /// Number of operations in the migration.
        count: usize,
        /// Maximum number of steps per migration.
        limit: usize,
    },

    /// Steps were handed to the executor out of sequence.
    #[error("Step {found} executed out of order, expected step {expected}")]
    OutOfOrderStep {
        /// The step number the executor expected next.
        expected: usize,
        /// The step number it was given.
        found: usize,
    },

    /// A step identifier was not found in the history log.
    #[error("Step '{0}' is not recorded in the history log")]
    StepNotRecorded(String),

    /// The history log failed to read or write an entry.
    #[error("History log error: {0}")]
    History(String),

    /// The schema backend failed to execute a DDL statement.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
