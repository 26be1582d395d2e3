//! Migration steps.
//!
//! A step wraps exactly one operation together with the bookkeeping the
//! executor and the history log need: a contiguous 1-based number, a
//! zero-padded suffix used in history keys, a short description, and the
//! operation's position in the original input for traceability.

use serde::{Deserialize, Serialize};

use crate::operations::Operation;

/// Maximum number of steps in one migration.
///
/// History entries are keyed `{migration_id}_{step_suffix}` with a 3-digit
/// suffix; a wider suffix would collide with keys written by earlier tool
/// versions, so exceeding this count is a hard error in the splitter.
pub const MAX_STEPS_PER_MIGRATION: usize = 999;

/// One scheduled, numbered unit of migration work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based, contiguous position in the execution sequence.
    pub step_number: usize,
    /// Zero-padded 3-digit form of `step_number`, e.g. `"042"`.
    pub step_suffix: String,
    /// Short description derived from the operation, e.g.
    /// `AddColumn_orders_Discount`.
    pub description: String,
    /// Position of the operation in the unordered input list.
    pub original_index: usize,
    /// The wrapped operation.
    pub operation: Operation,
}

impl Step {
    /// Creates a step for the given execution position.
    #[must_use]
    pub(crate) fn new(step_number: usize, original_index: usize, operation: Operation) -> Self {
        Self {
            step_number,
            step_suffix: format!("{step_number:03}"),
            description: operation.description(),
            original_index,
            operation,
        }
    }

    /// Returns the history-log identifier of this step within a migration,
    /// conventionally `{migration_id}_{step_suffix}`.
    #[must_use]
    pub fn id(&self, migration_id: &str) -> String {
        format!("{}_{}", migration_id, self.step_suffix)
    }
}
