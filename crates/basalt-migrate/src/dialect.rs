//! DDL rendering boundary.
//!
//! The scheduler fixes *when* an operation runs; a dialect fixes *what* is
//! sent to the server for it. Rendering lives with the provider that owns
//! the engine's SQL surface, so this crate only defines the seam the
//! executor calls through.

use crate::operations::Operation;

/// Renders migration operations to DDL statements for one engine.
///
/// Implementations must render idempotent DDL (`IF [NOT] EXISTS` forms)
/// wherever the engine offers them: the executor may re-run a step whose
/// DDL was applied but whose history record was lost in a crash.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Renders one operation to one or more DDL statements, using only the
    /// operation's own fields.
    fn generate_sql(&self, operation: &Operation) -> Vec<String>;

    /// Quotes an identifier (table, column, index, or projection name).
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{name}`")
    }
}
