//! Dependency-aware schema migrations for column-oriented analytical
//! databases.
//!
//! `basalt-migrate` takes the unordered batch of schema-change operations a
//! model diff produces and turns it into a safe, resumable execution plan
//! for engines without transactional DDL: merge-tree tables, materialized
//! views, dictionaries, projections, and skip indexes.
//!
//! # Architecture
//!
//! - **Operations** - schema changes like `CreateTable`, `AddColumn`,
//!   `DropProjection`, with provider annotations marking derived objects
//! - **Classifier** - derives each operation's execution phase and its
//!   provides/depends-on object keys
//! - **Splitter** - buckets operations into nine phases, topologically
//!   sorts cascading derived objects within a phase, and numbers the result
//!   into steps
//! - **Executor** - applies steps one at a time, recording each completion
//!   in an append-only history log before advancing
//! - **Dialect** - the seam through which a provider renders operations to
//!   idempotent DDL text
//!
//! # Example
//!
//! ```rust
//! use basalt_migrate::prelude::*;
//!
//! let steps = split(vec![
//!     Operation::create_materialized_view("mv_daily", "mv_hourly"),
//!     Operation::create_index("ix_date", "events"),
//!     Operation::create_materialized_view("mv_hourly", "events"),
//!     Operation::create_table("events"),
//! ])
//! .unwrap();
//!
//! let plan: Vec<&str> = steps.iter().map(|s| s.description.as_str()).collect();
//! assert_eq!(
//!     plan,
//!     vec![
//!         "CreateTable_events",
//!         "CreateTable_mv_hourly",
//!         "CreateTable_mv_daily",
//!         "CreateIndex_events_ix_date",
//!     ]
//! );
//! assert_eq!(steps[0].step_suffix, "001");
//! ```

pub mod classify;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod history;
pub mod operations;
pub mod splitter;
pub mod step;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::classify::{classify, depends_on, phase_of, provides, Classification, Phase};
    pub use crate::dialect::MigrationDialect;
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{SchemaBackend, StepExecutor};
    pub use crate::history::{AppliedStep, InMemoryHistory, StepHistory, PRODUCT_VERSION};
    pub use crate::operations::{Operation, TableAnnotations};
    pub use crate::splitter::split;
    pub use crate::step::{Step, MAX_STEPS_PER_MIGRATION};
}
