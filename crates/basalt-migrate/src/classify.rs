//! Dependency classification of migration operations.
//!
//! The classifier inspects a single operation and derives three facts the
//! splitter schedules by: the execution phase, the object the operation
//! provides (creates or removes), and the object it depends on. It is a pure
//! function of the operation; no batch context, no side effects.

use serde::{Deserialize, Serialize};

use crate::operations::Operation;

/// Coarse execution phase of an operation.
///
/// Phases form a fixed total order. Bucketing by phase alone already yields
/// the safe cross-category ordering: access paths are dropped first, derived
/// objects are dropped before their base tables, base tables and their
/// columns exist before the derived objects that read them, and indexes and
/// projections come last. Within the two derived-object phases a
/// dependency-aware sort refines the order further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Drop projections and skip indexes.
    DropAccessPaths = 1,
    /// Drop materialized views and dictionaries.
    DropDerivedObjects = 2,
    /// Drop base tables.
    DropBaseTables = 3,
    /// Create base tables.
    CreateBaseTables = 4,
    /// Add columns to existing tables.
    AddColumns = 5,
    /// Create materialized views and dictionaries.
    CreateDerivedObjects = 6,
    /// Column alterations, renames, and raw statements (default bucket).
    AlterAndRaw = 7,
    /// Create skip indexes.
    CreateIndexes = 8,
    /// Add and materialize projections.
    AddProjections = 9,
}

impl Phase {
    /// Returns the numeric rank of the phase (1 through 9).
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Returns true for the phases that can contain mutually dependent
    /// derived objects and therefore need an intra-bucket dependency sort.
    #[must_use]
    pub fn needs_dependency_ordering(self) -> bool {
        matches!(self, Self::DropDerivedObjects | Self::CreateDerivedObjects)
    }

    /// Returns true for drop-side phases, where dependency edges reverse:
    /// a dependent must be dropped before its source.
    #[must_use]
    pub fn is_drop_side(self) -> bool {
        matches!(
            self,
            Self::DropAccessPaths | Self::DropDerivedObjects | Self::DropBaseTables
        )
    }
}

/// The classifier's verdict on one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Execution phase.
    pub phase: Phase,
    /// Object this operation creates or removes, if any.
    pub provides: Option<&'a str>,
    /// Object that must exist (or still exist) for this operation, if known.
    pub depends_on: Option<&'a str>,
}

/// Classifies one operation: phase, provided object, and dependency.
#[must_use]
pub fn classify(operation: &Operation) -> Classification<'_> {
    Classification {
        phase: phase_of(operation),
        provides: provides(operation),
        depends_on: depends_on(operation),
    }
}

/// Returns the execution phase for an operation.
///
/// Total over every operation kind; `RawStatement` lands in the default
/// bucket rather than erroring, so a migration the classifier cannot fully
/// understand is still scheduled.
#[must_use]
pub fn phase_of(operation: &Operation) -> Phase {
    match operation {
        Operation::DropProjection { .. } | Operation::DropIndex { .. } => Phase::DropAccessPaths,
        Operation::DropTable { annotations, .. } => {
            if annotations.is_derived() {
                Phase::DropDerivedObjects
            } else {
                Phase::DropBaseTables
            }
        }
        Operation::CreateTable { annotations, .. } => {
            if annotations.is_derived() {
                Phase::CreateDerivedObjects
            } else {
                Phase::CreateBaseTables
            }
        }
        Operation::AddColumn { .. } => Phase::AddColumns,
        Operation::AlterColumn { .. }
        | Operation::DropColumn { .. }
        | Operation::RenameColumn { .. }
        | Operation::RawStatement { .. } => Phase::AlterAndRaw,
        Operation::CreateIndex { .. } => Phase::CreateIndexes,
        Operation::AddProjection { .. } | Operation::MaterializeProjection { .. } => {
            Phase::AddProjections
        }
    }
}

/// Returns the object name this operation creates or removes.
///
/// Only table-level operations provide an object; column, index, and
/// projection operations modify an existing provider.
#[must_use]
pub fn provides(operation: &Operation) -> Option<&str> {
    match operation {
        Operation::CreateTable { name, .. } | Operation::DropTable { name, .. } => Some(name),
        _ => None,
    }
}

/// Returns the object this operation depends on.
///
/// Derived table operations depend on their annotated source object; column,
/// index, and projection operations depend on their target table. Returning
/// `None` is a valid and common result, not an error: base tables and raw
/// statements carry no dependency, and a derived object whose source was
/// never resolved still sorts after all base objects by phase alone.
#[must_use]
pub fn depends_on(operation: &Operation) -> Option<&str> {
    match operation {
        Operation::CreateTable { annotations, .. } | Operation::DropTable { annotations, .. } => {
            annotations.source_object()
        }
        Operation::AddColumn { table, .. }
        | Operation::DropColumn { table, .. }
        | Operation::AlterColumn { table, .. }
        | Operation::RenameColumn { table, .. }
        | Operation::CreateIndex { table, .. }
        | Operation::DropIndex { table, .. }
        | Operation::AddProjection { table, .. }
        | Operation::DropProjection { table, .. }
        | Operation::MaterializeProjection { table, .. } => Some(table),
        Operation::RawStatement { .. } => None,
    }
}
