//! Migration operations.
//!
//! This module defines every schema change a model diff can emit for the
//! target engine: tables (plain merge-tree, materialized view, dictionary),
//! columns, skip indexes, and projections.
//!
//! Operations are plain data. Rendering an operation to DDL text is the
//! dialect's job; deciding *when* an operation runs is the splitter's job.

use serde::{Deserialize, Serialize};

/// Annotation key marking a table operation as a materialized view.
pub const MATERIALIZED_VIEW: &str = "MaterializedView";
/// Annotation key naming the source object of a materialized view.
pub const MATERIALIZED_VIEW_SOURCE: &str = "MaterializedViewSource";
/// Annotation key marking a table operation as a dictionary.
pub const DICTIONARY: &str = "Dictionary";
/// Annotation key naming the source object of a dictionary.
pub const DICTIONARY_SOURCE: &str = "DictionarySource";

/// Provider metadata attached to `CreateTable`/`DropTable` operations by the
/// annotation-enrichment pass that runs over the raw model diff.
///
/// An operation with `materialized_view` or `dictionary` set is a *derived*
/// object; everything else is a *base* object. A derived object with no
/// resolved source still sorts after all base objects in its phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableAnnotations {
    /// Whether the object is a materialized view.
    pub materialized_view: bool,
    /// Whether the object is a dictionary.
    pub dictionary: bool,
    /// Source object of a materialized view, if resolved.
    pub materialized_view_source: Option<String>,
    /// Source object of a dictionary, if resolved.
    pub dictionary_source: Option<String>,
}

impl TableAnnotations {
    /// Creates empty annotations (a plain base object).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates annotations for a materialized view.
    #[must_use]
    pub fn materialized_view(source: Option<String>) -> Self {
        Self {
            materialized_view: true,
            materialized_view_source: source,
            ..Self::default()
        }
    }

    /// Creates annotations for a dictionary.
    #[must_use]
    pub fn dictionary(source: Option<String>) -> Self {
        Self {
            dictionary: true,
            dictionary_source: source,
            ..Self::default()
        }
    }

    /// Builds annotations from the key-value pairs attached by the
    /// enrichment pass. Unknown keys are ignored; absent keys leave the
    /// object a plain base object.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut annotations = Self::default();
        for (key, value) in pairs {
            match key {
                MATERIALIZED_VIEW => annotations.materialized_view = value.eq_ignore_ascii_case("true"),
                MATERIALIZED_VIEW_SOURCE => {
                    annotations.materialized_view_source = Some(value.to_string());
                }
                DICTIONARY => annotations.dictionary = value.eq_ignore_ascii_case("true"),
                DICTIONARY_SOURCE => annotations.dictionary_source = Some(value.to_string()),
                _ => {}
            }
        }
        annotations
    }

    /// Returns true if the object is derived (materialized view or
    /// dictionary) rather than a base table.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.materialized_view || self.dictionary
    }

    /// Returns the upstream object this one reads from, if resolved.
    ///
    /// When an operation carries both flags the materialized-view source
    /// takes precedence. `None` means "no known dependency", not "no
    /// dependency".
    #[must_use]
    pub fn source_object(&self) -> Option<&str> {
        if self.materialized_view {
            self.materialized_view_source.as_deref()
        } else if self.dictionary {
            self.dictionary_source.as_deref()
        } else {
            None
        }
    }
}

/// A single migration operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a table, materialized view, or dictionary.
    CreateTable {
        /// Object name.
        name: String,
        /// Provider metadata from the enrichment pass.
        annotations: TableAnnotations,
    },

    /// Drop a table, materialized view, or dictionary.
    DropTable {
        /// Object name.
        name: String,
        /// Provider metadata from the enrichment pass.
        annotations: TableAnnotations,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Alter a column's type, default, or codec.
    AlterColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Old column name.
        column: String,
        /// New column name.
        new_name: String,
    },

    /// Create a skip index on a table.
    CreateIndex {
        /// Index name.
        name: String,
        /// Table name.
        table: String,
    },

    /// Drop a skip index.
    DropIndex {
        /// Index name.
        name: String,
        /// Table name.
        table: String,
    },

    /// Add a projection to a table.
    AddProjection {
        /// Projection name.
        name: String,
        /// Table name.
        table: String,
    },

    /// Drop a projection.
    DropProjection {
        /// Projection name.
        name: String,
        /// Table name.
        table: String,
    },

    /// Materialize an existing projection for historical parts.
    MaterializeProjection {
        /// Projection name.
        name: String,
        /// Table name.
        table: String,
    },

    /// Run a raw DDL statement (escape hatch for custom migrations).
    RawStatement {
        /// Statement text.
        sql: String,
    },
}

impl Operation {
    // Convenience constructors

    /// Creates a `CreateTable` operation for a base table.
    #[must_use]
    pub fn create_table(name: impl Into<String>) -> Self {
        Self::CreateTable {
            name: name.into(),
            annotations: TableAnnotations::new(),
        }
    }

    /// Creates a `CreateTable` operation with explicit annotations.
    #[must_use]
    pub fn create_table_with(name: impl Into<String>, annotations: TableAnnotations) -> Self {
        Self::CreateTable {
            name: name.into(),
            annotations,
        }
    }

    /// Creates a `CreateTable` operation for a materialized view.
    #[must_use]
    pub fn create_materialized_view(
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::CreateTable {
            name: name.into(),
            annotations: TableAnnotations::materialized_view(Some(source.into())),
        }
    }

    /// Creates a `CreateTable` operation for a dictionary.
    #[must_use]
    pub fn create_dictionary(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::CreateTable {
            name: name.into(),
            annotations: TableAnnotations::dictionary(Some(source.into())),
        }
    }

    /// Creates a `DropTable` operation for a base table.
    #[must_use]
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable {
            name: name.into(),
            annotations: TableAnnotations::new(),
        }
    }

    /// Creates a `DropTable` operation with explicit annotations.
    #[must_use]
    pub fn drop_table_with(name: impl Into<String>, annotations: TableAnnotations) -> Self {
        Self::DropTable {
            name: name.into(),
            annotations,
        }
    }

    /// Creates a `DropTable` operation for a materialized view.
    #[must_use]
    pub fn drop_materialized_view(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::DropTable {
            name: name.into(),
            annotations: TableAnnotations::materialized_view(Some(source.into())),
        }
    }

    /// Creates an `AddColumn` operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::AddColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a `DropColumn` operation.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an `AlterColumn` operation.
    #[must_use]
    pub fn alter_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::AlterColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a `RenameColumn` operation.
    #[must_use]
    pub fn rename_column(
        table: impl Into<String>,
        column: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            column: column.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates a `CreateIndex` operation.
    #[must_use]
    pub fn create_index(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::CreateIndex {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates a `DropIndex` operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::DropIndex {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates an `AddProjection` operation.
    #[must_use]
    pub fn add_projection(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::AddProjection {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates a `DropProjection` operation.
    #[must_use]
    pub fn drop_projection(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::DropProjection {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates a `MaterializeProjection` operation.
    #[must_use]
    pub fn materialize_projection(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::MaterializeProjection {
            name: name.into(),
            table: table.into(),
        }
    }

    /// Creates a `RawStatement` operation.
    #[must_use]
    pub fn raw_statement(sql: impl Into<String>) -> Self {
        Self::RawStatement { sql: sql.into() }
    }

    /// Returns the operation kind as a stable name.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "CreateTable",
            Self::DropTable { .. } => "DropTable",
            Self::AddColumn { .. } => "AddColumn",
            Self::DropColumn { .. } => "DropColumn",
            Self::AlterColumn { .. } => "AlterColumn",
            Self::RenameColumn { .. } => "RenameColumn",
            Self::CreateIndex { .. } => "CreateIndex",
            Self::DropIndex { .. } => "DropIndex",
            Self::AddProjection { .. } => "AddProjection",
            Self::DropProjection { .. } => "DropProjection",
            Self::MaterializeProjection { .. } => "MaterializeProjection",
            Self::RawStatement { .. } => "RawStatement",
        }
    }

    /// Returns the table/object this operation targets, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::CreateTable { name, .. } | Self::DropTable { name, .. } => Some(name),
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::AddProjection { table, .. }
            | Self::DropProjection { table, .. }
            | Self::MaterializeProjection { table, .. } => Some(table),
            Self::RawStatement { .. } => None,
        }
    }

    /// Returns the secondary name (column, index, or projection), if any.
    #[must_use]
    pub fn secondary(&self) -> Option<&str> {
        match self {
            Self::AddColumn { column, .. }
            | Self::DropColumn { column, .. }
            | Self::AlterColumn { column, .. }
            | Self::RenameColumn { column, .. } => Some(column),
            Self::CreateIndex { name, .. }
            | Self::DropIndex { name, .. }
            | Self::AddProjection { name, .. }
            | Self::DropProjection { name, .. }
            | Self::MaterializeProjection { name, .. } => Some(name),
            Self::CreateTable { .. } | Self::DropTable { .. } | Self::RawStatement { .. } => None,
        }
    }

    /// Returns the table annotations, if this operation carries any.
    #[must_use]
    pub fn annotations(&self) -> Option<&TableAnnotations> {
        match self {
            Self::CreateTable { annotations, .. } | Self::DropTable { annotations, .. } => {
                Some(annotations)
            }
            _ => None,
        }
    }

    /// Returns a short description of this operation, used for step naming:
    /// `{Kind}_{Target}` with the secondary name appended when present,
    /// e.g. `AddColumn_orders_Discount`.
    #[must_use]
    pub fn description(&self) -> String {
        let mut description = self.kind_name().to_string();
        if let Some(target) = self.target() {
            description.push('_');
            description.push_str(target);
        }
        if let Some(secondary) = self.secondary() {
            description.push('_');
            description.push_str(secondary);
        }
        description
    }
}
