//! Facet types for the pgrants configuration schema.
//!
//! These types describe `.config/pgrants.styx`. They carry no behavior
//! beyond defaults: the inspection engine decides what an absent or empty
//! override means.

use facet::Facet;
use indexmap::IndexMap;

/// Inspection settings.
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Role substituted when the catalog cannot attribute an owner.
    ///
    /// Defaults to the role of the inspecting session.
    #[facet(default)]
    pub fallback_owner: Option<String>,

    /// Names of the databases to inspect.
    #[facet(default)]
    pub databases_query: Option<RowsOrSql>,

    /// Roles considered in scope.
    #[facet(default)]
    pub managed_roles_query: Option<RowsOrSql>,

    /// Glob patterns of roles whose grants are ignored.
    #[facet(default)]
    pub roles_blacklist_query: Option<RowsOrSql>,

    /// Names of the schemas managed in each database.
    #[facet(default)]
    pub managed_schemas_query: Option<RowsOrSql>,

    /// Object type (e.g. `TABLE`) to the privilege types inspected on it.
    #[facet(default)]
    pub managed_privileges: IndexMap<String, Vec<String>>,
}

/// Either inline rows or a SQL query returning one text column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct RowsOrSql {
    /// Query run against each relevant database.
    #[facet(default)]
    pub sql: Option<String>,

    /// Literal rows, used as-is without touching the database.
    #[facet(default)]
    pub rows: Option<Vec<String>>,
}

impl RowsOrSql {
    /// Inline rows.
    pub fn rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sql: None,
            rows: Some(rows.into_iter().map(Into::into).collect()),
        }
    }

    /// A SQL override.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            rows: None,
        }
    }

    /// The SQL override, if it is non-blank and no inline rows take precedence.
    pub fn effective_sql(&self) -> Option<&str> {
        if self.rows.is_some() {
            return None;
        }
        self.sql.as_deref().filter(|sql| !sql.trim().is_empty())
    }
}
