//! Grant records.

use crate::privilege::{ObjectField, shape_of};
use crate::{RowError, SqlRow};
use std::fmt;

/// A role holding one privilege type on an object of a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    /// Object type, copied from the catalog entry that produced the grant.
    pub target: String,
    pub database: String,
    pub schema: Option<String>,
    /// Object name or default privilege class, depending on the target.
    pub object: Option<String>,
    /// Privilege type, e.g. `SELECT`.
    pub privilege: String,
    pub grantee: String,
    /// Role whose default privileges hold this grant.
    pub owner: Option<String>,
    /// Only some of the objects aggregated by this grant have the privilege.
    pub partial: bool,
}

impl Grant {
    /// Canonicalize the grant so that equivalent grants compare equal.
    ///
    /// Normalizing twice yields the same value.
    pub fn normalize(&mut self) {
        self.privilege = self.privilege.trim().to_ascii_uppercase();
        if self.grantee.is_empty() || self.grantee.eq_ignore_ascii_case("public") {
            self.grantee = "public".to_string();
        }

        let Some(shape) = shape_of(&self.target) else {
            return;
        };
        if !shape.owner {
            self.owner = None;
        }
        if !shape.schema {
            self.schema = None;
        }
        match shape.object {
            ObjectField::None => self.object = None,
            ObjectField::Database => self.object = Some(self.database.clone()),
            ObjectField::Name => {}
            ObjectField::Class => {
                if let Some(class) = &mut self.object {
                    class.make_ascii_uppercase();
                }
            }
        }
        if !shape.aggregate {
            self.partial = false;
        }
    }

    /// Whether the grant covers objects of a whole schema.
    pub fn is_aggregate(&self) -> bool {
        shape_of(&self.target).is_some_and(|s| s.aggregate)
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ON ", self.privilege)?;
        if self.is_aggregate() {
            write!(f, "ALL {}S IN SCHEMA ", self.target)?;
        } else {
            write!(f, "{} ", self.target)?;
        }
        write!(f, "{}", self.database)?;
        if let Some(schema) = &self.schema {
            write!(f, ".{schema}")?;
        }
        if let Some(object) = &self.object {
            if *object != self.database {
                write!(f, ".{object}")?;
            }
        }
        if let Some(owner) = &self.owner {
            write!(f, " FOR ROLE {owner}")?;
        }
        write!(f, " TO {}", self.grantee)?;
        if self.partial {
            write!(f, " (partial)")?;
        }
        Ok(())
    }
}

/// Decode a grant from a row of the built-in catalog row contract.
///
/// `target` is left empty, the inspector fills it from the catalog entry.
pub fn decode_grant(row: &dyn SqlRow) -> Result<Grant, RowError> {
    Ok(Grant {
        target: String::new(),
        database: row.required_text("database")?,
        schema: row.text("schema")?,
        object: row.text("object")?,
        privilege: row.required_text("type")?,
        grantee: row.required_text("grantee")?,
        owner: row.text("owner")?,
        partial: row.boolean("partial")?.unwrap_or(false),
    })
}
