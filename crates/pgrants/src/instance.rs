//! The inspected model of a PostgreSQL instance.

use crate::{Grant, RolesBlacklist};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Databases, schemas, roles and grants found in an instance.
///
/// Built by [`Inspector`](crate::Inspector). A model whose inspection failed
/// is incomplete and must be discarded.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    /// Database used for instance-scoped queries.
    pub default_database: String,
    /// Role of the inspecting session.
    pub current_role: String,
    pub server_version_num: u32,
    /// Owner substituted when the catalog reports none.
    pub fallback_owner: String,
    /// Managed databases, by name.
    pub databases: BTreeMap<String, Database>,
    pub roles_blacklist: RolesBlacklist,
    pub managed_roles: BTreeSet<String>,
    /// Object type to managed privilege types.
    pub managed_privileges: IndexMap<String, Vec<String>>,
    /// Grants, in inspection order. Consumers should treat this as a set.
    pub grants: Vec<Grant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub owner: String,
    /// Managed schemas, by name.
    pub schemas: BTreeMap<String, Schema>,
}

impl Database {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            schemas: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    pub name: String,
    pub owner: String,
}

/// Outcome of checking a decoded grant against the managed scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening<'a> {
    Keep,
    /// The grant's database is not managed.
    UnknownDatabase,
    /// The grant names a schema that is not managed.
    UnknownSchema,
    /// The grantee matches this blacklist pattern.
    Blacklisted(&'a str),
}

impl Instance {
    /// Check a grant against managed databases, schemas and the blacklist,
    /// in that order.
    pub fn screen(&self, grant: &Grant) -> Screening<'_> {
        let Some(database) = self.databases.get(&grant.database) else {
            return Screening::UnknownDatabase;
        };
        if let Some(schema) = &grant.schema {
            if !database.schemas.contains_key(schema) {
                return Screening::UnknownSchema;
            }
        }
        match self.roles_blacklist.match_str(&grant.grantee) {
            Some(pattern) => Screening::Blacklisted(pattern),
            None => Screening::Keep,
        }
    }

    /// Owner to record when the catalog reported none.
    pub(crate) fn owner_or_fallback(&self, owner: Option<String>) -> String {
        owner.unwrap_or_else(|| self.fallback_owner.clone())
    }
}
