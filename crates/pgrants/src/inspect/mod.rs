//! Instance inspection.
//!
//! [`Inspector::inspect`] runs every stage in order: session, roles,
//! databases, schemas, then grants. Each stage is also callable on its own,
//! provided the stages it depends on already populated the [`Instance`].

mod databases;
mod grants;
mod roles;
mod schemas;
mod session;

use crate::querier::{OverridableQuery, Querier, SqlQuery, StaticQuery, decode_first_text};
use crate::{Connection, ConnectionProvider, Error, Instance, PrivilegeCatalog, Result, RowError, SqlRow};
use pgrants_config::Config;

pub use session::Session;

/// Builds an [`Instance`] from a live PostgreSQL instance.
pub struct Inspector<'a, P> {
    pool: &'a P,
    catalog: &'a PrivilegeCatalog,
}

impl<'a, P: ConnectionProvider> Inspector<'a, P> {
    pub fn new(pool: &'a P, catalog: &'a PrivilegeCatalog) -> Self {
        Self { pool, catalog }
    }

    /// Inspect everything `config` asks for.
    ///
    /// On error the partially built instance is dropped.
    pub async fn inspect(&self, config: &Config) -> Result<Instance> {
        let mut instance = Instance {
            default_database: self.pool.default_database().to_string(),
            ..Default::default()
        };

        self.inspect_session(&mut instance).await?;
        let fallback_owner = config
            .fallback_owner
            .clone()
            .unwrap_or_else(|| instance.current_role.clone());
        instance.fallback_owner = fallback_owner;

        let mut blacklist = OverridableQuery::resolve(
            "roles blacklist",
            config.roles_blacklist_query.as_ref(),
            OverridableQuery::Rows(StaticQuery::new(
                DEFAULT_ROLES_BLACKLIST.iter().map(|p| p.to_string()).collect(),
            )),
        );
        self.inspect_roles_blacklist(&mut instance, &mut blacklist)
            .await?;

        let mut managed_roles = OverridableQuery::resolve(
            "managed roles",
            config.managed_roles_query.as_ref(),
            builtin("managed roles", MANAGED_ROLES_QUERY),
        );
        self.inspect_managed_roles(&mut instance, &mut managed_roles)
            .await?;

        let mut managed_databases = OverridableQuery::resolve(
            "managed databases",
            config.databases_query.as_ref(),
            builtin("managed databases", MANAGED_DATABASES_QUERY),
        );
        self.inspect_databases(&mut instance, &mut managed_databases)
            .await?;

        let mut managed_schemas = OverridableQuery::resolve(
            "managed schemas",
            config.managed_schemas_query.as_ref(),
            builtin("managed schemas", MANAGED_SCHEMAS_QUERY),
        );
        self.inspect_schemas(&mut instance, &mut managed_schemas)
            .await?;

        self.inspect_grants(&mut instance, &config.managed_privileges)
            .await?;

        tracing::info!(
            databases = instance.databases.len(),
            grants = instance.grants.len(),
            "Inspection done."
        );
        Ok(instance)
    }
}

fn builtin(name: &str, sql: &str) -> OverridableQuery<String> {
    OverridableQuery::Sql(SqlQuery::new(name, sql, decode_first_text))
}

/// Run a single-column query and collect its rows in order.
async fn collect_rows<Q, C>(query: &mut Q, conn: &C) -> Result<Vec<String>>
where
    Q: Querier<String>,
    C: Connection,
{
    query.execute(conn, &[]).await?;
    let mut rows = Vec::new();
    while query.advance() {
        if let Some(row) = query.current() {
            rows.push(row.clone());
        }
    }
    match query.err() {
        Some(e) => Err(e),
        None => Ok(rows),
    }
}

/// A named catalog object and its owner, if the owner role still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogObject {
    pub name: String,
    pub owner: Option<String>,
}

pub(crate) fn decode_catalog_object(row: &dyn SqlRow) -> std::result::Result<CatalogObject, RowError> {
    Ok(CatalogObject {
        name: row.required_text("name")?,
        owner: row.text("owner")?,
    })
}

/// Error for a query that should return exactly one row but returned none.
fn no_row(query: &str) -> Error {
    Error::BadQuery {
        query: query.to_string(),
        source: "query returned no row".into(),
    }
}

const DEFAULT_ROLES_BLACKLIST: &[&str] = &["postgres", "pg_*"];

const MANAGED_ROLES_QUERY: &str = r#"
SELECT 'public'::text
UNION
SELECT rolname::text FROM pg_catalog.pg_roles
ORDER BY 1
"#;

const MANAGED_DATABASES_QUERY: &str = r#"
SELECT datname::text
FROM pg_catalog.pg_database
WHERE datallowconn IS TRUE
ORDER BY 1
"#;

const MANAGED_SCHEMAS_QUERY: &str = r#"
SELECT nspname::text
FROM pg_catalog.pg_namespace
WHERE nspname NOT LIKE 'pg\_%'
  AND nspname <> 'information_schema'
ORDER BY 1
"#;
