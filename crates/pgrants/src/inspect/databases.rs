use super::{Inspector, collect_rows, decode_catalog_object};
use crate::querier::{Querier, SqlQuery};
use crate::{ConnectionProvider, Database, Error, Instance, Result};
use std::collections::BTreeSet;

const DATABASES_QUERY: &str = r#"
SELECT db.datname::text AS "name",
       owner.rolname::text AS "owner"
FROM pg_catalog.pg_database AS db
LEFT OUTER JOIN pg_catalog.pg_roles AS owner ON owner.oid = db.datdba
ORDER BY 1
"#;

impl<P: ConnectionProvider> Inspector<'_, P> {
    /// Register every database that is both managed and present in the
    /// catalog.
    pub async fn inspect_databases<Q: Querier<String>>(
        &self,
        instance: &mut Instance,
        managed: &mut Q,
    ) -> Result<()> {
        tracing::info!("Inspecting databases.");
        let conn = self.pool.get(&instance.default_database).await?;

        managed.configure("DATABASE");
        let managed_names: BTreeSet<String> = collect_rows(managed, &conn)
            .await
            .map_err(|e| Error::stage("databases", e))?
            .into_iter()
            .collect();

        let mut catalog = SqlQuery::new("databases", DATABASES_QUERY, decode_catalog_object);
        catalog
            .execute(&conn, &[])
            .await
            .map_err(|e| Error::stage("databases", e))?;
        while catalog.advance() {
            let Some(db) = catalog.current() else {
                break;
            };
            if !managed_names.contains(&db.name) {
                continue;
            }
            let owner = instance.owner_or_fallback(db.owner.clone());
            tracing::debug!(database = %db.name, %owner, "Found database.");
            instance
                .databases
                .entry(db.name.clone())
                .or_insert_with(|| Database::new(db.name.clone(), owner));
        }
        if let Some(e) = catalog.err() {
            return Err(Error::stage("databases", e));
        }

        for missing in managed_names
            .iter()
            .filter(|name| !instance.databases.contains_key(*name))
        {
            tracing::warn!(database = %missing, "Managed database does not exist.");
        }
        Ok(())
    }
}
