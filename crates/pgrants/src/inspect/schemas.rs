use super::{Inspector, collect_rows, decode_catalog_object};
use crate::querier::{Querier, SqlQuery};
use crate::{ConnectionProvider, Error, Instance, Result, Schema};
use std::collections::{BTreeMap, BTreeSet};

const SCHEMAS_QUERY: &str = r#"
SELECT nsp.nspname::text AS "name",
       owner.rolname::text AS "owner"
FROM pg_catalog.pg_namespace AS nsp
LEFT OUTER JOIN pg_catalog.pg_roles AS owner ON owner.oid = nsp.nspowner
ORDER BY 1
"#;

impl<P: ConnectionProvider> Inspector<'_, P> {
    /// Fill each database's schemas with those both managed and present.
    ///
    /// `managed` runs once per database, on that database.
    pub async fn inspect_schemas<Q: Querier<String>>(
        &self,
        instance: &mut Instance,
        managed: &mut Q,
    ) -> Result<()> {
        tracing::info!("Inspecting schemas.");
        managed.configure("SCHEMA");
        let mut catalog = SqlQuery::new("schemas", SCHEMAS_QUERY, decode_catalog_object);

        let databases: Vec<String> = instance.databases.keys().cloned().collect();
        for database in databases {
            tracing::debug!(%database, "Inspecting managed schemas.");
            let conn = self.pool.get(&database).await?;

            let managed_names: BTreeSet<String> = collect_rows(managed, &conn)
                .await
                .map_err(|e| Error::stage("schemas", e))?
                .into_iter()
                .collect();

            catalog
                .execute(&conn, &[])
                .await
                .map_err(|e| Error::stage("schemas", e))?;
            let mut schemas = BTreeMap::new();
            while catalog.advance() {
                let Some(schema) = catalog.current() else {
                    break;
                };
                if !managed_names.contains(&schema.name) {
                    continue;
                }
                let owner = instance.owner_or_fallback(schema.owner.clone());
                tracing::debug!(%database, schema = %schema.name, %owner, "Found schema.");
                schemas.insert(
                    schema.name.clone(),
                    Schema {
                        name: schema.name.clone(),
                        owner,
                    },
                );
            }
            if let Some(e) = catalog.err() {
                return Err(Error::stage("schemas", e));
            }

            if let Some(db) = instance.databases.get_mut(&database) {
                db.schemas.extend(schemas);
            }
        }
        Ok(())
    }
}
