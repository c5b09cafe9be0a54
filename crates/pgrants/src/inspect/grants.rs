use super::Inspector;
use crate::querier::{Querier, SqlQuery};
use crate::{ConnectionProvider, Error, Instance, Result, Scope, Screening, decode_grant};
use indexmap::IndexMap;
use tokio_postgres::types::ToSql;

impl<P: ConnectionProvider> Inspector<'_, P> {
    /// Read grants of every managed object type.
    ///
    /// `managed` maps object types to privilege types. Object types absent
    /// from it, or mapped to no privilege type, are not queried at all.
    /// Grants outside the managed databases and schemas, or held by a
    /// blacklisted role, are dropped.
    pub async fn inspect_grants(
        &self,
        instance: &mut Instance,
        managed: &IndexMap<String, Vec<String>>,
    ) -> Result<()> {
        tracing::info!("Inspecting privileges.");
        instance.managed_privileges = managed.clone();

        for privilege in self.catalog.iter() {
            let types = match managed.get(&privilege.object) {
                Some(types) if !types.is_empty() => types,
                _ => continue,
            };
            let databases: Vec<String> = match privilege.scope {
                Scope::Instance => vec![instance.default_database.clone()],
                Scope::Database => instance.databases.keys().cloned().collect(),
            };

            for database in &databases {
                tracing::debug!(
                    scope = %privilege.scope,
                    %database,
                    object = %privilege.object,
                    ?types,
                    "Inspecting grants."
                );
                let conn = self.pool.get(database).await?;

                let mut query = SqlQuery::new("grants", privilege.inspect.as_str(), decode_grant);
                query.configure(&privilege.object);
                let params: [&(dyn ToSql + Sync); 1] = [types];
                query
                    .execute(&conn, &params)
                    .await
                    .map_err(|e| Error::Privilege {
                        privilege: privilege.to_string(),
                        source: Box::new(e),
                    })?;

                while query.advance() {
                    let Some(row) = query.current() else {
                        break;
                    };
                    let mut grant = row.clone();
                    grant.target = privilege.object.clone();

                    match instance.screen(&grant) {
                        Screening::Keep => {}
                        Screening::UnknownDatabase | Screening::UnknownSchema => {
                            tracing::debug!(%grant, "Ignoring grant outside managed scope.");
                            continue;
                        }
                        Screening::Blacklisted(pattern) => {
                            tracing::debug!(%grant, %pattern, "Ignoring grant to blacklisted role.");
                            continue;
                        }
                    }

                    grant.normalize();
                    tracing::debug!(%grant, "Found grant in Postgres instance.");
                    instance.grants.push(grant);
                }
                if let Some(e) = query.err() {
                    return Err(Error::Privilege {
                        privilege: privilege.to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }
}
