use super::{Inspector, collect_rows};
use crate::querier::Querier;
use crate::{ConnectionProvider, Error, Instance, Result, RolesBlacklist};

impl<P: ConnectionProvider> Inspector<'_, P> {
    /// Load the patterns of roles whose grants are ignored.
    pub async fn inspect_roles_blacklist<Q: Querier<String>>(
        &self,
        instance: &mut Instance,
        query: &mut Q,
    ) -> Result<()> {
        let conn = self.pool.get(&instance.default_database).await?;
        query.configure("ROLE");
        let patterns = collect_rows(query, &conn)
            .await
            .map_err(|e| Error::stage("roles", e))?;
        tracing::debug!(?patterns, "Roles blacklist loaded.");
        instance.roles_blacklist = RolesBlacklist::new(patterns)?;
        Ok(())
    }

    /// Load the roles in scope.
    pub async fn inspect_managed_roles<Q: Querier<String>>(
        &self,
        instance: &mut Instance,
        query: &mut Q,
    ) -> Result<()> {
        tracing::info!("Inspecting managed roles.");
        let conn = self.pool.get(&instance.default_database).await?;
        query.configure("ROLE");
        let roles = collect_rows(query, &conn)
            .await
            .map_err(|e| Error::stage("roles", e))?;
        for role in roles {
            if let Some(pattern) = instance.roles_blacklist.match_str(&role) {
                tracing::debug!(%role, %pattern, "Ignoring blacklisted role.");
                continue;
            }
            instance.managed_roles.insert(role);
        }
        tracing::debug!(count = instance.managed_roles.len(), "Managed roles loaded.");
        Ok(())
    }
}
