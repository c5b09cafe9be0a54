use super::{Inspector, no_row};
use crate::querier::{Querier, SqlQuery};
use crate::{ConnectionProvider, Error, Instance, Result, RowError, SqlRow};

/// Facts about the inspecting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub current_role: String,
    pub database: String,
    pub server_version_num: u32,
}

const SESSION_QUERY: &str = r#"
SELECT current_user::text AS "current_role",
       current_database()::text AS "database",
       current_setting('server_version_num') AS "server_version_num"
"#;

fn decode_session(row: &dyn SqlRow) -> std::result::Result<Session, RowError> {
    let version = row.required_text("server_version_num")?;
    let server_version_num = version.trim().parse().map_err(|e| RowError::Decode {
        column: "server_version_num".to_string(),
        source: Box::new(e),
    })?;
    Ok(Session {
        current_role: row.required_text("current_role")?,
        database: row.required_text("database")?,
        server_version_num,
    })
}

impl<P: ConnectionProvider> Inspector<'_, P> {
    /// Record who we are connected as and to which server.
    pub async fn inspect_session(&self, instance: &mut Instance) -> Result<Session> {
        let database = self.pool.default_database().to_string();
        let conn = self.pool.get(&database).await?;

        let mut query = SqlQuery::new("session", SESSION_QUERY, decode_session);
        query
            .execute(&conn, &[])
            .await
            .map_err(|e| Error::stage("session", e))?;
        let session = if query.advance() {
            query.current().cloned()
        } else {
            None
        };
        let Some(session) = session else {
            let e = query.err().unwrap_or_else(|| no_row("session"));
            return Err(Error::stage("session", e));
        };

        if session.database != instance.default_database {
            tracing::debug!(
                configured = %instance.default_database,
                session = %session.database,
                "Using session database as default database."
            );
            instance.default_database = session.database.clone();
        }
        instance.current_role = session.current_role.clone();
        instance.server_version_num = session.server_version_num;
        tracing::info!(
            role = %session.current_role,
            database = %session.database,
            version = session.server_version_num,
            "Connected to PostgreSQL."
        );
        Ok(session)
    }
}
