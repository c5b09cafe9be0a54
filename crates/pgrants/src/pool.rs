//! Per-database connection pool.
//!
//! PostgreSQL binds a session to one database, so inspecting several
//! databases needs one connection per database name. [`DbPool`] creates these
//! lazily and keeps them for the duration of a run.

use crate::conn::BoxFuture;
use crate::{Connection, Error, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_postgres::NoTls;

/// Source of connections, keyed by database name.
pub trait ConnectionProvider: Send + Sync {
    /// Connection type handed out by this provider.
    type Conn: Connection;

    /// Database used for instance-wide queries.
    fn default_database(&self) -> &str;

    /// Return a connection to `database`, opening it if needed.
    fn get<'a>(&'a self, database: &'a str) -> BoxFuture<'a, Result<Self::Conn>>;
}

/// Lazily opened pools, one connection per database.
pub struct DbPool {
    config: tokio_postgres::Config,
    default_database: String,
    pools: Mutex<HashMap<String, Pool>>,
}

impl DbPool {
    /// Create a pool from a base connection config.
    ///
    /// The database named by `config` (or the user name, as libpq does when
    /// none is given) becomes the default database.
    pub fn new(config: tokio_postgres::Config) -> Self {
        let default_database = config
            .get_dbname()
            .or(config.get_user())
            .unwrap_or("postgres")
            .to_string();
        Self {
            config,
            default_database,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Parse a libpq connection string or URL.
    pub fn from_conninfo(conninfo: &str) -> Result<Self> {
        let config = conninfo
            .parse::<tokio_postgres::Config>()
            .map_err(|e| Error::Pool(format!("invalid connection string: {e}")))?;
        Ok(Self::new(config))
    }

    fn pool_for(&self, database: &str) -> Result<Pool> {
        let mut pools = self
            .pools
            .lock()
            .map_err(|_| Error::Pool("pool registry poisoned".to_string()))?;
        if let Some(pool) = pools.get(database) {
            return Ok(pool.clone());
        }

        let mut config = self.config.clone();
        config.dbname(database);
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(1)
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;
        tracing::debug!(database, "Opened connection pool.");
        pools.insert(database.to_string(), pool.clone());
        Ok(pool)
    }
}

impl ConnectionProvider for DbPool {
    type Conn = deadpool_postgres::Object;

    fn default_database(&self) -> &str {
        &self.default_database
    }

    fn get<'a>(&'a self, database: &'a str) -> BoxFuture<'a, Result<Self::Conn>> {
        Box::pin(async move {
            let pool = self.pool_for(database)?;
            pool.get().await.map_err(|e| Error::Connect {
                database: database.to_string(),
                source: Box::new(e),
            })
        })
    }
}
