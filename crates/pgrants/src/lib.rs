//! Inspect the privilege landscape of a PostgreSQL instance.
//!
//! pgrants builds an [`Instance`]: the managed databases and schemas of a
//! live PostgreSQL instance, and the grants roles hold on them, normalized so
//! they can be compared against a desired state.
//!
//! ```ignore
//! let pool = DbPool::from_conninfo("host=localhost user=postgres")?;
//! let catalog = PrivilegeCatalog::builtin();
//! let instance = Inspector::new(&pool, &catalog).inspect(&config).await?;
//! for grant in &instance.grants {
//!     println!("{grant}");
//! }
//! ```
//!
//! # Scope
//!
//! Privileges are read per object type, following a [`PrivilegeCatalog`].
//! Each entry is either instance-wide (queried once, on the default
//! database) or per-database (queried in every managed database). Grants
//! referring to unmanaged databases or schemas, or held by blacklisted roles,
//! are dropped. Query and decoding failures abort the inspection.
//!
//! # Cancellation
//!
//! Inspection is a plain future. Dropping it, for example through
//! `tokio::time::timeout`, aborts the in-flight query.

mod blacklist;
mod conn;
mod error;
mod grant;
mod inspect;
mod instance;
pub mod pool;
pub mod privilege;
pub mod querier;
mod row;

pub use blacklist::RolesBlacklist;
pub use conn::{BoxFuture, Connection};
pub use error::{BoxError, Error, RowError};
pub use grant::{Grant, decode_grant};
pub use inspect::{Inspector, Session};
pub use instance::{Database, Instance, Schema, Screening};
pub use pool::{ConnectionProvider, DbPool};
pub use privilege::{Privilege, PrivilegeCatalog, Scope};
pub use querier::{OverridableQuery, Querier, SqlQuery, StaticQuery};
pub use row::SqlRow;

pub use pgrants_config::{Config, RowsOrSql};

/// Result type for pgrants operations.
pub type Result<T> = std::result::Result<T, Error>;
