//! Traced database connections.
//!
//! Every query issued by the inspectors goes through [`Connection::query`],
//! which the postgres implementations wrap in a `db.query` tracing span.

use crate::{BoxError, SqlRow};
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;
use tracing::Instrument;

/// A boxed future, as returned by the connection and pool traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for database connections that can run read-only queries.
///
/// This is implemented for `tokio_postgres::Client` and `deadpool_postgres::Object`.
pub trait Connection: Send + Sync {
    /// Row type produced by this connection.
    type Row: SqlRow + Send;

    /// Execute a query, returning all rows.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<Vec<Self::Row>, BoxError>>;
}

async fn traced_query(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<tokio_postgres::Row>, BoxError> {
    let span = tracing::debug_span!(
        "db.query",
        sql = %sql,
        params = params.len(),
        rows = tracing::field::Empty,
    );
    let rows = client.query(sql, params).instrument(span.clone()).await?;
    span.record("rows", rows.len());
    Ok(rows)
}

impl Connection for tokio_postgres::Client {
    type Row = tokio_postgres::Row;

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<Vec<Self::Row>, BoxError>> {
        Box::pin(traced_query(self, sql, params))
    }
}

impl Connection for deadpool_postgres::Object {
    type Row = tokio_postgres::Row;

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<Vec<Self::Row>, BoxError>> {
        // Deref to the underlying Client to avoid recursion
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(traced_query(client, sql, params))
    }
}
