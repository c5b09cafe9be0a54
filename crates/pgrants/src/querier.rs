//! Scoped queriers.
//!
//! A [`Querier`] is a cursor over one query: configure it, execute it on a
//! connection, then advance through the decoded rows and check [`Querier::err`]
//! once exhausted. The inspectors only see this trait, so the built-in
//! catalog SQL, a user override and literal rows from configuration are
//! interchangeable.

use crate::conn::BoxFuture;
use crate::{Connection, Error, Result, RowError, SqlRow};
use std::collections::VecDeque;
use tokio_postgres::types::ToSql;

/// Decodes one row into a record.
pub type Decoder<T> = fn(&dyn SqlRow) -> std::result::Result<T, RowError>;

/// Cursor over the rows of one query.
pub trait Querier<T> {
    /// Bind the querier to the object type it inspects.
    fn configure(&mut self, target: &str);

    /// Run the query, replacing any previous result.
    fn execute<'a, C: Connection>(
        &'a mut self,
        conn: &'a C,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<()>>;

    /// Move to the next row. Returns `false` once rows are exhausted or a
    /// row failed to decode.
    fn advance(&mut self) -> bool;

    /// The row reached by the last successful [`advance`](Querier::advance).
    fn current(&self) -> Option<&T>;

    /// The failure that ended iteration, if any.
    fn err(&mut self) -> Option<Error>;
}

/// A SQL query paired with a typed decoder.
pub struct SqlQuery<T> {
    name: String,
    sql: String,
    decode: Decoder<T>,
    target: Option<String>,
    pending: VecDeque<std::result::Result<T, RowError>>,
    current: Option<T>,
    err: Option<Error>,
}

impl<T> SqlQuery<T> {
    /// `name` identifies the query in logs and errors.
    pub fn new(name: impl Into<String>, sql: impl Into<String>, decode: Decoder<T>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            decode,
            target: None,
            pending: VecDeque::new(),
            current: None,
            err: None,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn label(&self) -> String {
        match &self.target {
            Some(target) => format!("{} ({target})", self.name),
            None => self.name.clone(),
        }
    }
}

impl<T: Send> Querier<T> for SqlQuery<T> {
    fn configure(&mut self, target: &str) {
        self.target = Some(target.to_string());
    }

    fn execute<'a, C: Connection>(
        &'a mut self,
        conn: &'a C,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.pending.clear();
            self.current = None;
            self.err = None;

            tracing::debug!(query = %self.label(), "Executing SQL query:\n{}", self.sql);
            let rows = conn
                .query(&self.sql, params)
                .await
                .map_err(|source| Error::BadQuery {
                    query: self.label(),
                    source,
                })?;
            let decode = self.decode;
            self.pending = rows.iter().map(|row| decode(row)).collect();
            Ok(())
        })
    }

    fn advance(&mut self) -> bool {
        if self.err.is_some() {
            self.current = None;
            return false;
        }
        match self.pending.pop_front() {
            Some(Ok(row)) => {
                self.current = Some(row);
                true
            }
            Some(Err(source)) => {
                self.current = None;
                self.pending.clear();
                self.err = Some(Error::BadRow {
                    query: self.label(),
                    source,
                });
                false
            }
            None => {
                self.current = None;
                false
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn err(&mut self) -> Option<Error> {
        self.err.take()
    }
}

/// Literal rows, typically from configuration.
///
/// Executing does not touch the connection.
#[derive(Debug, Clone)]
pub struct StaticQuery<T> {
    rows: Vec<T>,
    cursor: Option<usize>,
}

impl<T> StaticQuery<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows, cursor: None }
    }
}

impl<T: Send + Sync> Querier<T> for StaticQuery<T> {
    fn configure(&mut self, _target: &str) {}

    fn execute<'a, C: Connection>(
        &'a mut self,
        _conn: &'a C,
        _params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<()>> {
        self.cursor = None;
        Box::pin(async { Ok(()) })
    }

    fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    fn current(&self) -> Option<&T> {
        self.cursor.and_then(|i| self.rows.get(i))
    }

    fn err(&mut self) -> Option<Error> {
        None
    }
}

/// A built-in query or the override chosen by configuration.
pub enum OverridableQuery<T> {
    Rows(StaticQuery<T>),
    Sql(SqlQuery<T>),
}

impl OverridableQuery<String> {
    /// Resolve a configured source of names against a built-in default.
    ///
    /// Inline rows win, then a non-blank SQL override, then `builtin`.
    pub fn resolve(
        name: &str,
        source: Option<&pgrants_config::RowsOrSql>,
        builtin: OverridableQuery<String>,
    ) -> Self {
        let Some(source) = source else {
            return builtin;
        };
        if let Some(rows) = &source.rows {
            return OverridableQuery::Rows(StaticQuery::new(rows.clone()));
        }
        match source.effective_sql() {
            Some(sql) => OverridableQuery::Sql(SqlQuery::new(name, sql, decode_first_text)),
            None => builtin,
        }
    }
}

impl<T: Send + Sync> Querier<T> for OverridableQuery<T> {
    fn configure(&mut self, target: &str) {
        match self {
            OverridableQuery::Rows(q) => q.configure(target),
            OverridableQuery::Sql(q) => q.configure(target),
        }
    }

    fn execute<'a, C: Connection>(
        &'a mut self,
        conn: &'a C,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Result<()>> {
        match self {
            OverridableQuery::Rows(q) => q.execute(conn, params),
            OverridableQuery::Sql(q) => q.execute(conn, params),
        }
    }

    fn advance(&mut self) -> bool {
        match self {
            OverridableQuery::Rows(q) => q.advance(),
            OverridableQuery::Sql(q) => q.advance(),
        }
    }

    fn current(&self) -> Option<&T> {
        match self {
            OverridableQuery::Rows(q) => q.current(),
            OverridableQuery::Sql(q) => q.current(),
        }
    }

    fn err(&mut self) -> Option<Error> {
        match self {
            OverridableQuery::Rows(q) => q.err(),
            OverridableQuery::Sql(q) => q.err(),
        }
    }
}

/// Decode the first column of a row as non-NULL text.
pub fn decode_first_text(row: &dyn SqlRow) -> std::result::Result<String, RowError> {
    row.text_at(0)?.ok_or_else(|| RowError::Null {
        column: "#0".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_rows_iterate_once() {
        let mut q = StaticQuery::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(q.current(), None);
        assert!(q.advance());
        assert_eq!(q.current().map(String::as_str), Some("a"));
        assert!(q.advance());
        assert_eq!(q.current().map(String::as_str), Some("b"));
        assert!(!q.advance());
        assert_eq!(q.current(), None);
        assert!(!q.advance());
        assert!(q.err().is_none());
    }

    #[test]
    fn empty_static_rows() {
        let mut q: StaticQuery<String> = StaticQuery::new(Vec::new());
        assert!(!q.advance());
        assert_eq!(q.current(), None);
    }

    #[test]
    fn resolve_prefers_rows_then_sql_then_builtin() {
        use pgrants_config::RowsOrSql;

        let builtin = || OverridableQuery::Rows(StaticQuery::new(vec!["builtin".to_string()]));

        let q = OverridableQuery::resolve("roles", None, builtin());
        assert!(matches!(q, OverridableQuery::Rows(ref s) if s.rows == ["builtin"]));

        let q = OverridableQuery::resolve("roles", Some(&RowsOrSql::rows(["alice"])), builtin());
        assert!(matches!(q, OverridableQuery::Rows(ref s) if s.rows == ["alice"]));

        let q = OverridableQuery::resolve("roles", Some(&RowsOrSql::sql("SELECT 'x'")), builtin());
        assert!(matches!(q, OverridableQuery::Sql(ref s) if s.sql() == "SELECT 'x'"));

        let q = OverridableQuery::resolve("roles", Some(&RowsOrSql::sql("   ")), builtin());
        assert!(matches!(q, OverridableQuery::Rows(ref s) if s.rows == ["builtin"]));
    }
}
