//! In-memory connection provider for inspection tests.
//!
//! Queries are answered from scripted responses matched on database and a
//! substring of the SQL. Every connection request and query is recorded.

#![allow(dead_code)]

use indexmap::IndexMap;
use pgrants::{BoxError, BoxFuture, Connection, ConnectionProvider, Error, Result, RowError, SqlRow};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum Value {
    Text(Option<String>),
    Bool(Option<bool>),
}

/// A result row with named columns.
#[derive(Debug, Clone, Default)]
pub struct FakeRow {
    columns: Vec<(String, Value)>,
}

impl FakeRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, column: &str, value: &str) -> Self {
        self.columns
            .push((column.to_string(), Value::Text(Some(value.to_string()))));
        self
    }

    pub fn opt_text(mut self, column: &str, value: Option<&str>) -> Self {
        self.columns
            .push((column.to_string(), Value::Text(value.map(str::to_string))));
        self
    }

    pub fn boolean(mut self, column: &str, value: Option<bool>) -> Self {
        self.columns.push((column.to_string(), Value::Bool(value)));
        self
    }

    fn find(&self, column: &str) -> std::result::Result<&Value, RowError> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| RowError::MissingColumn {
                column: column.to_string(),
            })
    }
}

fn wrong_type(column: &str, expected: &str) -> RowError {
    RowError::Decode {
        column: column.to_string(),
        source: format!("expected {expected}").into(),
    }
}

impl SqlRow for FakeRow {
    fn text(&self, column: &str) -> std::result::Result<Option<String>, RowError> {
        match self.find(column)? {
            Value::Text(v) => Ok(v.clone()),
            Value::Bool(_) => Err(wrong_type(column, "text")),
        }
    }

    fn text_at(&self, index: usize) -> std::result::Result<Option<String>, RowError> {
        match self.columns.get(index) {
            Some((_, Value::Text(v))) => Ok(v.clone()),
            Some((name, Value::Bool(_))) => Err(wrong_type(name, "text")),
            None => Err(RowError::MissingColumn {
                column: format!("#{index}"),
            }),
        }
    }

    fn boolean(&self, column: &str) -> std::result::Result<Option<bool>, RowError> {
        match self.find(column)? {
            Value::Bool(v) => Ok(*v),
            Value::Text(_) => Err(wrong_type(column, "bool")),
        }
    }
}

/// A row of the grant catalog contract.
pub fn grant_row(database: &str, schema: Option<&str>, grantee: &str, privilege: &str) -> FakeRow {
    FakeRow::new()
        .opt_text("owner", None)
        .text("grantee", grantee)
        .text("type", privilege)
        .text("database", database)
        .opt_text("schema", schema)
        .opt_text("object", None)
        .boolean("partial", Some(false))
}

/// A `name, owner` catalog row.
pub fn object_row(name: &str, owner: Option<&str>) -> FakeRow {
    FakeRow::new().text("name", name).opt_text("owner", owner)
}

/// Single-column rows.
pub fn name_rows(names: &[&str]) -> Vec<FakeRow> {
    names
        .iter()
        .map(|name| FakeRow::new().text("name", name))
        .collect()
}

pub fn session_row(role: &str, database: &str, version: &str) -> FakeRow {
    FakeRow::new()
        .text("current_role", role)
        .text("database", database)
        .text("server_version_num", version)
}

pub fn managed(entries: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(object, types)| {
            (
                object.to_string(),
                types.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Response {
    Rows(Vec<FakeRow>),
    Fail(String),
    Hang,
}

struct Script {
    database: Option<String>,
    needle: String,
    response: Response,
}

/// A query received by a fake connection.
#[derive(Debug, Clone)]
pub struct Call {
    pub database: String,
    pub sql: String,
    pub params: String,
}

#[derive(Default)]
struct Shared {
    scripts: Vec<Script>,
    unreachable: HashSet<String>,
    connections: Vec<String>,
    calls: Vec<Call>,
}

pub struct FakePool {
    default_database: String,
    shared: Arc<Mutex<Shared>>,
}

impl FakePool {
    pub fn new(default_database: &str) -> Self {
        Self {
            default_database: default_database.to_string(),
            shared: Arc::default(),
        }
    }

    fn script(&self, database: Option<&str>, needle: &str, response: Response) -> &Self {
        self.shared.lock().unwrap().scripts.push(Script {
            database: database.map(str::to_string),
            needle: needle.to_string(),
            response,
        });
        self
    }

    /// Answer queries containing `needle` on `database` with `rows`.
    pub fn respond(&self, database: &str, needle: &str, rows: Vec<FakeRow>) -> &Self {
        self.script(Some(database), needle, Response::Rows(rows))
    }

    /// Answer queries containing `needle` on any database with `rows`.
    pub fn respond_everywhere(&self, needle: &str, rows: Vec<FakeRow>) -> &Self {
        self.script(None, needle, Response::Rows(rows))
    }

    pub fn fail(&self, database: &str, needle: &str, message: &str) -> &Self {
        self.script(Some(database), needle, Response::Fail(message.to_string()))
    }

    /// Queries containing `needle` never complete.
    pub fn hang(&self, needle: &str) -> &Self {
        self.script(None, needle, Response::Hang)
    }

    pub fn unreachable(&self, database: &str) -> &Self {
        self.shared
            .lock()
            .unwrap()
            .unreachable
            .insert(database.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    /// Databases that received a query containing `needle`, in call order.
    pub fn databases_queried(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.sql.contains(needle))
            .map(|call| call.database)
            .collect()
    }

    /// Databases a connection was requested for, in call order.
    pub fn connections(&self) -> Vec<String> {
        self.shared.lock().unwrap().connections.clone()
    }
}

impl ConnectionProvider for FakePool {
    type Conn = FakeConn;

    fn default_database(&self) -> &str {
        &self.default_database
    }

    fn get<'a>(&'a self, database: &'a str) -> BoxFuture<'a, Result<FakeConn>> {
        let mut shared = self.shared.lock().unwrap();
        shared.connections.push(database.to_string());
        let result = if shared.unreachable.contains(database) {
            Err(Error::Connect {
                database: database.to_string(),
                source: "connection refused".into(),
            })
        } else {
            Ok(FakeConn {
                database: database.to_string(),
                shared: Arc::clone(&self.shared),
            })
        };
        Box::pin(async move { result })
    }
}

pub struct FakeConn {
    database: String,
    shared: Arc<Mutex<Shared>>,
}

impl Connection for FakeConn {
    type Row = FakeRow;

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, std::result::Result<Vec<FakeRow>, BoxError>> {
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push(Call {
            database: self.database.clone(),
            sql: sql.to_string(),
            params: format!("{params:?}"),
        });
        let response = shared
            .scripts
            .iter()
            .find(|s| {
                s.database.as_deref().is_none_or(|db| db == self.database)
                    && sql.contains(&s.needle)
            })
            .map(|s| s.response.clone())
            .unwrap_or(Response::Rows(Vec::new()));
        drop(shared);

        Box::pin(async move {
            match response {
                Response::Rows(rows) => Ok(rows),
                Response::Fail(message) => Err(message.into()),
                Response::Hang => std::future::pending().await,
            }
        })
    }
}
