//! Typed access to result rows.
//!
//! Decoders read rows through [`SqlRow`] rather than `tokio_postgres::Row`
//! directly, so query results can come from any [`Connection`](crate::Connection).

use crate::RowError;
use std::error::Error as StdError;
use tokio_postgres::types::WrongType;

/// One result row.
pub trait SqlRow {
    /// Read a nullable text column by name.
    fn text(&self, column: &str) -> Result<Option<String>, RowError>;

    /// Read a nullable text column by position.
    fn text_at(&self, index: usize) -> Result<Option<String>, RowError>;

    /// Read a nullable boolean column by name.
    fn boolean(&self, column: &str) -> Result<Option<bool>, RowError>;

    /// Read a text column that must not be NULL.
    fn required_text(&self, column: &str) -> Result<String, RowError> {
        self.text(column)?.ok_or_else(|| RowError::Null {
            column: column.to_string(),
        })
    }
}

impl SqlRow for tokio_postgres::Row {
    fn text(&self, column: &str) -> Result<Option<String>, RowError> {
        if !self.columns().iter().any(|c| c.name() == column) {
            return Err(RowError::MissingColumn {
                column: column.to_string(),
            });
        }
        self.try_get(column).map_err(|e| read_error(column, e))
    }

    fn text_at(&self, index: usize) -> Result<Option<String>, RowError> {
        if index >= self.len() {
            return Err(RowError::MissingColumn {
                column: format!("#{index}"),
            });
        }
        self.try_get(index)
            .map_err(|e| read_error(&format!("#{index}"), e))
    }

    fn boolean(&self, column: &str) -> Result<Option<bool>, RowError> {
        if !self.columns().iter().any(|c| c.name() == column) {
            return Err(RowError::MissingColumn {
                column: column.to_string(),
            });
        }
        self.try_get(column).map_err(|e| read_error(column, e))
    }
}

fn read_error(column: &str, e: tokio_postgres::Error) -> RowError {
    // Keep the WrongType message, it names both the Rust and Postgres types.
    let source: crate::BoxError = match e.source().and_then(|s| s.downcast_ref::<WrongType>()) {
        Some(wrong) => wrong.to_string().into(),
        None => Box::new(e),
    };
    RowError::Decode {
        column: column.to_string(),
        source,
    }
}
