use thiserror::Error;

/// Boxed error returned by connections and decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connect to database {database}: {source}")]
    Connect {
        database: String,
        #[source]
        source: BoxError,
    },

    #[error("bad query {query}: {source}")]
    BadQuery {
        query: String,
        #[source]
        source: BoxError,
    },

    #[error("bad row from {query}: {source}")]
    BadRow {
        query: String,
        #[source]
        source: RowError,
    },

    #[error("{privilege}: {source}")]
    Privilege {
        privilege: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid role pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("connection pool: {0}")]
    Pool(String),
}

impl Error {
    /// Wrap an error with the inspection stage it happened in.
    pub(crate) fn stage(stage: &'static str, source: Error) -> Self {
        Error::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping stage and privilege context.
    pub fn root(&self) -> &Error {
        match self {
            Error::Privilege { source, .. } | Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A result row could not be decoded into the expected shape.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing column {column}")]
    MissingColumn { column: String },

    #[error("unexpected NULL in column {column}")]
    Null { column: String },

    #[error("cannot decode column {column}: {source}")]
    Decode {
        column: String,
        #[source]
        source: BoxError,
    },
}
