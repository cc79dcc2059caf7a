//! Error types for loading, view construction and expression parsing.

use thiserror::Error;

/// Fatal faults for an in-flight load. The partially populated table is left
/// as-is; the caller decides whether to keep or discard it.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream error near line {line}: {message}")]
    Stream { line: u64, message: String },

    #[error("empty input: missing header line")]
    EmptyInput,
}

/// Row-local fault: the row is skipped and loading continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("line {line}: row has {fields} fields for {headers} headers")]
    TooManyFields {
        /// 1-based input line number (the header is line 1).
        line: u64,
        fields: usize,
        headers: usize,
    },
}

impl RowError {
    pub fn line(&self) -> u64 {
        match self {
            RowError::TooManyFields { line, .. } => *line,
        }
    }
}

/// View-spec validation faults. Rejected before any live view is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("unknown column: {0:?}")]
    UnknownColumn(String),

    #[error("derived column {0:?} references derived column {1:?}")]
    DerivedChain(String, String),

    #[error("axis references no columns")]
    EmptyAxis,

    #[error("axis references more than two columns")]
    TooManySources,

    #[error("column {0:?} is free text and cannot be projected")]
    Unprojectable(String),

    #[error("malformed axis field {0:?}")]
    BadAxisField(String),

    #[error("in derived column {name:?}: {source}")]
    Expr {
        name: String,
        #[source]
        source: ExprError,
    },

    #[error("view JSON: {0}")]
    Json(String),
}

/// Derived-column expression faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),

    #[error("expression references more than two identifiers")]
    TooManyIdentifiers,
}
