use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Failure to turn a raw request document into a [`crate::RequestDocument`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Request document is empty")]
    Empty,

    #[error("Invalid JSON at {line}:{column}: {message}")]
    InvalidJson {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Request document must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Invalid request document at {line}:{column}: {message}")]
    InvalidDocument {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let line = err.line();
        let column = err.column();
        let message = err.to_string();

        match err.classify() {
            Category::Data => Self::InvalidDocument {
                line,
                column,
                message,
            },
            Category::Io | Category::Syntax | Category::Eof => Self::InvalidJson {
                line,
                column,
                message,
            },
        }
    }
}

/// Rejection of a malformed execution request payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Request payload is not valid JSON: {0}")]
    Malformed(String),

    #[error("Request payload must be a JSON object")]
    NotAnObject,

    #[error("Request must contain at least one document")]
    NoDocuments,

    #[error("Document #{index} is not a string")]
    DocumentNotString { index: usize },

    #[error("Document #{index} is empty")]
    EmptyDocument { index: usize },

    #[error("Invalid intent '{0}': expected 'dry-run' or 'apply'")]
    InvalidIntent(String),

    #[error("Invalid target mode '{0}': expected 'append', 'replace' or 'update'")]
    InvalidMode(String),

    #[error("Field '{field}' must be a string")]
    InvalidField { field: &'static str },
}
