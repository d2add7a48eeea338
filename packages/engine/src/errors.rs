//! Error types for the engine

use crate::host::NodeId;
use plinth_guardrails::GuardrailResult;
use plinth_registry::ConfigError;
use plinth_schema::ParseError;
use thiserror::Error;

/// Failure reported by a host capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} cannot contain children")]
    NotAContainer(NodeId),

    #[error("Appending {child} to {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Font '{0}' is not available")]
    FontUnavailable(String),

    #[error("Font '{0}' must be loaded before setting text")]
    FontNotLoaded(String),

    #[error("Component '{0}' could not be imported")]
    ComponentUnavailable(String),

    #[error("Unsupported host operation: {0}")]
    Unsupported(String),
}

/// Failure while materializing a document on the canvas
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Page '{0}' not found")]
    PageNotFound(String),

    #[error("Unresolved {kind} token '{token}'")]
    UnresolvedToken { token: String, kind: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why one document of a run did not execute
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Guardrails failed: {}", .result.error_messages().join("; "))]
    Validation { result: GuardrailResult },

    #[error("Page '{0}' not found")]
    PageNotFound(String),

    #[error("Unresolved {kind} token '{token}'")]
    UnresolvedToken { token: String, kind: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl From<EngineError> for ExecutionError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Host(err) => ExecutionError::Host(err),
            EngineError::PageNotFound(page) => ExecutionError::PageNotFound(page),
            EngineError::UnresolvedToken { token, kind } => {
                ExecutionError::UnresolvedToken { token, kind }
            }
            EngineError::Config(err) => ExecutionError::Config(err),
        }
    }
}

impl ExecutionError {
    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Parse(_) => "parse",
            ExecutionError::Validation { .. } => "validation",
            ExecutionError::PageNotFound(_) | ExecutionError::Config(_) => "config",
            ExecutionError::UnresolvedToken { .. } => "token",
            ExecutionError::Host(_) => "host",
        }
    }
}
