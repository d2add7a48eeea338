//! # Plinth Schema
//!
//! Wire model for layout execution: request documents, the node-spec tagged
//! union, the execution request payload and the persisted node identity.

pub mod document;
pub mod error;
pub mod identity;
pub mod layout;
pub mod node;
pub mod request;

pub use document::{
    parse_document, DocumentMeta, Intent, Mode, RequestDocument, TargetSpec,
    CURRENT_SCHEMA_VERSION,
};
pub use error::{ParseError, ParseResult, RequestError};
pub use identity::{node_key, NodeIdentity};
pub use layout::{
    Alignment, Constraint, Constraints, Dimension, Direction, Edges, LayoutSpec, Padding,
    SizeKeyword, SizeSpec,
};
pub use node::{
    ComponentSpec, ContainerSpec, ImageFit, ImageSpec, NodeKind, NodeSpec, NodeTokens, Operation,
    SpacerSpec, TextSpec, TextStyle,
};
pub use request::ExecutionRequest;
