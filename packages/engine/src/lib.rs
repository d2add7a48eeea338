//! # Plinth Engine
//!
//! Executes request documents against a host canvas: resolves the target
//! frame and slot, reconciles keyed content and builds whatever is new.
//!
//! The host is abstracted behind [`Canvas`]; [`MemoryCanvas`] is a complete
//! in-memory implementation.

pub mod container;
pub mod context;
pub mod errors;
pub mod executor;
pub mod factory;
pub mod host;
pub mod identity;
pub mod memory;
pub mod reconcile;
pub mod slots;
pub mod tokens;

pub use context::{create_execution_context, ExecutionContext, ExecutionOptions, ResolvedTarget};
pub use errors::{EngineError, ExecutionError, HostError};
pub use executor::{BatchOutcome, DocumentReport, ErrorReport, ExecutionSummary, Executor, SyncCounts};
pub use factory::{create_nodes, BuildContext, CreatedNode};
pub use host::{
    AutoLayout, Canvas, Color, FontName, HostNodeKind, NodeId, NodeSizing, NoticeLevel, Paint,
    Rect, Sizing, TextContent,
};
pub use memory::{MemoryCanvas, MemoryNode, Notice};
pub use reconcile::{sync_slot_children, SyncReport};
pub use slots::{resolve_slot_container, SlotTarget, ROOT_SLOT_ID};
pub use tokens::{TokenResolver, TokenTable, Typography, UnresolvedTokenPolicy};
