//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{NodeId, NodeType};

/// Domain errors represent hierarchy and layout rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] Violation),

    #[error("no free slot for {node_type} node within {rings} rings")]
    SlotExhausted { node_type: NodeType, rings: usize },

    #[error("unknown node: {0}")]
    InvalidReference(NodeId),

    #[error("node has no position yet: {0}")]
    Unplaced(NodeId),

    #[error("invalid {field}: {reason}")]
    InvalidAttribute { field: &'static str, reason: String },

    #[error("malformed hierarchy: {0}")]
    MalformedHierarchy(String),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Structural edits that would break a hierarchy invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("attaching {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("cycle detected while walking the ancestors of {0}")]
    CycleDetected(NodeId),

    #[error("{parent_type} nodes cannot host {child_type} children")]
    DisallowedChild {
        parent_type: NodeType,
        child_type: NodeType,
    },

    #[error("{parent} already has the maximum of {max} children")]
    CapacityExceeded { parent: NodeId, max: usize },

    #[error("root node cannot be moved or removed: {0}")]
    RootLocked(NodeId),

    #[error("{node} is a {actual} node, expected {expected}")]
    WrongType {
        node: NodeId,
        expected: NodeType,
        actual: NodeType,
    },

    #[error("{0} still has children")]
    HasChildren(NodeId),

    #[error("position ({x:.1}, {y:.1}) is occupied by {occupant}")]
    SlotOccupied { occupant: NodeId, x: f64, y: f64 },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
