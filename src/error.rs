//! Error types for tree mutation and attribute editing

use thiserror::Error;

use crate::tree::{NodeId, SlotName, SlotRef, Variant};

/// Errors raised by the node tree's mutation methods.
///
/// None of these are reachable through the validated drag-drop path; seeing
/// one means a caller broke a structural invariant.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Node id not present in the tree
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Node already has a parent
    #[error("node {node} is already attached to {parent}")]
    AlreadyAttached { node: NodeId, parent: SlotRef },

    /// Slot owner does not expose the named slot
    #[error("{variant} node {owner} has no slot '{slot}'")]
    InvalidSlot {
        owner: NodeId,
        variant: Variant,
        slot: SlotName,
    },

    /// Insertion index past the end of the slot
    #[error("index {index} out of bounds for {slot} (len {len})")]
    InvalidIndex {
        slot: SlotRef,
        index: usize,
        len: usize,
    },

    /// Inserting a node into its own subtree
    #[error("cannot insert {node} into {slot}: target is inside the node's own subtree")]
    CyclicInsert { node: NodeId, slot: SlotRef },

    /// Locked nodes cannot be removed or moved
    #[error("node {0} is locked")]
    LockedNode(NodeId),

    /// Structural invariant violated
    #[error("tree integrity violated: {0}")]
    Integrity(String),

    /// Rejected property edit
    #[error("attribute error: {0}")]
    Attribute(#[from] AttrError),
}

impl EditorError {
    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity(reason.into())
    }
}

/// Errors raised at the property-edit boundary
#[derive(Debug, Error)]
pub enum AttrError {
    #[error("{variant} has no attribute '{key}'")]
    UnknownKey { variant: Variant, key: String },

    #[error("attribute '{key}' expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("attribute '{key}' must be within {min}..={max}, got {value}")]
    OutOfRange {
        key: String,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid value '{value}' for attribute '{key}'")]
    InvalidValue { key: String, value: String },
}

impl AttrError {
    pub fn out_of_range(key: impl Into<String>, value: u32, min: u32, max: u32) -> Self {
        Self::OutOfRange {
            key: key.into(),
            value,
            min,
            max,
        }
    }

    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_insert_display() {
        let node = NodeId::next();
        let err = EditorError::CyclicInsert {
            node,
            slot: SlotRef::child(node, SlotName::Children),
        };
        assert!(err.to_string().contains("own subtree"));
    }

    #[test]
    fn test_attr_error_converts() {
        let err: EditorError = AttrError::out_of_range("cols", 7, 1, 4).into();
        assert!(matches!(err, EditorError::Attribute(_)));
        assert!(err.to_string().contains("1..=4"));
    }
}
