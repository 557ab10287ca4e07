//! Hierarchy rules: allowed child types, capacities, and cycle checks.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::{NodeCollection, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult, Violation};

/// Maximum child count per parent type.
///
/// Allowed child types are fixed by [`NodeType::allowed_children`]; only the
/// counts are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyRules {
    pub root: usize,
    pub primary: usize,
    pub secondary: usize,
    pub tertiary: usize,
}

impl Default for HierarchyRules {
    fn default() -> Self {
        Self {
            root: 8,
            primary: 5,
            secondary: 0,
            tertiary: 0,
        }
    }
}

impl HierarchyRules {
    pub fn max_children(&self, node_type: NodeType) -> usize {
        match node_type {
            NodeType::Root => self.root,
            NodeType::Primary => self.primary,
            NodeType::Secondary => self.secondary,
            NodeType::Tertiary => self.tertiary,
        }
    }

    /// Check that a `child_type` node may hang under `parent_id`.
    ///
    /// `moving` names an existing node being re-attached: it is excluded from
    /// the capacity count and checked for cycles. Pass None for new nodes.
    #[instrument(level = "trace", skip(self, nodes))]
    pub fn check_attach(
        &self,
        nodes: &NodeCollection,
        parent_id: &NodeId,
        child_type: NodeType,
        moving: Option<&NodeId>,
    ) -> DomainResult<()> {
        let parent = nodes.require(parent_id)?;

        if let Some(node) = moving {
            if node == parent_id || is_ancestor_of(nodes, node, parent_id)? {
                return Err(Violation::Cycle {
                    node: node.clone(),
                    parent: parent_id.clone(),
                }
                .into());
            }
        }

        if !parent.node_type.allows_child(child_type) {
            return Err(Violation::DisallowedChild {
                parent_type: parent.node_type,
                child_type,
            }
            .into());
        }

        let max = self.max_children(parent.node_type);
        let current = nodes
            .children_of(parent_id)
            .filter(|c| Some(&c.id) != moving)
            .count();
        if current >= max {
            return Err(Violation::CapacityExceeded {
                parent: parent_id.clone(),
                max,
            }
            .into());
        }
        Ok(())
    }

    pub fn can_attach(
        &self,
        nodes: &NodeCollection,
        parent_id: &NodeId,
        child_type: NodeType,
        moving: Option<&NodeId>,
    ) -> bool {
        self.check_attach(nodes, parent_id, child_type, moving).is_ok()
    }
}

/// True if `candidate` is a strict ancestor of `node_id`.
///
/// The walk is bounded by the collection size; a longer chain can only be a
/// cycle and is reported as `CycleDetected` instead of looping.
pub fn is_ancestor_of(
    nodes: &NodeCollection,
    candidate: &NodeId,
    node_id: &NodeId,
) -> DomainResult<bool> {
    let mut current = nodes.require(node_id)?;
    let mut steps = 0;

    while let Some(parent_id) = &current.parent_id {
        if parent_id == candidate {
            return Ok(true);
        }
        steps += 1;
        if steps > nodes.len() {
            return Err(Violation::CycleDetected(node_id.clone()).into());
        }
        current = nodes.require(parent_id)?;
    }
    Ok(false)
}

/// Check every structural invariant of a collection.
///
/// Runs on load and after each mutation.
#[instrument(level = "debug", skip_all, fields(nodes = nodes.len()))]
pub fn validate_forest(nodes: &NodeCollection, rules: &HierarchyRules) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(&node.id) {
            return Err(DomainError::MalformedHierarchy(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
    }

    let roots: Vec<_> = nodes.iter().filter(|n| n.is_root()).collect();
    match roots.as_slice() {
        [] => {
            return Err(DomainError::MalformedHierarchy(
                "no root node".to_string(),
            ))
        }
        [root] => {
            if root.parent_id.is_some() {
                return Err(DomainError::MalformedHierarchy(format!(
                    "root {} must not have a parent",
                    root.id
                )));
            }
        }
        _ => {
            return Err(DomainError::MalformedHierarchy(format!(
                "expected exactly one root, found {}",
                roots.len()
            )))
        }
    }

    for node in nodes.iter().filter(|n| !n.is_root()) {
        let parent_id = node.parent_id.as_ref().ok_or_else(|| {
            DomainError::MalformedHierarchy(format!("{} has no parent", node.id))
        })?;
        let parent = nodes.require(parent_id)?;
        if !parent.node_type.allows_child(node.node_type) {
            return Err(Violation::DisallowedChild {
                parent_type: parent.node_type,
                child_type: node.node_type,
            }
            .into());
        }
        if is_ancestor_of(nodes, &node.id, &node.id)? {
            return Err(Violation::CycleDetected(node.id.clone()).into());
        }
    }

    for node in nodes {
        let max = rules.max_children(node.node_type);
        if nodes.child_count(&node.id) > max {
            return Err(Violation::CapacityExceeded {
                parent: node.id.clone(),
                max,
            }
            .into());
        }
    }
    Ok(())
}
