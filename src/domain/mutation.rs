//! Structural and attribute edits on a node collection.
//!
//! Every operation works on a copy: on error the caller's collection is
//! untouched, on success the new collection is returned whole.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::domain::arena::HierarchyTree;
use crate::domain::entities::{
    default_category, NewNode, Node, NodeCollection, NodeDetails, NodeId, NodePatch, NodeType,
};
use crate::domain::error::{DomainError, DomainResult, Violation};
use crate::domain::geometry::Point;
use crate::domain::hierarchy::{validate_forest, HierarchyRules};
use crate::domain::occupancy::Occupancy;
use crate::domain::resolver::Placement;
use crate::domain::validation::validate_node;

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a child of `parent`
    Add { parent: NodeId, attrs: NewNode },
    /// Edit attributes; structure and placement are not touched
    Update { id: NodeId, patch: NodePatch },
    /// Delete the node and its whole subtree
    Remove { id: NodeId },
    /// Move under another parent
    Reparent {
        id: NodeId,
        parent: NodeId,
        keep_position: bool,
    },
    /// Secondary becomes a primary child of the root
    Promote { id: NodeId },
    /// Childless primary becomes a secondary under `parent`
    Demote { id: NodeId, parent: NodeId },
    /// Detach: the node becomes a primary child of the root
    Unlink { id: NodeId },
    /// Clear position and hints so layout re-resolves the node
    ResetPosition { id: NodeId },
    /// Commit a drop at `placement`
    Place { id: NodeId, placement: Placement },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Add { .. } => "add",
            Mutation::Update { .. } => "update",
            Mutation::Remove { .. } => "remove",
            Mutation::Reparent { .. } => "reparent",
            Mutation::Promote { .. } => "promote",
            Mutation::Demote { .. } => "demote",
            Mutation::Unlink { .. } => "unlink",
            Mutation::ResetPosition { .. } => "reset",
            Mutation::Place { .. } => "place",
        }
    }
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone)]
pub struct Applied {
    pub nodes: NodeCollection,
    /// Node the mutation targeted; the fresh id for `Add`
    pub node: NodeId,
}

#[derive(Debug, Clone)]
pub struct MutationEngine {
    rules: HierarchyRules,
    tolerance: f64,
    /// Layout center, held by the root whether or not it is positioned
    center: Point,
}

impl Default for MutationEngine {
    fn default() -> Self {
        Self::new(HierarchyRules::default(), 0.5)
    }
}

impl MutationEngine {
    pub fn new(rules: HierarchyRules, tolerance: f64) -> Self {
        Self {
            rules,
            tolerance,
            center: Point::new(600.0, 400.0),
        }
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn rules(&self) -> &HierarchyRules {
        &self.rules
    }

    /// Apply `mutation` to a copy of `nodes`.
    #[instrument(level = "debug", skip(self, nodes), fields(op = mutation.name()))]
    pub fn apply(&self, nodes: &NodeCollection, mutation: Mutation) -> DomainResult<Applied> {
        let applied = match mutation {
            Mutation::Add { parent, attrs } => self.add(nodes, &parent, attrs),
            Mutation::Update { id, patch } => self.update(nodes, &id, &patch),
            Mutation::Remove { id } => self.remove(nodes, &id),
            Mutation::Reparent {
                id,
                parent,
                keep_position,
            } => self.reparent(nodes, &id, &parent, keep_position),
            Mutation::Promote { id } => self.promote(nodes, &id),
            Mutation::Demote { id, parent } => self.demote(nodes, &id, &parent),
            Mutation::Unlink { id } => self.unlink(nodes, &id),
            Mutation::ResetPosition { id } => self.reset_position(nodes, &id),
            Mutation::Place { id, placement } => self.place(nodes, &id, placement),
        }?;

        validate_forest(&applied.nodes, &self.rules)?;
        Ok(applied)
    }

    pub fn add(&self, nodes: &NodeCollection, parent: &NodeId, attrs: NewNode) -> DomainResult<Applied> {
        let parent_node = nodes.require(parent)?;
        // A leaf parent has no default child; Secondary then fails the type check
        let node_type = attrs
            .node_type
            .or_else(|| parent_node.node_type.default_child())
            .unwrap_or(NodeType::Secondary);
        self.rules.check_attach(nodes, parent, node_type, None)?;

        let now = Utc::now();
        let mut node = Node::new(NodeId::generate(), attrs.name, node_type).with_parent(parent.clone());
        node.category = attrs.category.unwrap_or_else(|| default_category(node_type));
        node.description = attrs.description;
        node.details = NodeDetails {
            created_at: Some(now),
            ..NodeDetails::template(node_type, now.date_naive())
        };
        if let Some(budget) = attrs.budget {
            node.details.budget = budget;
        }
        validate_node(&node)?;

        let id = node.id.clone();
        let mut out = nodes.clone();
        out.push(node);
        info!(node = %id, %parent, %node_type, "Added node");
        Ok(Applied { nodes: out, node: id })
    }

    pub fn update(&self, nodes: &NodeCollection, id: &NodeId, patch: &NodePatch) -> DomainResult<Applied> {
        let mut out = nodes.clone();
        let node = out.require_mut(id)?;
        if patch.is_empty() {
            debug!(node = %id, "empty patch");
        } else {
            patch.apply_to(node);
            validate_node(node)?;
            info!(node = %id, "Updated node");
        }
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    pub fn remove(&self, nodes: &NodeCollection, id: &NodeId) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        if node.is_root() {
            return Err(Violation::RootLocked(id.clone()).into());
        }
        let tree = HierarchyTree::build(nodes)?;
        let doomed: HashSet<NodeId> = tree.subtree(id).into_iter().collect();

        let mut out = nodes.clone();
        out.retain(|n| !doomed.contains(&n.id));
        info!(node = %id, removed = doomed.len(), "Removed subtree");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    pub fn reparent(
        &self,
        nodes: &NodeCollection,
        id: &NodeId,
        parent: &NodeId,
        keep_position: bool,
    ) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        if node.is_root() {
            return Err(Violation::RootLocked(id.clone()).into());
        }
        let parent_node = nodes.require(parent)?;
        if node.parent_id.as_ref() == Some(parent) {
            debug!(node = %id, %parent, "already attached");
            return Ok(Applied {
                nodes: nodes.clone(),
                node: id.clone(),
            });
        }
        self.rules.check_attach(nodes, parent, node.node_type, Some(id))?;
        let anchor = if parent_node.is_root() {
            Some(self.center)
        } else {
            parent_node.position
        };

        let mut out = nodes.clone();
        let node = out.require_mut(id)?;
        node.parent_id = Some(parent.clone());
        if keep_position {
            // Hints are relative to the new anchor
            match (node.position, anchor) {
                (Some(position), Some(anchor)) => {
                    node.orbit = Some(position.distance(&anchor));
                    node.angle = Some(position.bearing_from(&anchor));
                }
                _ => {
                    node.orbit = None;
                    node.angle = None;
                }
            }
        } else {
            node.clear_placement();
        }
        info!(node = %id, %parent, keep_position, "Reparented node");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    pub fn promote(&self, nodes: &NodeCollection, id: &NodeId) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        expect_type(node, NodeType::Secondary)?;
        self.retype_under_root(nodes, id)
    }

    pub fn demote(&self, nodes: &NodeCollection, id: &NodeId, parent: &NodeId) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        expect_type(node, NodeType::Primary)?;
        if nodes.child_count(id) > 0 {
            return Err(Violation::HasChildren(id.clone()).into());
        }
        self.rules.check_attach(nodes, parent, NodeType::Secondary, Some(id))?;

        let mut out = nodes.clone();
        let node = out.require_mut(id)?;
        node.node_type = NodeType::Secondary;
        node.parent_id = Some(parent.clone());
        node.clear_placement();
        info!(node = %id, %parent, "Demoted node");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    pub fn unlink(&self, nodes: &NodeCollection, id: &NodeId) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        if node.is_root() {
            return Err(Violation::RootLocked(id.clone()).into());
        }
        if node.node_type == NodeType::Primary {
            debug!(node = %id, "primary already orbits the root");
            return Ok(Applied {
                nodes: nodes.clone(),
                node: id.clone(),
            });
        }
        self.retype_under_root(nodes, id)
    }

    pub fn reset_position(&self, nodes: &NodeCollection, id: &NodeId) -> DomainResult<Applied> {
        let mut out = nodes.clone();
        out.require_mut(id)?.clear_placement();
        debug!(node = %id, "Cleared placement");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    pub fn place(&self, nodes: &NodeCollection, id: &NodeId, placement: Placement) -> DomainResult<Applied> {
        let node = nodes.require(id)?;
        if node.is_root() {
            return Err(Violation::RootLocked(id.clone()).into());
        }

        let mut others = Occupancy::new(self.tolerance);
        for other in nodes.iter().filter(|n| &n.id != id) {
            let point = if other.is_root() {
                Some(self.center)
            } else {
                other.position
            };
            if let Some(point) = point {
                // Duplicate claims among others do not matter here
                let _ = others.claim(&other.id, point);
            }
        }
        if let Some(occupant) = others.occupant_at(&placement.position) {
            return Err(Violation::SlotOccupied {
                occupant: occupant.clone(),
                x: placement.position.x,
                y: placement.position.y,
            }
            .into());
        }

        let mut out = nodes.clone();
        placement.apply_to(out.require_mut(id)?);
        info!(node = %id, x = placement.position.x, y = placement.position.y, "Placed node");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }

    /// Turn `id` into a primary child of the root.
    fn retype_under_root(&self, nodes: &NodeCollection, id: &NodeId) -> DomainResult<Applied> {
        let root = nodes
            .root()
            .ok_or_else(|| DomainError::MalformedHierarchy("no root node".to_string()))?
            .id
            .clone();
        self.rules.check_attach(nodes, &root, NodeType::Primary, Some(id))?;

        let mut out = nodes.clone();
        let node = out.require_mut(id)?;
        let from = node.node_type;
        node.node_type = NodeType::Primary;
        node.parent_id = Some(root);
        node.clear_placement();
        info!(node = %id, %from, "Moved node to the root orbit");
        Ok(Applied {
            nodes: out,
            node: id.clone(),
        })
    }
}

fn expect_type(node: &Node, expected: NodeType) -> DomainResult<()> {
    if node.node_type != expected {
        return Err(Violation::WrongType {
            node: node.id.clone(),
            expected,
            actual: node.node_type,
        }
        .into());
    }
    Ok(())
}
