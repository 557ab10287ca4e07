use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{NodeCollection, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult};

/// Data payload for tree nodes: the structural part of a node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.node_type, self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes, in collection order
    pub children: Vec<Index>,
}

/// Arena-based view of a node collection's hierarchy.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Children keep collection order, which makes every traversal deterministic.
#[derive(Debug)]
pub struct HierarchyTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_id: HashMap<NodeId, Index>,
}

impl Default for HierarchyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
        }
    }

    /// Build the tree from the collection's root downward.
    ///
    /// Fails when there is no root or when some node is unreachable from it
    /// (dangling parent, cycle, second root).
    #[instrument(level = "debug", skip_all, fields(nodes = nodes.len()))]
    pub fn build(nodes: &NodeCollection) -> DomainResult<Self> {
        let root = nodes
            .root()
            .ok_or_else(|| DomainError::MalformedHierarchy("no root node".to_string()))?;

        let mut tree = Self::new();
        let mut stack = vec![(root.id.clone(), None)];

        while let Some((current, parent_idx)) = stack.pop() {
            if tree.by_id.contains_key(&current) {
                return Err(DomainError::MalformedHierarchy(format!(
                    "{} is reachable twice",
                    current
                )));
            }
            let node = nodes.require(&current)?;
            let idx = tree.insert_node(
                NodeData {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    node_type: node.node_type,
                },
                parent_idx,
            );

            // Reverse so that popping yields children in collection order
            let children: Vec<_> = nodes.children_of(&current).map(|c| c.id.clone()).collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        if tree.len() != nodes.len() {
            let orphan = nodes
                .iter()
                .find(|n| !tree.by_id.contains_key(&n.id))
                .map(|n| n.id.to_string())
                .unwrap_or_default();
            return Err(DomainError::MalformedHierarchy(format!(
                "{} is not reachable from the root",
                orphan
            )));
        }
        Ok(tree)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }
        self.by_id.insert(id, node_idx);

        node_idx
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn find(&self, id: &NodeId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Pre-order: parents before children.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Post-order: children before parents.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Ids of the node's subtree, the node itself first.
    pub fn subtree(&self, id: &NodeId) -> Vec<NodeId> {
        TreeIterator::new(self, self.find(id))
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }

    /// Ids strictly below the node.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        self.subtree(id).into_iter().skip(1).collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Nodes with no children, in pre-order.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }

    /// Render as a termtree for terminal display.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build(arena: &HierarchyTree, node_idx: Index) -> Tree<String> {
            match arena.get_node(node_idx) {
                Some(node) => {
                    let leaves: Vec<_> = node.children.iter().map(|&c| build(arena, c)).collect();
                    Tree::new(node.data.to_string()).with_leaves(leaves)
                }
                None => Tree::new(String::new()),
            }
        }

        match self.root {
            Some(root) => build(self, root),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

pub struct TreeIterator<'a> {
    arena: &'a HierarchyTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a HierarchyTree, start: Option<Index>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.arena.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a HierarchyTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a HierarchyTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
