//! Domain layer: entities, hierarchy rules and the layout engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod business;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod mutation;
pub mod occupancy;
pub mod resolver;
pub mod validation;

pub use arena::{HierarchyTree, NodeData, TreeNode};
pub use business::{NodeSummary, PortfolioSummary};
pub use entities::*;
pub use error::{DomainError, DomainResult, Violation};
pub use geometry::{candidate_slots, OrbitConfig, Point, RingTier, Slot};
pub use hierarchy::{is_ancestor_of, validate_forest, HierarchyRules};
pub use mutation::{Applied, Mutation, MutationEngine};
pub use occupancy::Occupancy;
pub use resolver::{LayoutConfig, Placement, PositionResolver};
