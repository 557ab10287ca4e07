//! Position resolver: stable slot assignment and drag snapping.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::arena::HierarchyTree;
use crate::domain::entities::{Node, NodeCollection, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult, Violation};
use crate::domain::geometry::{self, OrbitConfig, Point, Slot};
use crate::domain::occupancy::Occupancy;

/// Layout parameters: ring tiers per node type plus placement policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Viewport center; derived from the viewport, never stored
    #[serde(skip)]
    pub center: Point,
    pub primary: OrbitConfig,
    pub secondary: OrbitConfig,
    pub tertiary: OrbitConfig,
    /// Cap on the rings scanned per node; None grows rings without bound
    pub max_rings: Option<usize>,
    /// Points closer than this are the same position
    pub tolerance: f64,
    /// Extra grown rings offered as drag targets
    pub drag_growth_rings: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center: Point::new(600.0, 400.0),
            primary: OrbitConfig::primary(),
            secondary: OrbitConfig::secondary(),
            tertiary: OrbitConfig::tertiary(),
            max_rings: None,
            tolerance: 0.5,
            drag_growth_rings: 1,
        }
    }
}

impl LayoutConfig {
    pub fn with_center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    /// Rings for `node_type`. The root has none.
    pub fn orbit_for(&self, node_type: NodeType) -> Option<&OrbitConfig> {
        match node_type {
            NodeType::Root => None,
            NodeType::Primary => Some(&self.primary),
            NodeType::Secondary => Some(&self.secondary),
            NodeType::Tertiary => Some(&self.tertiary),
        }
    }
}

/// Result of resolving one node: where it goes and the restart hints to store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub orbit: Option<f64>,
    pub angle: Option<f64>,
}

impl Placement {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            orbit: None,
            angle: None,
        }
    }

    pub fn from_slot(slot: &Slot) -> Self {
        Self {
            position: slot.position,
            orbit: Some(slot.radius),
            angle: Some(slot.angle),
        }
    }

    /// Record this placement on `node`.
    pub fn apply_to(&self, node: &mut Node) {
        node.position = Some(self.position);
        node.orbit = self.orbit;
        node.angle = self.angle;
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionResolver {
    config: LayoutConfig,
}

impl PositionResolver {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn center(&self) -> Point {
        self.config.center
    }

    pub fn set_center(&mut self, center: Point) {
        self.config.center = center;
    }

    /// Candidate slots of the first `rings` tiers for `node_type` around `anchor`.
    pub fn candidate_slots(&self, node_type: NodeType, anchor: Point, rings: usize) -> Vec<Slot> {
        match self.config.orbit_for(node_type) {
            Some(orbit) => geometry::candidate_slots(anchor, &orbit.tiers(rings)),
            None => Vec::new(),
        }
    }

    /// Occupancy built from every positioned node, in collection order.
    /// The root always holds the center.
    pub fn occupancy(&self, nodes: &NodeCollection) -> Occupancy {
        let mut occupied = Occupancy::new(self.config.tolerance);
        for node in nodes {
            let point = if node.is_root() {
                Some(self.config.center)
            } else {
                node.position
            };
            if let Some(point) = point {
                if let Err(holder) = occupied.claim(&node.id, point) {
                    trace!(node = %node.id, %holder, "position already claimed");
                }
            }
        }
        occupied
    }

    /// Point a node orbits: the center for children of the root, else the
    /// parent's position.
    pub fn anchor_for(&self, nodes: &NodeCollection, node: &Node) -> DomainResult<Point> {
        let Some(parent_id) = &node.parent_id else {
            return Ok(self.config.center);
        };
        let parent = nodes.require(parent_id)?;
        if parent.is_root() {
            return Ok(self.config.center);
        }
        parent
            .position
            .ok_or_else(|| DomainError::Unplaced(parent.id.clone()))
    }

    /// Position for `node` given its `anchor` and the claimed positions.
    ///
    /// Order of preference: center for the root, the node's own position,
    /// the stored orbit/angle hints, then the first free ring slot. Pure:
    /// the caller records the returned placement.
    #[instrument(level = "trace", skip(self, node, occupied), fields(node = %node.id))]
    pub fn resolve_position(
        &self,
        node: &Node,
        anchor: Point,
        occupied: &Occupancy,
    ) -> DomainResult<Placement> {
        if node.is_root() {
            return Ok(Placement::at(self.config.center));
        }

        if let Some(position) = node.position {
            if occupied.is_free_for(&position, &node.id) {
                return Ok(Placement {
                    position,
                    orbit: node.orbit,
                    angle: node.angle,
                });
            }
        }

        if let (Some(orbit), Some(angle)) = (node.orbit, node.angle) {
            let hinted = Point::polar(anchor, orbit, angle);
            if occupied.is_free_for(&hinted, &node.id) {
                return Ok(Placement {
                    position: hinted,
                    orbit: Some(orbit),
                    angle: Some(angle),
                });
            }
        }

        let orbit = self
            .config
            .orbit_for(node.node_type)
            .ok_or(DomainError::SlotExhausted {
                node_type: node.node_type,
                rings: 0,
            })?;
        // Each occupied point can block at most one grown ring, so one more
        // grown ring than there are claims always contains a free slot.
        let limit = self
            .config
            .max_rings
            .unwrap_or(orbit.rings.len() + occupied.len() + 1);

        for ring in 0..limit {
            let tier = orbit.tier(ring);
            if let Some(slot) = geometry::ring_slots(anchor, ring, tier)
                .find(|slot| occupied.is_free_for(&slot.position, &node.id))
            {
                return Ok(Placement::from_slot(&slot));
            }
        }
        Err(DomainError::SlotExhausted {
            node_type: node.node_type,
            rings: limit,
        })
    }

    /// Candidate nearest to `pointer`; ties go to the earliest candidate.
    /// A pointer with a NaN or infinite coordinate has no nearest slot.
    pub fn nearest_slot<'a>(pointer: &Point, candidates: &'a [Slot]) -> Option<&'a Slot> {
        if !pointer.is_finite() {
            return None;
        }
        let mut best: Option<(&Slot, f64)> = None;
        for slot in candidates {
            let d = slot.position.distance(pointer);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((slot, d)),
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Nearest slot for a drop, or None when a node other than `exclude` holds it.
    pub fn resolve_drop(
        pointer: &Point,
        candidates: &[Slot],
        exclude: &NodeId,
        occupied: &Occupancy,
    ) -> Option<Slot> {
        let slot = Self::nearest_slot(pointer, candidates)?;
        if occupied.is_free_for(&slot.position, exclude) {
            Some(*slot)
        } else {
            None
        }
    }

    /// Drop targets for moving `id` under `parent` (its current parent when None).
    pub fn drag_candidates(
        &self,
        nodes: &NodeCollection,
        id: &NodeId,
        parent: Option<&NodeId>,
    ) -> DomainResult<Vec<Slot>> {
        let node = nodes.require(id)?;
        if node.is_root() {
            return Err(Violation::RootLocked(id.clone()).into());
        }
        let mut probe = node.clone();
        if let Some(parent) = parent {
            probe.parent_id = Some(parent.clone());
        }
        let anchor = self.anchor_for(nodes, &probe)?;
        let rings = self
            .config
            .orbit_for(node.node_type)
            .map(|o| o.rings.len() + self.config.drag_growth_rings)
            .unwrap_or(0);
        Ok(self.candidate_slots(node.node_type, anchor, rings))
    }

    /// Place every node, keeping existing positions.
    ///
    /// Nodes are visited parents first, siblings in collection order. Positioned
    /// nodes claim their spots before anything is resolved; when two claim the
    /// same spot the earlier one keeps it and the later one is re-resolved.
    #[instrument(level = "debug", skip_all, fields(nodes = nodes.len()))]
    pub fn layout(&self, nodes: &NodeCollection) -> DomainResult<NodeCollection> {
        let tree = HierarchyTree::build(nodes)?;
        let order: Vec<NodeId> = tree.iter().map(|(_, n)| n.data.id.clone()).collect();

        let mut out = nodes.clone();
        let mut occupied = Occupancy::new(self.config.tolerance);

        for id in &order {
            let node = out.require(id)?;
            let point = if node.is_root() {
                Some(self.config.center)
            } else {
                node.position
            };
            if let Some(point) = point {
                if let Err(holder) = occupied.claim(id, point) {
                    debug!(node = %id, %holder, "position taken, re-resolving");
                }
            }
        }

        let mut placed = 0usize;
        for id in &order {
            let node = out.require(id)?;
            let anchor = self.anchor_for(&out, node)?;
            let placement = self.resolve_position(node, anchor, &occupied)?;
            if node.position != Some(placement.position) {
                placed += 1;
            }

            occupied
                .claim(id, placement.position)
                .map_err(|occupant| Violation::SlotOccupied {
                    occupant,
                    x: placement.position.x,
                    y: placement.position.y,
                })?;
            placement.apply_to(out.require_mut(id)?);
        }

        debug!(placed, "layout complete");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize, x: f64, y: f64) -> Slot {
        Slot {
            ring: 0,
            index,
            radius: 1.0,
            angle: 0.0,
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_nearest_slot_prefers_first_on_tie() {
        let candidates = vec![slot(0, 10.0, 0.0), slot(1, -10.0, 0.0)];
        let nearest = PositionResolver::nearest_slot(&Point::new(0.0, 0.0), &candidates);
        assert_eq!(nearest.map(|s| s.index), Some(0));
    }

    #[test]
    fn test_nearest_slot_empty() {
        assert!(PositionResolver::nearest_slot(&Point::default(), &[]).is_none());
    }
}
