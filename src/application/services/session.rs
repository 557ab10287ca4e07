//! Editing session: the node collection plus selection and editing state.
//!
//! A session is the single owner of the collection for the lifetime of one
//! interaction context. Every change goes through `apply`, which runs the
//! mutation and a layout pass on a copy and swaps it in only on success.

use tracing::{debug, info, instrument};

use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{
    validate_forest, Mutation, MutationEngine, Node, NodeCollection, NodeId, Occupancy, Point,
    PositionResolver,
};

#[derive(Debug, Clone)]
pub struct Session {
    nodes: NodeCollection,
    engine: MutationEngine,
    resolver: PositionResolver,
    selected: Option<NodeId>,
    editing: Option<NodeId>,
}

impl Session {
    /// Start a session over `nodes`; the collection is validated and laid out.
    pub fn new(
        nodes: NodeCollection,
        engine: MutationEngine,
        resolver: PositionResolver,
    ) -> ApplicationResult<Self> {
        validate_forest(&nodes, engine.rules())?;
        let engine = engine.with_center(resolver.center());
        let nodes = resolver.layout(&nodes)?;
        Ok(Self {
            nodes,
            engine,
            resolver,
            selected: None,
            editing: None,
        })
    }

    pub fn from_settings(settings: &Settings, nodes: NodeCollection) -> ApplicationResult<Self> {
        let layout = settings.layout_config();
        let engine = MutationEngine::new(settings.limits, layout.tolerance);
        Self::new(nodes, engine, PositionResolver::new(layout))
    }

    pub fn nodes(&self) -> &NodeCollection {
        &self.nodes
    }

    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &PositionResolver {
        &self.resolver
    }

    pub fn node(&self, id: &NodeId) -> ApplicationResult<&Node> {
        Ok(self.nodes.require(id)?)
    }

    /// Claimed positions of the current collection.
    pub fn occupancy(&self) -> Occupancy {
        self.resolver.occupancy(&self.nodes)
    }

    /// Apply one mutation and re-run layout. Returns the affected node id.
    pub fn apply(&mut self, mutation: Mutation) -> ApplicationResult<NodeId> {
        let mut affected = self.apply_all(vec![mutation])?;
        Ok(affected.remove(0))
    }

    /// Apply mutations in order as one unit: either all land or none do.
    /// Returns the affected node of each mutation.
    #[instrument(level = "debug", skip_all, fields(count = mutations.len()))]
    pub fn apply_all(&mut self, mutations: Vec<Mutation>) -> ApplicationResult<Vec<NodeId>> {
        let mut nodes = self.nodes.clone();
        let mut affected = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let applied = self.engine.apply(&nodes, mutation)?;
            nodes = applied.nodes;
            affected.push(applied.node);
        }
        self.nodes = self.resolver.layout(&nodes)?;
        self.prune_selection();
        Ok(affected)
    }

    /// Re-run layout over the current collection.
    pub fn relayout(&mut self) -> ApplicationResult<()> {
        self.nodes = self.resolver.layout(&self.nodes)?;
        Ok(())
    }

    /// Drop every placement and lay the collection out from scratch.
    pub fn reset_layout(&mut self) -> ApplicationResult<()> {
        let mut nodes = self.nodes.clone();
        nodes.iter_mut().for_each(Node::clear_placement);
        self.nodes = self.resolver.layout(&nodes)?;
        info!(nodes = self.nodes.len(), "Reset layout");
        Ok(())
    }

    /// Move the viewport center. The root follows; other positioned nodes
    /// keep their coordinates.
    pub fn recenter(&mut self, center: Point) -> ApplicationResult<()> {
        let mut resolver = self.resolver.clone();
        resolver.set_center(center);
        let nodes = resolver.layout(&self.nodes)?;
        self.resolver = resolver;
        self.engine = self.engine.clone().with_center(center);
        self.nodes = nodes;
        debug!(x = center.x, y = center.y, "Recentered");
        Ok(())
    }

    pub fn select(&mut self, id: &NodeId) -> ApplicationResult<()> {
        self.nodes.require(id)?;
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected.as_ref().and_then(|id| self.nodes.get(id))
    }

    pub fn begin_edit(&mut self, id: &NodeId) -> ApplicationResult<()> {
        self.nodes.require(id)?;
        self.editing = Some(id.clone());
        Ok(())
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&Node> {
        self.editing.as_ref().and_then(|id| self.nodes.get(id))
    }

    fn prune_selection(&mut self) {
        if matches!(&self.selected, Some(id) if !self.nodes.contains(id)) {
            self.selected = None;
        }
        if matches!(&self.editing, Some(id) if !self.nodes.contains(id)) {
            self.editing = None;
        }
    }
}
