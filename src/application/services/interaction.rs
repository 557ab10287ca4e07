//! Drag-and-drop controller.
//!
//! A gesture is `begin`, any number of `pointer_moved`, then `end` or
//! `cancel`. Only `end` touches the session, and only through a mutation,
//! so a rejected or cancelled gesture leaves every committed position as it was.

use tracing::{debug, info, instrument};

use crate::application::services::Session;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Mutation, NodeId, Placement, Point, PositionResolver, Slot};

/// Transient state of one drag.
#[derive(Debug, Clone)]
pub struct DragGesture {
    pub node: NodeId,
    /// New parent when the drop re-parents the node
    pub target_parent: Option<NodeId>,
    /// Committed position when the gesture started
    pub origin: Option<Point>,
    pub candidates: Vec<Slot>,
    pub pointer: Point,
    /// Free slot nearest to the pointer, if any
    pub highlighted: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The node now sits on `slot`
    Committed { node: NodeId, slot: Slot },
    /// The nearest slot belongs to another node; nothing moved
    Rejected { node: NodeId, occupant: NodeId },
    /// No drop happened; nothing moved
    Cancelled { node: NodeId },
}

#[derive(Debug, Default)]
pub struct DragController {
    gesture: Option<DragGesture>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    /// Start dragging `id`, optionally towards a new parent.
    ///
    /// A re-parenting drag is checked against the hierarchy rules up front so
    /// the user never sees targets that cannot be committed.
    #[instrument(level = "debug", skip(self, session))]
    pub fn begin(
        &mut self,
        session: &Session,
        id: &NodeId,
        target_parent: Option<&NodeId>,
    ) -> ApplicationResult<&DragGesture> {
        if let Some(active) = &self.gesture {
            return Err(ApplicationError::DragInProgress(active.node.clone()));
        }
        let node = session.node(id)?;
        let target_parent = target_parent.filter(|p| node.parent_id.as_ref() != Some(*p));
        if let Some(parent) = target_parent {
            session
                .engine()
                .rules()
                .check_attach(session.nodes(), parent, node.node_type, Some(id))?;
        }

        let candidates = session
            .resolver()
            .drag_candidates(session.nodes(), id, target_parent)?;
        let origin = node.position;
        debug!(candidates = candidates.len(), "drag started");

        Ok(&*self.gesture.insert(DragGesture {
            node: id.clone(),
            target_parent: target_parent.cloned(),
            origin,
            candidates,
            pointer: origin.unwrap_or_else(|| session.resolver().center()),
            highlighted: None,
        }))
    }

    /// Track the pointer; returns the slot a drop would commit to.
    pub fn pointer_moved(&mut self, session: &Session, pointer: Point) -> ApplicationResult<Option<Slot>> {
        let gesture = self.gesture.as_mut().ok_or(ApplicationError::NoActiveDrag)?;
        gesture.pointer = pointer;
        gesture.highlighted = PositionResolver::resolve_drop(
            &pointer,
            &gesture.candidates,
            &gesture.node,
            &session.occupancy(),
        );
        Ok(gesture.highlighted)
    }

    /// Drop at the last pointer position.
    ///
    /// Commits only when the nearest slot is free. Hierarchy violations from a
    /// re-parenting drop surface as errors with the session unchanged.
    #[instrument(level = "debug", skip_all)]
    pub fn end(&mut self, session: &mut Session) -> ApplicationResult<DragOutcome> {
        let gesture = self.gesture.take().ok_or(ApplicationError::NoActiveDrag)?;
        let node = gesture.node.clone();

        let Some(slot) = PositionResolver::nearest_slot(&gesture.pointer, &gesture.candidates).copied()
        else {
            debug!(%node, "no drop target");
            return Ok(DragOutcome::Cancelled { node });
        };

        if let Some(occupant) = session.occupancy().occupant_at(&slot.position) {
            if *occupant != node {
                info!(%node, %occupant, "Drop rejected: slot occupied");
                return Ok(DragOutcome::Rejected {
                    node,
                    occupant: occupant.clone(),
                });
            }
        }

        let place = Mutation::Place {
            id: node.clone(),
            placement: Placement::from_slot(&slot),
        };
        match gesture.target_parent {
            Some(parent) => {
                session.apply_all(vec![
                    Mutation::Reparent {
                        id: node.clone(),
                        parent,
                        keep_position: false,
                    },
                    place,
                ])?;
            }
            None => {
                session.apply(place)?;
            }
        }
        info!(%node, x = slot.position.x, y = slot.position.y, "Drop committed");
        Ok(DragOutcome::Committed { node, slot })
    }

    /// Abort the gesture.
    pub fn cancel(&mut self) -> ApplicationResult<DragOutcome> {
        let gesture = self.gesture.take().ok_or(ApplicationError::NoActiveDrag)?;
        debug!(node = %gesture.node, "drag cancelled");
        Ok(DragOutcome::Cancelled { node: gesture.node })
    }
}
