//! Tests for the drag-and-drop controller

use rstest::{fixture, rstest};

use orbitmap::application::services::{DragController, DragOutcome, Session};
use orbitmap::application::ApplicationError;
use orbitmap::domain::{
    DomainError, MutationEngine, Node, NodeCollection, NodeId, NodeType, Point, PositionResolver,
    Violation,
};
use orbitmap::util::testing;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn position(session: &Session, node: &str) -> Point {
    session
        .node(&id(node))
        .ok()
        .and_then(|n| n.position)
        .unwrap_or_else(|| panic!("{node} should be placed"))
}

/// p1 on slot 0 (780, 400), p2 on slot 1, s1 orbiting p1
#[fixture]
fn session() -> Session {
    testing::init_test_setup();
    let nodes = NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("p1", "Alpha", NodeType::Primary).with_parent("center"),
        Node::new("p2", "Beta", NodeType::Primary).with_parent("center"),
        Node::new("s1", "Alpha One", NodeType::Secondary).with_parent("p1"),
    ]);
    Session::new(nodes, MutationEngine::default(), PositionResolver::default()).expect("session")
}

// ============================================================
// Rejection and cancellation
// ============================================================

#[rstest]
fn given_pointer_over_occupied_slot_when_drop_then_rejected_and_nothing_moves(
    mut session: Session,
) {
    // Arrange
    let before = session.nodes().clone();
    let mut drag = DragController::new();
    drag.begin(&session, &id("p2"), None).expect("begin");

    // Act
    let highlighted = drag
        .pointer_moved(&session, Point::new(778.0, 402.0))
        .expect("move");
    let outcome = drag.end(&mut session).expect("end");

    // Assert
    assert!(highlighted.is_none());
    assert_eq!(
        outcome,
        DragOutcome::Rejected {
            node: id("p2"),
            occupant: id("p1")
        }
    );
    assert_eq!(session.nodes(), &before);
    assert!(drag.active().is_none());
}

#[rstest]
fn given_active_drag_when_cancel_then_positions_unchanged(session: Session) {
    // Arrange
    let before = session.nodes().clone();
    let mut drag = DragController::new();
    drag.begin(&session, &id("p2"), None).expect("begin");
    drag.pointer_moved(&session, Point::new(420.0, 400.0))
        .expect("move");

    // Act
    let outcome = drag.cancel().expect("cancel");

    // Assert
    assert_eq!(outcome, DragOutcome::Cancelled { node: id("p2") });
    assert_eq!(session.nodes(), &before);
}

#[rstest]
fn given_no_drag_when_end_then_no_active_drag(mut session: Session) {
    let mut drag = DragController::new();

    let result = drag.end(&mut session);

    assert!(matches!(result, Err(ApplicationError::NoActiveDrag)));
}

#[rstest]
fn given_active_drag_when_begin_again_then_drag_in_progress(session: Session) {
    let mut drag = DragController::new();
    drag.begin(&session, &id("p2"), None).expect("begin");

    let result = drag.begin(&session, &id("p1"), None);

    assert!(matches!(result, Err(ApplicationError::DragInProgress(node)) if node == id("p2")));
}

// ============================================================
// Commit
// ============================================================

#[rstest]
fn given_pointer_near_free_slot_when_drop_then_snaps_to_slot(mut session: Session) {
    // Arrange
    let p1_before = position(&session, "p1");
    let mut drag = DragController::new();
    let gesture = drag.begin(&session, &id("p2"), None).expect("begin");
    assert_eq!(gesture.candidates.len(), 6 + 8 + 12 + 12);

    // Act
    let highlighted = drag
        .pointer_moved(&session, Point::new(425.0, 390.0))
        .expect("move");
    let outcome = drag.end(&mut session).expect("end");

    // Assert
    let slot = highlighted.expect("free slot highlighted");
    assert_eq!((slot.ring, slot.index), (0, 3));
    assert_eq!(
        outcome,
        DragOutcome::Committed {
            node: id("p2"),
            slot
        }
    );
    let p2 = session.node(&id("p2")).expect("p2");
    assert_eq!(p2.position, Some(slot.position));
    assert_eq!(p2.orbit, Some(180.0));
    assert_eq!(position(&session, "p1"), p1_before);
}

#[rstest]
fn given_pointer_on_own_slot_when_drop_then_committed_in_place(mut session: Session) {
    let p2_before = position(&session, "p2");
    let mut drag = DragController::new();
    drag.begin(&session, &id("p2"), None).expect("begin");

    drag.pointer_moved(&session, p2_before).expect("move");
    let outcome = drag.end(&mut session).expect("end");

    assert!(matches!(outcome, DragOutcome::Committed { .. }));
    assert_eq!(position(&session, "p2"), p2_before);
}

#[rstest]
fn given_committed_drop_when_relayout_then_position_is_stable(mut session: Session) {
    let mut drag = DragController::new();
    drag.begin(&session, &id("p2"), None).expect("begin");
    drag.pointer_moved(&session, Point::new(320.0, 400.0))
        .expect("move");
    drag.end(&mut session).expect("end");
    let dropped = position(&session, "p2");

    session.relayout().expect("relayout");

    assert_eq!(position(&session, "p2"), dropped);
}

// ============================================================
// Re-parenting drags
// ============================================================

#[rstest]
fn given_secondary_dragged_to_other_primary_when_drop_then_reparented(mut session: Session) {
    // Arrange
    let p2 = position(&session, "p2");
    let mut drag = DragController::new();
    drag.begin(&session, &id("s1"), Some(&id("p2")))
        .expect("begin");

    // Act
    drag.pointer_moved(&session, Point::new(p2.x + 58.0, p2.y))
        .expect("move");
    let outcome = drag.end(&mut session).expect("end");

    // Assert
    assert!(matches!(outcome, DragOutcome::Committed { .. }));
    let s1 = session.node(&id("s1")).expect("s1");
    assert_eq!(s1.parent_id, Some(id("p2")));
    let pos = s1.position.expect("s1 placed");
    assert!(pos.distance(&Point::new(p2.x + 60.0, p2.y)) < 1e-6);
}

#[rstest]
fn given_secondary_dragged_onto_root_when_begin_then_disallowed(session: Session) {
    let mut drag = DragController::new();

    let result = drag.begin(&session, &id("s1"), Some(&id("center")));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ConstraintViolation(
            Violation::DisallowedChild { .. }
        )))
    ));
    assert!(drag.active().is_none());
}

#[rstest]
fn given_primary_dragged_under_own_child_when_begin_then_cycle(session: Session) {
    let mut drag = DragController::new();

    let result = drag.begin(&session, &id("p1"), Some(&id("s1")));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ConstraintViolation(
            Violation::Cycle { .. }
        )))
    ));
}

#[rstest]
fn given_root_when_begin_drag_then_root_locked(session: Session) {
    let mut drag = DragController::new();

    let result = drag.begin(&session, &id("center"), None);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ConstraintViolation(
            Violation::RootLocked(_)
        )))
    ));
}

#[rstest]
fn given_current_parent_as_target_when_begin_then_plain_move(session: Session) {
    let mut drag = DragController::new();

    let gesture = drag
        .begin(&session, &id("s1"), Some(&id("p1")))
        .expect("begin");

    assert!(gesture.target_parent.is_none());
    assert_eq!(gesture.candidates.len(), 5 + 5);
}
