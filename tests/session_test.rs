//! Tests for the editing session: atomic batches, layout passes and selection

use rstest::{fixture, rstest};

use orbitmap::application::services::Session;
use orbitmap::application::ApplicationError;
use orbitmap::config::Settings;
use orbitmap::domain::{
    DomainError, Mutation, MutationEngine, NewNode, Node, NodeCollection, NodeId, NodeType,
    Placement, Point, PositionResolver,
};
use orbitmap::util::testing;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn unplaced() -> NodeCollection {
    NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("p1", "Alpha", NodeType::Primary).with_parent("center"),
        Node::new("p2", "Beta", NodeType::Primary).with_parent("center"),
        Node::new("s1", "Alpha One", NodeType::Secondary).with_parent("p1"),
    ])
}

#[fixture]
fn session() -> Session {
    testing::init_test_setup();
    Session::new(unplaced(), MutationEngine::default(), PositionResolver::default())
        .expect("session")
}

#[rstest]
fn given_unplaced_nodes_when_session_starts_then_everything_is_positioned(session: Session) {
    assert!(session.nodes().iter().all(|n| n.position.is_some()));
    assert_eq!(session.occupancy().len(), 4);
}

#[test]
fn given_invalid_collection_when_session_starts_then_rejected() {
    let nodes = NodeCollection::new(vec![Node::new("p1", "Alpha", NodeType::Primary)]);

    let result = Session::new(nodes, MutationEngine::default(), PositionResolver::default());

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedHierarchy(_)))
    ));
}

#[rstest]
fn given_add_when_applied_then_new_node_is_laid_out(mut session: Session) {
    // Act
    let new_id = session
        .apply(Mutation::Add {
            parent: id("p2"),
            attrs: NewNode::named("Beta One"),
        })
        .expect("add");

    // Assert
    let added = session.node(&new_id).expect("added");
    let p2 = session
        .node(&id("p2"))
        .ok()
        .and_then(|n| n.position)
        .expect("p2 placed");
    let pos = added.position.expect("placed");
    assert_eq!(added.node_type, NodeType::Secondary);
    assert!((pos.distance(&p2) - 60.0).abs() < 1e-6);
}

#[rstest]
fn given_batch_with_failing_step_when_apply_all_then_nothing_changes(mut session: Session) {
    // Arrange
    let before = session.nodes().clone();
    let batch = vec![
        Mutation::Unlink { id: id("s1") },
        Mutation::Remove { id: id("ghost") },
    ];

    // Act
    let result = session.apply_all(batch);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidReference(_)))
    ));
    assert_eq!(session.nodes(), &before);
}

#[rstest]
fn given_batch_when_apply_all_then_returns_each_affected_node(mut session: Session) {
    let affected = session
        .apply_all(vec![
            Mutation::ResetPosition { id: id("p2") },
            Mutation::Promote { id: id("s1") },
        ])
        .expect("batch");

    assert_eq!(affected, vec![id("p2"), id("s1")]);
    assert_eq!(
        session.node(&id("s1")).map(|n| n.node_type).ok(),
        Some(NodeType::Primary)
    );
}

#[rstest]
fn given_reset_position_when_applied_then_node_returns_to_first_free_slot(mut session: Session) {
    // Arrange: move p1 off its slot, p2 keeps slot 1
    session
        .apply(Mutation::Place {
            id: id("p1"),
            placement: Placement::at(Point::new(100.0, 100.0)),
        })
        .expect("place");

    // Act
    session
        .apply(Mutation::ResetPosition { id: id("p1") })
        .expect("reset");

    // Assert
    let p1 = session.node(&id("p1")).expect("p1");
    assert_eq!(p1.position, Some(Point::new(780.0, 400.0)));
}

#[rstest]
fn given_moved_nodes_when_reset_layout_then_slot_order_restored(mut session: Session) {
    // Arrange
    let expected = session.nodes().clone();
    session
        .apply(Mutation::Place {
            id: id("p2"),
            placement: Placement::at(Point::new(50.0, 50.0)),
        })
        .expect("place");

    // Act
    session.reset_layout().expect("reset layout");

    // Assert
    assert_eq!(session.nodes(), &expected);
}

#[rstest]
fn given_new_center_when_recenter_then_root_follows_and_others_stay(mut session: Session) {
    // Arrange
    let p1_before = session.node(&id("p1")).map(|n| n.position).expect("p1");

    // Act
    session.recenter(Point::new(500.0, 300.0)).expect("recenter");

    // Assert
    let root = session.node(&id("center")).expect("root");
    assert_eq!(root.position, Some(Point::new(500.0, 300.0)));
    assert_eq!(session.node(&id("p1")).map(|n| n.position).expect("p1"), p1_before);
    assert_eq!(session.resolver().center(), Point::new(500.0, 300.0));
    assert_eq!(session.engine().center(), Point::new(500.0, 300.0));
}

// ============================================================
// Selection and editing
// ============================================================

#[rstest]
fn given_selected_node_when_removed_then_selection_cleared(mut session: Session) {
    // Arrange
    session.select(&id("s1")).expect("select");
    session.begin_edit(&id("s1")).expect("edit");

    // Act
    session.apply(Mutation::Remove { id: id("p1") }).expect("remove");

    // Assert
    assert!(session.selected().is_none());
    assert!(session.editing().is_none());
}

#[rstest]
fn given_selected_node_when_other_node_changes_then_selection_kept(mut session: Session) {
    session.select(&id("p1")).expect("select");

    session
        .apply(Mutation::ResetPosition { id: id("p2") })
        .expect("reset");

    assert_eq!(session.selected().map(|n| n.id.clone()), Some(id("p1")));
}

#[rstest]
fn given_unknown_id_when_select_then_error(mut session: Session) {
    let result = session.select(&id("ghost"));

    assert!(result.is_err());
    assert!(session.selected().is_none());
}

#[rstest]
fn given_editing_when_end_edit_then_cleared(mut session: Session) {
    session.begin_edit(&id("p2")).expect("edit");
    assert_eq!(session.editing().map(|n| n.name.as_str()), Some("Beta"));

    session.end_edit();
    session.clear_selection();

    assert!(session.editing().is_none());
}

// ============================================================
// Settings wiring
// ============================================================

#[test]
fn given_settings_with_small_viewport_when_from_settings_then_root_at_viewport_center() {
    let mut settings = Settings::default();
    settings.viewport.width = 400.0;
    settings.viewport.height = 200.0;

    let session = Session::from_settings(&settings, unplaced()).expect("session");

    let root = session.node(&id("center")).expect("root");
    assert_eq!(root.position, Some(Point::new(200.0, 100.0)));
    assert_eq!(session.engine().center(), Point::new(200.0, 100.0));
}
