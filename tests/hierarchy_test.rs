//! Tests for hierarchy rules, cycle detection and the arena tree

use rstest::{fixture, rstest};

use orbitmap::domain::{
    is_ancestor_of, validate_forest, DomainError, HierarchyRules, HierarchyTree, Node,
    NodeCollection, NodeId, NodeType, Violation,
};

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// center -> p1 -> {s1, s2}, center -> p2
#[fixture]
fn nodes() -> NodeCollection {
    NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("p1", "Alpha", NodeType::Primary).with_parent("center"),
        Node::new("s1", "Alpha One", NodeType::Secondary).with_parent("p1"),
        Node::new("p2", "Beta", NodeType::Primary).with_parent("center"),
        Node::new("s2", "Alpha Two", NodeType::Secondary).with_parent("p1"),
    ])
}

// ============================================================
// check_attach
// ============================================================

#[rstest]
#[case(NodeType::Root, "center", false)]
#[case(NodeType::Primary, "center", true)]
#[case(NodeType::Secondary, "center", false)]
#[case(NodeType::Secondary, "p1", true)]
#[case(NodeType::Tertiary, "p1", true)]
#[case(NodeType::Primary, "p1", false)]
#[case(NodeType::Tertiary, "s1", false)]
fn given_child_type_when_check_attach_then_follows_type_table(
    nodes: NodeCollection,
    #[case] child_type: NodeType,
    #[case] parent: &str,
    #[case] allowed: bool,
) {
    let rules = HierarchyRules::default();

    let result = rules.check_attach(&nodes, &id(parent), child_type, None);

    assert_eq!(result.is_ok(), allowed, "{child_type} under {parent}: {result:?}");
}

#[rstest]
fn given_full_parent_when_check_attach_then_capacity_exceeded(nodes: NodeCollection) {
    // Arrange
    let rules = HierarchyRules {
        primary: 2,
        ..HierarchyRules::default()
    };

    // Act
    let result = rules.check_attach(&nodes, &id("p1"), NodeType::Secondary, None);

    // Assert
    assert_eq!(
        result,
        Err(Violation::CapacityExceeded {
            parent: id("p1"),
            max: 2
        }
        .into())
    );
}

#[rstest]
fn given_full_parent_when_moving_existing_child_then_child_is_not_counted(nodes: NodeCollection) {
    let rules = HierarchyRules {
        primary: 2,
        ..HierarchyRules::default()
    };

    let result = rules.check_attach(&nodes, &id("p1"), NodeType::Secondary, Some(&id("s1")));

    assert!(result.is_ok());
}

#[rstest]
fn given_node_when_attached_under_own_descendant_then_cycle(nodes: NodeCollection) {
    let rules = HierarchyRules::default();

    let result = rules.check_attach(&nodes, &id("s1"), NodeType::Primary, Some(&id("p1")));

    assert_eq!(
        result,
        Err(Violation::Cycle {
            node: id("p1"),
            parent: id("s1")
        }
        .into())
    );
}

#[rstest]
fn given_rules_when_can_attach_then_mirrors_check_attach(nodes: NodeCollection) {
    let rules = HierarchyRules::default();

    assert!(rules.can_attach(&nodes, &id("p2"), NodeType::Secondary, None));
    assert!(!rules.can_attach(&nodes, &id("p2"), NodeType::Primary, None));
    assert!(!rules.can_attach(&nodes, &id("s1"), NodeType::Secondary, Some(&id("p1"))));
}

#[rstest]
fn given_node_when_attached_under_itself_then_cycle(nodes: NodeCollection) {
    let rules = HierarchyRules::default();

    let result = rules.check_attach(&nodes, &id("p1"), NodeType::Primary, Some(&id("p1")));

    assert!(matches!(
        result,
        Err(DomainError::ConstraintViolation(Violation::Cycle { .. }))
    ));
}

#[rstest]
fn given_unknown_parent_when_check_attach_then_invalid_reference(nodes: NodeCollection) {
    let result = HierarchyRules::default().check_attach(&nodes, &id("nope"), NodeType::Primary, None);

    assert_eq!(result, Err(DomainError::InvalidReference(id("nope"))));
}

// ============================================================
// is_ancestor_of
// ============================================================

#[rstest]
#[case("center", "s1", true)]
#[case("p1", "s1", true)]
#[case("p2", "s1", false)]
#[case("s1", "p1", false)]
#[case("s1", "s1", false)]
fn given_tree_when_is_ancestor_of_then_walks_parent_chain(
    nodes: NodeCollection,
    #[case] candidate: &str,
    #[case] node: &str,
    #[case] expected: bool,
) {
    assert_eq!(is_ancestor_of(&nodes, &id(candidate), &id(node)), Ok(expected));
}

#[test]
fn given_cyclic_parent_links_when_is_ancestor_of_then_cycle_detected() {
    // Arrange: a -> b -> a, neither reaches the root
    let nodes = NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("a", "Node A", NodeType::Primary).with_parent("b"),
        Node::new("b", "Node B", NodeType::Primary).with_parent("a"),
    ]);

    // Act
    let result = is_ancestor_of(&nodes, &id("center"), &id("a"));

    // Assert
    assert_eq!(result, Err(Violation::CycleDetected(id("a")).into()));
}

// ============================================================
// validate_forest
// ============================================================

#[rstest]
fn given_valid_tree_when_validate_forest_then_ok(nodes: NodeCollection) {
    assert_eq!(validate_forest(&nodes, &HierarchyRules::default()), Ok(()));
}

#[test]
fn given_two_roots_when_validate_forest_then_malformed() {
    let nodes = NodeCollection::new(vec![
        Node::new("r1", "Root One", NodeType::Root),
        Node::new("r2", "Root Two", NodeType::Root),
    ]);

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert!(matches!(result, Err(DomainError::MalformedHierarchy(_))));
}

#[test]
fn given_no_root_when_validate_forest_then_malformed() {
    let nodes = NodeCollection::new(vec![Node::new("p1", "Alpha", NodeType::Primary)]);

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert!(matches!(result, Err(DomainError::MalformedHierarchy(_))));
}

#[rstest]
fn given_duplicate_id_when_validate_forest_then_malformed(mut nodes: NodeCollection) {
    nodes.push(Node::new("p2", "Beta Again", NodeType::Primary).with_parent("center"));

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert!(matches!(result, Err(DomainError::MalformedHierarchy(msg)) if msg.contains("p2")));
}

#[rstest]
fn given_dangling_parent_when_validate_forest_then_invalid_reference(mut nodes: NodeCollection) {
    nodes.push(Node::new("s9", "Orphan", NodeType::Secondary).with_parent("ghost"));

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert_eq!(result, Err(DomainError::InvalidReference(id("ghost"))));
}

#[rstest]
fn given_secondary_under_root_when_validate_forest_then_disallowed(mut nodes: NodeCollection) {
    nodes.push(Node::new("s9", "Misplaced", NodeType::Secondary).with_parent("center"));

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert_eq!(
        result,
        Err(Violation::DisallowedChild {
            parent_type: NodeType::Root,
            child_type: NodeType::Secondary
        }
        .into())
    );
}

#[rstest]
fn given_too_many_children_when_validate_forest_then_capacity_exceeded(nodes: NodeCollection) {
    let rules = HierarchyRules {
        root: 1,
        ..HierarchyRules::default()
    };

    let result = validate_forest(&nodes, &rules);

    assert!(matches!(
        result,
        Err(DomainError::ConstraintViolation(Violation::CapacityExceeded { max: 1, .. }))
    ));
}

#[test]
fn given_cycle_when_validate_forest_then_rejected() {
    let nodes = NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("p1", "Alpha", NodeType::Primary).with_parent("s1"),
        Node::new("s1", "Alpha One", NodeType::Secondary).with_parent("p1"),
    ]);

    let result = validate_forest(&nodes, &HierarchyRules::default());

    assert!(result.is_err());
}

// ============================================================
// HierarchyTree
// ============================================================

#[rstest]
fn given_collection_when_build_tree_then_preorder_follows_collection_order(nodes: NodeCollection) {
    let tree = HierarchyTree::build(&nodes).expect("tree");

    let order: Vec<_> = tree.iter().map(|(_, n)| n.data.id.to_string()).collect();

    assert_eq!(order, vec!["center", "p1", "s1", "s2", "p2"]);
    assert_eq!(tree.depth(), 3);
}

#[rstest]
fn given_tree_when_subtree_then_node_first_then_descendants(nodes: NodeCollection) {
    let tree = HierarchyTree::build(&nodes).expect("tree");

    assert_eq!(tree.subtree(&id("p1")), vec![id("p1"), id("s1"), id("s2")]);
    assert_eq!(tree.descendants(&id("p1")), vec![id("s1"), id("s2")]);
    assert_eq!(tree.leaf_nodes(), vec![id("s1"), id("s2"), id("p2")]);
}

#[rstest]
fn given_tree_when_iter_postorder_then_children_before_parents(nodes: NodeCollection) {
    let tree = HierarchyTree::build(&nodes).expect("tree");

    let order: Vec<_> = tree
        .iter_postorder()
        .map(|(_, n)| n.data.id.to_string())
        .collect();

    assert_eq!(order, vec!["s1", "s2", "p1", "p2", "center"]);
}

#[rstest]
fn given_tree_when_rendered_then_shows_hierarchy(nodes: NodeCollection) {
    let tree = HierarchyTree::build(&nodes).expect("tree");

    let rendered = tree.to_tree_string().to_string();

    assert!(rendered.starts_with("Main Organization [root] (center)"));
    assert!(rendered.contains("Alpha One [secondary] (s1)"));
}

#[test]
fn given_unreachable_node_when_build_tree_then_malformed() {
    let nodes = NodeCollection::new(vec![
        Node::new("center", "Main Organization", NodeType::Root),
        Node::new("a", "Node A", NodeType::Primary).with_parent("b"),
        Node::new("b", "Node B", NodeType::Primary).with_parent("a"),
    ]);

    let result = HierarchyTree::build(&nodes);

    assert!(matches!(result, Err(DomainError::MalformedHierarchy(_))));
}
