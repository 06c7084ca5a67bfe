//! Tests for HierarchyBuilder

use rstest::rstest;

use comptrack::domain::{
    Division, DomainError, EmployeeId, FlatRow, HierarchyBuilder, UnresolvedParentPolicy,
};
use comptrack::util::testing::{init_test_setup, scenario_rows};

fn build(rows: &[FlatRow]) -> Result<comptrack::domain::Forest, DomainError> {
    HierarchyBuilder::new(UnresolvedParentPolicy::Error).build(rows)
}

#[test]
fn given_scenario_rows_when_building_then_single_tree_with_expected_links() {
    init_test_setup();
    // Arrange
    let rows = scenario_rows();

    // Act
    let forest = build(&rows).unwrap();

    // Assert
    assert_eq!(forest.len(), 4);
    assert_eq!(forest.root_ids(), vec![EmployeeId(1)]);
    assert_eq!(forest.children_of(EmployeeId(1)), vec![EmployeeId(2), EmployeeId(3)]);
    assert_eq!(forest.children_of(EmployeeId(2)), vec![EmployeeId(4)]);
    assert_eq!(forest.supervisor_of(EmployeeId(4)), Some(EmployeeId(2)));
    assert_eq!(forest.leaf_ids(), vec![EmployeeId(4), EmployeeId(3)]);
    forest.verify().unwrap();
}

#[test]
fn given_shuffled_rows_when_building_then_same_forest() {
    // Arrange
    let mut rows = scenario_rows();
    rows.reverse();

    // Act
    let shuffled = build(&rows).unwrap();
    let ordered = build(&scenario_rows()).unwrap();

    // Assert
    assert_eq!(shuffled, ordered);
}

#[test]
fn given_no_rows_when_building_then_empty_forest() {
    let forest = build(&[]).unwrap();
    assert!(forest.is_empty());
    assert!(forest.roots().is_empty());
}

#[test]
fn given_two_unrelated_roots_when_building_then_two_trees_in_id_order() {
    // Arrange
    let rows = vec![
        FlatRow::root(7, "Gus", "Seven"),
        FlatRow::reporting_to(8, "Hal", "Eight", 7),
        FlatRow::root(5, "Eve", "Five"),
    ];

    // Act
    let forest = build(&rows).unwrap();

    // Assert
    assert_eq!(forest.root_ids(), vec![EmployeeId(5), EmployeeId(7)]);
    assert_eq!(forest.root_of(EmployeeId(8)), Some(EmployeeId(7)));
}

#[test]
fn given_duplicate_ids_when_building_then_duplicate_identity() {
    // Arrange
    let mut rows = scenario_rows();
    rows.push(FlatRow::root(3, "Other", "Three"));

    // Act
    let result = build(&rows);

    // Assert
    assert!(matches!(result, Err(DomainError::DuplicateIdentity(EmployeeId(3)))));
}

#[test]
fn given_row_naming_itself_when_building_then_self_reference() {
    let rows = vec![FlatRow::reporting_to(1, "Ada", "One", 1)];
    assert!(matches!(build(&rows), Err(DomainError::SelfReference(EmployeeId(1)))));
}

#[test]
fn given_two_node_cycle_when_building_then_cycle_detected() {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Ada", "One"),
        FlatRow::reporting_to(2, "Bo", "Two", 3),
        FlatRow::reporting_to(3, "Cy", "Three", 2),
    ];

    // Act
    let result = build(&rows);

    // Assert
    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
}

#[rstest]
#[case(UnresolvedParentPolicy::Error, false)]
#[case(UnresolvedParentPolicy::Promote, true)]
fn given_missing_supervisor_when_building_then_policy_decides(
    #[case] policy: UnresolvedParentPolicy,
    #[case] builds: bool,
) {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Ada", "One"),
        FlatRow::reporting_to(2, "Bo", "Two", 99),
    ];

    // Act
    let result = HierarchyBuilder::new(policy).build(&rows);

    // Assert
    match result {
        Ok(forest) => {
            assert!(builds);
            assert_eq!(forest.root_ids(), vec![EmployeeId(1), EmployeeId(2)]);
        }
        Err(e) => {
            assert!(!builds);
            assert!(matches!(
                e,
                DomainError::UnresolvedParent {
                    employee: EmployeeId(2),
                    ..
                }
            ));
        }
    }
}

#[test]
fn given_supervisor_by_name_when_building_then_resolved_to_id() {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Ada", "One").with_division(Division::Global),
        FlatRow::root(2, "Bo", "Two")
            .with_division(Division::Global)
            .with_supervisor_name("Ada", "One"),
    ];

    // Act
    let forest = build(&rows).unwrap();

    // Assert
    assert_eq!(forest.supervisor_of(EmployeeId(2)), Some(EmployeeId(1)));
}

#[test]
fn given_ambiguous_supervisor_name_when_building_then_ambiguous_target() {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Ada", "One"),
        FlatRow::root(2, "Ada", "One"),
        FlatRow::root(3, "Cy", "Three").with_supervisor_name("Ada", "One"),
    ];

    // Act
    let result = build(&rows);

    // Assert
    match result {
        Err(DomainError::AmbiguousTarget { candidates, .. }) => {
            assert_eq!(candidates, vec![EmployeeId(1), EmployeeId(2)]);
        }
        other => panic!("expected ambiguous target, got {:?}", other),
    }
}

#[test]
fn given_half_supervisor_name_when_building_then_malformed_row() {
    // Arrange
    let mut row = FlatRow::root(2, "Bo", "Two");
    row.supervisor_first_name = Some("Ada".to_string());
    let rows = vec![FlatRow::root(1, "Ada", "One"), row];

    // Act
    let result = build(&rows);

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::MalformedRow {
            id: EmployeeId(2),
            ..
        })
    ));
}

#[test]
fn given_id_and_name_when_building_then_id_wins() {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Ada", "One"),
        FlatRow::root(2, "Bo", "Two"),
        FlatRow::reporting_to(3, "Cy", "Three", 1).with_supervisor_name("Bo", "Two"),
    ];

    // Act
    let forest = build(&rows).unwrap();

    // Assert
    assert_eq!(forest.supervisor_of(EmployeeId(3)), Some(EmployeeId(1)));
}
