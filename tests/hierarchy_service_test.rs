//! Tests for HierarchyService and MutationEngine

use std::sync::Arc;

use comptrack::application::services::HierarchyService;
use comptrack::application::wire::{PersistRequest, SupervisorChange};
use comptrack::application::ApplicationError;
use comptrack::domain::{
    Division, DomainError, EmployeeId, FlatRow, ParentRef, PersonName, Reassignment,
    UnresolvedParentPolicy,
};
use comptrack::infrastructure::MemoryStore;
use comptrack::util::testing::{init_test_setup, scenario_rows};

fn service(rows: Vec<FlatRow>) -> (Arc<MemoryStore>, HierarchyService) {
    init_test_setup();
    let store = Arc::new(MemoryStore::new(rows));
    let service = HierarchyService::new(store.clone(), UnresolvedParentPolicy::Error);
    (store, service)
}

fn to(employee: u64, supervisor: u64) -> Reassignment {
    Reassignment::Supervisor {
        employee: EmployeeId(employee),
        supervisor: ParentRef::Id(EmployeeId(supervisor)),
    }
}

fn domain_error(e: ApplicationError) -> DomainError {
    match e {
        ApplicationError::Domain(d) => d,
        other => panic!("expected domain error, got {:?}", other),
    }
}

#[test]
fn given_scenario_when_moving_four_under_three_then_two_becomes_leaf() {
    // Arrange
    let (store, service) = service(scenario_rows());

    // Act
    let forest = service.reassign(&to(4, 3)).unwrap();

    // Assert
    assert_eq!(forest.children_of(EmployeeId(2)), Vec::<EmployeeId>::new());
    assert_eq!(forest.children_of(EmployeeId(3)), vec![EmployeeId(4)]);
    let row = store
        .snapshot()
        .into_iter()
        .find(|r| r.id == EmployeeId(4))
        .unwrap();
    assert_eq!(row.supervisor_id, Some(EmployeeId(3)));
    assert_eq!(row.supervisor_first_name.as_deref(), Some("Cy"));
}

#[test]
fn given_scenario_when_moving_root_under_descendant_then_cycle_rejected() {
    // Arrange
    let (store, service) = service(scenario_rows());

    // Act
    let result = service.reassign(&to(1, 4));

    // Assert
    assert!(matches!(
        domain_error(result.unwrap_err()),
        DomainError::CycleRejected {
            employee: EmployeeId(1),
            target: EmployeeId(4),
        }
    ));
    assert_eq!(store.snapshot(), scenario_rows());
}

#[test]
fn given_chain_when_moving_top_under_bottom_then_store_untouched() {
    // Arrange: A(1) <- B(2) <- C(3)
    let rows = vec![
        FlatRow::root(1, "A", "Top"),
        FlatRow::reporting_to(2, "B", "Mid", 1),
        FlatRow::reporting_to(3, "C", "Low", 2),
    ];
    let (store, service) = service(rows.clone());

    // Act
    let result = service.reassign(&to(1, 3));

    // Assert
    assert!(result.is_err());
    assert_eq!(store.snapshot(), rows);
}

#[test]
fn given_employee_when_moving_under_itself_then_cycle_rejected() {
    let (_, service) = service(scenario_rows());

    let err = domain_error(service.reassign(&to(2, 2)).unwrap_err());

    assert!(matches!(err, DomainError::CycleRejected { .. }));
}

#[test]
fn given_unknown_ids_when_reassigning_then_not_found() {
    let (_, service) = service(scenario_rows());

    let missing_employee = domain_error(service.reassign(&to(9, 1)).unwrap_err());
    let missing_supervisor = domain_error(service.reassign(&to(4, 9)).unwrap_err());

    assert!(matches!(missing_employee, DomainError::EmployeeNotFound(EmployeeId(9))));
    assert!(matches!(missing_supervisor, DomainError::EmployeeNotFound(EmployeeId(9))));
}

#[test]
fn given_current_supervisor_when_reassigning_then_nothing_written() {
    // Arrange
    let (store, service) = service(scenario_rows());

    // Act
    let forest = service.reassign(&to(4, 2)).unwrap();

    // Assert
    assert_eq!(forest.supervisor_of(EmployeeId(4)), Some(EmployeeId(2)));
    assert_eq!(store.snapshot(), scenario_rows());
}

#[test]
fn given_supervisor_by_name_when_reassigning_then_resolved() {
    let (_, service) = service(scenario_rows());
    let change = Reassignment::Supervisor {
        employee: EmployeeId(3),
        supervisor: ParentRef::Name(PersonName::new("Bo", "Two")),
    };

    let forest = service.reassign(&change).unwrap();

    assert_eq!(forest.children_of(EmployeeId(2)), vec![EmployeeId(3), EmployeeId(4)]);
}

#[test]
fn given_division_rows_when_moving_division_then_row_retagged() {
    // Arrange
    let rows = vec![
        FlatRow::root(1, "Gia", "Global").with_division(Division::Global),
        FlatRow::root(2, "Dom", "Head").with_division(Division::Domestic),
        FlatRow::root(3, "Zed", "Worker")
            .with_division(Division::Global)
            .with_supervisor_name("Gia", "Global"),
    ];
    let (store, service) = service(rows);
    let change = Reassignment::Division {
        employee: EmployeeId(3),
        division: Division::Domestic,
        supervisor: Some(ParentRef::Name(PersonName::new("Dom", "Head"))),
    };

    // Act
    let forest = service.reassign(&change).unwrap();

    // Assert
    assert_eq!(forest.supervisor_of(EmployeeId(3)), Some(EmployeeId(2)));
    let row = store
        .snapshot()
        .into_iter()
        .find(|r| r.id == EmployeeId(3))
        .unwrap();
    assert_eq!(row.division, Some(Division::Domestic));
    assert_eq!(row.supervisor_last_name.as_deref(), Some("Head"));
}

#[test]
fn given_persist_request_when_responding_then_success_flag_reflects_outcome() {
    // Arrange
    let (_, service) = service(scenario_rows());
    let ok = PersistRequest::Supervisor(SupervisorChange {
        employee_id: EmployeeId(4),
        new_supervisor_id: Some(EmployeeId(3)),
        new_supervisor_first_name: None,
        new_supervisor_last_name: None,
    });
    let cycle = PersistRequest::Supervisor(SupervisorChange {
        employee_id: EmployeeId(1),
        new_supervisor_id: Some(EmployeeId(3)),
        new_supervisor_first_name: None,
        new_supervisor_last_name: None,
    });

    // Act
    let accepted = service.respond(&ok);
    let rejected = service.respond(&cycle);

    // Assert
    assert!(accepted.success);
    assert!(!rejected.success);
    assert!(rejected.message.is_some());
}
