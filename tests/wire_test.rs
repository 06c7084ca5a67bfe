//! Tests for the fetch and persist JSON shapes

use comptrack::application::wire::{
    DivisionChange, HierarchyPayload, PersistRequest, PersistResponse, SupervisorChange,
};
use comptrack::domain::{
    Division, DomainError, EmployeeId, FlatRow, HierarchyBuilder, ParentRef, PersonName,
    Reassignment, UnresolvedParentPolicy,
};

fn division_forest() -> comptrack::domain::Forest {
    HierarchyBuilder::new(UnresolvedParentPolicy::Error)
        .build(&[
            FlatRow::root(1, "Gia", "Global").with_division(Division::Global),
            FlatRow::root(2, "Dom", "Head").with_division(Division::Domestic),
            FlatRow::reporting_to(3, "Zed", "Worker", 1).with_division(Division::Global),
        ])
        .unwrap()
}

#[test]
fn given_object_body_when_parsing_payload_then_division_shape() {
    let payload: HierarchyPayload =
        serde_json::from_str(r#"{"domestic": [{"id": 2, "first_name": "Dom", "last_name": "Head"}]}"#)
            .unwrap();

    assert!(payload.is_divided());
    let rows = payload.into_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].division, Some(Division::Domestic));
}

#[test]
fn given_rows_without_division_when_grouping_then_malformed_row() {
    let result = HierarchyPayload::divided(vec![FlatRow::root(1, "Ada", "One")]);

    assert!(matches!(
        result,
        Err(DomainError::MalformedRow {
            id: EmployeeId(1),
            ..
        })
    ));
}

#[test]
fn given_supervisor_body_when_parsing_then_camel_case_fields() {
    // Arrange
    let body = r#"{"employeeId": 4, "newSupervisorId": 3}"#;

    // Act
    let request: PersistRequest = serde_json::from_str(body).unwrap();

    // Assert
    let PersistRequest::Supervisor(change) = &request else {
        panic!("expected supervisor flavour, got {:?}", request);
    };
    assert_eq!(
        change.to_reassignment().unwrap(),
        Reassignment::Supervisor {
            employee: EmployeeId(4),
            supervisor: ParentRef::Id(EmployeeId(3)),
        }
    );
}

#[test]
fn given_supervisor_name_pair_when_converting_then_name_reference() {
    let change = SupervisorChange {
        employee_id: EmployeeId(4),
        new_supervisor_id: None,
        new_supervisor_first_name: Some("Cy".into()),
        new_supervisor_last_name: Some("Three".into()),
    };

    let reassignment = change.to_reassignment().unwrap();

    assert_eq!(
        reassignment.supervisor(),
        Some(&ParentRef::Name(PersonName::new("Cy", "Three")))
    );
}

#[test]
fn given_no_supervisor_when_converting_then_malformed_row() {
    let change = SupervisorChange {
        employee_id: EmployeeId(4),
        new_supervisor_id: None,
        new_supervisor_first_name: Some("Cy".into()),
        new_supervisor_last_name: None,
    };

    assert!(matches!(
        change.to_reassignment(),
        Err(DomainError::MalformedRow { .. })
    ));
}

#[test]
fn given_division_body_when_parsing_then_resolved_against_forest() {
    // Arrange
    let body = r#"{
        "draggedFirstName": "Zed",
        "draggedLastName": "Worker",
        "targetDivision": "Domestic",
        "targetFirstName": "Dom",
        "targetLastName": "Head"
    }"#;
    let request: PersistRequest = serde_json::from_str(body).unwrap();

    // Act
    let change = request.to_reassignment(&division_forest()).unwrap();

    // Assert
    assert_eq!(
        change,
        Reassignment::Division {
            employee: EmployeeId(3),
            division: Division::Domestic,
            supervisor: Some(ParentRef::Name(PersonName::new("Dom", "Head"))),
        }
    );
}

#[test]
fn given_unknown_division_when_converting_then_unknown_division() {
    let change = DivisionChange {
        dragged_first_name: "Zed".into(),
        dragged_last_name: "Worker".into(),
        target_division: "overseas".into(),
        target_first_name: None,
        target_last_name: None,
    };

    assert!(matches!(
        change.to_reassignment(&division_forest()),
        Err(DomainError::UnknownDivision(_))
    ));
}

#[test]
fn given_responses_when_serializing_then_message_only_on_failure() {
    let ok = serde_json::to_value(PersistResponse::ok()).unwrap();
    let failed = serde_json::to_value(PersistResponse::failed("cycle")).unwrap();

    assert_eq!(ok, serde_json::json!({"success": true}));
    assert_eq!(failed, serde_json::json!({"success": false, "message": "cycle"}));
}

#[test]
fn given_misspelled_division_key_when_parsing_payload_then_rejected_with_key_named() {
    let body = r#"{"global": [], "Domestic": [{"id": 2, "first_name": "Dom", "last_name": "Head"}]}"#;

    let err = HierarchyPayload::from_json(body).unwrap_err();

    assert!(err.to_string().contains("Domestic"), "{}", err);
}

#[test]
fn given_empty_object_when_parsing_payload_then_rejected() {
    assert!(HierarchyPayload::from_json("{}").is_err());
    assert!(serde_json::from_str::<HierarchyPayload>("{}").is_err());
}

#[test]
fn given_array_body_when_parsing_payload_then_rows_shape() {
    let payload = HierarchyPayload::from_json(r#"[{"id": 1, "first_name": "Ada", "last_name": "One"}]"#)
        .unwrap();

    assert!(!payload.is_divided());
    assert_eq!(payload.into_rows().len(), 1);
}

#[test]
fn given_row_with_unmodelled_columns_when_round_tripping_then_columns_kept() {
    // Arrange
    let body = r#"{"id": 1, "first_name": "Ada", "last_name": "One", "salary": 90000, "email": "ada@x"}"#;

    // Act
    let row: FlatRow = serde_json::from_str(body).unwrap();
    let back = serde_json::to_value(&row).unwrap();

    // Assert
    assert_eq!(row.extra.len(), 2);
    assert_eq!(back["salary"], 90000);
    assert_eq!(back["email"], "ada@x");
}
