//! Tests for raise-review notices

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::rstest;

use comptrack::application::services::{HierarchyService, ReviewService};
use comptrack::domain::{EmployeeId, FlatRow, UnresolvedParentPolicy};
use comptrack::infrastructure::MemoryStore;
use comptrack::util::testing::init_test_setup;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn eligible(mut row: FlatRow, salary_date: &str) -> FlatRow {
    row.raise_eligible = true;
    row.salary_effective_date = Some(date(salary_date));
    row
}

fn review_service(rows: Vec<FlatRow>) -> ReviewService {
    init_test_setup();
    let store = Arc::new(MemoryStore::new(rows));
    let hierarchy = Arc::new(HierarchyService::new(store, UnresolvedParentPolicy::Error));
    ReviewService::new(hierarchy, 10)
}

/// CEO(1) over VP(2) over Dev(3); VP reports straight to the CEO.
fn org() -> Vec<FlatRow> {
    vec![
        eligible(FlatRow::root(1, "Cleo", "Chief"), "2020-01-01"),
        eligible(FlatRow::reporting_to(2, "Vic", "Vice", 1), "2023-01-10"),
        eligible(FlatRow::reporting_to(3, "Dev", "Eloper", 2), "2023-01-20"),
        FlatRow::reporting_to(4, "Nia", "Ineligible", 2),
    ]
}

#[test]
fn given_overdue_employees_when_listing_then_notices_in_pre_order() {
    // Arrange
    let service = review_service(org());

    // Act
    let notices = service.notices(date("2024-01-01")).unwrap();

    // Assert: the CEO has no supervisor; Nia is not eligible
    let ids: Vec<EmployeeId> = notices.iter().map(|n| n.employee.id).collect();
    assert_eq!(ids, vec![EmployeeId(2), EmployeeId(3)]);
}

#[test]
fn given_direct_report_of_root_when_listing_then_no_copy_to_ultimate() {
    let notices = review_service(org()).notices(date("2024-01-01")).unwrap();

    let vp = &notices[0];
    assert_eq!(vp.immediate_supervisor.id, EmployeeId(1));
    assert_eq!(vp.ultimate_supervisor, None);
}

#[test]
fn given_deeper_employee_when_listing_then_copied_to_root() {
    let notices = review_service(org()).notices(date("2024-01-01")).unwrap();

    let dev = &notices[1];
    assert_eq!(dev.immediate_supervisor.id, EmployeeId(2));
    assert_eq!(dev.ultimate_supervisor.as_ref().map(|p| p.id), Some(EmployeeId(1)));
    assert_eq!(dev.payroll_increase_date, date("2023-02-01"));
}

#[rstest]
#[case("2023-11-09", false)]
#[case("2023-11-10", false)]
#[case("2023-11-11", true)]
fn given_cutoff_when_listing_then_strictly_older_than_window(
    #[case] today: &str,
    #[case] due: bool,
) {
    // Arrange: salary set on 2023-01-10, window of 10 months
    let rows = vec![
        FlatRow::root(1, "Cleo", "Chief"),
        eligible(FlatRow::reporting_to(2, "Vic", "Vice", 1), "2023-01-10"),
    ];

    // Act
    let notices = review_service(rows).notices(date(today)).unwrap();

    // Assert
    assert_eq!(!notices.is_empty(), due);
}
