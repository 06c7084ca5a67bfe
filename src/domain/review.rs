//! Raise-review planning.
//!
//! Decides which employees are due for a salary review and who has to be
//! told about it. Delivery of the notices is someone else's job.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::arena::Forest;
use crate::domain::entities::{EmployeeId, PersonName};

/// Day of month on which the mid-month payroll runs.
const MID_MONTH_PAYROLL_DAY: u32 = 16;

/// True when `salary_date` lies more than `months` months before `today`.
pub fn is_overdue(salary_date: NaiveDate, today: NaiveDate, months: u32) -> bool {
    match today.checked_sub_months(Months::new(months)) {
        Some(cutoff) => salary_date < cutoff,
        None => false,
    }
}

/// First payroll run after a raise effective on `salary_date`: the 16th of
/// the same month for dates before the 16th, otherwise the 1st of the next
/// month.
pub fn next_payroll_date(salary_date: NaiveDate) -> Option<NaiveDate> {
    if salary_date.day() < MID_MONTH_PAYROLL_DAY {
        salary_date.with_day(MID_MONTH_PAYROLL_DAY)
    } else {
        salary_date
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeParty {
    pub id: EmployeeId,
    pub name: PersonName,
}

/// One review reminder: addressed to the immediate supervisor, copied to the
/// ultimate supervisor when that is someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewNotice {
    pub employee: NoticeParty,
    pub salary_effective_date: NaiveDate,
    pub payroll_increase_date: NaiveDate,
    pub immediate_supervisor: NoticeParty,
    pub ultimate_supervisor: Option<NoticeParty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPlanner {
    months_without_raise: u32,
}

impl Default for ReviewPlanner {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ReviewPlanner {
    pub fn new(months_without_raise: u32) -> Self {
        Self {
            months_without_raise,
        }
    }

    pub fn months_without_raise(&self) -> u32 {
        self.months_without_raise
    }

    /// Notices for every raise-eligible employee in `forest` whose salary is
    /// overdue on `today`, in pre-order.
    pub fn notices(&self, forest: &Forest, today: NaiveDate) -> Vec<ReviewNotice> {
        let mut notices = Vec::new();
        for (_, node) in forest.iter() {
            let row = &node.data.row;
            let Some(salary_date) = row.salary_effective_date else {
                continue;
            };
            if !row.raise_eligible || !is_overdue(salary_date, today, self.months_without_raise)
            {
                continue;
            }

            let id = node.data.id;
            let Some(immediate) = forest.supervisor_of(id).and_then(|s| party(forest, s)) else {
                warn!("no immediate supervisor for {}, skipping review", node.data);
                continue;
            };
            let Some(payroll_increase_date) = next_payroll_date(salary_date) else {
                warn!("no payroll date after {} for {}", salary_date, node.data);
                continue;
            };
            let ultimate = forest
                .root_of(id)
                .filter(|root| *root != immediate.id)
                .and_then(|root| party(forest, root));

            debug!("review due: {} (salary since {})", node.data, salary_date);
            notices.push(ReviewNotice {
                employee: NoticeParty {
                    id,
                    name: node.data.name.clone(),
                },
                salary_effective_date: salary_date,
                payroll_increase_date,
                immediate_supervisor: immediate,
                ultimate_supervisor: ultimate,
            });
        }
        notices
    }
}

fn party(forest: &Forest, id: EmployeeId) -> Option<NoticeParty> {
    forest.get(id).map(|n| NoticeParty {
        id,
        name: n.data.name.clone(),
    })
}
