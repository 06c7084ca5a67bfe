//! Raise-review service
//!
//! Lists the review reminders due on a given day. Sending them is out of
//! this crate's hands.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::application::services::HierarchyService;
use crate::application::ApplicationResult;
use crate::domain::{ReviewNotice, ReviewPlanner};

pub struct ReviewService {
    hierarchy: Arc<HierarchyService>,
    planner: ReviewPlanner,
}

impl ReviewService {
    pub fn new(hierarchy: Arc<HierarchyService>, months_without_raise: u32) -> Self {
        Self {
            hierarchy,
            planner: ReviewPlanner::new(months_without_raise),
        }
    }

    pub fn notices(&self, today: NaiveDate) -> ApplicationResult<Vec<ReviewNotice>> {
        let forest = self.hierarchy.fetch()?;
        let notices = self.planner.notices(&forest, today);
        info!("{} review notice(s) due on {}", notices.len(), today);
        Ok(notices)
    }
}
