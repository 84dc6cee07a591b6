pub mod request_service;
pub mod summary_service;
pub mod venue_service;

use serde::Serialize;

pub use request_service::{RequestError, RequestInput, RequestService};
pub use summary_service::{DashboardPayload, SummaryPayload, SummaryService};
pub use venue_service::{VenueError, VenueInput, VenueService};

/// Page envelope for list endpoints
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            data,
            page,
            per_page,
            total,
        }
    }
}

/// Clamp a 1-based page number and compute its row offset.
pub(crate) fn page_offset(page: Option<i64>, per_page: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, (page - 1) * per_page)
}
