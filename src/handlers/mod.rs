pub mod auth;
pub mod dashboard;
pub mod requests;
pub mod summary;
pub mod venues;

use serde::Deserialize;

/// `?page=N` query for paginated list endpoints
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}
