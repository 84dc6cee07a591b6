pub mod procurement_request;
pub mod user;
pub mod venue;

pub use procurement_request::{ProcurementRequest, ProcurementRequestDetail, RequestStatus};
pub use user::User;
pub use venue::{Venue, VenueStatus};
