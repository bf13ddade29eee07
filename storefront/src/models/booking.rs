use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for `available-slots-v2`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotQuery {
    /// `YYYY-MM-DD`
    #[validate(length(equal = 10, message = "date must be YYYY-MM-DD"))]
    pub date: String,
    /// Comma separated service ids.
    #[validate(length(min = 1, message = "service_ids cannot be empty"))]
    pub service_ids: String,
    pub employee_id: Option<String>,
}

/// Query for `slot-employees`: the slot query plus the chosen start time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotEmployeesQuery {
    #[validate(length(equal = 10, message = "date must be YYYY-MM-DD"))]
    pub date: String,
    #[validate(length(min = 1, message = "service_ids cannot be empty"))]
    pub service_ids: String,
    /// Minutes since midnight.
    pub start_time: u32,
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingServiceItem {
    pub service_id: String,
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(equal = 10, message = "date must be YYYY-MM-DD"))]
    pub date: String,
    pub start_time: u32,
    #[validate(length(min = 1, message = "At least one service is required"))]
    pub services: Vec<BookingServiceItem>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MyBookingsQuery {
    pub business_id: Option<String>,
}
