use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityLock {
    pub hotel_id: String,
    pub night: NaiveDate,
    pub created_at: NaiveDateTime,
}
