use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub order_id: String,
    pub user_id: String,
    pub hotel_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: GuestCounts,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    pub booking_id: Option<String>,
    pub provider_status: Option<String>,
    pub payment_session_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuestCounts {
    pub adult_count: u32,
    pub child_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Created,
    Paid,
    Failed,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Created => "created",
            IntentStatus::Paid => "paid",
            IntentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(IntentStatus::Created),
            "paid" => Some(IntentStatus::Paid),
            "failed" => Some(IntentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntentStatus::Created)
    }
}

impl ToSql for IntentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IntentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        IntentStatus::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown intent status: {s}").into()))
    }
}
