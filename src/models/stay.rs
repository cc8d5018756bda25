use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

pub const MAX_NIGHTS: i64 = 365;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, AppError> {
        if check_in >= check_out {
            return Err(AppError::Validation(
                "checkOut must be after checkIn".to_string(),
            ));
        }
        if (check_out - check_in).num_days() > MAX_NIGHTS {
            return Err(AppError::Validation(format!(
                "stays are limited to {MAX_NIGHTS} nights"
            )));
        }
        Ok(Self { check_in, check_out })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn night_count(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        let check_out = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d < check_out)
    }
}

pub fn parse_stay_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

pub fn deserialize_stay_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_stay_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}
