use serde::Serialize;

use crate::models::Stay;

pub const TAX_PERCENT: i64 = 12;
pub const SERVICE_FEE: i64 = 500;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub nights: i64,
    pub base_price: i64,
    pub tax: i64,
    pub service_fee: i64,
    pub total: i64,
}

pub fn quote(price_per_night: i64, stay: &Stay) -> PriceBreakdown {
    let nights = stay.night_count();
    let base_price = nights * price_per_night;
    let tax = (base_price * TAX_PERCENT + 50) / 100;

    PriceBreakdown {
        nights,
        base_price,
        tax,
        service_fee: SERVICE_FEE,
        total: base_price + tax + SERVICE_FEE,
    }
}
