//! The only path that creates bookings.
//!
//! Claiming a stay's nights and writing the booking happen in one SQLite
//! transaction, so other connections see either both or neither. Direct
//! bookings and payment confirmation both come through [`book_stay`].

use rusqlite::Transaction;

use crate::db::{queries, Store};
use crate::errors::AppError;
use crate::models::{Booking, Stay};
use crate::services::{bookings, ledger};

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub hotel_id: String,
    pub user_id: String,
    pub stay: Stay,
    pub total_cost: i64,
}

// On `Err` the caller must drop the transaction, not commit it.
pub fn book_stay(tx: &Transaction<'_>, request: &BookingRequest) -> Result<Booking, AppError> {
    if queries::get_hotel(tx, &request.hotel_id)?.is_none() {
        return Err(AppError::NotFound("Hotel".to_string()));
    }

    ledger::claim_nights(tx, &request.hotel_id, &request.stay)?;

    bookings::create(
        tx,
        &request.hotel_id,
        &request.user_id,
        &request.stay,
        request.total_cost,
    )
}

pub async fn create_booking(store: &Store, request: BookingRequest) -> Result<Booking, AppError> {
    let hotel_id = request.hotel_id.clone();

    let result = store
        .unit_of_work(move |tx| book_stay(tx, &request))
        .await;

    match &result {
        Ok(booking) => tracing::info!(
            booking_id = %booking.id,
            hotel_id = %booking.hotel_id,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            "booking confirmed"
        ),
        Err(AppError::Conflict(_)) => {
            tracing::info!(hotel_id = %hotel_id, "booking rejected, nights already claimed")
        }
        Err(_) => {}
    }

    result
}
