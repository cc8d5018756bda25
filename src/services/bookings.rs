use chrono::Utc;
use rusqlite::Transaction;
use serde::Serialize;

use crate::db::{queries, Store};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Stay};
use crate::services::ledger;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

pub(crate) fn create(
    tx: &Transaction<'_>,
    hotel_id: &str,
    user_id: &str,
    stay: &Stay,
    total_cost: i64,
) -> Result<Booking, AppError> {
    if total_cost <= 0 {
        return Err(AppError::Validation(
            "totalCost must be a positive amount".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        hotel_id: hotel_id.to_string(),
        user_id: user_id.to_string(),
        check_in: stay.check_in(),
        check_out: stay.check_out(),
        total_cost,
        status: BookingStatus::Confirmed,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(tx, &booking)?;

    Ok(booking)
}

pub fn cancel_in(
    tx: &Transaction<'_>,
    booking_id: &str,
    requesting_user_id: &str,
) -> Result<Booking, AppError> {
    let mut booking = queries::get_booking_by_id(tx, booking_id)?
        .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

    if booking.user_id != requesting_user_id {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::AlreadyCancelled(Box::new(booking)));
    }

    let now = Utc::now().naive_utc();
    queries::update_booking_status(tx, &booking.id, BookingStatus::Cancelled, now)?;
    ledger::release_nights(tx, &booking.hotel_id, booking.check_in, booking.check_out)?;

    booking.status = BookingStatus::Cancelled;
    booking.updated_at = now;
    Ok(booking)
}

pub async fn cancel(
    store: &Store,
    booking_id: &str,
    requesting_user_id: &str,
) -> Result<Booking, AppError> {
    let booking_id = booking_id.to_string();
    let user_id = requesting_user_id.to_string();

    let booking = store
        .unit_of_work(move |tx| cancel_in(tx, &booking_id, &user_id))
        .await?;

    tracing::info!(
        booking_id = %booking.id,
        hotel_id = %booking.hotel_id,
        "booking cancelled"
    );
    Ok(booking)
}

pub async fn list_for_user(store: &Store, user_id: &str) -> Result<Vec<Booking>, AppError> {
    let user_id = user_id.to_string();
    store
        .read(move |conn| Ok(queries::get_bookings_for_user(conn, &user_id)?))
        .await
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct BookingPage {
    pub data: Vec<Booking>,
    pub pagination: Pagination,
}

pub async fn list_all(
    store: &Store,
    page: Option<i64>,
    page_size: Option<i64>,
) -> Result<BookingPage, AppError> {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = page_size
        .filter(|l| *l >= 1)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    store
        .read(move |conn| {
            // One read transaction so the page and the total agree
            let snapshot = conn.unchecked_transaction()?;
            let data = queries::get_bookings_page(&snapshot, limit, offset)?;
            let total = queries::count_bookings(&snapshot)?;
            snapshot.commit()?;

            Ok(BookingPage {
                data,
                pagination: Pagination {
                    total,
                    page,
                    pages: (total + limit - 1) / limit,
                },
            })
        })
        .await
}
