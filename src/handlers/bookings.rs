use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::{AdminUser, AuthUser};
use crate::models::stay::deserialize_stay_date;
use crate::models::{Booking, Stay};
use crate::services::bookings::{self, BookingPage};
use crate::services::orchestrator::{self, BookingRequest};
use crate::state::AppState;

// POST /api/bookings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub hotel_id: String,
    #[serde(deserialize_with = "deserialize_stay_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_stay_date")]
    pub check_out: NaiveDate,
    pub total_cost: i64,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateBookingBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let stay = Stay::new(body.check_in, body.check_out)?;

    let booking = orchestrator::create_booking(
        &state.store,
        BookingRequest {
            hotel_id: body.hotel_id,
            user_id: user.user_id,
            stay,
            total_cost: body.total_cost,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/my
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = bookings::list_for_user(&state.store, &user.user_id).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/all
#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn all_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<BookingPage>, AppError> {
    let page = bookings::list_all(&state.store, query.page, query.limit).await?;
    Ok(Json(page))
}

// PATCH /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = bookings::cancel(&state.store, &id, &user.user_id).await?;
    Ok(Json(booking))
}
