use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::models::stay::deserialize_stay_date;
use crate::models::{GuestCounts, Stay};
use crate::services::intents::{self, Confirmation, CreatedOrder, OrderSpec, Trigger};
use crate::services::payments::cashfree::verify_webhook_signature;
use crate::state::AppState;

// POST /api/payments/create-order
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub hotel_id: String,
    #[serde(deserialize_with = "deserialize_stay_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_stay_date")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub adult_count: u32,
    #[serde(default)]
    pub child_count: u32,
    pub customer_phone: Option<String>,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateOrderBody>, JsonRejection>,
) -> Result<Json<CreatedOrder>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let stay = Stay::new(body.check_in, body.check_out)?;

    let order = intents::create_payment_order(
        &state.store,
        state.payments.as_ref(),
        OrderSpec {
            user_id: user.user_id,
            hotel_id: body.hotel_id,
            stay,
            guests: GuestCounts {
                adult_count: body.adult_count,
                child_count: body.child_count,
            },
            customer_phone: body.customer_phone,
        },
        &state.config.currency,
        &state.config.payment_return_url(),
    )
    .await?;

    Ok(Json(order))
}

fn confirmation_body(confirmation: &Confirmation) -> Value {
    let message = if confirmation.replayed {
        "Payment already confirmed"
    } else {
        "Payment confirmed and booking created"
    };
    json!({ "message": message, "bookingId": confirmation.booking_id })
}

// POST /api/payments/confirm
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
    pub order_id: Option<String>,
}

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ConfirmBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let order_id = body
        .order_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("orderId is required".to_string()))?;

    let confirmation = intents::reconcile(
        &state.store,
        state.payments.as_ref(),
        &order_id,
        Trigger::Customer(&user.user_id),
        state.confirm_retry_policy(),
    )
    .await?;

    Ok(Json(confirmation_body(&confirmation)))
}

const PAYMENT_SUCCESS_EVENT: &str = "PAYMENT_SUCCESS_WEBHOOK";

// POST /api/payments/webhook
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // Skip signature validation when no secret is configured (dev mode)
    let secret = &state.config.cashfree_secret_key;
    if !secret.is_empty() {
        let signature = headers
            .get("x-webhook-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let timestamp = headers
            .get("x-webhook-timestamp")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() || !verify_webhook_signature(secret, timestamp, &body, signature) {
            tracing::warn!("rejected payment webhook with invalid signature");
            return Err(AppError::Forbidden("Invalid signature".to_string()));
        }
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("invalid webhook payload: {e}")))?;
    let order_id = payload
        .pointer("/data/order/order_id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("webhook payload has no order id".to_string()))?;

    // Failed and dropped attempts say nothing final about the order
    let event = payload.pointer("/type").and_then(Value::as_str);
    if let Some(event) = event.filter(|event| *event != PAYMENT_SUCCESS_EVENT) {
        tracing::info!(order_id, event, "payment webhook event ignored");
        return Ok(Json(json!({ "message": "Event ignored", "type": event })));
    }

    tracing::info!(order_id, "payment webhook received");

    let result = intents::reconcile(
        &state.store,
        state.payments.as_ref(),
        order_id,
        Trigger::ProviderWebhook,
        state.confirm_retry_policy(),
    )
    .await;

    // Final outcomes are acknowledged so the provider stops redelivering
    match result {
        Ok(confirmation) => Ok(Json(confirmation_body(&confirmation))),
        Err(AppError::ProviderNotCompleted { status, .. }) => Ok(Json(json!({
            "message": "Payment not completed",
            "status": status,
        }))),
        Err(AppError::Conflict(message)) => Ok(Json(json!({ "message": message }))),
        Err(e) => Err(e),
    }
}
