//! Payment intents: the bridge between the payment provider and bookings.
//!
//! An intent starts as `created` and settles exactly once, as `paid` (with the
//! booking it produced) or `failed`. [`reconcile`] may be called any number of
//! times for the same order, from the customer's return page or the provider's
//! webhook, and never creates more than one booking.

use chrono::Utc;
use rand::Rng;
use rusqlite::Transaction;
use serde::Serialize;

use crate::db::{queries, Store};
use crate::errors::{is_unique_violation, AppError};
use crate::models::{GuestCounts, IntentStatus, PaymentIntent, Stay};
use crate::services::orchestrator::{self, BookingRequest};
use crate::services::payments::{Customer, OrderRequest, PaymentProvider, ProviderOrderStatus};
use crate::services::pricing;
use crate::services::retry::{retry_transient, RetryError, RetryPolicy};

pub const ORDER_CREATE_FAILED: &str = "ORDER_CREATE_FAILED";

const DEFAULT_CUSTOMER_PHONE: &str = "9999999999";
const ORDER_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate_order_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ORDER_SUFFIX_ALPHABET[rng.gen_range(0..ORDER_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("order_{}_{suffix}", Utc::now().timestamp_millis())
}

pub fn create_intent(tx: &Transaction<'_>, intent: &PaymentIntent) -> Result<(), AppError> {
    match queries::insert_payment_intent(tx, intent) {
        Ok(()) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateOrder(intent.order_id.clone())),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub user_id: String,
    pub hotel_id: String,
    pub stay: Stay,
    pub guests: GuestCounts,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: String,
    pub payment_session_id: String,
    pub amount: i64,
    pub currency: String,
}

pub async fn create_payment_order(
    store: &Store,
    provider: &dyn PaymentProvider,
    spec: OrderSpec,
    currency: &str,
    return_url: &str,
) -> Result<CreatedOrder, AppError> {
    let order_id = generate_order_id();
    let currency = currency.to_string();

    let intent = {
        let order_id = order_id.clone();
        let spec = spec.clone();
        store
            .unit_of_work(move |tx| {
                let hotel = queries::get_hotel(tx, &spec.hotel_id)?
                    .ok_or_else(|| AppError::NotFound("Hotel".to_string()))?;
                let quote = pricing::quote(hotel.price_per_night, &spec.stay);
                if quote.total <= 0 {
                    return Err(AppError::Validation("stay has no chargeable amount".to_string()));
                }

                let now = Utc::now().naive_utc();
                let intent = PaymentIntent {
                    order_id,
                    user_id: spec.user_id,
                    hotel_id: spec.hotel_id,
                    check_in: spec.stay.check_in(),
                    check_out: spec.stay.check_out(),
                    guests: spec.guests,
                    amount: quote.total,
                    currency,
                    status: IntentStatus::Created,
                    booking_id: None,
                    provider_status: None,
                    payment_session_id: None,
                    created_at: now,
                    updated_at: now,
                };
                create_intent(tx, &intent)?;
                Ok(intent)
            })
            .await?
    };

    let order = OrderRequest {
        order_id: intent.order_id.clone(),
        amount: intent.amount,
        currency: intent.currency.clone(),
        customer: Customer {
            id: intent.user_id.clone(),
            phone: spec
                .customer_phone
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CUSTOMER_PHONE.to_string()),
        },
        return_url: return_url.to_string(),
    };

    let session_id = match provider.create_order(&order).await {
        Ok(session_id) => session_id,
        Err(e) => {
            tracing::error!(order_id = %order.order_id, error = %e, "provider rejected order");
            let order_id = order.order_id.clone();
            store
                .unit_of_work(move |tx| {
                    queries::mark_intent_failed(
                        tx,
                        &order_id,
                        ORDER_CREATE_FAILED,
                        Utc::now().naive_utc(),
                    )?;
                    Ok(())
                })
                .await?;
            return Err(AppError::PaymentProvider(e.to_string()));
        }
    };

    {
        let order_id = order.order_id.clone();
        let session_id = session_id.clone();
        store
            .unit_of_work(move |tx| {
                queries::set_payment_session_id(
                    tx,
                    &order_id,
                    &session_id,
                    Utc::now().naive_utc(),
                )?;
                Ok(())
            })
            .await?;
    }

    tracing::info!(
        order_id = %intent.order_id,
        hotel_id = %intent.hotel_id,
        amount = intent.amount,
        "payment order created"
    );

    Ok(CreatedOrder {
        order_id: intent.order_id,
        payment_session_id: session_id,
        amount: intent.amount,
        currency: intent.currency,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub order_id: String,
    pub booking_id: String,
    pub replayed: bool,
}

enum Settlement {
    Paid(Confirmation),
    Declined(String),
}

fn settled(intent: &PaymentIntent) -> Option<Settlement> {
    match intent.status {
        IntentStatus::Created => None,
        IntentStatus::Paid => intent.booking_id.as_ref().map(|booking_id| {
            Settlement::Paid(Confirmation {
                order_id: intent.order_id.clone(),
                booking_id: booking_id.clone(),
                replayed: true,
            })
        }),
        IntentStatus::Failed => Some(Settlement::Declined(
            intent.provider_status.clone().unwrap_or_default(),
        )),
    }
}

fn into_result(order_id: &str, settlement: Settlement) -> Result<Confirmation, AppError> {
    match settlement {
        Settlement::Paid(confirmation) => Ok(confirmation),
        Settlement::Declined(status) => Err(AppError::ProviderNotCompleted {
            order_id: order_id.to_string(),
            status,
        }),
    }
}

fn apply_provider_status(
    tx: &Transaction<'_>,
    order_id: &str,
    status: &ProviderOrderStatus,
) -> Result<Settlement, AppError> {
    let intent = queries::get_payment_intent(tx, order_id)?
        .ok_or_else(|| AppError::NotFound("Payment intent".to_string()))?;

    // Another reconcile may have settled it while we were talking to the provider
    if let Some(settlement) = settled(&intent) {
        return Ok(settlement);
    }

    let now = Utc::now().naive_utc();

    if !status.is_paid() {
        queries::mark_intent_failed(tx, order_id, status.as_str(), now)?;
        return Ok(Settlement::Declined(status.as_str().to_string()));
    }

    let request = BookingRequest {
        hotel_id: intent.hotel_id.clone(),
        user_id: intent.user_id.clone(),
        stay: Stay::new(intent.check_in, intent.check_out)?,
        total_cost: intent.amount,
    };
    let booking = orchestrator::book_stay(tx, &request)?;

    if !queries::mark_intent_paid(tx, order_id, &booking.id, status.as_str(), now)? {
        tracing::error!(order_id, "payment intent changed during confirmation");
        return Err(AppError::Internal("Failed to confirm payment".to_string()));
    }

    Ok(Settlement::Paid(Confirmation {
        order_id: order_id.to_string(),
        booking_id: booking.id,
        replayed: false,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<'a> {
    // The customer back from checkout; must own the intent
    Customer(&'a str),
    ProviderWebhook,
}

async fn reconcile_once(
    store: &Store,
    provider: &dyn PaymentProvider,
    order_id: &str,
    trigger: Trigger<'_>,
) -> Result<Confirmation, AppError> {
    let intent = {
        let order_id = order_id.to_string();
        store
            .read(move |conn| Ok(queries::get_payment_intent(conn, &order_id)?))
            .await?
            .ok_or_else(|| AppError::NotFound("Payment intent".to_string()))?
    };

    if let Trigger::Customer(user_id) = trigger {
        if intent.user_id != user_id {
            return Err(AppError::Forbidden(
                "This payment belongs to another user".to_string(),
            ));
        }
    }

    if let Some(settlement) = settled(&intent) {
        return into_result(order_id, settlement);
    }

    let status = provider
        .fetch_order_status(order_id)
        .await
        .map_err(|e| AppError::PaymentProvider(e.to_string()))?;

    // A webhook for a declined attempt arrives while the order can still be
    // paid; only the customer's own confirm closes an open order as failed.
    if trigger == Trigger::ProviderWebhook && status.is_open() {
        tracing::info!(
            order_id,
            provider_status = status.as_str(),
            "order still open, intent left unsettled"
        );
        return Err(AppError::ProviderNotCompleted {
            order_id: order_id.to_string(),
            status: status.as_str().to_string(),
        });
    }

    let result = {
        let order_id = order_id.to_string();
        let status = status.clone();
        store
            .unit_of_work(move |tx| apply_provider_status(tx, &order_id, &status))
            .await
    };

    match result {
        Ok(settlement) => into_result(order_id, settlement),
        Err(AppError::Conflict(msg)) => {
            // Money was taken but the nights went to someone else. The intent stays
            // `created` so it is visible as unsettled; refunding is a manual step.
            tracing::error!(
                order_id,
                amount = intent.amount,
                currency = %intent.currency,
                provider_status = status.as_str(),
                "payment captured but nights no longer available, refund required"
            );
            Err(AppError::Conflict(msg))
        }
        Err(e) => Err(e),
    }
}

pub async fn reconcile(
    store: &Store,
    provider: &dyn PaymentProvider,
    order_id: &str,
    trigger: Trigger<'_>,
    policy: RetryPolicy,
) -> Result<Confirmation, AppError> {
    let result = retry_transient(policy, AppError::is_transient, |attempt| {
        tracing::debug!(order_id, attempt, "reconciling payment");
        reconcile_once(store, provider, order_id, trigger)
    })
    .await;

    match result {
        Ok(confirmation) => {
            if !confirmation.replayed {
                tracing::info!(
                    order_id,
                    booking_id = %confirmation.booking_id,
                    "payment confirmed and booking created"
                );
            }
            Ok(confirmation)
        }
        Err(RetryError::Permanent(e)) => Err(e),
        Err(RetryError::Exhausted { attempts, last }) => {
            tracing::error!(order_id, attempts, error = %last, "failed to confirm payment");
            Err(AppError::Internal("Failed to confirm payment".to_string()))
        }
    }
}
