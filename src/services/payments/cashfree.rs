use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use super::{OrderRequest, PaymentProvider, ProviderOrderStatus};
use crate::config::AppConfig;

pub struct CashfreeProvider {
    base_url: String,
    app_id: String,
    secret_key: String,
    api_version: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    payment_session_id: Option<String>,
}

#[derive(Deserialize)]
struct FetchOrderResponse {
    order_status: Option<String>,
}

impl CashfreeProvider {
    pub fn new(base_url: String, app_id: String, secret_key: String, api_version: String) -> Self {
        Self {
            base_url,
            app_id,
            secret_key,
            api_version,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.cashfree_env.base_url().to_string(),
            config.cashfree_app_id.clone(),
            config.cashfree_secret_key.clone(),
            config.cashfree_api_version.clone(),
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret_key)
            .header("x-api-version", &self.api_version)
    }
}

#[async_trait]
impl PaymentProvider for CashfreeProvider {
    async fn create_order(&self, order: &OrderRequest) -> anyhow::Result<String> {
        let body = json!({
            "order_id": order.order_id,
            "order_amount": order.amount,
            "order_currency": order.currency,
            "customer_details": {
                "customer_id": order.customer.id,
                "customer_phone": order.customer.phone,
            },
            "order_meta": {
                "return_url": order.return_url,
            },
        });

        let resp = self
            .request(reqwest::Method::POST, "/orders")
            .json(&body)
            .send()
            .await
            .context("failed to call Cashfree create order")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("Cashfree create order error ({status}): {detail}");
        }

        let data: CreateOrderResponse = resp
            .json()
            .await
            .context("failed to parse Cashfree order response")?;

        data.payment_session_id
            .ok_or_else(|| anyhow::anyhow!("missing payment_session_id in Cashfree response"))
    }

    async fn fetch_order_status(&self, order_id: &str) -> anyhow::Result<ProviderOrderStatus> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/orders/{order_id}"))
            .send()
            .await
            .context("failed to call Cashfree fetch order")?
            .error_for_status()
            .context("Cashfree fetch order returned error")?;

        let data: FetchOrderResponse = resp
            .json()
            .await
            .context("failed to parse Cashfree order status")?;

        Ok(ProviderOrderStatus(data.order_status.unwrap_or_default()))
    }
}

pub fn verify_webhook_signature(
    secret_key: &str,
    timestamp: &str,
    raw_body: &[u8],
    signature: &str,
) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret_key.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(raw_body);

    mac.verify_slice(&expected).is_ok()
}
