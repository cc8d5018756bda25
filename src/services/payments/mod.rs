pub mod cashfree;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub customer: Customer,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrderStatus(pub String);

impl ProviderOrderStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self.0.as_str(), "PAID" | "COMPLETED" | "SUCCESS")
    }

    // ACTIVE: not paid yet, but the customer can still pay on the same session
    pub fn is_open(&self) -> bool {
        self.0 == "ACTIVE"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> anyhow::Result<String>;

    async fn fetch_order_status(&self, order_id: &str) -> anyhow::Result<ProviderOrderStatus>;
}
