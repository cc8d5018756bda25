use std::time::Duration;

use crate::config::AppConfig;
use crate::db::Store;
use crate::services::payments::PaymentProvider;
use crate::services::retry::RetryPolicy;

pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
    pub payments: Box<dyn PaymentProvider>,
}

impl AppState {
    pub fn confirm_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.confirm_max_attempts,
            Duration::from_millis(self.config.confirm_backoff_ms),
        )
    }
}
