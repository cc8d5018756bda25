use std::env;

use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CashfreeEnv {
    Sandbox,
    Production,
}

impl CashfreeEnv {
    pub fn base_url(&self) -> &'static str {
        match self {
            CashfreeEnv::Sandbox => "https://sandbox.cashfree.com/pg",
            CashfreeEnv::Production => "https://api.cashfree.com/pg",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub cashfree_env: CashfreeEnv,
    pub cashfree_app_id: String,
    pub cashfree_secret_key: String,
    pub cashfree_api_version: String,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub currency: String,
    pub confirm_max_attempts: usize,
    pub confirm_backoff_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let mut allowed_origins = vec![frontend_url.clone()];
        if let Ok(extra) = env::var("ALLOWED_ORIGINS") {
            allowed_origins.extend(
                extra
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty()),
            );
        }

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "urbanstay.db".to_string()),
            jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or_else(|_| "changeme".to_string()),
            cashfree_env: match env::var("CASHFREE_ENV").as_deref() {
                Ok("PRODUCTION") => CashfreeEnv::Production,
                _ => CashfreeEnv::Sandbox,
            },
            cashfree_app_id: env::var("CASHFREE_APP_ID").unwrap_or_default(),
            cashfree_secret_key: env::var("CASHFREE_SECRET_KEY").unwrap_or_default(),
            cashfree_api_version: env::var("CASHFREE_API_VERSION")
                .unwrap_or_else(|_| "2023-08-01".to_string()),
            frontend_url,
            allowed_origins,
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            confirm_max_attempts: env::var("CONFIRM_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(3),
            confirm_backoff_ms: env::var("CONFIRM_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::Config("JWT_SECRET_KEY must not be empty".to_string()));
        }
        if self.cashfree_env == CashfreeEnv::Production
            && (self.cashfree_app_id.is_empty() || self.cashfree_secret_key.is_empty())
        {
            return Err(AppError::Config(
                "CASHFREE_APP_ID and CASHFREE_SECRET_KEY are required when CASHFREE_ENV=PRODUCTION"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn payment_return_url(&self) -> String {
        format!(
            "{}/payment-status?order_id={{order_id}}",
            self.frontend_url.trim_end_matches('/')
        )
    }
}
