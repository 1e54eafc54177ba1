//! The client side of the storefront REST API.
//!
//! Everything that talks to the server goes through the `Api` trait. `HttpApi` implements it with
//! `reqwest`; `TestApi` implements it in memory so that the whole program can run without a
//! server. Which one is used is decided by `Mode`.

mod auth;
mod envelope;
mod files;
mod http;
mod test_api;

use crate::model::{
    DashboardPayload, DateRange, OrderPage, OrderStatus, PaymentService, PaymentServiceEdit,
    PaymentServiceRow, Profile,
};
use crate::{Config, Result};
use serde_json::{json, Value};

pub use auth::{sanitize_token, token_preview, AuthScheme, Credential};
pub(crate) use files::{CredentialsFile, File};
pub(crate) use http::HttpApi;
pub use test_api::{TestApi, TestState, TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN};

/// The environment variable that switches the program into test mode.
pub const TEST_MODE_ENV: &str = "SHOPDASH_IN_TEST_MODE";

/// The message used whenever a command needs a token and there is none.
pub(crate) const NOT_LOGGED_IN: &str = "You are not logged in, run 'shopdash login' first";

/// Whether to talk to the real server or to the in-memory one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    /// `Mode::Test` when `SHOPDASH_IN_TEST_MODE` is set and not empty, otherwise `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// The operations the dashboard performs against the storefront API. Everything except `login`
/// needs a credential.
#[async_trait::async_trait]
pub trait Api: Send + Sync {
    /// Exchanges an email and password for a token.
    async fn login(&self, email: &str, password: &str) -> Result<String>;

    /// Fetches the analytics payload for a date range.
    async fn dashboard(&self, request: &DashboardRequest) -> Result<DashboardPayload>;

    /// Fetches one page of orders.
    async fn orders(&self, request: &OrdersRequest) -> Result<OrderPage>;

    async fn update_order_status(&self, id: &str, status: &OrderStatus) -> Result<()>;

    async fn payment_services(&self) -> Result<Vec<PaymentServiceRow>>;

    /// Sends an edit for the service stored under `key`. Returns the updated service when the
    /// server echoes it back.
    async fn update_payment_service(
        &self,
        key: &str,
        edit: &PaymentServiceEdit,
    ) -> Result<Option<PaymentService>>;

    async fn profile(&self) -> Result<Profile>;

    /// Saves `profile` and returns what the server stored.
    async fn update_profile(&self, profile: &Profile) -> Result<Profile>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardRequest {
    pub range: DateRange,
    pub user_id: Option<i64>,
}

impl DashboardRequest {
    pub(crate) fn body(&self) -> Value {
        let mut body = json!({
            "start_date": self.range.start().to_string(),
            "end_date": self.range.end().to_string(),
        });
        if let (Some(user_id), Some(map)) = (self.user_id, body.as_object_mut()) {
            map.insert("user_id".to_string(), json!(user_id));
        }
        body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdersRequest {
    pub range: DateRange,
    pub page: u32,
    pub page_size: u32,
}

impl OrdersRequest {
    pub(crate) fn body(&self) -> Value {
        json!({
            "start_date": self.range.start().to_string(),
            "end_date": self.range.end().to_string(),
            "page": self.page,
            "page_size": self.page_size,
        })
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", self.range.start().to_string()),
            ("end_date", self.range.end().to_string()),
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }
}

/// Creates the `Api` implementation for `mode`.
pub fn api(config: &Config, mode: Mode, credential: Option<Credential>) -> Result<Box<dyn Api>> {
    Ok(match mode {
        Mode::Http => Box::new(HttpApi::new(
            config.api_url().clone(),
            config.request_timeout(),
            credential,
        )?),
        Mode::Test => Box::new(TestApi::new(config.api_url().as_str(), credential)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::new("2024-01-01".parse().unwrap(), "2024-01-31".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_dashboard_body() {
        let request = DashboardRequest {
            range: range(),
            user_id: None,
        };
        assert_eq!(
            request.body(),
            json!({"start_date": "2024-01-01", "end_date": "2024-01-31"})
        );
        let request = DashboardRequest {
            user_id: Some(4),
            ..request
        };
        assert_eq!(request.body()["user_id"], 4);
    }

    #[test]
    fn test_orders_body_and_query() {
        let request = OrdersRequest {
            range: range(),
            page: 2,
            page_size: 25,
        };
        assert_eq!(request.body()["page_size"], 25);
        assert_eq!(request.query()[2], ("page", "2".to_string()));
    }
}
