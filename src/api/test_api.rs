//! Implements the `Api` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a storefront server. The state of each fake server is keyed by its
//! base URL and lives for the whole process, so that separate `TestApi` objects pointed at the same
//! URL see each other's changes, the way two requests to a real server would.

use crate::api::envelope::{Body, Envelope};
use crate::api::{sanitize_token, Api, Credential, DashboardRequest, OrdersRequest, NOT_LOGGED_IN};
use crate::model::{
    DashboardPayload, Order, OrderPage, OrderStatus, PaymentService, PaymentServiceEdit,
    PaymentServiceRow, Profile,
};
use crate::Result;
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Days, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock, PoisonError};

pub const TEST_EMAIL: &str = "admin@example.com";
pub const TEST_PASSWORD: &str = "password";
pub const TEST_TOKEN: &str = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b";

static SERVERS: OnceLock<Mutex<HashMap<String, TestState>>> = OnceLock::new();

/// Everything a fake server holds.
#[derive(Debug, Clone, PartialEq)]
pub struct TestState {
    /// The analytics payload returned for any range, before it is wrapped in `data`.
    pub dashboard: Value,
    pub orders: Vec<Order>,
    pub payment_services: BTreeMap<String, PaymentService>,
    pub profile: Profile,
}

impl TestState {
    /// Seed data with dates relative to `now`.
    pub fn seed(now: DateTime<Utc>) -> Self {
        Self {
            dashboard: seed_dashboard(now),
            orders: seed_orders(now),
            payment_services: seed_payment_services(),
            profile: seed_profile(),
        }
    }
}

/// An implementation of the `Api` trait that does not use the network.
pub struct TestApi {
    base: String,
    credential: Option<Credential>,
}

impl TestApi {
    /// Create a `TestApi` for the fake server at `base`, seeding it if this is the first use.
    pub fn new(base: impl Into<String>, credential: Option<Credential>) -> Self {
        let base = base.into();
        servers()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(base.clone())
            .or_insert_with(|| TestState::seed(Utc::now()));
        Self { base, credential }
    }

    /// A copy of the fake server's current state.
    pub fn get_state(&self) -> TestState {
        self.with_state(|state| state.clone())
    }

    /// Replaces the fake server's state.
    pub fn set_state(&self, state: TestState) {
        self.with_state(|current| *current = state)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestState) -> T) -> T {
        let mut servers = servers().lock().unwrap_or_else(PoisonError::into_inner);
        let state = servers
            .entry(self.base.clone())
            .or_insert_with(|| TestState::seed(Utc::now()));
        f(state)
    }

    /// Fails the way the server does for a missing or wrong token.
    fn check_credential(&self) -> Result<()> {
        let credential = self.credential.as_ref().context(NOT_LOGGED_IN)?;
        let header = credential.header_value();
        let token = header
            .split_whitespace()
            .last()
            .map(sanitize_token)
            .unwrap_or_default();
        ensure!(token == TEST_TOKEN, "API 401 Unauthorized: invalid token");
        Ok(())
    }
}

fn servers() -> &'static Mutex<HashMap<String, TestState>> {
    SERVERS.get_or_init(|| Mutex::new(HashMap::new()))
}

#[async_trait::async_trait]
impl Api for TestApi {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        if email.trim().eq_ignore_ascii_case(TEST_EMAIL) && password == TEST_PASSWORD {
            Ok(TEST_TOKEN.to_string())
        } else {
            bail!("Login failed: API 401 Unauthorized: invalid email or password")
        }
    }

    async fn dashboard(&self, _request: &DashboardRequest) -> Result<DashboardPayload> {
        self.check_credential()?;
        let body = Body::Json(json!({ "data": self.with_state(|s| s.dashboard.clone()) }));
        let payload = Envelope::decode(&body)?.into_payload();
        serde_json::from_value(Value::Object(payload))
            .context("Unable to decode the dashboard payload")
    }

    async fn orders(&self, request: &OrdersRequest) -> Result<OrderPage> {
        self.check_credential()?;
        let in_range: Vec<Order> = self.with_state(|s| {
            s.orders
                .iter()
                .filter(|o| {
                    o.created_at()
                        .and_then(DateTime::from_timestamp_millis)
                        .map(|dt| {
                            let day = dt.date_naive();
                            day >= request.range.start() && day <= request.range.end()
                        })
                        .unwrap_or(false)
                })
                .cloned()
                .collect()
        });
        let page_size = request.page_size.max(1) as usize;
        let skip = (request.page.max(1) as usize - 1) * page_size;
        Ok(OrderPage {
            total: in_range.len() as u64,
            orders: in_range.into_iter().skip(skip).take(page_size).collect(),
            page: request.page,
            page_size: request.page_size,
        })
    }

    async fn update_order_status(&self, id: &str, status: &OrderStatus) -> Result<()> {
        self.check_credential()?;
        self.with_state(|s| -> Result<()> {
            let order = s
                .orders
                .iter_mut()
                .find(|o| o.id().as_deref() == Some(id))
                .with_context(|| format!("API 404 Not Found: no order with id {id}"))?;
            order.set_status(status);
            Ok(())
        })
    }

    async fn payment_services(&self) -> Result<Vec<PaymentServiceRow>> {
        self.check_credential()?;
        Ok(self.with_state(|s| {
            s.payment_services
                .iter()
                .map(|(key, service)| PaymentServiceRow {
                    key: key.clone(),
                    service: service.clone(),
                })
                .collect()
        }))
    }

    async fn update_payment_service(
        &self,
        key: &str,
        edit: &PaymentServiceEdit,
    ) -> Result<Option<PaymentService>> {
        self.check_credential()?;
        self.with_state(|s| -> Result<Option<PaymentService>> {
            let service = s
                .payment_services
                .get_mut(key)
                .with_context(|| format!("API 404 Not Found: no payment service '{key}'"))?;
            service.merge(edit);
            service.updated_by = Some(TEST_EMAIL.to_string());
            Ok(Some(service.clone()))
        })
    }

    async fn profile(&self) -> Result<Profile> {
        self.check_credential()?;
        Ok(self.with_state(|s| s.profile.clone()))
    }

    async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        self.check_credential()?;
        Ok(self.with_state(|s| {
            s.profile = profile.clone();
            s.profile.clone()
        }))
    }
}

fn days_ago(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    now.checked_sub_days(Days::new(days)).unwrap_or(now)
}

fn seed_dashboard(now: DateTime<Utc>) -> Value {
    let date = |days: u64| days_ago(now, days).date_naive().to_string();
    let epoch_seconds = |days: u64| days_ago(now, days).timestamp();
    json!({
        "message": "Dashboard data fetched successfully",
        "products_sold": 1284,
        "new_customer_count": 37,
        "average_order_value": 1245.5,
        "user_summary": {"total_users": 512, "active_users": 301},
        "product_summary": {"total_products": 86, "out_of_stock": 4},
        "order_summary": {"total_orders": 203, "pending_orders": 18, "delivered_orders": 160},
        "revenue_summary": {"total_revenue": "₹2,52,840.00"},
        "order_sale_graph": [
            {"date": date(6), "total": 12400},
            {"date": epoch_seconds(5), "total": "9800"},
            {"date": "", "total": 4100},
            {"date": date(3), "total": 15250.5},
            {"date": format!("{}T10:30:00Z", date(2)), "total": 8800},
            {"date": date(1), "total": null},
            {"date": date(0), "total": 6120}
        ],
        "order_payment_summary": {
            "total_payment_estimate": 252840,
            "online_payment_amount": 151200,
            "cash_on_delivery_payment_amount": 74400,
            "payment_not_done_amount": 12040
        },
        "top_customers": {
            "by_spending": [
                {"id": 11, "name": "Priya Sharma", "email": "priya@example.com", "total_orders": 9, "total_spent": 38250}
            ],
            "by_orders": [
                {"id": 12, "name": "Rahul Verma", "total_orders": 14, "total_spent": "21,400.00"}
            ]
        },
        "recent_orders": [
            {"id": 1001, "total_amount": 2499, "status": "PENDING", "created_at": date(0), "customer_name": "Priya Sharma", "item_count": 2},
            {"id": 1000, "total_amount": "899.00", "status": "DELIVERED", "created_at": date(1), "customer_name": "Rahul Verma", "item_count": 1}
        ],
        "top_selling_products": [
            {"id": 7, "name": "Matte Lipstick", "sellingPrice": 499, "stock": 120, "total_quantity_sold": 310, "revenue_generated": 154690}
        ],
        "recent_payment_transactions": [
            {"id": 501, "method": "RAZORPAY", "status": "SUCCESS", "transactionId": "pay_QX81", "amount": 2499, "paidAt": date(0), "customer_name": "Priya Sharma"}
        ]
    })
}

fn seed_orders(now: DateTime<Utc>) -> Vec<Order> {
    let at = |days: u64| days_ago(now, days).to_rfc3339();
    [
        json!({"id": 1001, "status": "PENDING", "finalAmount": 2499, "createdAt": at(0), "items": [{"sku": "LIP-01", "qty": 2}], "billingAddress": {"city": "Pune"}}),
        json!({"id": 1000, "status": "DELIVERED", "totalAmount": "₹899.00", "createdAt": at(1), "items": [{"sku": "KJL-02", "qty": 1}]}),
        json!({"id": 999, "order_status": "shipped", "total": 1520, "created_at": at(1), "orderItems": [{"sku": "SRM-03"}, {"sku": "TNR-04"}]}),
        json!({"_id": "998", "status": "CANCELLED", "amount": "450", "orderDate": at(3)}),
        json!({"id": 997, "status": "PROCESSING", "subtotal": 3120.75, "date": at(10), "products": []}),
    ]
    .into_iter()
    .filter_map(Order::from_value)
    .collect()
}

fn seed_payment_services() -> BTreeMap<String, PaymentService> {
    let razorpay = PaymentService {
        id: Some(1),
        name: Some("Razorpay".to_string()),
        url: Some("https://api.razorpay.com".to_string()),
        is_active: Some(true),
        created_by: Some(TEST_EMAIL.to_string()),
        razorpay_key_id: Some("rzp_test_1DP5mmOlF5G5ag".to_string()),
        razorpay_key_secret: Some("thisisnotarealsecret".to_string()),
        ..PaymentService::default()
    };
    let cod = PaymentService {
        id: Some(2),
        name: Some("Cash on delivery".to_string()),
        is_active: Some(false),
        ..PaymentService::default()
    };
    BTreeMap::from([("razorpay".to_string(), razorpay), ("cod".to_string(), cod)])
}

fn seed_profile() -> Profile {
    Profile {
        id: Some(1),
        email: Some(TEST_EMAIL.to_string()),
        role: Some("ADMIN".to_string()),
        bio: Some("Store administrator".to_string()),
        first_name: Some("Asha".to_string()),
        last_name: Some("Kulkarni".to_string()),
        ..Profile::default()
    }
}
