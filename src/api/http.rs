//! Implements the `Api` trait over HTTP with `reqwest`.

use crate::api::envelope::{self, Body, Envelope};
use crate::api::{Api, Credential, DashboardRequest, OrdersRequest, NOT_LOGGED_IN};
use crate::model::{
    payment_service, DashboardPayload, Order, OrderPage, OrderStatus, PaymentService,
    PaymentServiceEdit, PaymentServiceRow, Profile,
};
use crate::utils::truncate;
use crate::Result;
use anyhow::{anyhow, bail, Context};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

/// How much of an error body to include in an error message.
const ERROR_BODY_CHARS: usize = 400;

const LOGIN: &[&str] = &["auth", "login"];
const DASHBOARD: &[&str] = &["user", "dashboard"];
const ORDERS: &[&str] = &["order", "user-order"];
const PAYMENT_SERVICE: &[&str] = &["payment-service"];
const PROFILE: &[&str] = &["user", "details"];

pub(crate) struct HttpApi {
    client: reqwest::Client,
    base: Url,
    credential: Option<Credential>,
}

impl HttpApi {
    pub(crate) fn new(base: Url, timeout: Duration, credential: Option<Credential>) -> Result<Self> {
        if base.cannot_be_a_base() {
            bail!("The API URL '{base}' cannot be used as a base URL");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            base,
            credential,
        })
    }

    /// Appends `segments` to the base URL's path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("The API URL '{}' cannot be used as a base URL", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Starts a request that carries the `Authorization` header.
    fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let credential = self.credential.as_ref().context(NOT_LOGGED_IN)?;
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, credential.header_value()))
    }

    /// Sends `request` and reads the whole body, whatever the status.
    async fn send(&self, request: RequestBuilder) -> Result<Reply> {
        let request = request.build().context("Unable to build the request")?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{method} {url}");
        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("{method} {url} failed"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Unable to read the response body of {method} {url}"))?;
        trace!("{method} {url} returned {status}: {}", truncate(&text, ERROR_BODY_CHARS));
        Ok(Reply {
            status,
            body: Body::parse(text),
        })
    }

    /// Sends `request` and fails on a non-success status.
    async fn send_ok(&self, request: RequestBuilder) -> Result<Body> {
        let reply = self.send(request).await?;
        if !reply.status.is_success() {
            bail!("{reply}");
        }
        Ok(reply.body)
    }
}

/// A status and body.
struct Reply {
    status: StatusCode,
    body: Body,
}

impl Reply {
    fn body_text(&self) -> String {
        let text = match &self.body {
            Body::Text(s) if s.is_empty() => "(no body)".to_string(),
            Body::Text(s) => s.clone(),
            Body::Json(v) => v.to_string(),
        };
        truncate(&text, ERROR_BODY_CHARS)
    }
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "API {}: {}", self.status, self.body_text())
    }
}

#[async_trait::async_trait]
impl Api for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = self.endpoint(LOGIN)?;
        let request = self
            .client
            .post(url)
            .json(&json!({"email": email, "password": password}));
        let body = self.send_ok(request).await.context("Login failed")?;
        body.json()
            .and_then(|v| v.get("token"))
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .context("No token received from server.")
    }

    async fn dashboard(&self, request: &DashboardRequest) -> Result<DashboardPayload> {
        let url = self.endpoint(DASHBOARD)?;
        let builder = self.authorized(Method::POST, url)?.json(&request.body());
        let body = self
            .send_ok(builder)
            .await
            .with_context(|| format!("Unable to fetch the dashboard for {}", request.range))?;
        let payload = Envelope::decode(&body)?.into_payload();
        serde_json::from_value(Value::Object(payload))
            .context("Unable to decode the dashboard payload")
    }

    async fn orders(&self, request: &OrdersRequest) -> Result<OrderPage> {
        let url = self.endpoint(ORDERS)?;
        let post = self
            .authorized(Method::POST, url.clone())?
            .json(&request.body());
        let post_reply = self.send(post).await?;
        let body = if post_reply.status.is_success() {
            post_reply.body
        } else {
            warn!(
                "POST for orders returned {}, retrying as GET",
                post_reply.status
            );
            let get = self
                .authorized(Method::GET, url)?
                .query(&request.query());
            let get_reply = self.send(get).await?;
            if !get_reply.status.is_success() {
                bail!(
                    "Unable to fetch orders. POST {}: {} / GET {}: {}",
                    post_reply.status,
                    post_reply.body_text(),
                    get_reply.status,
                    get_reply.body_text()
                );
            }
            get_reply.body
        };

        let orders: Vec<Order> = envelope::extract_list(&body)
            .into_iter()
            .filter_map(Order::from_value)
            .collect();
        let total = envelope::extract_total(&body).unwrap_or(orders.len() as u64);
        Ok(OrderPage {
            orders,
            total,
            page: request.page,
            page_size: request.page_size,
        })
    }

    async fn update_order_status(&self, id: &str, status: &OrderStatus) -> Result<()> {
        let body = json!({ "status": status });
        let candidates: [(Method, Vec<&str>); 4] = [
            (Method::PATCH, vec![id]),
            (Method::PATCH, vec!["update-status"]),
            (Method::PATCH, vec!["status", id]),
            (Method::POST, vec![id, "status"]),
        ];
        let mut failures = Vec::new();
        for (method, tail) in candidates {
            let mut segments: Vec<&str> = ORDERS.to_vec();
            segments.extend(tail);
            let url = self.endpoint(&segments)?;
            let request = self.authorized(method.clone(), url.clone())?.json(&body);
            match self.send(request).await {
                Ok(reply) if reply.status.is_success() => {
                    debug!("Order {id} set to {status} with {method} {url}");
                    return Ok(());
                }
                Ok(reply) => failures.push(format!("{method} {url}: {reply}")),
                Err(e) => failures.push(format!("{method} {url}: {e:#}")),
            }
        }
        bail!(
            "Unable to update order {id} to {status}:\n{}",
            failures.join("\n")
        )
    }

    async fn payment_services(&self) -> Result<Vec<PaymentServiceRow>> {
        let url = self.endpoint(PAYMENT_SERVICE)?;
        let body = self
            .send_ok(self.authorized(Method::GET, url)?)
            .await
            .context("Unable to fetch payment services")?;
        Ok(body
            .json()
            .map(payment_service::rows_from_body)
            .unwrap_or_default())
    }

    async fn update_payment_service(
        &self,
        key: &str,
        edit: &PaymentServiceEdit,
    ) -> Result<Option<PaymentService>> {
        let url = self.endpoint(PAYMENT_SERVICE)?;
        let request = self
            .authorized(Method::PATCH, url)?
            .json(&edit.request_body(key));
        let body = self
            .send_ok(request)
            .await
            .with_context(|| format!("Unable to update payment service '{key}'"))?;
        Ok(body
            .json()
            .and_then(|v| payment_service::echoed_service(v, key)))
    }

    async fn profile(&self) -> Result<Profile> {
        let url = self.endpoint(PROFILE)?;
        let body = self
            .send_ok(self.authorized(Method::GET, url)?)
            .await
            .context("Unable to fetch the profile")?;
        decode_profile(&body)
    }

    async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        let url = self.endpoint(PROFILE)?;
        let request = self.authorized(Method::PATCH, url)?.json(profile);
        let body = self
            .send_ok(request)
            .await
            .context("Unable to save the profile")?;
        decode_profile(&body)
    }
}

fn decode_profile(body: &Body) -> Result<Profile> {
    let payload = Envelope::decode(body)?.into_payload();
    serde_json::from_value(Value::Object(payload)).context("Unable to decode the profile")
}
