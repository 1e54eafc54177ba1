//! The analytics payload returned by the dashboard endpoint and the view derived from it.

use crate::clock::Clock;
use crate::model::coerce::{lenient, lenient_list};
use crate::model::amount::group_en_in;
use crate::model::payments::{aggregate_payments, PaymentCard, PaymentCategoryTotals};
use crate::model::series::{normalize_series, NormalizedSeriesPoint, RawSeriesPoint};
use crate::model::Amount;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How many recent orders and payment transactions the view keeps.
pub const RECENT_LIMIT: usize = 6;

/// Placeholder for a KPI that the payload did not include.
const MISSING: &str = "--";

/// The analytics object for a date range. Every field is optional, and a field with an unexpected
/// shape decodes as absent rather than failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardPayload {
    #[serde(deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub products_sold: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub new_customer_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub average_order_value: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub user_summary: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub product_summary: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub order_summary: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub revenue_summary: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub order_sale_graph: Option<Vec<RawSeriesPoint>>,
    #[serde(deserialize_with = "lenient")]
    pub order_payment_summary: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub top_customers: Option<TopCustomers>,
    #[serde(deserialize_with = "lenient_list")]
    pub recent_orders: Vec<OrderShort>,
    #[serde(deserialize_with = "lenient_list")]
    pub top_selling_products: Vec<ProductShort>,
    #[serde(deserialize_with = "lenient_list")]
    pub recent_payment_transactions: Vec<PaymentTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopCustomers {
    #[serde(deserialize_with = "lenient_list")]
    pub by_spending: Vec<CustomerShort>,
    #[serde(deserialize_with = "lenient_list")]
    pub by_orders: Vec<CustomerShort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerShort {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub total_orders: Option<f64>,
    #[serde(default)]
    pub total_spent: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductShort {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "sellingPrice")]
    pub selling_price: Option<Amount>,
    #[serde(default)]
    pub stock: Option<f64>,
    #[serde(default)]
    pub total_quantity_sold: Option<f64>,
    #[serde(default)]
    pub revenue_generated: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderShort {
    pub id: i64,
    pub total_amount: Amount,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub item_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default, rename = "paidAt")]
    pub paid_at: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// A headline number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub title: String,
    pub value: String,
}

/// A titled list of `key: value` lines built from one of the summary maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBox {
    pub title: String,
    /// `None` when the payload did not include this summary.
    pub lines: Option<Vec<String>>,
}

/// Everything the dashboard shows, derived from one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub kpis: Vec<Kpi>,
    pub series: Vec<NormalizedSeriesPoint>,
    pub payments: Option<PaymentCategoryTotals>,
    /// `None` when the payload has no payment summary.
    pub payment_card: Option<PaymentCard>,
    pub summaries: Vec<SummaryBox>,
    pub recent_orders: Vec<OrderShort>,
    pub recent_payment_transactions: Vec<PaymentTransaction>,
    pub top_selling_products: Vec<ProductShort>,
    pub top_customers: TopCustomers,
}

impl DashboardView {
    /// Derives the view. The payload is only read.
    pub fn build<C>(payload: &DashboardPayload, clock: &C) -> Self
    where
        C: Clock + ?Sized,
    {
        let graph = payload.order_sale_graph.as_deref().unwrap_or_default();
        let payments = aggregate_payments(payload.order_payment_summary.as_ref());
        Self {
            kpis: kpis(payload),
            series: normalize_series(graph, clock),
            payment_card: payments.as_ref().map(PaymentCategoryTotals::card),
            payments,
            summaries: vec![
                summary_box("Product summary", payload.product_summary.as_ref()),
                summary_box("Order summary", payload.order_summary.as_ref()),
                summary_box("User summary", payload.user_summary.as_ref()),
            ],
            recent_orders: recent(&payload.recent_orders),
            recent_payment_transactions: recent(&payload.recent_payment_transactions),
            top_selling_products: payload.top_selling_products.clone(),
            top_customers: payload.top_customers.clone().unwrap_or_default(),
        }
    }

    /// Sum of the sales series.
    pub fn series_total(&self) -> f64 {
        self.series.iter().map(|p| p.total).sum()
    }
}

fn kpis(payload: &DashboardPayload) -> Vec<Kpi> {
    let revenue = payload
        .revenue_summary
        .as_ref()
        .and_then(|s| s.get("total_revenue"))
        .filter(|v| !v.is_null())
        .map(|v| Amount::from_value(v).to_string());
    vec![
        kpi("Products sold", payload.products_sold.map(format_count)),
        kpi("New customers", payload.new_customer_count.map(format_count)),
        kpi(
            "Avg. order value",
            payload.average_order_value.map(|v| v.to_string()),
        ),
        kpi("Total revenue", revenue),
    ]
}

fn kpi(title: &str, value: Option<String>) -> Kpi {
    Kpi {
        title: title.to_string(),
        value: value.unwrap_or_else(|| MISSING.to_string()),
    }
}

/// Formats a count with `en-IN` separators and without decimals when it is whole.
pub fn format_count(n: f64) -> String {
    let formatted = group_en_in(&format_num::format_num!(".2f", n));
    match formatted.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}

fn summary_box(title: &str, data: Option<&BTreeMap<String, Value>>) -> SummaryBox {
    SummaryBox {
        title: title.to_string(),
        lines: data.map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    format!("{}: {v}", k.replace('_', " "))
                })
                .collect()
        }),
    }
}

fn recent<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().take(RECENT_LIMIT).cloned().collect()
}
