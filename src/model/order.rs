//! Orders as the orders endpoint returns them, and the page-level helpers the orders view needs:
//! status filtering, status counts, totals, grouping by day and CSV export.
//!
//! The API is not consistent about field names, so an `Order` keeps the raw JSON object and reads
//! each field through a list of aliases. Unknown fields are kept so that an export contains
//! everything the server sent.

use crate::model::series::{self, RawDate};
use crate::model::{coerce, Amount, DateRange};
use anyhow::Context;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::str::FromStr;

const ID_KEYS: &[&str] = &["id", "_id", "orderId"];
const DATE_KEYS: &[&str] = &["createdAt", "created_at", "orderDate", "date"];
const STATUS_KEYS: &[&str] = &["status", "order_status"];
const AMOUNT_KEYS: &[&str] = &["finalAmount", "totalAmount", "subtotal", "total", "amount"];
const ITEM_KEYS: &[&str] = &["items", "orderItems", "products"];
const ADDRESS_KEYS: &[&str] = &["billingAddress", "billing_address", "shippingAddress"];

/// Shown for an order that has no id or no status.
pub const PLACEHOLDER: &str = "—";

/// A single order. Serializes back to exactly the object it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(Map<String, Value>);

impl Order {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `None` when `value` is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn id(&self) -> Option<String> {
        coerce::first_present(&self.0, ID_KEYS).and_then(coerce::text)
    }

    pub fn status(&self) -> OrderStatus {
        coerce::first_present(&self.0, STATUS_KEYS)
            .and_then(coerce::text)
            .map(|s| OrderStatus::from(s.as_str()))
            .unwrap_or_else(|| OrderStatus::Other(PLACEHOLDER.to_string()))
    }

    /// Writes the new status under both status keys.
    pub fn set_status(&mut self, status: &OrderStatus) {
        for key in STATUS_KEYS {
            self.0
                .insert(key.to_string(), Value::String(status.to_string()));
        }
    }

    pub fn amount(&self) -> Amount {
        coerce::first_present(&self.0, AMOUNT_KEYS)
            .map(Amount::from_value)
            .unwrap_or_default()
    }

    pub fn item_count(&self) -> usize {
        match coerce::first_present(&self.0, ITEM_KEYS) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    pub fn billing_address(&self) -> Option<&Value> {
        coerce::first_present(&self.0, ADDRESS_KEYS)
    }

    /// When the order was placed, in epoch milliseconds, if its date can be read.
    pub fn created_at(&self) -> Option<i64> {
        let raw = coerce::first_present(&self.0, DATE_KEYS)
            .map(RawDate::from)
            .unwrap_or_default();
        series::resolve(&raw)
    }

    /// The UTC calendar day the order was placed on, or `today` when its date is missing or
    /// unreadable.
    pub fn day(&self, today: NaiveDate) -> NaiveDate {
        self.created_at()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive())
            .unwrap_or(today)
    }
}

/// The statuses the dashboard knows about. Anything else the server sends is kept, upper-cased,
/// as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Other(String),
}

impl OrderStatus {
    pub const KNOWN: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        OrderStatus::KNOWN
            .into_iter()
            .find(|known| known.as_str() == upper)
            .unwrap_or(OrderStatus::Other(upper))
    }
}

impl FromStr for OrderStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OrderStatus::from(s))
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(OrderStatus::from(s.as_str()))
    }
}

/// Which orders to show. `ALL` (in any case) keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => &order.status() == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            Ok(StatusFilter::Only(OrderStatus::from(s)))
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => f.write_str("ALL"),
            StatusFilter::Only(status) => Display::fmt(status, f),
        }
    }
}

/// One page of orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// The total number of orders across all pages, as reported by the server, or the length of
    /// this page when the server did not say.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl OrderPage {
    pub fn filter(&self, filter: &StatusFilter) -> Vec<&Order> {
        self.orders.iter().filter(|o| filter.matches(o)).collect()
    }

    /// The number of pages, at least one.
    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.page_size.max(1));
        self.total.div_ceil(size).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Counts for the status filter: `ALL` first, then every known status (zero when absent), then any
/// other statuses in the order they were first seen.
pub fn status_counts<'a, I>(orders: I) -> Vec<StatusCount>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut counts: Vec<StatusCount> = std::iter::once("ALL".to_string())
        .chain(OrderStatus::KNOWN.iter().map(|s| s.to_string()))
        .map(|status| StatusCount { status, count: 0 })
        .collect();
    for order in orders {
        counts[0].count += 1;
        let status = order.status().to_string();
        match counts.iter_mut().skip(1).find(|c| c.status == status) {
            Some(entry) => entry.count += 1,
            None => counts.push(StatusCount { status, count: 1 }),
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub count: usize,
    pub amount: Amount,
}

pub fn totals<'a, I>(orders: I) -> OrderTotals
where
    I: IntoIterator<Item = &'a Order>,
{
    orders
        .into_iter()
        .fold(OrderTotals::default(), |acc, order| OrderTotals {
            count: acc.count + 1,
            amount: acc.amount + order.amount(),
        })
}

/// The orders placed on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub orders: Vec<Order>,
}

/// Groups orders by the day they were placed. Days are newest first, and so are the orders within
/// a day. Orders without a readable date land on `today` and sort last within it.
pub fn group_by_day<'a, I>(orders: I, today: NaiveDate) -> Vec<DayGroup>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut days: BTreeMap<NaiveDate, Vec<Order>> = BTreeMap::new();
    for order in orders {
        days.entry(order.day(today)).or_default().push(order.clone());
    }
    days.into_iter()
        .rev()
        .map(|(day, mut orders)| {
            orders.sort_by_key(|o| std::cmp::Reverse(o.created_at().unwrap_or(0)));
            DayGroup { day, orders }
        })
        .collect()
}

/// Writes `orders` as CSV. The header is every key that appears in any order, in the order first
/// seen. Objects and arrays are written as JSON, `null` as an empty cell, and every cell is quoted.
/// Nothing is written when there are no orders.
pub fn export_csv<W: Write>(orders: &[Order], writer: W) -> crate::Result<()> {
    if orders.is_empty() {
        return Ok(());
    }
    let mut header: Vec<&str> = Vec::new();
    for order in orders {
        for key in order.fields().keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }

    let mut csv = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);
    csv.write_record(&header)
        .context("Unable to write the CSV header")?;
    for order in orders {
        let row = header
            .iter()
            .map(|key| order.fields().get(*key).map(csv_cell).unwrap_or_default());
        csv.write_record(row).context("Unable to write a CSV row")?;
    }
    csv.flush().context("Unable to flush the CSV writer")?;
    Ok(())
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The file name used when exporting a page without an explicit path.
pub fn export_file_name(page: u32, range: &DateRange) -> String {
    format!(
        "orders_page_{page}_{}_to_{}.csv",
        range.start(),
        range.end()
    )
}
