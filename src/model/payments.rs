//! Breaks the estimated payment total of a dashboard payload down by settlement method.

use crate::model::{coerce, Amount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TOTAL_KEYS: &[&str] = &["total_payment_estimate", "total"];
const ONLINE_KEY: &str = "online_payment_amount";
const CASH_ON_DELIVERY_KEY: &str = "cash_on_delivery_payment_amount";
const NOT_DONE_KEY: &str = "payment_not_done_amount";

/// Shown in place of the categories when there is nothing to chart.
const NEUTRAL_SLICE_NAME: &str = "No data";
const NEUTRAL_SLICE_COLOR: &str = "#e5e7eb";

const CARD_TITLE: &str = "Order Payment Distribution Amount";

/// The four settlement categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentCategoryKey {
    Online,
    CashOnDelivery,
    NotDone,
    Other,
}

impl PaymentCategoryKey {
    pub const ALL: [PaymentCategoryKey; 4] = [
        PaymentCategoryKey::Online,
        PaymentCategoryKey::CashOnDelivery,
        PaymentCategoryKey::NotDone,
        PaymentCategoryKey::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaymentCategoryKey::Online => "Online Payment",
            PaymentCategoryKey::CashOnDelivery => "COD Payment",
            PaymentCategoryKey::NotDone => "Payment Not Done",
            PaymentCategoryKey::Other => "Other",
        }
    }

    pub fn color_token(self) -> &'static str {
        match self {
            PaymentCategoryKey::Online => "#22c55e",
            PaymentCategoryKey::CashOnDelivery => "#f59e0b",
            PaymentCategoryKey::NotDone => "#6b7280",
            PaymentCategoryKey::Other => "#4f46e5",
        }
    }
}

/// One entry of the breakdown. `amount` is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCategory {
    pub key: PaymentCategoryKey,
    pub name: String,
    pub amount: f64,
    pub color_token: String,
}

impl PaymentCategory {
    fn new(key: PaymentCategoryKey, amount: f64) -> Self {
        Self {
            key,
            name: key.name().to_string(),
            amount,
            color_token: key.color_token().to_string(),
        }
    }
}

/// A slice of a proportional (donut or pie) chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color_token: String,
}

/// The payment breakdown. All four categories are always present, in `PaymentCategoryKey::ALL`
/// order, so that a legend is stable even when some amounts are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCategoryTotals {
    /// The estimated total as reported by the API.
    pub total: f64,
    pub categories: [PaymentCategory; 4],
}

impl PaymentCategoryTotals {
    pub fn get(&self, key: PaymentCategoryKey) -> &PaymentCategory {
        // categories are stored in ALL order
        &self.categories[key as usize]
    }

    pub fn amount(&self, key: PaymentCategoryKey) -> f64 {
        self.get(key).amount
    }

    /// Slices for a donut chart. When the total is not positive a single neutral slice is
    /// returned so that the ring still renders.
    pub fn pie_slices(&self) -> Vec<PieSlice> {
        if self.total > 0.0 {
            self.categories
                .iter()
                .map(|c| PieSlice {
                    name: c.name.clone(),
                    value: c.amount,
                    color_token: c.color_token.clone(),
                })
                .collect()
        } else {
            vec![PieSlice {
                name: NEUTRAL_SLICE_NAME.to_string(),
                value: 1.0,
                color_token: NEUTRAL_SLICE_COLOR.to_string(),
            }]
        }
    }
}

/// A legend row. Every category gets one, including those with a zero amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub key: PaymentCategoryKey,
    pub name: String,
    pub color_token: String,
    pub amount: String,
}

/// The payment card of the dashboard: the formatted total, the donut slices and the legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCard {
    pub title: String,
    pub total: String,
    pub slices: Vec<PieSlice>,
    pub legend: Vec<LegendEntry>,
}

impl PaymentCategoryTotals {
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.categories
            .iter()
            .map(|c| LegendEntry {
                key: c.key,
                name: c.name.clone(),
                color_token: c.color_token.clone(),
                amount: Amount::from_f64(c.amount).to_string(),
            })
            .collect()
    }

    pub fn card(&self) -> PaymentCard {
        PaymentCard {
            title: CARD_TITLE.to_string(),
            total: Amount::from_f64(self.total).to_string(),
            slices: self.pie_slices(),
            legend: self.legend(),
        }
    }
}

/// Builds the breakdown from `order_payment_summary`. Returns `None` only when the summary itself
/// is absent; missing or non-numeric fields count as zero.
///
/// `other` is whatever part of the total the named categories do not account for, clamped at
/// zero when the named categories add up to more than the total.
pub fn aggregate_payments(summary: Option<&Map<String, Value>>) -> Option<PaymentCategoryTotals> {
    let summary = summary?;
    let total = coerce::number_opt(coerce::first_present(summary, TOTAL_KEYS));
    let online = non_negative(coerce::number_opt(summary.get(ONLINE_KEY)));
    let cash_on_delivery = non_negative(coerce::number_opt(summary.get(CASH_ON_DELIVERY_KEY)));
    let not_done = non_negative(coerce::number_opt(summary.get(NOT_DONE_KEY)));
    let other = non_negative(total - (online + cash_on_delivery + not_done));

    Some(PaymentCategoryTotals {
        total,
        categories: [
            PaymentCategory::new(PaymentCategoryKey::Online, online),
            PaymentCategory::new(PaymentCategoryKey::CashOnDelivery, cash_on_delivery),
            PaymentCategory::new(PaymentCategoryKey::NotDone, not_done),
            PaymentCategory::new(PaymentCategoryKey::Other, other),
        ],
    })
}

fn non_negative(n: f64) -> f64 {
    n.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aggregate(value: Value) -> Option<PaymentCategoryTotals> {
        aggregate_payments(value.as_object())
    }

    #[test]
    fn test_other_is_remainder() {
        let totals = aggregate(json!({
            "total": 100,
            "online_payment_amount": 40,
            "cash_on_delivery_payment_amount": 30,
            "payment_not_done_amount": 10
        }))
        .unwrap();
        assert_eq!(totals.total, 100.0);
        assert_eq!(totals.amount(PaymentCategoryKey::Online), 40.0);
        assert_eq!(totals.amount(PaymentCategoryKey::CashOnDelivery), 30.0);
        assert_eq!(totals.amount(PaymentCategoryKey::NotDone), 10.0);
        assert_eq!(totals.amount(PaymentCategoryKey::Other), 20.0);
    }

    #[test]
    fn test_other_is_clamped() {
        let totals = aggregate(json!({
            "total": 50,
            "online_payment_amount": 40,
            "cash_on_delivery_payment_amount": 30,
            "payment_not_done_amount": 10
        }))
        .unwrap();
        assert_eq!(totals.amount(PaymentCategoryKey::Other), 0.0);
    }

    #[test]
    fn test_card_with_positive_total() {
        let totals = aggregate(json!({
            "total_payment_estimate": 252840,
            "online_payment_amount": 151200,
            "cash_on_delivery_payment_amount": 74400,
            "payment_not_done_amount": 12040
        }))
        .unwrap();
        let card = totals.card();
        assert_eq!(card.title, "Order Payment Distribution Amount");
        assert_eq!(card.total, "₹2,52,840.00");
        assert_eq!(card.slices.len(), 4);
        assert_eq!(card.slices[3].value, 15200.0);
        assert_eq!(card.legend.len(), 4);
        assert_eq!(card.legend[0].name, "Online Payment");
        assert_eq!(card.legend[0].amount, "₹1,51,200.00");
        assert_eq!(card.legend[3].color_token, "#4f46e5");
    }

    #[test]
    fn test_card_with_zero_total_has_neutral_ring() {
        let card = aggregate(json!({"total": 0})).unwrap().card();
        assert_eq!(card.total, "₹0.00");
        assert_eq!(card.slices.len(), 1);
        assert_eq!(card.slices[0].name, "No data");
        assert_eq!(card.slices[0].color_token, "#e5e7eb");
        // the legend still lists every category
        assert_eq!(card.legend.len(), 4);
        assert!(card.legend.iter().all(|e| e.amount == "₹0.00"));
    }

    #[test]
    fn test_absent_summary_is_none() {
        assert!(aggregate_payments(None).is_none());
    }

    #[test]
    fn test_empty_summary_has_four_zero_categories() {
        let totals = aggregate(json!({})).unwrap();
        assert_eq!(totals.total, 0.0);
        assert_eq!(totals.categories.len(), 4);
        for (category, key) in totals.categories.iter().zip(PaymentCategoryKey::ALL) {
            assert_eq!(category.key, key);
            assert_eq!(category.amount, 0.0);
        }
    }

    #[test]
    fn test_estimate_preferred_over_total() {
        let totals = aggregate(json!({
            "total_payment_estimate": "250.5",
            "total": 10,
            "online_payment_amount": "50.5"
        }))
        .unwrap();
        assert_eq!(totals.total, 250.5);
        assert_eq!(totals.amount(PaymentCategoryKey::Other), 200.0);

        let totals = aggregate(json!({"total_payment_estimate": null, "total": 10})).unwrap();
        assert_eq!(totals.total, 10.0);

        // present but unusable does not fall through to `total`
        let totals = aggregate(json!({"total_payment_estimate": "abc", "total": 10})).unwrap();
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_negative_categories_are_clamped() {
        let totals = aggregate(json!({
            "total": 100,
            "online_payment_amount": -40,
            "cash_on_delivery_payment_amount": 30
        }))
        .unwrap();
        assert_eq!(totals.amount(PaymentCategoryKey::Online), 0.0);
        assert_eq!(totals.amount(PaymentCategoryKey::Other), 70.0);
        assert!(totals.categories.iter().all(|c| c.amount >= 0.0));
    }

    #[test]
    fn test_pie_slices() {
        let totals = aggregate(json!({"total": 10, "online_payment_amount": 10})).unwrap();
        let slices = totals.pie_slices();
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0].name, "Online Payment");
        assert_eq!(slices[0].color_token, "#22c55e");

        let empty = aggregate(json!({})).unwrap();
        let slices = empty.pie_slices();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, "No data");
        // the legend still has all four
        assert_eq!(empty.categories.len(), 4);
    }

    #[test]
    fn test_serialized_shape() {
        let totals = aggregate(json!({"total": 1})).unwrap();
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["categories"][1]["key"], "cashOnDelivery");
        assert_eq!(json["categories"][3]["colorToken"], "#4f46e5");
    }
}
