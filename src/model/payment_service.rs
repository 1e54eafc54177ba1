//! Payment gateway settings, keyed by service key (for example `razorpay`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The settings of one payment service. Every field is optional because the server omits what is
/// not set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_key_secret: Option<String>,
}

impl PaymentService {
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }

    /// Copies every field that is set in `edit` over this service.
    pub fn merge(&mut self, edit: &PaymentServiceEdit) {
        fn set<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *field = Some(v.clone());
            }
        }
        set(&mut self.name, &edit.name);
        set(&mut self.url, &edit.url);
        set(&mut self.is_active, &edit.is_active);
        set(&mut self.start_date, &edit.start_date);
        set(&mut self.end_date, &edit.end_date);
        set(&mut self.razorpay_key_id, &edit.razorpay_key_id);
        set(&mut self.razorpay_key_secret, &edit.razorpay_key_secret);
    }
}

/// A service together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentServiceRow {
    pub key: String,
    pub service: PaymentService,
}

/// The fields an administrator may change. Unset fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentServiceEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razorpay_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razorpay_key_secret: Option<String>,
}

impl PaymentServiceEdit {
    pub fn is_empty(&self) -> bool {
        self == &PaymentServiceEdit::default()
    }

    /// The PATCH body: `service_key` plus the fields being changed.
    pub fn request_body(&self, key: &str) -> Value {
        let mut body = Map::new();
        body.insert("service_key".to_string(), Value::String(key.to_string()));
        if let Ok(Value::Object(fields)) = serde_json::to_value(self) {
            body.extend(fields);
        }
        Value::Object(body)
    }
}

/// Reads the rows out of a response body's `payment_services` object. Entries that are not
/// objects become empty services; a missing or malformed map yields no rows.
pub fn rows_from_body(body: &Value) -> Vec<PaymentServiceRow> {
    let Some(services) = body.get("payment_services").and_then(Value::as_object) else {
        return Vec::new();
    };
    services
        .iter()
        .map(|(key, value)| PaymentServiceRow {
            key: key.clone(),
            service: serde_json::from_value(value.clone()).unwrap_or_default(),
        })
        .collect()
}

/// The updated service for `key` if the response echoes one.
pub fn echoed_service(body: &Value, key: &str) -> Option<PaymentService> {
    let value = body.get("payment_services")?.get(key)?;
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_body() {
        let body = json!({
            "payment_services": {
                "razorpay": {"id": 1, "name": "Razorpay", "is_active": true, "url": null},
                "broken": "nope"
            }
        });
        let rows = rows_from_body(&body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "broken");
        assert_eq!(rows[0].service, PaymentService::default());
        assert_eq!(rows[1].service.name.as_deref(), Some("Razorpay"));
        assert!(rows[1].service.is_active());

        assert!(rows_from_body(&json!({})).is_empty());
        assert!(rows_from_body(&json!({"payment_services": []})).is_empty());
    }

    #[test]
    fn test_merge() {
        let mut service = PaymentService {
            name: Some("Old".to_string()),
            url: Some("https://old".to_string()),
            ..PaymentService::default()
        };
        let edit = PaymentServiceEdit {
            name: Some("New".to_string()),
            is_active: Some(true),
            ..PaymentServiceEdit::default()
        };
        service.merge(&edit);
        assert_eq!(service.name.as_deref(), Some("New"));
        assert_eq!(service.url.as_deref(), Some("https://old"));
        assert!(service.is_active());
    }

    #[test]
    fn test_request_body() {
        let edit = PaymentServiceEdit {
            is_active: Some(false),
            ..PaymentServiceEdit::default()
        };
        assert_eq!(
            edit.request_body("razorpay"),
            json!({"service_key": "razorpay", "is_active": false})
        );
        assert!(PaymentServiceEdit::default().is_empty());
        assert!(!edit.is_empty());
    }

    #[test]
    fn test_echoed_service() {
        let body = json!({"payment_services": {"razorpay": {"name": "R"}}});
        assert_eq!(
            echoed_service(&body, "razorpay").unwrap().name.as_deref(),
            Some("R")
        );
        assert!(echoed_service(&body, "stripe").is_none());
        assert!(echoed_service(&json!({"ok": true}), "razorpay").is_none());
    }
}
