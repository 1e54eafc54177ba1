//! Decoding of response bodies. The storefront API wraps payloads inconsistently: sometimes under
//! `data`, sometimes under `result`, sometimes not at all. This is the one place that deals with
//! that; everything past it works with the unwrapped payload.

use anyhow::bail;
use serde_json::{Map, Value};

const LIST_KEYS: &[&str] = &["result", "data", "orders", "results", "payload"];
const NESTED_LIST_KEYS: &[&str] = &["results", "orders"];
const TOTAL_KEYS: &[&str] = &["total", "count", "total_count"];

/// A response body, which the server does not always send as JSON.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    Json(Value),
    Text(String),
}

impl Body {
    /// Keeps `text` as text when it does not parse as JSON.
    pub(crate) fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(text),
        }
    }

    pub(crate) fn json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }
}

/// Where the payload of a body was found.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Envelope {
    Data(Map<String, Value>),
    Result(Map<String, Value>),
    Bare(Map<String, Value>),
}

impl Envelope {
    /// Picks `data`, then `result`, then the body itself. The payload must be an object.
    pub(crate) fn decode(body: &Body) -> crate::Result<Self> {
        let Some(Value::Object(outer)) = body.json() else {
            bail!("Unexpected API payload shape: the response is not a JSON object");
        };
        let (payload, wrap): (&Value, fn(Map<String, Value>) -> Envelope) =
            if let Some(data) = outer.get("data") {
                (data, Envelope::Data)
            } else if let Some(result) = outer.get("result") {
                (result, Envelope::Result)
            } else {
                return Ok(Envelope::Bare(outer.clone()));
            };
        match payload {
            Value::Object(map) => Ok(wrap(map.clone())),
            other => bail!(
                "Unexpected API payload shape: expected an object but found {}",
                kind(other)
            ),
        }
    }

    pub(crate) fn into_payload(self) -> Map<String, Value> {
        match self {
            Envelope::Data(map) | Envelope::Result(map) | Envelope::Bare(map) => map,
        }
    }
}

/// Finds the list in a paginated response: a bare array, the first array among the usual keys, or
/// `data.results` / `data.orders`. Anything else is an empty list.
pub(crate) fn extract_list(body: &Body) -> Vec<Value> {
    match body.json() {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .or_else(|| {
                let data = map.get("data")?.as_object()?;
                NESTED_LIST_KEYS
                    .iter()
                    .find_map(|key| data.get(*key).and_then(Value::as_array))
            })
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// The total item count of a paginated response, from the first numeric `total`, `count` or
/// `total_count`.
pub(crate) fn extract_total(body: &Body) -> Option<u64> {
    let map = body.json()?.as_object()?;
    TOTAL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_f64))
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Body {
        Body::Json(value)
    }

    #[test]
    fn test_decode_precedence() {
        let e = Envelope::decode(&body(json!({"data": {"a": 1}, "result": {"b": 2}}))).unwrap();
        assert_eq!(e, Envelope::Data(json!({"a": 1}).as_object().unwrap().clone()));

        let e = Envelope::decode(&body(json!({"result": {"b": 2}}))).unwrap();
        assert!(matches!(e, Envelope::Result(_)));

        let e = Envelope::decode(&body(json!({"products_sold": 3}))).unwrap();
        assert_eq!(e.into_payload().get("products_sold"), Some(&json!(3)));
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        let err = Envelope::decode(&body(json!({"data": [1, 2]}))).unwrap_err();
        assert!(err.to_string().contains("Unexpected API payload shape"));
        assert!(err.to_string().contains("an array"));
        assert!(Envelope::decode(&body(json!([1]))).is_err());
        assert!(Envelope::decode(&body(json!({"data": null}))).is_err());
        assert!(Envelope::decode(&Body::parse("<html>".to_string())).is_err());
    }

    #[test]
    fn test_extract_list() {
        assert_eq!(extract_list(&body(json!([1, 2]))).len(), 2);
        assert_eq!(extract_list(&body(json!({"orders": [1]}))).len(), 1);
        assert_eq!(
            extract_list(&body(json!({"data": {"results": [1, 2, 3]}}))).len(),
            3
        );
        // `data` that is an array wins over `orders`
        assert_eq!(
            extract_list(&body(json!({"data": [1], "orders": [1, 2]}))).len(),
            1
        );
        assert!(extract_list(&body(json!({"data": {"x": 1}}))).is_empty());
        assert!(extract_list(&Body::Text("oops".to_string())).is_empty());
    }

    #[test]
    fn test_extract_total() {
        assert_eq!(extract_total(&body(json!({"total": 40}))), Some(40));
        assert_eq!(extract_total(&body(json!({"total": "40", "count": 7}))), Some(7));
        assert_eq!(extract_total(&body(json!({"total_count": 3}))), Some(3));
        assert_eq!(extract_total(&body(json!([1]))), None);
    }

    #[test]
    fn test_body_parse() {
        assert_eq!(Body::parse("{\"a\":1}".to_string()), body(json!({"a": 1})));
        assert_eq!(
            Body::parse("not json".to_string()),
            Body::Text("not json".to_string())
        );
    }
}
