//! Action request bodies.
//!
//! The API takes actions as `POST` bodies of the form
//! `{"action": "...", "resource": {...}}` for one resource or
//! `{"action": "...", "resources": [...]}` for several.

use serde_json::{Map, Value, json};

/// Builds an action request body.
///
/// With hrefs, `resources` holds one copy of `data` per href with the
/// `href` key set. Without hrefs, present `data` goes under `resources` when
/// it is an array and under `resource` otherwise.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use vmdb_api_spec::gen_request;
///
/// let body = gen_request("start", None, &["/api/vms/1", "/api/vms/2"]);
/// assert_eq!(
///     body,
///     json!({
///         "action": "start",
///         "resources": [{"href": "/api/vms/1"}, {"href": "/api/vms/2"}]
///     })
/// );
/// ```
pub fn gen_request<H: AsRef<str>>(action: &str, data: Option<Value>, hrefs: &[H]) -> Value {
    let mut request = json!({ "action": action });

    if !hrefs.is_empty() {
        let template = match data {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let resources: Vec<Value> = hrefs
            .iter()
            .map(|href| {
                let mut resource = template.clone();
                resource.insert("href".to_string(), json!(href.as_ref()));
                Value::Object(resource)
            })
            .collect();
        request["resources"] = Value::Array(resources);
    } else if let Some(data) = data.filter(is_present) {
        let key = if data.is_array() { "resources" } else { "resource" };
        request[key] = data;
    }

    request
}

/// Returns false for null, false, and empty strings, arrays and objects.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}
