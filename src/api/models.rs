use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct LedStatusResponse {
    pub status: bool,
}

#[derive(Debug, Serialize)]
pub struct SetLedResponse {
    pub success: bool,
    /// Echo of the `status` value as it was sent.
    pub status: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Loose truthiness for the `status` field: `false`, `null`, zero, and empty
/// strings, arrays or objects are off.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
