/// Utility functions
use serde_json::Value;

/// Pick string value from JSON by trying multiple keys
pub fn s_pick(v: &Value, keys: &[&str]) -> Option<String> {
    for k in keys {
        if let Some(s) = v.get(*k).and_then(|x| x.as_str()) {
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

/// Best-effort error message from an upstream error body.
///
/// api.nasa.gov nests it under `error.message`, the rover API uses `errors`,
/// the media library uses `reason`.
pub fn upstream_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|e| s_pick(e, &["message"]))
        .or_else(|| s_pick(body, &["error", "msg", "reason", "errors", "message"]))
}

/// Replace every occurrence of `secret` so it never reaches a caller
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}
