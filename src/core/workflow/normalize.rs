//! n8n answers in several envelopes depending on how the "Respond to Webhook" node
//! is configured. Everything here reduces those to a single JSON object or `None`.

use serde_json::{Map, Value};

/// Nested string envelopes deeper than this are treated as garbage.
const MAX_STRING_DEPTH: usize = 3;

/// Parses a raw response body. Accepts plain JSON, JSON with a stray leading `=`
/// (an n8n expression artefact) and JSON strings that themselves contain JSON.
pub fn parse_body(raw: &str) -> Option<Value> {
    parse_body_at(raw, 0)
}

fn parse_body_at(raw: &str, depth: usize) -> Option<Value> {
    if depth > MAX_STRING_DEPTH {
        return None;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = serde_json::from_str::<Value>(trimmed).ok().or_else(|| {
        trimmed
            .strip_prefix('=')
            .and_then(|rest| serde_json::from_str::<Value>(rest.trim()).ok())
    })?;

    match value {
        Value::String(inner) => parse_body_at(&inner, depth + 1),
        other => Some(other),
    }
}

/// Reduces a parsed body to the logical response object.
///
/// Shapes: `{..}`, `[{..}]`, `[{"json": {..}}]`, or a string holding any of those.
/// Anything else (numbers, empty arrays, `null`, unparseable text) is `None`.
pub fn normalize(value: Value) -> Option<Map<String, Value>> {
    normalize_at(value, 0)
}

fn normalize_at(value: Value, depth: usize) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => match items.into_iter().next()? {
            Value::Object(mut first) => match first.remove("json") {
                Some(Value::Object(inner)) => Some(inner),
                Some(other) => {
                    first.insert("json".to_string(), other);
                    Some(first)
                }
                None => Some(first),
            },
            Value::String(s) if depth < MAX_STRING_DEPTH => {
                normalize_at(parse_body(&s)?, depth + 1)
            }
            _ => None,
        },
        Value::String(s) if depth < MAX_STRING_DEPTH => normalize_at(parse_body(&s)?, depth + 1),
        _ => None,
    }
}

/// `parse_body` followed by `normalize`.
pub fn normalize_body(raw: &str) -> Option<Map<String, Value>> {
    parse_body(raw).and_then(normalize)
}

/// Reads a field as trimmed text. Numbers and booleans are stringified; blanks are `None`.
pub fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Interprets the `ok` marker. n8n sometimes sends it as `"true"` or `1`.
pub fn ok_flag(map: &Map<String, Value>) -> Option<bool> {
    match map.get("ok")? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// Extracts the workflow's error message from `error` (string or `{message}`) or `message`.
pub fn error_message(map: &Map<String, Value>) -> Option<String> {
    match map.get("error") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
        Some(Value::Object(inner)) => {
            if let Some(msg) = text_field(inner, "message") {
                return Some(msg);
            }
        }
        _ => {}
    }
    text_field(map, "message")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expected() -> Map<String, Value> {
        json!({ "ok": true, "approval_token": "tok-123" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn every_envelope_reduces_to_the_same_object() {
        let bodies = [
            r#"{"ok":true,"approval_token":"tok-123"}"#,
            r#"[{"json":{"ok":true,"approval_token":"tok-123"}}]"#,
            r#"[{"ok":true,"approval_token":"tok-123"}]"#,
            r#""{\"ok\":true,\"approval_token\":\"tok-123\"}""#,
            r#"={"ok":true,"approval_token":"tok-123"}"#,
            r#""={\"ok\":true,\"approval_token\":\"tok-123\"}""#,
            "  \n{\"ok\":true,\"approval_token\":\"tok-123\"}\n",
        ];
        for body in bodies {
            assert_eq!(normalize_body(body), Some(expected()), "body: {}", body);
        }
    }

    #[test]
    fn string_value_is_parsed_after_decode() {
        let value = Value::String(r#"[{"json":{"ok":true,"approval_token":"tok-123"}}]"#.into());
        assert_eq!(normalize(value), Some(expected()));
    }

    #[test]
    fn garbage_is_no_data() {
        for body in ["", "   ", "<html>Bad Gateway</html>", "=", "null", "42", "[]", "[1]"] {
            assert_eq!(normalize_body(body), None, "body: {:?}", body);
        }
    }

    #[test]
    fn explicit_error_envelope_is_still_an_object() {
        let map = normalize_body(r#"{"ok":false,"error":"quota exceeded"}"#).unwrap();
        assert_eq!(ok_flag(&map), Some(false));
        assert_eq!(error_message(&map).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn non_object_json_payload_is_kept_beside_json_key() {
        let map = normalize_body(r#"[{"json":"oops","ok":true}]"#).unwrap();
        assert_eq!(map.get("json"), Some(&json!("oops")));
        assert_eq!(ok_flag(&map), Some(true));
    }

    #[test]
    fn text_field_handles_numbers_and_blanks() {
        let map = json!({ "a": "  x ", "b": 7, "c": "   ", "d": null })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(text_field(&map, "a").as_deref(), Some("x"));
        assert_eq!(text_field(&map, "b").as_deref(), Some("7"));
        assert_eq!(text_field(&map, "c"), None);
        assert_eq!(text_field(&map, "d"), None);
        assert_eq!(text_field(&map, "missing"), None);
    }

    #[test]
    fn ok_flag_accepts_loose_forms() {
        let map = |v: Value| json!({ "ok": v }).as_object().cloned().unwrap();
        assert_eq!(ok_flag(&map(json!("true"))), Some(true));
        assert_eq!(ok_flag(&map(json!(0))), Some(false));
        assert_eq!(ok_flag(&map(json!("maybe"))), None);
        assert_eq!(ok_flag(&Map::new()), None);
    }

    #[test]
    fn error_message_reads_nested_message() {
        let map = json!({ "error": { "message": "token expired" } })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(error_message(&map).as_deref(), Some("token expired"));
    }
}
