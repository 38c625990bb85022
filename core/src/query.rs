//! Nested form encoding for request arguments.
//!
//! The Blesta API reads arguments the way PHP's `http_build_query` writes
//! them: nested objects and arrays are flattened into bracketed keys
//! (`vars[first_name]=Jane`, `ids[0]=4`), booleans become `1` / `0` and
//! `null` entries are dropped. The same encoding is used for the query
//! string of `GET` requests and for form bodies of every other verb.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Encode `args` as `application/x-www-form-urlencoded` text.
///
/// Keys are emitted in the map's iteration order, which is insertion order.
pub fn encode(args: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in args {
        flatten(key.clone(), value, &mut pairs);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}
