//! Vim literal rendering ("vimson").
//!
//! Results cross into Vim script as literals that `eval()` accepts: maps
//! render as `{'key': 'value'}`, lists as `['a', 'b']` and every scalar as a
//! single-quoted string. Inside single quotes Vim only knows one escape, a
//! doubled quote, so that is the only transformation applied to text.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Renders `value` as a Vim literal.
///
/// Map keys keep their insertion order. `null` renders as `''` and booleans
/// as `'1'`/`'0'`, matching Vim's truthiness.
pub fn to_vimson<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(value) => {
            let mut out = String::new();
            write_value(&value, &mut out);
            out
        }
        Err(err) => {
            warn!(%err, "result is not representable");
            String::from("{}")
        }
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("''"),
        Value::Bool(flag) => write_string(if *flag { "1" } else { "0" }, out),
        Value::Number(number) => write_string(&number.to_string(), out),
        Value::String(text) => write_string(text, out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_string(key, out);
                out.push_str(": ");
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(text: &str, out: &mut String) {
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_keep_insertion_order() {
        let value = json!({"type": "int", "type_kind": "Int", "canonical": {"type": "int"}});
        assert_eq!(
            to_vimson(&value),
            "{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int'}}"
        );
    }

    #[test]
    fn scalars_are_quoted() {
        let value = json!({"line": 12, "const": true, "missing": null});
        assert_eq!(to_vimson(&value), "{'line': '12', 'const': '1', 'missing': ''}");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(to_vimson(&json!(["it's", "plain"])), "['it''s', 'plain']");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(to_vimson(&json!({})), "{}");
        assert_eq!(to_vimson(&Vec::<String>::new()), "[]");
    }
}
