//! URL-query encoder (spec §4.2).

use crate::error::Error;
use crate::params::ParamItem;
use serde_json::Value;

/// Render `items` as a `k=v&k=v` query string, in declaration order.
///
/// Scalar rendering:
/// - `null` -> empty string
/// - `bool` -> `1` / `0`
/// - `integer`/`double` -> shortest unambiguous decimal
/// - `string` -> percent-encoded over the RFC 3986 `unreserved` set
/// - `object`/`array` -> JSON text, then percent-encoded
pub fn encode(items: &[ParamItem]) -> Result<String, Error> {
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        let rendered = render_scalar(item.value())?;
        pairs.push(format!("{}={}", percent_encode(item.key()), rendered));
    }
    Ok(pairs.join("&"))
}

fn render_scalar(value: &Value) -> Result<String, Error> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => percent_encode(s),
        Value::Object(_) | Value::Array(_) => {
            let text = serde_json::to_string(value)
                .map_err(|e| Error::encoding(format!("failed to render nested value: {e}")))?;
            percent_encode(&text)
        }
    })
}

fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bools_render_as_integer_literals() {
        let items = vec![ParamItem::scalar("flag", json!(true))];
        assert_eq!(encode(&items).unwrap(), "flag=1");
        let items = vec![ParamItem::scalar("flag", json!(false))];
        assert_eq!(encode(&items).unwrap(), "flag=0");
    }

    #[test]
    fn null_renders_empty() {
        let items = vec![ParamItem::scalar("x", Value::Null)];
        assert_eq!(encode(&items).unwrap(), "x=");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        let items = vec![ParamItem::scalar("n", json!(3))];
        assert_eq!(encode(&items).unwrap(), "n=3");
        let items = vec![ParamItem::scalar("n", json!(3.5))];
        assert_eq!(encode(&items).unwrap(), "n=3.5");
    }

    #[test]
    fn strings_are_percent_encoded() {
        let items = vec![ParamItem::scalar("q", json!("a b/c"))];
        assert_eq!(encode(&items).unwrap(), "q=a%20b%2Fc");
    }

    #[test]
    fn order_is_preserved() {
        let items = vec![
            ParamItem::scalar("b", json!(1)),
            ParamItem::scalar("a", json!(2)),
        ];
        assert_eq!(encode(&items).unwrap(), "b=1&a=2");
    }

    #[test]
    fn nested_object_is_json_then_percent_encoded() {
        let items = vec![ParamItem::nested("obj", json!({"k": "v"}))];
        let encoded = encode(&items).unwrap();
        assert!(encoded.starts_with("obj="));
        let (_, v) = encoded.split_once('=').unwrap();
        let decoded = urlencoding::decode(v).unwrap();
        assert_eq!(decoded, r#"{"k":"v"}"#);
    }

    proptest::proptest! {
        #[test]
        fn percent_decoding_a_string_scalar_recovers_the_original(s in ".{0,40}") {
            let items = vec![ParamItem::scalar("q", json!(s.clone()))];
            let encoded = encode(&items).unwrap();
            let (_, v) = encoded.split_once('=').unwrap();
            let decoded = urlencoding::decode(v).unwrap();
            proptest::prop_assert_eq!(decoded, s);
        }

        #[test]
        fn key_order_is_always_preserved(
            keys in proptest::collection::vec("[a-z]{1,6}", 1..8),
        ) {
            let items: Vec<ParamItem> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| ParamItem::scalar(k.clone(), json!(i)))
                .collect();
            let encoded = encode(&items).unwrap();
            let encoded_keys: Vec<&str> = encoded.split('&').map(|pair| pair.split('=').next().unwrap()).collect();
            let expected: Vec<String> = keys.iter().map(|k| percent_encode(k)).collect();
            proptest::prop_assert_eq!(encoded_keys, expected);
        }
    }
}
