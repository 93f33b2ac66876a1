//! JSON-body encoder (spec §4.2).

use crate::params::ParamItem;
use serde_json::{Map, Value};

/// Build a canonical JSON object from `items`. Duplicate keys: last write
/// wins. Bools are encoded as JSON booleans (unlike the query encoder).
pub fn encode(items: &[ParamItem]) -> Value {
    let mut map = Map::with_capacity(items.len());
    for item in items {
        map.insert(item.key().to_string(), item.value().clone());
    }
    Value::Object(map)
}

/// Serialize the encoded object to UTF-8 bytes.
pub fn encode_bytes(items: &[ParamItem]) -> Result<Vec<u8>, crate::error::Error> {
    serde_json::to_vec(&encode(items))
        .map_err(|e| crate::error::Error::encoding(format!("failed to serialize body: {e}")))
}
