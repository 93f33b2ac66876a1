//! XPath-style JSON response projector (spec §4.7).
//!
//! Path grammar: slash-separated keys (`a/b/c`). Empty segments and
//! leading/trailing slashes are ignored. A segment that parses as an
//! unsigned integer indexes into an array (`items/0/name`).

use crate::error::Error;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Type tag a projection is checked against at its terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Integer,
    Double,
    Bool,
    Object,
    Array,
    /// No type check is performed.
    Any,
}

/// One path-projection request.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub path: String,
    pub ty: TypeTag,
    pub optional: bool,
}

impl ParseConfig {
    pub fn required(path: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            path: path.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(path: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            path: path.into(),
            ty,
            optional: true,
        }
    }
}

/// The typed value extracted at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Projected {
    String(String),
    Integer(i64),
    Double(f64),
    Bool(bool),
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Any(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .map(|seg| match seg.parse::<usize>() {
            Ok(idx) => Segment::Index(idx),
            Err(_) => Segment::Key(seg),
        })
        .collect()
}

fn traverse<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in parse_path(path) {
        cur = match (seg, cur) {
            (Segment::Key(k), Value::Object(map)) => map.get(k)?,
            (Segment::Index(i), Value::Array(arr)) => arr.get(i)?,
            _ => return None,
        };
    }
    Some(cur)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_and_project(value: &Value, ty: TypeTag) -> Option<Projected> {
    match ty {
        TypeTag::Any => Some(Projected::Any(value.clone())),
        TypeTag::String => value.as_str().map(|s| Projected::String(s.to_string())),
        TypeTag::Integer => value.as_i64().map(Projected::Integer),
        TypeTag::Double => value.as_f64().map(Projected::Double),
        TypeTag::Bool => value.as_bool().map(Projected::Bool),
        TypeTag::Object => value.as_object().map(|m| Projected::Object(m.clone())),
        TypeTag::Array => value.as_array().map(|a| Projected::Array(a.clone())),
    }
}

/// Run one projection against a decoded root.
///
/// `Ok(None)` means an optional projection found nothing (missing path or
/// type mismatch); `Ok(Some(_))` is a successful extraction. A required
/// projection that fails returns `Err` with the corresponding code.
pub fn project(root: &Value, config: &ParseConfig) -> Result<Option<Projected>, Error> {
    let Some(value) = traverse(root, &config.path) else {
        return if config.optional {
            Ok(None)
        } else {
            Err(Error::xpath_missing(config.path.clone()))
        };
    };
    match check_and_project(value, config.ty) {
        Some(projected) => Ok(Some(projected)),
        None => {
            if config.optional {
                Ok(None)
            } else {
                let expected = format!("{:?}", config.ty);
                Err(Error::xpath_type_mismatch(
                    config.path.clone(),
                    &expected,
                    type_name(value),
                ))
            }
        }
    }
}

/// Run `configs` against a single decoded root. A required projection's
/// failure aborts the whole parse; optional misses are simply absent from
/// the result map.
pub fn parse_response(
    root: &Value,
    configs: &[ParseConfig],
) -> Result<HashMap<String, Projected>, Error> {
    let mut out = HashMap::with_capacity(configs.len());
    for config in configs {
        if let Some(value) = project(root, config)? {
            out.insert(config.path.clone(), value);
        }
    }
    Ok(out)
}
