//! Parameter model.
//!
//! Request parameters are either a sequence of tagged key/value [`ParamItem`]s
//! or a sequence of caller-supplied [`TypedParameter`] implementations
//! produced by a code-generation tool (out of scope here; the framework only
//! consumes the trait).

use serde_json::Value;
use std::sync::Arc;

/// A single tagged parameter item.
///
/// `Nested` and `List` are not enforced to carry an object/array at
/// construction time (serde_json::Value is untyped); encoders treat a
/// mismatched payload the same as any other value and render it as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamItem {
    Scalar(String, Value),
    Nested(String, Value),
    List(String, Value),
}

impl ParamItem {
    pub fn key(&self) -> &str {
        match self {
            ParamItem::Scalar(k, _) | ParamItem::Nested(k, _) | ParamItem::List(k, _) => k,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            ParamItem::Scalar(_, v) | ParamItem::Nested(_, v) | ParamItem::List(_, v) => v,
        }
    }

    pub fn scalar(key: impl Into<String>, value: impl Into<Value>) -> Self {
        ParamItem::Scalar(key.into(), value.into())
    }

    pub fn nested(key: impl Into<String>, value: Value) -> Self {
        ParamItem::Nested(key.into(), value)
    }

    pub fn list(key: impl Into<String>, value: Value) -> Self {
        ParamItem::List(key.into(), value)
    }
}

/// Capability implemented by code-generated, strongly-typed parameter
/// enumerations. The framework only ever consumes this trait; concrete
/// variants are user/tool-defined data constructors (spec §9).
pub trait TypedParameter: std::fmt::Debug + Send + Sync {
    fn key(&self) -> &str;
    fn value(&self) -> Value;
    /// Whether this parameter is valid given the rest of the set it is
    /// being sent with (e.g. mutually-exclusive parameter constraints).
    fn is_valid(&self, set: &[Arc<dyn TypedParameter>]) -> bool;
}

/// The parameter payload attached to a request descriptor.
#[derive(Clone)]
pub enum Parameters {
    None,
    Items(Vec<ParamItem>),
    Typed(Vec<Arc<dyn TypedParameter>>),
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::None
    }
}

impl std::fmt::Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameters::None => write!(f, "Parameters::None"),
            Parameters::Items(items) => f.debug_tuple("Parameters::Items").field(items).finish(),
            Parameters::Typed(items) => {
                let keys: Vec<&str> = items.iter().map(|p| p.key()).collect();
                write!(f, "Parameters::Typed({keys:?})")
            }
        }
    }
}

impl Parameters {
    pub fn is_empty(&self) -> bool {
        match self {
            Parameters::None => true,
            Parameters::Items(items) => items.is_empty(),
            Parameters::Typed(items) => items.is_empty(),
        }
    }

    /// Render to a flat, order-preserving sequence of (key, value) pairs,
    /// the common input both encoders consume.
    pub fn as_items(&self) -> Vec<ParamItem> {
        match self {
            Parameters::None => Vec::new(),
            Parameters::Items(items) => items.clone(),
            Parameters::Typed(items) => items
                .iter()
                .map(|p| ParamItem::Scalar(p.key().to_string(), p.value()))
                .collect(),
        }
    }

    /// All typed parameters must validate against the full set, per spec §3.
    pub fn validate_typed(&self) -> bool {
        match self {
            Parameters::Typed(items) => items.iter().all(|p| p.is_valid(items)),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysValid(&'static str, Value);
    impl TypedParameter for AlwaysValid {
        fn key(&self) -> &str {
            self.0
        }
        fn value(&self) -> Value {
            self.1.clone()
        }
        fn is_valid(&self, _set: &[Arc<dyn TypedParameter>]) -> bool {
            true
        }
    }

    #[test]
    fn typed_parameters_flatten_in_order() {
        let items: Vec<Arc<dyn TypedParameter>> = vec![
            Arc::new(AlwaysValid("a", Value::from(1))),
            Arc::new(AlwaysValid("b", Value::from(2))),
        ];
        let params = Parameters::Typed(items);
        let flat = params.as_items();
        assert_eq!(flat[0].key(), "a");
        assert_eq!(flat[1].key(), "b");
    }

    #[test]
    fn empty_by_default() {
        assert!(Parameters::default().is_empty());
    }
}
