//! Property kinds, values, and schemas.

use crate::errors::PropertyTypeError;
use crate::naming::attribute_to_property;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// Raw attribute strings exactly as they arrived (name -> value).
pub type RawAttributes = IndexMap<String, String>;

/// Typed property values keyed by property name.
pub type PropValues = IndexMap<String, PropValue>;

/// The kind of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl PropKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropKind::String => "string",
            PropKind::Number => "number",
            PropKind::Boolean => "boolean",
            PropKind::Array => "array",
            PropKind::Object => "object",
        }
    }
}

impl fmt::Display for PropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl PropValue {
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::String(_) => PropKind::String,
            PropValue::Number(_) => PropKind::Number,
            PropValue::Boolean(_) => PropKind::Boolean,
            PropValue::Array(_) => PropKind::Array,
            PropValue::Object(_) => PropKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            PropValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            PropValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::String(s) => f.write_str(s),
            // f64 Display already drops a zero fraction: 5.0 -> "5"
            PropValue::Number(n) => write!(f, "{}", n),
            PropValue::Boolean(b) => write!(f, "{}", b),
            PropValue::Array(items) => write!(f, "{}", Value::Array(items.clone())),
            PropValue::Object(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// One entry of a property schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropSpec {
    pub name: String,
    pub kind: PropKind,
    pub default: PropValue,
}

/// Ordered name -> kind/default table for a component's attributes.
///
/// Entries keep the order in which they were first added. Adding a name that
/// is already present is a no-op, so the first reference wins.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertySchema {
    props: IndexMap<String, PropSpec>,
}

impl PropertySchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a property. Returns false if the name was already present.
    pub fn insert(&mut self, name: &str, default: PropValue) -> bool {
        if self.props.contains_key(name) {
            return false;
        }
        self.props.insert(
            name.to_string(),
            PropSpec {
                name: name.to_string(),
                kind: default.kind(),
                default,
            },
        );
        true
    }

    /// Add a string property.
    pub fn string(mut self, name: &str, default: &str) -> Self {
        self.insert(name, PropValue::String(default.to_string()));
        self
    }

    /// Add a number property.
    pub fn number(mut self, name: &str, default: f64) -> Self {
        self.insert(name, PropValue::Number(default));
        self
    }

    /// Add a boolean property.
    pub fn boolean(mut self, name: &str, default: bool) -> Self {
        self.insert(name, PropValue::Boolean(default));
        self
    }

    /// Add an array property.
    pub fn array(mut self, name: &str, default: Vec<Value>) -> Self {
        self.insert(name, PropValue::Array(default));
        self
    }

    /// Add an object property.
    pub fn object(mut self, name: &str, default: Map<String, Value>) -> Self {
        self.insert(name, PropValue::Object(default));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropSpec> {
        self.props.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropSpec> {
        self.props.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Defaults for every property, in schema order.
    pub fn defaults(&self) -> PropValues {
        self.props
            .values()
            .map(|spec| (spec.name.clone(), spec.default.clone()))
            .collect()
    }

    /// Parse raw attributes into typed values.
    ///
    /// Attribute names are normalized (`data-count` -> `dataCount`) before lookup.
    /// Attributes with no matching property are ignored.
    pub fn parse(&self, attributes: &RawAttributes) -> Result<PropValues, PropertyTypeError> {
        let normalized: IndexMap<String, &str> = attributes
            .iter()
            .map(|(name, value)| (attribute_to_property(name), value.as_str()))
            .collect();

        let mut values = PropValues::with_capacity(self.props.len());
        for spec in self.props.values() {
            let raw = normalized.get(spec.name.as_str()).copied();
            values.insert(spec.name.clone(), parse_value(spec, raw)?);
        }
        Ok(values)
    }
}

/// Parse one raw attribute against its spec. `raw` is `None` when the attribute
/// is absent.
pub fn parse_value(spec: &PropSpec, raw: Option<&str>) -> Result<PropValue, PropertyTypeError> {
    match spec.kind {
        // Presence alone makes a boolean true, whatever the value text says.
        PropKind::Boolean => Ok(match raw {
            Some(_) => PropValue::Boolean(true),
            None => spec.default.clone(),
        }),
        PropKind::String => Ok(match raw {
            Some(text) => PropValue::String(text.to_string()),
            None => spec.default.clone(),
        }),
        PropKind::Number => match raw {
            None => Ok(spec.default.clone()),
            Some(text) => parse_number(text)
                .map(PropValue::Number)
                .ok_or_else(|| PropertyTypeError {
                    property: spec.name.clone(),
                    expected: PropKind::Number,
                    value: text.to_string(),
                }),
        },
        PropKind::Array => Ok(match raw.map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Array(items))) => PropValue::Array(items),
            _ => spec.default.clone(),
        }),
        PropKind::Object => Ok(match raw.map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Object(map))) => PropValue::Object(map),
            _ => spec.default.clone(),
        }),
    }
}

/// Parse numeric attribute text. Only finite numbers are accepted.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, &str)]) -> RawAttributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn counter_schema() -> PropertySchema {
        PropertySchema::new()
            .number("step", 1.0)
            .string("label", "Count")
            .boolean("disabled", false)
            .array("items", vec![])
            .object("meta", Map::new())
    }

    #[test]
    fn test_schema_keeps_first_reference() {
        let schema = PropertySchema::new().number("step", 1.0).string("step", "x");
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("step").unwrap().kind, PropKind::Number);
    }

    #[test]
    fn test_schema_order() {
        let schema = counter_schema();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["step", "label", "disabled", "items", "meta"]);
    }

    #[test]
    fn test_parse_defaults_when_absent() {
        let values = counter_schema().parse(&RawAttributes::new()).unwrap();
        assert_eq!(values["step"], PropValue::Number(1.0));
        assert_eq!(values["label"], PropValue::String("Count".into()));
        assert_eq!(values["disabled"], PropValue::Boolean(false));
        assert_eq!(values["items"], PropValue::Array(vec![]));
    }

    #[test]
    fn test_parse_number() {
        let values = counter_schema().parse(&attrs(&[("step", "5")])).unwrap();
        assert_eq!(values["step"], PropValue::Number(5.0));
        assert_eq!(values["step"].to_string(), "5");

        let values = counter_schema().parse(&attrs(&[("step", " -2.5 ")])).unwrap();
        assert_eq!(values["step"], PropValue::Number(-2.5));
    }

    #[test]
    fn test_parse_number_rejects_text() {
        for bad in ["abc", "", "NaN", "inf", "5px"] {
            let err = counter_schema().parse(&attrs(&[("step", bad)])).unwrap_err();
            assert_eq!(err.property, "step");
            assert_eq!(err.expected, PropKind::Number);
            assert_eq!(err.value, bad);
        }
    }

    #[test]
    fn test_parse_boolean_presence() {
        let values = counter_schema().parse(&attrs(&[("disabled", "")])).unwrap();
        assert_eq!(values["disabled"], PropValue::Boolean(true));

        let values = counter_schema().parse(&attrs(&[("disabled", "false")])).unwrap();
        assert_eq!(values["disabled"], PropValue::Boolean(true));

        let schema = PropertySchema::new().boolean("open", true);
        let values = schema.parse(&RawAttributes::new()).unwrap();
        assert_eq!(values["open"], PropValue::Boolean(true));
    }

    #[test]
    fn test_parse_structured_values() {
        let values = counter_schema()
            .parse(&attrs(&[("items", "[1, 2, 3]"), ("meta", r#"{"a": true}"#)]))
            .unwrap();
        assert_eq!(values["items"], PropValue::Array(vec![json!(1), json!(2), json!(3)]));
        assert_eq!(values["meta"].as_object().unwrap()["a"], json!(true));
    }

    #[test]
    fn test_parse_structured_falls_back_to_default() {
        let schema = PropertySchema::new()
            .array("items", vec![json!("x")])
            .object("meta", Map::new());
        let values = schema
            .parse(&attrs(&[("items", "not json"), ("meta", "[1]")]))
            .unwrap();
        assert_eq!(values["items"], PropValue::Array(vec![json!("x")]));
        assert_eq!(values["meta"], PropValue::Object(Map::new()));
    }

    #[test]
    fn test_parse_hyphenated_attribute() {
        let schema = PropertySchema::new().number("maxCount", 10.0);
        let values = schema.parse(&attrs(&[("max-count", "3")])).unwrap();
        assert_eq!(values["maxCount"], PropValue::Number(3.0));
    }

    #[test]
    fn test_parse_ignores_unknown_attributes() {
        let values = counter_schema().parse(&attrs(&[("id", "x")])).unwrap();
        assert_eq!(values.len(), 5);
        assert!(!values.contains_key("id"));
    }

    proptest! {
        #[test]
        fn prop_integers_round_trip(n in -1_000_000i64..1_000_000) {
            let text = n.to_string();
            let values = counter_schema().parse(&attrs(&[("step", text.as_str())])).unwrap();
            prop_assert_eq!(values["step"].to_string(), text);
        }

        #[test]
        fn prop_non_numeric_text_fails(text in "[a-zA-Z][a-zA-Z ]{0,10}") {
            // "inf"/"infinity"/"nan" parse as f64 but are rejected as non-finite.
            let result = counter_schema().parse(&attrs(&[("step", text.as_str())]));
            prop_assert!(result.is_err());
        }

        #[test]
        fn prop_boolean_true_for_any_value(text in ".{0,12}") {
            let values = counter_schema().parse(&attrs(&[("disabled", text.as_str())])).unwrap();
            prop_assert_eq!(&values["disabled"], &PropValue::Boolean(true));
        }
    }
}
