//! Typed property access for render functions, and schema inference.
//!
//! A render function reads its properties through typed accessors that carry
//! the default inline:
//!
//! ```ignore
//! let step = props.number("step", 1.0);
//! let label = props.string("label", "Count");
//! ```
//!
//! The first time a component is compiled, its render function is called once
//! with recording [`Props`]: every accessor returns its default and records
//! `(name, kind, default)`. The recorded table becomes the component's
//! [`PropertySchema`], so the schema is never written out separately.
//!
//! A read that the inference pass never reached (one behind a branch) has no
//! schema entry. At request time it is parsed straight from the raw attribute
//! with the accessor's kind and inline default.

use std::cell::RefCell;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use sprig_core::naming::attribute_to_property;
use sprig_core::{
    parse_value, ComponentError, PropSpec, PropValue, PropValues, PropertySchema, RawAttributes,
    RenderError,
};
use sprig_router::ApiMap;
use sprig_style::ClassMap;
use tracing::{debug, warn};

use crate::registry::RenderFn;

enum Mode {
    /// Schema inference pass.
    Recording(RefCell<PropertySchema>),
    /// Values parsed from request attributes.
    Resolved {
        values: PropValues,
        /// Request attributes keyed by property name.
        raw: IndexMap<String, String>,
    },
}

/// Property values handed to a render function.
pub struct Props {
    mode: Mode,
}

impl Props {
    /// Props backed by parsed values.
    pub fn resolved(values: PropValues) -> Self {
        Self {
            mode: Mode::Resolved {
                values,
                raw: IndexMap::new(),
            },
        }
    }

    /// Props backed by parsed values, with the request attributes kept for
    /// reads that have no schema entry.
    pub fn with_attributes(values: PropValues, attributes: &RawAttributes) -> Self {
        let mut raw = IndexMap::with_capacity(attributes.len());
        for (name, value) in attributes {
            raw.entry(attribute_to_property(name))
                .or_insert_with(|| value.clone());
        }
        Self {
            mode: Mode::Resolved { values, raw },
        }
    }

    fn recording() -> Self {
        Self {
            mode: Mode::Recording(RefCell::new(PropertySchema::new())),
        }
    }

    /// Whether this is the one-time inference pass. Render functions rarely
    /// need this.
    pub fn is_recording(&self) -> bool {
        matches!(self.mode, Mode::Recording(_))
    }

    fn into_schema(self) -> PropertySchema {
        match self.mode {
            Mode::Recording(schema) => schema.into_inner(),
            Mode::Resolved { .. } => PropertySchema::new(),
        }
    }

    fn read(&self, name: &str, default: PropValue) -> PropValue {
        match &self.mode {
            Mode::Recording(schema) => {
                schema.borrow_mut().insert(name, default.clone());
                default
            }
            Mode::Resolved { values, raw } => match values.get(name) {
                Some(value) if value.kind() == default.kind() => value.clone(),
                Some(value) => {
                    debug!(
                        property = name,
                        expected = %default.kind(),
                        found = %value.kind(),
                        "property read with a different kind, using default"
                    );
                    default
                }
                None => read_unrecorded(name, default, raw.get(name).map(String::as_str)),
            },
        }
    }

    pub fn string(&self, name: &str, default: &str) -> String {
        match self.read(name, PropValue::String(default.to_string())) {
            PropValue::String(value) => value,
            _ => default.to_string(),
        }
    }

    pub fn number(&self, name: &str, default: f64) -> f64 {
        match self.read(name, PropValue::Number(default)) {
            PropValue::Number(value) => value,
            _ => default,
        }
    }

    pub fn boolean(&self, name: &str, default: bool) -> bool {
        match self.read(name, PropValue::Boolean(default)) {
            PropValue::Boolean(value) => value,
            _ => default,
        }
    }

    pub fn array(&self, name: &str, default: Vec<Value>) -> Vec<Value> {
        match self.read(name, PropValue::Array(default)) {
            PropValue::Array(items) => items,
            _ => Vec::new(),
        }
    }

    pub fn object(&self, name: &str, default: Map<String, Value>) -> Map<String, Value> {
        match self.read(name, PropValue::Object(default)) {
            PropValue::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Raw typed value, if one was parsed. Always `None` while recording.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        match &self.mode {
            Mode::Recording(_) => None,
            Mode::Resolved { values, .. } => values.get(name),
        }
    }
}

impl std::fmt::Debug for Props {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mode {
            Mode::Recording(schema) => f
                .debug_struct("Props")
                .field("recording", &schema.borrow().len())
                .finish(),
            Mode::Resolved { values, .. } => {
                f.debug_struct("Props").field("values", values).finish()
            }
        }
    }
}

/// Parse a read the inference pass never reached.
///
/// Accessors cannot fail, so a value that does not fit the kind (non-numeric
/// text for a number) falls back to the default.
fn read_unrecorded(name: &str, default: PropValue, raw: Option<&str>) -> PropValue {
    let spec = PropSpec {
        name: name.to_string(),
        kind: default.kind(),
        default,
    };
    match parse_value(&spec, raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(property = name, error = %err, "unrecorded property did not parse, using default");
            spec.default
        }
    }
}

/// Run `render` once in recording mode and return the schema it reads.
///
/// The markup produced by this call is discarded. A render error here is a
/// configuration error for the component. Route and style errors (such as a
/// client attribute call with too few arguments) keep their own variant.
pub fn infer_schema(
    component: &str,
    render: &RenderFn,
    api: &ApiMap,
    classes: &ClassMap,
) -> Result<PropertySchema, RenderError> {
    let props = Props::recording();
    render(&props, api, classes).map_err(|err| match err {
        ComponentError::Route(_) | ComponentError::Style(_) => {
            RenderError::from_component(component, err)
        }
        ComponentError::Failed(reason) => RenderError::SchemaInference {
            component: component.to_string(),
            reason,
        },
    })?;
    let schema = props.into_schema();
    debug!(component, properties = schema.len(), "inferred property schema");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::{Markup, PropKind, RouteError};
    use sprig_router::{RouteSpec, RouteTable, Router};
    use std::sync::Arc;

    fn render_fn<F>(f: F) -> RenderFn
    where
        F: Fn(&Props, &ApiMap, &ClassMap) -> Result<Markup, ComponentError> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    #[test]
    fn test_inference_records_in_read_order() {
        let render = render_fn(|props, _, _| {
            let label = props.string("label", "Count");
            let step = props.number("step", 1.0);
            let wide = props.boolean("wide", false);
            // A second read of the same name does not change the schema.
            let _ = props.number("step", 99.0);
            Ok(Markup::text(format!("{label}{step}{wide}")))
        });

        let schema = infer_schema("counter", &render, &ApiMap::default(), &ClassMap::new()).unwrap();
        let entries: Vec<_> = schema.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            entries,
            vec![
                ("label", PropKind::String),
                ("step", PropKind::Number),
                ("wide", PropKind::Boolean),
            ]
        );
        assert_eq!(schema.get("step").unwrap().default, PropValue::Number(1.0));
    }

    #[test]
    fn test_inference_is_deterministic() {
        let render = render_fn(|props, _, _| {
            let items = props.array("items", vec![Value::from("a")]);
            let meta = props.object("meta", Map::new());
            Ok(Markup::text(format!("{}{}", items.len(), meta.len())))
        });
        let api = ApiMap::default();
        let classes = ClassMap::new();
        let first = infer_schema("list", &render, &api, &classes).unwrap();
        let second = infer_schema("list", &render, &api, &classes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_inference_failure_names_component() {
        let render = render_fn(|props, _, _| {
            if props.number("step", 0.0) == 0.0 {
                return Err(ComponentError::failed("step must not be zero"));
            }
            Ok(Markup::empty())
        });
        let err = infer_schema("counter", &render, &ApiMap::default(), &ClassMap::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::SchemaInference {
                component: "counter".into(),
                reason: "step must not be zero".into(),
            }
        );
    }

    #[test]
    fn test_resolved_reads() {
        let mut values = PropValues::new();
        values.insert("step".into(), PropValue::Number(5.0));
        values.insert("label".into(), PropValue::String("Clicks".into()));
        let props = Props::resolved(values);

        assert!(!props.is_recording());
        assert_eq!(props.number("step", 1.0), 5.0);
        assert_eq!(props.string("label", "Count"), "Clicks");
        // Kind mismatch and unknown names fall back to the inline default.
        assert_eq!(props.string("step", "x"), "x");
        assert!(props.boolean("hidden", true));
        assert_eq!(props.get("label"), Some(&PropValue::String("Clicks".into())));
    }

    #[test]
    fn test_inference_keeps_route_errors() {
        let mut table: RouteTable<()> = RouteTable::new();
        table.insert("remove".into(), RouteSpec::delete("/api/items/:id", ()));
        let api = Router::compile(&table).unwrap().api_map();
        let render = render_fn(|_, api, _| {
            let attrs = api.call("remove", &[])?;
            Ok(Markup::element("button").attrs(attrs).into())
        });

        let err = infer_schema("row", &render, &api, &ClassMap::new()).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err,
            RenderError::Route {
                component: "row".into(),
                source: RouteError::Arity {
                    action: "remove".into(),
                    expected: 1,
                    got: 0,
                },
            }
        );
    }

    #[test]
    fn test_unrecorded_reads_use_request_attributes() {
        let attributes: RawAttributes = [
            ("detail", "hello"),
            ("page-size", "25"),
            ("limit", "lots"),
            ("tags", r#"["a"]"#),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let props = Props::with_attributes(PropValues::new(), &attributes);

        assert_eq!(props.string("detail", "none"), "hello");
        assert_eq!(props.number("pageSize", 10.0), 25.0);
        assert!(!props.boolean("open", false));
        assert_eq!(props.array("tags", vec![]), vec![Value::from("a")]);
        // Non-numeric text cannot fail an accessor; the default is used.
        assert_eq!(props.number("limit", 5.0), 5.0);
        assert_eq!(props.string("missing", "fallback"), "fallback");
    }
}
