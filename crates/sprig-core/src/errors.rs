//! Error types for the Sprig renderer.

use crate::value::PropKind;
use thiserror::Error;

/// Top-level error type for Sprig.
#[derive(Debug, Error)]
pub enum SprigError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised while rendering a component.
///
/// Every variant names the component it came from so the caller can log it or
/// render a fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("Schema inference failed for component {component}: {reason}")]
    SchemaInference { component: String, reason: String },

    #[error("Invalid attribute for component {component}: {source}")]
    PropertyType {
        component: String,
        #[source]
        source: PropertyTypeError,
    },

    #[error("Route error in component {component}: {source}")]
    Route {
        component: String,
        #[source]
        source: RouteError,
    },

    #[error("Style error in component {component}: {source}")]
    Style {
        component: String,
        #[source]
        source: StyleError,
    },

    #[error("Component {component} failed to render: {message}")]
    Component { component: String, message: String },
}

impl RenderError {
    /// Name of the component the error belongs to.
    pub fn component(&self) -> &str {
        match self {
            RenderError::UnknownComponent { name } => name,
            RenderError::SchemaInference { component, .. }
            | RenderError::PropertyType { component, .. }
            | RenderError::Route { component, .. }
            | RenderError::Style { component, .. }
            | RenderError::Component { component, .. } => component,
        }
    }

    /// Whether this error means a component is miswritten, as opposed to bad
    /// request input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RenderError::SchemaInference { .. }
                | RenderError::Route { .. }
                | RenderError::Style { .. }
        )
    }

    /// Attach a component name to an error returned by a render function or handler.
    pub fn from_component(component: &str, err: ComponentError) -> Self {
        match err {
            ComponentError::Route(source) => RenderError::Route {
                component: component.to_string(),
                source,
            },
            ComponentError::Style(source) => RenderError::Style {
                component: component.to_string(),
                source,
            },
            ComponentError::Failed(message) => RenderError::Component {
                component: component.to_string(),
                message,
            },
        }
    }
}

/// A raw attribute value that does not fit its property kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("property '{property}' expected {expected}, got {value:?}")]
pub struct PropertyTypeError {
    pub property: String,
    pub expected: PropKind,
    pub value: String,
}

/// Errors from route declaration, compilation, and client attribute generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Invalid route declaration '{declaration}': {reason}")]
    InvalidDeclaration { declaration: String, reason: String },

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Duplicate parameter ':{param}' in pattern '{pattern}'")]
    DuplicateParam { pattern: String, param: String },

    #[error("Action '{action}' needs {expected} argument(s), got {got}")]
    Arity {
        action: String,
        expected: usize,
        got: usize,
    },

    #[error("Action '{action}' got an empty argument for ':{param}'")]
    EmptyArgument { action: String, param: String },

    #[error("Unknown action: {action}")]
    UnknownAction { action: String },
}

/// Errors from compiling a component's style blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("Style keys '{first}' and '{second}' both generate class '{class}'")]
    ClassCollision {
        class: String,
        first: String,
        second: String,
    },

    #[error("Unbalanced braces in style '{key}'")]
    UnbalancedBlock { key: String },

    #[error("No style key '{key}' in class map")]
    UnknownKey { key: String },
}

/// Errors from registering a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid component name '{name}': expected a kebab-case identifier")]
    InvalidName { name: String },
}

/// Failure reported by a render function or an action handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error("{0}")]
    Failed(String),
}

impl ComponentError {
    pub fn failed(message: impl Into<String>) -> Self {
        ComponentError::Failed(message.into())
    }
}

/// A non-fatal condition hit while expanding nested components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionWarning {
    /// A component appeared inside its own ancestor path.
    Cycle { component: String, path: Vec<String> },
    /// The nesting ceiling was reached.
    DepthLimit { component: String, depth: usize },
}

impl std::fmt::Display for ExpansionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpansionWarning::Cycle { component, path } => {
                write!(f, "cycle at component {}: {}", component, path.join(" -> "))
            }
            ExpansionWarning::DepthLimit { component, depth } => {
                write!(f, "depth limit {} reached at component {}", depth, component)
            }
        }
    }
}
