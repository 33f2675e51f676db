//! Component registry and rendering for Sprig.
//!
//! This crate handles:
//! - Component registration and first-use compilation
//! - Property schema inference
//! - Attribute parsing
//! - Recursive expansion of nested component tags
//! - Cycle and depth guards
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.register(
//!     ComponentBuilder::new("counter")
//!         .style("counter", "{ display: flex; }")
//!         .render(|props, _api, classes| {
//!             let step = props.number("step", 1.0);
//!             Ok(Markup::element("span").class(classes.class("counter")?).text(step).into())
//!         })
//!         .build(),
//! )?;
//!
//! let out = registry.render("counter", &attributes)?;
//! ```

mod expander;
mod options;
mod props;
mod registry;

pub use expander::{expand_html, render_component, render_component_with, RenderOutput};
pub use options::{RenderOptions, DEFAULT_MAX_DEPTH};
pub use props::{infer_schema, Props};
pub use registry::{
    handler, CompiledComponent, ComponentBuilder, ComponentDefinition, Handler, PropsSource,
    Registry, RenderFn, Transform,
};

pub use sprig_core::{
    ComponentError, ExpansionWarning, Markup, PropKind, PropValue, PropertySchema,
    RawAttributes, RenderError,
};
pub use sprig_router::{ActionContext, ApiMap, ClientAttrs, Method, RouteSpec};
pub use sprig_style::ClassMap;
