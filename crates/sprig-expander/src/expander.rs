//! Recursive component expansion.
//!
//! Rendering a component:
//! 1. Look up and compile the definition (cached)
//! 2. Parse raw attributes into typed props
//! 3. Call the render function and serialize the markup
//! 4. Parse the HTML and render every registered component tag in it,
//!    splicing the results back in place of the tags
//!
//! The active component path is kept on a stack. A tag naming a component
//! already on the stack, or one nested deeper than the configured ceiling, is
//! not expanded and a warning is recorded instead.

use indexmap::IndexMap;
use sprig_core::{ExpansionWarning, RawAttributes, RenderError};
use sprig_parser::{parse_fragment, ElementData};
use tracing::{error, instrument, warn};

use crate::options::RenderOptions;
use crate::props::Props;
use crate::registry::{CompiledComponent, Entry, PropsSource, Registry};

/// Result of a render call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub html: String,
    /// CSS of every component rendered, once per component, in the order
    /// they were first rendered.
    pub css: String,
    /// Errors from nested components whose tags were dropped.
    pub errors: Vec<RenderError>,
    pub warnings: Vec<ExpansionWarning>,
}

impl RenderOutput {
    /// No nested component failed and no guard stopped expansion.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// The CSS wrapped in a `<style>` element, or an empty string.
    pub fn style_tag(&self) -> String {
        if self.css.is_empty() {
            String::new()
        } else {
            format!("<style>{}</style>", self.css)
        }
    }
}

/// Render a component with default options.
pub fn render_component(
    registry: &Registry,
    name: &str,
    attributes: &RawAttributes,
) -> Result<RenderOutput, RenderError> {
    render_component_with(registry, name, attributes, &RenderOptions::default())
}

/// Render a component.
///
/// Errors in the top-level component are returned. Errors in nested
/// components are collected in [`RenderOutput::errors`] and the failing tag is
/// dropped from the HTML.
#[instrument(level = "debug", skip(registry, attributes, options))]
pub fn render_component_with(
    registry: &Registry,
    name: &str,
    attributes: &RawAttributes,
    options: &RenderOptions,
) -> Result<RenderOutput, RenderError> {
    let mut expander = ComponentExpander::new(registry, options);
    let html = expander.render(name, attributes)?;
    Ok(expander.finish(html))
}

/// Expand registered component tags in arbitrary HTML, such as a page shell
/// or an action handler's response.
pub fn expand_html(registry: &Registry, html: &str, options: &RenderOptions) -> RenderOutput {
    let mut expander = ComponentExpander::new(registry, options);
    let html = expander.expand(html);
    expander.finish(html)
}

/// Per-call expansion state.
struct ComponentExpander<'a> {
    registry: &'a Registry,
    options: &'a RenderOptions,
    /// Components being rendered, outermost first.
    stack: Vec<String>,
    /// Component name -> CSS, first render first.
    styles: IndexMap<String, String>,
    errors: Vec<RenderError>,
    warnings: Vec<ExpansionWarning>,
}

impl<'a> ComponentExpander<'a> {
    fn new(registry: &'a Registry, options: &'a RenderOptions) -> Self {
        Self {
            registry,
            options,
            stack: Vec::new(),
            styles: IndexMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self, html: String) -> RenderOutput {
        let css = self
            .styles
            .values()
            .filter(|css| !css.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        RenderOutput {
            html,
            css,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    /// Render one component and expand its output.
    fn render(&mut self, name: &str, attributes: &RawAttributes) -> Result<String, RenderError> {
        let entry = self.registry.entry(name)?;
        let compiled = entry.compiled()?;
        let props = resolve_props(entry, &compiled, attributes)?;

        let render = entry.definition.render_fn();
        let markup = render(&props, &compiled.api, &compiled.classes)
            .map_err(|err| RenderError::from_component(name, err))?;

        if !self.styles.contains_key(name) {
            self.styles.insert(name.to_string(), compiled.css.clone());
        }

        self.stack.push(name.to_string());
        let html = self.expand(&markup.to_html());
        self.stack.pop();
        Ok(html)
    }

    /// Replace every outermost registered component tag in `html`.
    fn expand(&mut self, html: &str) -> String {
        let registry = self.registry;
        let fragment = parse_fragment(html);
        let found = fragment.find_outermost(|element| registry.contains(&element.local_name()));
        if found.is_empty() {
            return html.to_string();
        }

        let mut replacements = Vec::with_capacity(found.len());
        for id in found {
            if let Some(element) = fragment.element(id) {
                let replacement = self.expand_tag(element, fragment.text(id));
                replacements.push((id, replacement));
            }
        }
        fragment.splice(replacements)
    }

    fn expand_tag(&mut self, element: &ElementData, source: &str) -> String {
        let name = element.local_name();

        if self.stack.contains(&name) {
            let mut path = self.stack.clone();
            path.push(name.clone());
            warn!(component = %name, path = %path.join(" -> "), "component cycle, not expanding");
            let marker = format!("<!-- sprig:cycle {} -->", path.join(" -> "));
            self.warnings.push(ExpansionWarning::Cycle {
                component: name,
                path,
            });
            return self.guarded(marker, source);
        }

        let depth = self.stack.len();
        if depth > self.options.max_depth {
            warn!(component = %name, depth, "expansion depth limit reached");
            let marker = format!("<!-- sprig:depth-limit {} -->", name);
            self.warnings.push(ExpansionWarning::DepthLimit {
                component: name,
                depth: self.options.max_depth,
            });
            return self.guarded(marker, source);
        }

        match self.render(&name, &element.raw_attributes()) {
            Ok(html) => html,
            Err(err) => {
                if err.is_configuration() {
                    error!(component = %name, error = %err, "nested component is misconfigured");
                } else {
                    warn!(component = %name, error = %err, "nested component failed");
                }
                self.errors.push(err);
                String::new()
            }
        }
    }

    fn guarded(&self, marker: String, source: &str) -> String {
        if self.options.cycle_markers {
            marker
        } else {
            source.to_string()
        }
    }
}

fn resolve_props(
    entry: &Entry,
    compiled: &CompiledComponent,
    attributes: &RawAttributes,
) -> Result<Props, RenderError> {
    let values = match entry.definition.props_source() {
        PropsSource::Transform(transform) => transform(attributes),
        PropsSource::Inferred | PropsSource::Declared(_) => compiled.schema.parse(attributes),
    };
    values
        .map(|values| Props::with_attributes(values, attributes))
        .map_err(|source| RenderError::PropertyType {
            component: entry.definition.name().to_string(),
            source,
        })
}
