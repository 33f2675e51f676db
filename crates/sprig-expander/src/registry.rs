//! Component registry and per-definition compilation cache.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use sprig_core::naming::is_component_name;
use sprig_core::{
    ComponentError, Markup, PropValues, PropertySchema, PropertyTypeError, RawAttributes,
    RegistryError, RenderError,
};
use sprig_router::{ActionContext, ApiMap, Method, RouteSpec, RouteTable, Router};
use sprig_style::{compile_styles, ClassMap, StyleTable};
use tracing::{debug, error};

use crate::expander::{self, RenderOutput};
use crate::options::RenderOptions;
use crate::props::{infer_schema, Props};

/// A component's render function.
pub type RenderFn =
    Arc<dyn Fn(&Props, &ApiMap, &ClassMap) -> Result<Markup, ComponentError> + Send + Sync>;

/// A server action handler. Its markup is expanded like a render result.
pub type Handler = Arc<dyn Fn(&ActionContext<'_>) -> Result<Markup, ComponentError> + Send + Sync>;

/// Legacy attribute transformer: raw attributes straight to typed values.
pub type Transform =
    Arc<dyn Fn(&RawAttributes) -> Result<PropValues, PropertyTypeError> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&ActionContext<'_>) -> Result<Markup, ComponentError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Where a component's property schema comes from.
#[derive(Clone)]
pub enum PropsSource {
    /// Recorded from the render function's accessor calls.
    Inferred,
    /// Declared up front.
    Declared(PropertySchema),
    /// A custom transformer; there is no schema.
    Transform(Transform),
}

impl fmt::Debug for PropsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsSource::Inferred => f.write_str("Inferred"),
            PropsSource::Declared(schema) => f.debug_tuple("Declared").field(schema).finish(),
            PropsSource::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// A registered component. Immutable once built.
#[derive(Clone)]
pub struct ComponentDefinition {
    name: String,
    styles: StyleTable,
    routes: RouteTable<Handler>,
    render: RenderFn,
    props: PropsSource,
}

impl ComponentDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn routes(&self) -> &RouteTable<Handler> {
        &self.routes
    }

    pub fn props_source(&self) -> &PropsSource {
        &self.props
    }

    pub(crate) fn render_fn(&self) -> &RenderFn {
        &self.render
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("styles", &self.styles)
            .field("routes", &self.routes)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// Builder for component definitions.
pub struct ComponentBuilder {
    name: String,
    styles: StyleTable,
    routes: RouteTable<Handler>,
    render: Option<RenderFn>,
    props: PropsSource,
}

impl ComponentBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            styles: StyleTable::new(),
            routes: RouteTable::new(),
            render: None,
            props: PropsSource::Inferred,
        }
    }

    /// Add a style entry: a bare declaration block or a full rule.
    pub fn style(mut self, key: &str, css: &str) -> Self {
        self.styles.insert(key.to_string(), css.to_string());
        self
    }

    /// Add a server action.
    pub fn route(mut self, action: &str, spec: RouteSpec<Handler>) -> Self {
        self.routes.insert(action.to_string(), spec);
        self
    }

    /// Set the render function.
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Props, &ApiMap, &ClassMap) -> Result<Markup, ComponentError> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    /// Declare the property schema instead of inferring it.
    pub fn schema(mut self, schema: PropertySchema) -> Self {
        self.props = PropsSource::Declared(schema);
        self
    }

    /// Parse attributes with a custom transformer instead of a schema.
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawAttributes) -> Result<PropValues, PropertyTypeError> + Send + Sync + 'static,
    {
        self.props = PropsSource::Transform(Arc::new(f));
        self
    }

    /// Build the definition. Without a render function the component renders
    /// nothing.
    pub fn build(self) -> ComponentDefinition {
        let render: RenderFn = match self.render {
            Some(render) => render,
            None => Arc::new(render_nothing),
        };
        ComponentDefinition {
            name: self.name,
            styles: self.styles,
            routes: self.routes,
            render,
            props: self.props,
        }
    }
}

fn render_nothing(_: &Props, _: &ApiMap, _: &ClassMap) -> Result<Markup, ComponentError> {
    Ok(Markup::empty())
}

/// Everything derived from a definition on first use.
#[derive(Debug)]
pub struct CompiledComponent {
    pub css: String,
    pub classes: ClassMap,
    pub router: Router<Handler>,
    pub api: ApiMap,
    /// Empty for components with a custom transformer.
    pub schema: PropertySchema,
}

fn compile_definition(definition: &ComponentDefinition) -> Result<CompiledComponent, RenderError> {
    let name = definition.name();
    let styles = compile_styles(&definition.styles).map_err(|source| RenderError::Style {
        component: name.to_string(),
        source,
    })?;
    let router = Router::compile(&definition.routes).map_err(|source| RenderError::Route {
        component: name.to_string(),
        source,
    })?;
    let api = router.api_map();

    let schema = match &definition.props {
        PropsSource::Inferred => infer_schema(name, &definition.render, &api, &styles.classes)?,
        PropsSource::Declared(schema) => schema.clone(),
        PropsSource::Transform(_) => PropertySchema::new(),
    };

    debug!(
        component = name,
        properties = schema.len(),
        classes = styles.classes.len(),
        routes = router.len(),
        "compiled component"
    );
    Ok(CompiledComponent {
        css: styles.css,
        classes: styles.classes,
        router,
        api,
        schema,
    })
}

pub(crate) struct Entry {
    pub(crate) definition: Arc<ComponentDefinition>,
    compiled: OnceLock<Arc<CompiledComponent>>,
}

impl Entry {
    fn new(definition: ComponentDefinition) -> Self {
        Self {
            definition: Arc::new(definition),
            compiled: OnceLock::new(),
        }
    }

    /// Compiled artifacts, compiling on first use.
    ///
    /// Concurrent first uses may each compile; one result is kept and all
    /// callers see it. Errors are not cached.
    pub(crate) fn compiled(&self) -> Result<Arc<CompiledComponent>, RenderError> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(compile_definition(&self.definition)?);
        Ok(Arc::clone(self.compiled.get_or_init(|| compiled)))
    }
}

/// Name -> component table, read-only during rendering.
///
/// Build it at startup with [`Registry::register`], then share it by reference
/// (or in an `Arc`) with request handlers.
#[derive(Default)]
pub struct Registry {
    components: IndexMap<String, Entry>,
    options: RenderOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose render calls use `options`.
    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            components: IndexMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Register a component, replacing any previous one with the same name.
    pub fn register(&mut self, definition: ComponentDefinition) -> Result<(), RegistryError> {
        if !is_component_name(&definition.name) {
            return Err(RegistryError::InvalidName {
                name: definition.name.clone(),
            });
        }
        let name = definition.name.clone();
        if self.components.insert(name.clone(), Entry::new(definition)).is_some() {
            debug!(component = %name, "replaced component definition");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name).map(|entry| entry.definition.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn entry(&self, name: &str) -> Result<&Entry, RenderError> {
        self.components
            .get(name)
            .ok_or_else(|| RenderError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Compiled artifacts for one component, compiling it if needed.
    pub fn compile(&self, name: &str) -> Result<Arc<CompiledComponent>, RenderError> {
        self.entry(name)?.compiled()
    }

    /// Compile every component, stopping at the first configuration error.
    pub fn compile_all(&self) -> Result<(), RenderError> {
        for entry in self.components.values() {
            entry.compiled()?;
        }
        Ok(())
    }

    /// The property schema a component's attributes are parsed against.
    pub fn schema(&self, name: &str) -> Result<PropertySchema, RenderError> {
        Ok(self.compile(name)?.schema.clone())
    }

    /// One router over every component's actions, in registration order.
    pub fn router(&self) -> Result<Router<Handler>, RenderError> {
        let mut router = Router::new();
        for entry in self.components.values() {
            router.extend(entry.compiled()?.router.clone());
        }
        Ok(router)
    }

    /// Render a component with the registry's options.
    pub fn render(&self, name: &str, attributes: &RawAttributes) -> Result<RenderOutput, RenderError> {
        expander::render_component_with(self, name, attributes, &self.options)
    }

    /// Run the handler for a request and expand any component tags it returns.
    ///
    /// `Ok(None)` means no route matched. A component that fails to compile
    /// serves no routes and is skipped; call [`Registry::compile_all`] at
    /// startup to surface such errors.
    pub fn dispatch(
        &self,
        method: Method,
        path: &str,
        form: &RawAttributes,
    ) -> Result<Option<RenderOutput>, RenderError> {
        for (name, entry) in &self.components {
            let compiled = match entry.compiled() {
                Ok(compiled) => compiled,
                Err(err) => {
                    error!(component = %name, error = %err, "skipping misconfigured component");
                    continue;
                }
            };
            let Some(found) = compiled.router.dispatch(method, path) else {
                continue;
            };
            debug!(component = %name, action = found.action(), %method, path, "dispatching action");

            let request_path = path.split(['?', '#']).next().unwrap_or(path);
            let context = ActionContext {
                method,
                path: request_path,
                params: &found.params,
                query: &found.query,
                form,
            };
            let markup = (found.handler())(&context)
                .map_err(|err| RenderError::from_component(name, err))?;
            return Ok(Some(expander::expand_html(self, &markup.to_html(), &self.options)));
        }
        Ok(None)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}
