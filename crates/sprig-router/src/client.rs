//! Client attribute generation.
//!
//! Render functions call [`ApiMap::call`] with an action name and positional
//! arguments and get back attributes such as
//! `hx-delete="/api/items/42" hx-target="#list"` for the element that triggers
//! the action.

use std::fmt::Display;

use indexmap::IndexMap;
use smallvec::SmallVec;
use sprig_core::RouteError;
use tracing::debug;

use crate::pattern::{Method, PathPattern};
use crate::router::CompiledRoute;

/// Attributes for one action, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAttrs {
    attrs: SmallVec<[(String, String); 3]>,
}

impl ClientAttrs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace an attribute.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl IntoIterator for ClientAttrs {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); 3]>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiEntry {
    method: Method,
    pattern: PathPattern,
    target: Option<String>,
    swap: Option<String>,
}

/// Client attribute generators keyed by action name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiMap {
    actions: IndexMap<String, ApiEntry>,
}

impl ApiMap {
    pub(crate) fn insert<H>(&mut self, route: &CompiledRoute<H>) {
        self.actions
            .entry(route.action.clone())
            .or_insert_with(|| ApiEntry {
                method: route.method,
                pattern: route.pattern.clone(),
                target: route.target.clone(),
                swap: route.swap.clone(),
            });
    }

    /// Attributes for `action` with path parameters filled from `args` in order.
    ///
    /// Fewer arguments than the pattern has parameters is an arity error.
    /// Extra arguments are ignored.
    pub fn call(&self, action: &str, args: &[&dyn Display]) -> Result<ClientAttrs, RouteError> {
        let entry = self.entry(action)?;
        let path = resolve(action, entry, args)?;

        let mut attrs = ClientAttrs::default().with(entry.method.attribute(), path);
        if let Some(target) = &entry.target {
            attrs = attrs.with("hx-target", target.as_str());
        }
        if let Some(swap) = &entry.swap {
            attrs = attrs.with("hx-swap", swap.as_str());
        }
        Ok(attrs)
    }

    /// Attributes for an action that takes no arguments.
    pub fn attrs(&self, action: &str) -> Result<ClientAttrs, RouteError> {
        self.call(action, &[])
    }

    /// The resolved path alone, e.g. for a plain link.
    pub fn path(&self, action: &str, args: &[&dyn Display]) -> Result<String, RouteError> {
        let entry = self.entry(action)?;
        resolve(action, entry, args)
    }

    pub fn method(&self, action: &str) -> Option<Method> {
        self.actions.get(action).map(|entry| entry.method)
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn entry(&self, action: &str) -> Result<&ApiEntry, RouteError> {
        self.actions
            .get(action)
            .ok_or_else(|| RouteError::UnknownAction {
                action: action.to_string(),
            })
    }
}

fn resolve(action: &str, entry: &ApiEntry, args: &[&dyn Display]) -> Result<String, RouteError> {
    let expected = entry.pattern.param_count();
    if args.len() < expected {
        return Err(RouteError::Arity {
            action: action.to_string(),
            expected,
            got: args.len(),
        });
    }
    if args.len() > expected {
        debug!(action, expected, got = args.len(), "ignoring surplus action arguments");
    }
    let args: Vec<String> = args.iter().take(expected).map(|arg| arg.to_string()).collect();
    // An empty segment would produce a path no route matches.
    if let Some((param, _)) = entry.pattern.params().zip(&args).find(|(_, arg)| arg.is_empty()) {
        return Err(RouteError::EmptyArgument {
            action: action.to_string(),
            param: param.to_string(),
        });
    }
    Ok(entry.pattern.resolve(&args))
}
