//! Markup tree produced by render functions, and its HTML serialization.

use indexmap::IndexMap;
use std::fmt::Write;

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Check whether a tag name is a void element (ASCII case-insensitive).
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// A node of rendered markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Pre-rendered HTML or script, emitted verbatim.
    Raw(String),
    Fragment(Vec<Markup>),
}

impl Markup {
    /// Start an element.
    pub fn element(tag: &str) -> Element {
        Element::new(tag)
    }

    pub fn text(text: impl ToString) -> Self {
        Markup::Text(text.to_string())
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Markup::Raw(html.into())
    }

    pub fn fragment(children: impl IntoIterator<Item = Markup>) -> Self {
        Markup::Fragment(children.into_iter().collect())
    }

    /// An empty fragment.
    pub fn empty() -> Self {
        Markup::Fragment(Vec::new())
    }

    /// Serialize to an HTML string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Append the HTML for this node to `out`.
    pub fn write_html(&self, out: &mut String) {
        match self {
            Markup::Element(element) => element.write_html(out),
            Markup::Text(text) => out.push_str(&html_escape::encode_text(text)),
            Markup::Raw(html) => out.push_str(html),
            Markup::Fragment(children) => {
                for child in children {
                    child.write_html(out);
                }
            }
        }
    }
}

impl From<Element> for Markup {
    fn from(element: Element) -> Self {
        Markup::Element(element)
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Markup::Text(text.to_string())
    }
}

impl From<String> for Markup {
    fn from(text: String) -> Self {
        Markup::Text(text)
    }
}

impl From<Vec<Markup>> for Markup {
    fn from(children: Vec<Markup>) -> Self {
        Markup::Fragment(children)
    }
}

/// An HTML element under construction.
///
/// Attributes keep insertion order; setting an attribute twice replaces its value
/// in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, Option<String>>,
    children: Vec<Markup>,
    self_closing: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Set an attribute.
    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.insert(name.to_string(), Some(value.to_string()));
        self
    }

    /// Set a valueless attribute (`<button disabled>`).
    pub fn flag(mut self, name: &str) -> Self {
        self.attributes.insert(name.to_string(), None);
        self
    }

    /// Set a valueless attribute only when `on` is true.
    pub fn flag_if(self, name: &str, on: bool) -> Self {
        if on {
            self.flag(name)
        } else {
            self
        }
    }

    /// Set several attributes at once, e.g. generated client attributes.
    pub fn attrs<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in attributes {
            self.attributes.insert(name.into(), Some(value.into()));
        }
        self
    }

    /// Add a class, appending to any existing class list.
    pub fn class(mut self, class: &str) -> Self {
        if class.is_empty() {
            return self;
        }
        match self.attributes.get_mut("class") {
            Some(Some(existing)) if !existing.is_empty() => {
                existing.push(' ');
                existing.push_str(class);
            }
            _ => {
                self.attributes.insert("class".to_string(), Some(class.to_string()));
            }
        }
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Append a child node.
    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several child nodes.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Markup>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append escaped text.
    pub fn text(self, text: impl ToString) -> Self {
        self.child(Markup::Text(text.to_string()))
    }

    /// Render as `<tag ... />`. Children are ignored.
    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            match value {
                Some(value) => {
                    let _ = write!(
                        out,
                        " {}=\"{}\"",
                        name,
                        html_escape::encode_double_quoted_attribute(value)
                    );
                }
                None => {
                    out.push(' ');
                    out.push_str(name);
                }
            }
        }

        if self.self_closing {
            out.push_str(" />");
            return;
        }
        out.push('>');
        if is_void_element(&self.tag) {
            return;
        }

        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}
