//! Arena tree for parsed HTML fragments.
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`]. Every node
//! keeps the byte span it covers in the source so unchanged markup can be
//! copied through verbatim.

use sprig_core::RawAttributes;

/// Index of a node in its fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An attribute as written on a tag. Values are entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// Element-specific node data.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name as written.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    /// Span of the start tag alone.
    pub open_tag: Span,
}

impl ElementData {
    /// Lowercased tag name.
    pub fn local_name(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// ASCII case-insensitive tag name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes as a name -> value map. Valueless attributes map to `""`;
    /// for repeated names the first occurrence wins, as in HTML.
    pub fn raw_attributes(&self) -> RawAttributes {
        let mut map = RawAttributes::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            map.entry(attr.name.clone())
                .or_insert_with(|| attr.value.clone().unwrap_or_default());
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text,
    Comment,
    /// `<!DOCTYPE ...>` and other `<!...>` / `<?...>` declarations.
    Declaration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Full extent, including the end tag for closed elements.
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }
}

/// A parsed HTML fragment.
#[derive(Debug, Clone)]
pub struct Fragment<'a> {
    source: &'a str,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl<'a> Fragment<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node under `node.parent` (or as a root) and return its id.
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        match node.parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Shrink an element to its start tag and move its children up to its
    /// parent, directly after it.
    pub(crate) fn hoist_children(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if let NodeKind::Element(data) = &node.kind {
            node.span = data.open_tag;
        }
        let children = std::mem::take(&mut node.children);
        let parent = node.parent;
        for child in &children {
            self.nodes[child.0].parent = parent;
        }

        let siblings = match parent {
            Some(parent) => &mut self.nodes[parent.0].children,
            None => &mut self.roots,
        };
        let at = siblings
            .iter()
            .position(|sibling| *sibling == id)
            .map_or(siblings.len(), |index| index + 1);
        siblings.splice(at..at, children);
    }

    /// Last child of `parent`, or the last root.
    pub(crate) fn last_child(&self, parent: Option<NodeId>) -> Option<NodeId> {
        match parent {
            Some(parent) => self.nodes[parent.0].children.last().copied(),
            None => self.roots.last().copied(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).as_element()
    }

    /// Source text covered by a node.
    pub fn text(&self, id: NodeId) -> &'a str {
        let span = self.node(id).span;
        &self.source[span.start..span.end]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in document order.
    pub fn descendants(&self) -> Descendants<'_, 'a> {
        let mut stack = self.roots.clone();
        stack.reverse();
        Descendants {
            fragment: self,
            stack,
        }
    }

    /// Elements accepted by `matches`, in document order, without descending
    /// into accepted elements.
    pub fn find_outermost<F>(&self, mut matches: F) -> Vec<NodeId>
    where
        F: FnMut(&ElementData) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if let NodeKind::Element(data) = &node.kind {
                if matches(data) {
                    found.push(id);
                    continue;
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    /// Rebuild the source with whole nodes replaced.
    ///
    /// Replacements are applied in document order. A replacement for a node
    /// inside an already replaced node is ignored.
    pub fn splice<I>(&self, replacements: I) -> String
    where
        I: IntoIterator<Item = (NodeId, String)>,
    {
        let mut replacements: Vec<(Span, String)> = replacements
            .into_iter()
            .map(|(id, text)| (self.node(id).span, text))
            .collect();
        replacements.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (span, text) in replacements {
            if span.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..span.start]);
            out.push_str(&text);
            cursor = span.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Pre-order iterator over a fragment.
pub struct Descendants<'f, 'a> {
    fragment: &'f Fragment<'a>,
    stack: Vec<NodeId>,
}

impl<'f, 'a> Iterator for Descendants<'f, 'a> {
    type Item = (NodeId, &'f Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.fragment.node(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, node))
    }
}
