//! Tree construction for HTML fragments.
//!
//! The parser never fails: anything that does not lex as a tag, comment or
//! declaration is text. End tags close the nearest matching open element
//! (implicitly closing anything opened after it); end tags with no match are kept
//! as text. An element that is never closed by its own end tag covers only its
//! start tag, and its content becomes following siblings.

use sprig_core::markup::is_void_element;

use crate::lexer::{comment, declaration, end_tag, start_tag, text_run, StartTag};
use crate::tree::{Attribute, ElementData, Fragment, Node, NodeId, NodeKind, Span};

/// Elements whose content is text up to their end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Parse an HTML fragment into an arena tree.
pub fn parse_fragment(source: &str) -> Fragment<'_> {
    let mut builder = TreeBuilder::new(source);
    builder.run();
    builder.finish()
}

struct TreeBuilder<'a> {
    source: &'a str,
    fragment: Fragment<'a>,
    /// Stack of open elements, innermost last.
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            fragment: Fragment::new(source),
            open: Vec::new(),
        }
    }

    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    fn run(&mut self) {
        let mut rest: &'a str = self.source;
        while !rest.is_empty() {
            let start = self.offset(rest);
            rest = if rest.starts_with("<!--") {
                self.comment(rest, start)
            } else if let Ok((after, name)) = end_tag(rest) {
                let end = self.offset(after);
                self.close(name, start, end);
                after
            } else if let Ok((after, tag)) = start_tag(rest) {
                self.open_element(tag, start, after)
            } else if let Ok((after, _)) = declaration(rest) {
                let end = self.offset(after);
                self.push(NodeKind::Declaration, Span::new(start, end));
                after
            } else {
                self.text(rest, start)
            };
        }
    }

    fn finish(mut self) -> Fragment<'a> {
        let unclosed = std::mem::take(&mut self.open);
        self.hoist(unclosed);
        self.fragment
    }

    /// Innermost first, so each element's hoisted content moves up again with
    /// its parent's.
    fn hoist(&mut self, unclosed: Vec<NodeId>) {
        for id in unclosed.into_iter().rev() {
            self.fragment.hoist_children(id);
        }
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let parent = self.open.last().copied();
        self.fragment.push(Node {
            kind,
            span,
            parent,
            children: Vec::new(),
        })
    }

    /// Add text, merging with a directly preceding text node.
    fn push_text(&mut self, start: usize, end: usize) {
        let parent = self.open.last().copied();
        if let Some(last) = self.fragment.last_child(parent) {
            let node = self.fragment.node_mut(last);
            if node.kind == NodeKind::Text && node.span.end == start {
                node.span.end = end;
                return;
            }
        }
        self.push(NodeKind::Text, Span::new(start, end));
    }

    fn comment(&mut self, rest: &'a str, start: usize) -> &'a str {
        match comment(rest) {
            Ok((after, _)) => {
                let end = self.offset(after);
                self.push(NodeKind::Comment, Span::new(start, end));
                after
            }
            // An unterminated comment runs to the end of input.
            Err(_) => {
                self.push(NodeKind::Comment, Span::new(start, self.source.len()));
                ""
            }
        }
    }

    fn open_element(&mut self, tag: StartTag<'a>, start: usize, after: &'a str) -> &'a str {
        let end = self.offset(after);
        let name = tag.name;
        let data = ElementData {
            name: name.to_string(),
            attributes: tag
                .attributes
                .iter()
                .map(|(name, value)| Attribute {
                    name: name.to_string(),
                    value: value.map(|v| html_escape::decode_html_entities(v).into_owned()),
                })
                .collect(),
            self_closing: tag.self_closing,
            open_tag: Span::new(start, end),
        };
        let id = self.push(NodeKind::Element(data), Span::new(start, end));

        if tag.self_closing || is_void_element(name) {
            return after;
        }
        self.open.push(id);

        if RAW_TEXT_ELEMENTS.iter().any(|raw| raw.eq_ignore_ascii_case(name)) {
            return self.raw_text(name, after);
        }
        after
    }

    /// Consume the content of a raw-text element up to its end tag.
    fn raw_text(&mut self, name: &str, rest: &'a str) -> &'a str {
        let needle = format!("</{}", name.to_ascii_lowercase());
        // ASCII lowercasing keeps byte offsets intact.
        let len = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        if len > 0 {
            let start = self.offset(rest);
            self.push_text(start, start + len);
        }
        &rest[len..]
    }

    fn close(&mut self, name: &str, start: usize, end: usize) {
        let fragment = &self.fragment;
        let position = self.open.iter().rposition(|id| {
            fragment
                .element(*id)
                .is_some_and(|data| data.is_named(name))
        });

        let Some(position) = position else {
            self.push_text(start, end);
            return;
        };

        let implicitly_closed: Vec<NodeId> = self.open.drain(position + 1..).collect();
        self.hoist(implicitly_closed);
        if let Some(id) = self.open.pop() {
            self.fragment.node_mut(id).span.end = end;
        }
    }

    fn text(&mut self, rest: &'a str, start: usize) -> &'a str {
        let len = match text_run(rest) {
            Ok((after, _)) => rest.len() - after.len(),
            // A `<` that starts nothing: take it and the text up to the next `<`.
            Err(_) => 1 + rest[1..].find('<').unwrap_or(rest.len() - 1),
        };
        self.push_text(start, start + len);
        &rest[len..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn element_names(fragment: &Fragment<'_>) -> Vec<String> {
        fragment
            .descendants()
            .filter_map(|(_, node)| node.as_element().map(|e| e.name.clone()))
            .collect()
    }

    #[test]
    fn test_parse_nested_elements() {
        let html = r#"<div class="card"><span>1</span><counter step="5"></counter></div>"#;
        let fragment = parse_fragment(html);

        assert_eq!(fragment.roots().len(), 1);
        assert_eq!(element_names(&fragment), vec!["div", "span", "counter"]);

        let div = fragment.roots()[0];
        assert_eq!(fragment.text(div), html);
        assert_eq!(fragment.node(div).children.len(), 2);

        let counter = fragment.node(div).children[1];
        assert_eq!(fragment.text(counter), r#"<counter step="5"></counter>"#);
        let data = fragment.element(counter).unwrap();
        assert_eq!(data.raw_attributes()["step"], "5");
        assert_eq!(fragment.node(counter).parent, Some(div));
    }

    #[test]
    fn test_self_closing_and_void() {
        let fragment = parse_fragment(r#"<p>a<br>b<todo-item id="1" />c</p>"#);
        let p = fragment.roots()[0];
        let kinds: Vec<_> = fragment
            .node(p)
            .children
            .iter()
            .map(|id| fragment.text(*id))
            .collect();
        assert_eq!(kinds, vec!["a", "<br>", "b", r#"<todo-item id="1" />"#, "c"]);
        let item = fragment.node(p).children[3];
        assert!(fragment.element(item).unwrap().self_closing);
    }

    #[test]
    fn test_raw_text_elements_are_opaque() {
        let html = "<script>if (a<b) { x = '<counter>'; }</script><counter></counter>";
        let fragment = parse_fragment(html);
        assert_eq!(element_names(&fragment), vec!["script", "counter"]);

        let script = fragment.roots()[0];
        let body = fragment.node(script).children[0];
        assert_eq!(fragment.node(body).kind, NodeKind::Text);
        assert_eq!(fragment.text(body), "if (a<b) { x = '<counter>'; }");
    }

    #[test]
    fn test_comments_and_doctype() {
        let fragment = parse_fragment("<!DOCTYPE html><!-- <counter> --><p>x</p>");
        let kinds: Vec<_> = fragment
            .roots()
            .iter()
            .map(|id| fragment.node(*id).kind.clone())
            .collect();
        assert!(matches!(kinds[0], NodeKind::Declaration));
        assert!(matches!(kinds[1], NodeKind::Comment));
        assert!(matches!(kinds[2], NodeKind::Element(_)));
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let fragment = parse_fragment("a<!-- <counter></counter>");
        assert_eq!(fragment.roots().len(), 2);
        assert!(element_names(&fragment).is_empty());
    }

    #[test]
    fn test_implicit_close() {
        let html = "<card><p>one<p>two</card>after";
        let fragment = parse_fragment(html);
        let card = fragment.roots()[0];
        assert_eq!(fragment.text(card), "<card><p>one<p>two</card>");

        // Neither <p> is closed, so both cover only their start tag and their
        // content sits beside them inside <card>.
        let children: Vec<_> = fragment
            .node(card)
            .children
            .iter()
            .map(|id| fragment.text(*id))
            .collect();
        assert_eq!(children, vec!["<p>", "one", "<p>", "two"]);
        for id in &fragment.node(card).children {
            assert_eq!(fragment.node(*id).parent, Some(card));
        }
        assert_eq!(fragment.text(fragment.roots()[1]), "after");
    }

    #[test]
    fn test_case_insensitive_close() {
        let fragment = parse_fragment("<Counter step='2'></COUNTER>");
        let id = fragment.roots()[0];
        assert_eq!(fragment.text(id), "<Counter step='2'></COUNTER>");
        assert_eq!(fragment.element(id).unwrap().local_name(), "counter");
    }

    #[test]
    fn test_stray_end_tag_is_text() {
        let fragment = parse_fragment("a</div>b<i>c</i>");
        assert_eq!(fragment.roots().len(), 2);
        assert_eq!(fragment.text(fragment.roots()[0]), "a</div>b");
    }

    #[test]
    fn test_unclosed_element_keeps_following_siblings() {
        let html = r#"<p>before</p><counter step="2"><p>after</p><footer>end</footer>"#;
        let fragment = parse_fragment(html);
        let roots: Vec<_> = fragment.roots().iter().map(|id| fragment.text(*id)).collect();
        assert_eq!(
            roots,
            vec![
                "<p>before</p>",
                r#"<counter step="2">"#,
                "<p>after</p>",
                "<footer>end</footer>",
            ]
        );

        let found = fragment.find_outermost(|e| e.is_named("counter"));
        let out = fragment.splice(found.into_iter().map(|id| (id, "[C]".to_string())));
        assert_eq!(out, "<p>before</p>[C]<p>after</p><footer>end</footer>");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let fragment = parse_fragment("1 < 2 <b>x</b>");
        assert_eq!(fragment.text(fragment.roots()[0]), "1 < 2 ");
        assert_eq!(element_names(&fragment), vec!["b"]);
    }

    #[test]
    fn test_attribute_values_are_decoded() {
        let fragment = parse_fragment(r#"<list items="[&quot;a&quot;,&quot;b&quot;]" open></list>"#);
        let attrs = fragment.element(fragment.roots()[0]).unwrap().raw_attributes();
        assert_eq!(attrs["items"], r#"["a","b"]"#);
        assert_eq!(attrs["open"], "");
    }

    #[test]
    fn test_find_outermost_and_splice() {
        let html = r#"<ul><counter step="1"><counter></counter></counter><li>keep</li><counter/></ul>"#;
        let fragment = parse_fragment(html);
        let found = fragment.find_outermost(|e| e.is_named("counter"));
        assert_eq!(found.len(), 2);

        let out = fragment.splice(found.into_iter().map(|id| (id, "[C]".to_string())));
        assert_eq!(out, "<ul>[C]<li>keep</li>[C]</ul>");
    }

    proptest! {
        #[test]
        fn prop_splice_without_replacements_is_identity(html in "[a-z<>/=\" !-]{0,40}") {
            let fragment = parse_fragment(&html);
            prop_assert_eq!(fragment.splice(Vec::new()), html);
        }

        #[test]
        fn prop_spans_are_within_source(html in "[a-z<>/=\" !-]{0,40}") {
            let fragment = parse_fragment(&html);
            for (_, node) in fragment.descendants() {
                prop_assert!(node.span.start <= node.span.end);
                prop_assert!(node.span.end <= html.len());
            }
        }
    }
}
