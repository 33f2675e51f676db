//! HTML fragment parser for Sprig.
//!
//! Rendered markup is parsed into an arena of nodes that remember their source
//! spans. Expansion swaps whole nodes for new text with [`Fragment::splice`],
//! so everything outside the replaced nodes is kept byte-for-byte.
//! Built on `nom` for the tag-level grammar.

mod grammar;
mod lexer;
mod tree;

pub use grammar::parse_fragment;
pub use tree::{Attribute, Descendants, ElementData, Fragment, Node, NodeId, NodeKind, Span};
