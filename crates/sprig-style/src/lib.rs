//! Style compiler for Sprig components.
//!
//! Turns a component's ordered `key -> CSS` table into stylesheet text and a
//! [`ClassMap`] the render function uses to look up class names by key.

mod compiler;

pub use compiler::{compile_styles, leading_class, ClassMap, CompiledStyles, StyleTable};
