//! Core types, error definitions, and markup primitives for Sprig.
//!
//! This crate provides the foundational types used across all other sprig crates:
//! - Property kinds, values, and schemas
//! - The markup tree and its HTML serialization
//! - Naming conventions (class names, attribute/property names)
//! - Error types

pub mod errors;
pub mod markup;
pub mod naming;
pub mod value;

pub use errors::*;
pub use markup::{Element, Markup};
pub use value::*;
