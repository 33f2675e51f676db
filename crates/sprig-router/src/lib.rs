//! Route compiler for Sprig components.
//!
//! A component declares its server actions as `action -> (method, path
//! pattern, handler)`. Compiling that table gives two things:
//!
//! - a [`Router`] the HTTP layer uses to dispatch requests
//! - an [`ApiMap`] the render function uses to build client attributes
//!   (`hx-get`, `hx-delete`, ...) for each action

mod client;
mod pattern;
mod router;

pub use client::{ApiMap, ClientAttrs};
pub use pattern::{parse_declaration, parse_query, Method, Params, PathPattern, Segment};
pub use router::{ActionContext, CompiledRoute, RouteMatch, RouteSpec, RouteTable, Router};
