//! Core abstractions for the isomorphic GraphQL render platform.
//!
//! This crate provides the fundamental types and traits:
//! - `QueryHandle` trait - Capability interface over engine query objects
//! - `QuerySet` - Named collection of query handles for one view
//! - `QueryConfig` - Declarative description of a view's data needs
//! - `QueryEngine` trait - Boundary to the external query engine
//! - `ReadyState` - Engine-reported fetch status
//! - `ServerData` - Transport payload between server and client renders
//! - `split_query` - Combined query document splitting

mod engine;
mod error;
mod payload;
mod query;
mod ready_state;
mod split;

pub use engine::*;
pub use error::*;
pub use payload::*;
pub use query::*;
pub use ready_state::*;
pub use split::*;
