//! Network-layer plumbing for the isomorphic GraphQL render platform.
//!
//! This crate provides:
//! - `FieldRequest` - One top-level field's network request
//! - `ResponseEnvelope` - GraphQL-style `{data, errors}` wire envelope
//! - `ServerNetworkLayer` - Result-recording dispatch for server renders
//! - `RequestRegistry` - Tracking of in-flight requests (abort/progress)
//! - `ResponseAggregator` - One combined record per logical query

mod aggregate;
mod error;
mod registry;
mod request;
mod server;

pub use aggregate::*;
pub use error::*;
pub use registry::*;
pub use request::*;
pub use server::*;
