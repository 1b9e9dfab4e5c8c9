//! Server and client query coordinators for the isomorphic GraphQL render
//! platform.
//!
//! This crate provides:
//! - `QuerySetMap` - Associative container keyed by structural query-set
//!   equality
//! - `Coordinator` - Base "run or get ready state" tracking
//! - `ServerEnvironment` - Render-until-stable loop and client payload
//! - `ClientEnvironment` - Server payload replay into the local store
//! - `EnvContext` - Per-environment ambient state (TTL cache, request
//!   registry, reset listeners)
//! - `testing` - Engine test doubles for exercising coordinators

mod base;
mod client;
mod context;
mod query_set_map;
mod server;
pub mod testing;

pub use base::*;
pub use client::*;
pub use context::*;
pub use query_set_map::*;
pub use server::*;
