//! Re-fetch TTL caching for the isomorphic GraphQL render platform.
//!
//! This crate provides:
//! - `QueryFetchCache` - Tracks last successful completion per query and
//!   decides when a mounted view should force a fresh fetch
//! - `QueryKey` - Query identity (name plus serialized parameters)
//! - `Clock` - Time source seam for deterministic tests
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use iso_cache::QueryFetchCache;
//! use iso_core::QueryConfig;
//!
//! let cache = QueryFetchCache::new();
//! let config = QueryConfig::new("Profile").with_param("userId", "user1");
//!
//! cache.on_query_success(&config);
//! let stale = cache.should_force_fetch(&config, Duration::from_secs(300))?;
//! ```

mod clock;
mod fetch_cache;
mod key;

pub use clock::*;
pub use fetch_cache::*;
pub use key::*;
