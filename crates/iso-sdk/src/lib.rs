//! Public SDK for the isomorphic GraphQL render platform.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use iso_sdk::prelude::*;
//!
//! let network = Arc::new(ServerNetworkLayer::new(fetch_query));
//! let server = ServerEnvironment::new(engine, network);
//!
//! let markup = server.render_until_stable(render, MAX_RENDER_PASSES).await;
//! let payload = server.client_payload();
//!
//! // ...transported to the client...
//!
//! let client = ClientEnvironment::new(engine);
//! client.inject_server_data(payload).await;
//! ```

pub use iso_cache;
pub use iso_core;
pub use iso_env;
pub use iso_net;

/// Prelude for convenient imports.
pub mod prelude {
    pub use iso_cache::*;
    pub use iso_core::*;
    pub use iso_env::*;
    pub use iso_net::*;
}
