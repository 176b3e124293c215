// SPDX-License-Identifier: Apache-2.0

//! Transport surface of the ringbus broker.
//!
//! Three pieces, composed by the supervisor:
//!
//! - [`rpc::RpcServer`]: the framed request/response listener carrying both
//!   the messaging service and the admin service.
//! - [`gateway::Gateway`]: a read-only HTTP mirror of the listing RPCs on a
//!   separate port.
//! - [`supervisor::Supervisor`]: binds both listeners, runs them, and turns
//!   a termination signal into a bounded-time shutdown.
//!
//! The wire schema lives in [`wire`] and is shared by servers, the gateway,
//! and client-side tests.

pub mod gateway;
pub mod rpc;
pub mod supervisor;
pub mod wire;

pub use gateway::Gateway;
pub use rpc::RpcServer;
pub use supervisor::Supervisor;

/// Errors raised while bringing the transport surface up.
///
/// Everything here is fatal at startup: a broker that cannot be sized or a
/// socket that cannot be bound terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Broker construction rejected the configured sizing.
    #[error(transparent)]
    Broker(#[from] ringbus_engine::Error),
    /// A listener could not bind its endpoint.
    #[error("failed to bind {role} listener on {addr}: {source}")]
    Bind {
        /// Which listener failed ("rpc" or "http").
        role: &'static str,
        /// Requested endpoint.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// OS signal handler registration failed.
    #[error("failed to install termination signal handler: {source}")]
    Signal {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
