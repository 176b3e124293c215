// SPDX-License-Identifier: Apache-2.0

//! Process lifecycle: bring both listeners up, wait for a termination
//! signal, shut down within a bounded grace period.
//!
//! Shutdown order mirrors the transport contract: the HTTP gateway stops
//! accepting and drains in-flight connections for at most the configured
//! grace period, then the RPC listener is stopped immediately. Shutdown
//! failures are logged, never propagated; only startup failures (broker
//! sizing, socket binds, signal registration) abort the process.

use std::sync::Arc;

use ringbus_config::Settings;
use ringbus_engine::Broker;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::{Gateway, RpcServer, ServeError};

enum Exit {
    Signal,
    Rpc,
    Gateway,
}

/// Owns the broker and both listeners for the lifetime of the process.
pub struct Supervisor {
    settings: Settings,
}

impl Supervisor {
    /// Create a supervisor from resolved settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run until SIGINT/SIGTERM, then shut down. Returns only on startup
    /// failure or after an orderly shutdown.
    pub async fn run(self) -> Result<(), ServeError> {
        let broker = Arc::new(Broker::new(
            self.settings.broker.capacity,
            self.settings.broker.consumer_groups,
        )?);
        info!(
            capacity = self.settings.broker.capacity,
            consumer_groups = self.settings.broker.consumer_groups,
            "broker ready"
        );

        let rpc_addr = self.settings.transport.rpc_addr;
        let rpc = RpcServer::bind(rpc_addr, Arc::clone(&broker))
            .await
            .map_err(|source| ServeError::Bind {
                role: "rpc",
                addr: rpc_addr,
                source,
            })?;

        let http_addr = self.settings.transport.http_addr;
        let gateway = Gateway::bind(http_addr, Arc::clone(&broker))
            .await
            .map_err(|source| ServeError::Bind {
                role: "http",
                addr: http_addr,
                source,
            })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut rpc_task = tokio::spawn(rpc.serve());
        let mut gateway_task = tokio::spawn(gateway.serve(shutdown_rx));

        let exit = tokio::select! {
            signal = wait_for_termination() => {
                signal?;
                info!("termination signal received, shutting down");
                Exit::Signal
            }
            result = &mut rpc_task => {
                log_listener_exit("rpc", result);
                Exit::Rpc
            }
            result = &mut gateway_task => {
                log_listener_exit("http gateway", result);
                Exit::Gateway
            }
        };

        // Stop the gateway first and give in-flight HTTP connections a
        // bounded drain window.
        let _ = shutdown_tx.send(true);
        if !matches!(exit, Exit::Gateway) {
            let grace = self.settings.transport.shutdown_grace();
            match timeout(grace, &mut gateway_task).await {
                Ok(result) => log_listener_exit("http gateway", result),
                Err(_) => {
                    warn!(grace_secs = grace.as_secs(), "http gateway did not drain in time");
                    gateway_task.abort();
                }
            }
        }

        // The RPC listener stops immediately; dropping the accept loop is the
        // whole shutdown.
        if !matches!(exit, Exit::Rpc) {
            rpc_task.abort();
        }

        info!("shutdown complete");
        Ok(())
    }
}

fn log_listener_exit(role: &str, result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!(role, "listener stopped"),
        Ok(Err(err)) => error!(role, error = %err, "listener failed"),
        Err(err) if err.is_cancelled() => {}
        Err(err) => error!(role, error = %err, "listener task failed"),
    }
}

async fn wait_for_termination() -> Result<(), ServeError> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|source| ServeError::Signal { source })?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.map_err(|source| ServeError::Signal { source })
            }
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|source| ServeError::Signal { source })
    }
}
