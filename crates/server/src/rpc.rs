// SPDX-License-Identifier: Apache-2.0

//! Framed RPC listener.
//!
//! One task per connection; frames on a connection are read, dispatched, and
//! answered strictly in order. The dispatcher is synchronous (broker core
//! operations complete in bounded steps), so a connection task only suspends
//! on socket I/O. A malformed or oversized frame gets a `bad_request` reply
//! (where possible) and the connection is closed.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use ringbus_engine::Broker;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::wire::{
    AckResponse, Call, ConsumeResponse, CreateTopicResponse, DeadLetterResponse, ErrorCode,
    ListConsumersResponse, ListTopicsResponse, PublishResponse, RegisterConsumerResponse, Reply,
    Request, WireError, MAX_FRAME_LEN,
};

/// The framed RPC listener carrying the messaging and admin services.
pub struct RpcServer {
    listener: TcpListener,
    broker: Arc<Broker>,
}

impl RpcServer {
    /// Bind the listener. Bind failures are fatal to the caller.
    pub async fn bind(addr: SocketAddr, broker: Arc<Broker>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, broker })
    }

    /// The locally bound endpoint (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped or the listener fails.
    pub async fn serve(self) -> io::Result<()> {
        info!(addr = %self.listener.local_addr()?, "rpc listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let broker = Arc::clone(&self.broker);
            let _ = tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, broker).await {
                    debug!(%peer, error = %err, "rpc connection closed");
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, broker: Arc<Broker>) -> io::Result<()> {
    loop {
        let Some(frame) = read_frame(&mut stream).await? else {
            return Ok(());
        };
        match serde_json::from_slice::<Request>(&frame) {
            Ok(request) => {
                let reply = dispatch(&broker, request);
                write_frame(&mut stream, &reply).await?;
            }
            Err(err) => {
                let reply = Reply::err(
                    0,
                    WireError {
                        code: ErrorCode::BadRequest,
                        message: format!("malformed request: {err}"),
                    },
                );
                write_frame(&mut stream, &reply).await?;
                return Ok(());
            }
        }
    }
}

/// Execute one call against the broker and build its reply.
fn dispatch(broker: &Broker, request: Request) -> Reply {
    let id = request.id;
    let encoded = match request.call {
        Call::Publish { topic, message } => {
            let Some(message) = message else {
                return Reply::err(id, invalid_argument("publish request carries no message"));
            };
            broker.publish(&topic, message);
            Reply::ok(id, &PublishResponse { success: true })
        }
        Call::Consume {
            topic,
            consumer_group,
            batch_size,
        } => {
            let Ok(group) = usize::try_from(consumer_group) else {
                return Reply::err(id, invalid_argument("consumer group index is negative"));
            };
            let Ok(batch_size) = usize::try_from(batch_size) else {
                return Reply::err(id, invalid_argument("batch size is negative"));
            };
            match broker.consume(&topic, group, batch_size) {
                Ok(batch) => Reply::ok(
                    id,
                    &ConsumeResponse {
                        messages: batch.iter().map(|m| (**m).clone()).collect(),
                        success: true,
                    },
                ),
                Err(err) => return Reply::err(id, WireError::from(&err)),
            }
        }
        Call::Acknowledge {
            message_ids,
            consumer_group,
        } => {
            broker.acknowledge(&message_ids, &consumer_group);
            Reply::ok(id, &AckResponse { success: true })
        }
        Call::DeadLetters => Reply::ok(
            id,
            &DeadLetterResponse {
                messages: broker.dead_letters().iter().map(|m| (**m).clone()).collect(),
                success: true,
            },
        ),
        Call::RegisterConsumerGroup { consumer_group } => {
            match broker.register_consumer_group(&consumer_group) {
                Ok(index) => Reply::ok(
                    id,
                    &RegisterConsumerResponse {
                        success: true,
                        consumer_group_index: index as u64,
                    },
                ),
                Err(err) => return Reply::err(id, WireError::from(&err)),
            }
        }
        Call::CreateTopic { topic, strategy } => {
            let body = match broker.create_topic(&topic, &strategy) {
                Ok(()) => CreateTopicResponse::created(),
                Err(err) => CreateTopicResponse::failed(&err),
            };
            Reply::ok(id, &body)
        }
        Call::ListTopics => Reply::ok(
            id,
            &ListTopicsResponse {
                topics: broker.list_topics(),
            },
        ),
        Call::ListConsumers => Reply::ok(
            id,
            &ListConsumersResponse {
                consumer_groups: broker
                    .list_consumer_groups()
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            },
        ),
    };

    encoded.unwrap_or_else(|err| {
        Reply::err(
            id,
            WireError {
                code: ErrorCode::BadRequest,
                message: format!("failed to encode response: {err}"),
            },
        )
    })
}

fn invalid_argument(message: &str) -> WireError {
    WireError {
        code: ErrorCode::InvalidArgument,
        message: message.to_owned(),
    }
}

/// Read one length-prefixed frame. `None` means the peer closed cleanly
/// before the next frame.
pub async fn read_frame(stream: &mut (impl AsyncRead + Unpin)) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds limit of {MAX_FRAME_LEN}"),
        ));
    }
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Write one length-prefixed JSON frame.
pub async fn write_frame(
    stream: &mut (impl AsyncWrite + Unpin),
    body: &impl Serialize,
) -> io::Result<()> {
    let encoded = serde_json::to_vec(body)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if encoded.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "frame of {} bytes exceeds limit of {MAX_FRAME_LEN}",
                encoded.len()
            ),
        ));
    }
    let len = u32::try_from(encoded.len()).expect("frame length limit fits into u32");
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&encoded).await?;
    stream.flush().await
}
