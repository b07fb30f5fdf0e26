//! TCP accept loop and per-connection request pipeline.
//!
//! # Architecture
//!
//! ```text
//!            ┌──────────── connection task ────────────┐
//! socket ──► FramedRead ──► convert ──► spawn(request) ──► Router::dispatch
//!                                                                │
//! socket ◄── FramedWrite ◄── writer task ◄── mpsc<batch> ◄───────┘
//! ```
//!
//! Every request runs in its own task and collects its responses into one
//! batch, which the writer task sends contiguously. Responses of concurrent
//! requests therefore never interleave on the wire. The batch of a request
//! cancelled by abandon, disconnect or shutdown is dropped.

use crate::convert;
use devldap_core::{Context, DirectoryHandle, OperationKind, Response, Router, Session};
use futures::{SinkExt, StreamExt};
use ldap3_proto::proto::LdapMsg;
use ldap3_proto::LdapCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shared state for every connection.
#[derive(Clone)]
pub struct Server {
    router: Arc<Router>,
    directory: DirectoryHandle,
}

impl Server {
    pub fn new(router: Router, directory: DirectoryHandle) -> Self {
        Self {
            router: Arc::new(router),
            directory,
        }
    }

    /// Accept connections until `shutdown` fires. Cancelling `shutdown`
    /// also cancels every in-flight request on every connection.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, "listening");

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };
            let server = self.clone();
            let connection = shutdown.child_token();
            tokio::spawn(async move {
                server.connection(stream, peer, connection).await;
            });
        }

        info!(addr = %local, "stopped accepting connections");
        Ok(())
    }

    async fn connection(&self, stream: TcpStream, peer: SocketAddr, token: CancellationToken) {
        debug!(%peer, "connection opened");
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LdapCodec::default());
        let writer = FramedWrite::new(write_half, LdapCodec::default());
        let (tx, rx) = mpsc::unbounded_channel::<Vec<LdapMsg>>();
        let writer_task = tokio::spawn(write_loop(writer, rx, peer));
        let session = Session::new(token.clone());

        loop {
            let frame = tokio::select! {
                _ = token.cancelled() => break,
                frame = reader.next() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let msg = match frame {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(%peer, error = %e, "could not decode LDAP message; closing connection");
                    break;
                }
            };

            let message = convert::message(msg);
            match message.request.kind() {
                OperationKind::Unbind => {
                    debug!(%peer, id = message.id, "unbind; closing connection");
                    break;
                }
                OperationKind::Abandon => {
                    // Handled inline so it takes effect before later requests.
                    let snapshot = self.directory.snapshot();
                    let ctx = Context {
                        id: message.id,
                        controls: &message.controls,
                        directory: &snapshot,
                        session: &session,
                        cancel: &token,
                    };
                    let mut ignored: Vec<Response> = Vec::new();
                    self.router.dispatch(&ctx, &message.request, &mut ignored);
                }
                _ => {
                    let registration = session.register(message.id);
                    let router = Arc::clone(&self.router);
                    let snapshot = self.directory.snapshot();
                    let session = session.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let cancel = registration.token();
                        let mut out: Vec<Response> = Vec::new();
                        let ctx = Context {
                            id: message.id,
                            controls: &message.controls,
                            directory: &snapshot,
                            session: &session,
                            cancel,
                        };
                        router.dispatch(&ctx, &message.request, &mut out);
                        session.finish(&registration);

                        if cancel.is_cancelled() {
                            debug!(id = message.id, dropped = out.len(), "request cancelled; responses dropped");
                            return;
                        }
                        let batch = out
                            .into_iter()
                            .map(|r| convert::response(message.id, r))
                            .collect();
                        // The writer is gone only when the connection is.
                        let _ = tx.send(batch);
                    });
                }
            }
        }

        token.cancel();
        drop(tx);
        if let Err(e) = writer_task.await {
            warn!(%peer, error = %e, "writer task failed");
        }
        debug!(%peer, "connection closed");
    }
}

async fn write_loop(
    mut writer: FramedWrite<OwnedWriteHalf, LdapCodec>,
    mut rx: mpsc::UnboundedReceiver<Vec<LdapMsg>>,
    peer: SocketAddr,
) {
    while let Some(batch) = rx.recv().await {
        for msg in batch {
            if let Err(e) = writer.feed(msg).await {
                warn!(%peer, error = %e, "could not encode response");
                return;
            }
        }
        if let Err(e) = writer.flush().await {
            debug!(%peer, error = %e, "write failed; peer gone");
            return;
        }
    }
}
