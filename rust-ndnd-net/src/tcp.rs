//! TCP channel: listener for on-demand faces, dialer for configured
//! routes.

use crate::codec::FrameDecoder;
use crate::{ChannelTransport, FwInput, FwSender};
use anyhow::{Context, Result};
use bytes::Bytes;
use log::{debug, info, warn};
use rust_ndnd_common::uri::{FaceUri, Scheme};
use rust_ndnd_fwd::face::{FaceId, FaceIdAllocator, FacePersistency, FaceScope};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

fn uri_for(addr: SocketAddr) -> FaceUri {
    let scheme = if addr.is_ipv4() {
        Scheme::Tcp4
    } else {
        Scheme::Tcp6
    };
    FaceUri::new(scheme, addr.to_string())
}

/// Binds a TCP listener and serves on-demand faces from it. Returns the
/// bound address (useful when the URI asked for port 0).
pub async fn listen(
    uri: &FaceUri,
    fw_tx: FwSender,
    allocator: FaceIdAllocator,
) -> Result<SocketAddr> {
    let addr = uri.host_port().context("invalid TCP listen URI")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", uri))?;
    let bound = listener.local_addr().context("no local address")?;
    info!("listening on {}", uri_for(bound));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("accepted TCP connection from {}", peer);
                    spawn_face(stream, FacePersistency::OnDemand, &fw_tx, &allocator);
                }
                Err(err) => {
                    warn!("TCP accept failed: {}", err);
                    break;
                }
            }
        }
    });

    Ok(bound)
}

/// Dials a remote router and registers the connection as a persistent
/// face.
pub async fn connect(uri: &FaceUri, fw_tx: FwSender, allocator: FaceIdAllocator) -> Result<FaceId> {
    let addr = uri.host_port().context("invalid TCP connect URI")?;
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}", uri))?;
    info!("connected to {}", uri);
    Ok(spawn_face(
        stream,
        FacePersistency::Persistent,
        &fw_tx,
        &allocator,
    ))
}

fn spawn_face(
    stream: TcpStream,
    persistency: FacePersistency,
    fw_tx: &FwSender,
    allocator: &FaceIdAllocator,
) -> FaceId {
    let id = allocator.allocate();
    let local = stream
        .local_addr()
        .map(uri_for)
        .unwrap_or_else(|_| FaceUri::new(Scheme::Tcp4, "0.0.0.0:0"));
    let (remote, scope) = match stream.peer_addr() {
        Ok(peer) => {
            let scope = if peer.ip().is_loopback() {
                FaceScope::Local
            } else {
                FaceScope::NonLocal
            };
            (uri_for(peer), scope)
        }
        Err(_) => (FaceUri::new(Scheme::Tcp4, "0.0.0.0:0"), FaceScope::NonLocal),
    };

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let transport = ChannelTransport::new(out_tx, local, remote, scope);
    let _ = fw_tx.send(FwInput::NewFace {
        id,
        transport: Box::new(transport),
        persistency,
    });

    let (read_half, write_half) = stream.into_split();
    tokio::spawn(run_writer(id, write_half, out_rx, fw_tx.clone()));
    tokio::spawn(run_reader(id, read_half, fw_tx.clone()));
    id
}

/// Drains the face's FIFO send queue; one write in flight at a time.
async fn run_writer(
    id: FaceId,
    mut write_half: OwnedWriteHalf,
    mut out_rx: mpsc::UnboundedReceiver<Bytes>,
    fw_tx: FwSender,
) {
    while let Some(packet) = out_rx.recv().await {
        if let Err(err) = write_half.write_all(&packet).await {
            let _ = fw_tx.send(FwInput::FaceClosed {
                id,
                reason: format!("write failed: {}", err),
            });
            return;
        }
    }
    // The transport was closed on the forwarder side.
    let _ = write_half.shutdown().await;
}

/// Frames incoming bytes and feeds complete packets to the forwarder.
async fn run_reader(id: FaceId, mut read_half: OwnedReadHalf, fw_tx: FwSender) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];
    loop {
        match read_half.read(&mut chunk).await {
            Ok(0) => {
                let _ = fw_tx.send(FwInput::FaceClosed {
                    id,
                    reason: "connection closed by peer".into(),
                });
                return;
            }
            Ok(n) => {
                decoder.extend(&chunk[..n]);
                loop {
                    match decoder.next_frame() {
                        Ok(Some(wire)) => {
                            let _ = fw_tx.send(FwInput::Packet { id, wire });
                        }
                        Ok(None) => break,
                        Err(err) => {
                            // Oversized or corrupt framing: the stream
                            // cannot resynchronize.
                            let _ = fw_tx.send(FwInput::FaceClosed {
                                id,
                                reason: format!("framing error: {}", err),
                            });
                            return;
                        }
                    }
                }
            }
            Err(err) => {
                let _ = fw_tx.send(FwInput::FaceClosed {
                    id,
                    reason: format!("read failed: {}", err),
                });
                return;
            }
        }
    }
}
