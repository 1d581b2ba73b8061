//! UDP channel: one socket, faces demultiplexed by remote address.

use crate::{ChannelTransport, FwInput, FwSender};
use anyhow::{Context, Result};
use bytes::Bytes;
use log::{debug, info, warn};
use rust_ndnd_common::uri::{FaceUri, Scheme};
use rust_ndnd_common::MAX_PACKET_SIZE;
use rust_ndnd_fwd::face::{FaceId, FaceIdAllocator, FacePersistency, FaceScope};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

fn uri_for(addr: SocketAddr) -> FaceUri {
    let scheme = if addr.is_ipv4() {
        Scheme::Udp4
    } else {
        Scheme::Udp6
    };
    FaceUri::new(scheme, addr.to_string())
}

fn scope_for(addr: SocketAddr) -> FaceScope {
    if addr.ip().is_loopback() {
        FaceScope::Local
    } else {
        FaceScope::NonLocal
    }
}

/// Binds a UDP socket; every distinct remote address becomes an on-demand
/// face.
pub async fn listen(uri: &FaceUri, fw_tx: FwSender, allocator: FaceIdAllocator) -> Result<()> {
    let addr = uri.host_port().context("invalid UDP listen URI")?;
    let socket = Arc::new(
        UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", uri))?,
    );
    info!("listening on {}", uri);
    let local = socket
        .local_addr()
        .map(uri_for)
        .unwrap_or_else(|_| uri.clone());

    tokio::spawn(async move {
        let mut peers: HashMap<SocketAddr, FaceId> = HashMap::new();
        let mut datagram = [0u8; 65536];
        loop {
            let (len, peer) = match socket.recv_from(&mut datagram).await {
                Ok(received) => received,
                Err(err) => {
                    warn!("UDP receive failed: {}", err);
                    continue;
                }
            };
            if len > MAX_PACKET_SIZE {
                // A datagram face drops oversized packets.
                debug!("dropping {} byte datagram from {}", len, peer);
                continue;
            }

            let id = match peers.get(&peer) {
                Some(id) => *id,
                None => {
                    let id = allocator.allocate();
                    debug!("new UDP peer {} as {}", peer, id);
                    peers.insert(peer, id);
                    spawn_writer(id, Arc::clone(&socket), peer, &fw_tx, local.clone());
                    id
                }
            };
            let _ = fw_tx.send(FwInput::Packet {
                id,
                wire: Bytes::copy_from_slice(&datagram[..len]),
            });
        }
    });

    Ok(())
}

fn spawn_writer(
    id: FaceId,
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    fw_tx: &FwSender,
    local: FaceUri,
) {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Bytes>();
    let transport = ChannelTransport::new(out_tx, local, uri_for(peer), scope_for(peer));
    let _ = fw_tx.send(FwInput::NewFace {
        id,
        transport: Box::new(transport),
        persistency: FacePersistency::OnDemand,
    });

    let fw_tx = fw_tx.clone();
    tokio::spawn(async move {
        while let Some(packet) = out_rx.recv().await {
            if let Err(err) = socket.send_to(&packet, peer).await {
                let _ = fw_tx.send(FwInput::FaceClosed {
                    id,
                    reason: format!("send failed: {}", err),
                });
                return;
            }
        }
    });
}

/// Creates a connected UDP socket towards a remote router as a persistent
/// face.
pub async fn connect(uri: &FaceUri, fw_tx: FwSender, allocator: FaceIdAllocator) -> Result<FaceId> {
    let addr = uri.host_port().context("invalid UDP connect URI")?;
    let bind_addr = match uri.scheme {
        Scheme::Udp6 => "[::]:0",
        _ => "0.0.0.0:0",
    };
    let socket = Arc::new(
        UdpSocket::bind(bind_addr)
            .await
            .context("failed to bind UDP socket")?,
    );
    socket
        .connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}", uri))?;
    info!("connected to {}", uri);

    let id = allocator.allocate();
    let local = socket
        .local_addr()
        .map(uri_for)
        .unwrap_or_else(|_| uri.clone());
    let peer = socket.peer_addr().context("no peer address")?;

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Bytes>();
    let transport = ChannelTransport::new(out_tx, local, uri_for(peer), scope_for(peer));
    let _ = fw_tx.send(FwInput::NewFace {
        id,
        transport: Box::new(transport),
        persistency: FacePersistency::Persistent,
    });

    {
        let socket = Arc::clone(&socket);
        let fw_tx = fw_tx.clone();
        tokio::spawn(async move {
            while let Some(packet) = out_rx.recv().await {
                if let Err(err) = socket.send(&packet).await {
                    let _ = fw_tx.send(FwInput::FaceClosed {
                        id,
                        reason: format!("send failed: {}", err),
                    });
                    return;
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut datagram = [0u8; 65536];
        loop {
            match socket.recv(&mut datagram).await {
                Ok(len) if len <= MAX_PACKET_SIZE => {
                    let _ = fw_tx.send(FwInput::Packet {
                        id,
                        wire: Bytes::copy_from_slice(&datagram[..len]),
                    });
                }
                Ok(len) => debug!("dropping {} byte datagram", len),
                Err(err) => {
                    let _ = fw_tx.send(FwInput::FaceClosed {
                        id,
                        reason: format!("receive failed: {}", err),
                    });
                    return;
                }
            }
        }
    });

    Ok(id)
}
