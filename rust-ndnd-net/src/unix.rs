//! Unix-domain socket channel. Unix faces are always local scope, so
//! /localhost names are reachable through them.

use crate::codec::FrameDecoder;
use crate::{ChannelTransport, FwInput, FwSender};
use anyhow::{Context, Result};
use bytes::Bytes;
use log::{debug, info, warn};
use rust_ndnd_common::uri::{FaceUri, Scheme};
use rust_ndnd_fwd::face::{FaceId, FaceIdAllocator, FacePersistency, FaceScope};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

fn uri_for(path: &str) -> FaceUri {
    FaceUri {
        scheme: Scheme::Unix,
        authority: String::new(),
        path: Some(path.to_string()),
    }
}

/// Binds a Unix listener, removing a stale socket file first.
pub async fn listen(uri: &FaceUri, fw_tx: FwSender, allocator: FaceIdAllocator) -> Result<()> {
    let path = uri.socket_path().context("invalid unix listen URI")?.to_string();
    let _ = std::fs::remove_file(&path);
    let listener =
        UnixListener::bind(&path).with_context(|| format!("failed to bind {}", uri))?;
    info!("listening on {}", uri);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    debug!("accepted unix connection on {}", path);
                    spawn_face(stream, &path, FacePersistency::OnDemand, &fw_tx, &allocator);
                }
                Err(err) => {
                    warn!("unix accept failed: {}", err);
                    break;
                }
            }
        }
    });

    Ok(())
}

/// Connects to a local router socket as a persistent face.
pub async fn connect(uri: &FaceUri, fw_tx: FwSender, allocator: FaceIdAllocator) -> Result<FaceId> {
    let path = uri
        .socket_path()
        .context("invalid unix connect URI")?
        .to_string();
    let stream = UnixStream::connect(&path)
        .await
        .with_context(|| format!("failed to connect to {}", uri))?;
    info!("connected to {}", uri);
    Ok(spawn_face(
        stream,
        &path,
        FacePersistency::Persistent,
        &fw_tx,
        &allocator,
    ))
}

fn spawn_face(
    stream: UnixStream,
    path: &str,
    persistency: FacePersistency,
    fw_tx: &FwSender,
    allocator: &FaceIdAllocator,
) -> FaceId {
    let id = allocator.allocate();
    let uri = uri_for(path);

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let transport = ChannelTransport::new(out_tx, uri.clone(), uri, FaceScope::Local);
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
    let _ = write_half.shutdown().await;
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mailbox, FwReceiver};
    use rust_ndnd_common::name::Name;
    use rust_ndnd_common::packet::{Interest, Packet};
    use rust_ndnd_fwd::face::Transport;

    async fn next_input(rx: &mut FwReceiver) -> FwInput {
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for input")
            .expect("mailbox closed")
    }

    #[tokio::test]
    async fn test_unix_faces_are_local_and_framed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndnd.sock");
        let uri = FaceUri::parse(&format!("unix://{}", path.display())).unwrap();

        let (fw_tx, mut fw_rx) = mailbox();
        let allocator = FaceIdAllocator::new();
        listen(&uri, fw_tx.clone(), allocator.clone()).await.unwrap();
        let dialer_id = connect(&uri, fw_tx, allocator).await.unwrap();

        // Two faces appear: the dialer's persistent one and the accepted
        // on-demand one, both local scope.
        let mut dialer_transport = None;
        let mut accepted_id = None;
        for _ in 0..2 {
            match next_input(&mut fw_rx).await {
                FwInput::NewFace {
                    id,
                    transport,
                    persistency,
                } => {
                    assert_eq!(transport.scope(), FaceScope::Local);
                    if id == dialer_id {
                        assert_eq!(persistency, FacePersistency::Persistent);
                        dialer_transport = Some(transport);
                    } else {
                        assert_eq!(persistency, FacePersistency::OnDemand);
                        accepted_id = Some(id);
                    }
                }
                other => panic!("expected NewFace, got {:?}", other),
            }
        }

        // A packet sent through the dialer arrives framed on the accepted
        // face.
        let interest = Interest::new(Name::from_string("/localhost/ndnd/status")).with_nonce(1);
        let mut transport = dialer_transport.expect("dialer face missing");
        transport.send(interest.to_wire()).unwrap();

        match next_input(&mut fw_rx).await {
            FwInput::Packet { id, wire } => {
                assert_eq!(Some(id), accepted_id);
                match Packet::from_wire(&wire).unwrap() {
                    Packet::Interest(parsed) => assert_eq!(parsed.name, interest.name),
                    other => panic!("expected Interest, got {:?}", other),
                }
            }
            other => panic!("expected Packet, got {:?}", other),
        }
    }
}
