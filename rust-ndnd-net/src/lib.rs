//! Tokio transports for the ndnd forwarding daemon.
//!
//! Each channel (TCP, UDP, Unix) accepts or dials connections and drives
//! them as faces: a reader task frames incoming bytes and forwards them to
//! the forwarder's mailbox, a writer task drains a FIFO queue towards the
//! socket with at most one send in flight. The forwarding core stays
//! single-threaded; this crate only moves bytes.

pub mod codec;
pub mod tcp;
pub mod udp;
pub mod unix;

use bytes::Bytes;
use rust_ndnd_common::uri::FaceUri;
use rust_ndnd_common::{Error, Result};
use rust_ndnd_fwd::face::{FaceId, FacePersistency, FaceScope, Transport};
use std::fmt;
use tokio::sync::mpsc;

/// Input messages delivered to the forwarder task's mailbox.
pub enum FwInput {
    /// A channel created a new face; the id comes from the forwarder's
    /// allocator so packets can be tagged immediately.
    NewFace {
        id: FaceId,
        transport: Box<dyn Transport>,
        persistency: FacePersistency,
    },
    /// A complete packet arrived on a face.
    Packet { id: FaceId, wire: Bytes },
    /// The face's transport died.
    FaceClosed { id: FaceId, reason: String },
}

impl fmt::Debug for FwInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewFace { id, .. } => f.debug_struct("NewFace").field("id", id).finish(),
            Self::Packet { id, wire } => f
                .debug_struct("Packet")
                .field("id", id)
                .field("len", &wire.len())
                .finish(),
            Self::FaceClosed { id, reason } => f
                .debug_struct("FaceClosed")
                .field("id", id)
                .field("reason", reason)
                .finish(),
        }
    }
}

pub type FwSender = mpsc::UnboundedSender<FwInput>;
pub type FwReceiver = mpsc::UnboundedReceiver<FwInput>;

/// Creates the forwarder mailbox.
pub fn mailbox() -> (FwSender, FwReceiver) {
    mpsc::unbounded_channel()
}

/// The [`Transport`] handed to the forwarding core: sends go into an
/// unbounded FIFO queue drained by the face's writer task.
pub struct ChannelTransport {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    local: FaceUri,
    remote: FaceUri,
    scope: FaceScope,
}

impl ChannelTransport {
    pub fn new(
        tx: mpsc::UnboundedSender<Bytes>,
        local: FaceUri,
        remote: FaceUri,
        scope: FaceScope,
    ) -> Self {
        Self {
            tx: Some(tx),
            local,
            remote,
            scope,
        }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, packet: Bytes) -> Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(packet)
                .map_err(|_| Error::Face("send queue closed".into())),
            None => Err(Error::Face("transport closed".into())),
        }
    }

    fn close(&mut self) {
        // Dropping the sender lets the writer task drain and exit.
        self.tx = None;
    }

    fn local_uri(&self) -> &FaceUri {
        &self.local
    }

    fn remote_uri(&self) -> &FaceUri {
        &self.remote
    }

    fn scope(&self) -> FaceScope {
        self.scope
    }
}
