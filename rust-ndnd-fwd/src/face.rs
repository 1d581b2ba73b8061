//! The face abstraction.
//!
//! A face is a bidirectional packet-oriented endpoint identified by a
//! process-unique [`FaceId`]. The forwarding core talks to a face only
//! through the [`Transport`] trait; the concrete I/O (TCP, UDP, Unix
//! sockets) lives in the transport crate. The face table is the sole owner
//! of faces; tables and strategies refer to faces by id and resolve them at
//! use time.

use bytes::Bytes;
use log::{debug, warn};
use rust_ndnd_common::metrics::Counter;
use rust_ndnd_common::packet::{Data, Interest, Nack};
use rust_ndnd_common::uri::FaceUri;
use rust_ndnd_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Unique identifier for a face, assigned at registration and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face{}", self.0)
    }
}

/// Whether the remote endpoint is on the local machine. Packets under
/// /localhost are only valid on local faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceScope {
    NonLocal,
    Local,
}

/// How a face came to exist and how failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacePersistency {
    /// Explicitly configured; failure is reported upward.
    Persistent,
    /// Created by an accepting channel; removed silently on failure.
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    Up,
    Closed,
}

/// The transport half of a face. Implementations must queue sends FIFO and
/// never block; a returned error means the transport is dead.
pub trait Transport: Send {
    fn send(&mut self, packet: Bytes) -> Result<()>;
    fn close(&mut self);
    fn local_uri(&self) -> &FaceUri;
    fn remote_uri(&self) -> &FaceUri;
    fn scope(&self) -> FaceScope;
}

/// Per-face monotonic counters.
#[derive(Debug, Default, Clone)]
pub struct FaceCounters {
    pub n_in_interests: Counter,
    pub n_in_data: Counter,
    pub n_in_bytes: Counter,
    pub n_out_interests: Counter,
    pub n_out_data: Counter,
    pub n_out_bytes: Counter,
}

pub struct Face {
    id: FaceId,
    transport: Box<dyn Transport>,
    persistency: FacePersistency,
    state: FaceState,
    pub counters: FaceCounters,
}

impl Face {
    pub fn new(id: FaceId, transport: Box<dyn Transport>, persistency: FacePersistency) -> Self {
        Self {
            id,
            transport,
            persistency,
            state: FaceState::Up,
            counters: FaceCounters::default(),
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn persistency(&self) -> FacePersistency {
        self.persistency
    }

    pub fn state(&self) -> FaceState {
        self.state
    }

    pub fn is_up(&self) -> bool {
        self.state == FaceState::Up
    }

    pub fn scope(&self) -> FaceScope {
        self.transport.scope()
    }

    pub fn is_local(&self) -> bool {
        self.scope() == FaceScope::Local
    }

    pub fn local_uri(&self) -> &FaceUri {
        self.transport.local_uri()
    }

    pub fn remote_uri(&self) -> &FaceUri {
        self.transport.remote_uri()
    }

    pub fn send_interest(&mut self, interest: &Interest) -> Result<()> {
        // The counter tracks send attempts, not completed transmissions.
        self.counters.n_out_interests.increment();
        let wire = interest.to_wire();
        debug!("[{}] send Interest {}", self.id, interest.name);
        self.send_packet(wire)
    }

    pub fn send_data(&mut self, data: &Data) -> Result<()> {
        self.counters.n_out_data.increment();
        let wire = data.to_wire();
        debug!("[{}] send Data {}", self.id, data.name);
        self.send_packet(wire)
    }

    pub fn send_nack(&mut self, nack: &Nack) -> Result<()> {
        let wire = nack.to_wire();
        debug!(
            "[{}] send Nack {} for {}",
            self.id, nack.reason, nack.interest.name
        );
        self.send_packet(wire)
    }

    fn send_packet(&mut self, wire: Bytes) -> Result<()> {
        if self.state != FaceState::Up {
            return Err(Error::Face(format!("{} is closed", self.id)));
        }
        self.counters.n_out_bytes.add(wire.len() as u64);
        self.transport.send(wire)
    }

    /// Orderly shutdown requested by management.
    pub fn close(&mut self) {
        if self.state == FaceState::Up {
            debug!("[{}] closing", self.id);
            self.transport.close();
            self.state = FaceState::Closed;
        }
    }

    /// Terminal failure. Emitted at most once; further sends are refused.
    pub fn fail(&mut self, reason: &str) {
        if self.state == FaceState::Up {
            warn!("[{}] failed: {}", self.id, reason);
            self.transport.close();
            self.state = FaceState::Closed;
        }
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("id", &self.id)
            .field("remote", &self.remote_uri().to_string())
            .field("state", &self.state)
            .finish()
    }
}

/// Hands out process-unique, monotonically increasing face ids. Shared with
/// the transport layer so a face id exists before the forwarder sees the
/// face.
#[derive(Debug, Clone, Default)]
pub struct FaceIdAllocator {
    next: Arc<AtomicU32>,
}

impl FaceIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> FaceId {
        FaceId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Registry of all live faces, ordered by id.
#[derive(Debug, Default)]
pub struct FaceTable {
    faces: BTreeMap<FaceId, Face>,
    allocator: FaceIdAllocator,
}

impl FaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocator(&self) -> FaceIdAllocator {
        self.allocator.clone()
    }

    /// Registers a face under a freshly allocated id.
    pub fn add(
        &mut self,
        transport: Box<dyn Transport>,
        persistency: FacePersistency,
    ) -> FaceId {
        let id = self.allocator.allocate();
        self.add_with_id(id, transport, persistency);
        id
    }

    /// Registers a face under an id allocated earlier by this table's
    /// allocator.
    pub fn add_with_id(
        &mut self,
        id: FaceId,
        transport: Box<dyn Transport>,
        persistency: FacePersistency,
    ) {
        let face = Face::new(id, transport, persistency);
        debug!("[{}] registered, remote {}", id, face.remote_uri());
        self.faces.insert(id, face);
    }

    pub fn get(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(&id)
    }

    pub fn get_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(&id)
    }

    pub fn is_up(&self, id: FaceId) -> bool {
        self.faces.get(&id).map(Face::is_up).unwrap_or(false)
    }

    /// Retires a face id. The face is dropped once removed here since no
    /// table holds more than the id.
    pub fn remove(&mut self, id: FaceId) -> Option<Face> {
        self.faces.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Face> {
        self.faces.values()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
