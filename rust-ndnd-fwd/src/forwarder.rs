//! The forwarder pipeline.
//!
//! A state machine over the named transitions: incoming/outgoing Interest,
//! Interest reject and finalize, incoming/outgoing Data. The forwarder
//! exclusively owns the tables and the face table; strategies reach the
//! tables only through the strategy context. Everything runs on a single
//! cooperative loop whose clock lives in the scheduler.

use crate::clock::{Scheduler, StrategyTimerKind, TimerEvent};
use crate::face::{Face, FaceId, FaceIdAllocator, FacePersistency, FaceTable, Transport};
use crate::strategy::best_route::BestRouteStrategy;
use crate::strategy::broadcast::BroadcastStrategy;
use crate::strategy::ncc::NccStrategy;
use crate::strategy::simple_lb::SimpleLoadBalancerStrategy;
use crate::strategy::weighted_lb::WeightedLoadBalancerStrategy;
use crate::strategy::{Strategy, StrategyAction, StrategyContext};
use crate::tables::cs::{ContentStore, DEFAULT_CS_CAPACITY};
use crate::tables::fib::{Fib, FibEntry};
use crate::tables::measurements::{Measurements, MeasurementsAccessor};
use crate::tables::name_tree::NameTree;
use crate::tables::pit::{Pit, PitKey, STRAGGLER_TIME};
use crate::tables::strategy_choice::{StrategyChoice, StrategyId, StrategyRegistry};
use bytes::Bytes;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rust_ndnd_common::metrics::ForwarderMetrics;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest, Nack, NackReason, Packet};
use rust_ndnd_common::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Names under this prefix are only valid on local faces.
const LOCALHOST_COMPONENT: &[u8] = b"localhost";

/// Default capacity of the PIT, in entries.
pub const DEFAULT_PIT_CAPACITY: usize = 65536;

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub cs_capacity: usize,
    pub pit_capacity: usize,
    /// Admit Data that matched no PIT entry into the Content Store.
    pub admit_unsolicited: bool,
    /// Seed for the forwarder's RNG; random when absent. Fixed in tests.
    pub rng_seed: Option<u64>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            cs_capacity: DEFAULT_CS_CAPACITY,
            pit_capacity: DEFAULT_PIT_CAPACITY,
            admit_unsolicited: false,
            rng_seed: None,
        }
    }
}

// Field order is teardown order: strategies first, then the tables that
// reference each other, faces, and the loop state last.
pub struct Forwarder {
    strategies: StrategyRegistry,
    strategy_choice: StrategyChoice,
    pit: Pit,
    measurements: Measurements,
    fib: Fib,
    cs: ContentStore,
    name_tree: NameTree,
    faces: FaceTable,
    scheduler: Scheduler,
    rng: StdRng,
    metrics: Arc<ForwarderMetrics>,
    admit_unsolicited: bool,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().next_u64()),
        };

        let mut forwarder = Self {
            scheduler: Scheduler::new(),
            faces: FaceTable::new(),
            name_tree: NameTree::new(),
            fib: Fib::new(),
            pit: Pit::new(config.pit_capacity),
            cs: ContentStore::new(config.cs_capacity),
            measurements: Measurements::new(),
            strategy_choice: StrategyChoice::new(),
            strategies: StrategyRegistry::new(),
            rng,
            metrics: Arc::new(ForwarderMetrics::new()),
            admit_unsolicited: config.admit_unsolicited,
        };

        let best_route = forwarder
            .strategies
            .install(Box::new(BestRouteStrategy::new()));
        forwarder
            .strategies
            .install(Box::new(BroadcastStrategy::new()));
        forwarder.strategies.install(Box::new(NccStrategy::new()));
        forwarder
            .strategies
            .install(Box::new(SimpleLoadBalancerStrategy::new()));
        forwarder
            .strategies
            .install(Box::new(WeightedLoadBalancerStrategy::new()));

        // Every name has a governing strategy: best-route at the root.
        forwarder
            .strategy_choice
            .insert_id(&mut forwarder.name_tree, &Name::root(), best_route);

        forwarder
    }

    /* ------------------------------------------------------------ *
     * Event-loop surface
     * ------------------------------------------------------------ */

    pub fn now(&self) -> Instant {
        self.scheduler.now()
    }

    /// Moves the clock to wall time and fires every due timer.
    pub fn advance_clock(&mut self, now: Instant) {
        self.scheduler.advance_to(now);
        self.process_timers();
    }

    /// Moves the clock forward by `d` (virtual time in tests).
    pub fn advance(&mut self, d: Duration) {
        self.scheduler.advance(d);
        self.process_timers();
    }

    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    fn process_timers(&mut self) {
        while let Some(event) = self.scheduler.pop_due() {
            self.dispatch_timer(event);
        }
    }

    fn dispatch_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::PitExpire { key } => self.on_interest_finalize(&key),
            TimerEvent::MeasurementsExpire { name } => {
                self.measurements
                    .handle_expiry(&mut self.name_tree, &mut self.scheduler, &name)
            }
            TimerEvent::Strategy { key, kind } => self.trigger_strategy_timer(&key, kind),
        }
    }

    /// Entry point for a raw packet received on a face.
    pub fn handle_packet(&mut self, face_id: FaceId, wire: Bytes) {
        let packet = {
            let Some(face) = self.faces.get_mut(face_id) else {
                debug!("packet from unknown {}", face_id);
                return;
            };
            if !face.is_up() {
                return;
            }
            face.counters.n_in_bytes.add(wire.len() as u64);
            match Packet::from_wire(&wire) {
                Ok(packet) => {
                    match &packet {
                        Packet::Interest(_) => face.counters.n_in_interests.increment(),
                        Packet::Data(_) => face.counters.n_in_data.increment(),
                        Packet::Nack(_) => {}
                    }
                    packet
                }
                Err(err) => {
                    // Malformed packets are dropped without failing the face.
                    self.metrics.malformed_packets.increment();
                    warn!("[{}] malformed packet: {}", face_id, err);
                    return;
                }
            }
        };

        match packet {
            Packet::Interest(interest) => self.on_incoming_interest(face_id, interest),
            Packet::Data(data) => self.on_incoming_data(face_id, data),
            Packet::Nack(nack) => self.on_incoming_nack(face_id, nack),
        }
    }

    /// The face's transport died: retire the id and purge it everywhere.
    pub fn handle_face_closed(&mut self, face_id: FaceId, reason: &str) {
        info!("[{}] closed: {}", face_id, reason);
        if let Some(mut face) = self.faces.remove(face_id) {
            face.fail(reason);
        }
        self.purge_face(face_id);
    }

    fn purge_face(&mut self, face_id: FaceId) {
        self.fib.remove_face(&mut self.name_tree, face_id);
        self.metrics.fib_size.set(self.fib.len() as u64);

        let now = self.scheduler.now();
        let keys: Vec<PitKey> = self.pit.keys().cloned().collect();
        for key in keys {
            if let Some(entry) = self.pit.get_mut(&key) {
                entry.remove_face(face_id);
                if !entry.has_records() {
                    entry.shorten_expiry(now + STRAGGLER_TIME);
                    entry.reschedule_expiry(&mut self.scheduler);
                }
            }
        }
    }

    /* ------------------------------------------------------------ *
     * Interest pipeline
     * ------------------------------------------------------------ */

    pub fn on_incoming_interest(&mut self, in_face: FaceId, mut interest: Interest) {
        self.metrics.interests_received.increment();
        let now = self.scheduler.now();
        trace!("[{}] incoming Interest {}", in_face, interest.name);

        // Hop limit: drop at zero, decrement otherwise. At one remaining
        // hop the Interest may still be answered from the Content Store
        // but is not forwarded.
        let mut is_last_hop = false;
        if let Some(hops) = interest.hop_limit {
            if hops == 0 {
                debug!("[{}] hop limit exhausted for {}", in_face, interest.name);
                return;
            }
            interest.hop_limit = Some(hops - 1);
            is_last_hop = hops - 1 == 0;
        }

        // /localhost scope on a non-local face: drop silently.
        if interest.name.starts_with(LOCALHOST_COMPONENT) && !self.face_is_local(in_face) {
            self.metrics.scope_violations.increment();
            debug!("[{}] scope violation for {}", in_face, interest.name);
            return;
        }

        let nonce = match interest.nonce {
            Some(nonce) => nonce,
            None => {
                let nonce = self.rng.next_u32();
                interest.nonce = Some(nonce);
                nonce
            }
        };

        let key = PitKey::of(&interest);
        let is_new = match self.pit.insert_or_get(&mut self.name_tree, &interest, now) {
            Some((_, is_new)) => is_new,
            None => {
                // PIT exhaustion: the new Interest is not admitted.
                warn!("PIT full, dropping Interest {}", interest.name);
                return;
            }
        };
        if is_new {
            self.metrics.pit_inserts.increment();
            self.metrics.pit_size.set(self.pit.len() as u64);
        }

        // A nonce seen in any record of this entry marks a duplicate:
        // either a loop through another face or a same-nonce
        // retransmission.
        let is_loop = match self.pit.get(&key) {
            Some(entry) => !is_new && entry.has_duplicate_nonce(nonce),
            None => false,
        };
        if is_loop {
            self.on_interest_loop(in_face, interest);
            return;
        }

        // Content Store lookup.
        if let Some(data) = self.cs.find(&interest, now).cloned() {
            self.metrics.cs_hits.increment();
            self.on_content_store_hit(in_face, &key, data);
            return;
        }
        self.metrics.cs_misses.increment();

        let lifetime = Duration::from_millis(interest.lifetime_ms);
        if let Some(entry) = self.pit.get_mut(&key) {
            entry.insert_or_update_in_record(in_face, nonce, now + lifetime);
            entry.update_interest(interest);
            entry.reschedule_expiry(&mut self.scheduler);
        }

        if is_last_hop {
            debug!("not forwarding {}: last hop", key.name);
            return;
        }

        self.trigger_after_receive(in_face, &key);
    }

    fn on_interest_loop(&mut self, in_face: FaceId, interest: Interest) {
        self.metrics.loops_detected.increment();
        debug!(
            "[{}] duplicate nonce for {}, sending Nack",
            in_face, interest.name
        );
        let nack = Nack::new(NackReason::Duplicate, interest);
        if let Some(face) = self.faces.get_mut(in_face) {
            if face.is_up() {
                if let Err(err) = face.send_nack(&nack) {
                    face.fail(&err.to_string());
                }
            }
        }
    }

    fn on_content_store_hit(&mut self, in_face: FaceId, key: &PitKey, data: Data) {
        trace!("[{}] CS hit for {}", in_face, key.name);
        let now = self.scheduler.now();
        if let Some(entry) = self.pit.get_mut(key) {
            entry.mark_satisfied();
            entry.set_expiry(now + STRAGGLER_TIME);
            entry.reschedule_expiry(&mut self.scheduler);
        }
        self.on_outgoing_data(in_face, &data);
    }

    fn on_outgoing_interest(&mut self, key: &PitKey, out_face: FaceId, want_new_nonce: bool) {
        let now = self.scheduler.now();
        let Some(entry) = self.pit.get_mut(key) else {
            return;
        };
        let mut interest = entry.interest().clone();

        // Reuse the downstream nonce unless the strategy asked for a fresh
        // one.
        let nonce = match (want_new_nonce, interest.nonce) {
            (false, Some(nonce)) => nonce,
            _ => self.rng.next_u32(),
        };
        interest.nonce = Some(nonce);

        let lifetime = Duration::from_millis(interest.lifetime_ms);
        entry.insert_or_update_out_record(out_face, nonce, now + lifetime);
        entry.reschedule_expiry(&mut self.scheduler);

        match self.faces.get_mut(out_face) {
            Some(face) if face.is_up() => {
                if let Err(err) = face.send_interest(&interest) {
                    // The out-record stays; the strategy learns of the
                    // failure on timeout.
                    face.fail(&err.to_string());
                }
            }
            _ => debug!("[{}] unusable, out-record kept for timeout", out_face),
        }
    }

    fn on_interest_reject(&mut self, key: &PitKey) {
        trace!("rejecting pending Interest {}", key.name);
        self.metrics.pit_rejections.increment();
        let now = self.scheduler.now();
        if let Some(entry) = self.pit.get_mut(key) {
            entry.shorten_expiry(now + STRAGGLER_TIME);
            entry.reschedule_expiry(&mut self.scheduler);
        }
    }

    fn on_interest_finalize(&mut self, key: &PitKey) {
        let now = self.scheduler.now();
        let (satisfied, had_in_record) = match self.pit.get_mut(key) {
            Some(entry) => {
                if entry.expiry() > now {
                    // The expiry moved since this timer was armed.
                    entry.reschedule_expiry(&mut self.scheduler);
                    return;
                }
                (entry.is_satisfied(), entry.had_in_record())
            }
            None => return,
        };

        if !satisfied && had_in_record {
            self.metrics.pit_expirations.increment();
            self.trigger_before_expire(key);
        }
        self.pit.remove(&mut self.name_tree, &mut self.scheduler, key);
        self.metrics.pit_size.set(self.pit.len() as u64);
    }

    /* ------------------------------------------------------------ *
     * Data pipeline
     * ------------------------------------------------------------ */

    pub fn on_incoming_data(&mut self, in_face: FaceId, data: Data) {
        self.metrics.data_received.increment();
        let now = self.scheduler.now();
        trace!("[{}] incoming Data {}", in_face, data.name);

        if data.name.starts_with(LOCALHOST_COMPONENT) && !self.face_is_local(in_face) {
            self.metrics.scope_violations.increment();
            debug!("[{}] scope violation for {}", in_face, data.name);
            return;
        }

        let matches = self.pit.find_all_matching(&self.name_tree, &data, now);
        if matches.is_empty() {
            self.metrics.unsolicited_data.increment();
            if self.admit_unsolicited {
                self.insert_into_cs(data, now);
            } else {
                debug!("[{}] unsolicited Data {} dropped", in_face, data.name);
            }
            return;
        }

        self.insert_into_cs(data.clone(), now);

        for key in matches {
            self.metrics.pit_satisfied.increment();
            self.trigger_before_satisfy(&key, in_face, &data);

            // Return Data to every downstream still inside its straggler
            // window, then keep the entry only long enough to absorb late
            // duplicates.
            let downstreams: Vec<FaceId> = match self.pit.get_mut(&key) {
                Some(entry) => {
                    let list = entry
                        .in_records()
                        .iter()
                        .filter(|r| r.face != in_face && r.expiry + STRAGGLER_TIME > now)
                        .map(|r| r.face)
                        .collect();
                    entry.mark_satisfied();
                    entry.set_expiry(now + STRAGGLER_TIME);
                    entry.reschedule_expiry(&mut self.scheduler);
                    list
                }
                None => Vec::new(),
            };
            for face in downstreams {
                self.on_outgoing_data(face, &data);
            }
        }
    }

    fn insert_into_cs(&mut self, data: Data, now: Instant) {
        let evicted = self.cs.insert(data, now);
        self.metrics.cs_inserts.increment();
        self.metrics.cs_evictions.add(evicted as u64);
        self.metrics.cs_size.set(self.cs.len() as u64);
    }

    fn on_outgoing_data(&mut self, out_face: FaceId, data: &Data) {
        match self.faces.get_mut(out_face) {
            Some(face) if face.is_up() => {
                if let Err(err) = face.send_data(data) {
                    face.fail(&err.to_string());
                }
            }
            _ => debug!("[{}] unusable, Data not sent", out_face),
        }
    }

    pub fn on_incoming_nack(&mut self, in_face: FaceId, nack: Nack) {
        self.metrics.nacks_received.increment();
        debug!(
            "[{}] incoming Nack {} for {}",
            in_face, nack.reason, nack.interest.name
        );
        let key = PitKey::of(&nack.interest);
        if let (Some(entry), Some(nonce)) = (self.pit.get_mut(&key), nack.interest.nonce) {
            if !entry.mark_nacked(in_face, nonce) {
                trace!("Nack matches no out-record, ignored");
            }
        }
    }

    /* ------------------------------------------------------------ *
     * Strategy dispatch
     * ------------------------------------------------------------ */

    fn trigger_after_receive(&mut self, in_face: FaceId, key: &PitKey) {
        let actions = {
            let Self {
                scheduler,
                rng,
                measurements,
                name_tree,
                fib,
                pit,
                strategy_choice,
                strategies,
                faces,
                ..
            } = self;
            let Some(entry) = pit.get_mut(key) else {
                return;
            };
            let Some(sid) = strategy_choice.find_effective_strategy(name_tree, &key.name) else {
                warn!("no strategy governs {}", key.name);
                return;
            };
            let Some(strategy) = strategies.get_mut(sid) else {
                return;
            };
            let fib_entry = fib.find_longest_prefix_match(name_tree, &key.name);
            let interest = entry.interest().clone();
            let mut ctx = StrategyContext {
                scheduler,
                rng,
                measurements,
                name_tree,
                choices: strategy_choice,
                faces,
                owner: sid,
                pit_key: key.clone(),
                actions: Vec::new(),
            };
            strategy.after_receive_interest(&mut ctx, in_face, &interest, fib_entry, entry);
            ctx.actions
        };
        self.apply_actions(key, actions);
    }

    fn trigger_before_satisfy(&mut self, key: &PitKey, in_face: FaceId, data: &Data) {
        let actions = {
            let Self {
                scheduler,
                rng,
                measurements,
                name_tree,
                pit,
                strategy_choice,
                strategies,
                faces,
                ..
            } = self;
            let Some(entry) = pit.get_mut(key) else {
                return;
            };
            let Some(sid) = strategy_choice.find_effective_strategy(name_tree, &key.name) else {
                return;
            };
            let Some(strategy) = strategies.get_mut(sid) else {
                return;
            };
            let mut ctx = StrategyContext {
                scheduler,
                rng,
                measurements,
                name_tree,
                choices: strategy_choice,
                faces,
                owner: sid,
                pit_key: key.clone(),
                actions: Vec::new(),
            };
            strategy.before_satisfy_interest(&mut ctx, entry, in_face, data);
            ctx.actions
        };
        if !actions.is_empty() {
            // The satisfy trigger may only record.
            warn!("strategy queued actions during satisfy, ignoring");
        }
    }

    fn trigger_before_expire(&mut self, key: &PitKey) {
        let Self {
            scheduler,
            rng,
            measurements,
            name_tree,
            pit,
            strategy_choice,
            strategies,
            faces,
            ..
        } = self;
        let Some(entry) = pit.get_mut(key) else {
            return;
        };
        let Some(sid) = strategy_choice.find_effective_strategy(name_tree, &key.name) else {
            return;
        };
        let Some(strategy) = strategies.get_mut(sid) else {
            return;
        };
        let mut ctx = StrategyContext {
            scheduler,
            rng,
            measurements,
            name_tree,
            choices: strategy_choice,
            faces,
            owner: sid,
            pit_key: key.clone(),
            actions: Vec::new(),
        };
        strategy.before_expire_interest(&mut ctx, entry);
    }

    fn trigger_strategy_timer(&mut self, key: &PitKey, kind: StrategyTimerKind) {
        let actions = {
            let Self {
                scheduler,
                rng,
                measurements,
                name_tree,
                fib,
                pit,
                strategy_choice,
                strategies,
                faces,
                ..
            } = self;
            let Some(entry) = pit.get_mut(key) else {
                return;
            };
            let Some(sid) = strategy_choice.find_effective_strategy(name_tree, &key.name) else {
                return;
            };
            let Some(strategy) = strategies.get_mut(sid) else {
                return;
            };
            let fib_entry = fib.find_longest_prefix_match(name_tree, &key.name);
            let mut ctx = StrategyContext {
                scheduler,
                rng,
                measurements,
                name_tree,
                choices: strategy_choice,
                faces,
                owner: sid,
                pit_key: key.clone(),
                actions: Vec::new(),
            };
            strategy.on_timer(&mut ctx, entry, fib_entry, kind);
            ctx.actions
        };
        self.apply_actions(key, actions);
    }

    fn apply_actions(&mut self, key: &PitKey, actions: Vec<StrategyAction>) {
        for action in actions {
            match action {
                StrategyAction::SendInterest {
                    face,
                    want_new_nonce,
                } => self.on_outgoing_interest(key, face, want_new_nonce),
                StrategyAction::Reject => self.on_interest_reject(key),
            }
        }
    }

    fn face_is_local(&self, face_id: FaceId) -> bool {
        self.faces
            .get(face_id)
            .map(Face::is_local)
            .unwrap_or(false)
    }

    /* ------------------------------------------------------------ *
     * Management surface (synchronous on the loop)
     * ------------------------------------------------------------ */

    pub fn add_face(
        &mut self,
        transport: Box<dyn Transport>,
        persistency: FacePersistency,
    ) -> FaceId {
        self.faces.add(transport, persistency)
    }

    /// Registers a face whose id was pre-allocated by this forwarder's
    /// allocator (the transport layer tags packets before the face is
    /// registered).
    pub fn add_face_with_id(
        &mut self,
        id: FaceId,
        transport: Box<dyn Transport>,
        persistency: FacePersistency,
    ) {
        self.faces.add_with_id(id, transport, persistency);
    }

    pub fn face_id_allocator(&self) -> FaceIdAllocator {
        self.faces.allocator()
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter()
    }

    /// Closes and retires a face, purging it from every table.
    pub fn remove_face(&mut self, id: FaceId) {
        if let Some(mut face) = self.faces.remove(id) {
            face.close();
        }
        self.purge_face(id);
    }

    pub fn fib_insert(&mut self, name: &Name, face: FaceId, cost: u32) {
        self.fib
            .insert_next_hop(&mut self.name_tree, name, face, cost);
        self.metrics.fib_size.set(self.fib.len() as u64);
    }

    pub fn fib_remove(&mut self, name: &Name, face: FaceId) {
        self.fib.remove_next_hop(&mut self.name_tree, name, face);
        self.metrics.fib_size.set(self.fib.len() as u64);
    }

    pub fn fib_erase(&mut self, name: &Name) {
        self.fib.erase(&mut self.name_tree, name);
        self.metrics.fib_size.set(self.fib.len() as u64);
    }

    pub fn fib_entries(&self) -> impl Iterator<Item = &FibEntry> {
        self.fib.entries()
    }

    pub fn install_strategy(&mut self, strategy: Box<dyn Strategy>) -> StrategyId {
        self.strategies.install(strategy)
    }

    pub fn uninstall_strategy(&mut self, name: &Name) -> Result<()> {
        self.strategies.uninstall(name, &self.strategy_choice)
    }

    pub fn set_strategy_choice(&mut self, prefix: &Name, strategy_name: &Name) -> Result<StrategyId> {
        self.strategy_choice
            .insert(&mut self.name_tree, &self.strategies, prefix, strategy_name)
    }

    pub fn unset_strategy_choice(&mut self, prefix: &Name) -> Result<()> {
        self.strategy_choice.erase(&mut self.name_tree, prefix)
    }

    pub fn strategy_id(&self, name: &Name) -> Option<StrategyId> {
        self.strategies.id_of(name)
    }

    pub fn effective_strategy(&self, name: &Name) -> Option<StrategyId> {
        self.strategy_choice
            .find_effective_strategy(&self.name_tree, name)
    }

    /// Read-only Measurements introspection.
    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    /// The owner-scoped Measurements view of an installed strategy.
    pub fn measurements_accessor(&mut self, owner: StrategyId) -> MeasurementsAccessor<'_> {
        MeasurementsAccessor {
            measurements: &mut self.measurements,
            name_tree: &mut self.name_tree,
            scheduler: &mut self.scheduler,
            choices: &self.strategy_choice,
            owner,
        }
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn cs(&self) -> &ContentStore {
        &self.cs
    }

    pub fn fib(&self) -> &Fib {
        &self.fib
    }

    pub fn name_tree(&self) -> &NameTree {
        &self.name_tree
    }

    pub fn metrics(&self) -> Arc<ForwarderMetrics> {
        Arc::clone(&self.metrics)
    }
}
