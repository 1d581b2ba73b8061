//! The Pending Interest Table.
//!
//! Entries are keyed by (name, selector fingerprint) and aggregate all
//! downstream requesters (in-records) and upstream forwardings
//! (out-records) for one Interest. There is at most one in-record and one
//! out-record per face per entry.

use crate::clock::{EventId, Scheduler, TimerEvent};
use crate::face::FaceId;
use crate::strategy::PitStrategyInfo;
use crate::tables::name_tree::{NameTree, TableRef};
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The Interest selectors that distinguish PIT entries under one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectorKey {
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
}

impl SelectorKey {
    pub fn of(interest: &Interest) -> Self {
        Self {
            can_be_prefix: interest.can_be_prefix,
            must_be_fresh: interest.must_be_fresh,
        }
    }

    fn all() -> [Self; 4] {
        [
            Self { can_be_prefix: false, must_be_fresh: false },
            Self { can_be_prefix: false, must_be_fresh: true },
            Self { can_be_prefix: true, must_be_fresh: false },
            Self { can_be_prefix: true, must_be_fresh: true },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PitKey {
    pub name: Name,
    pub selectors: SelectorKey,
}

impl PitKey {
    pub fn of(interest: &Interest) -> Self {
        Self {
            name: interest.name.clone(),
            selectors: SelectorKey::of(interest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub expiry: Instant,
}

#[derive(Debug, Clone)]
pub struct OutRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub expiry: Instant,
    /// Set when a Nack came back on this face.
    pub nacked: bool,
}

#[derive(Debug)]
pub struct PitEntry {
    key: PitKey,
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
    /// Per-strategy scratch slot.
    pub strategy_info: Option<PitStrategyInfo>,
    satisfied: bool,
    had_in_record: bool,
    expiry: Instant,
    timer: Option<EventId>,
}

impl PitEntry {
    fn new(interest: Interest, now: Instant) -> Self {
        Self {
            key: PitKey::of(&interest),
            interest,
            in_records: Vec::new(),
            out_records: Vec::new(),
            strategy_info: None,
            satisfied: false,
            had_in_record: false,
            expiry: now,
            timer: None,
        }
    }

    pub fn key(&self) -> &PitKey {
        &self.key
    }

    pub fn name(&self) -> &Name {
        &self.key.name
    }

    /// The most recently received Interest for this entry.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn had_in_record(&self) -> bool {
        self.had_in_record
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    /// True if any in-record or out-record carries this nonce. Used for
    /// duplicate/loop classification.
    pub fn has_duplicate_nonce(&self, nonce: u32) -> bool {
        self.in_records.iter().any(|r| r.nonce == nonce)
            || self.out_records.iter().any(|r| r.nonce == nonce)
    }

    pub fn has_unexpired_out_records(&self, now: Instant) -> bool {
        self.out_records.iter().any(|r| r.expiry > now)
    }

    /// Whether a strategy may forward this entry to `face`: the face has no
    /// unexpired out-record yet, and some other face is still waiting.
    pub fn can_forward_to(&self, face: FaceId, now: Instant) -> bool {
        let already_sent = self
            .out_records
            .iter()
            .any(|r| r.face == face && r.expiry > now);
        if already_sent {
            return false;
        }
        self.in_records
            .iter()
            .any(|r| r.face != face && r.expiry > now)
    }

    pub fn insert_or_update_in_record(&mut self, face: FaceId, nonce: u32, expiry: Instant) {
        self.had_in_record = true;
        match self.in_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.nonce = nonce;
                record.expiry = expiry;
            }
            None => self.in_records.push(InRecord { face, nonce, expiry }),
        }
        if expiry > self.expiry {
            self.expiry = expiry;
        }
    }

    pub fn insert_or_update_out_record(&mut self, face: FaceId, nonce: u32, expiry: Instant) {
        match self.out_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.nonce = nonce;
                record.expiry = expiry;
                record.nacked = false;
            }
            None => self.out_records.push(OutRecord {
                face,
                nonce,
                expiry,
                nacked: false,
            }),
        }
        if expiry > self.expiry {
            self.expiry = expiry;
        }
    }

    /// Marks the out-record towards `face` as Nacked, if one exists with
    /// this nonce.
    pub fn mark_nacked(&mut self, face: FaceId, nonce: u32) -> bool {
        match self
            .out_records
            .iter_mut()
            .find(|r| r.face == face && r.nonce == nonce)
        {
            Some(record) => {
                record.nacked = true;
                true
            }
            None => false,
        }
    }

    pub fn update_interest(&mut self, interest: Interest) {
        self.interest = interest;
    }

    /// Marks the entry satisfied and clears the in-records; the entry then
    /// lingers only for the straggler window.
    pub fn mark_satisfied(&mut self) {
        self.satisfied = true;
        self.in_records.clear();
    }

    /// Drops all records referencing `face` (used on face retirement).
    pub fn remove_face(&mut self, face: FaceId) {
        self.in_records.retain(|r| r.face != face);
        self.out_records.retain(|r| r.face != face);
    }

    pub fn has_records(&self) -> bool {
        !self.in_records.is_empty() || !self.out_records.is_empty()
    }

    /// Shortens the entry expiry to `at` (never lengthens through this
    /// path).
    pub fn shorten_expiry(&mut self, at: Instant) {
        if at < self.expiry {
            self.expiry = at;
        }
    }

    pub fn set_expiry(&mut self, at: Instant) {
        self.expiry = at;
    }

    /// Re-arms the single expiry timer to the entry's current expiry.
    pub fn reschedule_expiry(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        self.timer = Some(scheduler.schedule_at(
            self.expiry,
            TimerEvent::PitExpire {
                key: self.key.clone(),
            },
        ));
    }

    /// Cancels every timer owned by this entry (expiry plus strategy
    /// timers). Called on entry destruction.
    pub fn cancel_timers(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        if let Some(info) = &mut self.strategy_info {
            for timer in info.take_timers() {
                scheduler.cancel(timer);
            }
        }
    }
}

#[derive(Debug)]
pub struct Pit {
    entries: HashMap<PitKey, PitEntry>,
    capacity: usize,
}

impl Pit {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Finds or creates the entry for `interest`. Returns the entry and
    /// whether it was created; `None` when the table is full.
    pub fn insert_or_get(
        &mut self,
        name_tree: &mut NameTree,
        interest: &Interest,
        now: Instant,
    ) -> Option<(&mut PitEntry, bool)> {
        let key = PitKey::of(interest);
        let is_new = !self.entries.contains_key(&key);
        if is_new {
            if self.entries.len() >= self.capacity {
                return None;
            }
            name_tree.register(&key.name, TableRef::Pit);
            self.entries
                .insert(key.clone(), PitEntry::new(interest.clone(), now));
        }
        self.entries.get_mut(&key).map(|entry| (entry, is_new))
    }

    pub fn get(&self, key: &PitKey) -> Option<&PitEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PitKey) -> Option<&mut PitEntry> {
        self.entries.get_mut(key)
    }

    /// Erases the entry, cancelling its timers and dropping its NameTree
    /// reference.
    pub fn remove(
        &mut self,
        name_tree: &mut NameTree,
        scheduler: &mut Scheduler,
        key: &PitKey,
    ) -> Option<PitEntry> {
        let mut entry = self.entries.remove(key)?;
        entry.cancel_timers(scheduler);
        name_tree.unregister(&key.name, TableRef::Pit);
        Some(entry)
    }

    /// Every unsatisfied entry whose name is a prefix of `data.name` and
    /// whose selectors accept `data`.
    pub fn find_all_matching(
        &self,
        name_tree: &NameTree,
        data: &Data,
        _now: Instant,
    ) -> Vec<PitKey> {
        let mut matches = Vec::new();
        for len in 0..=data.name.len() {
            let prefix = data.name.prefix(len);
            if !name_tree.contains(&prefix) {
                continue;
            }
            for selectors in SelectorKey::all() {
                let key = PitKey {
                    name: prefix.clone(),
                    selectors,
                };
                let Some(entry) = self.entries.get(&key) else {
                    continue;
                };
                if entry.is_satisfied() {
                    continue;
                }
                if !selectors.can_be_prefix && len != data.name.len() {
                    continue;
                }
                if selectors.must_be_fresh && data.freshness_period_ms == 0 {
                    continue;
                }
                matches.push(key);
            }
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PitKey> {
        self.entries.keys()
    }
}

/// Default straggler window: how long a satisfied or rejected entry lingers
/// to absorb late duplicates.
pub const STRAGGLER_TIME: Duration = Duration::from_millis(100);
