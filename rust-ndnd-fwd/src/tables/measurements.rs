//! The Measurements table: per-name strategy scratch space with a sliding
//! lifetime, and the owner-checked accessor strategies go through.
//!
//! An entry starts with a short lifetime and is removed by a single-shot
//! timer unless a strategy extends it. `extend_lifetime` never shortens.
//! The parent walk returns the entry at the longest strict prefix that has
//! a NameTree node, terminating at the root.

use crate::clock::{EventId, Scheduler, TimerEvent};
use crate::strategy::MeasurementInfo;
use crate::tables::name_tree::{NameTree, TableRef};
use crate::tables::strategy_choice::{StrategyChoice, StrategyId};
use log::{debug, trace};
use rust_ndnd_common::name::Name;
use std::collections::hash_map::Entry as HashEntry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifetime granted to a fresh entry.
pub const INITIAL_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug)]
pub struct MeasurementsEntry {
    name: Name,
    /// Strategy-owned payload.
    pub info: Option<MeasurementInfo>,
    expiry: Instant,
    timer: EventId,
}

impl MeasurementsEntry {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }
}

#[derive(Debug, Default)]
pub struct Measurements {
    entries: HashMap<Name, MeasurementsEntry>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the entry for `name` with the initial lifetime.
    pub fn get_or_create<'m>(
        &'m mut self,
        name_tree: &mut NameTree,
        scheduler: &mut Scheduler,
        name: &Name,
    ) -> &'m mut MeasurementsEntry {
        match self.entries.entry(name.clone()) {
            HashEntry::Occupied(entry) => entry.into_mut(),
            HashEntry::Vacant(slot) => {
                name_tree.register(name, TableRef::Measurements);
                let expiry = scheduler.now() + INITIAL_LIFETIME;
                let timer = scheduler.schedule_at(
                    expiry,
                    TimerEvent::MeasurementsExpire { name: name.clone() },
                );
                trace!("measurements entry created for {}", name);
                slot.insert(MeasurementsEntry {
                    name: name.clone(),
                    info: None,
                    expiry,
                    timer,
                })
            }
        }
    }

    pub fn find_exact(&self, name: &Name) -> Option<&MeasurementsEntry> {
        self.entries.get(name)
    }

    /// Extends the lifetime of the entry for `name`; never shortens it.
    pub fn extend_lifetime(&mut self, scheduler: &mut Scheduler, name: &Name, d: Duration) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        let new_expiry = scheduler.now() + d;
        if new_expiry > entry.expiry {
            entry.expiry = new_expiry;
            scheduler.cancel(entry.timer);
            entry.timer = scheduler.schedule_at(
                new_expiry,
                TimerEvent::MeasurementsExpire { name: name.clone() },
            );
        }
    }

    /// Invoked when the expiry timer for `name` fires.
    pub fn handle_expiry(
        &mut self,
        name_tree: &mut NameTree,
        scheduler: &mut Scheduler,
        name: &Name,
    ) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        if entry.expiry > scheduler.now() {
            // Lifetime was extended since this timer was armed.
            entry.timer = scheduler.schedule_at(
                entry.expiry,
                TimerEvent::MeasurementsExpire { name: name.clone() },
            );
            return;
        }
        trace!("measurements entry expired for {}", name);
        self.entries.remove(name);
        name_tree.unregister(name, TableRef::Measurements);
    }

    /// The name of the parent entry location: the longest strict prefix of
    /// `name` that has a NameTree node, falling back to the root. None at
    /// the root itself.
    pub fn parent_name(&self, name_tree: &NameTree, name: &Name) -> Option<Name> {
        if name.is_empty() {
            return None;
        }
        for len in (0..name.len()).rev() {
            let prefix = name.prefix(len);
            if name_tree.contains(&prefix) {
                return Some(prefix);
            }
        }
        Some(Name::root())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.entries.keys()
    }
}

/// Per-strategy façade over Measurements. Returns entries only for names
/// whose effective strategy is the accessor's owner; everything else reads
/// as empty.
pub struct MeasurementsAccessor<'a> {
    pub(crate) measurements: &'a mut Measurements,
    pub(crate) name_tree: &'a mut NameTree,
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) choices: &'a StrategyChoice,
    pub(crate) owner: StrategyId,
}

impl<'a> MeasurementsAccessor<'a> {
    fn allowed(&self, name: &Name) -> bool {
        self.choices.find_effective_strategy(self.name_tree, name) == Some(self.owner)
    }

    /// Finds or creates the entry for `name`, or nothing when another
    /// strategy governs the name.
    pub fn get(&mut self, name: &Name) -> Option<&mut MeasurementsEntry> {
        if !self.allowed(name) {
            debug!("measurements access denied for {}", name);
            return None;
        }
        Some(
            self.measurements
                .get_or_create(self.name_tree, self.scheduler, name),
        )
    }

    /// The parent entry's name, independent of ownership. None at the root.
    pub fn parent_name(&self, name: &Name) -> Option<Name> {
        self.measurements.parent_name(self.name_tree, name)
    }

    /// The parent entry, or nothing at the root or outside the owner's
    /// namespace.
    pub fn get_parent(&mut self, name: &Name) -> Option<&mut MeasurementsEntry> {
        let parent = self.parent_name(name)?;
        self.get(&parent)
    }

    /// Extends the entry lifetime, subject to the same ownership check.
    pub fn extend_lifetime(&mut self, name: &Name, d: Duration) {
        if self.allowed(name) {
            self.measurements.extend_lifetime(self.scheduler, name, d);
        }
    }
}
