//! The forwarding strategy framework.
//!
//! A strategy is identified by a Name and reacts to three triggers: after
//! an Interest is received (it must act), before a pending Interest is
//! satisfied, and before one expires unsatisfied. It acts only through two
//! actions, `send_interest` and `reject_pending_interest`, which are
//! buffered in the [`StrategyContext`] and applied by the forwarder after
//! the trigger returns. Persistent strategy state lives in Measurements
//! payloads and PIT scratch slots, never in the strategy object itself.

pub mod best_route;
pub mod broadcast;
pub mod ncc;
pub mod simple_lb;
pub mod weighted_lb;

use crate::clock::{EventId, Scheduler, StrategyTimerKind, TimerEvent};
use crate::face::{FaceId, FaceTable};
use crate::tables::fib::FibEntry;
use crate::tables::measurements::{Measurements, MeasurementsAccessor};
use crate::tables::name_tree::NameTree;
use crate::tables::pit::{PitEntry, PitKey};
use crate::tables::strategy_choice::{StrategyChoice, StrategyId};
use rand::rngs::StdRng;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest};
use std::time::{Duration, Instant};

pub use ncc::NccInfo;
pub use ncc::NccPitInfo;
pub use weighted_lb::WeightedLbInfo;
pub use weighted_lb::WeightedLbPitInfo;

/// Per-PIT-entry strategy scratch. The variant tag must match the strategy
/// governing the entry; a mismatched slot is simply replaced, which also
/// implements payload discard when a namespace changes strategy.
#[derive(Debug)]
pub enum PitStrategyInfo {
    WeightedLb(WeightedLbPitInfo),
    Ncc(NccPitInfo),
}

impl PitStrategyInfo {
    /// Timers owned by this scratch slot; drained when the entry dies.
    pub(crate) fn take_timers(&mut self) -> Vec<EventId> {
        match self {
            Self::WeightedLb(_) => Vec::new(),
            Self::Ncc(info) => info.take_timers(),
        }
    }
}

/// Per-Measurements-entry strategy payload, same tagging rule as
/// [`PitStrategyInfo`].
#[derive(Debug)]
pub enum MeasurementInfo {
    WeightedLb(WeightedLbInfo),
    Ncc(NccInfo),
}

/// An action queued by a strategy trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyAction {
    SendInterest { face: FaceId, want_new_nonce: bool },
    Reject,
}

/// Everything a strategy trigger may touch, with the two actions buffered
/// for the forwarder to apply afterwards.
pub struct StrategyContext<'a> {
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) rng: &'a mut StdRng,
    pub(crate) measurements: &'a mut Measurements,
    pub(crate) name_tree: &'a mut NameTree,
    pub(crate) choices: &'a StrategyChoice,
    pub(crate) faces: &'a FaceTable,
    pub(crate) owner: StrategyId,
    pub(crate) pit_key: PitKey,
    pub(crate) actions: Vec<StrategyAction>,
}

impl<'a> StrategyContext<'a> {
    pub fn now(&self) -> Instant {
        self.scheduler.now()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    /// True when the face exists and has not failed.
    pub fn face_is_up(&self, face: FaceId) -> bool {
        self.faces.is_up(face)
    }

    /// Queue forwarding of the pending Interest to `face`.
    pub fn send_interest(&mut self, face: FaceId, want_new_nonce: bool) {
        self.actions.push(StrategyAction::SendInterest {
            face,
            want_new_nonce,
        });
    }

    /// Conclude that the pending Interest cannot be forwarded.
    pub fn reject_pending_interest(&mut self) {
        self.actions.push(StrategyAction::Reject);
    }

    /// Arms a strategy timer bound to the current PIT entry.
    pub fn set_timer(&mut self, after: Duration, kind: StrategyTimerKind) -> EventId {
        self.scheduler.schedule(
            after,
            TimerEvent::Strategy {
                key: self.pit_key.clone(),
                kind,
            },
        )
    }

    pub fn cancel_timer(&mut self, id: EventId) {
        self.scheduler.cancel(id);
    }

    /// The owner-scoped Measurements view.
    pub fn measurements(&mut self) -> MeasurementsAccessor<'_> {
        MeasurementsAccessor {
            measurements: self.measurements,
            name_tree: self.name_tree,
            scheduler: self.scheduler,
            choices: self.choices,
            owner: self.owner,
        }
    }
}

/// A forwarding strategy.
pub trait Strategy: Send {
    /// The Name identifying the strategy program.
    fn name(&self) -> &Name;

    /// The Interest passed here does not violate scope, is not a loop, and
    /// missed the Content Store. The strategy must either send it onward or
    /// reject the entry, now or shortly after through a timer.
    fn after_receive_interest(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: Option<&FibEntry>,
        pit_entry: &mut PitEntry,
    );

    /// Invoked before the entry is satisfied by `data` arriving on
    /// `in_face`. May record measurements; must not forward.
    fn before_satisfy_interest(
        &mut self,
        _ctx: &mut StrategyContext<'_>,
        _pit_entry: &mut PitEntry,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    /// Invoked once when the entry expires unsatisfied.
    fn before_expire_interest(&mut self, _ctx: &mut StrategyContext<'_>, _pit_entry: &mut PitEntry) {
    }

    /// A timer armed through [`StrategyContext::set_timer`] fired.
    fn on_timer(
        &mut self,
        _ctx: &mut StrategyContext<'_>,
        _pit_entry: &mut PitEntry,
        _fib_entry: Option<&FibEntry>,
        _kind: StrategyTimerKind,
    ) {
    }
}

/// Shared eligibility test: the face is alive and the PIT entry may still
/// forward to it.
pub(crate) fn eligible(ctx: &StrategyContext<'_>, pit_entry: &PitEntry, face: FaceId) -> bool {
    ctx.face_is_up(face) && pit_entry.can_forward_to(face, ctx.now())
}
