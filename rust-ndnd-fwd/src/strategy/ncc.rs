//! NCC strategy: best-face forwarding with an adaptive retrieval-time
//! prediction, similar to CCNx 0.7.2.
//!
//! Per-prefix state remembers the face that last delivered Data and a
//! prediction of how long retrieval takes, bounded to [127 µs, 160 ms].
//! A new Interest goes to the best face with a timeout of one prediction;
//! if nothing comes back the prediction grows and the Interest propagates
//! to the remaining next-hops. Without a best face the first forward is
//! deferred by a small random interval.

use crate::clock::{EventId, StrategyTimerKind};
use crate::face::FaceId;
use crate::strategy::{eligible, MeasurementInfo, PitStrategyInfo, Strategy, StrategyContext};
use crate::tables::fib::FibEntry;
use crate::tables::measurements::MeasurementsEntry;
use crate::tables::pit::PitEntry;
use log::trace;
use rand::Rng;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest};
use std::time::{Duration, Instant};

const INITIAL_PREDICTION: Duration = Duration::from_micros(8192);
const MIN_PREDICTION: Duration = Duration::from_micros(127);
const MAX_PREDICTION: Duration = Duration::from_millis(160);
const ADJUST_PREDICT_DOWN_SHIFT: u32 = 7;
const ADJUST_PREDICT_UP_SHIFT: u32 = 3;

/// Deferral before the first forward when no best face is known.
const DEFER_FIRST_WITHOUT_BEST_FACE: Duration = Duration::from_millis(4);
const DEFER_RANGE_WITHOUT_BEST_FACE: Duration = Duration::from_millis(75);

/// How many levels of Measurements entries are updated on satisfaction.
const UPDATE_MEASUREMENTS_LEVELS: usize = 2;
const MEASUREMENTS_LIFETIME: Duration = Duration::from_secs(16);

/// A best face untouched for this long is forgotten.
const BEST_FACE_AGE_LIMIT: Duration = Duration::from_secs(8);

/// Per-prefix state.
#[derive(Debug)]
pub struct NccInfo {
    pub best_face: Option<FaceId>,
    pub previous_face: Option<FaceId>,
    pub prediction: Duration,
    last_update: Instant,
}

impl NccInfo {
    fn new(now: Instant) -> Self {
        Self {
            best_face: None,
            previous_face: None,
            prediction: INITIAL_PREDICTION,
            last_update: now,
        }
    }

    pub fn adjust_predict_down(&mut self) {
        let micros = self.prediction.as_micros() as u64;
        let adjusted = micros.saturating_sub(micros >> ADJUST_PREDICT_DOWN_SHIFT);
        self.prediction = Duration::from_micros(adjusted).max(MIN_PREDICTION);
    }

    pub fn adjust_predict_up(&mut self) {
        let micros = self.prediction.as_micros() as u64;
        let adjusted = micros + (micros >> ADJUST_PREDICT_UP_SHIFT);
        self.prediction = Duration::from_micros(adjusted).min(MAX_PREDICTION);
    }

    /// Adopts `face` as the best face, demoting the previous holder.
    pub fn update_best_face(&mut self, face: FaceId, now: Instant) {
        self.last_update = now;
        match self.best_face {
            None => self.best_face = Some(face),
            Some(best) if best == face => {}
            Some(best) => {
                self.previous_face = Some(best);
                self.best_face = Some(face);
            }
        }
    }

    /// Forgets a best face that has not delivered for a long interval.
    pub fn age_best_face(&mut self, now: Instant) {
        if self.best_face.is_some()
            && now.saturating_duration_since(self.last_update) > BEST_FACE_AGE_LIMIT
        {
            trace!("aging out best face {:?}", self.best_face);
            self.previous_face = self.best_face.take();
        }
    }
}

/// Per-PIT-entry state.
#[derive(Debug)]
pub struct NccPitInfo {
    /// The prefix whose Measurements entry holds this entry's NccInfo.
    pub prefix: Name,
    /// Expires when the best face does not respond within the prediction.
    pub best_face_timeout: Option<EventId>,
    /// Drives propagation to additional next-hops.
    pub propagate_timer: Option<EventId>,
    /// Interval between successive propagations.
    pub max_interval: Duration,
}

impl NccPitInfo {
    pub(crate) fn take_timers(&mut self) -> Vec<EventId> {
        self.best_face_timeout
            .take()
            .into_iter()
            .chain(self.propagate_timer.take())
            .collect()
    }
}

/// Fetches the NCC payload of a Measurements entry, replacing a foreign
/// payload left behind by a previously governing strategy.
fn ncc_info_mut(entry: &mut MeasurementsEntry, now: Instant) -> &mut NccInfo {
    if !matches!(entry.info, Some(MeasurementInfo::Ncc(_))) {
        entry.info = Some(MeasurementInfo::Ncc(NccInfo::new(now)));
    }
    match entry.info.as_mut() {
        Some(MeasurementInfo::Ncc(info)) => info,
        _ => unreachable!(),
    }
}

pub struct NccStrategy {
    name: Name,
}

impl NccStrategy {
    pub fn strategy_name() -> Name {
        Name::from_string("/localhost/ndnd/strategy/ncc")
    }

    pub fn new() -> Self {
        Self {
            name: Self::strategy_name(),
        }
    }
}

impl Default for NccStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for NccStrategy {
    fn name(&self) -> &Name {
        &self.name
    }

    fn after_receive_interest(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        _in_face: FaceId,
        interest: &Interest,
        fib_entry: Option<&FibEntry>,
        pit_entry: &mut PitEntry,
    ) {
        let now = ctx.now();
        if pit_entry.has_unexpired_out_records(now) {
            // not a new Interest, don't forward
            return;
        }

        let Some(fib_entry) = fib_entry else {
            ctx.reject_pending_interest();
            return;
        };
        let prefix = fib_entry.name().clone();

        let state = {
            let mut accessor = ctx.measurements();
            accessor.get(&prefix).map(|entry| {
                let info = ncc_info_mut(entry, now);
                info.age_best_face(now);
                (info.best_face, info.prediction)
            })
        };
        let Some((best_face, prediction)) = state else {
            ctx.reject_pending_interest();
            return;
        };

        match best_face.filter(|&face| eligible(ctx, pit_entry, face)) {
            Some(face) => {
                trace!("forwarding {} to best face {}", interest.name, face);
                ctx.send_interest(face, false);
                let timeout = ctx.set_timer(prediction, StrategyTimerKind::NccBestFaceTimeout);
                let propagate = ctx.set_timer(prediction / 2, StrategyTimerKind::NccPropagate);
                pit_entry.strategy_info = Some(PitStrategyInfo::Ncc(NccPitInfo {
                    prefix,
                    best_face_timeout: Some(timeout),
                    propagate_timer: Some(propagate),
                    max_interval: prediction,
                }));
            }
            None => {
                // No usable best face: defer the first forward briefly.
                let jitter = ctx
                    .rng()
                    .random_range(0..DEFER_RANGE_WITHOUT_BEST_FACE.as_micros() as u64);
                let defer = DEFER_FIRST_WITHOUT_BEST_FACE + Duration::from_micros(jitter);
                trace!("deferring {} by {:?}", interest.name, defer);
                let propagate = ctx.set_timer(defer, StrategyTimerKind::NccPropagate);
                pit_entry.strategy_info = Some(PitStrategyInfo::Ncc(NccPitInfo {
                    prefix,
                    best_face_timeout: None,
                    propagate_timer: Some(propagate),
                    max_interval: defer,
                }));
            }
        }
    }

    fn on_timer(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        pit_entry: &mut PitEntry,
        fib_entry: Option<&FibEntry>,
        kind: StrategyTimerKind,
    ) {
        let now = ctx.now();
        match kind {
            StrategyTimerKind::NccBestFaceTimeout => {
                // The best face did not answer within the prediction.
                if let Some(PitStrategyInfo::Ncc(info)) = &mut pit_entry.strategy_info {
                    info.best_face_timeout = None;
                    let prefix = info.prefix.clone();
                    let mut accessor = ctx.measurements();
                    if let Some(entry) = accessor.get(&prefix) {
                        ncc_info_mut(entry, now).adjust_predict_up();
                    }
                }
                if let Some(fib_entry) = fib_entry {
                    for hop in fib_entry.next_hops() {
                        if eligible(ctx, pit_entry, hop.face) {
                            ctx.send_interest(hop.face, false);
                        }
                    }
                }
            }
            StrategyTimerKind::NccPropagate => {
                // Propagate to one more next-hop, then re-arm.
                let next = fib_entry.and_then(|entry| {
                    entry
                        .next_hops()
                        .iter()
                        .find(|hop| eligible(ctx, pit_entry, hop.face))
                        .map(|hop| hop.face)
                });
                match next {
                    Some(face) => {
                        ctx.send_interest(face, false);
                        let interval = match &pit_entry.strategy_info {
                            Some(PitStrategyInfo::Ncc(info)) => info.max_interval,
                            _ => INITIAL_PREDICTION,
                        };
                        let timer = ctx.set_timer(interval, StrategyTimerKind::NccPropagate);
                        if let Some(PitStrategyInfo::Ncc(info)) = &mut pit_entry.strategy_info {
                            info.propagate_timer = Some(timer);
                        }
                    }
                    None => {
                        if let Some(PitStrategyInfo::Ncc(info)) = &mut pit_entry.strategy_info {
                            info.propagate_timer = None;
                        }
                    }
                }
            }
        }
    }

    fn before_satisfy_interest(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        pit_entry: &mut PitEntry,
        in_face: FaceId,
        _data: &Data,
    ) {
        let now = ctx.now();
        let Some(PitStrategyInfo::Ncc(info)) = &mut pit_entry.strategy_info else {
            return;
        };
        let prefix = info.prefix.clone();
        for timer in info.take_timers() {
            ctx.cancel_timer(timer);
        }

        // Update the governing entry and one ancestor level.
        let mut cursor = Some(prefix);
        for _ in 0..UPDATE_MEASUREMENTS_LEVELS {
            let Some(name) = cursor else {
                break;
            };
            let reachable = {
                let mut accessor = ctx.measurements();
                let allowed = accessor.get(&name).is_some();
                if allowed {
                    accessor.extend_lifetime(&name, MEASUREMENTS_LIFETIME);
                    if let Some(entry) = accessor.get(&name) {
                        let info = ncc_info_mut(entry, now);
                        if info.best_face == Some(in_face) {
                            info.adjust_predict_down();
                        }
                        info.update_best_face(in_face, now);
                    }
                }
                allowed
            };
            if !reachable {
                break;
            }
            cursor = ctx.measurements().parent_name(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_bounds() {
        let now = Instant::now();
        let mut info = NccInfo::new(now);
        assert_eq!(info.prediction, INITIAL_PREDICTION);

        for _ in 0..1000 {
            info.adjust_predict_up();
        }
        assert_eq!(info.prediction, MAX_PREDICTION);

        for _ in 0..10_000 {
            info.adjust_predict_down();
        }
        assert_eq!(info.prediction, MIN_PREDICTION);
    }

    #[test]
    fn test_update_best_face_demotes() {
        let now = Instant::now();
        let mut info = NccInfo::new(now);

        info.update_best_face(FaceId(1), now);
        assert_eq!(info.best_face, Some(FaceId(1)));
        assert_eq!(info.previous_face, None);

        info.update_best_face(FaceId(1), now);
        assert_eq!(info.previous_face, None);

        info.update_best_face(FaceId(2), now);
        assert_eq!(info.best_face, Some(FaceId(2)));
        assert_eq!(info.previous_face, Some(FaceId(1)));
    }

    #[test]
    fn test_age_best_face() {
        let now = Instant::now();
        let mut info = NccInfo::new(now);
        info.update_best_face(FaceId(1), now);

        info.age_best_face(now + BEST_FACE_AGE_LIMIT / 2);
        assert_eq!(info.best_face, Some(FaceId(1)));

        info.age_best_face(now + BEST_FACE_AGE_LIMIT * 2);
        assert_eq!(info.best_face, None);
        assert_eq!(info.previous_face, Some(FaceId(1)));
    }
}
