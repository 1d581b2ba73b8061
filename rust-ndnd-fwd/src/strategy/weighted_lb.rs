//! Weighted load balancer: forwarding probability inversely proportional
//! to the measured per-face retrieval delay.
//!
//! State lives in the Measurements entry of the governing FIB prefix: a
//! set of faces ordered by (delay, face id) with a face-id handle map, plus
//! the running sum of all delays. A face's selection weight is
//! `totalDelay - lastDelay`, so a newcomer with delay 0 gets a full share
//! and slow faces shrink. Selection draws `rnd` in `[0, Σ weights]`
//! inclusive and picks the first eligible face whose cumulative weight
//! reaches `rnd`; with all weights zero this degenerates to the first
//! eligible face.

use crate::face::FaceId;
use crate::strategy::{eligible, MeasurementInfo, PitStrategyInfo, Strategy, StrategyContext};
use crate::tables::fib::{FibEntry, NextHop};
use crate::tables::measurements::MeasurementsEntry;
use crate::tables::pit::PitEntry;
use log::trace;
use rand::Rng;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest};
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// Lifetime extension applied to every touched Measurements entry.
const MEASUREMENTS_EXTENSION: Duration = Duration::from_secs(16);

/// Per-PIT-entry state: when the Interest was first forwarded.
#[derive(Debug, Clone, Copy)]
pub struct WeightedLbPitInfo {
    pub creation_time: Instant,
}

/// Per-prefix state: the weighted face set.
///
/// One ordered structure keyed by (delay, face id) plus a face-id handle
/// map; on a delay change the face is removed and reinserted in the
/// ordered set.
#[derive(Debug, Default)]
pub struct WeightedLbInfo {
    by_delay: BTreeSet<(Duration, FaceId)>,
    delays: HashMap<FaceId, Duration>,
    total_delay: Duration,
}

impl WeightedLbInfo {
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    pub fn last_delay(&self, face: FaceId) -> Option<Duration> {
        self.delays.get(&face).copied()
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Reconciles the face set with the FIB entry's current next-hops:
    /// newcomers join with delay 0, vanished faces are pruned.
    pub fn update_next_hops(&mut self, next_hops: &[NextHop]) {
        for hop in next_hops {
            if !self.delays.contains_key(&hop.face) {
                trace!("adding {} with delay 0", hop.face);
                self.delays.insert(hop.face, Duration::ZERO);
                self.by_delay.insert((Duration::ZERO, hop.face));
            }
        }

        let stale: Vec<FaceId> = self
            .delays
            .keys()
            .copied()
            .filter(|face| !next_hops.iter().any(|hop| hop.face == *face))
            .collect();
        for face in stale {
            trace!("pruning {}", face);
            if let Some(delay) = self.delays.remove(&face) {
                self.by_delay.remove(&(delay, face));
                self.total_delay = self.total_delay.saturating_sub(delay);
            }
        }
    }

    /// Σ (totalDelay − lastDelay) over the face set, in microseconds.
    pub fn inverse_total_micros(&self) -> u64 {
        let total = self.total_delay.as_micros() as u64;
        self.delays
            .values()
            .map(|delay| total - delay.as_micros() as u64)
            .sum()
    }

    /// The face set in ascending (delay, face id) order.
    pub fn faces_by_delay(&self) -> Vec<(Duration, FaceId)> {
        self.by_delay.iter().copied().collect()
    }

    /// Folds a fresh delay sample for `face` into the set. Faces no longer
    /// tracked are ignored.
    pub fn record_delay(&mut self, face: FaceId, delay: Duration) {
        let Some(last) = self.delays.get(&face).copied() else {
            trace!("{} no longer in weighted face set", face);
            return;
        };
        // totalDelay >= lastDelay always holds: the total is the sum of
        // every tracked delay.
        self.total_delay = self.total_delay - last + delay;
        self.by_delay.remove(&(last, face));
        self.by_delay.insert((delay, face));
        self.delays.insert(face, delay);
    }
}

/// Fetches the weighted-LB payload of a Measurements entry, replacing a
/// foreign payload left behind by a previously governing strategy.
fn weighted_info_mut(entry: &mut MeasurementsEntry) -> &mut WeightedLbInfo {
    if !matches!(entry.info, Some(MeasurementInfo::WeightedLb(_))) {
        entry.info = Some(MeasurementInfo::WeightedLb(WeightedLbInfo::default()));
    }
    match entry.info.as_mut() {
        Some(MeasurementInfo::WeightedLb(info)) => info,
        _ => unreachable!(),
    }
}

pub struct WeightedLoadBalancerStrategy {
    name: Name,
}

impl WeightedLoadBalancerStrategy {
    pub fn strategy_name() -> Name {
        Name::from_string("/localhost/ndnd/strategy/weighted-load-balancer")
    }

    pub fn new() -> Self {
        Self {
            name: Self::strategy_name(),
        }
    }
}

impl Default for WeightedLoadBalancerStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for WeightedLoadBalancerStrategy {
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

        pit_entry.strategy_info = Some(PitStrategyInfo::WeightedLb(WeightedLbPitInfo {
            creation_time: now,
        }));

        let Some(fib_entry) = fib_entry else {
            ctx.reject_pending_interest();
            return;
        };
        let fib_name = fib_entry.name().clone();
        let next_hops: Vec<NextHop> = fib_entry.next_hops().to_vec();

        let snapshot = {
            let mut accessor = ctx.measurements();
            accessor.get(&fib_name).map(|entry| {
                let info = weighted_info_mut(entry);
                info.update_next_hops(&next_hops);
                (
                    info.faces_by_delay(),
                    info.total_delay(),
                    info.inverse_total_micros(),
                )
            })
        };
        let Some((faces, total_delay, inverse_total)) = snapshot else {
            ctx.reject_pending_interest();
            return;
        };

        let rnd = ctx.rng().random_range(0..=inverse_total);
        trace!(
            "{} faces in weighted set, rnd = {} of {}",
            faces.len(),
            rnd,
            inverse_total
        );

        let total = total_delay.as_micros() as u64;
        let mut cumulative = 0u64;
        for (delay, face) in faces {
            cumulative += total - delay.as_micros() as u64;
            if rnd <= cumulative && eligible(ctx, pit_entry, face) {
                trace!("forwarding {} out {}", interest.name, face);
                ctx.send_interest(face, false);
                return;
            }
        }

        ctx.reject_pending_interest();
    }

    fn before_satisfy_interest(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        pit_entry: &mut PitEntry,
        in_face: FaceId,
        _data: &Data,
    ) {
        // No start time available, cannot compute delay for this retrieval.
        let Some(PitStrategyInfo::WeightedLb(pit_info)) = &pit_entry.strategy_info else {
            return;
        };
        let delay = ctx.now().saturating_duration_since(pit_info.creation_time);
        trace!("recording delay of {:?} for {}", delay, in_face);

        // Fold the sample into every ancestor entry the accessor still
        // reaches; the walk stops at the ownership boundary or the root.
        let mut cursor = Some(pit_entry.name().clone());
        while let Some(name) = cursor {
            let reachable = {
                let mut accessor = ctx.measurements();
                let allowed = accessor.get(&name).is_some();
                if allowed {
                    accessor.extend_lifetime(&name, MEASUREMENTS_EXTENSION);
                    if let Some(entry) = accessor.get(&name) {
                        if let Some(MeasurementInfo::WeightedLb(info)) = entry.info.as_mut() {
                            info.record_delay(in_face, delay);
                        }
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
