//! Best-route strategy: forward to the lowest-cost eligible next-hop.
//!
//! This is the default strategy at the root namespace.

use crate::face::FaceId;
use crate::strategy::{eligible, Strategy, StrategyContext};
use crate::tables::fib::FibEntry;
use crate::tables::pit::PitEntry;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::Interest;

pub struct BestRouteStrategy {
    name: Name,
}

impl BestRouteStrategy {
    pub fn strategy_name() -> Name {
        Name::from_string("/localhost/ndnd/strategy/best-route")
    }

    pub fn new() -> Self {
        Self {
            name: Self::strategy_name(),
        }
    }
}

impl Default for BestRouteStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BestRouteStrategy {
    fn name(&self) -> &Name {
        &self.name
    }

    fn after_receive_interest(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        _in_face: FaceId,
        _interest: &Interest,
        fib_entry: Option<&FibEntry>,
        pit_entry: &mut PitEntry,
    ) {
        if pit_entry.has_unexpired_out_records(ctx.now()) {
            // not a new Interest, don't forward
            return;
        }

        // Next-hops are kept sorted by ascending cost.
        if let Some(fib_entry) = fib_entry {
            for hop in fib_entry.next_hops() {
                if eligible(ctx, pit_entry, hop.face) {
                    ctx.send_interest(hop.face, false);
                    return;
                }
            }
        }
        ctx.reject_pending_interest();
    }
}
