//! Simple load balancer: pick one eligible next-hop uniformly at random.

use crate::face::FaceId;
use crate::strategy::{eligible, Strategy, StrategyContext};
use crate::tables::fib::FibEntry;
use crate::tables::pit::PitEntry;
use rand::Rng;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::Interest;

pub struct SimpleLoadBalancerStrategy {
    name: Name,
}

impl SimpleLoadBalancerStrategy {
    pub fn strategy_name() -> Name {
        Name::from_string("/localhost/ndnd/strategy/simple-load-balancer")
    }

    pub fn new() -> Self {
        Self {
            name: Self::strategy_name(),
        }
    }
}

impl Default for SimpleLoadBalancerStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SimpleLoadBalancerStrategy {
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

        let next_hops: Vec<FaceId> = match fib_entry {
            Some(entry) => entry.next_hops().iter().map(|h| h.face).collect(),
            None => Vec::new(),
        };

        if !next_hops
            .iter()
            .any(|&face| eligible(ctx, pit_entry, face))
        {
            ctx.reject_pending_interest();
            return;
        }

        // There is at least one usable face, so the draw terminates.
        loop {
            let index = ctx.rng().random_range(0..next_hops.len());
            let face = next_hops[index];
            if eligible(ctx, pit_entry, face) {
                ctx.send_interest(face, false);
                return;
            }
        }
    }
}
