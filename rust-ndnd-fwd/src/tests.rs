//! End-to-end pipeline tests on mock transports and virtual time.

use crate::face::{FaceId, FacePersistency, FaceScope, Transport};
use crate::forwarder::{Forwarder, ForwarderConfig};
use crate::strategy::best_route::BestRouteStrategy;
use crate::strategy::broadcast::BroadcastStrategy;
use crate::strategy::ncc::NccStrategy;
use crate::strategy::simple_lb::SimpleLoadBalancerStrategy;
use crate::strategy::weighted_lb::WeightedLoadBalancerStrategy;
use crate::strategy::MeasurementInfo;
use crate::tables::pit::{PitKey, STRAGGLER_TIME};
use bytes::Bytes;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest, Nack, NackReason, Packet};
use rust_ndnd_common::uri::{FaceUri, Scheme};
use rust_ndnd_common::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct MockTransport {
    sent: Arc<Mutex<Vec<Packet>>>,
    local: FaceUri,
    remote: FaceUri,
    scope: FaceScope,
}

impl Transport for MockTransport {
    fn send(&mut self, packet: Bytes) -> Result<()> {
        self.sent.lock().unwrap().push(Packet::from_wire(&packet)?);
        Ok(())
    }

    fn close(&mut self) {}

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

#[derive(Clone)]
struct TestFace {
    id: FaceId,
    sent: Arc<Mutex<Vec<Packet>>>,
}

impl TestFace {
    fn sent(&self) -> Vec<Packet> {
        self.sent.lock().unwrap().clone()
    }

    fn sent_interests(&self) -> Vec<Interest> {
        self.sent()
            .into_iter()
            .filter_map(|p| match p {
                Packet::Interest(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    fn sent_data(&self) -> Vec<Data> {
        self.sent()
            .into_iter()
            .filter_map(|p| match p {
                Packet::Data(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn sent_nacks(&self) -> Vec<Nack> {
        self.sent()
            .into_iter()
            .filter_map(|p| match p {
                Packet::Nack(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

fn forwarder() -> Forwarder {
    Forwarder::new(ForwarderConfig {
        rng_seed: Some(42),
        ..ForwarderConfig::default()
    })
}

fn add_face(fw: &mut Forwarder, scope: FaceScope) -> TestFace {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let transport = MockTransport {
        sent: Arc::clone(&sent),
        local: FaceUri::new(Scheme::Tcp4, "127.0.0.1:6363"),
        remote: FaceUri::new(Scheme::Tcp4, "192.0.2.1:40000"),
        scope,
    };
    let id = fw.add_face(Box::new(transport), FacePersistency::Persistent);
    TestFace { id, sent }
}

fn send_interest(fw: &mut Forwarder, face: &TestFace, interest: &Interest) {
    fw.handle_packet(face.id, interest.to_wire());
}

fn send_data(fw: &mut Forwarder, face: &TestFace, data: &Data) {
    fw.handle_packet(face.id, data.to_wire());
}

/* ---------------------------------------------------------------- *
 * Scenarios S1-S3: best-route round trip, loop detection
 * ---------------------------------------------------------------- */

#[test]
fn test_interest_is_forwarded_along_fib() {
    // S1: FIB /a -> F2, best-route at the root.
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(0x11);
    send_interest(&mut fw, &f1, &interest);

    // Forwarded out F2 with the downstream nonce.
    let out = f2.sent_interests();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].name, Name::from_string("/a/b"));
    assert_eq!(out[0].nonce, Some(0x11));

    // One in-record (F1), one out-record (F2).
    let entry = fw.pit().get(&PitKey::of(&interest)).unwrap();
    assert_eq!(entry.in_records().len(), 1);
    assert_eq!(entry.in_records()[0].face, f1.id);
    assert_eq!(entry.out_records().len(), 1);
    assert_eq!(entry.out_records()[0].face, f2.id);
}

#[test]
fn test_data_satisfies_and_is_cached() {
    // S2: the Data comes back, reaches F1 exactly once, the entry is
    // purged within the straggler window, and the CS holds the Data.
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(0x11);
    send_interest(&mut fw, &f1, &interest);

    let data = Data::new(Name::from_string("/a/b/x"), &b"payload"[..]).with_freshness_period(1000);
    send_data(&mut fw, &f2, &data);

    let received = f1.sent_data();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], data);

    fw.advance(STRAGGLER_TIME + Duration::from_millis(1));
    assert!(fw.pit().get(&PitKey::of(&interest)).is_none());
    assert!(fw.cs().contains(&Name::from_string("/a/b/x")));
}

#[test]
fn test_aggregated_interest_fans_out() {
    // A second requester before the Data arrives becomes a second
    // in-record; the Data reaches both downstreams.
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let f3 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let first = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(0x11);
    send_interest(&mut fw, &f1, &first);

    let second = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(0x22);
    send_interest(&mut fw, &f3, &second);

    let entry = fw.pit().get(&PitKey::of(&first)).unwrap();
    assert_eq!(entry.in_records().len(), 2);
    // The aggregated Interest is not forwarded a second time.
    assert_eq!(f2.sent_interests().len(), 1);

    let data = Data::new(Name::from_string("/a/b"), &b"payload"[..]).with_freshness_period(1000);
    send_data(&mut fw, &f2, &data);

    assert_eq!(f1.sent_data().len(), 1);
    assert_eq!(f3.sent_data().len(), 1);
    // The answering face does not get its own Data back.
    assert!(f2.sent_data().is_empty());
}

#[test]
fn test_duplicate_nonce_is_nacked() {
    // S3: the same nonce again is classified as a duplicate.
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b")).with_nonce(0x11);
    send_interest(&mut fw, &f1, &interest);
    assert_eq!(f2.sent_interests().len(), 1);

    send_interest(&mut fw, &f1, &interest);

    let nacks = f1.sent_nacks();
    assert_eq!(nacks.len(), 1);
    assert_eq!(nacks[0].reason, NackReason::Duplicate);
    assert_eq!(nacks[0].interest.name, Name::from_string("/a/b"));
    // No additional forwarding happened.
    assert_eq!(f2.sent_interests().len(), 1);
}

#[test]
fn test_looped_interest_from_other_face_is_nacked() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let f3 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b")).with_nonce(0x11);
    send_interest(&mut fw, &f1, &interest);
    // The same nonce arriving over another face has looped.
    send_interest(&mut fw, &f3, &interest);

    assert_eq!(f3.sent_nacks().len(), 1);
    assert_eq!(f3.sent_nacks()[0].reason, NackReason::Duplicate);
    assert!(f1.sent_nacks().is_empty());
}

#[test]
fn test_incoming_nack_marks_out_record() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b")).with_nonce(0x11);
    send_interest(&mut fw, &f1, &interest);

    let nack = Nack::new(NackReason::Congestion, interest.clone());
    fw.handle_packet(f2.id, nack.to_wire());

    let entry = fw.pit().get(&PitKey::of(&interest)).unwrap();
    assert!(entry.out_records()[0].nacked);
    assert_eq!(fw.metrics().nacks_received.value(), 1);
}

/* ---------------------------------------------------------------- *
 * Content Store behavior in the pipeline
 * ---------------------------------------------------------------- */

#[test]
fn test_cs_hit_answers_without_forwarding() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(1);
    send_interest(&mut fw, &f1, &interest);
    let data = Data::new(Name::from_string("/a/b"), &b"payload"[..]).with_freshness_period(10_000);
    send_data(&mut fw, &f2, &data);
    fw.advance(STRAGGLER_TIME + Duration::from_millis(1));
    f2.clear();

    // A later Interest is answered from the cache.
    let again = Interest::new(Name::from_string("/a/b"))
        .with_can_be_prefix(true)
        .with_nonce(2);
    send_interest(&mut fw, &f1, &again);

    assert_eq!(f1.sent_data().len(), 2);
    assert!(f2.sent_interests().is_empty());
    assert_eq!(fw.metrics().cs_hits.value(), 1);

    // The short-lived entry from the hit is purged.
    fw.advance(STRAGGLER_TIME + Duration::from_millis(1));
    assert!(fw.pit().get(&PitKey::of(&again)).is_none());
}

#[test]
fn test_must_be_fresh_skips_stale_cache() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b")).with_nonce(1);
    send_interest(&mut fw, &f1, &interest);
    let data = Data::new(Name::from_string("/a/b"), &b"payload"[..]).with_freshness_period(50);
    send_data(&mut fw, &f2, &data);
    fw.advance(Duration::from_millis(200));
    f2.clear();

    // Stale by now: a MustBeFresh Interest goes upstream again.
    let fresh = Interest::new(Name::from_string("/a/b"))
        .with_must_be_fresh(true)
        .with_nonce(2);
    send_interest(&mut fw, &f1, &fresh);
    assert_eq!(f2.sent_interests().len(), 1);
}

#[test]
fn test_unsolicited_data_policy() {
    let mut fw = forwarder();
    let f2 = add_face(&mut fw, FaceScope::NonLocal);

    let data = Data::new(Name::from_string("/nobody/asked"), &b"x"[..]);
    send_data(&mut fw, &f2, &data);
    assert!(!fw.cs().contains(&Name::from_string("/nobody/asked")));
    assert_eq!(fw.metrics().unsolicited_data.value(), 1);

    // With admission enabled the Data lands in the cache.
    let mut fw = Forwarder::new(ForwarderConfig {
        admit_unsolicited: true,
        rng_seed: Some(42),
        ..ForwarderConfig::default()
    });
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    send_data(&mut fw, &f2, &data);
    assert!(fw.cs().contains(&Name::from_string("/nobody/asked")));
}

/* ---------------------------------------------------------------- *
 * Scope and robustness
 * ---------------------------------------------------------------- */

#[test]
fn test_localhost_scope_enforcement() {
    let mut fw = forwarder();
    let remote = add_face(&mut fw, FaceScope::NonLocal);
    let local = add_face(&mut fw, FaceScope::Local);

    let interest = Interest::new(Name::from_string("/localhost/ndnd/status")).with_nonce(1);

    send_interest(&mut fw, &remote, &interest);
    assert_eq!(fw.metrics().scope_violations.value(), 1);
    assert!(fw.pit().get(&PitKey::of(&interest)).is_none());

    // The same Interest on a local face enters the pipeline (and is
    // rejected by the strategy for lack of a route, which is fine).
    send_interest(&mut fw, &local, &interest);
    assert!(fw.pit().get(&PitKey::of(&interest)).is_some());
}

#[test]
fn test_malformed_packet_does_not_fail_face() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);

    fw.handle_packet(f1.id, Bytes::from_static(&[0x70, 0x03, 0x01]));
    assert_eq!(fw.metrics().malformed_packets.value(), 1);
    assert!(fw.face(f1.id).unwrap().is_up());
}

#[test]
fn test_hop_limit_is_decremented_and_enforced() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b"))
        .with_nonce(1)
        .with_hop_limit(2);
    send_interest(&mut fw, &f1, &interest);
    assert_eq!(f2.sent_interests()[0].hop_limit, Some(1));

    // One remaining hop: accepted but not forwarded.
    let last = Interest::new(Name::from_string("/a/c"))
        .with_nonce(2)
        .with_hop_limit(1);
    send_interest(&mut fw, &f1, &last);
    assert_eq!(f2.sent_interests().len(), 1);

    // Zero hops: dropped outright.
    let dead = Interest::new(Name::from_string("/a/d"))
        .with_nonce(3)
        .with_hop_limit(0);
    send_interest(&mut fw, &f1, &dead);
    assert!(fw.pit().get(&PitKey::of(&dead)).is_none());
}

#[test]
fn test_face_closure_purges_tables() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

    let interest = Interest::new(Name::from_string("/a/b")).with_nonce(1);
    send_interest(&mut fw, &f1, &interest);

    fw.handle_face_closed(f2.id, "connection reset");

    assert!(fw.face(f2.id).is_none());
    assert!(fw.fib().find_exact(&Name::from_string("/a")).is_none());
    let entry = fw.pit().get(&PitKey::of(&interest)).unwrap();
    assert!(entry.out_records().is_empty());
}

#[test]
fn test_straggler_window_for_late_data() {
    // In-record expired but out-record pending: Data is delivered to the
    // original face only while the straggler window is open.
    for (wait_ms, expect_delivery) in [(550u64, true), (650u64, false)] {
        let mut fw = forwarder();
        let f1 = add_face(&mut fw, FaceScope::NonLocal);
        let f2 = add_face(&mut fw, FaceScope::NonLocal);
        fw.fib_insert(&Name::from_string("/a"), f2.id, 10);

        let interest = Interest::new(Name::from_string("/a/b"))
            .with_nonce(1)
            .with_lifetime(500);
        send_interest(&mut fw, &f1, &interest);

        fw.advance(Duration::from_millis(wait_ms));
        let data = Data::new(Name::from_string("/a/b"), &b"late"[..]).with_freshness_period(1000);
        send_data(&mut fw, &f2, &data);

        assert_eq!(
            f1.sent_data().len(),
            usize::from(expect_delivery),
            "wait = {}ms",
            wait_ms
        );
    }
}

/* ---------------------------------------------------------------- *
 * Scenario S5: simple load balancer
 * ---------------------------------------------------------------- */

#[test]
fn test_simple_lb_distribution() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let f3 = add_face(&mut fw, FaceScope::NonLocal);
    let prefix = Name::from_string("/s");
    fw.fib_insert(&prefix, f2.id, 10);
    fw.fib_insert(&prefix, f3.id, 10);
    fw.set_strategy_choice(&prefix, &SimpleLoadBalancerStrategy::strategy_name())
        .unwrap();

    const TOTAL: usize = 10_000;
    for i in 0..TOTAL {
        let interest = Interest::new(Name::from_string(&format!("/s/{}", i)))
            .with_nonce(i as u32 + 1);
        send_interest(&mut fw, &f1, &interest);
    }

    let to_f2 = f2.sent_interests().len();
    let to_f3 = f3.sent_interests().len();
    assert_eq!(to_f2 + to_f3, TOTAL);
    assert_eq!(fw.metrics().pit_rejections.value(), 0);

    // 50% +/- 2% each.
    let half = TOTAL / 2;
    let tolerance = TOTAL / 50;
    assert!(
        to_f2.abs_diff(half) <= tolerance,
        "F2 got {} of {}",
        to_f2,
        TOTAL
    );

    // Invariant: the out-interest counters add up to the sends performed.
    let total_out: u64 = fw
        .faces()
        .map(|f| f.counters.n_out_interests.value())
        .sum();
    assert_eq!(total_out, TOTAL as u64);
}

/* ---------------------------------------------------------------- *
 * Scenario S4: weighted load balancer
 * ---------------------------------------------------------------- */

#[test]
fn test_weighted_lb_single_face_with_zero_delay() {
    // Degenerate case: one face, delay 0, inverse total 0. The face must
    // still be selected with probability 1.
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let prefix = Name::from_string("/w");
    fw.fib_insert(&prefix, f2.id, 10);
    fw.set_strategy_choice(&prefix, &WeightedLoadBalancerStrategy::strategy_name())
        .unwrap();

    for i in 0..10 {
        let interest = Interest::new(Name::from_string(&format!("/w/{}", i)))
            .with_nonce(i + 1);
        send_interest(&mut fw, &f1, &interest);
    }
    assert_eq!(f2.sent_interests().len(), 10);
    assert_eq!(fw.metrics().pit_rejections.value(), 0);
}

#[test]
fn test_weighted_lb_converges_to_inverse_delay_shares() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let f3 = add_face(&mut fw, FaceScope::NonLocal);
    let f4 = add_face(&mut fw, FaceScope::NonLocal);
    let prefix = Name::from_string("/w");
    fw.fib_insert(&prefix, f2.id, 10);
    fw.fib_insert(&prefix, f3.id, 10);
    fw.fib_insert(&prefix, f4.id, 10);
    fw.set_strategy_choice(&prefix, &WeightedLoadBalancerStrategy::strategy_name())
        .unwrap();

    let upstreams = [
        (f2.clone(), Duration::from_millis(10)),
        (f3.clone(), Duration::from_millis(50)),
        (f4.clone(), Duration::from_millis(200)),
    ];

    const ROUNDS: usize = 1000;
    const WARMUP: usize = 100;
    let mut counts: HashMap<FaceId, usize> = HashMap::new();

    for round in 0..ROUNDS {
        let interest = Interest::new(Name::from_string("/w/1"))
            .with_must_be_fresh(true)
            .with_nonce(round as u32 + 1);
        send_interest(&mut fw, &f1, &interest);

        // Exactly one upstream got the Interest; it answers after its
        // latency.
        let selected = upstreams
            .iter()
            .find(|(face, _)| !face.sent_interests().is_empty())
            .expect("no upstream selected");
        let face = selected.0.clone();
        let delay = selected.1;
        if round >= WARMUP {
            *counts.entry(face.id).or_default() += 1;
        }
        fw.advance(delay);

        let data = Data::new(Name::from_string("/w/1"), &b"payload"[..])
            .with_freshness_period(1);
        send_data(&mut fw, &face, &data);
        for (face, _) in &upstreams {
            face.clear();
        }
        f1.clear();

        // Let the straggler window close so the next round starts fresh.
        fw.advance(STRAGGLER_TIME + Duration::from_millis(1));
    }

    // Steady state: totalDelay = 10 + 50 + 200 = 260ms; the selection
    // shares are proportional to (totalDelay - lastDelay).
    let entry = fw.measurements().find_exact(&prefix).unwrap();
    match entry.info.as_ref().unwrap() {
        MeasurementInfo::WeightedLb(info) => {
            assert_eq!(info.total_delay(), Duration::from_millis(260));
        }
        other => panic!("unexpected payload {:?}", other),
    }

    let samples = (ROUNDS - WARMUP) as f64;
    let expectations = [
        (f2.id, 250.0 / 520.0),
        (f3.id, 210.0 / 520.0),
        (f4.id, 60.0 / 520.0),
    ];
    for (face, expected) in expectations {
        let observed = *counts.get(&face).unwrap_or(&0) as f64 / samples;
        assert!(
            (observed - expected).abs() <= 0.05,
            "{}: observed {:.3}, expected {:.3}",
            face,
            observed,
            expected
        );
    }
}

/* ---------------------------------------------------------------- *
 * NCC strategy
 * ---------------------------------------------------------------- */

#[test]
fn test_ncc_learns_best_face() {
    let mut fw = forwarder();
    let f1 = add_face(&mut fw, FaceScope::NonLocal);
    let f2 = add_face(&mut fw, FaceScope::NonLocal);
    let f3 = add_face(&mut fw, FaceScope::NonLocal);
    let prefix = Name::from_string("/n");
    fw.fib_insert(&prefix, f2.id, 10);
    fw.fib_insert(&prefix, f3.id, 20);
    fw.set_strategy_choice(&prefix, &NccStrategy::strategy_name()).unwrap();

    // Without a best face the first forward is deferred.
    let interest = Interest::new(Name::from_string("/n/1")).with_nonce(1);
    send_interest(&mut fw, &f1, &interest);
    assert!(f2.sent_interests().is_empty());
    assert!(f3.sent_interests().is_empty());

    // Step in 1ms increments until the deferred propagation fires (at
    // most 4ms + 75ms away), then answer before the next propagation.
    let mut waited = Duration::ZERO;
    while f2.sent_interests().is_empty() && waited < Duration::from_millis(100) {
        fw.advance(Duration::from_millis(1));
        waited += Duration::from_millis(1);
    }
    assert_eq!(f2.sent_interests().len(), 1);
    assert!(f3.sent_interests().is_empty());

    // F2 answers and becomes the best face.
    let data = Data::new(Name::from_string("/n/1"), &b"x"[..]).with_freshness_period(1);
    send_data(&mut fw, &f2, &data);
    fw.advance(STRAGGLER_TIME + Duration::from_millis(1));
    f2.clear();
    f3.clear();

    // The next Interest goes to the best face immediately.
    let interest = Interest::new(Name::from_string("/n/2")).with_nonce(2);
    send_interest(&mut fw, &f1, &interest);
    assert_eq!(f2.sent_interests().len(), 1);
    assert!(f3.sent_interests().is_empty());

    // No answer within the prediction: the Interest propagates to the
    // remaining next-hop exactly once.
    fw.advance(Duration::from_millis(200));
    assert_eq!(f3.sent_interests().len(), 1);
    assert_eq!(f2.sent_interests().len(), 1);
}

/* ---------------------------------------------------------------- *
 * Scenario S6: MeasurementsAccessor ownership
 * ---------------------------------------------------------------- */

#[test]
fn test_measurements_accessor_ownership() {
    let mut fw = forwarder();
    // Root is governed by best-route (A); /x by broadcast (B).
    fw.set_strategy_choice(&Name::from_string("/x"), &BroadcastStrategy::strategy_name())
        .unwrap();
    let a = fw.strategy_id(&BestRouteStrategy::strategy_name()).unwrap();
    let b = fw.strategy_id(&BroadcastStrategy::strategy_name()).unwrap();

    let name_xy = Name::from_string("/x/y");
    let name_x = Name::from_string("/x");

    {
        let mut accessor = fw.measurements_accessor(a);
        assert!(accessor.get(&Name::root()).is_some());
        assert!(accessor.get(&name_x).is_none());
        assert!(accessor.get(&name_xy).is_none());
        assert!(accessor.get(&Name::from_string("/y")).is_some());
    }
    {
        let mut accessor = fw.measurements_accessor(b);
        assert!(accessor.get(&Name::root()).is_none());
        let entry = accessor.get(&name_xy).unwrap();
        assert_eq!(entry.name(), &name_xy);

        // The parent of /x/y is /x, still inside B's namespace; the
        // parent of /x is the root, which belongs to A: boundary.
        let parent = accessor.get_parent(&name_xy).unwrap();
        assert_eq!(parent.name(), &name_x);
        assert!(accessor.get_parent(&name_x).is_none());
    }

    // Invariant: a non-empty accessor result implies the owner is the
    // effective strategy.
    assert_eq!(fw.effective_strategy(&name_xy), Some(b));
    assert_eq!(fw.effective_strategy(&Name::root()), Some(a));
}
