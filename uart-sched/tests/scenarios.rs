/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end scheduling scenarios through the public API.

use std::path::PathBuf;

use uart_sched::capacity::{CapacityPolicy, LinkParams, EPSILON};
use uart_sched::config::ScheduleConfig;
use uart_sched::message::{Message, MessageRegistry};
use uart_sched::scheduler::{Amount, GapFillScheduler, InstanceState, Schedule};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn registry(messages: Vec<Message>) -> MessageRegistry {
    MessageRegistry::new(messages).unwrap()
}

fn duration_only(bit_rate: u32, bits_per_byte: u32) -> GapFillScheduler {
    GapFillScheduler::new(
        LinkParams::new(bit_rate, bits_per_byte),
        CapacityPolicy::DurationOnly,
    )
}

fn assert_valid(schedule: &Schedule) {
    let violations = schedule.validate();
    assert!(violations.is_empty(), "violations: {violations:#?}");
}

fn demo_config() -> ScheduleConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos/link_profile.yaml");
    ScheduleConfig::load_from_file(&path).unwrap()
}

// ── Scenario 1: single message ───────────────────────────────────────────────

#[test]
fn single_small_message_gets_one_chunk_at_zero() {
    let reg = registry(vec![Message::new("M", 4, 1.0)]);
    let schedule = duration_only(115_200, 10).schedule(&reg, 1.0).unwrap();

    assert_eq!(schedule.chunks.len(), 1);
    let chunk = &schedule.chunks[0];
    assert_eq!(chunk.start, 0.0);
    assert!((chunk.end - 0.000_347).abs() < 1e-6, "end = {}", chunk.end);
    assert!((chunk.duration() - 40.0 / 115_200.0).abs() <= EPSILON);
    assert!(schedule.is_complete());
    assert_valid(&schedule);
}

// ── Scenario 2: fast tiny message + slow large message ───────────────────────

#[test]
fn slow_message_fills_gaps_around_fast_message() {
    // Input order puts the slow message first; priority must not depend on it.
    let reg = registry(vec![
        Message::new("B", 200, 10.0),
        Message::new("A", 4, 1_000.0),
    ]);
    let schedule = duration_only(115_200, 10).schedule(&reg, 1.0).unwrap();

    let a_instances: Vec<_> = schedule
        .instances
        .iter()
        .filter(|r| r.message_id == "A")
        .collect();
    assert_eq!(a_instances.len(), 1_000);
    assert!(a_instances
        .iter()
        .all(|r| r.state == InstanceState::FullyScheduled));

    // Every A instance sits at the very start of its own 1 ms window.
    for (i, chunk) in schedule.chunks_for("A").enumerate() {
        assert_eq!(chunk.instance_index, i);
        assert!((chunk.start - i as f64 * 0.001).abs() < 1e-12);
    }

    // B had to be split across many A gaps.
    let b_chunks = schedule.chunks_for("B").count();
    assert!(b_chunks > 10, "B chunks = {b_chunks}");
    assert!(schedule.under_scheduled.is_empty());
    assert_valid(&schedule);
}

// ── Scenario 3: oversubscription ─────────────────────────────────────────────

#[test]
fn oversubscribed_message_is_reported_without_overrunning_windows() {
    // 200 B at 9600/10 takes ~0.208 s, the period is 0.01 s.
    let reg = registry(vec![Message::new("X", 200, 100.0)]);
    let schedule = duration_only(9_600, 10).schedule(&reg, 0.1).unwrap();

    assert!(schedule.estimated_load.is_oversubscribed());
    assert_eq!(schedule.under_scheduled.len(), 10);
    for report in &schedule.under_scheduled {
        match report.missing {
            Amount::Seconds(s) => assert!((s - (2_000.0 / 9_600.0 - 0.01)).abs() < 1e-9),
            Amount::Bytes(_) => panic!("duration-only run reported bytes"),
        }
    }
    for chunk in &schedule.chunks {
        let ws = chunk.instance_index as f64 * 0.01;
        assert!(chunk.start >= ws - EPSILON);
        assert!(chunk.end <= ws + 0.01 + EPSILON);
    }
    assert_valid(&schedule);
}

#[test]
fn oversubscription_under_byte_budget_reports_missing_bytes() {
    let reg = registry(vec![Message::new("X", 200, 100.0)]);
    let scheduler = GapFillScheduler::new(
        LinkParams::new(9_600, 10),
        CapacityPolicy::ByteBudget {
            overhead_bytes: 2,
            granularity_bytes: 1,
        },
    );
    let schedule = scheduler.schedule(&reg, 0.1).unwrap();

    assert_eq!(schedule.under_scheduled.len(), 10);
    for report in &schedule.under_scheduled {
        assert!(matches!(report.missing, Amount::Bytes(n) if n > 0));
    }
    assert_valid(&schedule);
}

// ── Scenario 4: gap smaller than the overhead ────────────────────────────────

#[test]
fn gap_smaller_than_overhead_is_skipped() {
    // 1024 bit/s, 8 bits per byte: one byte is exactly 1/128 s.
    // F occupies 62 of the 64 bytes in each 0.5 s window, leaving 2-byte gaps.
    let cfg = ScheduleConfig::from_yaml_str(
        r#"
link: { bit_rate: 1024, bits_per_byte: 8 }
policy: { kind: byte_budget, overhead_bytes: 2, payload_granularity_bytes: 4 }
messages:
  - { id: S, payload_bytes: 4,  frequency_hz: 1 }
  - { id: F, payload_bytes: 60, frequency_hz: 2 }
"#,
    )
    .unwrap();
    let horizon = cfg.resolve_horizon(None).unwrap();
    assert_eq!(horizon, 1.0);

    let schedule = GapFillScheduler::new(cfg.link, cfg.policy)
        .schedule(&cfg.registry().unwrap(), horizon)
        .unwrap();

    assert_eq!(schedule.chunks_for("F").count(), 2);
    assert_eq!(schedule.chunks_for("S").count(), 0);
    assert_eq!(schedule.under_scheduled.len(), 1);
    assert_eq!(schedule.under_scheduled[0].message_id, "S");
    assert_eq!(schedule.under_scheduled[0].missing, Amount::Bytes(4));
    assert_valid(&schedule);
}

// ── Granularity / conservation ───────────────────────────────────────────────

#[test]
fn demo_profile_chunks_are_aligned_and_fit_their_airtime() {
    let cfg = demo_config();
    let (overhead, granularity) = match cfg.policy {
        CapacityPolicy::ByteBudget {
            overhead_bytes,
            granularity_bytes,
        } => (overhead_bytes, granularity_bytes),
        CapacityPolicy::DurationOnly => panic!("demo profile uses the byte budget"),
    };
    let horizon = cfg.resolve_horizon(None).unwrap();
    let schedule = GapFillScheduler::new(cfg.link, cfg.policy)
        .schedule(&cfg.registry().unwrap(), horizon)
        .unwrap();

    assert!(!schedule.chunks.is_empty());
    for chunk in &schedule.chunks {
        let payload = chunk.payload_bytes_sent.unwrap();
        assert!(payload > 0);
        assert_eq!(payload % granularity, 0);
        let airtime = cfg.link.time_for((payload + overhead) as u64);
        assert!(airtime <= chunk.duration() + 2.0 * EPSILON);
    }
    assert_valid(&schedule);
}

#[test]
fn fully_scheduled_instances_deliver_exact_payload() {
    let cfg = demo_config();
    let reg = cfg.registry().unwrap();
    let schedule = GapFillScheduler::new(cfg.link, cfg.policy)
        .schedule(&reg, cfg.resolve_horizon(None).unwrap())
        .unwrap();

    for record in &schedule.instances {
        if record.state != InstanceState::FullyScheduled {
            continue;
        }
        let sent: u32 = schedule
            .chunks_for(&record.message_id)
            .filter(|c| c.instance_index == record.instance_index)
            .map(|c| c.payload_bytes_sent.unwrap())
            .sum();
        assert_eq!(sent, reg.get(&record.message_id).unwrap().payload_bytes);
    }
}

// ── Priority ──────────────────────────────────────────────────────────────────

#[test]
fn lower_priority_messages_never_move_higher_priority_chunks() {
    let fast = Message::new("fast", 8, 200.0);
    let slow = Message::new("slow", 64, 20.0);
    let scheduler = duration_only(57_600, 10);

    let alone = scheduler.schedule(&registry(vec![fast.clone()]), 1.0).unwrap();
    let shared = scheduler
        .schedule(&registry(vec![slow, fast]), 1.0)
        .unwrap();

    let a: Vec<_> = alone.chunks_for("fast").collect();
    let b: Vec<_> = shared.chunks_for("fast").collect();
    assert_eq!(a, b);
}

#[test]
fn equal_frequencies_keep_input_order() {
    let reg = registry(vec![
        Message::new("first", 4, 10.0),
        Message::new("second", 4, 10.0),
    ]);
    let schedule = duration_only(115_200, 10).schedule(&reg, 0.1).unwrap();

    assert_eq!(schedule.chunks[0].message_id, "first");
    assert_eq!(schedule.chunks[1].message_id, "second");
    assert_eq!(schedule.chunks[1].start, schedule.chunks[0].end);
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[test]
fn repeated_runs_are_identical() {
    let cfg = demo_config();
    let reg = cfg.registry().unwrap();
    let horizon = cfg.resolve_horizon(None).unwrap();
    let scheduler = GapFillScheduler::new(cfg.link, cfg.policy);

    let first = scheduler.schedule(&reg, horizon).unwrap();
    let second = scheduler.schedule(&reg, horizon).unwrap();
    assert_eq!(first, second);
}

#[test]
fn profiles_schedule_independently_in_parallel() {
    let cfg = demo_config();
    let reg = cfg.registry().unwrap();
    let horizon = cfg.resolve_horizon(None).unwrap();

    let sequential: Vec<Schedule> = cfg
        .profiles
        .values()
        .map(|link| {
            GapFillScheduler::new(*link, cfg.policy)
                .schedule(&reg, horizon)
                .unwrap()
        })
        .collect();

    let parallel: Vec<Schedule> = std::thread::scope(|s| {
        let handles: Vec<_> = cfg
            .profiles
            .values()
            .map(|link| {
                let reg = reg.clone();
                let scheduler = GapFillScheduler::new(*link, cfg.policy);
                s.spawn(move || scheduler.schedule(&reg, horizon).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
}

// ── Greedy limitation ─────────────────────────────────────────────────────────

/// The greedy pass places every `A` instance at the start of its window,
/// which leaves the first two `B` windows only 0.2 s of room for 0.22 s of
/// airtime.  An interleaved layout exists that serves everything.
#[test]
fn greedy_under_schedules_a_feasible_set() {
    // 1000 bit/s, 10 bits per byte → A = 0.2 s every 0.4 s, B = 0.22 s every 0.5 s
    let reg = registry(vec![
        Message::new("A", 20, 2.5),
        Message::new("B", 22, 2.0),
    ]);
    let schedule = duration_only(1_000, 10).schedule(&reg, 2.0).unwrap();

    let missed: Vec<(&str, usize)> = schedule
        .under_scheduled
        .iter()
        .map(|u| (u.message_id.as_str(), u.instance_index))
        .collect();
    assert_eq!(missed, vec![("B", 0), ("B", 1)]);
    assert_valid(&schedule);

    // (message, window_start, window_len, start, len)
    let feasible = [
        ("A", 0.0, 0.4, 0.00, 0.20),
        ("B", 0.0, 0.5, 0.20, 0.22),
        ("A", 0.4, 0.4, 0.42, 0.20),
        ("B", 0.5, 0.5, 0.62, 0.22),
        ("A", 0.8, 0.4, 0.84, 0.20),
        ("B", 1.0, 0.5, 1.04, 0.22),
        ("A", 1.2, 0.4, 1.26, 0.20),
        ("B", 1.5, 0.5, 1.50, 0.22),
        ("A", 1.6, 0.4, 1.72, 0.20),
    ];
    let mut previous_end = 0.0;
    for (id, ws, wl, start, len) in feasible {
        assert!(start >= ws - 1e-9 && start + len <= ws + wl + 1e-9, "{id} at {start}");
        assert!(start >= previous_end - 1e-9, "{id} at {start} overlaps");
        previous_end = start + len;
    }
    assert!(previous_end <= 2.0);
}
