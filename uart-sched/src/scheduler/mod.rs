/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Gap-filling transmission scheduler.
//!
//! [`GapFillScheduler`] places every periodic instance of every message onto
//! one shared half-duplex link over a fixed horizon.  Messages are taken in
//! priority order (frequency descending); each instance owns the window
//! `[i·period, min((i+1)·period, horizon))` and is packed greedily into the
//! free gaps of that window, split into as many chunks as needed.
//!
//! # Capacity policies
//!
//! | Policy | Chunk size | Done when |
//! |---|---|---|
//! | [`CapacityPolicy::DurationOnly`] | `min(remaining_time, gap)` | remaining ≤ [`EPSILON`] |
//! | [`CapacityPolicy::ByteBudget`] | whole bytes: aligned payload + overhead | remaining bytes = 0 |
//!
//! # Properties
//! * Stateless `schedule()` — the [`BusyTimeline`] is created, owned and
//!   dropped inside one call, so independent runs can execute in parallel.
//! * Deterministic — no clocks, no hash-order iteration in the algorithm.
//! * Greedy — higher-priority messages never see lower-priority chunks.  An
//!   instance that does not fit is reported in
//!   [`Schedule::under_scheduled`], never treated as an error.
//!
//! # Example
//! ```rust
//! use uart_sched::capacity::{CapacityPolicy, LinkParams};
//! use uart_sched::message::{Message, MessageRegistry};
//! use uart_sched::scheduler::GapFillScheduler;
//!
//! let registry = MessageRegistry::new(vec![Message::new("M1", 4, 1.0)]).unwrap();
//! let scheduler = GapFillScheduler::new(LinkParams::new(115_200, 10), CapacityPolicy::DurationOnly);
//! let schedule = scheduler.schedule(&registry, 1.0).unwrap();
//! assert_eq!(schedule.chunks.len(), 1);
//! ```

pub mod error;
pub mod report;

pub use error::{ConfigError, SchedulerError};
pub use report::{
    Amount, Chunk, InstanceRecord, InstanceState, Schedule, ScheduleSummary, UnderScheduled,
    Violation,
};

use tracing::{debug, info, warn};

use crate::capacity::bandwidth::link_load;
use crate::capacity::{CapacityPolicy, LinkParams, EPSILON};
use crate::message::{Message, MessageRegistry};
use crate::timeline::{BusyTimeline, Interval};

// ── Gap fitting ───────────────────────────────────────────────────────────────

/// Why a free gap produced no chunk under the byte-budget policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSkip {
    /// The gap holds no more bytes than the framing overhead.
    OverheadOnly { available: u64 },
    /// The payload that fits rounds down to zero granules.
    BelowGranularity { max_payload: u64 },
    /// Shrinking to absorb floating-point overrun went below one granule.
    ShrinkExhausted,
}

/// Largest aligned payload of at most `remaining` bytes that fits, with
/// `overhead` bytes of framing, into `[gap_start, gap_end)`.
///
/// Returns `(payload, airtime)`.
pub fn fit_payload(
    link: &LinkParams,
    gap_start: f64,
    gap_end: f64,
    remaining: u32,
    overhead: u32,
    granularity: u32,
) -> Result<(u32, f64), GapSkip> {
    let available = link.bytes_in(gap_end - gap_start);
    if available <= overhead as u64 {
        return Err(GapSkip::OverheadOnly { available });
    }

    let max_payload = available - overhead as u64;
    let granularity = granularity as u64;
    let mut payload = (remaining as u64).min(max_payload);
    payload -= payload % granularity;
    if payload == 0 {
        return Err(GapSkip::BelowGranularity { max_payload });
    }

    let mut airtime = link.time_for(payload + overhead as u64);
    while gap_start + airtime > gap_end + EPSILON {
        payload = payload.saturating_sub(granularity);
        if payload < granularity {
            return Err(GapSkip::ShrinkExhausted);
        }
        airtime = link.time_for(payload + overhead as u64);
    }

    // payload ≤ remaining, which is a u32
    Ok((payload as u32, airtime))
}

// ── GapFillScheduler ──────────────────────────────────────────────────────────

/// Priority-ordered, gap-filling scheduler for one link.
///
/// Holds only the link parameters and the capacity policy.  All per-run state
/// lives inside [`schedule()`](Self::schedule).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFillScheduler {
    link: LinkParams,
    policy: CapacityPolicy,
}

impl GapFillScheduler {
    pub fn new(link: LinkParams, policy: CapacityPolicy) -> Self {
        Self { link, policy }
    }

    pub fn link(&self) -> &LinkParams {
        &self.link
    }

    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    // ── Public entry point ────────────────────────────────────────────────────

    /// Schedule every instance of every message in `registry` over
    /// `[0, horizon)`.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidConfig`] if the horizon, link or policy is out
    /// of range.  All checks run before the first chunk is placed; an error
    /// never comes with a partial schedule.
    pub fn schedule(
        &self,
        registry: &MessageRegistry,
        horizon: f64,
    ) -> Result<Schedule, SchedulerError> {
        // ── Preconditions ─────────────────────────────────────────────────────
        if !(horizon > 0.0 && horizon.is_finite()) {
            return Err(ConfigError::InvalidHorizon(horizon).into());
        }
        self.link.validate()?;
        self.policy.validate()?;

        let load = link_load(registry.messages(), &self.link, &self.policy);

        info!(
            policy = self.policy.name(),
            message_count = registry.len(),
            horizon_s = horizon,
            bit_rate = self.link.bit_rate,
            bits_per_byte = self.link.bits_per_byte,
            load_pct = load.percent(),
            "=== GapFillScheduler::schedule() ==="
        );
        if load.is_oversubscribed() {
            warn!(
                load_pct = load.percent(),
                bits_per_second = load.bits_per_second,
                "estimated demand exceeds link capacity; instances will be under-scheduled"
            );
        }
        self.warn_unaligned_payloads(registry);

        // ── Per-call state ────────────────────────────────────────────────────
        let mut timeline = BusyTimeline::new(horizon);
        let mut schedule = Schedule::empty(horizon, self.link, self.policy, load);

        for message in registry.by_priority() {
            self.schedule_message(message, &mut timeline, &mut schedule);
        }

        // Presentation order only; stable so equal starts keep placement order
        schedule.chunks.sort_by(|a, b| a.start.total_cmp(&b.start));

        info!(
            chunk_count = schedule.chunks.len(),
            instance_count = schedule.instances.len(),
            under_scheduled = schedule.under_scheduled.len(),
            busy_s = timeline.busy_time(),
            "=== Scheduling complete ==="
        );

        Ok(schedule)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-message / per-instance passes
    // ─────────────────────────────────────────────────────────────────────────

    fn schedule_message(
        &self,
        message: &Message,
        timeline: &mut BusyTimeline,
        schedule: &mut Schedule,
    ) {
        let horizon = timeline.horizon();
        let period = message.period();
        let before = schedule.chunks.len();

        let mut index = 0usize;
        loop {
            let window_start = index as f64 * period;
            if horizon - window_start <= EPSILON {
                break;
            }
            let window_end = ((index + 1) as f64 * period).min(horizon);

            let record =
                self.schedule_instance(message, index, window_start, window_end, timeline, schedule);

            if let InstanceState::UnderScheduled { missing } = record.state {
                let report = UnderScheduled {
                    message_id: message.id.clone(),
                    instance_index: index,
                    window_start,
                    missing,
                };
                warn!("{report}");
                schedule.under_scheduled.push(report);
            }
            schedule.instances.push(record);
            index += 1;
        }

        info!(
            message = %message.id,
            frequency_hz = message.frequency_hz,
            payload_bytes = message.payload_bytes,
            instances = index,
            chunks = schedule.chunks.len() - before,
            "message scheduled"
        );
    }

    fn schedule_instance(
        &self,
        message: &Message,
        index: usize,
        window_start: f64,
        window_end: f64,
        timeline: &mut BusyTimeline,
        schedule: &mut Schedule,
    ) -> InstanceRecord {
        let gaps = timeline.free_intervals(window_start, window_end);
        let mut state = InstanceState::Pending;

        let (required, missing) = match self.policy {
            CapacityPolicy::DurationOnly => {
                let required = message.duration_on(&self.link);
                let mut remaining = required;

                for (gap_start, gap_end) in gaps {
                    if gap_end - gap_start <= EPSILON {
                        continue;
                    }
                    let len = remaining.min(gap_end - gap_start);
                    let end = if len >= gap_end - gap_start {
                        gap_end
                    } else {
                        gap_start + len
                    };
                    Self::place(message, index, gap_start, end, None, timeline, schedule);
                    state = state.on_chunk();

                    remaining -= len;
                    if remaining <= EPSILON {
                        break;
                    }
                }

                let missing = (remaining > EPSILON).then_some(Amount::Seconds(remaining));
                (Amount::Seconds(required), missing)
            }

            CapacityPolicy::ByteBudget {
                overhead_bytes,
                granularity_bytes,
            } => {
                let mut remaining = message.payload_bytes;

                for (gap_start, gap_end) in gaps {
                    match fit_payload(
                        &self.link,
                        gap_start,
                        gap_end,
                        remaining,
                        overhead_bytes,
                        granularity_bytes,
                    ) {
                        Ok((payload, airtime)) => {
                            // never past the gap, even by the rounding slack
                            let end = (gap_start + airtime).min(gap_end);
                            Self::place(
                                message,
                                index,
                                gap_start,
                                end,
                                Some(payload),
                                timeline,
                                schedule,
                            );
                            state = state.on_chunk();

                            remaining -= payload;
                            if remaining == 0 {
                                break;
                            }
                        }
                        Err(reason) => {
                            debug!(
                                message = %message.id,
                                instance = index,
                                gap_start,
                                gap_end,
                                ?reason,
                                "gap skipped"
                            );
                        }
                    }
                }

                let missing = (remaining > 0).then_some(Amount::Bytes(remaining));
                (Amount::Bytes(message.payload_bytes), missing)
            }
        };

        InstanceRecord {
            message_id: message.id.clone(),
            instance_index: index,
            window_start,
            window_end,
            required,
            state: state.finish(missing),
        }
    }

    /// Record a chunk and occupy its span on the timeline.
    fn place(
        message: &Message,
        index: usize,
        start: f64,
        end: f64,
        payload_bytes_sent: Option<u32>,
        timeline: &mut BusyTimeline,
        schedule: &mut Schedule,
    ) {
        debug!(
            message = %message.id,
            instance = index,
            start,
            end,
            payload = ?payload_bytes_sent,
            "chunk placed"
        );
        timeline.insert(Interval {
            start,
            end,
            message_id: message.id.clone(),
            instance_index: index,
        });
        schedule.chunks.push(Chunk {
            start,
            end,
            message_id: message.id.clone(),
            instance_index: index,
            payload_bytes_sent,
        });
    }

    /// A payload that is not a multiple of the granularity can never be
    /// delivered completely: the remainder always rounds down to zero.
    fn warn_unaligned_payloads(&self, registry: &MessageRegistry) {
        let CapacityPolicy::ByteBudget {
            granularity_bytes, ..
        } = self.policy
        else {
            return;
        };
        for m in registry.messages() {
            let tail = m.payload_bytes % granularity_bytes;
            if tail != 0 {
                warn!(
                    message = %m.id,
                    payload_bytes = m.payload_bytes,
                    granularity_bytes,
                    short_by = tail,
                    "payload is not a multiple of the granularity; every instance will be under-scheduled"
                );
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
