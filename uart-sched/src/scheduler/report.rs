/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduling output: chunks, per-instance outcomes, validation and summary.
//!
//! A [`Schedule`] is the only artifact handed to presentation code (timeline
//! renderers, bandwidth readouts).  It is plain data; consumers read it and
//! never feed it back into the scheduler.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::capacity::bandwidth::LinkLoad;
use crate::capacity::{CapacityPolicy, LinkParams, EPSILON};

// ── Amount ────────────────────────────────────────────────────────────────────

/// A quantity of transmission demand: airtime for the duration-only policy,
/// payload bytes for the byte-budget policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Seconds(f64),
    Bytes(u32),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Seconds(s) => write!(f, "{s:.6}s transmission time"),
            Amount::Bytes(b) => write!(f, "{b} payload bytes"),
        }
    }
}

// ── Chunk ─────────────────────────────────────────────────────────────────────

/// One contiguous transmission segment of a message instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub start: f64,
    pub end: f64,
    pub message_id: String,
    pub instance_index: usize,

    /// Payload carried, framing excluded.  `None` under the duration-only
    /// policy, where chunks are not byte-quantised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_bytes_sent: Option<u32>,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ── Instance state ────────────────────────────────────────────────────────────

/// Lifecycle of one message instance during a run.
///
/// ```text
/// Pending ──chunk──► PartiallyFilled ──chunk──► PartiallyFilled
///    │                      │
///    └──────finish──────────┴──► FullyScheduled | UnderScheduled(missing)
/// ```
///
/// Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    PartiallyFilled,
    FullyScheduled,
    UnderScheduled { missing: Amount },
}

impl InstanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceState::FullyScheduled | InstanceState::UnderScheduled { .. }
        )
    }

    /// A chunk was placed.
    pub(crate) fn on_chunk(self) -> Self {
        debug_assert!(!self.is_terminal(), "chunk placed after {self:?}");
        match self {
            InstanceState::Pending | InstanceState::PartiallyFilled => {
                InstanceState::PartiallyFilled
            }
            terminal => terminal,
        }
    }

    /// Gap walk finished; `missing` is the undelivered remainder, if any.
    pub(crate) fn finish(self, missing: Option<Amount>) -> Self {
        if self.is_terminal() {
            return self;
        }
        match missing {
            None => InstanceState::FullyScheduled,
            Some(missing) => InstanceState::UnderScheduled { missing },
        }
    }
}

/// Outcome of one message instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    pub message_id: String,
    pub instance_index: usize,
    pub window_start: f64,
    pub window_end: f64,
    /// What the instance had to deliver.
    pub required: Amount,
    pub state: InstanceState,
}

/// Non-fatal report: an instance could not be fully placed in its window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderScheduled {
    pub message_id: String,
    pub instance_index: usize,
    pub window_start: f64,
    pub missing: Amount,
}

impl fmt::Display for UnderScheduled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not fully schedule message {} instance {}: missing {} in period starting at {:.6}s",
            self.message_id, self.instance_index, self.missing, self.window_start
        )
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// A broken schedule invariant found by [`Schedule::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Two chunks share airtime.
    Overlap {
        first: (String, usize),
        second: (String, usize),
        at: f64,
    },
    /// A chunk leaves its instance's period window.
    OutsideWindow {
        message_id: String,
        instance_index: usize,
        start: f64,
        end: f64,
    },
    /// Payload is not a multiple of the granularity (or is missing).
    Misaligned {
        message_id: String,
        instance_index: usize,
        payload: Option<u32>,
    },
    /// Payload plus overhead does not fit the chunk's airtime.
    ByteOverrun {
        message_id: String,
        instance_index: usize,
        bytes: u64,
        duration: f64,
    },
    /// A fully-scheduled instance did not deliver exactly its demand.
    Conservation {
        message_id: String,
        instance_index: usize,
        required: Amount,
        delivered: Amount,
    },
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Per-message totals over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSummary {
    pub message_id: String,
    pub instances: usize,
    pub fully_scheduled: usize,
    pub chunks: usize,
    pub payload_bytes_sent: u64,
    pub airtime_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    /// In scheduling (priority) order.
    pub messages: Vec<MessageSummary>,
    pub busy_time_s: f64,
    /// Busy time as a fraction of the horizon.
    pub occupancy: f64,
}

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Result of one [`GapFillScheduler::schedule`](super::GapFillScheduler::schedule) run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub horizon: f64,
    pub link: LinkParams,
    pub policy: CapacityPolicy,
    /// Analytic estimate computed before the run.
    pub estimated_load: LinkLoad,
    /// Sorted ascending by `start`.
    pub chunks: Vec<Chunk>,
    pub under_scheduled: Vec<UnderScheduled>,
    /// One record per instance, in scheduling order.
    pub instances: Vec<InstanceRecord>,
}

impl Schedule {
    pub(crate) fn empty(
        horizon: f64,
        link: LinkParams,
        policy: CapacityPolicy,
        estimated_load: LinkLoad,
    ) -> Self {
        Self {
            horizon,
            link,
            policy,
            estimated_load,
            chunks: Vec::new(),
            under_scheduled: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// `true` when no instance was under-scheduled.
    pub fn is_complete(&self) -> bool {
        self.under_scheduled.is_empty()
    }

    pub fn chunks_for<'a>(&'a self, message_id: &'a str) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.chunks.iter().filter(move |c| c.message_id == message_id)
    }

    /// Check every output invariant.  Returns an empty list for a correct
    /// schedule.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check_overlap(&mut violations);
        self.check_chunks(&mut violations);
        self.check_conservation(&mut violations);
        violations
    }

    fn check_overlap(&self, out: &mut Vec<Violation>) {
        // Chunks are sorted by start, so each one only has to clear the
        // furthest end seen so far.
        let mut furthest: Option<&Chunk> = None;
        for chunk in &self.chunks {
            if let Some(prev) = furthest {
                if chunk.start < prev.end - EPSILON {
                    out.push(Violation::Overlap {
                        first: (prev.message_id.clone(), prev.instance_index),
                        second: (chunk.message_id.clone(), chunk.instance_index),
                        at: chunk.start,
                    });
                }
                if chunk.end > prev.end {
                    furthest = Some(chunk);
                }
            } else {
                furthest = Some(chunk);
            }
        }
    }

    fn check_chunks(&self, out: &mut Vec<Violation>) {
        let windows: HashMap<(&str, usize), (f64, f64)> = self
            .instances
            .iter()
            .map(|r| {
                (
                    (r.message_id.as_str(), r.instance_index),
                    (r.window_start, r.window_end),
                )
            })
            .collect();

        for chunk in &self.chunks {
            let key = (chunk.message_id.as_str(), chunk.instance_index);
            let inside = windows
                .get(&key)
                .is_some_and(|&(ws, we)| chunk.start >= ws - EPSILON && chunk.end <= we + EPSILON);
            if !inside {
                out.push(Violation::OutsideWindow {
                    message_id: chunk.message_id.clone(),
                    instance_index: chunk.instance_index,
                    start: chunk.start,
                    end: chunk.end,
                });
            }

            if let CapacityPolicy::ByteBudget {
                overhead_bytes,
                granularity_bytes,
            } = self.policy
            {
                let Some(payload) = chunk.payload_bytes_sent.filter(|p| p % granularity_bytes == 0)
                else {
                    out.push(Violation::Misaligned {
                        message_id: chunk.message_id.clone(),
                        instance_index: chunk.instance_index,
                        payload: chunk.payload_bytes_sent,
                    });
                    continue;
                };
                let bytes = payload as u64 + overhead_bytes as u64;
                // placement may clamp up to EPSILON off the end of the gap
                let slack = 2.0 * EPSILON + timestamp_slack(chunk.end);
                if self.link.time_for(bytes) > chunk.duration() + slack {
                    out.push(Violation::ByteOverrun {
                        message_id: chunk.message_id.clone(),
                        instance_index: chunk.instance_index,
                        bytes,
                        duration: chunk.duration(),
                    });
                }
            }
        }
    }

    fn check_conservation(&self, out: &mut Vec<Violation>) {
        let mut delivered_time: HashMap<(&str, usize), (f64, usize)> = HashMap::new();
        let mut delivered_bytes: HashMap<(&str, usize), u64> = HashMap::new();
        for chunk in &self.chunks {
            let key = (chunk.message_id.as_str(), chunk.instance_index);
            let t = delivered_time.entry(key).or_default();
            t.0 += chunk.duration();
            t.1 += 1;
            *delivered_bytes.entry(key).or_default() += chunk.payload_bytes_sent.unwrap_or(0) as u64;
        }

        for record in &self.instances {
            if record.state != InstanceState::FullyScheduled {
                continue;
            }
            let key = (record.message_id.as_str(), record.instance_index);
            let (ok, delivered) = match record.required {
                Amount::Seconds(required) => {
                    let (sum, n) = delivered_time.get(&key).copied().unwrap_or((0.0, 0));
                    // one rounding step per chunk boundary, plus the
                    // precision lost rebuilding each duration from timestamps
                    let tolerance = EPSILON * (n + 1) as f64
                        + n as f64 * timestamp_slack(record.window_end);
                    ((sum - required).abs() <= tolerance, Amount::Seconds(sum))
                }
                Amount::Bytes(required) => {
                    let sum = delivered_bytes.get(&key).copied().unwrap_or(0);
                    (sum == required as u64, Amount::Bytes(sum.min(u32::MAX as u64) as u32))
                }
            };
            if !ok {
                out.push(Violation::Conservation {
                    message_id: record.message_id.clone(),
                    instance_index: record.instance_index,
                    required: record.required,
                    delivered,
                });
            }
        }
    }

    /// Per-message totals and overall link occupancy.
    pub fn summary(&self) -> ScheduleSummary {
        let mut order: Vec<MessageSummary> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in &self.instances {
            let i = *index.entry(record.message_id.as_str()).or_insert_with(|| {
                order.push(MessageSummary {
                    message_id: record.message_id.clone(),
                    instances: 0,
                    fully_scheduled: 0,
                    chunks: 0,
                    payload_bytes_sent: 0,
                    airtime_s: 0.0,
                });
                order.len() - 1
            });
            order[i].instances += 1;
            if record.state == InstanceState::FullyScheduled {
                order[i].fully_scheduled += 1;
            }
        }

        let mut busy_time_s = 0.0;
        for chunk in &self.chunks {
            busy_time_s += chunk.duration();
            if let Some(&i) = index.get(chunk.message_id.as_str()) {
                order[i].chunks += 1;
                order[i].payload_bytes_sent += chunk.payload_bytes_sent.unwrap_or(0) as u64;
                order[i].airtime_s += chunk.duration();
            }
        }

        ScheduleSummary {
            messages: order,
            busy_time_s,
            occupancy: busy_time_s / self.horizon,
        }
    }
}

/// Largest error of `end - start` when both are rounded timestamps no later
/// than `at` seconds.
fn timestamp_slack(at: f64) -> f64 {
    f64::EPSILON * at.abs()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
