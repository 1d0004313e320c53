/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Analytic link-load estimate.
//!
//! # Status: warning only
//!
//! The estimate is **computed and logged** before every scheduling run.  It
//! never blocks a run: the gap-filling scheduler is the authority on what
//! actually fits, and reports shortfalls per instance.
//!
//! # Model
//! Every message instance costs at least one framed chunk:
//!
//! $$L = \sum_{m} \frac{(P_m + O) \cdot f_m \cdot b}{R}$$
//!
//! with payload `P`, per-chunk overhead `O`, frequency `f`, frame width `b`
//! and bit rate `R`.  `L > 1.0` means the link is oversubscribed and some
//! instances will certainly be under-scheduled.  `L ≤ 1.0` is necessary but
//! not sufficient: chunking adds one `O` per extra chunk and granularity
//! rounding wastes the tail of small gaps.

use serde::Serialize;

use super::{CapacityPolicy, LinkParams};
use crate::message::Message;

/// Estimated steady-state demand on the link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkLoad {
    /// Demanded bits per second, framing included.
    pub bits_per_second: f64,

    /// `bits_per_second / bit_rate`.
    pub fraction: f64,
}

impl LinkLoad {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }

    pub fn is_oversubscribed(&self) -> bool {
        self.fraction > 1.0
    }
}

/// Bits per second needed by one message, assuming one chunk per instance.
pub fn message_bits_per_second(
    message: &Message,
    link: &LinkParams,
    policy: &CapacityPolicy,
) -> f64 {
    let bytes = message.payload_bytes as f64 + policy.overhead_bytes() as f64;
    bytes * link.bits_per_byte as f64 * message.frequency_hz
}

/// Sum the demand of `messages` on `link` under `policy`.
///
/// Returns a zero load for an empty slice.
pub fn link_load(messages: &[Message], link: &LinkParams, policy: &CapacityPolicy) -> LinkLoad {
    let bits_per_second: f64 = messages
        .iter()
        .map(|m| message_bits_per_second(m, link, policy))
        .sum();

    LinkLoad {
        bits_per_second,
        fraction: bits_per_second / link.bit_rate as f64,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
