/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Link capacity model: conversion between airtime and whole bytes.
//!
//! A serial frame carries 8 data bits plus start/stop (and optionally parity)
//! bits, so one byte occupies `bits_per_byte / bit_rate` seconds on the wire.
//!
//! ```text
//! bytes_in(d)  = floor(d * bit_rate / bits_per_byte)
//! time_for(n)  = n * bits_per_byte / bit_rate
//! ```
//!
//! [`CapacityPolicy`] selects how the scheduler quantises each chunk:
//! by raw airtime ([`CapacityPolicy::DurationOnly`]) or by a byte budget with
//! per-chunk framing overhead and payload alignment
//! ([`CapacityPolicy::ByteBudget`]).

pub mod bandwidth;

use serde::Serialize;

use crate::scheduler::ConfigError;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Floating-point tolerance (seconds) for every time comparison in the crate.
///
/// Gates both the no-overlap check and the "instance fully delivered" check
/// of the duration-only policy.
pub const EPSILON: f64 = 1e-12;

/// 8 data bits + 1 start bit + 1 stop bit.
pub const DEFAULT_BITS_PER_BYTE: u32 = 10;

// ── LinkParams ────────────────────────────────────────────────────────────────

/// Physical parameters of the shared half-duplex link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkParams {
    /// Line rate in bits per second (baud for a UART).
    pub bit_rate: u32,

    /// Bits on the wire per transmitted byte, framing included.
    pub bits_per_byte: u32,
}

impl LinkParams {
    pub fn new(bit_rate: u32, bits_per_byte: u32) -> Self {
        Self {
            bit_rate,
            bits_per_byte,
        }
    }

    /// Reject a zero bit rate or a frame narrower than one data byte.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_rate == 0 {
            return Err(ConfigError::NonPositiveBitRate);
        }
        if self.bits_per_byte < 8 {
            return Err(ConfigError::FrameWidthTooSmall(self.bits_per_byte));
        }
        Ok(())
    }

    /// Whole bytes that fit in `duration` seconds.
    ///
    /// `duration` must be non-negative.
    pub fn bytes_in(&self, duration: f64) -> u64 {
        debug_assert!(duration >= 0.0, "bytes_in called with negative duration");
        (duration * self.bit_rate as f64 / self.bits_per_byte as f64).floor() as u64
    }

    /// Exact airtime of `bytes` bytes, in seconds.
    pub fn time_for(&self, bytes: u64) -> f64 {
        bytes as f64 * self.bits_per_byte as f64 / self.bit_rate as f64
    }
}

impl Default for LinkParams {
    fn default() -> Self {
        Self::new(115_200, DEFAULT_BITS_PER_BYTE)
    }
}

// ── CapacityPolicy ────────────────────────────────────────────────────────────

/// How a gap is converted into a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Chunks are bounded only by airtime; a message instance needs
    /// `time_for(payload_bytes)` seconds in total and may be cut anywhere.
    DurationOnly,

    /// Chunks are whole bytes: each carries `overhead_bytes` of framing plus a
    /// payload that is a multiple of `granularity_bytes`.
    ByteBudget {
        overhead_bytes: u32,
        granularity_bytes: u32,
    },
}

impl CapacityPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            CapacityPolicy::DurationOnly => Ok(()),
            CapacityPolicy::ByteBudget {
                granularity_bytes, ..
            } => {
                if *granularity_bytes == 0 {
                    Err(ConfigError::ZeroGranularity)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Per-chunk framing cost in bytes (`0` for [`CapacityPolicy::DurationOnly`]).
    pub fn overhead_bytes(&self) -> u32 {
        match self {
            CapacityPolicy::DurationOnly => 0,
            CapacityPolicy::ByteBudget { overhead_bytes, .. } => *overhead_bytes,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CapacityPolicy::DurationOnly => "duration_only",
            CapacityPolicy::ByteBudget { .. } => "byte_budget",
        }
    }
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        CapacityPolicy::DurationOnly
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
