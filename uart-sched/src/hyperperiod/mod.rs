/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Default scheduling horizon from the message periods.
//!
//! The hyperperiod of a message set is the LCM of all periods: the smallest
//! window after which the whole transmission pattern repeats.  Scheduling
//! exactly one hyperperiod therefore covers every phase relation between
//! messages.
//!
//! Periods are real numbers (`1 / frequency_hz`), so the LCM is taken over
//! periods expressed in whole microseconds.  A rate such as 890 Hz has no
//! whole-microsecond period; such sets need an explicit horizon.

pub mod math;

use tracing::{debug, info, warn};

use crate::message::Message;
use math::{lcm_of_slice, period_to_micros};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default upper limit on the derived horizon (1 hour in microseconds).
pub const DEFAULT_HYPERPERIOD_LIMIT_US: u64 = 3_600_000_000;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur while deriving the hyperperiod.
#[derive(Debug, Clone, PartialEq)]
pub enum HyperperiodError {
    /// The message slice was empty.
    NoValidPeriods,

    /// A message's period is not a whole number of microseconds.
    NonIntegralPeriod { message: String, frequency_hz: f64 },

    /// LCM calculation overflowed `u64`.
    Overflow { a: u64, b: u64 },

    /// The hyperperiod exceeded the configured limit.
    TooLarge { value_us: u64, limit_us: u64 },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoValidPeriods => write!(f, "no messages with a valid period"),
            HyperperiodError::NonIntegralPeriod {
                message,
                frequency_hz,
            } => write!(
                f,
                "message '{message}' at {frequency_hz} Hz has no whole-microsecond period; \
                 set horizon_s explicitly"
            ),
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
            HyperperiodError::TooLarge { value_us, limit_us } => write!(
                f,
                "hyperperiod {value_us}µs ({:.1}s) exceeds limit {limit_us}µs ({:.1}s)",
                *value_us as f64 / 1_000_000.0,
                *limit_us as f64 / 1_000_000.0
            ),
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Calculated hyperperiod of one message set.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperperiodInfo {
    /// LCM of all unique periods, in microseconds.
    pub hyperperiod_us: u64,

    /// Unique periods in microseconds (sorted, deduplicated).
    pub unique_periods_us: Vec<u64>,

    pub message_count: usize,
}

impl HyperperiodInfo {
    pub fn seconds(&self) -> f64 {
        self.hyperperiod_us as f64 / 1_000_000.0
    }
}

// ── HyperperiodCalculator ─────────────────────────────────────────────────────

/// Stateless hyperperiod calculator with an upper bound.
#[derive(Debug, Clone, Copy)]
pub struct HyperperiodCalculator {
    limit_us: u64,
}

impl HyperperiodCalculator {
    /// Calculator with the default 1-hour limit.
    pub fn new() -> Self {
        Self {
            limit_us: DEFAULT_HYPERPERIOD_LIMIT_US,
        }
    }

    pub fn with_limit(limit_us: u64) -> Self {
        Self { limit_us }
    }

    /// Compute the hyperperiod of `messages`.
    ///
    /// # Errors
    /// * [`HyperperiodError::NoValidPeriods`] – empty slice.
    /// * [`HyperperiodError::NonIntegralPeriod`] – first message whose period
    ///   is not a whole microsecond.
    /// * [`HyperperiodError::Overflow`] – LCM exceeded `u64`.
    /// * [`HyperperiodError::TooLarge`] – result exceeds the limit.
    pub fn calculate(&self, messages: &[Message]) -> Result<HyperperiodInfo, HyperperiodError> {
        if messages.is_empty() {
            return Err(HyperperiodError::NoValidPeriods);
        }

        let mut unique_periods_us = Vec::with_capacity(messages.len());
        for m in messages {
            let p = period_to_micros(m.period()).ok_or_else(|| {
                HyperperiodError::NonIntegralPeriod {
                    message: m.id.clone(),
                    frequency_hz: m.frequency_hz,
                }
            })?;
            unique_periods_us.push(p);
        }
        unique_periods_us.sort_unstable();
        unique_periods_us.dedup();

        let hyperperiod_us = lcm_of_slice(&unique_periods_us)?;

        if hyperperiod_us > self.limit_us {
            warn!(
                hyperperiod_us,
                limit_us = self.limit_us,
                "Hyperperiod exceeds configured limit"
            );
            return Err(HyperperiodError::TooLarge {
                value_us: hyperperiod_us,
                limit_us: self.limit_us,
            });
        }

        info!(
            message_count = messages.len(),
            unique_count = unique_periods_us.len(),
            hyperperiod_ms = hyperperiod_us as f64 / 1_000.0,
            "Calculated hyperperiod"
        );
        for p in &unique_periods_us {
            debug!(period_us = p, "  unique period");
        }

        Ok(HyperperiodInfo {
            hyperperiod_us,
            unique_periods_us,
            message_count: messages.len(),
        })
    }
}

impl Default for HyperperiodCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
