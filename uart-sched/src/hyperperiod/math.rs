/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Integer helpers for the hyperperiod: period quantisation, GCD, checked LCM.

use super::HyperperiodError;
use crate::capacity::EPSILON;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Express `period_s` as whole microseconds.
///
/// Returns `None` when the period is not within [`EPSILON`] seconds of a
/// whole microsecond (e.g. 890 Hz → 1123.595… µs) or rounds to zero.
pub fn period_to_micros(period_s: f64) -> Option<u64> {
    let micros = (period_s * MICROS_PER_SECOND).round();
    if micros < 1.0 || micros > u64::MAX as f64 {
        return None;
    }
    if (micros / MICROS_PER_SECOND - period_s).abs() > EPSILON {
        return None;
    }
    Some(micros as u64)
}

/// Iterative Euclidean GCD.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// `lcm(a, b)`, or [`HyperperiodError::Overflow`] if it does not fit in `u64`.
///
/// Divides before multiplying; the multiplication is still checked.
pub fn lcm(a: u64, b: u64) -> Result<u64, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// LCM of every element, `Ok(0)` for an empty slice.
pub fn lcm_of_slice(periods_us: &[u64]) -> Result<u64, HyperperiodError> {
    let Some((&first, rest)) = periods_us.split_first() else {
        return Ok(0);
    };
    rest.iter().try_fold(first, |acc, &p| lcm(acc, p))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
