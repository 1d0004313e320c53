/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the gap-filling scheduler.
//!
//! Two error enums model the two failure layers:
//!
//! * [`ConfigError`] — one input field is out of range (carries the field
//!   and, where useful, the offending value).
//! * [`SchedulerError`] — top-level failure returned from
//!   [`GapFillScheduler::schedule()`](super::GapFillScheduler::schedule).
//!
//! An instance that cannot be fully placed is **not** an error: it is an
//! [`UnderScheduled`](super::report::UnderScheduled) entry in the returned
//! schedule.
//!
//! **Do not** replace these with `anyhow::Error` in library paths — callers
//! match on the variants.

use thiserror::Error;

use crate::hyperperiod::HyperperiodError;

// ── Configuration ─────────────────────────────────────────────────────────────

/// An invalid input detected before any scheduling work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The message list is empty.
    #[error("no messages provided: message list is empty")]
    NoMessages,

    #[error("message at position {index} has an empty id")]
    EmptyMessageId { index: usize },

    #[error("message id '{0}' appears more than once")]
    DuplicateMessageId(String),

    #[error("message '{message}': payload_bytes must be > 0")]
    NonPositivePayload { message: String },

    /// Zero, negative, NaN, infinite, or so small that the period overflows.
    #[error("message '{message}': frequency_hz must be positive and finite (got {frequency_hz})")]
    InvalidFrequency { message: String, frequency_hz: f64 },

    #[error("horizon must be positive and finite (got {0}s)")]
    InvalidHorizon(f64),

    #[error("bit_rate must be > 0")]
    NonPositiveBitRate,

    #[error("bits_per_byte must be >= 8 (got {0})")]
    FrameWidthTooSmall(u32),

    #[error("payload_granularity_bytes must be >= 1")]
    ZeroGranularity,
}

impl ConfigError {
    /// Name of the configuration field that was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::NoMessages => "messages",
            ConfigError::EmptyMessageId { .. } | ConfigError::DuplicateMessageId(_) => "id",
            ConfigError::NonPositivePayload { .. } => "payload_bytes",
            ConfigError::InvalidFrequency { .. } => "frequency_hz",
            ConfigError::InvalidHorizon(_) => "horizon_s",
            ConfigError::NonPositiveBitRate => "bit_rate",
            ConfigError::FrameWidthTooSmall(_) => "bits_per_byte",
            ConfigError::ZeroGranularity => "payload_granularity_bytes",
        }
    }
}

// ── Top-level scheduler errors ────────────────────────────────────────────────

/// Top-level error type returned by
/// [`GapFillScheduler::schedule()`](super::GapFillScheduler::schedule).
///
/// No variant is ever produced after the first chunk has been placed: every
/// check runs up front, so an error always means "no schedule at all".
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// No explicit horizon was given and none could be derived from the
    /// message periods.
    #[error("cannot derive scheduling horizon: {0}")]
    Horizon(#[from] HyperperiodError),
}
