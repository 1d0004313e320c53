/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic message set and its priority order.
//!
//! ```text
//! config / caller ──(Vec<Message>)──►  MessageRegistry  ──(by_priority)──►  GapFillScheduler
//!                                        ↑ validated once, immutable afterwards
//! ```
//!
//! # Priority model
//! Messages are scheduled in **descending frequency** order, ties broken by
//! input order.  High-rate messages have the shortest windows and the least
//! slack, so they claim the link first; low-rate messages are chunked into
//! whatever gaps remain across their longer windows.
//!
//! This is a greedy heuristic.  It is not optimal and it can under-schedule a
//! message set for which a feasible interleaving exists.

use std::collections::HashSet;

use serde::Serialize;

use crate::capacity::LinkParams;
use crate::scheduler::ConfigError;

// ── Message ───────────────────────────────────────────────────────────────────

/// One periodic transmission: `payload_bytes` every `1 / frequency_hz` seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Unique identifier within the registry.
    pub id: String,

    /// Payload size per instance, framing excluded.
    pub payload_bytes: u32,

    /// Repetition rate in Hz.
    pub frequency_hz: f64,
}

impl Message {
    pub fn new(id: impl Into<String>, payload_bytes: u32, frequency_hz: f64) -> Self {
        Self {
            id: id.into(),
            payload_bytes,
            frequency_hz,
        }
    }

    /// Period in seconds.
    pub fn period(&self) -> f64 {
        1.0 / self.frequency_hz
    }

    /// Airtime of one full, unchunked instance on `link`.
    pub fn duration_on(&self, link: &LinkParams) -> f64 {
        link.time_for(self.payload_bytes as u64)
    }

    /// Check the fields that would make the instance count unbounded or the
    /// instance empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payload_bytes == 0 {
            return Err(ConfigError::NonPositivePayload {
                message: self.id.clone(),
            });
        }
        let period = self.period();
        if !(self.frequency_hz > 0.0 && self.frequency_hz.is_finite())
            || !(period > 0.0 && period.is_finite())
        {
            return Err(ConfigError::InvalidFrequency {
                message: self.id.clone(),
                frequency_hz: self.frequency_hz,
            });
        }
        Ok(())
    }
}

// ── MessageRegistry ───────────────────────────────────────────────────────────

/// Validated, immutable message set for one scheduling run.
///
/// Cloning a registry gives an independent snapshot; nothing is shared
/// between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRegistry {
    messages: Vec<Message>,
}

impl MessageRegistry {
    /// Validate `messages` and take ownership of them.
    ///
    /// # Errors
    /// * [`ConfigError::NoMessages`] for an empty list.
    /// * [`ConfigError::EmptyMessageId`] / [`ConfigError::DuplicateMessageId`]
    ///   for identity problems.
    /// * Any error from [`Message::validate`].
    pub fn new(messages: Vec<Message>) -> Result<Self, ConfigError> {
        if messages.is_empty() {
            return Err(ConfigError::NoMessages);
        }

        let mut seen = HashSet::new();
        for (index, m) in messages.iter().enumerate() {
            if m.id.is_empty() {
                return Err(ConfigError::EmptyMessageId { index });
            }
            if !seen.insert(m.id.as_str()) {
                return Err(ConfigError::DuplicateMessageId(m.id.clone()));
            }
            m.validate()?;
        }

        Ok(Self { messages })
    }

    /// Messages in input order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in scheduling order: frequency descending, stable on ties.
    pub fn by_priority(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        // `sort_by` is stable: equal frequencies keep their input order
        sorted.sort_by(|a, b| b.frequency_hz.total_cmp(&a.frequency_hz));
        sorted
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Message ───────────────────────────────────────────────────────────────

    #[test]
    fn period_is_inverse_frequency() {
        let m = Message::new("m", 4, 500.0);
        assert!((m.period() - 0.002).abs() < 1e-15);
    }

    #[test]
    fn duration_on_uses_frame_width() {
        let m = Message::new("m", 10, 31.0);
        let link = LinkParams::new(115_200, 10);
        assert!((m.duration_on(&link) - 100.0 / 115_200.0).abs() < 1e-15);
    }

    #[test]
    fn zero_payload_is_rejected() {
        let err = Message::new("m", 0, 1.0).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositivePayload {
                message: "m".into()
            }
        );
    }

    #[test]
    fn zero_negative_and_non_finite_frequencies_are_rejected() {
        for f in [0.0, -5.0, f64::NAN, f64::INFINITY, 1e-320] {
            let result = Message::new("m", 4, f).validate();
            assert!(
                matches!(result, Err(ConfigError::InvalidFrequency { .. })),
                "frequency {f} should be rejected"
            );
        }
    }

    // ── MessageRegistry ───────────────────────────────────────────────────────

    #[test]
    fn empty_registry_is_rejected() {
        assert_eq!(MessageRegistry::new(vec![]), Err(ConfigError::NoMessages));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = MessageRegistry::new(vec![
            Message::new("a", 4, 1.0),
            Message::new("a", 8, 2.0),
        ]);
        assert_eq!(result, Err(ConfigError::DuplicateMessageId("a".into())));
    }

    #[test]
    fn empty_id_is_rejected_with_position() {
        let result = MessageRegistry::new(vec![Message::new("a", 4, 1.0), Message::new("", 4, 1.0)]);
        assert_eq!(result, Err(ConfigError::EmptyMessageId { index: 1 }));
    }

    #[test]
    fn by_priority_sorts_by_descending_frequency() {
        let reg = MessageRegistry::new(vec![
            Message::new("slow", 33, 2.0),
            Message::new("fast", 4, 890.0),
            Message::new("mid", 10, 31.0),
        ])
        .unwrap();
        let order: Vec<&str> = reg.by_priority().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec!["fast", "mid", "slow"]);
    }

    #[test]
    fn by_priority_keeps_input_order_on_ties() {
        let reg = MessageRegistry::new(vec![
            Message::new("b", 4, 10.0),
            Message::new("a", 4, 10.0),
            Message::new("c", 4, 100.0),
            Message::new("d", 4, 10.0),
        ])
        .unwrap();
        let order: Vec<&str> = reg.by_priority().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn get_finds_by_id() {
        let reg = MessageRegistry::new(vec![Message::new("x", 4, 1.0)]).unwrap();
        assert_eq!(reg.get("x").map(|m| m.payload_bytes), Some(4));
        assert!(reg.get("y").is_none());
        assert_eq!(reg.len(), 1);
        assert!(!reg.is_empty());
    }
}
