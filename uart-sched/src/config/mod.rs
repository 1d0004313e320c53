/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Link and message configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! link:
//!   bit_rate: 115200
//!   bits_per_byte: 10          # optional, default 10 (8N1)
//! horizon_s: 1.0               # optional, default = hyperperiod of the messages
//! policy:                      # optional, default duration_only
//!   kind: byte_budget
//!   overhead_bytes: 2
//!   payload_granularity_bytes: 4
//! messages:
//!   - { id: M1, payload_bytes: 4,  frequency_hz: 500 }
//!   - { id: M2, payload_bytes: 50, frequency_hz: 31 }
//! profiles:                    # optional, alternate links for `compare`
//!   fast:
//!     bit_rate: 460800
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::capacity::{CapacityPolicy, LinkParams, DEFAULT_BITS_PER_BYTE};
use crate::hyperperiod::HyperperiodCalculator;
use crate::message::{Message, MessageRegistry};
use crate::scheduler::{ConfigError, SchedulerError};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    link: LinkEntry,
    horizon_s: Option<f64>,
    #[serde(default)]
    policy: PolicyEntry,
    #[serde(default)]
    messages: Vec<MessageEntry>,
    #[serde(default)]
    profiles: BTreeMap<String, LinkEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkEntry {
    bit_rate: u32,
    #[serde(default = "default_bits_per_byte")]
    bits_per_byte: u32,
}

fn default_bits_per_byte() -> u32 {
    DEFAULT_BITS_PER_BYTE
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum PolicyEntry {
    #[default]
    DurationOnly,
    ByteBudget {
        #[serde(default)]
        overhead_bytes: u32,
        #[serde(default = "default_granularity")]
        payload_granularity_bytes: u32,
    },
}

fn default_granularity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageEntry {
    id: String,
    payload_bytes: u32,
    frequency_hz: f64,
}

impl From<LinkEntry> for LinkParams {
    fn from(e: LinkEntry) -> Self {
        LinkParams::new(e.bit_rate, e.bits_per_byte)
    }
}

impl From<PolicyEntry> for CapacityPolicy {
    fn from(e: PolicyEntry) -> Self {
        match e {
            PolicyEntry::DurationOnly => CapacityPolicy::DurationOnly,
            PolicyEntry::ByteBudget {
                overhead_bytes,
                payload_granularity_bytes,
            } => CapacityPolicy::ByteBudget {
                overhead_bytes,
                granularity_bytes: payload_granularity_bytes,
            },
        }
    }
}

// ── Public data structures ────────────────────────────────────────────────────

/// Parsed scheduling configuration.
///
/// Values are carried as written; [`registry`](Self::registry) and
/// [`resolve_horizon`](Self::resolve_horizon) perform validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub link: LinkParams,
    pub horizon_s: Option<f64>,
    pub policy: CapacityPolicy,
    /// Input order is significant: it breaks priority ties.
    pub messages: Vec<Message>,
    /// Named alternate links, sorted by name.
    pub profiles: BTreeMap<String, LinkParams>,
}

impl ScheduleConfig {
    /// Read and parse `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or if the YAML does not
    /// match the expected layout.  Out-of-range values are **not** rejected
    /// here; they surface as [`ConfigError`]s when scheduling.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading schedule configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;

        let messages: Vec<Message> = file
            .messages
            .into_iter()
            .map(|e| Message::new(e.id, e.payload_bytes, e.frequency_hz))
            .collect();

        for m in &messages {
            debug!(
                "  Message: {} | payload: {}B | frequency: {}Hz",
                m.id, m.payload_bytes, m.frequency_hz
            );
        }
        if messages.is_empty() {
            warn!("No messages found in configuration file");
        }

        let config = Self {
            link: file.link.into(),
            horizon_s: file.horizon_s,
            policy: file.policy.into(),
            messages,
            profiles: file
                .profiles
                .into_iter()
                .map(|(name, e)| (name, e.into()))
                .collect(),
        };

        info!(
            messages = config.messages.len(),
            profiles = config.profiles.len(),
            bit_rate = config.link.bit_rate,
            policy = config.policy.name(),
            "Loaded schedule configuration"
        );

        Ok(config)
    }

    /// Validated message registry.
    pub fn registry(&self) -> Result<MessageRegistry, ConfigError> {
        MessageRegistry::new(self.messages.clone())
    }

    /// Horizon in seconds: `override_s`, else the configured `horizon_s`,
    /// else the hyperperiod of the message set.
    ///
    /// # Errors
    /// * [`ConfigError::InvalidHorizon`] for a non-positive or non-finite
    ///   explicit value.
    /// * [`SchedulerError::Horizon`] when the hyperperiod cannot be derived.
    pub fn resolve_horizon(&self, override_s: Option<f64>) -> Result<f64, SchedulerError> {
        if let Some(h) = override_s.or(self.horizon_s) {
            if !(h > 0.0 && h.is_finite()) {
                return Err(ConfigError::InvalidHorizon(h).into());
            }
            return Ok(h);
        }

        let info = HyperperiodCalculator::new().calculate(&self.messages)?;
        info!(
            horizon_s = info.seconds(),
            "No horizon configured, using hyperperiod"
        );
        Ok(info.seconds())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
