/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! uart-sched – offline gap-filling scheduler for periodic messages on a
//! half-duplex serial link
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── capacity/       – link parameters, capacity policies, load estimate
//! ├── config/         – YAML link / message configuration
//! ├── hyperperiod/    – default horizon from the LCM of message periods
//! ├── message.rs      – message definitions and priority order
//! ├── timeline.rs     – busy intervals and free-gap queries
//! └── scheduler/      – greedy gap-filling scheduler and its report types
//! ```

pub mod capacity;
pub mod config;
pub mod hyperperiod;
pub mod message;
pub mod scheduler;
pub mod timeline;
