/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use uart_sched::capacity::bandwidth::{link_load, message_bits_per_second};
use uart_sched::capacity::LinkParams;
use uart_sched::config::ScheduleConfig;
use uart_sched::scheduler::{GapFillScheduler, Schedule, SchedulerError};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Offline gap-filling scheduler for periodic messages on a serial link.
///
/// Example:
///   uart-sched run -c demos/link_profile.yaml --output schedule.yaml
#[derive(Debug, Parser)]
#[command(
    name = "uart-sched",
    about = "Offline gap-filling scheduler for a half-duplex serial link",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the schedule and print every chunk.
    Run {
        /// Path to the YAML schedule configuration.
        #[arg(short = 'c', long = "config")]
        config: PathBuf,

        /// Horizon in seconds; overrides `horizon_s` from the file.
        #[arg(long)]
        horizon: Option<f64>,

        /// Write the full schedule as YAML to this file.
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Print the analytic link-load estimate without scheduling.
    Load {
        /// Path to the YAML schedule configuration.
        #[arg(short = 'c', long = "config")]
        config: PathBuf,
    },

    /// Schedule the base link and every named profile side by side.
    Compare {
        /// Path to the YAML schedule configuration; `profiles` lists the
        /// alternate links.
        #[arg(short = 'c', long = "config")]
        config: PathBuf,

        /// Horizon in seconds; overrides `horizon_s` from the file.
        #[arg(long)]
        horizon: Option<f64>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config,
            horizon,
            output,
        } => run(&config, horizon, output.as_deref()),
        Command::Load { config } => load(&config),
        Command::Compare { config, horizon } => compare(&config, horizon).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}

// ── run ───────────────────────────────────────────────────────────────────────

fn run(config: &Path, horizon: Option<f64>, output: Option<&Path>) -> Result<()> {
    let cfg = ScheduleConfig::load_from_file(config)?;
    let registry = cfg.registry().context("Invalid message set")?;
    let horizon = cfg.resolve_horizon(horizon)?;

    let schedule = GapFillScheduler::new(cfg.link, cfg.policy).schedule(&registry, horizon)?;

    print_chunks(&schedule);

    let violations = schedule.validate();
    if !violations.is_empty() {
        for v in &violations {
            error!(violation = ?v, "Schedule invariant broken");
        }
        bail!("schedule failed validation ({} violation(s))", violations.len());
    }

    if let Some(path) = output {
        let yaml = serde_yaml::to_string(&schedule).context("Failed to serialize schedule")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write schedule to: {}", path.display()))?;
        info!("Schedule written to {}", path.display());
    }

    Ok(())
}

fn print_chunks(schedule: &Schedule) {
    let overhead = schedule.policy.overhead_bytes();

    println!("Scheduled Transmission Chunks:");
    for c in &schedule.chunks {
        match c.payload_bytes_sent {
            Some(payload) => println!(
                "Message {} (instance {}): {:.6}s -> {:.6}s, payload: {}B, total: {}B, duration: {:.6}s",
                c.message_id,
                c.instance_index,
                c.start,
                c.end,
                payload,
                payload + overhead,
                c.duration()
            ),
            None => println!(
                "Message {} (instance {}): {:.6}s -> {:.6}s, duration: {:.6}s",
                c.message_id,
                c.instance_index,
                c.start,
                c.end,
                c.duration()
            ),
        }
    }

    for u in &schedule.under_scheduled {
        println!("WARNING: {u}");
    }

    let summary = schedule.summary();
    println!();
    println!(
        "{} chunk(s), {} under-scheduled instance(s), link busy {:.6}s of {:.6}s ({:.2}%)",
        schedule.chunks.len(),
        schedule.under_scheduled.len(),
        summary.busy_time_s,
        schedule.horizon,
        summary.occupancy * 100.0
    );
}

// ── load ──────────────────────────────────────────────────────────────────────

fn load(config: &Path) -> Result<()> {
    let cfg = ScheduleConfig::load_from_file(config)?;
    let registry = cfg.registry().context("Invalid message set")?;
    cfg.link.validate().context("Invalid link")?;

    let bit_rate = cfg.link.bit_rate as f64;
    println!(
        "Link: {} bit/s, {} bits per byte, policy {}",
        cfg.link.bit_rate,
        cfg.link.bits_per_byte,
        cfg.policy.name()
    );
    for m in registry.by_priority() {
        let bps = message_bits_per_second(m, &cfg.link, &cfg.policy);
        println!(
            "  {:<16} {:>6}B @ {:>10.3}Hz  {:>12.1} bit/s  {:>7.2}%",
            m.id,
            m.payload_bytes,
            m.frequency_hz,
            bps,
            bps / bit_rate * 100.0
        );
    }

    let load = link_load(registry.messages(), &cfg.link, &cfg.policy);
    println!(
        "Total: {:.1} bit/s ({:.2}% of link)",
        load.bits_per_second,
        load.percent()
    );
    if load.is_oversubscribed() {
        warn!(
            percent = load.percent(),
            "Message set exceeds link capacity"
        );
    }

    Ok(())
}

// ── compare ───────────────────────────────────────────────────────────────────

/// Schedule every link setting on its own blocking task.
///
/// Each task gets its own registry snapshot; results are printed in input
/// order (base first, then profiles by name).
async fn compare(config: &Path, horizon: Option<f64>) -> Result<()> {
    let cfg = ScheduleConfig::load_from_file(config)?;
    let registry = cfg.registry().context("Invalid message set")?;
    let horizon = cfg.resolve_horizon(horizon)?;

    let mut links: Vec<(String, LinkParams)> = vec![("base".to_string(), cfg.link)];
    links.extend(cfg.profiles.iter().map(|(name, link)| (name.clone(), *link)));

    info!(
        profiles = links.len(),
        horizon_s = horizon,
        "=== Comparing link profiles ==="
    );

    let mut tasks = JoinSet::new();
    for (index, (name, link)) in links.into_iter().enumerate() {
        let registry = registry.clone();
        let policy = cfg.policy;
        tasks.spawn_blocking(move || {
            let result = GapFillScheduler::new(link, policy).schedule(&registry, horizon);
            (index, name, link, result)
        });
    }

    let mut results: Vec<(usize, String, LinkParams, Result<Schedule, SchedulerError>)> =
        Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Scheduling task failed")?);
    }
    results.sort_by_key(|(index, ..)| *index);

    println!(
        "{:<12} {:>10} {:>5} {:>9} {:>8} {:>8} {:>10}",
        "profile", "bit/s", "bpb", "load %", "chunks", "under", "busy %"
    );
    for (_, name, link, result) in results {
        match result {
            Ok(schedule) => {
                let summary = schedule.summary();
                println!(
                    "{:<12} {:>10} {:>5} {:>9.2} {:>8} {:>8} {:>10.2}",
                    name,
                    link.bit_rate,
                    link.bits_per_byte,
                    schedule.estimated_load.percent(),
                    schedule.chunks.len(),
                    schedule.under_scheduled.len(),
                    summary.occupancy * 100.0
                );
            }
            Err(e) => println!(
                "{:<12} {:>10} {:>5}  error: {}",
                name, link.bit_rate, link.bits_per_byte, e
            ),
        }
    }

    Ok(())
}
