//! Simulate command - drives a synthetic chat workload through the session memory.
//!
//! Time is simulated: each round advances a manual clock by `--step-secs`
//! and then sweeps, so hours of traffic run in milliseconds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use confidant_session::{
    GlobalStats, ManualClock, NoopHook, SessionManager, SessionMemorySettings,
};
use serde::Serialize;
use tracing::{debug, info};

use super::Context;

/// Arguments for the simulate command.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// New conversations opened each round
    #[arg(long, default_value_t = 20)]
    pub sessions_per_round: usize,

    /// Messages appended to each active conversation per round
    #[arg(long, default_value_t = 50)]
    pub messages_per_update: usize,

    /// Number of rounds to run
    #[arg(long, default_value_t = 10)]
    pub rounds: usize,

    /// Simulated seconds between rounds
    #[arg(long, default_value_t = 600)]
    pub step_secs: u64,

    /// Conversations stay active for this many rounds after opening
    #[arg(long, default_value_t = 3)]
    pub active_rounds: usize,
}

/// One round of the simulation.
#[derive(Debug, Serialize)]
struct RoundOutput {
    round: usize,
    opened: usize,
    updated: usize,
    removed: usize,
    total_sessions: usize,
    total_messages: usize,
}

/// Full simulation result for JSON output.
#[derive(Debug, Serialize)]
struct SimulateOutput {
    limits: SessionMemorySettings,
    rounds: Vec<RoundOutput>,
    final_stats: GlobalStats,
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let config = ctx.memory_config()?;
    let limits = SessionMemorySettings::from(&config);
    let clock = Arc::new(ManualClock::starting_now());
    let sessions: SessionManager<String> =
        SessionManager::with_clock(config, NoopHook, clock.clone())?;

    info!(
        rounds = args.rounds,
        sessions_per_round = args.sessions_per_round,
        "Starting session memory simulation"
    );

    let mut rounds = Vec::with_capacity(args.rounds);
    for round in 0..args.rounds {
        for n in 0..args.sessions_per_round {
            sessions.register_session(&session_id(round, n), Vec::new());
        }

        let first_active = round.saturating_sub(args.active_rounds);
        let mut updated = 0;
        for opened_in in first_active..=round {
            for n in 0..args.sessions_per_round {
                let id = session_id(opened_in, n);
                if !sessions.contains(&id) {
                    continue;
                }
                let batch = (0..args.messages_per_update).map(|i| format!("{id} r{round} m{i}"));
                sessions.update_session(&id, batch);
                updated += 1;
            }
        }

        clock.advance(Duration::from_secs(args.step_secs));
        let removed = sessions.sweep_now();
        let stats = sessions.global_stats();
        debug!(round, removed, total = stats.total_sessions, "Round complete");

        rounds.push(RoundOutput {
            round,
            opened: args.sessions_per_round,
            updated,
            removed,
            total_sessions: stats.total_sessions,
            total_messages: stats.total_messages,
        });
    }

    let output = SimulateOutput {
        limits,
        rounds,
        final_stats: sessions.global_stats(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human(&output, ctx.verbose);
    }

    Ok(())
}

fn session_id(round: usize, n: usize) -> String {
    format!("conv-{round}-{n}")
}

fn print_human(output: &SimulateOutput, verbose: bool) {
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Session Memory Simulation").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!(
        "  {} {} sessions, {} messages/session, {}s max age",
        dim.apply_to("Limits:"),
        output.limits.max_sessions,
        output.limits.max_messages_per_session,
        output.limits.max_age_secs
    );

    if verbose {
        println!();
        for r in &output.rounds {
            println!(
                "  {} opened {:>4}  updated {:>4}  removed {:>4}  live {:>4}  messages {:>7}",
                dim.apply_to(format!("round {:>3}", r.round)),
                r.opened,
                r.updated,
                r.removed,
                r.total_sessions,
                r.total_messages
            );
        }
    }

    let stats = &output.final_stats;
    let removed: usize = output.rounds.iter().map(|r| r.removed).sum();
    println!();
    println!("  {} {}", dim.apply_to("Live sessions:"), stats.total_sessions);
    println!("  {} {}", dim.apply_to("Live messages:"), stats.total_messages);
    println!("  {} {}", dim.apply_to("Removed by sweeps:"), removed);
    if stats.total_sessions > 0 {
        println!(
            "  {} {} .. {}",
            dim.apply_to("Created:"),
            stats.oldest_created_at.format("%H:%M:%S"),
            stats.newest_created_at.format("%H:%M:%S")
        );
    }
    println!();
}
