//! Connectivity watch command implementation.
//!
//! Polls reachability on an interval and replays the queue each time the
//! backend comes back. Events are written as they happen: colored lines in
//! pretty mode, one JSON object per line in JSON mode.

use std::io::Write;
use std::thread;
use std::time::Duration;

use serde_json::json;

use crate::cli::args::OutputFormat;
use crate::cli::context::Context;
use crate::error::CrewsyncError;
use crate::offline::{format_drain_outcome, DrainOutcome, OfflineSession, Transition};
use crate::output::{drain_value, format_transition_pretty, to_json_line};

/// Run the watch loop until `count` probes have been made (forever if `None`).
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn watch(
    ctx: &Context,
    interval: Option<u64>,
    count: Option<u64>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<String, CrewsyncError> {
    let interval = interval.map_or_else(
        || ctx.config().connectivity.poll_interval(),
        |secs| Duration::from_secs(secs.max(1)),
    );

    let mut session = ctx.session();
    let start = match format {
        OutputFormat::Json => to_json_line(&json!({
            "event": "start",
            "online": session.is_online(),
            "queued": session.all().len(),
            "interval_secs": interval.as_secs(),
        }))?,
        OutputFormat::Pretty => format!(
            "Watching {} every {}s ({}, {} queued). Press Ctrl-C to stop.",
            ctx.client().base_url(),
            interval.as_secs(),
            if session.is_online() { "online" } else { "offline" },
            session.all().len()
        ),
    };
    writeln!(out, "{start}")?;

    let polls = watch_session(&mut session, interval, count, format, out)?;
    let queued = session.all().len();

    match format {
        OutputFormat::Json => to_json_line(&json!({
            "event": "stop",
            "probes": polls,
            "queued": queued,
        })),
        OutputFormat::Pretty => Ok(format!("Stopped after {polls} probes, {queued} still queued")),
    }
}

/// Poll `session` until `count` probes have been made.
///
/// Drains once up front if the backend is already reachable. Returns the
/// number of probes made.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn watch_session(
    session: &mut OfflineSession,
    interval: Duration,
    count: Option<u64>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<u64, CrewsyncError> {
    if session.is_online() && !session.all().is_empty() {
        let outcome = session.trigger_drain();
        write_drain(&outcome, format, out)?;
    }

    let mut polls = 0;
    while count.map_or(true, |max| polls < max) {
        thread::sleep(interval);
        polls += 1;

        let refresh = session.refresh();
        if let Some(transition) = refresh.transition {
            write_transition(transition, session.all().len(), format, out)?;
        }
        if let Some(outcome) = refresh.drain {
            write_drain(&outcome, format, out)?;
        }
    }

    Ok(polls)
}

fn write_transition(
    transition: Transition,
    queued: usize,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), CrewsyncError> {
    let line = match format {
        OutputFormat::Json => to_json_line(&json!({
            "event": "transition",
            "transition": transition,
            "queued": queued,
        }))?,
        OutputFormat::Pretty => format_transition_pretty(transition, queued),
    };
    writeln!(out, "{line}")?;
    Ok(())
}

fn write_drain(
    outcome: &DrainOutcome,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), CrewsyncError> {
    let text = match format {
        OutputFormat::Json => to_json_line(&json!({
            "event": "drain",
            "result": drain_value(outcome),
        }))?,
        OutputFormat::Pretty => format_drain_outcome(outcome),
    };
    writeln!(out, "{text}")?;
    Ok(())
}
