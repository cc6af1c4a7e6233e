//! Manual sync command implementation.

use crate::cli::args::OutputFormat;
use crate::cli::context::Context;
use crate::error::CrewsyncError;
use crate::output::format_drain;

/// Replay the queue now.
///
/// Failed deliveries are reported in the output, not as an error: they stay
/// queued for the next attempt.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn sync(ctx: &Context, format: OutputFormat) -> Result<String, CrewsyncError> {
    let mut session = ctx.session();
    let outcome = session.trigger_drain();
    format_drain(&outcome, format)
}
