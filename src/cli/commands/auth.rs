//! Auth command implementation.

use colored::Colorize;
use serde_json::json;

use crate::api::{TokenStore, TOKEN_ENV};
use crate::cli::args::{AuthCommands, OutputFormat};
use crate::cli::context::Context;
use crate::error::CrewsyncError;
use crate::output::to_json;

/// Execute auth subcommands.
///
/// # Errors
///
/// Returns an error if login fails or the token cannot be stored.
pub fn auth(ctx: &Context, cmd: AuthCommands, format: OutputFormat) -> Result<String, CrewsyncError> {
    match cmd {
        AuthCommands::Login { email, password } => {
            ctx.client().login(&email, &password)?;
            match format {
                OutputFormat::Json => to_json(&json!({ "logged_in": true, "email": email })),
                OutputFormat::Pretty => Ok(format!("{} Logged in as {email}", "✓".green())),
            }
        }
        AuthCommands::Logout => {
            let tokens = ctx.client().tokens();
            tokens.clear()?;
            match format {
                OutputFormat::Json => to_json(&json!({ "logged_in": tokens.is_overridden() })),
                OutputFormat::Pretty if tokens.is_overridden() => Ok(format!(
                    "Stored token removed; {TOKEN_ENV} is still set"
                )),
                OutputFormat::Pretty => Ok("Logged out".to_string()),
            }
        }
        AuthCommands::Status => status(ctx.client().tokens(), format),
    }
}

fn status(tokens: &TokenStore, format: OutputFormat) -> Result<String, CrewsyncError> {
    let logged_in = tokens.token().is_some();
    let source = if tokens.is_overridden() {
        "environment"
    } else {
        "stored"
    };

    match format {
        OutputFormat::Json => to_json(&json!({
            "logged_in": logged_in,
            "source": logged_in.then_some(source),
        })),
        OutputFormat::Pretty if logged_in => {
            Ok(format!("{} Logged in ({source} token)", "●".green()))
        }
        OutputFormat::Pretty => Ok(format!(
            "{} Not logged in. Run 'crewsync auth login' or set {TOKEN_ENV}.",
            "●".red()
        )),
    }
}
