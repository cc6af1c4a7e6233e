//! Command implementations for crewsync.
//!
//! Each command returns the text to print; `main` prints it.

mod auth;
mod queue;
mod submit;
mod sync;
mod watch;

pub use auth::auth;
pub use queue::queue;
pub use submit::{build_payload, submit};
pub use sync::sync;
pub use watch::{watch, watch_session};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;
use crate::error::CrewsyncError;

/// Generate a completion script for `shell`.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn completions(shell: Shell) -> Result<String, CrewsyncError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "crewsync", &mut buf);
    String::from_utf8(buf).map_err(|e| CrewsyncError::Config(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_mention_subcommands() {
        let script = completions(Shell::Bash).unwrap();
        assert!(script.contains("crewsync"));
        assert!(script.contains("submit"));
        assert!(script.contains("watch"));
    }
}
