use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "crewsync")]
#[command(about = "Offline submission queue for F&B crew training")]
#[command(long_about = "crewsync - offline submission queue for F&B crew training

Quiz results, procedure completions and assistant questions are sent to the
training backend when it is reachable and queued on this device when it is
not. Queued submissions are replayed in order once the backend is back.

QUICK START:
  crewsync submit quiz --quiz-id 12 --score 85 --passed
  crewsync queue status        Show queued submissions and connectivity
  crewsync sync                Send queued submissions now
  crewsync watch               Replay automatically when the backend returns

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  crewsync <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Treat the backend as unreachable without probing it
    #[arg(long, global = true)]
    pub offline: bool,

    /// Increase log verbosity (-v info, -vv debug)
    ///
    /// `CREWSYNC_LOG` takes precedence when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a quiz result, procedure completion or assistant question
    ///
    /// Delivers immediately when the backend is reachable and queues the
    /// submission otherwise. Older queued submissions are always sent first.
    ///
    /// # Examples
    ///
    ///   crewsync submit quiz --quiz-id 12 --score 85 --passed
    ///   crewsync submit procedure --procedure-id 4 --step 1 --step 2
    ///   crewsync submit chat "How long do I hold the fryer basket?"
    ///   crewsync submit chat "..." --defer     Queue without trying
    #[command(alias = "s")]
    Submit(SubmitArgs),

    /// Inspect or clear the offline queue
    ///
    /// # Subcommands
    ///
    ///   list     Show queued submissions, oldest first
    ///   status   Count, connectivity and oldest entry
    ///   clear    Discard every queued submission
    #[command(alias = "q")]
    Queue(QueueArgs),

    /// Send queued submissions now
    ///
    /// Replays the queue oldest first. By default the pass stops at the first
    /// failure so later submissions never overtake it.
    Sync {
        /// Keep going after a failed delivery
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Watch connectivity and replay the queue whenever the backend returns
    ///
    /// Probes the backend on an interval and prints every change between
    /// reachable and unreachable.
    Watch {
        /// Seconds between probes (defaults to `connectivity.poll_interval_secs`)
        #[arg(long, short)]
        interval: Option<u64>,

        /// Stop after this many probes
        #[arg(long, short = 'n')]
        count: Option<u64>,
    },

    /// Log in to the training backend or manage the stored token
    Auth(AuthArgs),

    /// Generate a shell completion script
    ///
    /// # Examples
    ///
    ///   crewsync completions bash > ~/.local/share/bash-completion/completions/crewsync
    ///   crewsync completions zsh > ~/.zsh/completions/_crewsync
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Queue the submission without trying to deliver it
    #[arg(long, global = true)]
    pub defer: bool,

    #[command(subcommand)]
    pub command: SubmitCommands,
}

#[derive(Subcommand)]
pub enum SubmitCommands {
    /// Submit a finished quiz attempt
    Quiz {
        /// Quiz ID
        #[arg(long)]
        quiz_id: String,

        /// Score in percent
        #[arg(long)]
        score: u32,

        /// Whether the attempt passed
        #[arg(long)]
        passed: bool,

        /// Answers as a JSON object keyed by question ID
        #[arg(long)]
        answers: Option<String>,
    },

    /// Submit a completed procedure
    Procedure {
        /// Procedure ID
        #[arg(long)]
        procedure_id: String,

        /// Completed step number (repeatable)
        #[arg(long = "step")]
        steps: Vec<u32>,
    },

    /// Ask the training assistant a question
    Chat {
        /// The question
        text: String,

        /// Answer language (defaults to `api.language`)
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List queued submissions, oldest first
    #[command(alias = "ls")]
    List {
        /// Show at most this many entries
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show queue size, connectivity and the oldest entry
    Status,

    /// Discard every queued submission
    Clear {
        /// Required: queued submissions cannot be recovered
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and store the token
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "CREWSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored token
    Logout,

    /// Show whether a token is available
    Status,
}
