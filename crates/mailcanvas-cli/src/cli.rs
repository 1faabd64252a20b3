use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[path = "cli_command_handlers.rs"]
mod cli_command_handlers;
#[path = "cli_config.rs"]
mod cli_config;

pub(crate) use cli_command_handlers::run_cli;
pub(crate) use cli_config::load_render_config;

#[derive(Parser, Debug)]
#[command(
    name = "mailcanvas",
    version,
    about = "Render email threads and reply drafts as terminal panels"
)]
pub(crate) struct Cli {
    /// Panel width in columns (overrides config and MAILCANVAS_PANEL_WIDTH)
    #[arg(short = 'w', long = "width", global = true)]
    pub(crate) width: Option<usize>,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Thread list panel from a JSON array of thread records
    Threads(ThreadsCmd),
    /// Detail panel for one thread bundle
    Thread(ThreadCmd),
    Draft(DraftCmd),
    /// Plain-text thread dump used as generation input
    Transcript(TranscriptCmd),
    /// Label update plan for a message record
    Labels(LabelsCmd),
}

#[derive(Args, Debug)]
pub(crate) struct ThreadsCmd {
    /// JSON file, or `-` / omitted for stdin
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ThreadCmd {
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    #[arg(long, conflicts_with = "draft_file")]
    pub(crate) draft: Option<String>,
    #[arg(long)]
    pub(crate) draft_file: Option<PathBuf>,
    #[arg(long, requires = "total")]
    pub(crate) index: Option<usize>,
    #[arg(long, requires = "index")]
    pub(crate) total: Option<usize>,
    #[arg(long, default_value_t = 0)]
    pub(crate) drafted: usize,
    #[arg(long, default_value_t = 0)]
    pub(crate) skipped: usize,
}

#[derive(Args, Debug)]
pub(crate) struct DraftCmd {
    #[command(subcommand)]
    pub(crate) command: DraftCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum DraftCommand {
    /// Normalise a generation response and write it atomically
    Save {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print a saved draft as canonical JSON
    Show {
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the draft-creation request body
    Payload {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "reply-to")]
        reply_to: String,
    },
    /// Print the generation conversation as JSON
    Turns {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        dictation: String,
        #[arg(long, requires = "feedback")]
        previous_draft: Option<PathBuf>,
        #[arg(long, requires = "previous_draft")]
        feedback: Option<String>,
    },
}

#[derive(Args, Debug)]
pub(crate) struct TranscriptCmd {
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LabelsCmd {
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    #[arg(long = "add")]
    pub(crate) add: Vec<String>,
    #[arg(long = "remove")]
    pub(crate) remove: Vec<String>,
}
