//! CLI command definitions for the `chat-loop` binary.

pub mod chat;
pub mod sessions;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Interactive terminal chat for any conversational agent.
#[derive(Parser)]
#[command(name = "chat-loop", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed logging (-v info, -vv debug, -vvv trace). Logs go to the data directory.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Config file (default: {data_dir}/config.toml).
    #[arg(long, global = true, env = "CHAT_LOOP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat with an agent command.
    Chat(ChatArgs),

    /// List saved conversations.
    #[command(alias = "ls")]
    Sessions,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Display name for the agent (default: the command's file name).
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Always wait for the complete response instead of streaming.
    #[arg(long)]
    pub no_streaming: bool,

    /// Disable rich markdown rendering.
    #[arg(long)]
    pub no_rich: bool,

    /// Parse Harmony channel markup in responses.
    #[arg(long)]
    pub harmony: bool,

    /// With --harmony, show every channel instead of only the final answer.
    #[arg(long)]
    pub detailed_thinking: bool,

    /// Hide the thinking spinner.
    #[arg(long)]
    pub no_spinner: bool,

    /// Agent program and arguments, e.g. `-- python agent.py`.
    #[arg(required = true, trailing_var_arg = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl ChatArgs {
    /// `--name`, else the file name of the agent program.
    pub fn agent_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.command
            .first()
            .and_then(|program| {
                std::path::Path::new(program)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Agent".to_string())
    }
}
