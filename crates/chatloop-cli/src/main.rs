//! Agent chat loop entry point.
//!
//! Binary name: `chat-loop`
//!
//! Parses CLI arguments, sets up logging under the data directory, then
//! dispatches to the chat loop or a utility command.

mod cli;

use clap::Parser;
use clap_complete::generate;

use chatloop_infra::config::default_config_path;
use chatloop_infra::paths::resolve_data_dir;
use chatloop_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need nothing else
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chat-loop", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let tracing_options = TracingOptions {
        filter: filter_for_verbosity(cli.verbose).to_string(),
        log_file: Some(data_dir.join("logs").join("chat-loop.log")),
        enable_otel: cli.otel,
    };
    if let Err(e) = init_tracing(&tracing_options) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&data_dir));

    let result = match cli.command {
        Commands::Chat(args) => cli::chat::loop_runner::run_chat_loop(&config_path, args).await,
        Commands::Sessions => cli::sessions::list_sessions(&config_path).await,
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}
