//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: config resolution, agent and
//! pipeline construction, welcome banner, input loop with built-in commands,
//! per-turn cancellation and the exit summary.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use crossterm::style::Color;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatloop_core::chat::store::{BoxTranscriptStore, TranscriptStore};
use chatloop_core::format::FormatProcessor;
use chatloop_core::format::harmony::HarmonyProcessor;
use chatloop_core::render::{MarkdownRenderer, Palette, ResponseRenderer};
use chatloop_core::stream::orchestrator::{OrchestratorSettings, ResponseOrchestrator};
use chatloop_infra::agent::ProcessAgent;
use chatloop_infra::audio::AudioNotifier;
use chatloop_infra::config::load_chat_config;
use chatloop_infra::conversation::ConversationStore;
use chatloop_infra::pricing::estimate_cost;
use chatloop_types::config::ChatConfig;
use chatloop_types::turn::TurnOutcome;

use crate::cli::ChatArgs;

use super::banner::{BannerInfo, print_welcome_banner};
use super::commands::{self, ChatCommand};
use super::copy::{CopyTarget, SystemClipboard, select_text};
use super::input::{ChatInput, InputEvent};
use super::markdown::TermimadMarkdown;
use super::spinner::SpinnerDisplay;
use super::summary::print_session_summary;

/// Command-line flags win over the config file.
fn apply_cli_overrides(mut config: ChatConfig, args: &ChatArgs) -> ChatConfig {
    if args.no_rich {
        config.features.rich_enabled = false;
    }
    if args.harmony {
        config.harmony.enabled = true;
    }
    if args.detailed_thinking {
        config.harmony.show_detailed_thinking = true;
    }
    if args.no_spinner {
        config.features.show_thinking_indicator = false;
    }
    config
}

fn session_cost(config: &ChatConfig, orchestrator: &ResponseOrchestrator) -> Option<f64> {
    let session = orchestrator.session();
    config.pricing.model.as_deref().map(|model| {
        estimate_cost(
            session.total_input_tokens(),
            session.total_output_tokens(),
            model,
            &config.pricing.models,
        )
    })
}

fn copy_to_clipboard(
    out: &mut impl Write,
    clipboard: &mut SystemClipboard,
    orchestrator: &ResponseOrchestrator,
    target: CopyTarget,
) {
    let Some(text) = select_text(target, orchestrator.session()) else {
        let _ = writeln!(out, "\n  {}\n", style(format!("No {} to copy yet.", target.label())).dim());
        return;
    };
    match clipboard.set_text(&text) {
        Ok(()) => {
            let _ = writeln!(
                out,
                "\n  {} Copied {} to clipboard\n",
                style("✓").green().bold(),
                target.label()
            );
        }
        Err(e) => {
            warn!(error = %e, "Clipboard unavailable");
            let _ = writeln!(
                out,
                "\n  {}\n\n{text}\n",
                style(format!("Clipboard unavailable, {} follows:", target.label())).dim()
            );
        }
    }
}

/// Run one query, watching the keyboard so Ctrl+C cancels it.
///
/// Lines typed while the agent is busy are queued in `pending`. Returns
/// `true` when the user pressed Ctrl+D during the turn.
async fn run_turn(
    orchestrator: &mut ResponseOrchestrator,
    chat_input: &mut ChatInput,
    pending: &mut VecDeque<String>,
    query: &str,
) -> bool {
    let cancel = CancellationToken::new();
    let mut exit_requested = false;

    let turn = orchestrator.stream_response(query, &cancel);
    tokio::pin!(turn);

    let outcome = loop {
        tokio::select! {
            outcome = &mut turn => break outcome,
            event = chat_input.read_line(), if !cancel.is_cancelled() => match event {
                InputEvent::Interrupted => cancel.cancel(),
                InputEvent::Eof => {
                    exit_requested = true;
                    cancel.cancel();
                }
                InputEvent::Message(line) => {
                    if !line.is_empty() {
                        pending.push_back(line);
                    }
                }
            },
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => cancel.cancel(),
        }
    };

    match &outcome {
        TurnOutcome::Completed(result) => {
            debug!(duration = ?result.duration, usage = ?result.usage, "Turn completed");
        }
        TurnOutcome::Failed { error, .. } => debug!(error = %error, "Turn failed"),
        TurnOutcome::Cancelled { duration } => debug!(?duration, "Turn cancelled"),
    }
    exit_requested
}

/// Run the interactive chat loop for an agent command.
pub async fn run_chat_loop(config_path: &Path, args: ChatArgs) -> anyhow::Result<()> {
    let agent_name = args.agent_name();
    let config = apply_cli_overrides(
        load_chat_config(config_path).await.for_agent(&agent_name),
        &args,
    );

    let agent = ProcessAgent::new(agent_name.clone(), &args.command)
        .context("Invalid agent command")?
        .with_streaming(!args.no_streaming);
    info!(agent = %agent_name, program = agent.program(), "Starting chat loop");

    let prompt = format!("{} ", style("You:").green().bold());
    let (mut chat_input, mut writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let markdown: Option<Box<dyn MarkdownRenderer>> = if config.features.rich_enabled {
        Some(Box::new(TermimadMarkdown::new(Some(Color::Cyan))))
    } else {
        None
    };
    let processor: Option<Box<dyn FormatProcessor>> = if config.harmony.enabled {
        Some(Box::new(HarmonyProcessor::new(
            config.harmony.show_detailed_thinking,
        )))
    } else {
        None
    };
    let renderer = ResponseRenderer::new(markdown, Palette::default(), Box::new(writer.clone()));

    let store = ConversationStore::from_config(&config.conversations);
    let mut orchestrator = ResponseOrchestrator::new(Arc::new(agent), renderer, processor)
        .with_settings(OrchestratorSettings {
            show_duration: config.features.show_duration,
            show_tokens: config.features.show_tokens,
            ..OrchestratorSettings::default()
        });
    if config.features.show_thinking_indicator {
        orchestrator = orchestrator.with_indicator(Arc::new(SpinnerDisplay::new()));
    }
    if config.features.auto_save {
        orchestrator = orchestrator.with_store(BoxTranscriptStore::new(ConversationStore::new(store.dir())));
    }
    let audio = AudioNotifier::from_config(&config.audio);
    if audio.is_enabled() {
        orchestrator = orchestrator.with_notifier(Box::new(audio));
    }

    let save_dir = store.dir().display().to_string();
    print_welcome_banner(
        &mut writer,
        &BannerInfo {
            agent_name: &agent_name,
            session_id: orchestrator.session().session_id(),
            streaming: !args.no_streaming,
            rich: config.features.rich_enabled,
            harmony: config.harmony.enabled,
            auto_save_dir: config.features.auto_save.then_some(save_dir.as_str()),
        },
    );

    let mut pending: VecDeque<String> = VecDeque::new();
    let mut clipboard = SystemClipboard::default();

    loop {
        let event = match pending.pop_front() {
            Some(line) => InputEvent::Message(line),
            None => chat_input.read_line().await,
        };

        let text = match event {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                let _ = writeln!(writer, "\n  {}", style("Press Ctrl+D or type exit to quit.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        let query = match commands::parse(&text) {
            None => text,
            Some(ChatCommand::Multiline) => match chat_input.read_multiline(&mut writer).await {
                Some(block) => block,
                None => {
                    let _ = writeln!(writer, "  {}", style("Multi-line input cancelled.").dim());
                    continue;
                }
            },
            Some(ChatCommand::Help) => {
                commands::print_help(&mut writer);
                continue;
            }
            Some(ChatCommand::Info) => {
                let cost = session_cost(&config, &orchestrator);
                print_session_summary(&mut writer, &orchestrator.session().summary(), cost);
                continue;
            }
            Some(ChatCommand::Clear) => {
                chat_input.clear();
                continue;
            }
            Some(ChatCommand::New) => {
                orchestrator.session_mut().reset();
                info!(session_id = %orchestrator.session().session_id(), "New session started");
                let _ = writeln!(
                    writer,
                    "\n  {} New session: {}\n",
                    style("*").cyan().bold(),
                    style(orchestrator.session().session_id()).dim()
                );
                continue;
            }
            Some(ChatCommand::Save) => {
                if !orchestrator.session().has_transcript() {
                    let _ = writeln!(writer, "\n  {}\n", style("Nothing to save yet.").dim());
                    continue;
                }
                let saved = match orchestrator.save().await {
                    Some(result) => result,
                    None => store.persist(orchestrator.session()).await,
                };
                match saved {
                    Ok(path) => {
                        let _ = writeln!(
                            writer,
                            "\n  {} Saved to {}\n",
                            style("✓").green().bold(),
                            style(path.display()).dim()
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "Manual save failed");
                        let _ = writeln!(writer, "\n  {} Save failed: {e}\n", style("!").red().bold());
                    }
                }
                continue;
            }
            Some(ChatCommand::Copy(target)) => {
                copy_to_clipboard(&mut writer, &mut clipboard, &orchestrator, target);
                continue;
            }
            Some(ChatCommand::Exit) => break,
            Some(ChatCommand::Unknown(name)) => {
                let _ = writeln!(
                    writer,
                    "\n  {} Unknown command: {}. Type help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                );
                continue;
            }
        };

        if run_turn(&mut orchestrator, &mut chat_input, &mut pending, &query).await {
            break;
        }
        let _ = writeln!(writer);
    }

    let session = orchestrator.session();
    if session.query_count() > 0 {
        print_session_summary(&mut writer, &session.summary(), session_cost(&config, &orchestrator));
        if config.features.auto_save && session.has_transcript() {
            let _ = writeln!(
                writer,
                "  {} {}",
                style("Conversation saved to").dim(),
                store.markdown_path(session.session_id()).display()
            );
        }
    }
    let _ = writeln!(writer, "\n  {}", style("Goodbye!").dim());
    info!(queries = session.query_count(), "Chat loop ended");

    chat_input.flush();
    Ok(())
}
