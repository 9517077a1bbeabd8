//! `chat-loop sessions`: list saved conversations.

use std::path::Path;

use console::style;

use chatloop_infra::config::load_chat_config;
use chatloop_infra::conversation::{ConversationStore, list_conversations};

use super::chat::summary::format_duration;

pub async fn list_sessions(config_path: &Path) -> anyhow::Result<()> {
    let config = load_chat_config(config_path).await;
    let store = ConversationStore::from_config(&config.conversations);
    let saved = list_conversations(store.dir()).await?;

    if saved.is_empty() {
        println!();
        println!(
            "  {} No saved conversations in {}",
            style("i").cyan().bold(),
            style(store.dir().display()).dim()
        );
        println!();
        return Ok(());
    }

    println!();
    for conversation in &saved {
        let session = &conversation.session;
        println!(
            "  {}  {}  {} queries {} {}",
            style(session.started_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")).dim(),
            style(&session.agent_name).cyan().bold(),
            session.query_count,
            style("\u{00b7}").dim(),
            format_duration(session.session_duration_secs),
        );
        println!(
            "  {}",
            style(conversation.path.with_extension("md").display()).dim()
        );
    }
    println!();
    println!("  {} conversation(s)", saved.len());
    println!();
    Ok(())
}
