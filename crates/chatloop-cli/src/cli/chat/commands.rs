//! Built-in command parsing for the chat loop.
//!
//! Commands may be written with a `/` or `#` prefix, or bare (`help`), and are
//! case-insensitive. A bare word only counts as a command when it is the whole
//! line, so ordinary messages are never swallowed.

use std::io::Write;

use console::style;

use super::copy::CopyTarget;
use super::multiline::MULTILINE_TRIGGER;

/// Available built-in commands.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Show session information.
    Info,
    /// Clear the terminal screen.
    Clear,
    /// Start a new session with the same agent.
    New,
    /// Save the conversation now.
    Save,
    /// Copy part of the session to the clipboard.
    Copy(CopyTarget),
    /// Enter multi-line input.
    Multiline,
    /// Exit the chat session.
    Exit,
    /// Unknown `/` command.
    Unknown(String),
}

fn lookup(line: &str) -> Option<ChatCommand> {
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim())),
        None => (line, None),
    };
    if name == "copy" {
        return CopyTarget::from_arg(arg).map(ChatCommand::Copy);
    }
    if arg.is_some_and(|a| !a.is_empty()) {
        return None;
    }
    match name {
        "help" | "h" | "?" => Some(ChatCommand::Help),
        "info" => Some(ChatCommand::Info),
        "clear" | "cls" => Some(ChatCommand::Clear),
        "new" | "reset" => Some(ChatCommand::New),
        "save" => Some(ChatCommand::Save),
        "exit" | "quit" | "bye" | "q" => Some(ChatCommand::Exit),
        _ => None,
    }
}

/// Parse user input as a built-in command.
///
/// Returns `None` if the input should go to the agent. Multi-line text is
/// never a command.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if trimmed.contains('\n') {
        return None;
    }
    if trimmed == MULTILINE_TRIGGER {
        return Some(ChatCommand::Multiline);
    }
    let lowered = trimmed.to_lowercase();

    if let Some(name) = lowered.strip_prefix('/') {
        return Some(lookup(name).unwrap_or_else(|| ChatCommand::Unknown(trimmed.to_string())));
    }
    if let Some(name) = lowered.strip_prefix('#') {
        return lookup(name);
    }
    match lowered.as_str() {
        // Single letters are too easy to send on purpose.
        "h" | "?" | "q" | "cls" => None,
        name => lookup(name),
    }
}

/// Print the help text listing all available commands.
pub fn print_help(out: &mut impl Write) {
    let rows = [
        ("help", "Show this help message"),
        ("info", "Show session details and token usage"),
        ("clear", "Clear the screen"),
        ("new", "Start a new session (new transcript file)"),
        ("save", "Save the conversation now"),
        ("copy", "Copy the last response to the clipboard"),
        ("copy query", "Copy the last query"),
        ("copy code", "Copy code blocks from the last response"),
        ("copy all", "Copy the whole conversation as markdown"),
        ("exit", "End the chat session (also quit, bye)"),
    ];

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", style("Available commands:").bold());
    let _ = writeln!(out);
    for (name, help) in rows {
        let _ = writeln!(out, "  {:<12} {}", style(format!("/{name}")).cyan(), help);
    }
    let _ = writeln!(out, "  {:<12} {}", style(MULTILINE_TRIGGER).cyan(), "Start multi-line input");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {}",
        style("Commands also work with # or no prefix. Ctrl+C cancels a response, Ctrl+D exits.").dim()
    );
    let _ = writeln!(out);
}
