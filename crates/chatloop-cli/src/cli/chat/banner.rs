//! Welcome banner display for chat sessions.

use std::io::Write;

use console::style;

/// What the banner reports about the session.
pub struct BannerInfo<'a> {
    pub agent_name: &'a str,
    pub session_id: &'a str,
    pub streaming: bool,
    pub rich: bool,
    pub harmony: bool,
    pub auto_save_dir: Option<&'a str>,
}

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(out: &mut impl Write, info: &BannerInfo<'_>) {
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };

    let _ = writeln!(out);
    let _ = writeln!(out, "  {} {}", style("Chat with").dim(), style(info.agent_name).cyan().bold());
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}  {}", style("Session:").bold(), style(info.session_id).dim());
    let _ = writeln!(
        out,
        "  {}  streaming {} {} rich {} {} harmony {}",
        style("Output:").bold(),
        on_off(info.streaming),
        style("\u{00b7}").dim(),
        on_off(info.rich),
        style("\u{00b7}").dim(),
        on_off(info.harmony),
    );
    if let Some(dir) = info.auto_save_dir {
        let _ = writeln!(out, "  {}  {}", style("Saving:").bold(), style(dir).dim());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", style("Type help for commands, Ctrl+D to exit").dim());
    let _ = writeln!(out, "  {}", style("---").dim());
    let _ = writeln!(out);
}
