//! Terminal markdown rendering with syntax-highlighted code blocks.
//!
//! The response is split on code fences first. Prose segments go through
//! `termimad` as whole blocks (so tables and lists keep their layout), fenced
//! segments through `syntect`.

use crossterm::style::Color;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;
use termimad::crossterm::style::Color as SkinColor;

use chatloop_core::render::MarkdownRenderer;

const CODE_THEME: &str = "base16-ocean.dark";
const FENCE: &str = "```";

#[derive(Debug, PartialEq)]
pub(crate) enum Segment<'a> {
    Prose(String),
    Code { lang: &'a str, body: String },
}

/// Split markdown into prose and fenced code. An unclosed fence runs to the end.
pub(crate) fn split_fences(markdown: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut prose = String::new();
    let mut code: Option<(&str, String)> = None;

    for line in markdown.lines() {
        if let Some(info) = line.trim_start().strip_prefix(FENCE) {
            match code.take() {
                Some((lang, body)) => segments.push(Segment::Code { lang, body }),
                None => {
                    if !prose.is_empty() {
                        segments.push(Segment::Prose(std::mem::take(&mut prose)));
                    }
                    code = Some((info.trim_matches('`').trim(), String::new()));
                }
            }
        } else if let Some((_, body)) = code.as_mut() {
            body.push_str(line);
            body.push('\n');
        } else {
            prose.push_str(line);
            prose.push('\n');
        }
    }

    match code {
        Some((lang, body)) if !body.is_empty() => segments.push(Segment::Code { lang, body }),
        _ => {}
    }
    if !prose.is_empty() {
        segments.push(Segment::Prose(prose));
    }
    segments
}

/// termimad pins its own crossterm, so accent colors are converted by hand.
fn skin_color(color: Color) -> SkinColor {
    match color {
        Color::Green => SkinColor::Green,
        Color::Yellow => SkinColor::Yellow,
        Color::Magenta => SkinColor::Magenta,
        Color::Blue => SkinColor::Blue,
        Color::Red => SkinColor::Red,
        Color::White => SkinColor::White,
        Color::Rgb { r, g, b } => SkinColor::Rgb { r, g, b },
        Color::AnsiValue(v) => SkinColor::AnsiValue(v),
        _ => SkinColor::Cyan,
    }
}

pub struct TermimadMarkdown {
    skin: MadSkin,
    syntaxes: SyntaxSet,
    theme: Option<Theme>,
}

impl TermimadMarkdown {
    /// Create a renderer. `accent` colors headers and bold text.
    pub fn new(accent: Option<Color>) -> Self {
        let mut skin = MadSkin::default_dark();
        if let Some(color) = accent.map(skin_color) {
            skin.bold.set_fg(color);
            for header in skin.headers.iter_mut().take(2) {
                header.set_fg(color);
            }
        }
        skin.inline_code.set_fg(SkinColor::Yellow);

        let theme = ThemeSet::load_defaults().themes.remove(CODE_THEME);
        Self {
            skin,
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    fn render_code(&self, lang: &str, body: &str, out: &mut String) {
        let label = if lang.is_empty() { "code" } else { lang };
        out.push_str(&format!("  {}\n", console::style(format!("--- {label} ---")).dim()));

        let Some(theme) = &self.theme else {
            for line in body.lines() {
                out.push_str(&format!("  {line}\n"));
            }
            return;
        };

        let syntax = self
            .syntaxes
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, theme);
        for line in body.lines() {
            let ranges = highlighter.highlight_line(line, &self.syntaxes).unwrap_or_default();
            out.push_str(&format!("  {}\x1b[0m\n", as_24_bit_terminal_escaped(&ranges, false)));
        }
    }
}

impl MarkdownRenderer for TermimadMarkdown {
    fn render(&self, markdown: &str) -> String {
        let mut out = String::new();
        for segment in split_fences(markdown) {
            match segment {
                Segment::Prose(text) => out.push_str(&self.skin.term_text(&text).to_string()),
                Segment::Code { lang, body } => {
                    self.render_code(lang, &body, &mut out);
                    out.push('\n');
                }
            }
        }
        out
    }
}
