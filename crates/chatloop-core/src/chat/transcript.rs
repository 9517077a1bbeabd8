//! Markdown transcript entries, one per completed query.

use std::time::Duration;

use chrono::{DateTime, Local};

use chatloop_types::usage::UsageDelta;

use crate::render::tokens::format_thousands;

/// A completed query/response pair with its metadata.
#[derive(Debug, Clone)]
pub struct TranscriptEntry<'a> {
    pub number: u32,
    pub timestamp: DateTime<Local>,
    pub agent_name: &'a str,
    pub query: &'a str,
    pub response: &'a str,
    pub duration: Duration,
    pub usage: Option<UsageDelta>,
}

impl TranscriptEntry<'_> {
    pub fn to_markdown(&self) -> String {
        let mut metadata = vec![format!("Time: {:.1}s", self.duration.as_secs_f64())];
        if let Some(usage) = self.usage.filter(|usage| usage.total() > 0) {
            metadata.push(format!(
                "Tokens: {} (in: {}, out: {})",
                format_thousands(usage.total()),
                format_thousands(usage.input_tokens),
                format_thousands(usage.output_tokens)
            ));
        }

        format!(
            "\n## Query {} ({})\n**You:** {}\n\n**{}:** {}\n\n*{}*\n\n---\n",
            self.number,
            self.timestamp.format("%H:%M:%S"),
            self.query,
            self.agent_name,
            self.response,
            metadata.join(" | ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(usage: Option<UsageDelta>) -> String {
        TranscriptEntry {
            number: 3,
            timestamp: Local.with_ymd_and_hms(2026, 1, 2, 9, 8, 7).unwrap(),
            agent_name: "Sally",
            query: "What is 2+2?",
            response: "4",
            duration: Duration::from_millis(2340),
            usage,
        }
        .to_markdown()
    }

    #[test]
    fn entry_with_tokens() {
        assert_eq!(
            entry(Some(UsageDelta::new(1_200, 34))),
            "\n## Query 3 (09:08:07)\n**You:** What is 2+2?\n\n**Sally:** 4\n\n*Time: 2.3s | Tokens: 1,234 (in: 1,200, out: 34)*\n\n---\n"
        );
    }

    #[test]
    fn entry_without_tokens() {
        let markdown = entry(None);
        assert!(markdown.contains("*Time: 2.3s*"));
        assert!(!markdown.contains("Tokens"));
    }

    #[test]
    fn zero_or_negative_usage_is_omitted() {
        assert!(!entry(Some(UsageDelta::new(0, 0))).contains("Tokens"));
        assert!(!entry(Some(UsageDelta::new(-50, -25))).contains("Tokens"));
    }
}
