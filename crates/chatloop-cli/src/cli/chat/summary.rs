//! Session summary shown by `info` and on exit.

use std::io::Write;

use console::style;

use chatloop_core::render::tokens::format_tokens;
use chatloop_infra::pricing::format_cost;
use chatloop_types::session::SessionSummary;

/// `1h 02m 03s`, `4m 05s` or `12.3s`.
pub fn format_duration(secs: f64) -> String {
    let whole = secs as u64;
    let (hours, minutes, seconds) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{secs:.1}s")
    }
}

/// Label/value rows for the summary.
pub fn summary_rows(summary: &SessionSummary, cost: Option<f64>) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Session", summary.session_id.clone()),
        ("Queries", summary.query_count.to_string()),
        ("Duration", format_duration(summary.session_duration_secs)),
    ];
    if summary.total_tokens() > 0 {
        rows.push((
            "Tokens",
            format!(
                "{} (in: {}, out: {})",
                format_tokens(summary.total_tokens()),
                format_tokens(summary.total_input_tokens),
                format_tokens(summary.total_output_tokens)
            ),
        ));
        if let Some(cost) = cost {
            rows.push(("Cost", format_cost(cost)));
        }
    }
    rows
}

pub fn print_session_summary(out: &mut impl Write, summary: &SessionSummary, cost: Option<f64>) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", style("Session summary").bold());
    for (label, value) in summary_rows(summary, cost) {
        let _ = writeln!(out, "  {:<10} {}", style(format!("{label}:")).dim(), value);
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(input: i64, output: i64) -> SessionSummary {
        SessionSummary {
            session_id: "sally_20260101_120000".to_string(),
            agent_name: "Sally".to_string(),
            started_at: Utc::now(),
            query_count: 4,
            conversation_entries: 4,
            has_last_query: true,
            has_last_response: true,
            total_input_tokens: input,
            total_output_tokens: output,
            session_duration_secs: 125.0,
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(245.0), "4m 05s");
        assert_eq!(format_duration(3723.0), "1h 02m 03s");
    }

    #[test]
    fn rows_include_tokens_and_cost() {
        let rows = summary_rows(&summary(1_500, 500), Some(0.012));
        assert_eq!(rows[1], ("Queries", "4".to_string()));
        assert_eq!(rows[2], ("Duration", "2m 05s".to_string()));
        assert_eq!(rows[3], ("Tokens", "2.0K (in: 1.5K, out: 500)".to_string()));
        assert_eq!(rows[4], ("Cost", "~$0.01".to_string()));
    }

    #[test]
    fn rows_skip_tokens_when_none_reported() {
        let rows = summary_rows(&summary(0, 0), Some(1.0));
        assert_eq!(rows.len(), 3);
    }
}
