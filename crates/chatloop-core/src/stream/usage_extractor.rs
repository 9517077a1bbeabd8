//! Usage extractor: opaque response to optional token usage and agent metrics.
//!
//! Providers put usage in different places and spell the fields differently.
//! Paths are tried in a fixed order and the first one yielding a non-zero
//! reading wins.

use serde_json::Value;

use chatloop_types::usage::{TokenUsage, UsageReport};

const CUMULATIVE_PATH: &str = "/result/metrics/accumulated_usage";
const PER_TURN_PATHS: [&str; 3] = ["/usage", "/metadata/usage", "/data/usage"];

const INPUT_FIELDS: [&str; 3] = ["input_tokens", "inputTokens", "prompt_tokens"];
const OUTPUT_FIELDS: [&str; 3] = ["output_tokens", "outputTokens", "completion_tokens"];

/// Extract a usage reading from the last event (or the single response) of a turn.
///
/// Returns `None` when no path yields a usable, non-zero reading. A path whose
/// counts can't be coerced to integers is skipped, not treated as zero.
pub fn extract_usage(response: &Value) -> Option<UsageReport> {
    if let Some(usage) = response.pointer(CUMULATIVE_PATH).and_then(read_usage) {
        return Some(UsageReport::Cumulative(usage));
    }

    PER_TURN_PATHS
        .iter()
        .find_map(|path| response.pointer(path).and_then(read_usage))
        .map(UsageReport::PerTurn)
}

/// Number of agent reasoning cycles, from `result.metrics.cycle_count`.
pub fn extract_cycle_count(response: &Value) -> Option<u64> {
    response
        .pointer("/result/metrics/cycle_count")
        .and_then(coerce_count)
}

/// Number of tool invocations, from `result.metrics.tool_metrics`.
///
/// An array counts its elements. An object sums its public fields: arrays by
/// length, objects by field count, other non-null values as one each.
/// Zero is reported as `None`.
pub fn extract_tool_count(response: &Value) -> Option<u64> {
    let count = match response.pointer("/result/metrics/tool_metrics")? {
        Value::Array(items) => items.len() as u64,
        Value::Object(fields) => fields
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(_, value)| match value {
                Value::Array(items) => items.len() as u64,
                Value::Object(inner) => inner.len() as u64,
                Value::Null => 0,
                _ => 1,
            })
            .sum(),
        _ => 0,
    };
    (count > 0).then_some(count)
}

fn read_usage(container: &Value) -> Option<TokenUsage> {
    let fields = container.as_object()?;
    let input = read_field(fields, &INPUT_FIELDS)?;
    let output = read_field(fields, &OUTPUT_FIELDS)?;
    let usage = TokenUsage::new(input, output);
    (!usage.is_zero()).then_some(usage)
}

/// Absent or null counts as zero; a present value that can't be coerced fails.
fn read_field(fields: &serde_json::Map<String, Value>, names: &[&str]) -> Option<u64> {
    match names
        .iter()
        .find_map(|name| fields.get(*name).filter(|value| !value.is_null()))
    {
        Some(value) => coerce_count(value),
        None => Some(0),
    }
}

/// Counts above `i64::MAX` are capped so session totals stay representable.
fn coerce_count(value: &Value) -> Option<u64> {
    let count = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    count.map(|n| n.min(i64::MAX as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn per_turn(input: u64, output: u64) -> Option<UsageReport> {
        Some(UsageReport::PerTurn(TokenUsage::new(input, output)))
    }

    #[test]
    fn cumulative_usage_from_agent_metrics() {
        let response = json!({
            "result": {"metrics": {"accumulated_usage": {"inputTokens": 100, "outputTokens": 40}}}
        });
        assert_eq!(
            extract_usage(&response),
            Some(UsageReport::Cumulative(TokenUsage::new(100, 40)))
        );
    }

    #[test]
    fn per_turn_paths_in_order() {
        assert_eq!(
            extract_usage(&json!({"usage": {"input_tokens": 10, "output_tokens": 5}})),
            per_turn(10, 5)
        );
        assert_eq!(
            extract_usage(&json!({"metadata": {"usage": {"prompt_tokens": 7, "completion_tokens": 3}}})),
            per_turn(7, 3)
        );
        assert_eq!(
            extract_usage(&json!({"data": {"usage": {"inputTokens": 1, "outputTokens": 2}}})),
            per_turn(1, 2)
        );
    }

    #[test]
    fn mixed_field_spellings() {
        let response = json!({"usage": {"prompt_tokens": 12, "outputTokens": 8}});
        assert_eq!(extract_usage(&response), per_turn(12, 8));
    }

    #[test]
    fn cumulative_beats_direct_usage() {
        let response = json!({
            "usage": {"input_tokens": 1, "output_tokens": 1},
            "result": {"metrics": {"accumulated_usage": {"inputTokens": 500, "outputTokens": 200}}}
        });
        assert!(extract_usage(&response).unwrap().is_cumulative());
    }

    #[test]
    fn zero_usage_is_absent() {
        assert_eq!(extract_usage(&json!({"usage": {"input_tokens": 0, "output_tokens": 0}})), None);
        assert_eq!(extract_usage(&json!({"usage": {"input_tokens": null, "output_tokens": null}})), None);
        assert_eq!(extract_usage(&json!({"usage": {}})), None);
    }

    #[test]
    fn zero_reading_falls_through_to_next_path() {
        let response = json!({
            "usage": {"input_tokens": 0, "output_tokens": 0},
            "metadata": {"usage": {"input_tokens": 4, "output_tokens": 2}}
        });
        assert_eq!(extract_usage(&response), per_turn(4, 2));
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(
            extract_usage(&json!({"usage": {"input_tokens": "100", "output_tokens": 50}})),
            per_turn(100, 50)
        );
        assert_eq!(
            extract_usage(&json!({"usage": {"input_tokens": 10.9, "output_tokens": 5.2}})),
            per_turn(10, 5)
        );
        assert_eq!(
            extract_usage(&json!({"usage": {"input_tokens": "invalid", "output_tokens": 5}})),
            None
        );
        assert_eq!(
            extract_usage(&json!({"usage": {"input_tokens": [], "output_tokens": 5}})),
            None
        );
    }

    #[test]
    fn missing_or_odd_containers() {
        assert_eq!(extract_usage(&json!("text")), None);
        assert_eq!(extract_usage(&Value::Null), None);
        assert_eq!(extract_usage(&json!({"usage": "lots"})), None);
    }

    #[test]
    fn cycle_count() {
        let response = json!({"result": {"metrics": {"cycle_count": 3}}});
        assert_eq!(extract_cycle_count(&response), Some(3));
        assert_eq!(extract_cycle_count(&json!({})), None);
    }

    #[test]
    fn tool_count_from_object_of_lists() {
        let response = json!({"result": {"metrics": {"tool_metrics": {
            "search": [1, 2, 3],
            "calculator": [1, 2],
            "weather": [1]
        }}}});
        assert_eq!(extract_tool_count(&response), Some(6));
    }

    #[test]
    fn tool_count_from_list_and_object_fields() {
        let list = json!({"result": {"metrics": {"tool_metrics": ["a", "b"]}}});
        assert_eq!(extract_tool_count(&list), Some(2));

        let fields = json!({"result": {"metrics": {"tool_metrics": {
            "tool_a": {"calls": 1},
            "tool_b": {"calls": 2},
            "_private": [1, 2, 3]
        }}}});
        assert_eq!(extract_tool_count(&fields), Some(2));
    }

    #[test]
    fn tool_count_empty_is_none() {
        assert_eq!(extract_tool_count(&json!({"result": {"metrics": {"tool_metrics": {}}}})), None);
        assert_eq!(extract_tool_count(&json!({"result": {"metrics": {"tool_metrics": null}}})), None);
        assert_eq!(extract_tool_count(&json!({})), None);
    }

    #[test]
    fn counts_beyond_signed_range_are_capped() {
        let response = json!({"usage": {"input_tokens": 9223372036854775808u64, "output_tokens": 0}});
        assert_eq!(extract_usage(&response), per_turn(i64::MAX as u64, 0));
    }
}
