//! Cost estimation for the session summary.
//!
//! Rates come from `[[pricing.models]]` in `config.toml` first, then a small
//! built-in table of model families, then a conservative fallback. Estimates
//! are always shown as approximate (`~$0.12`).

use chatloop_types::config::ModelPricing;

/// USD per million tokens, as `(input, output)`.
type Rates = (f64, f64);

const FALLBACK_RATES: Rates = (5.0, 15.0);

/// Built-in rates by model family. More specific patterns come first.
const DEFAULT_RATES: &[(&str, Rates)] = &[
    ("claude-sonnet", (3.0, 15.0)),
    ("claude-opus", (15.0, 75.0)),
    ("claude-haiku", (0.25, 1.25)),
    ("gpt-4o-mini", (0.15, 0.60)),
    ("gpt-4o", (2.50, 10.0)),
    ("gemini-2", (1.25, 5.0)),
    ("mistral-large", (2.0, 6.0)),
];

/// Lowercase and join words with `-` so `"Claude Sonnet 4.5"` and
/// `"claude_sonnet-4-5"` compare equal.
fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' || c == '.' { '-' } else { c })
        .collect()
}

fn rates_for(model: &str, user_pricing: &[ModelPricing]) -> Rates {
    let model = normalize(model);
    let matches = |pattern: &str| model.contains(&normalize(pattern));

    user_pricing
        .iter()
        .find(|p| matches(p.model_pattern.as_str()))
        .map(|p| (p.input_cost_per_million, p.output_cost_per_million))
        .or_else(|| {
            DEFAULT_RATES
                .iter()
                .find(|&&(pattern, _)| matches(pattern))
                .map(|&(_, rates)| rates)
        })
        .unwrap_or(FALLBACK_RATES)
}

/// Estimate the cost of a session in USD.
///
/// Negative totals (from counters that went backwards) count as zero.
pub fn estimate_cost(
    input_tokens: i64,
    output_tokens: i64,
    model: &str,
    user_pricing: &[ModelPricing],
) -> f64 {
    let (input_rate, output_rate) = rates_for(model, user_pricing);
    let per_million = |tokens: i64| tokens.max(0) as f64 / 1_000_000.0;
    per_million(input_tokens) * input_rate + per_million(output_tokens) * output_rate
}

/// Format a cost estimate, always prefixed with `~`.
///
/// Sub-cent amounts keep three decimals (`~$0.001`), the rest two (`~$0.12`).
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("~${cost:.3}")
    } else {
        format!("~${cost:.2}")
    }
}
