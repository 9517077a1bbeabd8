//! Harmony channel post-processor.
//!
//! Harmony-format models split a reply into named channels (`analysis`,
//! `commentary`, `final`, ...). Channels are recovered from token ids when a
//! [`TokenDecoder`] and token metadata are available, otherwise from markup
//! in the text itself: `<name>...</name>` tag pairs and
//! `<|channel|>name<|message|>...<|end|>` markers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use chatloop_types::error::FormatError;
use chatloop_types::format::{FINAL_CHANNEL, ProcessedResponse};

use super::FormatProcessor;

const REASONING_CHANNELS: [&str; 3] = ["reasoning", "analysis", "thinking"];
const TOOL_MARKERS: [&str; 3] = ["<tool_call>", "<function>", "tool_use"];
const MESSAGE_TERMINATORS: [&str; 3] = ["<|end|>", "<|return|>", "<|call|>"];

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+)>").expect("valid tag regex"));
static CHANNEL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|channel\|>(\w+)<\|message\|>").expect("valid channel marker regex")
});

/// One decoded message from a Harmony token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub channel: Option<String>,
    pub content: String,
}

/// Decodes completion token ids into Harmony channel messages.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, tokens: &[u32]) -> Result<Vec<ChannelMessage>, FormatError>;
}

/// Post-processor for Harmony-format responses.
pub struct HarmonyProcessor {
    show_detailed_thinking: bool,
    decoder: Option<Box<dyn TokenDecoder>>,
}

impl HarmonyProcessor {
    pub fn new(show_detailed_thinking: bool) -> Self {
        Self {
            show_detailed_thinking,
            decoder: None,
        }
    }

    /// Enable token-level channel recovery.
    pub fn with_decoder(mut self, decoder: Box<dyn TokenDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    fn decode_channels(&self, metadata: Option<&Value>) -> Option<BTreeMap<String, String>> {
        let decoder = self.decoder.as_ref()?;
        let tokens = extract_tokens(metadata?)?;
        debug!(count = tokens.len(), "Extracted completion tokens from metadata");

        match decoder.decode(&tokens) {
            Ok(messages) => Some(group_by_channel(messages)),
            Err(e) => {
                warn!(error = %e, "Failed to decode harmony tokens, falling back to markup parsing");
                None
            }
        }
    }
}

impl FormatProcessor for HarmonyProcessor {
    fn process(
        &self,
        raw: &str,
        metadata: Option<&Value>,
    ) -> Result<ProcessedResponse, FormatError> {
        let mut response = ProcessedResponse::plain(raw);

        match self.decode_channels(metadata) {
            Some(channels) if !channels.is_empty() => {
                if let Some(primary) = channels.get(FINAL_CHANNEL).or_else(|| channels.get("response")) {
                    response.text = primary.clone();
                }
                response.channels = channels;
            }
            Some(_) => debug!("No harmony channels found in decoded messages"),
            None => response.channels = extract_channels(raw),
        }

        response.has_reasoning = REASONING_CHANNELS
            .iter()
            .any(|name| response.channels.contains_key(*name));

        let lowered = raw.to_lowercase();
        response.has_tools = TOOL_MARKERS.iter().any(|marker| lowered.contains(marker));

        if response.has_reasoning {
            debug!("Harmony response contains reasoning");
        }
        if response.has_tools {
            debug!("Harmony response contains tool calls");
        }

        Ok(response)
    }

    fn format_for_display(&self, response: &ProcessedResponse) -> String {
        let final_text = final_text(response);

        if !self.show_detailed_thinking {
            return final_text.to_string();
        }

        let channels = &response.channels;
        let mut sections: Vec<(&str, &str)> = Vec::new();

        if let Some(reasoning) = ["reasoning", "thinking", "analysis"]
            .iter()
            .filter_map(|name| response.channel(name))
            .find(|content| !content.is_empty())
        {
            sections.push(("💭 [REASONING]", reasoning));
        }

        if channels.contains_key("reasoning") {
            if let Some(analysis) = response.channel("analysis") {
                sections.push(("📊 [ANALYSIS]", analysis));
            }
        }

        if let Some(commentary) = response.channel("commentary") {
            sections.push(("📝 [COMMENTARY]", commentary));
        }

        if response.has_tools {
            if let Some(tool_call) = response.channel("tool_call") {
                sections.push(("🔧 [TOOL CALL]", tool_call));
            }
        }

        let mut lines: Vec<&str> = Vec::new();
        for (label, content) in sections {
            lines.extend([label, content, ""]);
        }
        if !final_text.is_empty() {
            lines.extend(["💬 [RESPONSE]", final_text]);
        }

        lines.join("\n")
    }
}

/// The user-facing answer: a non-empty `final` channel, else the main text.
fn final_text(response: &ProcessedResponse) -> &str {
    match response.channel(FINAL_CHANNEL) {
        Some(content) if !content.trim().is_empty() => content,
        _ => &response.text,
    }
}

/// Recover completion token ids from provider metadata.
fn extract_tokens(metadata: &Value) -> Option<Vec<u32>> {
    if let Some(tokens) = metadata
        .pointer("/choices/0/logprobs/tokens")
        .and_then(token_ids)
    {
        return Some(tokens);
    }

    if let Some(content) = metadata
        .pointer("/choices/0/logprobs/content")
        .and_then(Value::as_array)
    {
        let ids: Vec<u32> = content
            .iter()
            .filter_map(|item| item.get("token_id").and_then(as_token))
            .collect();
        if !ids.is_empty() {
            return Some(ids);
        }
    }

    if let Some(tokens) = metadata.pointer("/logprobs/tokens").and_then(token_ids) {
        return Some(tokens);
    }

    token_ids(metadata)
}

/// A non-empty array made entirely of token ids.
fn token_ids(value: &Value) -> Option<Vec<u32>> {
    let items = value.as_array().filter(|items| !items.is_empty())?;
    items.iter().map(as_token).collect()
}

fn as_token(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|id| u32::try_from(id).ok())
}

fn group_by_channel(messages: Vec<ChannelMessage>) -> BTreeMap<String, String> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for message in messages {
        if message.content.trim().is_empty() {
            continue;
        }
        let channel = message
            .channel
            .map(|name| name.to_lowercase())
            .unwrap_or_else(|| "default".to_string());
        grouped.entry(channel).or_default().push(message.content);
    }

    grouped
        .into_iter()
        .map(|(channel, parts)| (channel, parts.join("\n")))
        .collect()
}

/// Extract channels from `<name>...</name>` pairs and Harmony channel markers.
///
/// Later occurrences of a channel replace earlier ones.
fn extract_channels(text: &str) -> BTreeMap<String, String> {
    let mut channels = BTreeMap::new();

    let mut pos = 0;
    while let Some(open) = OPEN_TAG.captures_at(text, pos) {
        let (Some(whole), Some(name)) = (open.get(0), open.get(1)) else {
            break;
        };
        let closing = format!("</{}>", name.as_str());
        match text[whole.end()..].find(&closing) {
            Some(offset) => {
                let content = &text[whole.end()..whole.end() + offset];
                channels.insert(name.as_str().to_lowercase(), content.trim().to_string());
                pos = whole.end() + offset + closing.len();
            }
            None => pos = whole.start() + 1,
        }
    }

    for marker in CHANNEL_MARKER.captures_iter(text) {
        let (Some(whole), Some(name)) = (marker.get(0), marker.get(1)) else {
            continue;
        };
        let rest = &text[whole.end()..];
        let end = MESSAGE_TERMINATORS
            .iter()
            .filter_map(|terminator| rest.find(terminator))
            .chain(rest.find("<|start|>"))
            .min()
            .unwrap_or(rest.len());
        channels.insert(name.as_str().to_lowercase(), rest[..end].trim().to_string());
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedDecoder(Vec<ChannelMessage>);

    impl TokenDecoder for FixedDecoder {
        fn decode(&self, _tokens: &[u32]) -> Result<Vec<ChannelMessage>, FormatError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDecoder;

    impl TokenDecoder for FailingDecoder {
        fn decode(&self, _tokens: &[u32]) -> Result<Vec<ChannelMessage>, FormatError> {
            Err(FormatError::Decode("bad tokens".into()))
        }
    }

    fn message(channel: Option<&str>, content: &str) -> ChannelMessage {
        ChannelMessage {
            channel: channel.map(str::to_string),
            content: content.to_string(),
        }
    }

    #[test]
    fn untagged_text_passes_through_unchanged() {
        let processor = HarmonyProcessor::new(false);
        let raw = "Hello, world! 2 < 3 and 5 > 4.";
        let processed = processor.process(raw, None).unwrap();
        assert_eq!(processed.text, raw);
        assert!(processed.channels.is_empty());
        assert_eq!(processor.format_for_display(&processed), raw);
    }

    #[test]
    fn tag_pairs_become_channels() {
        let processor = HarmonyProcessor::new(false);
        let raw = "<Analysis>  thinking hard  </Analysis><final>The answer is 4.</final>";
        let processed = processor.process(raw, None).unwrap();
        assert_eq!(processed.channel("analysis"), Some("thinking hard"));
        assert_eq!(processed.channel("final"), Some("The answer is 4."));
        assert!(processed.has_reasoning);
        assert_eq!(processor.format_for_display(&processed), "The answer is 4.");
    }

    #[test]
    fn unmatched_tags_are_ignored() {
        let channels = extract_channels("<open>never closed <final>done</final>");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels.get("final").map(String::as_str), Some("done"));
    }

    #[test]
    fn harmony_markers_become_channels() {
        let raw = "<|channel|>analysis<|message|>Check the math.<|end|><|start|>assistant<|channel|>final<|message|>It is 4.<|return|>";
        let channels = extract_channels(raw);
        assert_eq!(channels.get("analysis").map(String::as_str), Some("Check the math."));
        assert_eq!(channels.get("final").map(String::as_str), Some("It is 4."));
    }

    #[test]
    fn empty_final_channel_falls_back_to_raw_text() {
        let processor = HarmonyProcessor::new(false);
        let raw = "<final></final>visible text";
        let processed = processor.process(raw, None).unwrap();
        assert_eq!(processed.channel("final"), Some(""));
        assert_eq!(processor.format_for_display(&processed), raw);
    }

    #[test]
    fn tool_markers_detected() {
        let processor = HarmonyProcessor::new(false);
        assert!(processor.process("calling <TOOL_CALL>x</TOOL_CALL>", None).unwrap().has_tools);
        assert!(processor.process("used tool_use block", None).unwrap().has_tools);
        assert!(!processor.process("no tools here", None).unwrap().has_tools);
    }

    #[test]
    fn detailed_display_labels_sections() {
        let processor = HarmonyProcessor::new(true);
        let raw = "<reasoning>r</reasoning><analysis>a</analysis><commentary>c</commentary><tool_call>t</tool_call><final>f</final>";
        let processed = processor.process(raw, None).unwrap();
        let display = processor.format_for_display(&processed);
        assert_eq!(
            display,
            "💭 [REASONING]\nr\n\n📊 [ANALYSIS]\na\n\n📝 [COMMENTARY]\nc\n\n🔧 [TOOL CALL]\nt\n\n💬 [RESPONSE]\nf"
        );
    }

    #[test]
    fn detailed_display_analysis_only_counts_as_reasoning() {
        let processor = HarmonyProcessor::new(true);
        let processed = processor
            .process("<analysis>look</analysis><final>done</final>", None)
            .unwrap();
        assert_eq!(
            processor.format_for_display(&processed),
            "💭 [REASONING]\nlook\n\n💬 [RESPONSE]\ndone"
        );
    }

    #[test]
    fn decoded_tokens_take_priority_over_markup() {
        let decoder = FixedDecoder(vec![
            message(Some("Analysis"), "step one"),
            message(Some("analysis"), "step two"),
            message(Some("final"), "decoded answer"),
            message(None, "   "),
        ]);
        let processor = HarmonyProcessor::new(false).with_decoder(Box::new(decoder));
        let metadata = json!({"choices": [{"logprobs": {"tokens": [1, 2, 3]}}]});

        let processed = processor
            .process("<final>markup answer</final>", Some(&metadata))
            .unwrap();
        assert_eq!(processed.text, "decoded answer");
        assert_eq!(processed.channel("analysis"), Some("step one\nstep two"));
        assert!(!processed.channels.contains_key("default"));
        assert!(processed.has_reasoning);
    }

    #[test]
    fn decoder_failure_falls_back_to_markup() {
        let processor = HarmonyProcessor::new(false).with_decoder(Box::new(FailingDecoder));
        let processed = processor
            .process("<final>markup answer</final>", Some(&json!([5, 6, 7])))
            .unwrap();
        assert_eq!(processed.channel("final"), Some("markup answer"));
    }

    #[test]
    fn token_extraction_paths() {
        assert_eq!(
            extract_tokens(&json!({"choices": [{"logprobs": {"content": [{"token_id": 9}, {"token_id": 8}]}}]})),
            Some(vec![9, 8])
        );
        assert_eq!(extract_tokens(&json!({"logprobs": {"tokens": [4]}})), Some(vec![4]));
        assert_eq!(extract_tokens(&json!([1, 2])), Some(vec![1, 2]));
        assert_eq!(extract_tokens(&json!([])), None);
        assert_eq!(extract_tokens(&json!(["a"])), None);
        assert_eq!(extract_tokens(&json!({"text": "hi"})), None);
    }
}
