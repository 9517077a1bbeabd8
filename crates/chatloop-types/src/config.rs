//! Chat loop configuration types.
//!
//! `ChatConfig` represents `config.toml` in the data directory. Every field has
//! a default, and `[agents."<name>"]` sections override individual values for
//! one agent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the chat loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub harmony: HarmonyConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub conversations: ConversationConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    /// Per-agent overrides keyed by agent display name.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentOverrides>,
}

/// Display and persistence toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_true")]
    pub show_thinking_indicator: bool,
    #[serde(default = "default_true")]
    pub show_duration: bool,
    #[serde(default = "default_true")]
    pub show_tokens: bool,
    /// Render final responses as rich markdown (forces buffering).
    #[serde(default = "default_true")]
    pub rich_enabled: bool,
    /// Save the conversation after every completed turn.
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            show_thinking_indicator: true,
            show_duration: true,
            show_tokens: true,
            rich_enabled: true,
            auto_save: true,
        }
    }
}

/// Harmony channel post-processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonyConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Show every channel with labels instead of only the final answer.
    #[serde(default)]
    pub show_detailed_thinking: bool,
}

/// Completion sound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Sound file to play; `~` and `$VAR` are expanded by the loader.
    #[serde(default)]
    pub sound_file: Option<String>,
}

/// Where conversation transcripts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_conversation_dir")]
    pub directory: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            directory: default_conversation_dir(),
        }
    }
}

/// Cost estimation for the exit summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Model display name, e.g. `"Claude Sonnet 4.5"`. No cost is shown when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// User pricing entries checked before the built-in table.
    #[serde(default)]
    pub models: Vec<ModelPricing>,
}

/// USD per million tokens for models whose name contains `model_pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model_pattern: String,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}

/// Field-by-field overrides for one agent. Unset fields inherit the global value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOverrides {
    #[serde(default)]
    pub features: FeatureOverrides,
    #[serde(default)]
    pub harmony: HarmonyOverrides,
    #[serde(default)]
    pub audio: AudioOverrides,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOverrides {
    pub show_thinking_indicator: Option<bool>,
    pub show_duration: Option<bool>,
    pub show_tokens: Option<bool>,
    pub rich_enabled: Option<bool>,
    pub auto_save: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonyOverrides {
    pub enabled: Option<bool>,
    pub show_detailed_thinking: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioOverrides {
    pub enabled: Option<bool>,
    pub sound_file: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_conversation_dir() -> String {
    "~/agent-conversations".to_string()
}

impl ChatConfig {
    /// Resolve the effective configuration for `agent_name`.
    ///
    /// The returned config has the agent's overrides folded in and an empty
    /// `agents` table.
    pub fn for_agent(&self, agent_name: &str) -> ChatConfig {
        let mut resolved = ChatConfig {
            features: self.features.clone(),
            harmony: self.harmony.clone(),
            audio: self.audio.clone(),
            conversations: self.conversations.clone(),
            pricing: self.pricing.clone(),
            agents: BTreeMap::new(),
        };

        let Some(overrides) = self.agents.get(agent_name) else {
            return resolved;
        };

        let f = &overrides.features;
        let features = &mut resolved.features;
        apply(&mut features.show_thinking_indicator, f.show_thinking_indicator);
        apply(&mut features.show_duration, f.show_duration);
        apply(&mut features.show_tokens, f.show_tokens);
        apply(&mut features.rich_enabled, f.rich_enabled);
        apply(&mut features.auto_save, f.auto_save);

        apply(&mut resolved.harmony.enabled, overrides.harmony.enabled);
        apply(
            &mut resolved.harmony.show_detailed_thinking,
            overrides.harmony.show_detailed_thinking,
        );

        apply(&mut resolved.audio.enabled, overrides.audio.enabled);
        if let Some(sound) = &overrides.audio.sound_file {
            resolved.audio.sound_file = Some(sound.clone());
        }
        if let Some(model) = &overrides.model {
            resolved.pricing.model = Some(model.clone());
        }

        resolved
    }
}

fn apply(target: &mut bool, value: Option<bool>) {
    if let Some(value) = value {
        *target = value;
    }
}
