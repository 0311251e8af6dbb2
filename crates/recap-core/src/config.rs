use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Budget constants, sized for a 16k context model
pub const MIN_MESSAGES: usize = 32;
pub const CONTEXT_WINDOW_TOKENS: usize = 16384;
pub const COMPLETION_RESERVE_TOKENS: usize = 512;
pub const WORKING_BUDGET_TOKENS: usize = CONTEXT_WINDOW_TOKENS - COMPLETION_RESERVE_TOKENS;
pub const TIER_CROSSOVER_TOKENS: usize = 4096;
pub const CHUNK_MAX_CHARS: usize = 4096; // embed description limit
pub const REPLY_QUOTE_CHARS: usize = 32;

pub const DEFAULT_SCAN_LIMIT: usize = 1024;
pub const DEFAULT_PREFIX: &str =
    "The following is a chat log. Everything prefixed with `>` is a quote.";
pub const DEFAULT_SUMMARY_SUFFIX: &str = "Messages carry a {message:<index>} tag. When a point \
comes from a specific message, cite it with that exact tag.\n\
The following is a short summary of the above chat log:";
pub const DEFAULT_MENTION_SUFFIX: &str = "{author} asked: \"{question}\"\n\
Using the chat log above as context, cite relevant messages with their {message:<index>} tag.\n\
Reply:";

/// Top-level config (recap.toml + RECAP_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecapConfig {
    pub discord: Option<DiscordConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// Channels where `/summarize_chat` may run. Empty means every channel.
    #[serde(default)]
    pub summary_channels: Vec<u64>,
    /// React to the triggering message with progress emoji.
    #[serde(default = "bool_true")]
    pub ack_reactions: bool,
    /// Answer messages that @mention the bot.
    #[serde(default = "bool_true")]
    pub mention_replies: bool,
}

impl DiscordConfig {
    pub fn summary_allowed(&self, channel_id: u64) -> bool {
        self.summary_channels.is_empty() || self.summary_channels.contains(&channel_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    pub openai: Option<OpenAiProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: COMPLETION_RESERVE_TOKENS as u32,
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 1.0,
        }
    }
}

/// Transcript extraction, prompt and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,
    #[serde(default = "default_summary_cooldown")]
    pub summary_cooldown_secs: u64,
    #[serde(default = "default_mention_cooldown")]
    pub mention_cooldown_secs: u64,
    /// How far back a mention reply looks for context.
    #[serde(default = "default_mention_lookback")]
    pub mention_lookback_secs: u64,
    /// Offset applied to timestamps in the rendered chat log.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_standard_model")]
    pub standard_model: String,
    #[serde(default = "default_extended_model")]
    pub extended_model: String,
    /// USD per 1000 total tokens, shown in the summary footer.
    #[serde(default = "default_cost_per_1k")]
    pub cost_per_1k_tokens: f64,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_summary_suffix")]
    pub summary_suffix: String,
    /// `{author}` and `{question}` are substituted at request time.
    #[serde(default = "default_mention_suffix")]
    pub mention_suffix: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            scan_limit: default_scan_limit(),
            summary_cooldown_secs: default_summary_cooldown(),
            mention_cooldown_secs: default_mention_cooldown(),
            mention_lookback_secs: default_mention_lookback(),
            utc_offset_minutes: 0,
            standard_model: default_standard_model(),
            extended_model: default_extended_model(),
            cost_per_1k_tokens: default_cost_per_1k(),
            generation: GenerationParams::default(),
            prefix: default_prefix(),
            summary_suffix: default_summary_suffix(),
            mention_suffix: default_mention_suffix(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_scan_limit() -> usize {
    DEFAULT_SCAN_LIMIT
}
fn default_summary_cooldown() -> u64 {
    15 * 60
}
fn default_mention_cooldown() -> u64 {
    60
}
fn default_mention_lookback() -> u64 {
    24 * 60 * 60
}
fn default_standard_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_extended_model() -> String {
    "gpt-3.5-turbo-16k".to_string()
}
fn default_cost_per_1k() -> f64 {
    0.003
}
fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_summary_suffix() -> String {
    DEFAULT_SUMMARY_SUFFIX.to_string()
}
fn default_mention_suffix() -> String {
    DEFAULT_MENTION_SUFFIX.to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.recap/recap.db", home)
}

impl RecapConfig {
    /// Load config from a TOML file with RECAP_* env var overrides.
    ///
    /// Uses the explicit path when given, otherwise ~/.recap/recap.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::RecapError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RECAP_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.recap/recap.toml", home)
}
