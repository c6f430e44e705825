use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Whole-bot configuration, loaded once at startup from a JSON file.
/// Secrets (gateway token, completion API key) come from the environment,
/// never from this file.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// The single guild this bot operates in.
    pub guild_id: u64,

    /// Channel receiving birthday announcements.
    pub general_channel_id: u64,

    /// Name of the channels receiving menu announcements.
    #[serde(default = "default_menu_channel_name")]
    pub menu_channel_name: String,

    /// Page scraped for menu / allergen images.
    pub menu_page_url: String,

    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Flat JSON file holding the people register.
    pub persons_path: PathBuf,

    #[serde(default = "default_birthday_hour")]
    pub birthday_hour: u32,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Role ids marking current students; birthday announcements for them
    /// carry the interactive button.
    #[serde(default)]
    pub current_member_roles: Vec<u64>,

    /// Alternate-persona system prompt, rolled in with odds 1/`persona_one_in`.
    #[serde(default)]
    pub persona_prompt: Option<String>,

    #[serde(default = "default_persona_one_in")]
    pub persona_one_in: u32,

    /// Odds denominator for the per-user canned reactions.
    #[serde(default = "default_reaction_one_in")]
    pub reaction_one_in: u32,

    #[serde(default)]
    pub user_reactions: Vec<UserReactionRule>,

    /// Custom emoji added when a message contains "cqfd".
    #[serde(default)]
    pub prof_emoji: Option<CustomEmoji>,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default)]
    pub completion: CompletionSettings,
}

/// Canned-reaction rule for one user: react with a random emoji from
/// `emojis` when a trigger word occurs, or on a lucky roll.
#[derive(Debug, Clone, Deserialize)]
pub struct UserReactionRule {
    pub user_id: u64,
    pub emojis: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomEmoji {
    pub id: u64,
    pub name: String,
}

/// Sampling parameters for the completion API. Kept flat so the server can
/// hand them to the provider untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub presence_penalty: f32,

    #[serde(default)]
    pub frequency_penalty: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: BotConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        Ok(config)
    }
}

fn default_menu_channel_name() -> String {
    "menu-cantine".to_string()
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./data/restauration.json")
}

fn default_birthday_hour() -> u32 {
    7
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

// The original rolls were inclusive randint(0, 42) / randint(0, 25); the
// denominators carry that over unexplained, as found.
fn default_persona_one_in() -> u32 {
    43
}

fn default_reaction_one_in() -> u32 {
    26
}

fn default_history_limit() -> usize {
    10
}

fn default_cache_capacity() -> usize {
    100
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_tokens() -> Option<u32> {
    Some(250)
}
