use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use teloxide::types::{ChatId, Recipient};

const DEFAULT_MEMBERSHIP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ERROR_LOG_PATH: &str = "bot_errors.log";

pub fn find_dotenv() -> Result<Option<PathBuf>> {
    // 1. Check directory where the executable is located
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(exe_dir) = current_exe.parent() {
            let exe_dir_dotenv = exe_dir.join(".env");
            if exe_dir_dotenv.exists() {
                return Ok(Some(exe_dir_dotenv));
            }
        }
    }

    // 2. Check current working directory (for cargo run compatibility)
    let current_dotenv = std::env::current_dir()?.join(".env");
    if current_dotenv.exists() {
        return Ok(Some(current_dotenv));
    }

    Ok(None)
}

/// Loads `.env` if one is found and returns its path.
///
/// Runs before the logger is installed, so the caller reports the outcome.
pub fn load_environment() -> Result<Option<PathBuf>> {
    let found = find_dotenv()?;
    if let Some(path) = &found {
        dotenv::from_path(path)?;
    }
    Ok(found)
}

/// Path of the file that mirrors error-level log lines.
///
/// Read before [`BotConfig`] exists because logging is set up first.
pub fn error_log_path() -> String {
    env::var("ERROR_LOG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_LOG_PATH.to_string())
}

/// The channel users must join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetChannel {
    pub recipient: Recipient,
    /// `@name` for public channels, the numeric id otherwise.
    pub display: String,
    pub join_link: String,
}

impl TargetChannel {
    /// Accepts `@name`, `name`, `https://t.me/name` or a numeric chat id.
    pub fn parse(raw: &str, link_override: Option<&str>) -> Result<Self> {
        let raw = raw.trim();
        let link_override = link_override.map(str::trim).filter(|l| !l.is_empty());

        if let Ok(id) = raw.parse::<i64>() {
            let join_link = link_override
                .ok_or_else(|| anyhow!("FORCE_SUB_LINK must be set when FORCE_SUB_CHANNEL is a numeric id"))?;
            return Ok(Self {
                recipient: Recipient::Id(ChatId(id)),
                display: id.to_string(),
                join_link: join_link.to_string(),
            });
        }

        let name = raw
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("t.me/")
            .trim_start_matches('@')
            .trim_end_matches('/');
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("Invalid FORCE_SUB_CHANNEL: {:?}", raw);
        }

        Ok(Self {
            recipient: Recipient::ChannelUsername(format!("@{}", name)),
            display: format!("@{}", name),
            join_link: link_override
                .map(str::to_string)
                .unwrap_or_else(|| format!("https://t.me/{}", name)),
        })
    }
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub target_channel: Option<TargetChannel>,
    pub developer: Option<String>,
    pub update_channel_url: Option<Url>,
    pub support_group_url: Option<Url>,
    pub membership_timeout: Duration,
    /// Filled in after `getMe` succeeds.
    pub bot_username: Option<String>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .context("BOT_TOKEN (or TELOXIDE_TOKEN) must be set")?;

        let target_channel = match get("FORCE_SUB_CHANNEL") {
            Some(raw) => Some(TargetChannel::parse(&raw, get("FORCE_SUB_LINK").as_deref())?),
            None => None,
        };

        let parse_url = |key: &str| -> Result<Option<Url>> {
            get(key)
                .map(|v| Url::parse(&v).with_context(|| format!("{} is not a valid URL: {}", key, v)))
                .transpose()
        };

        let membership_timeout = match get("MEMBERSHIP_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("MEMBERSHIP_TIMEOUT_SECS must be a number, got {}", v))?;
                if secs == 0 {
                    bail!("MEMBERSHIP_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_MEMBERSHIP_TIMEOUT_SECS),
        };

        Ok(Self {
            bot_token,
            target_channel,
            developer: get("DEVELOPER"),
            update_channel_url: parse_url("UPDATE_CHANNEL_URL")?,
            support_group_url: parse_url("SUPPORT_GROUP_URL")?,
            membership_timeout,
            bot_username: None,
        })
    }
}
