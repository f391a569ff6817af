use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User};
use reqwest::Url;
use anyhow::Error;

use crate::config::BotConfig;
use crate::gate::{AccessGate, GateOutcome, GateResponse, TelegramOracle};
use crate::messages;

pub type Gate = AccessGate<TelegramOracle>;

/// Update channel and support group buttons, when configured.
pub fn links_keyboard(cfg: &BotConfig) -> Option<InlineKeyboardMarkup> {
    let mut row = Vec::new();
    if let Some(url) = &cfg.update_channel_url {
        row.push(InlineKeyboardButton::url("📢 Update Channel", url.clone()));
    }
    if let Some(url) = &cfg.support_group_url {
        row.push(InlineKeyboardButton::url("👥 Support Group", url.clone()));
    }
    if row.is_empty() { None } else { Some(InlineKeyboardMarkup::new(vec![row])) }
}

pub fn denied_keyboard(response: &GateResponse, cfg: &BotConfig) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    match Url::parse(&response.join_link) {
        Ok(url) => rows.push(vec![InlineKeyboardButton::url("📢 Join Channel", url)]),
        Err(e) => log::warn!("Join link {:?} is not a valid URL: {}", response.join_link, e),
    }
    if let Some(url) = &cfg.support_group_url {
        rows.push(vec![InlineKeyboardButton::url("👥 Join Support Group", url.clone())]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "✅ I Joined, Check Again",
        response.retry.encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<(), Error> {
    let request = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}

/// Runs the gate for `user`. On denial the join prompt is sent to `chat_id`
/// and `false` is returned so the caller stops.
pub async fn force_subscribe_check(
    bot: &Bot,
    gate: &Gate,
    cfg: &BotConfig,
    user: &User,
    chat_id: ChatId,
) -> Result<bool, Error> {
    match gate.check(user.id).await {
        GateOutcome::Allowed => Ok(true),
        GateOutcome::Denied(response) => {
            log::info!("User {} is not subscribed to {}", user.id.0, response.channel);
            let keyboard = denied_keyboard(&response, cfg);
            send_html(bot, chat_id, messages::access_denied(&response, cfg), Some(keyboard)).await?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RetryToken;
    use teloxide::types::{InlineKeyboardButtonKind, UserId};

    fn cfg(support: bool) -> BotConfig {
        BotConfig::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("1:t".to_string()),
            "SUPPORT_GROUP_URL" if support => Some("https://t.me/support".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn response(join_link: &str) -> GateResponse {
        GateResponse {
            channel: "@chan".to_string(),
            join_link: join_link.to_string(),
            retry: RetryToken::new(UserId(2)),
        }
    }

    #[test]
    fn denied_keyboard_has_join_and_retry() {
        let keyboard = denied_keyboard(&response("https://t.me/chan"), &cfg(true));
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        match &keyboard.inline_keyboard[0][0].kind {
            InlineKeyboardButtonKind::Url(url) => assert_eq!(url.as_str(), "https://t.me/chan"),
            other => panic!("unexpected join button {:?}", other),
        }
        match &keyboard.inline_keyboard[2][0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "check_subscription:2"),
            other => panic!("unexpected retry button {:?}", other),
        }
    }

    #[test]
    fn unparsable_join_link_keeps_retry() {
        let keyboard = denied_keyboard(&response("not a link"), &cfg(false));
        assert_eq!(keyboard.inline_keyboard.len(), 1);
    }

    #[test]
    fn links_keyboard_only_when_configured() {
        assert!(links_keyboard(&cfg(false)).is_none());
        assert_eq!(links_keyboard(&cfg(true)).unwrap().inline_keyboard[0].len(), 1);
    }
}
