use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ParseMode};
use std::sync::Arc;

use crate::config::BotConfig;
use crate::gate::{RETRY_CALLBACK, RetryOutcome, RetryToken};
use crate::handlers::subscription::{Gate, links_keyboard};
use crate::messages;

/// Handles "I joined, check again" presses on the join prompt.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    log::info!("Received callback query with data: {}", data);

    let Some(token) = RetryToken::decode(data) else {
        if !data.starts_with(RETRY_CALLBACK) {
            log::warn!("Unknown callback data: {}", data);
        }
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let outcome = gate.retry(token, q.from.id).await;
    let alert = match outcome {
        RetryOutcome::Foreign => messages::FOREIGN_RETRY_ALERT,
        RetryOutcome::StillDenied => messages::NOT_JOINED_ALERT,
        RetryOutcome::Allowed => messages::VERIFIED_ALERT,
    };
    bot.answer_callback_query(q.id.clone())
        .text(alert)
        .show_alert(true)
        .await?;
    if outcome != RetryOutcome::Allowed {
        return Ok(());
    }

    // Replace the join prompt with the welcome message.
    if let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) {
        let text = messages::welcome(config.bot_username.as_deref(), token.requester.0, &config);
        let edit = bot
            .edit_message_text(message.chat.id, message.id, text)
            .parse_mode(ParseMode::Html);
        match links_keyboard(&config) {
            Some(keyboard) => edit.reply_markup(keyboard).await?,
            None => edit.await?,
        };
    }

    Ok(())
}
