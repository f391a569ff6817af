use teloxide::prelude::*;
use teloxide::types::MessageOrigin;
use std::sync::Arc;

use crate::config::BotConfig;
use crate::handlers::subscription::{Gate, force_subscribe_check, send_html};
use crate::messages::{self, ChatCard, ContactCard, Profile};

/// Reports the origin of a forwarded message: a user, a hidden user, or a chat.
pub async fn forwarded_handler(
    bot: Bot,
    msg: Message,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let (Some(user), Some(origin)) = (msg.from.as_ref(), msg.forward_origin()) else {
        return Ok(());
    };
    if !force_subscribe_check(&bot, &gate, &config, user, msg.chat.id).await? {
        return Ok(());
    }

    let forwarder = Profile::from(user);
    let text = match origin {
        MessageOrigin::User { sender_user, .. } => {
            messages::forwarded_user(&Profile::from(sender_user), &forwarder, &config)
        }
        MessageOrigin::HiddenUser { sender_user_name, .. } => {
            messages::hidden_sender(sender_user_name, &forwarder, &config)
        }
        MessageOrigin::Chat { sender_chat, .. } => {
            messages::forwarded_chat(&ChatCard::from(sender_chat), &forwarder, &config)
        }
        MessageOrigin::Channel { chat, .. } => {
            messages::forwarded_chat(&ChatCard::from(chat), &forwarder, &config)
        }
    };
    send_html(&bot, msg.chat.id, text, None).await
}

pub async fn contact_handler(
    bot: Bot,
    msg: Message,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let (Some(user), Some(contact)) = (msg.from.as_ref(), msg.contact()) else {
        return Ok(());
    };
    if !force_subscribe_check(&bot, &gate, &config, user, msg.chat.id).await? {
        return Ok(());
    }

    let text = messages::contact(&ContactCard::from(contact), &Profile::from(user), &config);
    send_html(&bot, msg.chat.id, text, None).await
}

/// Handles the service message Telegram sends when a chat is picked through a request-chat button.
pub async fn chat_shared_handler(
    bot: Bot,
    msg: Message,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let (Some(user), Some(shared)) = (msg.from.as_ref(), msg.shared_chat()) else {
        return Ok(());
    };
    if !force_subscribe_check(&bot, &gate, &config, user, msg.chat.id).await? {
        return Ok(());
    }

    let text = messages::shared_chat(shared.chat_id.0, &Profile::from(user), &config);
    send_html(&bot, msg.chat.id, text, None).await
}
