use teloxide::prelude::*;
use std::sync::Arc;

use crate::config::BotConfig;
use crate::handlers::subscription::{Gate, force_subscribe_check, links_keyboard, send_html};
use crate::messages::{self, ChatCard, Profile};

/// Any other text: a greeting in private chats, chat details in groups.
pub async fn text_handler(
    bot: Bot,
    msg: Message,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if !force_subscribe_check(&bot, &gate, &config, user, msg.chat.id).await? {
        return Ok(());
    }

    if msg.chat.is_private() {
        let text = messages::private_greeting(&Profile::from(user), &config);
        send_html(&bot, msg.chat.id, text, links_keyboard(&config)).await
    } else {
        let text = messages::group_info(&ChatCard::from(&msg.chat), user.id.0, &config);
        send_html(&bot, msg.chat.id, text, None).await
    }
}
