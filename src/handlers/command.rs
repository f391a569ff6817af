use teloxide::prelude::*;
use std::sync::Arc;

use crate::commands::Command;
use crate::config::BotConfig;
use crate::handlers::subscription::{Gate, force_subscribe_check, links_keyboard, send_html};
use crate::messages::{self, Profile};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    gate: Arc<Gate>,
    config: Arc<BotConfig>,
) -> Result<(), anyhow::Error> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    log::info!("Command {:?} from user {} in chat {}", cmd, user.id.0, msg.chat.id.0);

    if !force_subscribe_check(&bot, &gate, &config, user, msg.chat.id).await? {
        return Ok(());
    }

    match cmd {
        Command::Start => {
            let text = messages::welcome(config.bot_username.as_deref(), user.id.0, &config);
            send_html(&bot, msg.chat.id, text, links_keyboard(&config)).await?;
        }
        Command::Help => {
            send_html(&bot, msg.chat.id, messages::help(&config), links_keyboard(&config)).await?;
        }
        Command::Id | Command::Info => {
            let asker = Profile::from(user);
            let replied_user = msg.reply_to_message().and_then(|reply| reply.from.as_ref());
            let text = match replied_user {
                Some(target) => messages::replied_info(&Profile::from(target), &asker),
                None => messages::own_info(&asker, &config),
            };
            send_html(&bot, msg.chat.id, text, None).await?;
        }
    };
    Ok(())
}
