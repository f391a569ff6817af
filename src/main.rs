use teloxide::prelude::*;
use teloxide::dptree;
use teloxide::error_handlers::LoggingErrorHandler;

use std::sync::Arc;

use anyhow::Error;
use crate::commands::Command;
use crate::config::BotConfig;
use crate::gate::{AccessGate, TelegramOracle};
use crate::handlers::{callback_handler, chat_shared_handler, command_handler, contact_handler, forwarded_handler, text_handler};

mod commands;
mod config;
mod gate;
mod handlers;
mod messages;

fn init_logging() -> Result<(), Error> {
    use std::sync::Mutex;
    use std::fs::OpenOptions;
    use log::LevelFilter;

    // Create a shared file handle for error logging
    let error_log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config::error_log_path())?;
    let error_log_file = Arc::new(Mutex::new(error_log_file));

    // Console for everything, the error log file for errors only
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .format(move |buf, record| {
            use std::io::Write;
            let output = format!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );

            if record.level() == log::Level::Error {
                if let Ok(mut file) = error_log_file.try_lock() {
                    let _ = writeln!(file, "{}", &output);
                }
            }

            writeln!(buf, "{}", &output)
        })
        .filter(None, LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // .env may carry RUST_LOG and ERROR_LOG_PATH, so load it before logging exists
    let env_result = crate::config::load_environment();
    init_logging()?;
    match env_result {
        Ok(Some(path)) => log::info!("Loaded environment variables from {:?}", path),
        Ok(None) => log::warn!("No .env file found. Using system environment variables."),
        Err(e) => {
            log::error!("Failed to load environment: {}", e);
            return Err(e);
        }
    }

    log::info!("Starting ID bot...");
    let start_time = std::time::Instant::now();

    let mut bot_config = match BotConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    let bot = Bot::new(bot_config.bot_token.clone());
    match bot.get_me().await {
        Ok(me) => {
            log::info!("Authorized as @{}", me.user.username.as_deref().unwrap_or("unknown"));
            bot_config.bot_username = me.user.username.clone();
        }
        Err(e) => log::warn!("getMe failed, welcome text will omit the bot username: {}", e),
    }
    if let Some(dev) = &bot_config.developer {
        log::info!("Developer: {}", dev);
    }

    let gate = Arc::new(AccessGate::new(
        TelegramOracle::new(bot.clone()),
        bot_config.target_channel.clone(),
        bot_config.membership_timeout,
    ));
    if !gate.is_enabled() {
        log::warn!("Every user will be served without a membership check.");
    }
    let bot_config = Arc::new(bot_config);

    let handler = dptree::entry()
        .branch(Update::filter_message().filter_command::<Command>().endpoint(command_handler))
        .branch(Update::filter_message().filter(|msg: Message| msg.forward_origin().is_some()).endpoint(forwarded_handler))
        .branch(Update::filter_message().filter(|msg: Message| msg.contact().is_some()).endpoint(contact_handler))
        .branch(Update::filter_message().filter(|msg: Message| msg.shared_chat().is_some()).endpoint(chat_shared_handler))
        .branch(Update::filter_message()
            .filter(|msg: Message| msg.text().map_or(false, |text| !text.starts_with('/')))
            .endpoint(text_handler)
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    log::info!("Bot initialization completed in {:.2?}", start_time.elapsed());
    log::info!("Starting to dispatch updates...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![gate, bot_config])
        .error_handler(LoggingErrorHandler::with_custom_text("An error occurred while handling an update"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
