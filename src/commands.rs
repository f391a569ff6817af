use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start the bot and get your ID.")]
    Start,
    #[command(description = "show how to use the bot.")]
    Help,
    #[command(description = "get your ID, or the ID of the user you reply to.")]
    Id,
    #[command(description = "get detailed info about you or the replied user.")]
    Info,
}
