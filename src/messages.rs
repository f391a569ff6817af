//! HTML reply templates.
//!
//! Everything a user or chat controls (names, titles, usernames) goes through
//! [`html::escape`] before it lands in a template.

use teloxide::types::{Chat, Contact, User};
use teloxide::utils::html;

use crate::config::BotConfig;
use crate::gate::GateResponse;

/// The parts of a Telegram user the replies show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
    pub is_premium: bool,
    pub language: Option<String>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            is_bot: user.is_bot,
            is_premium: user.is_premium,
            language: user.language_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Channel,
    Supergroup,
    Group,
    Private,
}

impl ChatKind {
    fn label(self) -> &'static str {
        match self {
            Self::Channel => "Channel",
            Self::Supergroup => "Supergroup",
            Self::Group => "Group",
            Self::Private => "Chat",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            Self::Channel => "📢",
            Self::Supergroup | Self::Group => "👥",
            Self::Private => "💬",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCard {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
    pub kind: ChatKind,
}

impl From<&Chat> for ChatCard {
    fn from(chat: &Chat) -> Self {
        let kind = if chat.is_channel() {
            ChatKind::Channel
        } else if chat.is_supergroup() {
            ChatKind::Supergroup
        } else if chat.is_group() {
            ChatKind::Group
        } else {
            ChatKind::Private
        };
        Self {
            id: chat.id.0,
            title: chat.title().map(str::to_string),
            username: chat.username().map(str::to_string),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCard {
    pub user_id: Option<u64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
}

impl From<&Contact> for ContactCard {
    fn from(contact: &Contact) -> Self {
        Self {
            user_id: contact.user_id.map(|id| id.0),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            phone_number: contact.phone_number.clone(),
        }
    }
}

fn or_none(value: Option<&str>) -> String {
    value.map(html::escape).unwrap_or_else(|| "None".to_string())
}

fn at_or_none(username: Option<&str>) -> String {
    username
        .map(|u| format!("@{}", html::escape(u)))
        .unwrap_or_else(|| "None".to_string())
}

fn yes_no(flag: bool, yes: &str) -> &str {
    if flag { yes } else { "No ❌" }
}

fn developer_line(cfg: &BotConfig) -> String {
    match &cfg.developer {
        Some(dev) => format!("\n<b>Developer:</b> {}\n", html::escape(dev)),
        None => String::new(),
    }
}

fn link_lines(cfg: &BotConfig) -> String {
    let mut out = String::new();
    if let Some(url) = &cfg.update_channel_url {
        out.push_str(&format!("<b>Update Channel:</b> {}\n", html::escape(url.as_str())));
    }
    if let Some(url) = &cfg.support_group_url {
        out.push_str(&format!("<b>Support Group:</b> {}\n", html::escape(url.as_str())));
    }
    out
}

fn profile_lines(p: &Profile, id_label: &str) -> String {
    format!(
        "<b>{}:</b> <code>{}</code>\n\
         <b>First Name:</b> {}\n\
         <b>Last Name:</b> {}\n\
         <b>Username:</b> {}\n\
         <b>Is Bot:</b> {}\n\
         <b>Is Premium:</b> {}\n",
        id_label,
        p.id,
        html::escape(&p.first_name),
        or_none(p.last_name.as_deref()),
        at_or_none(p.username.as_deref()),
        yes_no(p.is_bot, "Yes ✅"),
        if p.is_premium { "Yes ⭐" } else { "No" },
    )
}

pub fn welcome(bot_username: Option<&str>, user_id: u64, cfg: &BotConfig) -> String {
    let greeting = match bot_username {
        Some(name) => format!("<b>Hi, welcome to @{} 👋</b>", html::escape(name)),
        None => "<b>Hi, welcome 👋</b>".to_string(),
    };
    format!(
        "{}\n\n\
         Using this bot, you can get the numerical ID of users and chats.\n\
         {}\n\
         📚 <b>Help:</b> /help\n\n\
         <b>Your ID:</b> <code>{}</code>\n\n\
         <i>You can check any <b>User | Chat | Bot</b>, just forward or share it with me!</i>",
        greeting,
        developer_line(cfg),
        user_id,
    )
}

pub fn help(cfg: &BotConfig) -> String {
    format!(
        "<b>🔍 How to use this bot:</b>\n\n\
         <b>1️⃣ Get User ID:</b>\n\
         • Forward any message from user\n\
         • Share contact\n\
         • Reply to user's message with /id\n\n\
         <b>2️⃣ Get Chat ID:</b>\n\
         • Forward any message from group/channel\n\
         • Share group/channel with bot\n\
         • Add bot to group and send /id\n\n\
         <b>3️⃣ Get Your Info:</b>\n\
         • Just send /start or /id\n\n\
         <b>4️⃣ Commands:</b>\n\
         /start - Start bot &amp; get your ID\n\
         /help - Show this help\n\
         /id - Get your ID or replied user ID\n\
         /info - Get detailed info\n\n\
         <b>💡 Tip:</b> You can forward/share anything with me!\n\
         {}\n{}",
        developer_line(cfg),
        link_lines(cfg),
    )
}

pub fn own_info(me: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>👤 Your Information:</b>\n\n\
         {}\
         <b>Language:</b> {}\n\n\
         <i>💡 Tip: Reply to someone's message with /id to get their ID!</i>\n\
         {}",
        profile_lines(me, "Your ID"),
        me.language.as_deref().map(html::escape).unwrap_or_else(|| "Unknown".to_string()),
        developer_line(cfg),
    )
}

pub fn replied_info(target: &Profile, asker: &Profile) -> String {
    format!(
        "<b>👤 User Information:</b>\n\n\
         {}\n\
         <i>Reply sent by:</i> {} (<code>{}</code>)",
        profile_lines(target, "User ID"),
        html::escape(&asker.first_name),
        asker.id,
    )
}

pub fn forwarded_user(sender: &Profile, forwarder: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>✉️ Forwarded Message Info:</b>\n\n\
         {}\n\
         <i>Forwarded by: {}</i>\n\
         {}",
        profile_lines(sender, "Sender ID"),
        html::escape(&forwarder.first_name),
        developer_line(cfg),
    )
}

pub fn forwarded_chat(chat: &ChatCard, forwarder: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>{} {} Information:</b>\n\n\
         <b>Chat ID:</b> <code>{}</code>\n\
         <b>Title:</b> {}\n\
         <b>Username:</b> {}\n\
         <b>Type:</b> {}\n\n\
         <i>Forwarded by: {}</i>\n\
         {}",
        chat.kind.emoji(),
        chat.kind.label(),
        chat.id,
        or_none(chat.title.as_deref()),
        at_or_none(chat.username.as_deref()),
        chat.kind.label(),
        html::escape(&forwarder.first_name),
        developer_line(cfg),
    )
}

pub fn hidden_sender(sender_name: &str, forwarder: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>🔒 Privacy Protected User</b>\n\n\
         <b>Name:</b> {}\n\
         <b>User ID:</b> <i>Hidden (User has privacy settings enabled)</i>\n\n\
         <i>This user has enabled privacy settings, so their ID cannot be retrieved.</i>\n\n\
         <i>Forwarded by: {}</i>\n\
         {}",
        html::escape(sender_name),
        html::escape(&forwarder.first_name),
        developer_line(cfg),
    )
}

pub fn contact(card: &ContactCard, sharer: &Profile, cfg: &BotConfig) -> String {
    let user_id = card
        .user_id
        .map(|id| format!("<code>{}</code>", id))
        .unwrap_or_else(|| "Not available".to_string());
    format!(
        "<b>📇 Contact Information:</b>\n\n\
         <b>User ID:</b> {}\n\
         <b>First Name:</b> {}\n\
         <b>Last Name:</b> {}\n\
         <b>Phone:</b> {}\n\n\
         <i>Shared by: {} (<code>{}</code>)</i>\n\
         {}",
        user_id,
        html::escape(&card.first_name),
        or_none(card.last_name.as_deref()),
        html::escape(&card.phone_number),
        html::escape(&sharer.first_name),
        sharer.id,
        developer_line(cfg),
    )
}

pub fn shared_chat(chat_id: i64, sharer: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>💬 Shared Chat Information:</b>\n\n\
         <b>Chat ID:</b> <code>{}</code>\n\n\
         <i>Shared by: {} (<code>{}</code>)</i>\n\n\
         <i>💡 Add this bot to the chat to get more details!</i>\n\
         {}",
        chat_id,
        html::escape(&sharer.first_name),
        sharer.id,
        developer_line(cfg),
    )
}

pub fn private_greeting(user: &Profile, cfg: &BotConfig) -> String {
    format!(
        "<b>👋 Hi {}!</b>\n\n\
         <b>Your ID:</b> <code>{}</code>\n\n\
         <i>💡 Forward any message or share a chat with me to get IDs!</i>\n\n\
         Use /help for more information.\n\
         {}",
        html::escape(&user.first_name),
        user.id,
        developer_line(cfg),
    )
}

pub fn group_info(chat: &ChatCard, user_id: u64, cfg: &BotConfig) -> String {
    format!(
        "<b>📊 Chat Information:</b>\n\n\
         <b>Chat ID:</b> <code>{}</code>\n\
         <b>Chat Title:</b> {}\n\
         <b>Chat Type:</b> {}\n\
         <b>Your ID:</b> <code>{}</code>\n\
         {}",
        chat.id,
        or_none(chat.title.as_deref()),
        chat.kind.label(),
        user_id,
        developer_line(cfg),
    )
}

pub fn access_denied(response: &GateResponse, cfg: &BotConfig) -> String {
    format!(
        "<b>⛔ Access Denied</b>\n\n\
         You need to join {} before using this bot.\n\
         Please join using the button below, then press \"check again\". 🙏🏻\n\n\
         <b>Join:</b> {}\n\
         {}{}",
        html::escape(&response.channel),
        html::escape(&response.join_link),
        link_lines(cfg),
        developer_line(cfg),
    )
}

pub const NOT_JOINED_ALERT: &str = "❌ You haven't joined yet! Please join first.";
pub const VERIFIED_ALERT: &str = "✅ Verified! You can now use the bot.";
pub const FOREIGN_RETRY_ALERT: &str = "This button is not for you.";
