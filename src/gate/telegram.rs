use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient};

use super::{MembershipOracle, MembershipStatus, OracleError};

/// Membership lookups through the Bot API `getChatMember` call.
#[derive(Clone)]
pub struct TelegramOracle {
    bot: Bot,
}

impl TelegramOracle {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl From<ChatMemberStatus> for MembershipStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => Self::Creator,
            ChatMemberStatus::Administrator => Self::Administrator,
            ChatMemberStatus::Member => Self::Member,
            ChatMemberStatus::Restricted => Self::Restricted,
            ChatMemberStatus::Left => Self::Left,
            ChatMemberStatus::Banned => Self::Kicked,
        }
    }
}

impl From<RequestError> for OracleError {
    // Telegram answers "Bad Request" when the bot may not read the member list
    // or cannot see the channel at all.
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Api(api) => Self::Unauthorized(api.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl MembershipOracle for TelegramOracle {
    async fn get_membership(
        &self,
        channel: &Recipient,
        requester: UserId,
    ) -> Result<MembershipStatus, OracleError> {
        let member = self.bot.get_chat_member(channel.clone(), requester).await?;
        Ok(member.status().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::ApiError;
    use teloxide::types::Seconds;

    #[test]
    fn chat_member_statuses_map_one_to_one() {
        assert_eq!(MembershipStatus::from(ChatMemberStatus::Owner), MembershipStatus::Creator);
        assert_eq!(MembershipStatus::from(ChatMemberStatus::Banned), MembershipStatus::Kicked);
        assert_eq!(MembershipStatus::from(ChatMemberStatus::Restricted), MembershipStatus::Restricted);
        assert!(!MembershipStatus::from(ChatMemberStatus::Left).grants_access());
        assert!(MembershipStatus::from(ChatMemberStatus::Administrator).grants_access());
    }

    #[test]
    fn api_rejections_are_authorization_errors() {
        let err = OracleError::from(RequestError::Api(ApiError::ChatNotFound));
        assert!(matches!(err, OracleError::Unauthorized(_)));

        let err = OracleError::from(RequestError::RetryAfter(Seconds::from_seconds(5)));
        assert!(matches!(err, OracleError::Unavailable(_)));
    }
}
