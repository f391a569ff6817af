use std::future::Future;
use std::time::Duration;

use teloxide::types::{Recipient, UserId};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::TargetChannel;

pub mod telegram;

pub use telegram::TelegramOracle;

/// Callback data prefix carried by the "check again" button.
pub const RETRY_CALLBACK: &str = "check_subscription";

/// A requester's relationship to the target channel at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    // Telegram always reports a concrete status; other oracles may not.
    #[cfg_attr(not(test), allow(dead_code))]
    Unknown,
}

impl MembershipStatus {
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The bot itself may not inspect the channel, usually because it is not an admin there.
    #[error("bot is not allowed to inspect the channel: {0}")]
    Unauthorized(String),
    #[error("membership lookup failed: {0}")]
    Unavailable(String),
    #[error("membership lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// Source of truth for channel membership, normally the chat platform's API.
pub trait MembershipOracle: Send + Sync {
    fn get_membership(
        &self,
        channel: &Recipient,
        requester: UserId,
    ) -> impl Future<Output = Result<MembershipStatus, OracleError>> + Send;
}

/// Correlates a "check again" press with the user who was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryToken {
    pub requester: UserId,
}

impl RetryToken {
    pub fn new(requester: UserId) -> Self {
        Self { requester }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", RETRY_CALLBACK, self.requester.0)
    }

    pub fn decode(data: &str) -> Option<Self> {
        let id = data
            .strip_prefix(RETRY_CALLBACK)?
            .strip_prefix(':')?
            .parse::<u64>()
            .ok()?;
        Some(Self::new(UserId(id)))
    }
}

/// What a denied requester is shown: where to join and how to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub channel: String,
    pub join_link: String,
    pub retry: RetryToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    Denied(GateResponse),
}

/// Result of a "check again" press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Pressed by someone other than the denied user; nothing was checked.
    Foreign,
    StillDenied,
    Allowed,
}

/// Force-subscribe gate in front of every user-facing handler.
///
/// Fails open: any oracle failure resolves to [`Decision::Allow`], so losing
/// admin rights in the channel never locks every user out of the bot.
pub struct AccessGate<O> {
    oracle: O,
    channel: Option<TargetChannel>,
    timeout: Duration,
}

impl<O: MembershipOracle> AccessGate<O> {
    pub fn new(oracle: O, channel: Option<TargetChannel>, timeout: Duration) -> Self {
        match &channel {
            Some(channel) => log::info!("Force subscribe enabled for {}", channel.display),
            None => log::warn!("FORCE_SUB_CHANNEL not set. Force subscribe disabled."),
        }
        Self { oracle, channel, timeout }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    pub async fn evaluate(&self, requester: UserId) -> Decision {
        let Some(channel) = &self.channel else {
            return Decision::Allow;
        };

        let lookup = self.oracle.get_membership(&channel.recipient, requester);
        let result = match timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::TimedOut(self.timeout)),
        };

        match result {
            Ok(status) if status.grants_access() => Decision::Allow,
            Ok(status) => {
                log::debug!("User {} denied, status in {} is {:?}", requester.0, channel.display, status);
                Decision::Deny
            }
            Err(OracleError::Unauthorized(reason)) => {
                log::warn!(
                    "Bot cannot check members of {} ({}). Is it an admin there? Allowing user {}.",
                    channel.display, reason, requester.0
                );
                Decision::Allow
            }
            Err(e) => {
                log::warn!("Error checking subscription of user {}: {}. Allowing.", requester.0, e);
                Decision::Allow
            }
        }
    }

    pub fn respond_denied(&self, requester: UserId) -> GateResponse {
        let (channel, join_link) = match &self.channel {
            Some(c) => (c.display.clone(), c.join_link.clone()),
            None => (String::new(), String::new()),
        };
        GateResponse {
            channel,
            join_link,
            retry: RetryToken::new(requester),
        }
    }

    pub async fn check(&self, requester: UserId) -> GateOutcome {
        match self.evaluate(requester).await {
            Decision::Allow => GateOutcome::Allowed,
            Decision::Deny => GateOutcome::Denied(self.respond_denied(requester)),
        }
    }

    pub async fn retry(&self, token: RetryToken, presser: UserId) -> RetryOutcome {
        if token.requester != presser {
            return RetryOutcome::Foreign;
        }
        match self.evaluate(token.requester).await {
            Decision::Allow => RetryOutcome::Allowed,
            Decision::Deny => RetryOutcome::StillDenied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Answer {
        Status(MembershipStatus),
        Fail(OracleError),
        Hang,
    }

    #[derive(Default)]
    struct ScriptedOracle {
        answers: Mutex<HashMap<u64, Answer>>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn with(self, user: u64, answer: Answer) -> Self {
            self.set(user, answer);
            self
        }

        fn set(&self, user: u64, answer: Answer) {
            self.answers.lock().unwrap().insert(user, answer);
        }
    }

    impl MembershipOracle for ScriptedOracle {
        async fn get_membership(
            &self,
            channel: &Recipient,
            requester: UserId,
        ) -> Result<MembershipStatus, OracleError> {
            assert_eq!(channel, &Recipient::ChannelUsername("@chan".to_string()));
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answers.lock().unwrap().get(&requester.0).cloned();
            match answer {
                Some(Answer::Status(status)) => Ok(status),
                Some(Answer::Fail(e)) => Err(e),
                Some(Answer::Hang) => std::future::pending().await,
                None => Ok(MembershipStatus::Unknown),
            }
        }
    }

    fn chan() -> TargetChannel {
        TargetChannel::parse("@chan", None).unwrap()
    }

    fn gate(oracle: ScriptedOracle) -> AccessGate<ScriptedOracle> {
        AccessGate::new(oracle, Some(chan()), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn affirmative_statuses_allow() {
        let oracle = ScriptedOracle::default()
            .with(1, Answer::Status(MembershipStatus::Member))
            .with(2, Answer::Status(MembershipStatus::Administrator))
            .with(3, Answer::Status(MembershipStatus::Creator));
        let gate = gate(oracle);
        for id in 1..=3 {
            assert_eq!(gate.evaluate(UserId(id)).await, Decision::Allow);
        }
    }

    #[tokio::test]
    async fn non_member_statuses_deny() {
        let oracle = ScriptedOracle::default()
            .with(1, Answer::Status(MembershipStatus::Left))
            .with(2, Answer::Status(MembershipStatus::Kicked))
            .with(3, Answer::Status(MembershipStatus::Unknown))
            .with(4, Answer::Status(MembershipStatus::Restricted));
        let gate = gate(oracle);
        for id in 1..=4 {
            assert_eq!(gate.evaluate(UserId(id)).await, Decision::Deny);
        }
    }

    #[tokio::test]
    async fn oracle_failures_fail_open() {
        let oracle = ScriptedOracle::default()
            .with(1, Answer::Fail(OracleError::Unauthorized("member list is inaccessible".into())))
            .with(2, Answer::Fail(OracleError::Unavailable("connection reset".into())))
            .with(3, Answer::Hang);
        let gate = gate(oracle);
        for id in 1..=3 {
            assert_eq!(gate.evaluate(UserId(id)).await, Decision::Allow);
        }
    }

    #[tokio::test]
    async fn repeated_evaluation_is_stable() {
        let gate = gate(ScriptedOracle::default().with(7, Answer::Status(MembershipStatus::Kicked)));
        let first = gate.evaluate(UserId(7)).await;
        let second = gate.evaluate(UserId(7)).await;
        assert_eq!(first, Decision::Deny);
        assert_eq!(first, second);
        assert_eq!(gate.oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_sees_fresh_membership() {
        let gate = gate(ScriptedOracle::default().with(5, Answer::Status(MembershipStatus::Left)));

        let GateOutcome::Denied(response) = gate.check(UserId(5)).await else {
            panic!("expected a denial");
        };
        gate.oracle.set(5, Answer::Status(MembershipStatus::Member));

        let token = RetryToken::decode(&response.retry.encode()).unwrap();
        assert_eq!(gate.check(token.requester).await, GateOutcome::Allowed);
    }

    #[tokio::test]
    async fn retry_by_another_user_is_not_checked() {
        let gate = gate(ScriptedOracle::default().with(5, Answer::Status(MembershipStatus::Member)));
        let outcome = gate.retry(RetryToken::new(UserId(5)), UserId(6)).await;
        assert_eq!(outcome, RetryOutcome::Foreign);
        assert_eq!(gate.oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retry_while_kicked_stays_denied() {
        let gate = gate(ScriptedOracle::default().with(5, Answer::Status(MembershipStatus::Kicked)));
        let outcome = gate.retry(RetryToken::new(UserId(5)), UserId(5)).await;
        assert_eq!(outcome, RetryOutcome::StillDenied);
        assert_eq!(gate.oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_after_joining_is_allowed() {
        let gate = gate(ScriptedOracle::default().with(5, Answer::Status(MembershipStatus::Left)));
        let token = RetryToken::new(UserId(5));
        assert_eq!(gate.retry(token, UserId(5)).await, RetryOutcome::StillDenied);

        gate.oracle.set(5, Answer::Status(MembershipStatus::Member));
        assert_eq!(gate.retry(token, UserId(5)).await, RetryOutcome::Allowed);
    }

    #[tokio::test]
    async fn member_scenario() {
        let gate = gate(ScriptedOracle::default().with(1, Answer::Status(MembershipStatus::Member)));
        assert_eq!(gate.evaluate(UserId(1)).await, Decision::Allow);
    }

    #[tokio::test]
    async fn kicked_scenario_points_at_channel() {
        let gate = gate(ScriptedOracle::default().with(2, Answer::Status(MembershipStatus::Kicked)));
        assert_eq!(gate.evaluate(UserId(2)).await, Decision::Deny);

        let response = gate.respond_denied(UserId(2));
        assert_eq!(response.channel, "@chan");
        assert_eq!(response.join_link, "https://t.me/chan");
        assert_eq!(response.retry.requester, UserId(2));
    }

    #[tokio::test]
    async fn bot_not_admin_scenario() {
        let gate = gate(ScriptedOracle::default().with(
            3,
            Answer::Fail(OracleError::Unauthorized("Bad Request: member list is inaccessible".into())),
        ));
        assert_eq!(gate.evaluate(UserId(3)).await, Decision::Allow);
    }

    #[tokio::test]
    async fn disabled_gate_skips_oracle() {
        let gate = AccessGate::new(ScriptedOracle::default(), None, Duration::from_secs(1));
        assert!(!gate.is_enabled());
        assert_eq!(gate.check(UserId(9)).await, GateOutcome::Allowed);
        assert_eq!(gate.oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn retry_token_decoding() {
        assert_eq!(RetryToken::new(UserId(17)).encode(), "check_subscription:17");
        assert_eq!(RetryToken::decode("check_subscription:17"), Some(RetryToken::new(UserId(17))));
        assert_eq!(RetryToken::decode("check_subscription"), None);
        assert_eq!(RetryToken::decode("check_subscription:abc"), None);
        assert_eq!(RetryToken::decode("check_subscriptions:1"), None);
        assert_eq!(RetryToken::decode("help_user"), None);
    }
}
