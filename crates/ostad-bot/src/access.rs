use std::sync::Arc;

use tracing::{info, warn};

use ostad_db::Database;
use ostad_types::models::{RequiredChannel, UserId};
use ostad_types::update::{Membership, OutgoingMessage};

use crate::messenger::Messenger;
use crate::texts::TextStore;
use crate::{BotError, BotResult};

/// Result of the force-subscribe check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// The user has not joined these channels (or membership could not be
    /// confirmed).
    Blocked(Vec<RequiredChannel>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRemoval {
    Removed,
    NotAnAdmin,
    Owner,
}

/// Admin gate and subscription gate.
pub struct AccessControl {
    db: Arc<Database>,
    messenger: Arc<dyn Messenger>,
    texts: Arc<TextStore>,
    owner_id: UserId,
}

impl AccessControl {
    pub fn new(
        db: Arc<Database>,
        messenger: Arc<dyn Messenger>,
        texts: Arc<TextStore>,
        owner_id: UserId,
    ) -> Self {
        Self {
            db,
            messenger,
            texts,
            owner_id,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Re-insert the owner into the admin set if the row went missing.
    pub fn ensure_owner(&self) -> BotResult<()> {
        if self.db.add_admin(self.owner_id)? {
            info!("Owner {} restored to admin set", self.owner_id);
        }
        Ok(())
    }

    pub fn is_admin(&self, user_id: UserId) -> BotResult<bool> {
        if user_id == self.owner_id {
            self.ensure_owner()?;
            return Ok(true);
        }
        Ok(self.db.is_admin(user_id)?)
    }

    pub fn require_admin(&self, user_id: UserId) -> BotResult<()> {
        if self.is_admin(user_id)? {
            Ok(())
        } else {
            warn!("User {} denied admin action", user_id);
            Err(BotError::Unauthorized(user_id))
        }
    }

    pub fn add_admin(&self, user_id: UserId) -> BotResult<bool> {
        Ok(self.db.add_admin(user_id)?)
    }

    /// The owner can never be removed.
    pub fn delete_admin(&self, user_id: UserId) -> BotResult<AdminRemoval> {
        if user_id == self.owner_id {
            return Ok(AdminRemoval::Owner);
        }
        if self.db.delete_admin(user_id)? {
            info!("Admin {} removed", user_id);
            Ok(AdminRemoval::Removed)
        } else {
            Ok(AdminRemoval::NotAnAdmin)
        }
    }

    /// Verify membership in every required channel when force-subscribe
    /// is on. Admins always pass. A failed lookup counts as "not a member"
    /// and the owner is told about it.
    pub async fn check_subscription(&self, user_id: UserId) -> BotResult<Gate> {
        if !self.db.force_subscribe()? || self.is_admin(user_id)? {
            return Ok(Gate::Open);
        }

        let mut missing = Vec::new();
        for channel in self.db.required_channels()? {
            match self.messenger.membership(channel.channel_id, user_id).await {
                Ok(Membership::Member) => {}
                Ok(Membership::NotMember) => missing.push(channel),
                Err(e) => {
                    warn!(
                        "Membership check for user {} in channel {} failed: {}",
                        user_id, channel.channel_id, e
                    );
                    let alert = self.texts.format(
                        "membership_check_failed",
                        &[("channel", &channel.channel_id), ("error", &e)],
                    );
                    self.alert_owner(&alert).await;
                    missing.push(channel);
                }
            }
        }

        if missing.is_empty() {
            Ok(Gate::Open)
        } else {
            Ok(Gate::Blocked(missing))
        }
    }

    async fn alert_owner(&self, text: &str) {
        if let Err(e) = self
            .messenger
            .send(self.owner_id, OutgoingMessage::text(text))
            .await
        {
            warn!("Could not alert owner {}: {}", self.owner_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{OWNER, test_state};

    #[test]
    fn owner_is_self_healing_and_immutable() {
        let (state, _) = test_state();
        state.db.delete_admin(OWNER).unwrap();
        assert!(!state.db.is_admin(OWNER).unwrap());

        assert!(state.access.is_admin(OWNER).unwrap());
        assert!(state.db.is_admin(OWNER).unwrap());

        assert_eq!(state.access.delete_admin(OWNER).unwrap(), AdminRemoval::Owner);
        assert!(state.db.is_admin(OWNER).unwrap());
    }

    #[test]
    fn non_admin_is_denied() {
        let (state, _) = test_state();
        assert!(matches!(
            state.access.require_admin(50),
            Err(BotError::Unauthorized(50))
        ));
        state.access.add_admin(50).unwrap();
        assert!(state.access.require_admin(50).is_ok());
        assert_eq!(state.access.delete_admin(50).unwrap(), AdminRemoval::Removed);
        assert_eq!(state.access.delete_admin(50).unwrap(), AdminRemoval::NotAnAdmin);
    }

    #[tokio::test]
    async fn gate_is_open_while_force_subscribe_is_off() {
        let (state, _) = test_state();
        state.db.add_required_channel(-5, "https://t.me/+abc").unwrap();
        assert_eq!(state.access.check_subscription(20).await.unwrap(), Gate::Open);
    }

    #[tokio::test]
    async fn gate_lists_unjoined_channels() {
        let (state, messenger) = test_state();
        state.db.toggle_force_subscribe().unwrap();
        state.db.add_required_channel(-5, "https://t.me/+a").unwrap();
        state.db.add_required_channel(-6, "https://t.me/+b").unwrap();
        messenger.add_member(-5, 20);

        match state.access.check_subscription(20).await.unwrap() {
            Gate::Blocked(channels) => {
                assert_eq!(channels.len(), 1);
                assert_eq!(channels[0].channel_id, -6);
            }
            Gate::Open => panic!("expected gate to block"),
        }

        messenger.add_member(-6, 20);
        assert_eq!(state.access.check_subscription(20).await.unwrap(), Gate::Open);
        // admins are exempt
        assert_eq!(state.access.check_subscription(OWNER).await.unwrap(), Gate::Open);
    }

    #[tokio::test]
    async fn failed_lookup_is_fail_closed_and_alerts_owner() {
        let (state, messenger) = test_state();
        state.db.toggle_force_subscribe().unwrap();
        state.db.add_required_channel(-5, "https://t.me/+a").unwrap();
        messenger.add_member(-5, 20);
        messenger.break_membership_checks(-5);

        assert!(matches!(
            state.access.check_subscription(20).await.unwrap(),
            Gate::Blocked(_)
        ));
        let alerts = messenger.texts_to(OWNER);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("-5"));
    }

    #[tokio::test]
    async fn owner_alert_uses_editable_text() {
        let (state, messenger) = test_state();
        state.db.toggle_force_subscribe().unwrap();
        state.db.add_required_channel(-5, "https://t.me/+a").unwrap();
        messenger.break_membership_checks(-5);
        assert!(
            state
                .texts
                .set("membership_check_failed", "lookup broken in {channel}")
                .unwrap()
        );

        state.access.check_subscription(20).await.unwrap();
        assert_eq!(messenger.texts_to(OWNER), vec!["lookup broken in -5".to_string()]);
    }
}
