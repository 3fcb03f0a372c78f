//! Bot dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by the router
//! and the domain engines, plus the adapters that put the Telegram client
//! behind the infrastructure traits.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use telegram::{InlineKeyboardMarkup, TelegramError, TelegramService};

use crate::kernel::{BaseAccountStore, BaseMembershipGate, BaseMessenger, SendOutcome};

// =============================================================================
// TelegramService Adapters
// =============================================================================

/// Wrapper around TelegramService that implements the BaseMessenger trait
pub struct TelegramMessenger(pub Arc<TelegramService>);

impl TelegramMessenger {
    pub fn new(service: Arc<TelegramService>) -> Self {
        Self(service)
    }

    fn classify(result: Result<telegram::Message, TelegramError>) -> SendOutcome {
        match result {
            Ok(_) => SendOutcome::Delivered,
            Err(TelegramError::Forbidden) => SendOutcome::Blocked,
            Err(e) => SendOutcome::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl BaseMessenger for TelegramMessenger {
    async fn send(&self, user_id: i64, text: &str) -> SendOutcome {
        Self::classify(self.0.send_message(user_id, text, None).await)
    }

    async fn send_with_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> SendOutcome {
        Self::classify(self.0.send_message(user_id, text, Some(&keyboard)).await)
    }
}

/// Membership oracle backed by `getChatMember` on the configured channel.
pub struct TelegramMembershipGate {
    service: Arc<TelegramService>,
    channel: String,
}

impl TelegramMembershipGate {
    pub fn new(service: Arc<TelegramService>, channel: String) -> Self {
        Self { service, channel }
    }
}

#[async_trait]
impl BaseMembershipGate for TelegramMembershipGate {
    async fn is_member(&self, user_id: i64) -> Result<bool> {
        match self.service.get_chat_member(&self.channel, user_id).await {
            Ok(member) => Ok(member.is_joined()),
            // Telegram answers 400 for users it has never seen in the chat
            Err(TelegramError::Api { code: 400, .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// BotDeps
// =============================================================================

/// Dependencies accessible to the router and engines (traits for testability)
#[derive(Clone)]
pub struct BotDeps {
    pub store: Arc<dyn BaseAccountStore>,
    pub messenger: Arc<dyn BaseMessenger>,
    pub membership: Arc<dyn BaseMembershipGate>,
}

impl BotDeps {
    pub fn new(
        store: Arc<dyn BaseAccountStore>,
        messenger: Arc<dyn BaseMessenger>,
        membership: Arc<dyn BaseMembershipGate>,
    ) -> Self {
        Self {
            store,
            messenger,
            membership,
        }
    }
}
