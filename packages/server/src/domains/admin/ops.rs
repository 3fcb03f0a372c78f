//! Privileged operations: stats, point adjustment, account dump, broadcast.
//!
//! Every entry point authorizes first (`caller_id == admin_user_id`) and
//! performs no read, mutation or side effect on a mismatch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use crate::common::StoreError;
use crate::domains::accounts::{Account, LedgerStats};
use crate::kernel::{BaseAccountStore, BaseMessenger, SendOutcome};

#[derive(Error, Debug)]
pub enum AdminError {
    /// Caller is not the administrator; nothing was read or mutated.
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum AdjustOutcome {
    Adjusted { new_balance: i64 },
    UnknownUser,
}

/// Per-broadcast accounting. `delivered + blocked + failed` always equals
/// `total_targets`; one recipient's outcome never affects another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastResult {
    pub total_targets: usize,
    pub delivered: usize,
    pub blocked: usize,
    pub failed: usize,
}

pub struct AdminOps {
    store: Arc<dyn BaseAccountStore>,
    messenger: Arc<dyn BaseMessenger>,
    admin_user_id: i64,
    broadcast_concurrency: usize,
}

impl AdminOps {
    pub fn new(
        store: Arc<dyn BaseAccountStore>,
        messenger: Arc<dyn BaseMessenger>,
        admin_user_id: i64,
        broadcast_concurrency: usize,
    ) -> Self {
        Self {
            store,
            messenger,
            admin_user_id,
            broadcast_concurrency: broadcast_concurrency.max(1),
        }
    }

    fn authorize(&self, caller_id: i64) -> Result<(), AdminError> {
        if caller_id == self.admin_user_id {
            Ok(())
        } else {
            Err(AdminError::Unauthorized)
        }
    }

    pub async fn stats(&self, caller_id: i64) -> Result<LedgerStats, AdminError> {
        self.authorize(caller_id)?;
        Ok(self.store.aggregate().await?)
    }

    /// Adjust a balance by `delta` (may be negative; the store clamps at
    /// zero). Target notification is best-effort.
    pub async fn adjust_points(
        &self,
        caller_id: i64,
        target_id: i64,
        delta: i64,
    ) -> Result<AdjustOutcome, AdminError> {
        self.authorize(caller_id)?;

        match self.store.credit_points(target_id, delta).await? {
            Some(new_balance) => {
                info!(target_id, delta, new_balance, "balance adjusted");
                let note = format!(
                    "An administrator adjusted your balance by {delta}. \
                     Your balance is now {new_balance} points."
                );
                match self.messenger.send(target_id, &note).await {
                    SendOutcome::Delivered => {}
                    SendOutcome::Blocked => {
                        warn!(target_id, "adjustment notice blocked by recipient")
                    }
                    SendOutcome::Failed(reason) => {
                        warn!(target_id, reason, "adjustment notice failed")
                    }
                }
                Ok(AdjustOutcome::Adjusted { new_balance })
            }
            None => Ok(AdjustOutcome::UnknownUser),
        }
    }

    /// Raw account dump for the admin `checkuser` command.
    pub async fn check_user(
        &self,
        caller_id: i64,
        target_id: i64,
    ) -> Result<Option<Account>, AdminError> {
        self.authorize(caller_id)?;
        Ok(self.store.get(target_id).await?)
    }

    /// Fan one message out to every known account, with bounded concurrency
    /// and independent per-recipient accounting. There is no rollback and
    /// no ordering guarantee between recipients.
    pub async fn broadcast(
        &self,
        caller_id: i64,
        message: &str,
    ) -> Result<BroadcastResult, AdminError> {
        self.authorize(caller_id)?;

        let ids = self.store.list_ids().await?;
        let mut result = BroadcastResult {
            total_targets: ids.len(),
            ..Default::default()
        };
        info!(total_targets = result.total_targets, "broadcast started");

        let mut outcomes = stream::iter(ids)
            .map(|id| {
                let messenger = self.messenger.clone();
                async move { (id, messenger.send(id, message).await) }
            })
            .buffer_unordered(self.broadcast_concurrency);

        while let Some((id, outcome)) = outcomes.next().await {
            match outcome {
                SendOutcome::Delivered => result.delivered += 1,
                SendOutcome::Blocked => result.blocked += 1,
                SendOutcome::Failed(reason) => {
                    warn!(user_id = id, reason, "broadcast send failed");
                    result.failed += 1;
                }
            }
        }

        info!(
            delivered = result.delivered,
            blocked = result.blocked,
            failed = result.failed,
            "broadcast finished"
        );
        Ok(result)
    }
}
