// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "pay the referral commission") lives in domain code
// that uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMessenger)

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use telegram::InlineKeyboardMarkup;

use crate::common::StoreError;
use crate::domains::accounts::{Account, ClaimStatus, CreateOutcome, LedgerStats};

// =============================================================================
// Account Store Trait (Infrastructure - durable ledger storage)
// =============================================================================

/// Durable keyed storage for accounts. The store is the sole
/// synchronization point: each mutating method is atomic per account id,
/// and concurrent calls for different ids are fully independent.
#[async_trait]
pub trait BaseAccountStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Insert-if-absent; at most one row is ever created per id. A
    /// self-referencing referrer is stored as NULL.
    async fn create_if_absent(
        &self,
        id: i64,
        display_name: &str,
        referrer_id: Option<i64>,
    ) -> Result<CreateOutcome, StoreError>;

    /// Atomic in-place add, clamped at zero. Returns the new balance, or
    /// None when no row matched.
    async fn credit_points(&self, id: i64, delta: i64) -> Result<Option<i64>, StoreError>;

    /// Test "not yet claimed today", credit `amount` and advance the claim
    /// date as one indivisible unit.
    async fn claim_daily(
        &self,
        id: i64,
        today: NaiveDate,
        amount: i64,
    ) -> Result<ClaimStatus, StoreError>;

    /// All account ids, unordered.
    async fn list_ids(&self) -> Result<Vec<i64>, StoreError>;

    /// How many accounts name this user as referrer.
    async fn count_referrals(&self, id: i64) -> Result<i64, StoreError>;

    async fn aggregate(&self) -> Result<LedgerStats, StoreError>;
}

// =============================================================================
// Messenger Trait (Infrastructure - outbound delivery)
// =============================================================================

/// Per-recipient outcome of one outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The recipient has blocked the bot; permanent for this recipient.
    Blocked,
    Failed(String),
}

#[async_trait]
pub trait BaseMessenger: Send + Sync {
    /// Deliver `text` to a user. Delivery failure is data, not an error:
    /// callers count and log outcomes but never unwind a ledger mutation
    /// on them.
    async fn send(&self, user_id: i64, text: &str) -> SendOutcome;

    async fn send_with_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> SendOutcome;
}

// =============================================================================
// Membership Gate Trait (Infrastructure - channel roster oracle)
// =============================================================================

#[async_trait]
pub trait BaseMembershipGate: Send + Sync {
    /// Whether the user has joined the gated channel. An Err means the
    /// roster could not be consulted; callers fail closed.
    async fn is_member(&self, user_id: i64) -> Result<bool>;
}
