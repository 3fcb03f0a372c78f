// Test doubles for the infrastructure seams.
//
// MemAccountStore is more than a spy: it evaluates the same conditional
// semantics as the SQL statements inside one critical section, so
// engine-level concurrency tests exercise the real atomicity contract
// without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use telegram::InlineKeyboardMarkup;

use crate::common::StoreError;
use crate::domains::accounts::{Account, ClaimStatus, CreateOutcome, LedgerStats};
use crate::kernel::{
    BaseAccountStore, BaseMembershipGate, BaseMessenger, BotDeps, SendOutcome,
};

// =============================================================================
// In-memory Account Store
// =============================================================================

pub struct MemAccountStore {
    accounts: Mutex<HashMap<i64, Account>>,
}

impl MemAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Current balance, for test assertions.
    pub fn balance(&self, id: i64) -> Option<i64> {
        self.accounts.lock().unwrap().get(&id).map(|a| a.points)
    }
}

impl Default for MemAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAccountStore for MemAccountStore {
    async fn get(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn create_if_absent(
        &self,
        id: i64,
        display_name: &str,
        referrer_id: Option<i64>,
    ) -> Result<CreateOutcome, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(existing) = accounts.get(&id) {
            return Ok(CreateOutcome {
                created: false,
                account: existing.clone(),
            });
        }

        let account = Account {
            id,
            display_name: display_name.to_string(),
            points: 0,
            last_claim_date: None,
            referrer_id: referrer_id.filter(|r| *r != id),
            created_at: Utc::now(),
        };
        accounts.insert(id, account.clone());
        Ok(CreateOutcome {
            created: true,
            account,
        })
    }

    async fn credit_points(&self, id: i64, delta: i64) -> Result<Option<i64>, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(&id) {
            Some(account) => {
                account.points = (account.points + delta).max(0);
                Ok(Some(account.points))
            }
            None => Ok(None),
        }
    }

    async fn claim_daily(
        &self,
        id: i64,
        today: NaiveDate,
        amount: i64,
    ) -> Result<ClaimStatus, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(&id) {
            Some(account) => {
                if account.last_claim_date.map_or(true, |d| d < today) {
                    account.points += amount;
                    account.last_claim_date = Some(today);
                    Ok(ClaimStatus::Claimed(account.clone()))
                } else {
                    Ok(ClaimStatus::AlreadyClaimed)
                }
            }
            None => Ok(ClaimStatus::NotFound),
        }
    }

    async fn list_ids(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self.accounts.lock().unwrap().keys().copied().collect())
    }

    async fn count_referrals(&self, id: i64) -> Result<i64, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.referrer_id == Some(id))
            .count() as i64)
    }

    async fn aggregate(&self) -> Result<LedgerStats, StoreError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(LedgerStats {
            count: accounts.len() as i64,
            total_points: accounts.values().map(|a| a.points).sum(),
        })
    }
}

// =============================================================================
// Mock Messenger
// =============================================================================

pub struct MockMessenger {
    sent: Arc<Mutex<Vec<(i64, String)>>>,
    outcomes: Arc<Mutex<HashMap<i64, SendOutcome>>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            outcomes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Script the outcome for every send to this recipient.
    pub fn with_outcome(self, user_id: i64, outcome: SendOutcome) -> Self {
        self.outcomes.lock().unwrap().insert(user_id, outcome);
        self
    }

    /// All send attempts (recipient, text), in order.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts attempted to one recipient.
    pub fn sent_to(&self, user_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn was_sent_containing(&self, needle: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|(_, text)| text.contains(needle))
    }

    fn record(&self, user_id: i64, text: &str) -> SendOutcome {
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        self.outcomes
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or(SendOutcome::Delivered)
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMessenger for MockMessenger {
    async fn send(&self, user_id: i64, text: &str) -> SendOutcome {
        self.record(user_id, text)
    }

    async fn send_with_keyboard(
        &self,
        user_id: i64,
        text: &str,
        _keyboard: InlineKeyboardMarkup,
    ) -> SendOutcome {
        self.record(user_id, text)
    }
}

// =============================================================================
// Static Membership Gate
// =============================================================================

pub struct StaticMembershipGate {
    everyone: bool,
    members: Mutex<HashSet<i64>>,
    unavailable: bool,
}

impl StaticMembershipGate {
    /// Everyone is a member (for tests where gating is not the subject).
    pub fn permissive() -> Self {
        Self {
            everyone: true,
            members: Mutex::new(HashSet::new()),
            unavailable: false,
        }
    }

    /// Nobody is a member until admitted.
    pub fn nobody() -> Self {
        Self {
            everyone: false,
            members: Mutex::new(HashSet::new()),
            unavailable: false,
        }
    }

    /// The oracle cannot be reached; every lookup errors.
    pub fn unavailable() -> Self {
        Self {
            everyone: false,
            members: Mutex::new(HashSet::new()),
            unavailable: true,
        }
    }

    /// Admit a user after construction (simulates joining the channel).
    pub fn admit(&self, user_id: i64) {
        self.members.lock().unwrap().insert(user_id);
    }
}

#[async_trait]
impl BaseMembershipGate for StaticMembershipGate {
    async fn is_member(&self, user_id: i64) -> Result<bool> {
        if self.unavailable {
            anyhow::bail!("membership oracle unavailable");
        }
        Ok(self.everyone || self.members.lock().unwrap().contains(&user_id))
    }
}

// =============================================================================
// TestDeps - builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDeps {
    pub store: Arc<MemAccountStore>,
    pub messenger: Arc<MockMessenger>,
    pub membership: Arc<StaticMembershipGate>,
}

impl TestDeps {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemAccountStore::new()),
            messenger: Arc::new(MockMessenger::new()),
            membership: Arc::new(StaticMembershipGate::permissive()),
        }
    }

    /// Set a mock messenger
    pub fn mock_messenger(mut self, messenger: MockMessenger) -> Self {
        self.messenger = Arc::new(messenger);
        self
    }

    /// Set a membership gate
    pub fn mock_membership(mut self, gate: StaticMembershipGate) -> Self {
        self.membership = Arc::new(gate);
        self
    }

    /// Build the BotDeps container these doubles back.
    pub fn to_deps(&self) -> BotDeps {
        BotDeps::new(
            self.store.clone(),
            self.messenger.clone(),
            self.membership.clone(),
        )
    }
}

impl Default for TestDeps {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[tokio::test]
    async fn mem_store_claim_is_conditional_on_the_date() {
        let store = MemAccountStore::new();
        store.create_if_absent(1, "A", None).await.unwrap();

        assert!(matches!(
            store.claim_daily(1, day(7), 10).await.unwrap(),
            ClaimStatus::Claimed(_)
        ));
        assert!(matches!(
            store.claim_daily(1, day(7), 10).await.unwrap(),
            ClaimStatus::AlreadyClaimed
        ));
        // A stale event for an older day neither claims nor rewinds.
        assert!(matches!(
            store.claim_daily(1, day(6), 10).await.unwrap(),
            ClaimStatus::AlreadyClaimed
        ));
        assert_eq!(store.balance(1), Some(10));
    }

    #[tokio::test]
    async fn mem_store_credit_clamps_at_zero_like_the_sql() {
        let store = MemAccountStore::new();
        store.create_if_absent(1, "A", None).await.unwrap();

        assert_eq!(store.credit_points(1, 30).await.unwrap(), Some(30));
        assert_eq!(store.credit_points(1, -100).await.unwrap(), Some(0));
        assert_eq!(store.credit_points(404, 10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn mem_store_create_if_absent_drops_self_referral() {
        let store = MemAccountStore::new();

        let first = store.create_if_absent(5, "A", Some(5)).await.unwrap();
        assert!(first.created);
        assert_eq!(first.account.referrer_id, None);

        let second = store.create_if_absent(5, "A", Some(7)).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.account.referrer_id, None);
    }
}
