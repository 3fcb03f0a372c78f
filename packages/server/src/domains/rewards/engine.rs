//! Reward business rules layered on the account store.
//!
//! The engine never does read-modify-write on balances: every mutation is
//! delegated to an atomic store operation. Referral credits are post-commit
//! follow-ups; their failure is logged and never unwinds the mutation that
//! triggered them.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::common::StoreError;
use crate::domains::accounts::{Account, ClaimStatus};
use crate::kernel::{BaseAccountStore, BaseMessenger, SendOutcome};

/// Reward amounts, injected at construction so the engine is testable with
/// arbitrary values.
#[derive(Debug, Clone)]
pub struct RewardConfig {
    pub daily_reward_points: i64,
    pub referral_join_bonus: i64,
    pub referral_daily_commission: i64,
    pub min_withdraw_points: i64,
}

#[derive(Debug)]
pub enum RegistrationOutcome {
    Created {
        account: Account,
        /// Referrer that received the join bonus, when one was attached.
        referral_credited: Option<i64>,
    },
    AlreadyExists(Account),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted { new_balance: i64 },
    AlreadyClaimedToday,
    UnknownUser,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WithdrawalEligibility {
    Eligible { points: i64 },
    Ineligible { points: i64, min_required: i64 },
}

#[derive(Clone)]
pub struct RewardEngine {
    store: Arc<dyn BaseAccountStore>,
    messenger: Arc<dyn BaseMessenger>,
    config: RewardConfig,
}

impl RewardEngine {
    pub fn new(
        store: Arc<dyn BaseAccountStore>,
        messenger: Arc<dyn BaseMessenger>,
        config: RewardConfig,
    ) -> Self {
        Self {
            store,
            messenger,
            config,
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Create an account on first contact, idempotently.
    ///
    /// A referral candidate is accepted only if it is not the user
    /// themselves and the referrer is already registered; otherwise the
    /// account is created without one. The join bonus is paid only by the
    /// call that actually created the row.
    pub async fn register(
        &self,
        new_user_id: i64,
        display_name: &str,
        referrer_candidate: Option<i64>,
    ) -> Result<RegistrationOutcome, StoreError> {
        if let Some(existing) = self.store.get(new_user_id).await? {
            return Ok(RegistrationOutcome::AlreadyExists(existing));
        }

        let referrer = match referrer_candidate {
            Some(candidate) if candidate != new_user_id => {
                self.store.get(candidate).await?.map(|a| a.id)
            }
            _ => None,
        };

        let outcome = self
            .store
            .create_if_absent(new_user_id, display_name, referrer)
            .await?;
        if !outcome.created {
            // Lost a concurrent registration race; the winner paid the bonus.
            return Ok(RegistrationOutcome::AlreadyExists(outcome.account));
        }

        info!(
            user_id = new_user_id,
            referrer = ?outcome.account.referrer_id,
            "account registered"
        );

        let mut referral_credited = None;
        if let Some(referrer_id) = outcome.account.referrer_id {
            let note = format!(
                "{display_name} joined with your link! You earned {} points.",
                self.config.referral_join_bonus
            );
            referral_credited = self
                .credit_referrer(referrer_id, self.config.referral_join_bonus, &note)
                .await;
        }

        Ok(RegistrationOutcome::Created {
            account: outcome.account,
            referral_credited,
        })
    }

    /// Grant the once-per-day reward.
    ///
    /// Idempotency lives in the store's conditional update; on a grant, the
    /// referrer's commission is paid as a follow-up outside the atomic
    /// claim, so a commission or notification failure leaves the grant
    /// standing.
    pub async fn claim_daily_reward(
        &self,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<ClaimOutcome, StoreError> {
        match self
            .store
            .claim_daily(user_id, today, self.config.daily_reward_points)
            .await?
        {
            ClaimStatus::Claimed(account) => {
                info!(user_id, balance = account.points, "daily reward granted");
                if let Some(referrer_id) = account.referrer_id {
                    let note = format!(
                        "Your referral claimed today's reward. You earned {} points.",
                        self.config.referral_daily_commission
                    );
                    self.credit_referrer(
                        referrer_id,
                        self.config.referral_daily_commission,
                        &note,
                    )
                    .await;
                }
                Ok(ClaimOutcome::Granted {
                    new_balance: account.points,
                })
            }
            ClaimStatus::AlreadyClaimed => Ok(ClaimOutcome::AlreadyClaimedToday),
            ClaimStatus::NotFound => Ok(ClaimOutcome::UnknownUser),
        }
    }

    /// Read-only eligibility check against the withdrawal threshold. The
    /// forwarding of an eligible request to the administrator is the
    /// router's job; nothing here mutates the ledger.
    pub async fn request_withdrawal(
        &self,
        user_id: i64,
    ) -> Result<WithdrawalEligibility, StoreError> {
        let points = self
            .store
            .get(user_id)
            .await?
            .map(|a| a.points)
            .unwrap_or(0);

        if points >= self.config.min_withdraw_points {
            Ok(WithdrawalEligibility::Eligible { points })
        } else {
            Ok(WithdrawalEligibility::Ineligible {
                points,
                min_required: self.config.min_withdraw_points,
            })
        }
    }

    /// Credit a referrer and notify them. Best-effort follow-up to an
    /// already-committed mutation: failures are logged, never propagated.
    async fn credit_referrer(&self, referrer_id: i64, amount: i64, note: &str) -> Option<i64> {
        match self.store.credit_points(referrer_id, amount).await {
            Ok(Some(_)) => {
                match self.messenger.send(referrer_id, note).await {
                    SendOutcome::Delivered => {}
                    SendOutcome::Blocked => {
                        warn!(referrer_id, "referral notification blocked by recipient")
                    }
                    SendOutcome::Failed(reason) => {
                        warn!(referrer_id, reason, "referral notification failed")
                    }
                }
                Some(referrer_id)
            }
            Ok(None) => {
                warn!(referrer_id, "referral credit skipped: unknown referrer");
                None
            }
            Err(e) => {
                warn!(referrer_id, error = %e, "referral credit failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MemAccountStore, MockMessenger};
    use std::sync::Arc;

    fn test_config() -> RewardConfig {
        RewardConfig {
            daily_reward_points: 10,
            referral_join_bonus: 50,
            referral_daily_commission: 2,
            min_withdraw_points: 200,
        }
    }

    fn engine(store: &Arc<MemAccountStore>, messenger: &Arc<MockMessenger>) -> RewardEngine {
        RewardEngine::new(store.clone(), messenger.clone(), test_config())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_day_claims_grant_exactly_once() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = Arc::new(engine(&store, &messenger));
        engine.register(1, "A", None).await.unwrap();

        let n = 8;
        let barrier = Arc::new(tokio::sync::Barrier::new(n));
        let mut handles = Vec::new();
        for _ in 0..n {
            let engine = engine.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                engine.claim_daily_reward(1, day(7)).await.unwrap()
            }));
        }

        let mut granted = 0;
        let mut repeats = 0;
        for handle in handles {
            match handle.await.unwrap() {
                ClaimOutcome::Granted { .. } => granted += 1,
                ClaimOutcome::AlreadyClaimedToday => repeats += 1,
                ClaimOutcome::UnknownUser => panic!("account vanished"),
            }
        }

        assert_eq!(granted, 1);
        assert_eq!(repeats, n - 1);
        assert_eq!(store.balance(1), Some(10));
    }

    #[tokio::test]
    async fn register_is_idempotent_and_pays_join_bonus_once() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);

        engine.register(7, "Referrer", None).await.unwrap();

        let first = engine.register(1, "A", Some(7)).await.unwrap();
        assert!(matches!(
            first,
            RegistrationOutcome::Created {
                referral_credited: Some(7),
                ..
            }
        ));

        let second = engine.register(1, "A", Some(7)).await.unwrap();
        assert!(matches!(second, RegistrationOutcome::AlreadyExists(_)));

        // One created account, one join bonus.
        assert_eq!(store.balance(7), Some(50));
        assert!(messenger.was_sent_containing("joined with your link"));
    }

    #[tokio::test]
    async fn self_referral_is_rejected() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);

        let outcome = engine.register(5, "Selfie", Some(5)).await.unwrap();
        match outcome {
            RegistrationOutcome::Created { account, referral_credited } => {
                assert_eq!(account.referrer_id, None);
                assert_eq!(referral_credited, None);
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_referrer_is_dropped() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);

        let outcome = engine.register(2, "B", Some(999)).await.unwrap();
        match outcome {
            RegistrationOutcome::Created { account, .. } => {
                assert_eq!(account.referrer_id, None)
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn claim_grants_again_on_a_later_day() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);
        engine.register(1, "A", None).await.unwrap();

        assert_eq!(
            engine.claim_daily_reward(1, day(7)).await.unwrap(),
            ClaimOutcome::Granted { new_balance: 10 }
        );
        assert_eq!(
            engine.claim_daily_reward(1, day(7)).await.unwrap(),
            ClaimOutcome::AlreadyClaimedToday
        );
        assert_eq!(
            engine.claim_daily_reward(1, day(8)).await.unwrap(),
            ClaimOutcome::Granted { new_balance: 20 }
        );
    }

    #[tokio::test]
    async fn claim_for_unknown_user() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);

        assert_eq!(
            engine.claim_daily_reward(404, day(7)).await.unwrap(),
            ClaimOutcome::UnknownUser
        );
    }

    #[tokio::test]
    async fn commission_notification_failure_never_blocks_the_claim() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(
            MockMessenger::new().with_outcome(7, SendOutcome::Failed("timeout".to_string())),
        );
        let engine = engine(&store, &messenger);

        engine.register(7, "Referrer", None).await.unwrap();
        engine.register(1, "A", Some(7)).await.unwrap();

        let outcome = engine.claim_daily_reward(1, day(7)).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Granted { new_balance: 10 });

        // The claimant's balance and the referrer's commission both stand;
        // only the notification was lost.
        assert_eq!(store.balance(1), Some(10));
        assert_eq!(store.balance(7), Some(50 + 2));
    }

    #[tokio::test]
    async fn withdrawal_threshold_boundary_is_eligible() {
        let store = Arc::new(MemAccountStore::new());
        let messenger = Arc::new(MockMessenger::new());
        let engine = engine(&store, &messenger);
        engine.register(1, "A", None).await.unwrap();

        store.credit_points(1, 199).await.unwrap();
        assert_eq!(
            engine.request_withdrawal(1).await.unwrap(),
            WithdrawalEligibility::Ineligible {
                points: 199,
                min_required: 200
            }
        );

        store.credit_points(1, 1).await.unwrap();
        assert_eq!(
            engine.request_withdrawal(1).await.unwrap(),
            WithdrawalEligibility::Eligible { points: 200 }
        );
    }
}
