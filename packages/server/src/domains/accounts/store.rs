//! Postgres-backed account store.
//!
//! Thin adapter from the `BaseAccountStore` seam onto the `Account` SQL
//! layer. All atomicity guarantees live in the SQL statements themselves;
//! this type adds nothing but error conversion.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::common::StoreError;
use crate::domains::accounts::models::{Account, ClaimStatus, CreateOutcome, LedgerStats};
use crate::kernel::BaseAccountStore;

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseAccountStore for PgAccountStore {
    async fn get(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_id(id, &self.pool).await?)
    }

    async fn create_if_absent(
        &self,
        id: i64,
        display_name: &str,
        referrer_id: Option<i64>,
    ) -> Result<CreateOutcome, StoreError> {
        Ok(Account::insert_if_absent(id, display_name, referrer_id, &self.pool).await?)
    }

    async fn credit_points(&self, id: i64, delta: i64) -> Result<Option<i64>, StoreError> {
        Ok(Account::credit_points(id, delta, &self.pool).await?)
    }

    async fn claim_daily(
        &self,
        id: i64,
        today: NaiveDate,
        amount: i64,
    ) -> Result<ClaimStatus, StoreError> {
        Ok(Account::claim_daily(id, today, amount, &self.pool).await?)
    }

    async fn list_ids(&self) -> Result<Vec<i64>, StoreError> {
        Ok(Account::list_ids(&self.pool).await?)
    }

    async fn count_referrals(&self, id: i64) -> Result<i64, StoreError> {
        Ok(Account::count_referrals(id, &self.pool).await?)
    }

    async fn aggregate(&self) -> Result<LedgerStats, StoreError> {
        Ok(Account::aggregate(&self.pool).await?)
    }
}
