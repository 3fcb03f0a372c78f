use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

/// Account model - SQL persistence layer
///
/// One row per chat user, keyed by the numeric user id. `points` never goes
/// below zero (schema CHECK plus the clamp in `credit_points`), and
/// `last_claim_date` never regresses: the only statement that writes it also
/// requires it to be NULL or strictly older than the new value.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub display_name: String,
    pub points: i64,
    pub last_claim_date: Option<NaiveDate>,
    pub referrer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Result of an insert-if-absent, reporting whether this call created the row.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub created: bool,
    pub account: Account,
}

/// Result of the conditional daily-claim update.
#[derive(Debug, Clone)]
pub enum ClaimStatus {
    /// The claim landed; the account reflects the new balance and date.
    Claimed(Account),
    AlreadyClaimed,
    NotFound,
}

#[derive(sqlx::FromRow, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub count: i64,
    pub total_points: i64,
}

impl Account {
    /// Find account by user id
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new account unless one already exists for this id.
    ///
    /// Concurrent calls for the same id converge on one row; the losers get
    /// the existing row back with `created = false`. A self-referencing
    /// `referrer_id` is stored as NULL.
    pub async fn insert_if_absent(
        id: i64,
        display_name: &str,
        referrer_id: Option<i64>,
        pool: &PgPool,
    ) -> Result<CreateOutcome, sqlx::Error> {
        let referrer_id = referrer_id.filter(|r| *r != id);

        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO accounts (id, display_name, referrer_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO NOTHING
             RETURNING *",
        )
        .bind(id)
        .bind(display_name)
        .bind(referrer_id)
        .fetch_optional(pool)
        .await?;

        if let Some(account) = inserted {
            return Ok(CreateOutcome {
                created: true,
                account,
            });
        }

        // Row already existed (or a concurrent insert won the race)
        let account = sqlx::query_as::<_, Self>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(CreateOutcome {
            created: false,
            account,
        })
    }

    /// Add `delta` to the balance in place, clamping at zero.
    ///
    /// Returns the new balance, or None when no row matched. The add happens
    /// inside the UPDATE so concurrent credits never lose an update.
    pub async fn credit_points(
        id: i64,
        delta: i64,
        pool: &PgPool,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE accounts
             SET points = GREATEST(0, points + $2)
             WHERE id = $1
             RETURNING points",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(points,)| points))
    }

    /// Grant the daily reward iff it has not been claimed today.
    ///
    /// The date test, the credit and the date advance are one statement, so
    /// two concurrent same-day claims produce exactly one `Claimed`.
    pub async fn claim_daily(
        id: i64,
        today: NaiveDate,
        amount: i64,
        pool: &PgPool,
    ) -> Result<ClaimStatus, sqlx::Error> {
        let claimed = sqlx::query_as::<_, Self>(
            "UPDATE accounts
             SET points = points + $3, last_claim_date = $2
             WHERE id = $1
               AND (last_claim_date IS NULL OR last_claim_date < $2)
             RETURNING *",
        )
        .bind(id)
        .bind(today)
        .bind(amount)
        .fetch_optional(pool)
        .await?;

        match claimed {
            Some(account) => Ok(ClaimStatus::Claimed(account)),
            None => match Self::find_by_id(id, pool).await? {
                Some(_) => Ok(ClaimStatus::AlreadyClaimed),
                None => Ok(ClaimStatus::NotFound),
            },
        }
    }

    /// All known account ids, unordered (broadcast fan-out).
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM accounts")
            .fetch_all(pool)
            .await
    }

    /// How many accounts name this user as their referrer.
    pub async fn count_referrals(id: i64, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE referrer_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn aggregate(pool: &PgPool) -> Result<LedgerStats, sqlx::Error> {
        sqlx::query_as::<_, LedgerStats>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(points), 0)::BIGINT AS total_points
             FROM accounts",
        )
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_struct() {
        let account = Account {
            id: 42,
            display_name: "Rahim".to_string(),
            points: 60,
            last_claim_date: None,
            referrer_id: Some(7),
            created_at: Utc::now(),
        };

        assert_eq!(account.points, 60);
        assert_eq!(account.referrer_id, Some(7));
    }
}
