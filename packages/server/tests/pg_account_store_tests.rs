//! Account SQL-layer integration tests against a containerized Postgres.
//!
//! These exercise the actual conditional statements the ledger's atomicity
//! rests on. They need a Docker daemon, so they are ignored by default;
//! run them explicitly with `cargo test -p server -- --ignored`.

mod common;

use bot_core::domains::accounts::{Account, ClaimStatus};
use chrono::NaiveDate;

use crate::common::TestHarness;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn insert_if_absent_converges_on_one_row() {
    let harness = TestHarness::new().await.unwrap();

    let first = Account::insert_if_absent(101, "A", None, &harness.db_pool)
        .await
        .unwrap();
    assert!(first.created);

    // Duplicate insert is a no-op returning the existing row; a late
    // self-referral attempt is not stored.
    let second = Account::insert_if_absent(101, "A", Some(101), &harness.db_pool)
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.account.referrer_id, None);
    assert_eq!(second.account.points, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a local Docker daemon"]
async fn concurrent_same_day_claims_credit_once() {
    let harness = TestHarness::new().await.unwrap();
    Account::insert_if_absent(201, "B", None, &harness.db_pool)
        .await
        .unwrap();

    let n = 8;
    let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(n));
    let mut handles = Vec::new();
    for _ in 0..n {
        let pool = harness.db_pool.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            Account::claim_daily(201, day(7), 10, &pool).await.unwrap()
        }));
    }

    let mut claimed = 0;
    let mut repeats = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ClaimStatus::Claimed(_) => claimed += 1,
            ClaimStatus::AlreadyClaimed => repeats += 1,
            ClaimStatus::NotFound => panic!("account vanished"),
        }
    }

    assert_eq!(claimed, 1);
    assert_eq!(repeats, n - 1);

    let account = Account::find_by_id(201, &harness.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.points, 10);
    assert_eq!(account.last_claim_date, Some(day(7)));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn claim_date_never_regresses() {
    let harness = TestHarness::new().await.unwrap();
    Account::insert_if_absent(202, "C", None, &harness.db_pool)
        .await
        .unwrap();

    let first = Account::claim_daily(202, day(8), 10, &harness.db_pool)
        .await
        .unwrap();
    assert!(matches!(first, ClaimStatus::Claimed(_)));

    // A late event for an older calendar day must not claim or rewind.
    let stale = Account::claim_daily(202, day(7), 10, &harness.db_pool)
        .await
        .unwrap();
    assert!(matches!(stale, ClaimStatus::AlreadyClaimed));

    let account = Account::find_by_id(202, &harness.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.last_claim_date, Some(day(8)));
    assert_eq!(account.points, 10);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn claim_for_unknown_id_is_not_found() {
    let harness = TestHarness::new().await.unwrap();
    let status = Account::claim_daily(40404, day(7), 10, &harness.db_pool)
        .await
        .unwrap();
    assert!(matches!(status, ClaimStatus::NotFound));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn credit_points_clamps_at_zero() {
    let harness = TestHarness::new().await.unwrap();
    Account::insert_if_absent(301, "D", None, &harness.db_pool)
        .await
        .unwrap();

    assert_eq!(
        Account::credit_points(301, 30, &harness.db_pool)
            .await
            .unwrap(),
        Some(30)
    );
    assert_eq!(
        Account::credit_points(301, -100, &harness.db_pool)
            .await
            .unwrap(),
        Some(0)
    );
    assert_eq!(
        Account::credit_points(40404, 10, &harness.db_pool)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn count_referrals_counts_only_direct_referrals() {
    let harness = TestHarness::new().await.unwrap();
    Account::insert_if_absent(401, "R", None, &harness.db_pool)
        .await
        .unwrap();
    Account::insert_if_absent(402, "S", Some(401), &harness.db_pool)
        .await
        .unwrap();
    Account::insert_if_absent(403, "T", Some(401), &harness.db_pool)
        .await
        .unwrap();
    Account::insert_if_absent(404, "U", Some(402), &harness.db_pool)
        .await
        .unwrap();

    assert_eq!(
        Account::count_referrals(401, &harness.db_pool).await.unwrap(),
        2
    );
}
