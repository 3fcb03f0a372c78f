//! Rewards domain - daily claims, referral bonuses and commissions,
//! withdrawal eligibility.

pub mod engine;

pub use engine::{
    ClaimOutcome, RegistrationOutcome, RewardConfig, RewardEngine, WithdrawalEligibility,
};
