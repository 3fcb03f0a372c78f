//! Accounts domain - the durable reward ledger.
//!
//! Leaf dependency of the reward and admin domains; holds no business
//! rules, only the account rows and the atomic operations on them.

pub mod models;
pub mod store;

pub use models::{Account, ClaimStatus, CreateOutcome, LedgerStats};
pub use store::PgAccountStore;
