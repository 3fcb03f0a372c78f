pub mod account;

pub use account::{Account, ClaimStatus, CreateOutcome, LedgerStats};
