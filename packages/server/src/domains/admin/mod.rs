//! Admin domain - the single-administrator command surface.

pub mod ops;

pub use ops::{AdjustOutcome, AdminError, AdminOps, BroadcastResult};
