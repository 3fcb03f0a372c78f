// Money Tree - chat-bot backend
//
// Tracks per-user point balances with a once-per-day reward, referral
// bonuses and commissions, channel-membership gating, and a single-admin
// surface (stats, point adjustment, broadcast). The durable store is the
// sole synchronization point: every balance mutation is one conditional
// SQL statement, so concurrent duplicate events cannot double-grant or
// lose an update.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
