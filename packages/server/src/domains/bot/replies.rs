//! Reply texts and keyboards.
//!
//! All user-facing copy lives here so handlers stay free of formatting.

use telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::domains::accounts::{Account, LedgerStats};
use crate::domains::admin::BroadcastResult;
use crate::domains::bot::events::CallbackAction;

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::rows(vec![
        vec![
            InlineKeyboardButton::callback("🎁 Daily reward", CallbackAction::DailyReward.as_str()),
            InlineKeyboardButton::callback("👤 My account", CallbackAction::MyAccount.as_str()),
        ],
        vec![InlineKeyboardButton::callback(
            "💸 Withdraw",
            CallbackAction::WithdrawRequest.as_str(),
        )],
    ])
}

pub fn join_keyboard(channel_link: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::rows(vec![
        vec![InlineKeyboardButton::link("📢 Join the channel", channel_link)],
        vec![InlineKeyboardButton::callback(
            "✅ I joined, check again",
            CallbackAction::CheckJoin.as_str(),
        )],
    ])
}

pub fn welcome(name: &str) -> String {
    format!("Welcome, {name}! Your account is ready.")
}

pub fn welcome_back(name: &str) -> String {
    format!("Welcome back, {name}!")
}

pub fn menu_text() -> String {
    "Pick an option:".to_string()
}

pub fn join_prompt() -> String {
    "To use the bot, join our channel first, then tap the check button.".to_string()
}

pub fn help_text() -> String {
    "Commands:\n\
     /start - register and open the menu\n\
     /help - this message\n\n\
     Use the menu buttons to claim your daily reward, view your account \
     and request a withdrawal."
        .to_string()
}

pub fn granted(new_balance: i64) -> String {
    format!("🎉 Daily reward claimed! Your balance is now {new_balance} points.")
}

pub fn already_claimed() -> String {
    "You already claimed today's reward. Come back tomorrow!".to_string()
}

/// Retryable-fault message; deliberately distinct from `already_claimed` so
/// users can tell a no-op from a failure.
pub fn try_again() -> String {
    "Something went wrong on our side. Please try again in a moment.".to_string()
}

pub fn unknown_user_prompt() -> String {
    "You are not registered yet. Send /start to begin.".to_string()
}

pub fn account_view(account: &Account, referrals: i64, bot_username: &str) -> String {
    let last_claim = match account.last_claim_date {
        Some(date) => date.to_string(),
        None => "never".to_string(),
    };
    format!(
        "👤 {name}\n\
         Balance: {points} points\n\
         Last daily claim: {last_claim}\n\
         Referrals: {referrals}\n\n\
         Your referral link:\n\
         t.me/{bot_username}?start={id}",
        name = account.display_name,
        points = account.points,
        id = account.id,
    )
}

pub fn withdraw_requested(points: i64) -> String {
    format!(
        "Your withdrawal request ({points} points) was sent to the administrator for review. ⏳"
    )
}

pub fn withdraw_ineligible(points: i64, min_required: i64) -> String {
    format!(
        "You need at least {min_required} points to withdraw. Your balance is {points} points."
    )
}

pub fn withdraw_forward(name: &str, user_id: i64, points: i64) -> String {
    format!(
        "🚨 New withdrawal request\n\
         User: {name} ({user_id})\n\
         Balance: {points} points"
    )
}

pub fn not_allowed() -> String {
    "You are not allowed to run this.".to_string()
}

pub fn stats_text(stats: &LedgerStats) -> String {
    format!(
        "Accounts: {count}\nTotal points: {total}",
        count = stats.count,
        total = stats.total_points,
    )
}

pub fn broadcast_report(result: &BroadcastResult) -> String {
    format!(
        "Broadcast finished.\n\
         Targets: {total}\n\
         Delivered: {delivered}\n\
         Blocked: {blocked}\n\
         Failed: {failed}",
        total = result.total_targets,
        delivered = result.delivered,
        blocked = result.blocked,
        failed = result.failed,
    )
}

pub fn adjusted(target_id: i64, new_balance: i64) -> String {
    format!("Adjusted. User {target_id} now has {new_balance} points.")
}

pub fn unknown_target(target_id: i64) -> String {
    format!("No account found for user {target_id}.")
}

pub fn account_dump(account: &Account) -> String {
    format!(
        "id: {id}\n\
         name: {name}\n\
         points: {points}\n\
         last_claim_date: {last_claim:?}\n\
         referrer_id: {referrer:?}\n\
         created_at: {created_at}",
        id = account.id,
        name = account.display_name,
        points = account.points,
        last_claim = account.last_claim_date,
        referrer = account.referrer_id,
        created_at = account.created_at,
    )
}
