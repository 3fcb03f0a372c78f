//! CommandRouter - dispatches inbound events to handlers, enforcing the
//! membership gate before feature access.
//!
//! The router owns no business rules: it parses, gates, delegates to the
//! engines, and composes replies. Storage failures become the retry
//! message; delivery failures of replies are logged and dropped.

use chrono::Utc;
use tracing::{error, warn};

use crate::domains::admin::{AdjustOutcome, AdminError, AdminOps};
use crate::domains::bot::events::{CallbackAction, CallbackEvent, CommandEvent, InboundEvent};
use crate::domains::bot::replies;
use crate::domains::rewards::{
    ClaimOutcome, RegistrationOutcome, RewardEngine, WithdrawalEligibility,
};
use crate::kernel::{BotDeps, SendOutcome};

pub struct RouterConfig {
    pub admin_user_id: i64,
    /// Bot handle used to build referral deep links.
    pub bot_username: String,
    pub membership_channel_link: String,
}

pub struct CommandRouter {
    deps: BotDeps,
    engine: RewardEngine,
    admin: AdminOps,
    config: RouterConfig,
}

impl CommandRouter {
    pub fn new(deps: BotDeps, engine: RewardEngine, admin: AdminOps, config: RouterConfig) -> Self {
        Self {
            deps,
            engine,
            admin,
            config,
        }
    }

    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command(command) => self.handle_command(command).await,
            InboundEvent::Callback(callback) => self.handle_callback(callback).await,
        }
    }

    async fn handle_command(&self, event: CommandEvent) {
        match event.command.as_str() {
            "/start" => self.start(&event).await,
            "/help" => self.reply(event.caller_id, &replies::help_text()).await,
            "stats" => {
                let result = self.admin.stats(event.caller_id).await;
                self.admin_reply(event.caller_id, result.map(|s| replies::stats_text(&s)))
                    .await;
            }
            "broadcast" => self.admin_broadcast(&event).await,
            "addpoints" => self.admin_addpoints(&event).await,
            "checkuser" => self.admin_checkuser(&event).await,
            _ => self.gate_then_menu(event.caller_id).await,
        }
    }

    async fn handle_callback(&self, event: CallbackEvent) {
        let Ok(action) = event.action.parse::<CallbackAction>() else {
            // Unknown button payload: fall back to the menu.
            self.gate_then_menu(event.caller_id).await;
            return;
        };

        match action {
            CallbackAction::StartMenu | CallbackAction::CheckJoin => {
                self.gate_then_menu(event.caller_id).await
            }
            CallbackAction::DailyReward => self.daily_reward(&event).await,
            CallbackAction::MyAccount => self.my_account(&event).await,
            CallbackAction::WithdrawRequest => self.withdraw(&event).await,
        }
    }

    /// `/start`, with an optional referral id argument. Registration runs
    /// before the gate so a referral is never lost to a non-member.
    async fn start(&self, event: &CommandEvent) {
        let referrer_candidate = event
            .args_text
            .split_whitespace()
            .next()
            .and_then(|raw| raw.parse::<i64>().ok());

        match self
            .engine
            .register(event.caller_id, &event.caller_name, referrer_candidate)
            .await
        {
            Ok(RegistrationOutcome::Created { .. }) => {
                self.reply(event.caller_id, &replies::welcome(&event.caller_name))
                    .await
            }
            Ok(RegistrationOutcome::AlreadyExists(_)) => {
                self.reply(event.caller_id, &replies::welcome_back(&event.caller_name))
                    .await
            }
            Err(e) => {
                error!(user_id = event.caller_id, error = %e, "registration failed");
                self.reply(event.caller_id, &replies::try_again()).await;
                return;
            }
        }

        self.gate_then_menu(event.caller_id).await;
    }

    async fn daily_reward(&self, event: &CallbackEvent) {
        let user_id = event.caller_id;
        if !self.pass_gate(user_id).await {
            return;
        }

        let today = Utc::now().date_naive();
        match self.engine.claim_daily_reward(user_id, today).await {
            Ok(ClaimOutcome::Granted { new_balance }) => {
                self.reply(user_id, &replies::granted(new_balance)).await
            }
            Ok(ClaimOutcome::AlreadyClaimedToday) => {
                self.reply(user_id, &replies::already_claimed()).await
            }
            Ok(ClaimOutcome::UnknownUser) => {
                self.reply(user_id, &replies::unknown_user_prompt()).await
            }
            Err(e) => {
                error!(user_id, error = %e, "daily claim failed");
                self.reply(user_id, &replies::try_again()).await;
            }
        }
    }

    async fn my_account(&self, event: &CallbackEvent) {
        let user_id = event.caller_id;
        if !self.pass_gate(user_id).await {
            return;
        }

        let account = match self.deps.store.get(user_id).await {
            Ok(account) => account,
            Err(e) => {
                error!(user_id, error = %e, "account lookup failed");
                self.reply(user_id, &replies::try_again()).await;
                return;
            }
        };
        let Some(account) = account else {
            self.reply(user_id, &replies::unknown_user_prompt()).await;
            return;
        };
        let referrals = match self.deps.store.count_referrals(user_id).await {
            Ok(referrals) => referrals,
            Err(e) => {
                error!(user_id, error = %e, "referral count failed");
                self.reply(user_id, &replies::try_again()).await;
                return;
            }
        };

        self.reply_with_keyboard(
            user_id,
            &replies::account_view(&account, referrals, &self.config.bot_username),
            replies::main_menu_keyboard(),
        )
        .await;
    }

    async fn withdraw(&self, event: &CallbackEvent) {
        let user_id = event.caller_id;
        if !self.pass_gate(user_id).await {
            return;
        }

        match self.engine.request_withdrawal(user_id).await {
            Ok(WithdrawalEligibility::Eligible { points }) => {
                // Forward to the administrator; the ledger is untouched.
                let forward = replies::withdraw_forward(&event.caller_name, user_id, points);
                match self
                    .deps
                    .messenger
                    .send(self.config.admin_user_id, &forward)
                    .await
                {
                    SendOutcome::Delivered => {}
                    outcome => {
                        warn!(user_id, outcome = ?outcome, "withdrawal forward not delivered")
                    }
                }
                self.reply(user_id, &replies::withdraw_requested(points)).await;
            }
            Ok(WithdrawalEligibility::Ineligible {
                points,
                min_required,
            }) => {
                self.reply(user_id, &replies::withdraw_ineligible(points, min_required))
                    .await
            }
            Err(e) => {
                error!(user_id, error = %e, "withdrawal check failed");
                self.reply(user_id, &replies::try_again()).await;
            }
        }
    }

    async fn admin_broadcast(&self, event: &CommandEvent) {
        if event.args_text.is_empty() {
            self.reply(event.caller_id, "Usage: broadcast <message text>")
                .await;
            return;
        }
        let result = self
            .admin
            .broadcast(event.caller_id, &event.args_text)
            .await;
        self.admin_reply(
            event.caller_id,
            result.map(|r| replies::broadcast_report(&r)),
        )
        .await;
    }

    async fn admin_addpoints(&self, event: &CommandEvent) {
        let mut parts = event.args_text.split_whitespace();
        let (target, delta) = match (
            parts.next().and_then(|raw| raw.parse::<i64>().ok()),
            parts.next().and_then(|raw| raw.parse::<i64>().ok()),
        ) {
            (Some(target), Some(delta)) => (target, delta),
            _ => {
                self.reply(event.caller_id, "Usage: addpoints <user_id> <delta>")
                    .await;
                return;
            }
        };

        let result = self
            .admin
            .adjust_points(event.caller_id, target, delta)
            .await
            .map(|outcome| match outcome {
                AdjustOutcome::Adjusted { new_balance } => replies::adjusted(target, new_balance),
                AdjustOutcome::UnknownUser => replies::unknown_target(target),
            });
        self.admin_reply(event.caller_id, result).await;
    }

    async fn admin_checkuser(&self, event: &CommandEvent) {
        let Some(target) = event
            .args_text
            .split_whitespace()
            .next()
            .and_then(|raw| raw.parse::<i64>().ok())
        else {
            self.reply(event.caller_id, "Usage: checkuser <user_id>")
                .await;
            return;
        };

        let result = self
            .admin
            .check_user(event.caller_id, target)
            .await
            .map(|account| match account {
                Some(account) => replies::account_dump(&account),
                None => replies::unknown_target(target),
            });
        self.admin_reply(event.caller_id, result).await;
    }

    async fn admin_reply(&self, caller_id: i64, result: Result<String, AdminError>) {
        match result {
            Ok(text) => self.reply(caller_id, &text).await,
            Err(AdminError::Unauthorized) => {
                self.reply(caller_id, &replies::not_allowed()).await
            }
            Err(AdminError::Store(e)) => {
                error!(caller_id, error = %e, "admin operation failed");
                self.reply(caller_id, &replies::try_again()).await;
            }
        }
    }

    /// Membership gate: members get the menu, others the join prompt.
    /// Oracle failures fail closed to the retry message.
    async fn gate_then_menu(&self, user_id: i64) {
        match self.deps.membership.is_member(user_id).await {
            Ok(true) => {
                self.reply_with_keyboard(user_id, &replies::menu_text(), replies::main_menu_keyboard())
                    .await
            }
            Ok(false) => {
                self.reply_with_keyboard(
                    user_id,
                    &replies::join_prompt(),
                    replies::join_keyboard(&self.config.membership_channel_link),
                )
                .await
            }
            Err(e) => {
                warn!(user_id, error = %e, "membership check failed");
                self.reply(user_id, &replies::try_again()).await;
            }
        }
    }

    /// Returns true when the user may use feature actions; otherwise the
    /// appropriate prompt has already been sent.
    async fn pass_gate(&self, user_id: i64) -> bool {
        match self.deps.membership.is_member(user_id).await {
            Ok(true) => true,
            Ok(false) => {
                self.reply_with_keyboard(
                    user_id,
                    &replies::join_prompt(),
                    replies::join_keyboard(&self.config.membership_channel_link),
                )
                .await;
                false
            }
            Err(e) => {
                warn!(user_id, error = %e, "membership check failed");
                self.reply(user_id, &replies::try_again()).await;
                false
            }
        }
    }

    async fn reply(&self, user_id: i64, text: &str) {
        match self.deps.messenger.send(user_id, text).await {
            SendOutcome::Delivered => {}
            outcome => warn!(user_id, outcome = ?outcome, "reply not delivered"),
        }
    }

    async fn reply_with_keyboard(
        &self,
        user_id: i64,
        text: &str,
        keyboard: telegram::InlineKeyboardMarkup,
    ) {
        match self
            .deps
            .messenger
            .send_with_keyboard(user_id, text, keyboard)
            .await
        {
            SendOutcome::Delivered => {}
            outcome => warn!(user_id, outcome = ?outcome, "reply not delivered"),
        }
    }
}
