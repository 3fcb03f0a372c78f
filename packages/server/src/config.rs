use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::domains::rewards::RewardConfig;

/// Application configuration loaded from environment variables.
///
/// Reward amounts and the admin id are carried here and handed to the
/// engines at construction; nothing below the config layer reads the
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bot_token: String,
    pub port: u16,
    /// When set, the server registers this URL as a webhook and serves
    /// updates over HTTP instead of long-polling.
    pub webhook_url: Option<String>,
    /// Chat the membership gate checks against: numeric id or "@handle".
    pub membership_channel: String,
    /// Public link users are sent to when asked to join.
    pub membership_channel_link: String,
    pub admin_user_id: i64,
    pub daily_reward_points: i64,
    pub referral_join_bonus: i64,
    pub referral_daily_commission: i64,
    pub min_withdraw_points: i64,
    /// Upper bound on in-flight sends during a broadcast fan-out.
    pub broadcast_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let membership_channel =
            env::var("MEMBERSHIP_CHANNEL").context("MEMBERSHIP_CHANNEL must be set")?;
        let membership_channel_link = env::var("MEMBERSHIP_CHANNEL_LINK")
            .unwrap_or_else(|_| format!("https://t.me/{}", membership_channel.trim_start_matches('@')));

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            webhook_url: env::var("WEBHOOK_URL").ok(),
            membership_channel,
            membership_channel_link,
            admin_user_id: parse_var("ADMIN_USER_ID", None)?,
            daily_reward_points: parse_var("DAILY_REWARD_POINTS", Some(10))?,
            referral_join_bonus: parse_var("REFERRAL_JOIN_BONUS", Some(50))?,
            referral_daily_commission: parse_var("REFERRAL_DAILY_COMMISSION", Some(2))?,
            min_withdraw_points: parse_var("MIN_WITHDRAW_POINTS", Some(200))?,
            broadcast_concurrency: parse_var("BROADCAST_CONCURRENCY", Some(16))?,
        })
    }

    pub fn reward_config(&self) -> RewardConfig {
        RewardConfig {
            daily_reward_points: self.daily_reward_points,
            referral_join_bonus: self.referral_join_bonus,
            referral_daily_commission: self.referral_daily_commission,
            min_withdraw_points: self.min_withdraw_points,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: Option<T>) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a valid number")),
        Err(_) => default.with_context(|| format!("{name} must be set")),
    }
}
