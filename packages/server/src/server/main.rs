// Main entry point for the bot server

use std::sync::Arc;

use anyhow::{Context, Result};
use bot_core::domains::accounts::PgAccountStore;
use bot_core::domains::admin::AdminOps;
use bot_core::domains::bot::{CommandRouter, RouterConfig};
use bot_core::domains::rewards::RewardEngine;
use bot_core::kernel::{BotDeps, TelegramMembershipGate, TelegramMessenger};
use bot_core::server::{build_app, run_polling, AppState};
use bot_core::Config;
use sqlx::postgres::PgPoolOptions;
use telegram::{TelegramOptions, TelegramService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bot_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Money Tree bot server");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let telegram = Arc::new(TelegramService::new(TelegramOptions {
        bot_token: config.bot_token.clone(),
    }));
    let me = telegram
        .get_me()
        .await
        .context("Failed to identify the bot account")?;
    let bot_username = me.username.unwrap_or(me.first_name);
    tracing::info!(bot_username = %bot_username, "Bot identified");

    let store = Arc::new(PgAccountStore::new(pool.clone()));
    let messenger = Arc::new(TelegramMessenger::new(telegram.clone()));
    let membership = Arc::new(TelegramMembershipGate::new(
        telegram.clone(),
        config.membership_channel.clone(),
    ));
    let deps = BotDeps::new(store, messenger, membership);

    let engine = RewardEngine::new(
        deps.store.clone(),
        deps.messenger.clone(),
        config.reward_config(),
    );
    let admin = AdminOps::new(
        deps.store.clone(),
        deps.messenger.clone(),
        config.admin_user_id,
        config.broadcast_concurrency,
    );
    let router = Arc::new(CommandRouter::new(
        deps,
        engine,
        admin,
        RouterConfig {
            admin_user_id: config.admin_user_id,
            bot_username,
            membership_channel_link: config.membership_channel_link.clone(),
        },
    ));

    match &config.webhook_url {
        Some(webhook_url) => {
            telegram
                .set_webhook(webhook_url)
                .await
                .context("Failed to register webhook")?;

            let app = build_app(AppState {
                db_pool: pool,
                router,
                telegram,
            });
            let addr = format!("0.0.0.0:{}", config.port);
            tracing::info!("Serving webhook on {}", addr);
            tracing::info!("Health check: http://localhost:{}/health", config.port);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .context("Failed to bind to address")?;
            axum::serve(listener, app).await.context("Server error")?;
        }
        None => {
            run_polling(telegram, router).await;
        }
    }

    Ok(())
}
