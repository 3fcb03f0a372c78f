//! Long-polling transport: getUpdates loop feeding the router.

use std::sync::Arc;
use std::time::Duration;

use telegram::TelegramService;
use tracing::{info, warn};

use crate::domains::bot::{CommandRouter, InboundEvent};

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the getUpdates loop until the process is stopped. Per-update
/// failures are logged and never stop the loop.
pub async fn run_polling(telegram: Arc<TelegramService>, router: Arc<CommandRouter>) {
    info!("polling for updates");
    let mut offset: Option<i64> = None;

    loop {
        let updates = match telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed; retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            if let Some(callback) = &update.callback_query {
                if let Err(e) = telegram.answer_callback_query(&callback.id).await {
                    warn!(error = %e, "failed to answer callback query");
                }
            }

            if let Some(event) = InboundEvent::from_update(&update) {
                router.handle(event).await;
            }
        }
    }
}
