//! Discord Gateway client for the watched order channel.
//!
//! A serenity-based event handler connects to Discord's Gateway WebSocket,
//! runs the startup backfill once the connection is ready, and feeds every
//! message on the watched channel through ingestion. New orders are relayed
//! to Telegram; persistence always lands before the notification attempt.

use std::sync::Arc;

use serenity::all::{Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;
use serenity::Client;
use telegram_module::TelegramClient;
use tracing::info;

use crate::backfill;
use crate::config::RelayConfig;
use crate::error_log::ErrorLog;
use crate::ingest::{ingest_text, notification_text};
use crate::ledger::OrderLedger;

/// Shared state for the gateway event handler: the application context built
/// once at startup and passed to every component.
#[derive(Clone)]
pub struct RelayHandlerState {
    pub config: Arc<RelayConfig>,
    pub ledger: OrderLedger,
    pub error_log: ErrorLog,
    pub telegram: TelegramClient,
}

/// Serenity event handler for Discord Gateway events.
pub struct RelayEventHandler {
    state: RelayHandlerState,
}

impl RelayEventHandler {
    pub fn new(state: RelayHandlerState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for RelayEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        // A failed history read is logged and the listener keeps running.
        if let Err(err) =
            backfill::seed_from_history(&ctx.http, &self.state.config, &self.state.ledger).await
        {
            self.state
                .error_log
                .log_error(&format!("history fetch failed: {}", err));
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.channel_id.get() != self.state.config.discord_channel_id {
            return;
        }

        let record = match ingest_text(&self.state.ledger, &msg.content) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(err) => {
                self.state
                    .error_log
                    .log_error(&format!("failed to save order: {}", err));
                return;
            }
        };

        // The order is already durable; a failed send is logged, not retried.
        if let Err(err) = self
            .state
            .telegram
            .send_message_async(
                self.state.config.telegram_chat_id,
                &notification_text(&record),
                Some("HTML"),
            )
            .await
        {
            self.state
                .error_log
                .log_error(&format!("telegram send failed: {}", err));
        } else {
            info!("relayed order {} to Telegram", record.id);
        }
    }
}

/// Create and start the Discord Gateway client. Blocks until the connection
/// ends; spawn it as the main long-running task.
pub async fn start_discord_client(state: RelayHandlerState) -> Result<(), serenity::Error> {
    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let token = state.config.discord_token.clone();
    let handler = RelayEventHandler::new(state);

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    info!("starting Discord Gateway client");
    client.start().await
}
