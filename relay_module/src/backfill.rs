//! Startup history backfill.
//!
//! Walks the watched channel's history once, oldest-first, and replays the
//! normal ingestion pipeline without notifying, so the ledger is seeded with
//! orders that arrived while the relay was down. Discord paginates history
//! newest-first in batches of 100; the walk collects backwards up to the
//! configured bound and then replays in chronological order.

use serenity::all::{ChannelId, GetMessages, Message, MessageId};
use serenity::http::Http;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::ingest::ingest_text;
use crate::ledger::OrderLedger;

const PAGE_SIZE: u8 = 100;

/// Seed the ledger from channel history. Returns how many unseen orders were
/// persisted. Errors here are the caller's to log; they must not prevent the
/// listener or the control loop from running.
pub async fn seed_from_history(
    http: &Http,
    config: &RelayConfig,
    ledger: &OrderLedger,
) -> Result<usize, serenity::Error> {
    let channel = ChannelId::new(config.discord_channel_id);
    info!(
        "reading order history from channel {} (limit {})",
        channel, config.history_limit
    );

    let mut collected: Vec<Message> = Vec::new();
    let mut before: Option<MessageId> = None;
    while collected.len() < config.history_limit {
        let mut builder = GetMessages::new().limit(PAGE_SIZE);
        if let Some(before_id) = before {
            builder = builder.before(before_id);
        }
        let batch = channel.messages(http, builder).await?;
        if batch.is_empty() {
            break;
        }
        // Batches come newest-first, so the last entry is the page cursor.
        before = batch.last().map(|message| message.id);
        collected.extend(batch);
    }
    collected.truncate(config.history_limit);

    let seeded = seed_texts(ledger, collected.iter().rev().map(|m| m.content.as_str()));
    info!("history sync done, {} order(s) seeded", seeded);
    Ok(seeded)
}

/// Replay message texts, oldest first, through ingestion without notifying.
fn seed_texts<'a>(ledger: &OrderLedger, texts: impl Iterator<Item = &'a str>) -> usize {
    let mut seeded = 0;
    for text in texts {
        match ingest_text(ledger, text) {
            Ok(Some(record)) => {
                debug!("seeded order {} from history", record.id);
                seeded += 1;
            }
            Ok(None) => {}
            Err(err) => warn!("failed to persist order from history: {}", err),
        }
    }
    seeded
}
