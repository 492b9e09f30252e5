//! Shared ingestion path for the live listener and the startup backfill.
//!
//! Both producers run the same pipeline: trigger-phrase filter, order-id
//! capture, novelty check against the ledger, persist. Only the live
//! listener notifies afterwards; persistence always happens before the
//! notification attempt, so a failed send never loses the record.

use tracing::info;

use crate::extract::{is_order_confirmation, order_details, order_id_from};
use crate::ledger::{LedgerError, OrderLedger};
use crate::order::OrderRecord;

/// Process one channel message. Returns the newly persisted record when the
/// message introduced an unseen order, `Ok(None)` for everything else:
/// non-confirmation messages, confirmations without an order number, and
/// replays of already-known orders.
pub fn ingest_text(ledger: &OrderLedger, text: &str) -> Result<Option<OrderRecord>, LedgerError> {
    if !is_order_confirmation(text) {
        return Ok(None);
    }
    let order_id = match order_id_from(text) {
        Some(order_id) => order_id,
        None => return Ok(None),
    };
    if ledger.contains(&order_id) {
        return Ok(None);
    }

    let record = order_details(&order_id, text);
    ledger.append(&record)?;
    info!("order saved: {}", record.id);
    Ok(Some(record))
}

/// Telegram notification body for a freshly ingested order (HTML parse mode).
pub fn notification_text(record: &OrderRecord) -> String {
    format!(
        "📦 <b>NEW ORDER</b>\n\
         🆔 <code>{}</code>\n\
         🙍 {}\n\
         🎮 {}\n\
         📦 {}\n\
         ⏰ {} WIB\n\
         🔗 <a href='{}'>Link</a>",
        record.id, record.buyer, record.game, record.product, record.time, record.link
    )
}
