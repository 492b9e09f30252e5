//! Labeled-line extraction of order details from confirmation messages.
//!
//! The message format is fixed by the marketplace bot and genuinely ad hoc:
//! a trigger phrase, an order number wrapped in bold markers, and four
//! `Label: value` lines. Extraction is deliberately literal pattern matching,
//! not a schema parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::order::{detail_link, OrderRecord, UNKNOWN_FIELD, UNKNOWN_TIME};

/// Substring whose presence marks a message as an order-confirmation event.
pub const TRIGGER_PHRASE: &str = "Baru Dibayar";

static ORDER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)nomor pesanan \*\*(OD.*?)\*\*").unwrap());

static BUYER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Nama Pembeli: (.*)$").unwrap());

static GAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Nama Game: (.*)$").unwrap());

static PRODUCT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Nama Produk: (.*)$").unwrap());

// The time value runs to the " WIB" stop token when present, end-of-line
// otherwise.
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Tanggal & Waktu: (.*?)(?: WIB|$)").unwrap());

/// `true` when the message looks like an order confirmation.
pub fn is_order_confirmation(text: &str) -> bool {
    text.contains(TRIGGER_PHRASE)
}

/// Capture the order number from a confirmation message. Absence is not an
/// error; messages without one are simply ignored by callers.
pub fn order_id_from(text: &str) -> Option<String> {
    ORDER_ID_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Build a full record from a message body. Total: every unmatched field
/// degrades to its placeholder, never to an empty string or an error.
pub fn order_details(id: &str, text: &str) -> OrderRecord {
    OrderRecord {
        id: id.to_string(),
        buyer: capture_or(&BUYER_PATTERN, text, UNKNOWN_FIELD),
        game: capture_or(&GAME_PATTERN, text, UNKNOWN_FIELD),
        product: capture_or(&PRODUCT_PATTERN, text, UNKNOWN_FIELD),
        time: capture_or(&TIME_PATTERN, text, UNKNOWN_TIME),
        link: detail_link(id),
    }
}

fn capture_or(pattern: &Regex, text: &str, fallback: &str) -> String {
    let value = pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
