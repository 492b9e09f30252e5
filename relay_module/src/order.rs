//! Order record type and its derived fields.

use serde::{Deserialize, Serialize};

/// Placeholder for detail fields the extractor could not match.
pub const UNKNOWN_FIELD: &str = "Tidak diketahui";

/// Placeholder for a missing order time.
pub const UNKNOWN_TIME: &str = "Waktu tidak diketahui";

/// Prefix itemku order numbers carry (`OD12345`).
pub const ORDER_ID_PREFIX: &str = "OD";

const DETAIL_URL_BASE: &str = "https://tokoku.itemku.com/riwayat-pesanan/rincian";

/// One persisted order. Created exactly once at first sighting of its id,
/// never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub buyer: String,
    pub game: String,
    pub product: String,
    pub time: String,
    pub link: String,
}

impl OrderRecord {
    /// Record with placeholder details, for ids seen without a parseable
    /// message body (legacy ledger migration).
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            buyer: UNKNOWN_FIELD.to_string(),
            game: UNKNOWN_FIELD.to_string(),
            product: UNKNOWN_FIELD.to_string(),
            time: UNKNOWN_TIME.to_string(),
            link: detail_link(id),
        }
    }
}

/// Seller-dashboard detail URL for an order id, with the `OD` prefix
/// stripped before substitution.
pub fn detail_link(id: &str) -> String {
    let bare = id.strip_prefix(ORDER_ID_PREFIX).unwrap_or(id);
    format!("{}/{}", DETAIL_URL_BASE, bare)
}
