use serde::{Deserialize, Serialize};

/// One purchasable gift from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftItem {
    pub id: String,
    pub name: String,
    /// Emoji token rendered in chat and affordances.
    pub emoji: String,
    pub coin_price: u64,
}
