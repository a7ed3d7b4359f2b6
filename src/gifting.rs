//! Gift catalog and affordability
//!
//! The affordability gate is pure; all side effects of a gift send (local
//! debit, channel publish, system chat entry) live in the engine so they
//! happen on one write path.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::GiftItem;

/// Built-in catalog used when the embedder does not supply one.
pub static DEFAULT_GIFTS: Lazy<Vec<GiftItem>> = Lazy::new(|| {
    vec![
        GiftItem {
            id: "rose".into(),
            name: "Rose".into(),
            emoji: "\u{1F339}".into(),
            coin_price: 1,
        },
        GiftItem {
            id: "clap".into(),
            name: "Applause".into(),
            emoji: "\u{1F44F}".into(),
            coin_price: 9,
        },
        GiftItem {
            id: "finger_heart".into(),
            name: "Finger Heart".into(),
            emoji: "\u{1FAF0}".into(),
            coin_price: 5,
        },
        GiftItem {
            id: "rocket".into(),
            name: "Rocket".into(),
            emoji: "\u{1F680}".into(),
            coin_price: 70,
        },
        GiftItem {
            id: "lion".into(),
            name: "Lion".into(),
            emoji: "\u{1F981}".into(),
            coin_price: 500,
        },
    ]
});

/// Pure affordability check. No side effects.
pub fn can_afford(balance: u64, gift_price: u64) -> bool {
    balance >= gift_price
}

#[derive(Debug, Clone)]
pub struct GiftCatalog {
    items: HashMap<String, GiftItem>,
}

impl Default for GiftCatalog {
    fn default() -> Self {
        Self::with_items(DEFAULT_GIFTS.clone())
    }
}

impl GiftCatalog {
    pub fn with_items(items: Vec<GiftItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        }
    }

    pub fn get(&self, gift_id: &str) -> Option<&GiftItem> {
        self.items.get(gift_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_afford_is_inclusive() {
        assert!(can_afford(70, 70));
        assert!(can_afford(71, 70));
        assert!(!can_afford(69, 70));
        assert!(can_afford(0, 0));
    }

    #[test]
    fn default_catalog_resolves_by_id() {
        let catalog = GiftCatalog::default();
        let rocket = catalog.get("rocket").expect("rocket gift");
        assert_eq!(rocket.coin_price, 70);
        assert!(catalog.get("unknown").is_none());
    }
}
