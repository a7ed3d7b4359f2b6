use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared content category of a broadcast.
///
/// `Battle` drives the battle-engine entry heuristic; the gaming flag is a
/// separate bit on [`Broadcast`] because gaming streams keep their own
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastCategory {
    Chat,
    Music,
    Dance,
    Shopping,
    Battle,
}

/// Display identity for hosts, guests and chat senders, resolved by the
/// external user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInfo {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Product reference pinned to a broadcast. At most one may be pinned at a
/// time; a new pin replaces any existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedProduct {
    pub product_id: Uuid,
    pub title: String,
    pub coin_price: u64,
}

/// One live video session as reported by the broadcast directory.
///
/// Created externally when a host goes live, mutated continuously by channel
/// events, and gone from the directory result once the host ends it. The
/// engine never deletes a broadcast, it only stops rendering it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: Uuid,
    pub host: CreatorInfo,
    pub category: BroadcastCategory,
    #[serde(default)]
    pub gaming: bool,
    #[serde(default)]
    pub guests: Vec<CreatorInfo>,
    /// Primary media source.
    pub media_url: String,
    /// Single fallback source attempted after a playback error on the
    /// primary. Absent means a primary failure is terminal.
    #[serde(default)]
    pub fallback_media_url: Option<String>,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub pinned_product: Option<PinnedProduct>,
}

impl Broadcast {
    pub fn is_battle(&self) -> bool {
        self.category == BroadcastCategory::Battle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_directory_payload_with_defaults() {
        let payload = serde_json::json!({
            "id": Uuid::new_v4(),
            "host": { "id": Uuid::new_v4(), "username": "host", "avatar_url": null },
            "category": "battle",
            "media_url": "https://cdn.example.com/hls/1/index.m3u8"
        });

        let broadcast: Broadcast = serde_json::from_value(payload).expect("decode");
        assert!(broadcast.is_battle());
        assert!(!broadcast.gaming);
        assert!(broadcast.guests.is_empty());
        assert_eq!(broadcast.viewer_count, 0);
        assert!(broadcast.fallback_media_url.is_none());
    }
}
