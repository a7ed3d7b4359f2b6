//! Typed channel event union
//!
//! Every inbound payload is decoded into [`ChannelEvent`] and merged through
//! a single function per broadcast, instead of independent per-event
//! callbacks mutating shared view state. The transport guarantees at-most-once
//! delivery per send but no ordering across senders, so no variant carries
//! causal assumptions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an event was produced by the local viewer or arrived from the
/// remote channel. Battle scoring routes on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Local,
    Remote,
}

/// Events carried on a broadcast's channel topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelEvent {
    #[serde(rename = "chat")]
    Chat {
        sender_id: Uuid,
        sender_name: String,
        #[serde(default)]
        privileged: bool,
        text: String,
    },

    #[serde(rename = "like")]
    Like { sender_id: Uuid },

    #[serde(rename = "gift")]
    Gift {
        sender_id: Uuid,
        sender_name: String,
        gift_id: String,
        unit_value: u64,
        emoji: String,
    },

    #[serde(rename = "pin_product")]
    PinProduct {
        product_id: Uuid,
        title: String,
        coin_price: u64,
    },

    #[serde(rename = "unpin_product")]
    UnpinProduct,

    /// Transport-level presence tally for the topic.
    #[serde(rename = "presence")]
    Presence { viewer_id: Uuid, viewer_count: u64 },

    /// Explicit battle transition signals from the host/backend.
    #[serde(rename = "battle_started")]
    BattleStarted,

    #[serde(rename = "battle_ended")]
    BattleEnded,
}

impl ChannelEvent {
    /// Sender identity for events that carry one (chat, like, gift).
    /// Used to skip the transport echo of the viewer's own sends.
    pub fn sender_id(&self) -> Option<Uuid> {
        match self {
            ChannelEvent::Chat { sender_id, .. }
            | ChannelEvent::Like { sender_id }
            | ChannelEvent::Gift { sender_id, .. } => Some(*sender_id),
            _ => None,
        }
    }
}

/// Decode a raw channel payload. Unknown variants and malformed payloads are
/// ignored, never rejected upward.
pub fn decode(payload: &str) -> Option<ChannelEvent> {
    match serde_json::from_str::<ChannelEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unrecognized channel payload");
            None
        }
    }
}

pub fn encode(event: &ChannelEvent) -> Result<String, crate::error::EngineError> {
    Ok(serde_json::to_string(event)?)
}
