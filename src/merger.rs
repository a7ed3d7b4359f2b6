//! Event merger
//!
//! Normalizes every inbound channel event into one bounded, ordered view
//! model per broadcast through a single merge entry point. Counters only
//! ever increment here; a like cannot be undone by this protocol, and
//! duplicate or out-of-order arrival cannot corrupt them.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::battle::{BattleEngine, BattleState};
use crate::chat_log::{ChatEntry, ChatLog};
use crate::config::EngineConfig;
use crate::events::{ChannelEvent, EventOrigin};
use crate::models::{Broadcast, PinnedProduct};
use crate::playback::{PlaybackFallback, PlaybackState};
use crate::session::ConnectionState;

/// Transient visual affordance (floating heart, gift banner). Pure UI data,
/// pruned once expired, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Affordance {
    pub kind: AffordanceKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordanceKind {
    Like,
    Gift,
}

/// Derived realtime state for one broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastViewModel {
    pub broadcast_id: Uuid,
    pub chat: ChatLog,
    pub like_count: u64,
    pub viewer_count: u64,
    pub pinned_product: Option<PinnedProduct>,
    pub affordances: Vec<Affordance>,
    pub battle: BattleEngine,
    pub playback: PlaybackFallback,
}

impl BroadcastViewModel {
    /// Seed the view model from the directory's snapshot of the broadcast.
    pub fn seeded_from(broadcast: &Broadcast, config: &EngineConfig) -> Self {
        Self {
            broadcast_id: broadcast.id,
            chat: ChatLog::new(config.chat_retention, config.chat_rendered),
            like_count: broadcast.like_count,
            viewer_count: broadcast.viewer_count,
            pinned_product: broadcast.pinned_product.clone(),
            affordances: Vec::new(),
            battle: BattleEngine::new(),
            playback: PlaybackFallback::new(),
        }
    }

    /// The single merge function: fold one event into the view model.
    pub fn apply(
        &mut self,
        event: &ChannelEvent,
        origin: EventOrigin,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) {
        match event {
            ChannelEvent::Chat {
                sender_id,
                sender_name,
                privileged,
                text,
            } => {
                self.chat.push(ChatEntry::user(
                    *sender_id,
                    sender_name.clone(),
                    text.clone(),
                    *privileged,
                ));
            }

            ChannelEvent::Like { .. } => {
                self.like_count = self.like_count.saturating_add(1);
                self.affordances.push(Affordance {
                    kind: AffordanceKind::Like,
                    expires_at: now + Duration::milliseconds(config.like_affordance_ttl_ms as i64),
                });
                self.battle.record(origin, 1);
            }

            ChannelEvent::Gift {
                sender_name,
                unit_value,
                emoji,
                ..
            } => {
                self.chat.push(ChatEntry::system(format!(
                    "{sender_name} sent {emoji} ({unit_value} coins)"
                )));
                self.affordances.push(Affordance {
                    kind: AffordanceKind::Gift,
                    expires_at: now + Duration::milliseconds(config.gift_affordance_ttl_ms as i64),
                });
                // unit_value is remote input; saturate instead of trusting it.
                self.battle
                    .record(origin, unit_value.saturating_mul(config.gift_battle_multiplier));
            }

            ChannelEvent::PinProduct {
                product_id,
                title,
                coin_price,
            } => {
                // A new pin replaces any existing one.
                self.pinned_product = Some(PinnedProduct {
                    product_id: *product_id,
                    title: title.clone(),
                    coin_price: *coin_price,
                });
            }

            ChannelEvent::UnpinProduct => {
                self.pinned_product = None;
            }

            ChannelEvent::Presence { viewer_count, .. } => {
                // Viewer count is a gauge fed by the transport's presence
                // tally; the like counter stays monotone.
                self.viewer_count = *viewer_count;
            }

            ChannelEvent::BattleStarted => self.battle.start(),
            ChannelEvent::BattleEnded => self.battle.end(),
        }
    }

    /// Drop affordances whose lifetime has passed.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) {
        self.affordances.retain(|a| a.expires_at > now);
    }

    pub fn snapshot(&self, connection: ConnectionState) -> BroadcastSnapshot {
        BroadcastSnapshot {
            broadcast_id: self.broadcast_id,
            chat: self.chat.rendered(),
            like_count: self.like_count,
            viewer_count: self.viewer_count,
            pinned_product: self.pinned_product.clone(),
            affordances: self.affordances.clone(),
            battle: self.battle.state(),
            playback: self.playback.state(),
            connection,
        }
    }
}

/// UI-facing snapshot of one broadcast's live state.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastSnapshot {
    pub broadcast_id: Uuid,
    pub chat: Vec<ChatEntry>,
    pub like_count: u64,
    pub viewer_count: u64,
    pub pinned_product: Option<PinnedProduct>,
    pub affordances: Vec<Affordance>,
    pub battle: BattleState,
    pub playback: PlaybackState,
    #[serde(skip)]
    pub connection: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BroadcastCategory, CreatorInfo};

    fn broadcast() -> Broadcast {
        Broadcast {
            id: Uuid::new_v4(),
            host: CreatorInfo {
                id: Uuid::new_v4(),
                username: "host".into(),
                avatar_url: None,
            },
            category: BroadcastCategory::Chat,
            gaming: false,
            guests: Vec::new(),
            media_url: "https://cdn.example.com/primary.m3u8".into(),
            fallback_media_url: None,
            viewer_count: 12,
            like_count: 40,
            pinned_product: None,
        }
    }

    fn vm() -> (BroadcastViewModel, EngineConfig) {
        let config = EngineConfig::default();
        (BroadcastViewModel::seeded_from(&broadcast(), &config), config)
    }

    #[test]
    fn seeds_counters_from_directory_snapshot() {
        let (vm, _) = vm();
        assert_eq!(vm.like_count, 40);
        assert_eq!(vm.viewer_count, 12);
    }

    #[test]
    fn like_increments_counter_and_spawns_affordance() {
        let (mut vm, config) = vm();
        let now = Utc::now();

        vm.apply(
            &ChannelEvent::Like {
                sender_id: Uuid::new_v4(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );

        assert_eq!(vm.like_count, 41);
        assert_eq!(vm.affordances.len(), 1);
        assert_eq!(vm.affordances[0].kind, AffordanceKind::Like);
        assert_eq!(
            vm.affordances[0].expires_at,
            now + Duration::milliseconds(1000)
        );
    }

    #[test]
    fn gift_appends_system_entry_with_two_second_affordance() {
        let (mut vm, config) = vm();
        let now = Utc::now();

        vm.apply(
            &ChannelEvent::Gift {
                sender_id: Uuid::new_v4(),
                sender_name: "viewer".into(),
                gift_id: "rocket".into(),
                unit_value: 70,
                emoji: "\u{1F680}".into(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );

        let top = vm.chat.iter().next().expect("chat entry");
        assert!(top.body.contains("viewer sent"));
        assert_eq!(
            vm.affordances[0].expires_at,
            now + Duration::milliseconds(2000)
        );
    }

    #[test]
    fn new_pin_replaces_existing_pin() {
        let (mut vm, config) = vm();
        let now = Utc::now();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        vm.apply(
            &ChannelEvent::PinProduct {
                product_id: first,
                title: "Hoodie".into(),
                coin_price: 300,
            },
            EventOrigin::Remote,
            now,
            &config,
        );
        vm.apply(
            &ChannelEvent::PinProduct {
                product_id: second,
                title: "Cap".into(),
                coin_price: 120,
            },
            EventOrigin::Remote,
            now,
            &config,
        );
        assert_eq!(vm.pinned_product.as_ref().unwrap().product_id, second);

        vm.apply(&ChannelEvent::UnpinProduct, EventOrigin::Remote, now, &config);
        assert!(vm.pinned_product.is_none());
    }

    #[test]
    fn battle_routes_remote_likes_right_and_local_left() {
        let (mut vm, config) = vm();
        let now = Utc::now();
        vm.apply(&ChannelEvent::BattleStarted, EventOrigin::Remote, now, &config);

        for _ in 0..60 {
            vm.apply(
                &ChannelEvent::Like {
                    sender_id: Uuid::new_v4(),
                },
                EventOrigin::Remote,
                now,
                &config,
            );
        }
        vm.apply(
            &ChannelEvent::Like {
                sender_id: Uuid::new_v4(),
            },
            EventOrigin::Local,
            now,
            &config,
        );

        assert_eq!(vm.battle.scores(), Some((1, 60)));
    }

    #[test]
    fn gift_contributes_unit_value_times_ten() {
        let (mut vm, config) = vm();
        let now = Utc::now();
        vm.apply(&ChannelEvent::BattleStarted, EventOrigin::Remote, now, &config);

        vm.apply(
            &ChannelEvent::Gift {
                sender_id: Uuid::new_v4(),
                sender_name: "viewer".into(),
                gift_id: "finger_heart".into(),
                unit_value: 5,
                emoji: "\u{1FAF0}".into(),
            },
            EventOrigin::Local,
            now,
            &config,
        );

        assert_eq!(vm.battle.scores(), Some((50, 0)));
    }

    #[test]
    fn hostile_gift_value_saturates_the_battle_score() {
        let (mut vm, config) = vm();
        let now = Utc::now();
        vm.apply(&ChannelEvent::BattleStarted, EventOrigin::Remote, now, &config);

        // The wire format places no bound on unit_value.
        vm.apply(
            &ChannelEvent::Gift {
                sender_id: Uuid::new_v4(),
                sender_name: "peer".into(),
                gift_id: "rocket".into(),
                unit_value: u64::MAX,
                emoji: "\u{1F680}".into(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );
        assert_eq!(vm.battle.scores(), Some((0, u64::MAX)));

        // A follow-up like must not wrap the score back down.
        vm.apply(
            &ChannelEvent::Like {
                sender_id: Uuid::new_v4(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );
        assert_eq!(vm.battle.scores(), Some((0, u64::MAX)));
    }

    #[test]
    fn presence_updates_gauge_without_touching_likes() {
        let (mut vm, config) = vm();
        let now = Utc::now();

        vm.apply(
            &ChannelEvent::Presence {
                viewer_id: Uuid::new_v4(),
                viewer_count: 3,
            },
            EventOrigin::Remote,
            now,
            &config,
        );

        assert_eq!(vm.viewer_count, 3);
        assert_eq!(vm.like_count, 40);
    }

    #[test]
    fn prune_drops_expired_affordances_only() {
        let (mut vm, config) = vm();
        let now = Utc::now();

        vm.apply(
            &ChannelEvent::Like {
                sender_id: Uuid::new_v4(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );
        vm.apply(
            &ChannelEvent::Gift {
                sender_id: Uuid::new_v4(),
                sender_name: "viewer".into(),
                gift_id: "rose".into(),
                unit_value: 1,
                emoji: "\u{1F339}".into(),
            },
            EventOrigin::Remote,
            now,
            &config,
        );

        // Past the like TTL but inside the gift TTL.
        vm.prune_expired(now + Duration::milliseconds(1500));
        assert_eq!(vm.affordances.len(), 1);
        assert_eq!(vm.affordances[0].kind, AffordanceKind::Gift);
    }
}
