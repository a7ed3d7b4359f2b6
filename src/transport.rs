//! Topic-scoped pub/sub transport seam
//!
//! The engine consumes a publish/subscribe primitive with presence tracking
//! and at-most-once delivery per message. Production embedders provide their
//! own implementation; [`InMemoryTransport`] backs tests and local runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::events::ChannelEvent;

/// Topic naming convention: one topic per broadcast, no cross-talk.
pub fn topic_for(broadcast_id: Uuid) -> String {
    format!("live:{broadcast_id}")
}

/// Live feed of raw payloads for one topic subscription.
pub struct ChannelSubscription {
    pub receiver: broadcast::Receiver<String>,
}

#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Open a subscription scoped to `topic`. Fails with
    /// [`EngineError::Unavailable`] when the transport is unreachable.
    async fn subscribe(&self, topic: &str) -> EngineResult<ChannelSubscription>;

    /// Fire-and-forget publish to every subscriber of `topic`.
    async fn publish(&self, topic: &str, payload: String) -> EngineResult<()>;

    /// Announce the local viewer's participation in `topic`.
    async fn announce_presence(&self, topic: &str, viewer_id: Uuid) -> EngineResult<()>;

    /// Withdraw the local viewer's participation from `topic`.
    async fn revoke_presence(&self, topic: &str, viewer_id: Uuid) -> EngineResult<()>;

    async fn presence_count(&self, topic: &str) -> u64;
}

struct TopicState {
    sender: broadcast::Sender<String>,
    viewers: HashSet<Uuid>,
}

impl TopicState {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender,
            viewers: HashSet::new(),
        }
    }
}

/// In-process transport built on tokio broadcast channels, one per topic.
///
/// Presence changes are also published as `presence` events so subscribers
/// (including the announcing client) observe the updated tally.
#[derive(Default, Clone)]
pub struct InMemoryTransport {
    topics: Arc<RwLock<HashMap<String, TopicState>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn publish_presence(&self, topic: &str, viewer_id: Uuid, viewer_count: u64) {
        let event = ChannelEvent::Presence {
            viewer_id,
            viewer_count,
        };
        match crate::events::encode(&event) {
            Ok(payload) => {
                let guard = self.topics.read().await;
                if let Some(state) = guard.get(topic) {
                    // No receivers is fine; presence is best-effort.
                    let _ = state.sender.send(payload);
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode presence event"),
        }
    }
}

#[async_trait]
impl ChannelTransport for InMemoryTransport {
    async fn subscribe(&self, topic: &str) -> EngineResult<ChannelSubscription> {
        let mut guard = self.topics.write().await;
        let state = guard
            .entry(topic.to_string())
            .or_insert_with(TopicState::new);
        tracing::debug!(topic, "opened subscription");
        Ok(ChannelSubscription {
            receiver: state.sender.subscribe(),
        })
    }

    async fn publish(&self, topic: &str, payload: String) -> EngineResult<()> {
        let guard = self.topics.read().await;
        match guard.get(topic) {
            Some(state) => {
                let _ = state.sender.send(payload);
                Ok(())
            }
            None => Err(EngineError::Unavailable(format!(
                "no such topic: {topic}"
            ))),
        }
    }

    async fn announce_presence(&self, topic: &str, viewer_id: Uuid) -> EngineResult<()> {
        let count = {
            let mut guard = self.topics.write().await;
            let state = guard
                .entry(topic.to_string())
                .or_insert_with(TopicState::new);
            state.viewers.insert(viewer_id);
            state.viewers.len() as u64
        };
        self.publish_presence(topic, viewer_id, count).await;
        Ok(())
    }

    async fn revoke_presence(&self, topic: &str, viewer_id: Uuid) -> EngineResult<()> {
        let count = {
            let mut guard = self.topics.write().await;
            match guard.get_mut(topic) {
                Some(state) => {
                    state.viewers.remove(&viewer_id);
                    // Last viewer gone and nobody listening: drop the topic
                    // so long-lived transports stay bounded.
                    if state.viewers.is_empty() && state.sender.receiver_count() == 0 {
                        guard.remove(topic);
                        return Ok(());
                    }
                    state.viewers.len() as u64
                }
                None => return Ok(()),
            }
        };
        self.publish_presence(topic, viewer_id, count).await;
        Ok(())
    }

    async fn presence_count(&self, topic: &str) -> u64 {
        let guard = self.topics.read().await;
        guard
            .get(topic)
            .map(|state| state.viewers.len() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_all_subscribers() {
        let transport = InMemoryTransport::new();
        let topic = topic_for(Uuid::new_v4());

        let mut a = transport.subscribe(&topic).await.expect("subscribe a");
        let mut b = transport.subscribe(&topic).await.expect("subscribe b");

        transport
            .publish(&topic, "payload".into())
            .await
            .expect("publish");

        assert_eq!(a.receiver.recv().await.unwrap(), "payload");
        assert_eq!(b.receiver.recv().await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn topics_do_not_cross_talk() {
        let transport = InMemoryTransport::new();
        let topic_a = topic_for(Uuid::new_v4());
        let topic_b = topic_for(Uuid::new_v4());

        let mut sub_b = transport.subscribe(&topic_b).await.expect("subscribe");
        let _sub_a = transport.subscribe(&topic_a).await.expect("subscribe");

        transport
            .publish(&topic_a, "only-for-a".into())
            .await
            .expect("publish");

        assert!(sub_b.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn revoking_the_last_viewer_of_an_unobserved_topic_drops_it() {
        let transport = InMemoryTransport::new();
        let topic = topic_for(Uuid::new_v4());
        let viewer = Uuid::new_v4();

        let subscription = transport.subscribe(&topic).await.expect("subscribe");
        transport
            .announce_presence(&topic, viewer)
            .await
            .expect("announce");
        drop(subscription);

        transport
            .revoke_presence(&topic, viewer)
            .await
            .expect("revoke");

        // The topic is gone, not lingering with an empty state.
        assert!(transport.publish(&topic, "into the void".into()).await.is_err());
        assert_eq!(transport.presence_count(&topic).await, 0);
    }

    #[tokio::test]
    async fn topic_survives_revoke_while_a_receiver_is_open() {
        let transport = InMemoryTransport::new();
        let topic = topic_for(Uuid::new_v4());
        let viewer = Uuid::new_v4();

        let mut subscription = transport.subscribe(&topic).await.expect("subscribe");
        transport
            .announce_presence(&topic, viewer)
            .await
            .expect("announce");
        transport
            .revoke_presence(&topic, viewer)
            .await
            .expect("revoke");

        transport
            .publish(&topic, "still open".into())
            .await
            .expect("publish");
        // Skip the presence events from announce/revoke.
        let mut seen = Vec::new();
        while let Ok(payload) = subscription.receiver.try_recv() {
            seen.push(payload);
        }
        assert!(seen.iter().any(|p| p == "still open"));
    }

    #[tokio::test]
    async fn presence_tally_tracks_announce_and_revoke() {
        let transport = InMemoryTransport::new();
        let topic = topic_for(Uuid::new_v4());
        let viewer = Uuid::new_v4();

        transport
            .announce_presence(&topic, viewer)
            .await
            .expect("announce");
        assert_eq!(transport.presence_count(&topic).await, 1);

        // Announcing twice is idempotent.
        transport
            .announce_presence(&topic, viewer)
            .await
            .expect("announce");
        assert_eq!(transport.presence_count(&topic).await, 1);

        transport
            .revoke_presence(&topic, viewer)
            .await
            .expect("revoke");
        assert_eq!(transport.presence_count(&topic).await, 0);
    }
}
