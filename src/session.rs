//! Channel session lifecycle
//!
//! One realtime subscription bound to one broadcast at a time. Switching the
//! active broadcast fully tears down the previous session before the next
//! one connects, and a new session object (with a fresh [`SessionId`]) is
//! created on every activation so in-flight events from a torn-down session
//! can be identified and discarded by id.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::events::{self, ChannelEvent};
use crate::transport::{topic_for, ChannelTransport};

/// Unique identifier for one session activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A failed connect is plain `Disconnected`; re-activation is the only
/// retry path.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    pub id: SessionId,
    pub broadcast_id: Uuid,
    pub state: ConnectionState,
}

/// Decoded event tagged with the session that produced it.
#[derive(Debug)]
pub struct InboundEvent {
    pub session_id: SessionId,
    pub broadcast_id: Uuid,
    pub event: ChannelEvent,
}

/// Owns the single channel session per client.
///
/// Invariant: at most one session is `Connected` at any time. The manager
/// replaces the session object on activation changes, never mutates one in
/// place across broadcasts.
pub struct SessionManager {
    transport: Arc<dyn ChannelTransport>,
    viewer_id: Uuid,
    inbound_tx: UnboundedSender<InboundEvent>,
    current: Option<ChannelSession>,
    dispatch: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        viewer_id: Uuid,
        inbound_tx: UnboundedSender<InboundEvent>,
    ) -> Self {
        Self {
            transport,
            viewer_id,
            inbound_tx,
            current: None,
            dispatch: None,
        }
    }

    /// Connect to `broadcast_id`'s topic. No-op when already connected to
    /// it; otherwise the current session is deactivated first. On subscribe
    /// failure the manager stays disconnected.
    pub async fn activate(&mut self, broadcast_id: Uuid) -> EngineResult<SessionId> {
        if let Some(current) = &self.current {
            if current.broadcast_id == broadcast_id && current.state == ConnectionState::Connected {
                return Ok(current.id);
            }
        }

        self.deactivate().await;

        let id = SessionId::new();
        let topic = topic_for(broadcast_id);
        self.current = Some(ChannelSession {
            id,
            broadcast_id,
            state: ConnectionState::Connecting,
        });

        let subscription = match self.transport.subscribe(&topic).await {
            Ok(sub) => sub,
            Err(e) => {
                tracing::warn!(%broadcast_id, error = %e, "channel subscribe failed");
                self.current = None;
                return Err(e);
            }
        };

        // Presence announce once the subscribe handshake completed.
        if let Err(e) = self.transport.announce_presence(&topic, self.viewer_id).await {
            tracing::warn!(%broadcast_id, error = %e, "presence announce failed");
        }

        let inbound_tx = self.inbound_tx.clone();
        let mut receiver = subscription.receiver;
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => {
                        if let Some(event) = events::decode(&payload) {
                            let inbound = InboundEvent {
                                session_id: id,
                                broadcast_id,
                                event,
                            };
                            if inbound_tx.send(inbound).is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%broadcast_id, skipped, "channel receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        self.dispatch = Some(handle);

        if let Some(current) = &mut self.current {
            current.state = ConnectionState::Connected;
        }
        tracing::debug!(%broadcast_id, "channel session connected");
        Ok(id)
    }

    /// Unsubscribe and release the dispatch task. Idempotent. Presence is
    /// revoked while our receiver is still registered so the transport can
    /// tell an abandoned topic from one mid-handover.
    pub async fn deactivate(&mut self) {
        if let Some(session) = self.current.take() {
            let topic = topic_for(session.broadcast_id);
            if let Err(e) = self.transport.revoke_presence(&topic, self.viewer_id).await {
                tracing::debug!(error = %e, "presence revoke failed during deactivate");
            }
            tracing::debug!(broadcast_id = %session.broadcast_id, "channel session disconnected");
        }

        if let Some(handle) = self.dispatch.take() {
            handle.abort();
        }
    }

    /// Fire-and-forget publish on the active topic. Sends while disconnected
    /// are dropped, not queued.
    pub async fn send(&self, event: &ChannelEvent) {
        let Some(session) = self
            .current
            .as_ref()
            .filter(|s| s.state == ConnectionState::Connected)
        else {
            tracing::debug!("send while disconnected, event dropped");
            return;
        };

        let payload = match events::encode(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode outbound event");
                return;
            }
        };

        let topic = topic_for(session.broadcast_id);
        if let Err(e) = self.transport.publish(&topic, payload).await {
            tracing::warn!(error = %e, "publish failed, event dropped");
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.current
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Stale-event guard: only events from the current session are applied.
    pub fn is_current(&self, session_id: SessionId) -> bool {
        self.current.as_ref().map(|s| s.id) == Some(session_id)
    }

    pub fn current_broadcast(&self) -> Option<Uuid> {
        self.current.as_ref().map(|s| s.broadcast_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;
    use tokio::sync::mpsc::unbounded_channel;

    fn manager(transport: Arc<InMemoryTransport>) -> (SessionManager, tokio::sync::mpsc::UnboundedReceiver<InboundEvent>) {
        let (tx, rx) = unbounded_channel();
        (SessionManager::new(transport, Uuid::new_v4(), tx), rx)
    }

    #[tokio::test]
    async fn activate_is_noop_when_already_connected() {
        let transport = Arc::new(InMemoryTransport::new());
        let (mut sessions, _rx) = manager(transport);
        let broadcast_id = Uuid::new_v4();

        let first = sessions.activate(broadcast_id).await.expect("activate");
        let second = sessions.activate(broadcast_id).await.expect("activate");
        assert_eq!(first, second);
        assert!(sessions.is_connected());
    }

    #[tokio::test]
    async fn switching_broadcasts_moves_presence() {
        let transport = Arc::new(InMemoryTransport::new());
        let (mut sessions, _rx) = manager(Arc::clone(&transport));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let session_a = sessions.activate(a).await.expect("activate a");
        assert_eq!(transport.presence_count(&topic_for(a)).await, 1);

        let session_b = sessions.activate(b).await.expect("activate b");
        assert_ne!(session_a, session_b);
        assert_eq!(transport.presence_count(&topic_for(a)).await, 0);
        assert_eq!(transport.presence_count(&topic_for(b)).await, 1);
        assert_eq!(sessions.current_broadcast(), Some(b));
        assert!(!sessions.is_current(session_a));
        assert!(sessions.is_current(session_b));
    }

    #[tokio::test]
    async fn deactivate_is_idempotent() {
        let transport = Arc::new(InMemoryTransport::new());
        let (mut sessions, _rx) = manager(transport);

        sessions.activate(Uuid::new_v4()).await.expect("activate");
        sessions.deactivate().await;
        sessions.deactivate().await;
        assert_eq!(sessions.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn send_while_disconnected_is_dropped() {
        let transport = Arc::new(InMemoryTransport::new());
        let broadcast_id = Uuid::new_v4();
        let topic = topic_for(broadcast_id);
        let mut observer = transport.subscribe(&topic).await.expect("subscribe");

        let (sessions, _rx) = manager(Arc::clone(&transport));
        sessions
            .send(&ChannelEvent::Like {
                sender_id: Uuid::new_v4(),
            })
            .await;

        assert!(observer.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn inbound_events_are_tagged_with_session_id() {
        let transport = Arc::new(InMemoryTransport::new());
        let (mut sessions, mut rx) = manager(Arc::clone(&transport));
        let broadcast_id = Uuid::new_v4();

        let session_id = sessions.activate(broadcast_id).await.expect("activate");

        // Drain the presence event from our own announce.
        let presence = rx.recv().await.expect("presence event");
        assert!(matches!(presence.event, ChannelEvent::Presence { .. }));

        transport
            .publish(
                &topic_for(broadcast_id),
                events::encode(&ChannelEvent::Like {
                    sender_id: Uuid::new_v4(),
                })
                .unwrap(),
            )
            .await
            .expect("publish");

        let inbound = rx.recv().await.expect("like event");
        assert_eq!(inbound.session_id, session_id);
        assert_eq!(inbound.broadcast_id, broadcast_id);
        assert!(matches!(inbound.event, ChannelEvent::Like { .. }));
    }
}
