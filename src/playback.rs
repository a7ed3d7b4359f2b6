//! Playback source fallback
//!
//! Per broadcast-activation: primary source, then the single fallback, then
//! a terminal unavailable state. The transition is one-way within one
//! activation cycle; re-activating the same broadcast resets to primary.

use serde::Serialize;

use crate::models::Broadcast;

/// Mandatory user-facing text for the terminal state.
pub const UNAVAILABLE_MESSAGE: &str = "This stream is currently unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Primary,
    Fallback,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct PlaybackFallback {
    state: PlaybackState,
}

impl Default for PlaybackFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackFallback {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Primary,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Source URI for the current tier, or `None` once unavailable.
    pub fn current_source<'a>(&self, broadcast: &'a Broadcast) -> Option<&'a str> {
        match self.state {
            PlaybackState::Primary => Some(broadcast.media_url.as_str()),
            PlaybackState::Fallback => broadcast.fallback_media_url.as_deref(),
            PlaybackState::Unavailable => None,
        }
    }

    /// React to a playback error on the current source. Never attempts a
    /// third source.
    pub fn on_error(&mut self, broadcast: &Broadcast) -> PlaybackState {
        self.state = match self.state {
            PlaybackState::Primary if broadcast.fallback_media_url.is_some() => {
                tracing::debug!(broadcast_id = %broadcast.id, "primary source failed, switching to fallback");
                PlaybackState::Fallback
            }
            PlaybackState::Primary | PlaybackState::Fallback => {
                tracing::warn!(broadcast_id = %broadcast.id, "playback unavailable");
                PlaybackState::Unavailable
            }
            PlaybackState::Unavailable => PlaybackState::Unavailable,
        };
        self.state
    }

    /// New activation cycle: start from the primary source again.
    pub fn reset(&mut self) {
        self.state = PlaybackState::Primary;
    }
}
