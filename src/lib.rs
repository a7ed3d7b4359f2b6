//! Live interaction engine
//!
//! The realtime core of a social video client: discovers active broadcasts,
//! keeps exactly one channel session connected as the viewer scrolls, merges
//! heterogeneous channel events (chat, likes, gifts, product pins, presence)
//! into a bounded per-broadcast view model, and drives battle scoring and
//! the gifting economy on top of that stream.

pub mod battle;
pub mod chat_log;
pub mod collaborators;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
pub mod gifting;
pub mod logging;
pub mod merger;
pub mod models;
pub mod playback;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use battle::{BattleEngine, BattleState};
pub use chat_log::{ChatEntry, ChatEntryKind, ChatLog};
pub use collaborators::{AuthGate, UserDirectory, WalletLedger};
pub use config::EngineConfig;
pub use directory::{BroadcastDirectory, HttpBroadcastDirectory};
pub use engine::{EngineSignal, LiveEngine};
pub use error::{EngineError, EngineResult};
pub use events::{ChannelEvent, EventOrigin};
pub use gifting::GiftCatalog;
pub use merger::{BroadcastSnapshot, BroadcastViewModel};
pub use models::{Broadcast, BroadcastCategory, CreatorInfo, GiftItem, PinnedProduct, WalletSnapshot};
pub use playback::{PlaybackFallback, PlaybackState};
pub use scheduler::ViewportScheduler;
pub use session::{ConnectionState, SessionId, SessionManager};
pub use transport::{ChannelTransport, InMemoryTransport};
