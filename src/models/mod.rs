//! Data model for the live interaction engine
//!
//! Broadcasts and their collaborators (hosts, gifts, pinned products) plus
//! the viewer's advisory wallet snapshot.

pub mod broadcast;
pub mod gift;
pub mod wallet;

pub use broadcast::{Broadcast, BroadcastCategory, CreatorInfo, PinnedProduct};
pub use gift::GiftItem;
pub use wallet::WalletSnapshot;
