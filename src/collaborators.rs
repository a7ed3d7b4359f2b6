//! External collaborator seams
//!
//! The engine treats authentication, the authoritative wallet ledger and the
//! user directory as injected trait objects. Implementations live with the
//! embedder (gRPC/HTTP clients in production, mocks in tests).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::CreatorInfo;

/// Auth gate. Gated actions are deferred (signalled to the UI) when no
/// session is authenticated, not failed.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn is_authenticated(&self) -> bool;
}

/// Authoritative balance and debit RPC. The engine's local decrement is
/// advisory only; this ledger settles.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    async fn balance(&self) -> EngineResult<u64>;
    async fn debit(&self, amount: u64, reason: &str) -> EngineResult<u64>;
}

/// Resolves display identities and carries the follow action.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, user_id: Uuid) -> EngineResult<CreatorInfo>;
    async fn follow(&self, host_id: Uuid) -> EngineResult<()>;
}
