use chrono::{DateTime, Utc};
use serde::Serialize;

/// Locally cached coin balance.
///
/// Advisory only: it gates the "can afford this gift" decision before a gift
/// event is emitted. Settlement authority belongs to the external wallet
/// ledger; a later sync legitimately overwrites any optimistic local debit
/// (last write wins).
#[derive(Debug, Clone, Serialize)]
pub struct WalletSnapshot {
    pub coins: u64,
    pub updated_at: DateTime<Utc>,
}

impl WalletSnapshot {
    pub fn new(coins: u64) -> Self {
        Self {
            coins,
            updated_at: Utc::now(),
        }
    }

    pub fn can_afford(&self, price: u64) -> bool {
        self.coins >= price
    }

    /// Optimistic local debit after a gift send.
    pub fn debit(&mut self, amount: u64) {
        self.coins = self.coins.saturating_sub(amount);
        self.updated_at = Utc::now();
    }

    /// Overwrite with an authoritative balance from the wallet ledger.
    pub fn apply_sync(&mut self, coins: u64) {
        self.coins = coins;
        self.updated_at = Utc::now();
    }
}
