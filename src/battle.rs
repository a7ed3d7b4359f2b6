//! Battle scoring
//!
//! Head-to-head contest layered over a broadcast's like/gift stream. Local
//! viewer actions score for the left side, remote channel events for the
//! right. Scores are monotone non-decreasing for the lifetime of a battle
//! and live in memory only.
//!
//! Entry is an explicit `battle_started` signal when the backend emits one.
//! For broadcasts that only declare the battle category, a grace deadline is
//! armed on activation and promotes the state once it fires; an explicit
//! signal arriving first supersedes it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::EventOrigin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum BattleState {
    Inactive,
    Active { left: u64, right: u64 },
}

#[derive(Debug, Clone)]
pub struct BattleEngine {
    state: BattleState,
    grace_deadline: Option<DateTime<Utc>>,
}

impl Default for BattleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleEngine {
    pub fn new() -> Self {
        Self {
            state: BattleState::Inactive,
            grace_deadline: None,
        }
    }

    /// Arm the category-inference stopgap: the battle starts when `deadline`
    /// passes unless an explicit signal lands first.
    pub fn arm_grace(&mut self, deadline: DateTime<Utc>) {
        if self.state == BattleState::Inactive {
            self.grace_deadline = Some(deadline);
        }
    }

    /// Promote an armed grace deadline that has expired.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let Some(deadline) = self.grace_deadline {
            if now >= deadline && self.state == BattleState::Inactive {
                tracing::debug!("battle inferred from category after grace delay");
                self.start();
            }
        }
    }

    /// Explicit battle start. Resets both scores; a new battle session is
    /// the only thing that ever resets them.
    pub fn start(&mut self) {
        self.grace_deadline = None;
        self.state = BattleState::Active { left: 0, right: 0 };
    }

    /// External end signal from the host. The engine never originates this.
    pub fn end(&mut self) {
        self.grace_deadline = None;
        self.state = BattleState::Inactive;
    }

    /// Record a verified like/gift contribution. No-op while inactive.
    /// Scores saturate at `u64::MAX` so an oversized remote value cannot
    /// wrap them backwards.
    pub fn record(&mut self, origin: EventOrigin, value: u64) {
        if let BattleState::Active { left, right } = &mut self.state {
            match origin {
                EventOrigin::Local => *left = left.saturating_add(value),
                EventOrigin::Remote => *right = right.saturating_add(value),
            }
        }
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BattleState::Active { .. })
    }

    pub fn scores(&self) -> Option<(u64, u64)> {
        match self.state {
            BattleState::Active { left, right } => Some((left, right)),
            BattleState::Inactive => None,
        }
    }
}
