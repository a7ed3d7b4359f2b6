//! Live engine orchestrator
//!
//! Ties discovery, the viewport scheduler, the single channel session, the
//! event merger, battles, gifting and playback fallback into one owned state
//! machine. All mutation happens through `&mut LiveEngine` on one logical
//! task; session dispatch tasks only forward decoded events into the inbound
//! channel drained by [`LiveEngine::pump`].

use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use uuid::Uuid;

use crate::collaborators::{AuthGate, UserDirectory, WalletLedger};
use crate::config::EngineConfig;
use crate::directory::{self, BroadcastDirectory};
use crate::error::{EngineError, EngineResult};
use crate::events::{ChannelEvent, EventOrigin};
use crate::gifting::{self, GiftCatalog};
use crate::merger::{BroadcastSnapshot, BroadcastViewModel};
use crate::models::{Broadcast, CreatorInfo, WalletSnapshot};
use crate::playback::PlaybackState;
use crate::scheduler::ViewportScheduler;
use crate::session::{ConnectionState, InboundEvent, SessionManager};
use crate::transport::ChannelTransport;

/// Outbound notifications for the surrounding UI, drained alongside
/// snapshots. Failure paths resolve to these instead of errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    /// A gated action was attempted without an authenticated session.
    LoginRequired,
    /// Gift blocked on balance; the UI should open the recharge flow.
    RechargeRequired { balance: u64, price: u64 },
    /// Both playback sources failed; show the unavailable placeholder.
    PlaybackUnavailable { broadcast_id: Uuid },
}

pub struct LiveEngine {
    config: EngineConfig,
    directory: Arc<dyn BroadcastDirectory>,
    auth: Arc<dyn AuthGate>,
    wallet_ledger: Arc<dyn WalletLedger>,
    users: Arc<dyn UserDirectory>,

    sessions: SessionManager,
    scheduler: ViewportScheduler,
    broadcasts: Vec<Broadcast>,
    view_models: HashMap<Uuid, BroadcastViewModel>,
    wallet: WalletSnapshot,
    catalog: GiftCatalog,
    viewer: CreatorInfo,

    inbound_rx: UnboundedReceiver<InboundEvent>,
    signals: VecDeque<EngineSignal>,
}

impl LiveEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn BroadcastDirectory>,
        transport: Arc<dyn ChannelTransport>,
        auth: Arc<dyn AuthGate>,
        wallet_ledger: Arc<dyn WalletLedger>,
        users: Arc<dyn UserDirectory>,
        viewer: CreatorInfo,
        catalog: GiftCatalog,
    ) -> Self {
        let (inbound_tx, inbound_rx) = unbounded_channel();
        let sessions = SessionManager::new(transport, viewer.id, inbound_tx);
        let scheduler = ViewportScheduler::new(config.visibility_threshold);

        Self {
            config,
            directory,
            auth,
            wallet_ledger,
            users,
            sessions,
            scheduler,
            broadcasts: Vec::new(),
            view_models: HashMap::new(),
            wallet: WalletSnapshot::new(0),
            catalog,
            viewer,
            inbound_rx,
            signals: VecDeque::new(),
        }
    }

    /// Fetch the active broadcast list, seed view models, and connect to the
    /// broadcast at the initial active index. A directory failure presents
    /// zero broadcasts, never an error.
    pub async fn load_broadcasts(&mut self) -> &[Broadcast] {
        let broadcasts =
            directory::list_active_or_empty(self.directory.as_ref(), self.config.directory_timeout_ms)
                .await;

        self.scheduler.reset();
        for broadcast in &broadcasts {
            self.view_models
                .entry(broadcast.id)
                .or_insert_with(|| BroadcastViewModel::seeded_from(broadcast, &self.config));
        }
        self.broadcasts = broadcasts;

        if !self.broadcasts.is_empty() {
            self.activate_index(0).await;
        }
        &self.broadcasts
    }

    /// Feed one slot visibility event from the scrolling list. A change of
    /// active index deactivates the previous slot's session before the new
    /// one connects.
    pub async fn on_visibility(&mut self, slot: usize, visible_fraction: f32) {
        if let Some(index) = self.scheduler.observe(slot, visible_fraction) {
            self.activate_index(index).await;
        }
    }

    async fn activate_index(&mut self, index: usize) {
        let Some(broadcast) = self.broadcasts.get(index) else {
            return;
        };
        let broadcast_id = broadcast.id;
        let is_battle = broadcast.is_battle();

        if let Some(previous) = self.sessions.current_broadcast() {
            if previous == broadcast_id && self.sessions.is_connected() {
                return;
            }
            self.sessions.deactivate().await;
            // Battle scores do not survive the end of a session.
            if let Some(vm) = self.view_models.get_mut(&previous) {
                vm.battle.end();
            }
        }

        match self.sessions.activate(broadcast_id).await {
            Ok(_) => {
                if let Some(vm) = self.view_models.get_mut(&broadcast_id) {
                    vm.playback.reset();
                    if is_battle {
                        vm.battle.arm_grace(
                            Utc::now()
                                + ChronoDuration::milliseconds(self.config.battle_grace_ms as i64),
                        );
                    }
                }
            }
            Err(e) => {
                // Degraded but not fatal; scrolling back re-activates.
                tracing::warn!(%broadcast_id, error = %e, "activation failed, staying disconnected");
            }
        }
    }

    /// Drain inbound channel events into the view models and advance
    /// time-based state (battle grace, affordance expiry). Call from the UI
    /// frame loop or a timer.
    pub fn pump(&mut self) {
        while let Ok(inbound) = self.inbound_rx.try_recv() {
            self.handle_inbound(inbound);
        }

        // Affordances on background broadcasts expire too; their snapshots
        // stay queryable while another slot is connected.
        let now = Utc::now();
        for vm in self.view_models.values_mut() {
            vm.battle.tick(now);
            vm.prune_expired(now);
        }
    }

    fn handle_inbound(&mut self, inbound: InboundEvent) {
        // Events from a session being torn down are discarded by identity.
        if !self.sessions.is_current(inbound.session_id) {
            tracing::debug!(broadcast_id = %inbound.broadcast_id, "discarding event from stale session");
            return;
        }

        // Transport echo of our own sends was already applied locally.
        if inbound.event.sender_id() == Some(self.viewer.id) {
            return;
        }

        if let Some(vm) = self.view_models.get_mut(&inbound.broadcast_id) {
            vm.apply(&inbound.event, EventOrigin::Remote, Utc::now(), &self.config);
        }
    }

    fn apply_local(&mut self, event: &ChannelEvent) {
        let Some(broadcast_id) = self.sessions.current_broadcast() else {
            return;
        };
        if let Some(vm) = self.view_models.get_mut(&broadcast_id) {
            vm.apply(event, EventOrigin::Local, Utc::now(), &self.config);
        }
    }

    /// Publish a chat message on the active channel. Dropped silently while
    /// disconnected.
    pub async fn send_chat(&mut self, text: impl Into<String>) {
        if !self.sessions.is_connected() {
            tracing::debug!("chat send while disconnected, dropped");
            return;
        }
        let event = ChannelEvent::Chat {
            sender_id: self.viewer.id,
            sender_name: self.viewer.username.clone(),
            privileged: false,
            text: text.into(),
        };
        self.sessions.send(&event).await;
        self.apply_local(&event);
    }

    /// Publish a like. Counts toward the left battle side locally.
    pub async fn send_like(&mut self) {
        if !self.sessions.is_connected() {
            tracing::debug!("like send while disconnected, dropped");
            return;
        }
        let event = ChannelEvent::Like {
            sender_id: self.viewer.id,
        };
        self.sessions.send(&event).await;
        self.apply_local(&event);
    }

    /// Send a gift on the active channel.
    ///
    /// The local debit is optimistic: the authoritative ledger call runs in
    /// the background and a later wallet sync may overwrite the snapshot
    /// (last write wins). When the viewer cannot afford the gift nothing is
    /// emitted and a recharge signal is raised instead.
    pub async fn send_gift(&mut self, gift_id: &str) -> EngineResult<()> {
        if !self.auth.is_authenticated().await {
            tracing::debug!("gift send deferred, no authenticated session");
            self.signals.push_back(EngineSignal::LoginRequired);
            return Ok(());
        }

        let gift = self
            .catalog
            .get(gift_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownGift(gift_id.to_string()))?;

        if !gifting::can_afford(self.wallet.coins, gift.coin_price) {
            self.signals.push_back(EngineSignal::RechargeRequired {
                balance: self.wallet.coins,
                price: gift.coin_price,
            });
            return Err(EngineError::InsufficientBalance {
                balance: self.wallet.coins,
                price: gift.coin_price,
            });
        }

        if !self.sessions.is_connected() {
            tracing::debug!("gift send while disconnected, dropped");
            return Ok(());
        }

        self.wallet.debit(gift.coin_price);

        let ledger = Arc::clone(&self.wallet_ledger);
        let price = gift.coin_price;
        tokio::spawn(async move {
            if let Err(e) = ledger.debit(price, "gift").await {
                tracing::warn!(error = %e, "wallet ledger debit failed, awaiting sync");
            }
        });

        let event = ChannelEvent::Gift {
            sender_id: self.viewer.id,
            sender_name: self.viewer.username.clone(),
            gift_id: gift.id.clone(),
            unit_value: gift.coin_price,
            emoji: gift.emoji.clone(),
        };
        self.sessions.send(&event).await;
        // Immediate local feedback; the sender does not wait for its echo.
        self.apply_local(&event);
        Ok(())
    }

    /// Follow the host. Fire-and-forget behind the auth gate.
    pub async fn follow(&mut self, host_id: Uuid) {
        if !self.auth.is_authenticated().await {
            self.signals.push_back(EngineSignal::LoginRequired);
            return;
        }
        let users = Arc::clone(&self.users);
        tokio::spawn(async move {
            if let Err(e) = users.follow(host_id).await {
                tracing::warn!(%host_id, error = %e, "follow request failed");
            }
        });
    }

    /// Refresh the wallet snapshot from the ledger, racing a fixed budget.
    /// On failure or timeout the cached snapshot stands.
    pub async fn refresh_wallet(&mut self) {
        match tokio::time::timeout(
            Duration::from_millis(self.config.wallet_timeout_ms),
            self.wallet_ledger.balance(),
        )
        .await
        {
            Ok(Ok(balance)) => self.wallet.apply_sync(balance),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "wallet refresh failed, keeping cached snapshot")
            }
            Err(_) => tracing::warn!("wallet refresh timed out, keeping cached snapshot"),
        }
    }

    /// Authoritative balance pushed by the wallet collaborator. Last write
    /// wins over any optimistic debit.
    pub fn apply_wallet_sync(&mut self, coins: u64) {
        self.wallet.apply_sync(coins);
    }

    /// Playback error reported by the player for `broadcast_id`.
    pub fn on_playback_error(&mut self, broadcast_id: Uuid) {
        let Some(broadcast) = self
            .broadcasts
            .iter()
            .find(|b| b.id == broadcast_id)
            .cloned()
        else {
            return;
        };

        if let Some(vm) = self.view_models.get_mut(&broadcast_id) {
            if vm.playback.on_error(&broadcast) == PlaybackState::Unavailable {
                self.signals
                    .push_back(EngineSignal::PlaybackUnavailable { broadcast_id });
            }
        }
    }

    /// Incrementally updated view model for one broadcast.
    pub fn snapshot(&self, broadcast_id: Uuid) -> Option<BroadcastSnapshot> {
        let vm = self.view_models.get(&broadcast_id)?;
        let connection = if self.sessions.current_broadcast() == Some(broadcast_id) {
            self.sessions.state()
        } else {
            ConnectionState::Disconnected
        };
        Some(vm.snapshot(connection))
    }

    /// Snapshot of the broadcast at the current active index.
    pub fn active_snapshot(&self) -> Option<BroadcastSnapshot> {
        let broadcast = self.broadcasts.get(self.scheduler.active_index())?;
        self.snapshot(broadcast.id)
    }

    pub fn active_index(&self) -> usize {
        self.scheduler.active_index()
    }

    pub fn broadcasts(&self) -> &[Broadcast] {
        &self.broadcasts
    }

    pub fn wallet(&self) -> &WalletSnapshot {
        &self.wallet
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sessions.state()
    }

    pub fn drain_signals(&mut self) -> Vec<EngineSignal> {
        self.signals.drain(..).collect()
    }
}
