use dotenvy::dotenv;
use std::env;

/// Engine tunables. All durations are milliseconds so the same value can
/// feed both tokio timeouts and chrono expiry arithmetic.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chat entries retained in memory per broadcast.
    pub chat_retention: usize,
    /// Chat entries handed to the UI (newest first).
    pub chat_rendered: usize,
    /// Visible fraction a slot must cross to become the active index.
    pub visibility_threshold: f32,
    /// Delay before battle mode is inferred from the broadcast category
    /// when no explicit battle_started signal arrives.
    pub battle_grace_ms: u64,
    /// Budget for the directory fetch before degrading to an empty list.
    pub directory_timeout_ms: u64,
    /// Budget for the wallet balance refresh before keeping the cached value.
    pub wallet_timeout_ms: u64,
    /// Lifetime of the transient like affordance.
    pub like_affordance_ttl_ms: u64,
    /// Lifetime of the transient gift affordance.
    pub gift_affordance_ttl_ms: u64,
    /// Battle score contributed per gift coin of unit value.
    pub gift_battle_multiplier: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chat_retention: 50,
            chat_rendered: 15,
            visibility_threshold: 0.6,
            battle_grace_ms: 3000,
            directory_timeout_ms: 2000,
            wallet_timeout_ms: 2000,
            like_affordance_ttl_ms: 1000,
            gift_affordance_ttl_ms: 2000,
            gift_battle_multiplier: 10,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            chat_retention: env_parse("LIVE_CHAT_RETENTION", defaults.chat_retention),
            chat_rendered: env_parse("LIVE_CHAT_RENDERED", defaults.chat_rendered),
            visibility_threshold: env_parse(
                "LIVE_VISIBILITY_THRESHOLD",
                defaults.visibility_threshold,
            ),
            battle_grace_ms: env_parse("LIVE_BATTLE_GRACE_MS", defaults.battle_grace_ms),
            directory_timeout_ms: env_parse(
                "LIVE_DIRECTORY_TIMEOUT_MS",
                defaults.directory_timeout_ms,
            ),
            wallet_timeout_ms: env_parse("LIVE_WALLET_TIMEOUT_MS", defaults.wallet_timeout_ms),
            like_affordance_ttl_ms: env_parse(
                "LIVE_LIKE_AFFORDANCE_TTL_MS",
                defaults.like_affordance_ttl_ms,
            ),
            gift_affordance_ttl_ms: env_parse(
                "LIVE_GIFT_AFFORDANCE_TTL_MS",
                defaults.gift_affordance_ttl_ms,
            ),
            gift_battle_multiplier: env_parse(
                "LIVE_GIFT_BATTLE_MULTIPLIER",
                defaults.gift_battle_multiplier,
            ),
        }
    }
}
