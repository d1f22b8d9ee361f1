/// Which fallbacks are acceptable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    /// Adapters without a configured endpoint fall back to deterministic
    /// in-memory behavior.
    #[default]
    Development,
    /// Every adapter must have a real endpoint; missing configuration is an
    /// error, never a silent fallback.
    Production,
}

/// Explicit adapter wiring, passed in rather than read from globals.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub gateway_base_url: Option<String>,
    pub gateway_timeout_ms: u64,
    pub wallet_bridge_url: Option<String>,
    pub faucet_url: Option<String>,
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        let profile = match std::env::var("LEDGERPAY_PROFILE").ok().as_deref() {
            Some("production") => RuntimeProfile::Production,
            _ => RuntimeProfile::Development,
        };
        Self {
            runtime_profile: profile,
            gateway_base_url: std::env::var("LEDGERPAY_GATEWAY_URL").ok(),
            gateway_timeout_ms: std::env::var("LEDGERPAY_GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_MS),
            wallet_bridge_url: std::env::var("LEDGERPAY_BRIDGE_URL").ok(),
            faucet_url: std::env::var("LEDGERPAY_FAUCET_URL").ok(),
        }
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn gateway_timeout_ms(&self) -> u64 {
        if self.gateway_timeout_ms == 0 {
            DEFAULT_GATEWAY_TIMEOUT_MS
        } else {
            self.gateway_timeout_ms
        }
    }
}

pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 15_000;
