//! Settlement configuration.
//!
//! All values are read from environment variables by [`SettlementConfig::from_env_or_default`]. Invalid values are
//! logged and replaced with the default, so a typo never prevents the engine from starting.
//!
//! | variable                    | meaning                                             | default |
//! |-----------------------------|-----------------------------------------------------|---------|
//! | `MKP_LOCK_WAIT_MS`          | How long settlement waits to acquire the write lock | 5000    |
//! | `MKP_SETTLEMENT_TIMEOUT_MS` | Overall budget for one settlement transaction      | 15000   |
//! | `MKP_PLATFORM_ACCOUNT_ID`   | User id of the admin account that receives fees     | unset   |
use std::{env, time::Duration};

use log::*;

use crate::db_types::UserId;

pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementConfig {
    /// Maximum time to wait for the database write lock before giving up with a lock-wait timeout.
    pub lock_wait: Duration,
    /// Maximum time a single settlement may run before it is aborted and rolled back.
    pub execution_timeout: Duration,
    /// The admin account that receives platform fees. When unset, the admin user with the lowest id is used.
    pub platform_account: Option<UserId>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { lock_wait: DEFAULT_LOCK_WAIT, execution_timeout: DEFAULT_SETTLEMENT_TIMEOUT, platform_account: None }
    }
}

impl SettlementConfig {
    pub fn from_env_or_default() -> Self {
        let lock_wait = parse_duration_ms("MKP_LOCK_WAIT_MS", env::var("MKP_LOCK_WAIT_MS").ok(), DEFAULT_LOCK_WAIT);
        let execution_timeout = parse_duration_ms(
            "MKP_SETTLEMENT_TIMEOUT_MS",
            env::var("MKP_SETTLEMENT_TIMEOUT_MS").ok(),
            DEFAULT_SETTLEMENT_TIMEOUT,
        );
        let platform_account = parse_platform_account(env::var("MKP_PLATFORM_ACCOUNT_ID").ok());
        Self { lock_wait, execution_timeout, platform_account }
    }

    pub fn with_lock_wait(mut self, lock_wait: Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub fn with_platform_account(mut self, user_id: UserId) -> Self {
        self.platform_account = Some(user_id);
        self
    }
}

fn parse_duration_ms(name: &str, value: Option<String>, default: Duration) -> Duration {
    let Some(value) = value else {
        info!("🪛️ {name} is not set. Using the default value of {}ms.", default.as_millis());
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(0) => {
            warn!("🪛️ {name} cannot be zero. Using the default value of {}ms.", default.as_millis());
            default
        },
        Ok(ms) => Duration::from_millis(ms),
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name} ({value}). {e}. Using {}ms.", default.as_millis());
            default
        },
    }
}

fn parse_platform_account(value: Option<String>) -> Option<UserId> {
    let value = value?;
    match value.parse::<UserId>() {
        Ok(id) => {
            info!("🪛️ Platform fees will be credited to user {id}");
            Some(id)
        },
        Err(e) => {
            error!("🪛️ MKP_PLATFORM_ACCOUNT_ID is invalid. {e}. Falling back to the first admin account.");
            None
        },
    }
}
