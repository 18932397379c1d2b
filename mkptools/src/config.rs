use std::env;

use log::*;
use marketplace_engine::{db_url, SettlementConfig};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct ToolsConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub settlement: SettlementConfig,
}

impl ToolsConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = db_url();
        let max_connections = env::var("MKP_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| match s.parse::<u32>() {
                Ok(0) | Err(_) => {
                    warn!("🪛️ Invalid value for MKP_MAX_CONNECTIONS ({s}). Using {DEFAULT_MAX_CONNECTIONS}.");
                    None
                },
                Ok(n) => Some(n),
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let settlement = SettlementConfig::from_env_or_default();
        Self { database_url, max_connections, settlement }
    }
}
