use anyhow::{bail, Context, Result};
use std::path::PathBuf;

// ============================================================================
// Process Configuration
// ============================================================================
//
// Read once at startup from environment variables. Notification settings are
// not part of this: they live in the settings store and are reloaded per send.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub scylla_node: String,
    pub scylla_keyspace: String,
    pub http_port: u16,
    pub settings_path: Option<PathBuf>,
    /// JSON file of stock levels and promo codes applied at startup
    pub catalog_seed_path: Option<PathBuf>,
    pub order_code_prefix: String,
    pub refund_code_prefix: String,
    pub storefront_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            scylla_node: "127.0.0.1:9042".to_string(),
            scylla_keyspace: "storefront_ks".to_string(),
            http_port: 8080,
            settings_path: None,
            catalog_seed_path: None,
            order_code_prefix: "DB".to_string(),
            refund_code_prefix: "RF".to_string(),
            storefront_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(backend) = get("STORE_BACKEND") {
            config.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "scylla" | "scylladb" => StoreBackend::Scylla,
                other => bail!("STORE_BACKEND must be 'memory' or 'scylla', got '{}'", other),
            };
        }
        if let Some(node) = get("SCYLLA_NODE") {
            config.scylla_node = node;
        }
        if let Some(keyspace) = get("SCYLLA_KEYSPACE") {
            config.scylla_keyspace = keyspace;
        }
        if let Some(port) = get("HTTP_PORT") {
            config.http_port = port
                .parse()
                .with_context(|| format!("HTTP_PORT is not a valid port: {}", port))?;
        }
        config.settings_path = get("SETTINGS_PATH").map(PathBuf::from);
        config.catalog_seed_path = get("CATALOG_SEED_PATH").map(PathBuf::from);
        if let Some(prefix) = get("ORDER_CODE_PREFIX") {
            config.order_code_prefix = prefix;
        }
        if let Some(prefix) = get("REFUND_CODE_PREFIX") {
            config.refund_code_prefix = prefix;
        }
        if let Some(url) = get("STOREFRONT_URL") {
            config.storefront_url = url;
        }

        Ok(config)
    }
}
