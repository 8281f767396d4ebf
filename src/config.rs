//! Configuration module for castbot
//!
//! Configuration is loaded from a TOML file, then selected values are
//! overridden from the environment (after loading `.env`). Secrets such as
//! the session key are expected to come from the environment.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Environment variable overriding `wallet.session_key`
pub const ENV_SESSION_KEY: &str = "CASTBOT_SESSION_KEY";
/// Environment variable overriding `wallet.owner`
pub const ENV_OWNER: &str = "CASTBOT_OWNER";
/// Environment variable overriding `rpc.endpoint`
pub const ENV_RPC_URL: &str = "CASTBOT_RPC_URL";
/// Environment variable overriding `program.tx_template`
pub const ENV_TX_TEMPLATE: &str = "CASTBOT_TX_TEMPLATE";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,

    pub wallet: WalletConfig,

    pub program: ProgramConfig,

    #[serde(default)]
    pub cast: CastConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint used for account reads and chain tip
    pub endpoint: String,

    /// Request timeout in seconds, shared by all HTTP collaborators
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base58 session keypair; prefer setting it through the environment
    #[serde(default)]
    pub session_key: Option<String>,

    /// Alternative to `session_key`: keypair file (raw or JSON array)
    #[serde(default)]
    pub keypair_path: Option<String>,

    /// Main wallet that owns the player account
    pub owner: String,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("session_key", &self.session_key.as_ref().map(|_| "<redacted>"))
            .field("keypair_path", &self.keypair_path)
            .field("owner", &self.owner)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Fishing program id
    #[serde(default = "default_program_id")]
    pub program_id: String,

    #[serde(default = "default_capability_url")]
    pub capability_url: String,

    #[serde(default = "default_paymaster_url")]
    pub paymaster_url: String,

    #[serde(default = "default_requested_modes")]
    pub requested_modes: u8,

    /// Base64 wire-format transaction template
    #[serde(default)]
    pub tx_template: Option<String>,

    /// Alternative to `tx_template`: file holding the base64 template
    #[serde(default)]
    pub tx_template_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastConfig {
    /// Delay between consecutive attempts
    #[serde(default = "default_cast_interval")]
    pub interval_ms: u64,

    /// Stop after this many attempts (0 = run until interrupted)
    #[serde(default)]
    pub max_casts: u64,

    /// Number of confirmation polls per attempt
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,

    /// Sleep before each confirmation poll
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_rpc_timeout() -> u64 { 30 }
fn default_program_id() -> String { "SEAyjT1FUx3JyXJnWt5NtjELDwuU9XsoZeZVPVvweU4".to_string() }
fn default_capability_url() -> String { "https://cast.fogofishing.com/capability".to_string() }
fn default_paymaster_url() -> String {
    "https://mainnet.fogo-paymaster.xyz/api/sponsor_and_send?domain=https%3A%2F%2Ffogofishing.com".to_string()
}
fn default_requested_modes() -> u8 { 3 }
fn default_cast_interval() -> u64 { 3000 }
fn default_confirm_attempts() -> u32 { 8 }
fn default_poll_interval() -> u64 { 1000 }
fn default_metrics_port() -> u16 { 9090 }

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_cast_interval(),
            max_casts: 0,
            confirm_attempts: default_confirm_attempts(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_SESSION_KEY).filter(|v| !v.is_empty()) {
            self.wallet.session_key = Some(v);
        }
        if let Some(v) = lookup(ENV_OWNER).filter(|v| !v.is_empty()) {
            self.wallet.owner = v;
        }
        if let Some(v) = lookup(ENV_RPC_URL).filter(|v| !v.is_empty()) {
            self.rpc.endpoint = v;
        }
        if let Some(v) = lookup(ENV_TX_TEMPLATE).filter(|v| !v.is_empty()) {
            self.program.tx_template = Some(v);
        }
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.endpoint.is_empty() {
            anyhow::bail!("rpc.endpoint must be set");
        }
        Pubkey::from_str(&self.wallet.owner)
            .map_err(|e| anyhow::anyhow!("wallet.owner is not a valid address: {}", e))?;
        Pubkey::from_str(&self.program.program_id)
            .map_err(|e| anyhow::anyhow!("program.program_id is not a valid address: {}", e))?;
        if self.wallet.session_key.is_none() && self.wallet.keypair_path.is_none() {
            anyhow::bail!(
                "either wallet.session_key ({}) or wallet.keypair_path must be set",
                ENV_SESSION_KEY
            );
        }
        if self.program.tx_template.is_none() && self.program.tx_template_path.is_none() {
            anyhow::bail!(
                "either program.tx_template ({}) or program.tx_template_path must be set",
                ENV_TX_TEMPLATE
            );
        }
        if self.cast.confirm_attempts == 0 {
            anyhow::bail!("cast.confirm_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn owner(&self) -> anyhow::Result<Pubkey> {
        Ok(Pubkey::from_str(&self.wallet.owner)?)
    }

    pub fn program_id(&self) -> anyhow::Result<Pubkey> {
        Ok(Pubkey::from_str(&self.program.program_id)?)
    }

    /// Resolve the template text from inline config or its file
    pub fn tx_template_text(&self) -> anyhow::Result<String> {
        match (&self.program.tx_template, &self.program.tx_template_path) {
            (Some(inline), _) => Ok(inline.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?.trim().to_string()),
            (None, None) => anyhow::bail!("no transaction template configured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [rpc]
        endpoint = "http://127.0.0.1:8899"

        [wallet]
        owner = "SEAyjT1FUx3JyXJnWt5NtjELDwuU9XsoZeZVPVvweU4"

        [program]
        tx_template = "AAAA"
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.cast.interval_ms, 3000);
        assert_eq!(config.cast.max_casts, 0);
        assert_eq!(config.cast.confirm_attempts, 8);
        assert_eq!(config.cast.poll_interval_ms, 1000);
        assert_eq!(config.program.requested_modes, 3);
        assert!(!config.monitoring.enable_metrics);
    }

    #[test]
    fn test_validation_requires_session_key() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(ENV_SESSION_KEY));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_SESSION_KEY, "secret"),
            (ENV_RPC_URL, "http://rpc.example"),
            (ENV_OWNER, ""),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.wallet.session_key.as_deref(), Some("secret"));
        assert_eq!(config.rpc.endpoint, "http://rpc.example");
        // Empty values do not override
        assert_eq!(config.wallet.owner, "SEAyjT1FUx3JyXJnWt5NtjELDwuU9XsoZeZVPVvweU4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_owner_rejected() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.wallet.session_key = Some("k".into());
        config.wallet.owner = "not-an-address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_confirm_attempts_rejected() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.wallet.session_key = Some("k".into());
        config.cast.confirm_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_session_key() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.wallet.session_key = Some("super-secret".into());
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  QUJD  ").unwrap();

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.program.tx_template = None;
        config.program.tx_template_path = Some(file.path().to_string_lossy().into_owned());
        assert_eq!(config.tx_template_text().unwrap(), "QUJD");

        let loaded = Config::from_file(
            tempfile::NamedTempFile::new()
                .unwrap()
                .path()
                .to_str()
                .unwrap(),
        );
        assert!(loaded.is_err());
    }
}
