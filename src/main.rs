//! castbot - automated fishing casts
//!
//! Two subcommands:
//!
//! - **run**: load the configuration, wire the chain, capability service and
//!   paymaster adapters into a cast session and cast until interrupted or
//!   `cast.max_casts` is reached.
//! - **convert**: turn an exported browser session key (wrapped container
//!   plus raw public key, both base64) into the base58 keypair `run` expects.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroize;

use castbot::cast_engine::{shutdown_channel, CastEngine, CastEngineConfig, CastSession, Collaborators};
use castbot::config::Config;
use castbot::endpoints;
use castbot::keys::{self, DerivationMode};
use castbot::player_state::{format_fish, PlayerAccountState};
use castbot::rpc::{HttpCapabilityIssuer, PaymasterSubmitter, SolanaRpc};
use castbot::tx_builder::TxTemplate;
use castbot::wallet::WalletManager;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cast in a loop
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Override cast.max_casts
        #[arg(long)]
        max_casts: Option<u64>,
    },

    /// Convert an exported session key to a base58 keypair
    Convert {
        /// Base64 wrapped private key container (48 bytes)
        #[arg(long, env = "CASTBOT_WRAPPED_KEY")]
        wrapped_key: String,

        /// Base64 raw public key (32 bytes)
        #[arg(long, env = "CASTBOT_PUBLIC_KEY")]
        public_key: String,

        /// Use the supplied public key as-is instead of deriving it from the seed
        #[arg(long)]
        trust_public_key: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json)?;

    match args.command {
        Command::Run { config, max_casts } => run(&config, max_casts).await,
        Command::Convert {
            mut wrapped_key,
            public_key,
            trust_public_key,
        } => {
            let result = convert(&wrapped_key, &public_key, trust_public_key);
            wrapped_key.zeroize();
            result
        }
    }
}

/// Initialize logging
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "castbot=debug,info"
    } else {
        "castbot=info,warn,error"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

/// Load and validate configuration, with `.env` and environment overrides
fn load_config(path: &str) -> Result<Config> {
    let config = Config::from_file_with_env(path)
        .with_context(|| format!("Failed to load config from {}", path))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_wallet(config: &Config) -> Result<WalletManager> {
    match (&config.wallet.session_key, &config.wallet.keypair_path) {
        (Some(key), _) => WalletManager::from_base58(key),
        (None, Some(path)) => {
            info!("🔑 Loading session keypair from: {}", path);
            WalletManager::from_file(path)
        }
        (None, None) => anyhow::bail!("no session key configured"),
    }
}

async fn run(config_path: &str, max_casts: Option<u64>) -> Result<()> {
    info!("🎣 Starting castbot");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    info!("📋 Loading configuration from: {}", config_path);
    let config = load_config(config_path)?;

    let wallet = load_wallet(&config).context("Failed to load session wallet")?;
    let owner = config.owner()?;
    let program_id = config.program_id()?;
    info!("💼 Session key: {}", wallet.pubkey());
    info!("👤 Owner: {}", owner);

    let template_text = config.tx_template_text()?;
    let template = TxTemplate::from_base64(&template_text).context("Invalid transaction template")?;

    if config.monitoring.enable_metrics {
        let port = config.monitoring.metrics_port;
        info!("📊 Starting metrics server on port {}", port);
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let timeout = Duration::from_secs(config.rpc.timeout_secs);
    let rpc = Arc::new(SolanaRpc::new(&config.rpc.endpoint, timeout));
    let issuer = HttpCapabilityIssuer::new(&config.program.capability_url, timeout)?
        .with_requested_modes(config.program.requested_modes);
    let submitter = PaymasterSubmitter::new(&config.program.paymaster_url, timeout)?;

    let collaborators = Collaborators {
        accounts: rpc.clone(),
        chain: rpc,
        issuer: Arc::new(issuer),
        submitter: Arc::new(submitter),
    };

    let (trigger, shutdown) = shutdown_channel();
    let engine_config = CastEngineConfig {
        owner,
        program_id,
        confirm_attempts: config.cast.confirm_attempts,
        poll_interval: Duration::from_millis(config.cast.poll_interval_ms),
    };
    let engine = CastEngine::new(
        collaborators.clone(),
        wallet,
        Arc::new(template),
        engine_config,
        shutdown,
    );

    // Show the starting state; a missing account is not fatal here
    let player = *engine.player_address();
    info!("🐟 Player account: {}", player);
    match collaborators.accounts.fetch_account(&player).await {
        Ok(raw) => match PlayerAccountState::decode(&raw) {
            Ok(state) => info!(
                "📈 Casts: {} | Fish: {} | Rod: {} | Boat: {}",
                state.cast_count,
                format_fish(state.fish_caught_all_time),
                state.rod_level,
                state.boat_tier
            ),
            Err(e) => warn!("Could not decode player account: {}", e),
        },
        Err(e) => warn!("Could not read player account: {}", e),
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Shutdown signal received");
            trigger.trigger();
        }
    });

    let session = CastSession::new(
        engine,
        Duration::from_millis(config.cast.interval_ms),
        max_casts.unwrap_or(config.cast.max_casts),
    );
    let stats = session.run().await;

    info!(
        "📊 Session finished: {} ({:.1}% success)",
        stats,
        stats.success_rate() * 100.0
    );
    Ok(())
}

fn convert(wrapped_key_b64: &str, public_key_b64: &str, trust_public_key: bool) -> Result<()> {
    let mode = if trust_public_key {
        DerivationMode::TrustSuppliedPublicKey
    } else {
        DerivationMode::DeriveFromSeed
    };

    let converted = keys::convert_base64(wrapped_key_b64, public_key_b64, mode)
        .context("Failed to convert session key")?;

    if !converted.supplied_key_matches() {
        warn!(
            "Supplied public key does not belong to the private key{}",
            if trust_public_key {
                "; the resulting credential will fail to sign"
            } else {
                "; using the derived public key"
            }
        );
    }

    println!("Public key: {}", converted.public_key_base58());
    println!("Session key (base58): {}", converted.keypair_base58());
    Ok(())
}
