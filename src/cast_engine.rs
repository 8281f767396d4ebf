//! Cast attempt state machine and the session loop around it.
//!
//! ## Attempt lifecycle
//!
//! ```text
//! FETCH_BEFORE ──► SUBMIT ──► POLL(1..=N) ──► CONFIRMED
//!                    │              │
//!                    │              ├──────► TIMED_OUT
//!                    │              └─ read/decode error ─► AttemptFailed
//!                    └─ no tx id ──────────► NO_TX_ID
//! ```
//!
//! Any failed read or decode, before submission or while polling, abandons
//! the attempt. Nothing is retried within an attempt.
//!
//! Confirmation is observed, not queried: an attempt is confirmed the moment
//! the player's on-chain `cast_count` exceeds the value read before
//! submission. The transaction's own status is never looked up, so any other
//! actor advancing the same counter inside the poll window is attributed to
//! this attempt.
//!
//! Every attempt starts from freshly fetched state and a fresh copy of the
//! template. Nothing carries over between attempts except [`SessionStats`],
//! which the session loop owns.
//!
//! ## Cancellation
//!
//! Each suspension point (collaborator calls, poll sleeps, the inter-cast
//! delay) races against a [`Shutdown`] token. Triggering it abandons the
//! current attempt with [`CastError::Cancelled`] and ends the session.

use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::metrics::{metrics, Timer};
use crate::player_state::{player_state_address, PlayerAccountState, StateDecodeError};
use crate::rpc::{AccountSource, CapabilityIssuer, ChainTip, RpcError, TransactionSubmitter};
use crate::stats::SessionStats;
use crate::structured_logging::CastLogger;
use crate::tx_builder::{assemble, TransactionBuilderError, TxTemplate};
use crate::wallet::WalletManager;

/// Default number of confirmation polls per attempt
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 8;

/// Default sleep before each confirmation poll
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Stage of an attempt, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStage {
    FetchBefore,
    Submit,
    Poll,
}

impl std::fmt::Display for CastStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastStage::FetchBefore => write!(f, "fetch_before"),
            CastStage::Submit => write!(f, "submit"),
            CastStage::Poll => write!(f, "poll"),
        }
    }
}

/// Underlying cause of an abandoned attempt
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Decode(#[from] StateDecodeError),

    #[error(transparent)]
    Build(#[from] TransactionBuilderError),
}

impl AttemptError {
    pub fn category(&self) -> &'static str {
        match self {
            AttemptError::Rpc(e) => e.category(),
            AttemptError::Decode(_) => "decode",
            AttemptError::Build(e) => e.category(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CastError {
    /// The attempt could not complete; the session continues
    #[error("Cast attempt failed during {stage}: {source}")]
    AttemptFailed {
        stage: CastStage,
        #[source]
        source: AttemptError,
    },

    /// The cast counter advanced but lifetime fish went down
    ///
    /// The program only ever adds to `fish_caught_all_time`, so this means
    /// the record layout or the program's semantics changed under us.
    #[error(
        "Fish counter regressed: fish_caught_all_time {fish_before} -> {fish_after} \
         while cast_count {cast_count_before} -> {cast_count_after}"
    )]
    FishCounterRegressed {
        fish_before: u64,
        fish_after: u64,
        cast_count_before: u64,
        cast_count_after: u64,
    },

    #[error("Cast attempt cancelled")]
    Cancelled,
}

impl CastError {
    fn at(stage: CastStage, source: impl Into<AttemptError>) -> Self {
        CastError::AttemptFailed {
            stage,
            source: source.into(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            CastError::AttemptFailed { source, .. } => source.category(),
            CastError::FishCounterRegressed { .. } => "invariant",
            CastError::Cancelled => "cancelled",
        }
    }
}

/// How an attempt ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// Counter advanced after this many polls
    Confirmed { polls: u32 },
    /// Poll window exhausted without a counter advance
    TimedOut,
    /// Transport accepted the request but reported no transaction id
    NoTransactionId,
}

impl CastOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            CastOutcome::Confirmed { .. } => "confirmed",
            CastOutcome::TimedOut => "confirmation window exhausted",
            CastOutcome::NoTransactionId => "no transaction id returned",
        }
    }
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastResult {
    pub success: bool,
    pub fish_delta: u64,
    /// Confirmed state, or the pre-attempt state when not confirmed
    pub state_after: PlayerAccountState,
    pub outcome: CastOutcome,
    pub tx_id: Option<String>,
}

impl CastResult {
    fn unconfirmed(before: PlayerAccountState, outcome: CastOutcome, tx_id: Option<String>) -> Self {
        Self {
            success: false,
            fish_delta: 0,
            state_after: before,
            outcome,
            tx_id,
        }
    }
}

/// Shared handle checked at every suspension point
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Owner side of a [`Shutdown`] token
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Receivers may all be gone already; nothing to notify then
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered; never resolves if the trigger is dropped untriggered
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `fut` unless shutdown fires first
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, CastError> {
        let mut shutdown = self.clone();
        tokio::select! {
            biased;
            _ = shutdown.triggered() => Err(CastError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

/// External collaborators of the engine
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountSource>,
    pub chain: Arc<dyn ChainTip>,
    pub issuer: Arc<dyn CapabilityIssuer>,
    pub submitter: Arc<dyn TransactionSubmitter>,
}

#[derive(Debug, Clone)]
pub struct CastEngineConfig {
    /// Main wallet owning the player account
    pub owner: Pubkey,
    pub program_id: Pubkey,
    pub confirm_attempts: u32,
    pub poll_interval: Duration,
}

impl CastEngineConfig {
    pub fn new(owner: Pubkey, program_id: Pubkey) -> Self {
        Self {
            owner,
            program_id,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Runs single cast attempts
pub struct CastEngine {
    collaborators: Collaborators,
    wallet: WalletManager,
    template: Arc<TxTemplate>,
    config: CastEngineConfig,
    player_address: Pubkey,
    shutdown: Shutdown,
}

impl CastEngine {
    pub fn new(
        collaborators: Collaborators,
        wallet: WalletManager,
        template: Arc<TxTemplate>,
        config: CastEngineConfig,
        shutdown: Shutdown,
    ) -> Self {
        let player_address = player_state_address(&config.owner, &config.program_id);
        Self {
            collaborators,
            wallet,
            template,
            config,
            player_address,
            shutdown,
        }
    }

    pub fn player_address(&self) -> &Pubkey {
        &self.player_address
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Fetch and decode the player record.
    pub async fn fetch_state(&self) -> Result<Result<PlayerAccountState, AttemptError>, CastError> {
        let raw = self
            .shutdown
            .guard(self.collaborators.accounts.fetch_account(&self.player_address))
            .await?;
        Ok(raw
            .map_err(AttemptError::from)
            .and_then(|bytes| PlayerAccountState::decode(&bytes).map_err(AttemptError::from)))
    }

    /// Run one attempt through FETCH_BEFORE, SUBMIT and POLL.
    pub async fn cast_once(&self, logger: &CastLogger) -> Result<CastResult, CastError> {
        let before = self
            .fetch_state()
            .await?
            .map_err(|e| CastError::at(CastStage::FetchBefore, e))?;
        metrics().last_cast_count.set(i64::try_from(before.cast_count).unwrap_or(i64::MAX));
        logger.log_attempt_start(before.cast_count);

        let tx_id = match self.submit(&before).await? {
            Some(tx_id) => tx_id,
            None => return Ok(CastResult::unconfirmed(before, CastOutcome::NoTransactionId, None)),
        };
        logger.log_submitted(&tx_id);

        self.poll_confirmation(before, tx_id, logger).await
    }

    async fn submit(&self, before: &PlayerAccountState) -> Result<Option<String>, CastError> {
        let stage = CastStage::Submit;
        let c = &self.collaborators;

        let capability = self
            .shutdown
            .guard(c.issuer.issue(&self.config.owner, &self.config.program_id))
            .await?
            .map_err(|e| CastError::at(stage, e))?;
        let blockhash = self
            .shutdown
            .guard(c.chain.latest_blockhash())
            .await?
            .map_err(|e| CastError::at(stage, e))?;
        let slot = self
            .shutdown
            .guard(c.chain.current_slot())
            .await?
            .map_err(|e| CastError::at(stage, e))?;

        let timer = Timer::new();
        let mut output = assemble(&self.template, blockhash, &capability, slot, before.cast_count)
            .map_err(|e| CastError::at(stage, e))?;
        output
            .sign(&self.wallet)
            .map_err(|e| CastError::at(stage, e))?;
        let wire = output.to_bytes().map_err(|e| CastError::at(stage, e))?;
        timer.observe_duration(&metrics().build_latency);

        self.shutdown
            .guard(c.submitter.submit(&wire))
            .await?
            .map_err(|e| CastError::at(stage, e))
    }

    async fn poll_confirmation(
        &self,
        before: PlayerAccountState,
        tx_id: String,
        logger: &CastLogger,
    ) -> Result<CastResult, CastError> {
        let timer = Timer::new();

        for poll in 1..=self.config.confirm_attempts {
            self.shutdown
                .guard(tokio::time::sleep(self.config.poll_interval))
                .await?;

            let after = match self.fetch_state().await? {
                Ok(state) => state,
                Err(e) => {
                    warn!(poll, error = %e, "Confirmation poll failed, abandoning attempt");
                    return Err(CastError::at(CastStage::Poll, e));
                }
            };
            logger.log_poll(poll, after.cast_count);

            if after.cast_count > before.cast_count {
                let fish_delta = after
                    .fish_caught_all_time
                    .checked_sub(before.fish_caught_all_time)
                    .ok_or(CastError::FishCounterRegressed {
                        fish_before: before.fish_caught_all_time,
                        fish_after: after.fish_caught_all_time,
                        cast_count_before: before.cast_count,
                        cast_count_after: after.cast_count,
                    })?;

                timer.observe_duration(&metrics().cast_latency);
                metrics().confirm_polls.observe(f64::from(poll));
                metrics().last_cast_count.set(i64::try_from(after.cast_count).unwrap_or(i64::MAX));

                return Ok(CastResult {
                    success: true,
                    fish_delta,
                    state_after: after,
                    outcome: CastOutcome::Confirmed { polls: poll },
                    tx_id: Some(tx_id),
                });
            }
        }

        Ok(CastResult::unconfirmed(before, CastOutcome::TimedOut, Some(tx_id)))
    }
}

/// Outer loop: sequential attempts, failures caught at the attempt boundary
pub struct CastSession {
    engine: CastEngine,
    cast_interval: Duration,
    max_casts: u64,
}

impl CastSession {
    /// `max_casts == 0` runs until shutdown
    pub fn new(engine: CastEngine, cast_interval: Duration, max_casts: u64) -> Self {
        Self {
            engine,
            cast_interval,
            max_casts,
        }
    }

    /// Run one attempt and fold its outcome into `stats`.
    ///
    /// Returns `false` once shutdown was observed.
    pub async fn step(&self, cast_number: u64, stats: &mut SessionStats) -> bool {
        let logger = CastLogger::new(cast_number);
        let m = metrics();
        m.casts_total.inc();

        match self.engine.cast_once(&logger).await {
            Ok(result) if result.success => {
                stats.record_success(result.fish_delta);
                m.casts_success.inc();
                m.fish_caught.inc_by(result.fish_delta);
                let polls = match result.outcome {
                    CastOutcome::Confirmed { polls } => polls,
                    _ => 0,
                };
                logger.log_confirmed(result.fish_delta, polls, stats);
                true
            }
            Ok(result) => {
                stats.record_failure();
                m.casts_failed.inc();
                if result.outcome == CastOutcome::TimedOut {
                    m.casts_timed_out.inc();
                }
                logger.log_unconfirmed(result.outcome.describe(), stats);
                true
            }
            Err(CastError::Cancelled) => {
                stats.record_failure();
                m.casts_failed.inc();
                logger.log_unconfirmed("cancelled", stats);
                false
            }
            Err(e) => {
                stats.record_failure();
                m.casts_failed.inc();
                m.record_error(e.category());
                logger.log_error(&e.to_string(), e.category(), stats);
                true
            }
        }
    }

    /// Run until `max_casts` is reached or shutdown fires.
    pub async fn run(&self) -> SessionStats {
        let mut stats = SessionStats::new();
        let shutdown = self.engine.shutdown().clone();
        let mut cast_number = 0u64;

        while self.max_casts == 0 || cast_number < self.max_casts {
            if shutdown.is_triggered() {
                break;
            }
            cast_number += 1;
            info!(cast = cast_number, "Cast #{}...", cast_number);

            if !self.step(cast_number, &mut stats).await {
                break;
            }

            let more = self.max_casts == 0 || cast_number < self.max_casts;
            if more
                && shutdown
                    .guard(tokio::time::sleep(self.cast_interval))
                    .await
                    .is_err()
            {
                break;
            }
        }

        info!(
            casts = stats.casts,
            successes = stats.successes,
            failures = stats.failures,
            "Done! {}",
            stats
        );
        stats
    }
}
