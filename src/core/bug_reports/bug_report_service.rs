// Bug report service - core business logic for the `!bug` relay.
//
// This service handles:
// - Recognising report commands in chat
// - Per-author cooldown (anti-spam)
// - Enriching the report with the current map/layer
// - Handing the report to the notification channel and acknowledging the author
//
// NO Discord or game-server dependencies here - just pure domain logic.

use super::bug_report_models::{
    AuthorKey, BugReport, BugReportConfig, ChatEvent, Notification, Player, ReportOutcome,
    ReportPayload, SessionContext,
};
use super::command_parser::{self, ParsedCommand};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

const USAGE_MESSAGE: &str = "Usage: !bug <short description of the issue>.";
const CONFIRMATION_MESSAGE: &str = "Thanks! Your bug report has been sent to the admins.";

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of one of the services the pipeline talks to.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Discord error: {0}")]
    Discord(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Failures that abort handling of a single chat event.
#[derive(Debug, Error)]
pub enum BugReportError {
    #[error("Cooldown lookup failed: {0}")]
    Cooldown(#[source] CollaboratorError),
}

// ============================================================================
// PORTS
// ============================================================================

/// Remembers when each author last filed an accepted report.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    async fn last_report(
        &self,
        key: &AuthorKey,
    ) -> Result<Option<DateTime<Utc>>, CollaboratorError>;

    async fn record_report(
        &self,
        key: &AuthorKey,
        at: DateTime<Utc>,
    ) -> Result<(), CollaboratorError>;

    /// Drop every entry older than `cutoff`. Returns how many were removed.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, CollaboratorError>;
}

/// Sends a direct in-game message to one player.
#[async_trait]
pub trait PlayerMessenger: Send + Sync {
    async fn warn(&self, target: &str, message: &str) -> Result<(), CollaboratorError>;
}

/// Looks up the map and layer currently being played.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` means the server answered but had nothing useful to say.
    async fn current_session(&self) -> Result<Option<SessionContext>, CollaboratorError>;
}

/// Delivers a finished report to wherever admins read them.
#[async_trait]
pub trait ReportNotifier: Send + Sync {
    async fn submit(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct BugReportService<C, M, P, N>
where
    C: CooldownStore,
    M: PlayerMessenger,
    P: SessionProvider,
    N: ReportNotifier,
{
    cooldowns: C,
    messenger: M,
    sessions: P,
    notifier: N,
    config: BugReportConfig,
    /// One lock per author around the cooldown read-compare-write, so two
    /// near-simultaneous commands from one author can't both pass the check
    /// while other authors are never held up.
    cooldown_gates: DashMap<AuthorKey, Arc<Mutex<()>>>,
}

impl<C, M, P, N> BugReportService<C, M, P, N>
where
    C: CooldownStore,
    M: PlayerMessenger,
    P: SessionProvider,
    N: ReportNotifier,
{
    pub fn new(
        cooldowns: C,
        messenger: M,
        sessions: P,
        notifier: N,
        config: BugReportConfig,
    ) -> Self {
        Self {
            cooldowns,
            messenger,
            sessions,
            notifier,
            config,
            cooldown_gates: DashMap::new(),
        }
    }

    /// Handle one chat event. Never fails; every error is logged and absorbed here.
    pub async fn handle(&self, event: &ChatEvent) {
        self.handle_at(event, Utc::now()).await;
    }

    /// Same as [`handle`](Self::handle) with an explicit clock reading.
    pub async fn handle_at(&self, event: &ChatEvent, now: DateTime<Utc>) -> ReportOutcome {
        match self.process(event, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(
                    author = %event.player.name,
                    error = %err,
                    "Failed to handle bug report command"
                );
                ReportOutcome::Failed
            }
        }
    }

    async fn process(
        &self,
        event: &ChatEvent,
        now: DateTime<Utc>,
    ) -> Result<ReportOutcome, BugReportError> {
        let player = &event.player;

        // 1. Is this a report at all?
        let description = match command_parser::parse(&event.message) {
            ParsedCommand::NotCommand => return Ok(ReportOutcome::Ignored),
            ParsedCommand::MissingDescription => {
                self.reply(player, USAGE_MESSAGE).await;
                return Ok(ReportOutcome::UsageShown);
            }
            ParsedCommand::Report(description) => description,
        };

        // 2. Cooldown. The timestamp is committed before enrichment/dispatch,
        // so a downstream failure still costs the author their window.
        let key = player.author_key();
        if let Some(wait_secs) = self.claim_cooldown(&key, now).await? {
            tracing::debug!(author = %key, wait_secs, "Bug report rejected by cooldown");
            self.reply(
                player,
                &format!("Please wait {wait_secs}s before sending another bug report."),
            )
            .await;
            return Ok(ReportOutcome::OnCooldown { wait_secs });
        }

        // 3. Build the report
        let session = self.fetch_session().await;
        let report = BugReport::new(player, ReportPayload::new(&description), session, now);

        // 4. Deliver, then acknowledge regardless of delivery
        let delivered = self.dispatch(&report).await;
        self.reply(player, CONFIRMATION_MESSAGE).await;

        tracing::info!(
            author = %report.author_name,
            map = %report.session.map_name,
            layer = %report.session.layer_name,
            delivered,
            truncated = report.description.is_truncated(),
            "Bug report filed: {}",
            report.description.as_str()
        );

        Ok(ReportOutcome::Submitted { delivered })
    }

    /// Returns `Some(wait_secs)` if the author is still cooling down,
    /// otherwise records `now` as their latest report and returns `None`.
    async fn claim_cooldown(
        &self,
        key: &AuthorKey,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, BugReportError> {
        let gate = self.author_gate(key);
        let _held = gate.lock().await;

        if let Some(last) = self
            .cooldowns
            .last_report(key)
            .await
            .map_err(BugReportError::Cooldown)?
        {
            if let Some(wait_secs) = remaining_wait_secs(self.config.cooldown, last, now) {
                return Ok(Some(wait_secs));
            }
        }

        self.cooldowns
            .record_report(key, now)
            .await
            .map_err(BugReportError::Cooldown)?;
        Ok(None)
    }

    fn author_gate(&self, key: &AuthorKey) -> Arc<Mutex<()>> {
        self.cooldown_gates.entry(key.clone()).or_default().clone()
    }

    async fn fetch_session(&self) -> SessionContext {
        let lookup = self.sessions.current_session();
        match self.bounded(lookup).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("Game server returned no map info");
                SessionContext::unknown()
            }
            Err(err) => {
                tracing::debug!(error = %err, "Failed to fetch current map");
                SessionContext::unknown()
            }
        }
    }

    async fn dispatch(&self, report: &BugReport) -> bool {
        let notification = report.to_notification();
        match self.bounded(self.notifier.submit(&notification)).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    author = %report.author_name,
                    error = %err,
                    "Failed to deliver bug report"
                );
                false
            }
        }
    }

    async fn reply(&self, player: &Player, message: &str) {
        let text = format!("{} {}", self.config.brand_tag, message);
        let target = player.reply_target();
        if let Err(err) = self.bounded(self.messenger.warn(target, &text)).await {
            tracing::warn!(
                reply_target = %target,
                error = %err,
                "Failed to send in-game reply"
            );
        }
    }

    /// Run a collaborator call under the configured timeout.
    /// Timing out is reported like any other collaborator failure.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        let limit = self.config.collaborator_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(CollaboratorError::Timeout(limit)))
    }

    /// Forget authors whose last report is older than one cooldown window.
    /// Such entries can no longer reject anything. A window reaching back past
    /// the earliest representable time prunes nothing.
    pub async fn prune_cooldowns(&self, now: DateTime<Utc>) -> Result<usize, CollaboratorError> {
        // Gates nobody is holding or waiting on are only referenced by the map itself
        self.cooldown_gates.retain(|_, gate| Arc::strong_count(gate) > 1);

        let window = chrono::Duration::milliseconds(millis(self.config.cooldown));
        let Some(cutoff) = now.checked_sub_signed(window) else {
            return Ok(0);
        };
        self.cooldowns.prune_before(cutoff).await
    }
}

/// Whole seconds (rounded up) the author still has to wait, or `None` if the
/// cooldown has fully elapsed. Elapsed time equal to the cooldown is allowed.
fn remaining_wait_secs(
    cooldown: Duration,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<u64> {
    let cooldown_ms = millis(cooldown);
    let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
    if elapsed_ms >= cooldown_ms {
        return None;
    }

    let remaining_ms = cooldown_ms.saturating_sub(elapsed_ms);
    Some((remaining_ms.saturating_add(999) / 1000) as u64)
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// TESTS
// ============================================================================
