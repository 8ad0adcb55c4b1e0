// Bug report domain models - data structures for the chat-triggered report relay.
//
// These are pure domain types with no Discord or game-server dependencies.
// The infra and discord layers convert to and from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest payload (in characters) we forward before cutting it off.
pub const MAX_REPORT_LENGTH: usize = 500;
/// Appended to a payload that was cut at `MAX_REPORT_LENGTH`.
pub const TRUNCATION_MARKER: char = '…';

pub const UNKNOWN_MAP: &str = "Unknown map";
pub const UNKNOWN_LAYER: &str = "Unknown layer";

/// Orange, same as the other admin-facing embeds on the server.
pub const REPORT_COLOR: u32 = 16761867;

// ============================================================================
// INCOMING EVENTS
// ============================================================================

/// The player who wrote a chat line.
///
/// Field names match the JSON emitted by the game-server bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(rename = "steamID", default)]
    pub steam_id: Option<String>,
    #[serde(rename = "eosID", default)]
    pub eos_id: Option<String>,
}

impl Player {
    /// Stable identity used for cooldown bookkeeping.
    ///
    /// Preference order: steam ID, then EOS ID, then display name.
    pub fn author_key(&self) -> AuthorKey {
        let key = self
            .known_steam_id()
            .or(self.known_eos_id())
            .unwrap_or(self.name.as_str());
        AuthorKey(key.to_string())
    }

    /// Identifier used to address in-game replies.
    ///
    /// Preference order: EOS ID, then steam ID, then display name.
    pub fn reply_target(&self) -> &str {
        self.known_eos_id()
            .or(self.known_steam_id())
            .unwrap_or(self.name.as_str())
    }

    /// Steam ID, unless the bridge sent it missing or blank.
    pub fn known_steam_id(&self) -> Option<&str> {
        non_blank(self.steam_id.as_deref())
    }

    /// EOS ID, unless the bridge sent it missing or blank.
    pub fn known_eos_id(&self) -> Option<&str> {
        non_blank(self.eos_id.as_deref())
    }
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

/// A single chat line as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub player: Player,
    #[serde(default)]
    pub message: String,
}

/// Key into the cooldown map. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorKey(pub String);

impl std::fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// REPORT CONTENT
// ============================================================================

/// Free-text description of the issue, trimmed and capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload(String);

impl ReportPayload {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.chars().count() <= MAX_REPORT_LENGTH {
            return Self(trimmed.to_string());
        }

        let mut capped: String = trimmed.chars().take(MAX_REPORT_LENGTH).collect();
        capped.push(TRUNCATION_MARKER);
        Self(capped)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_truncated(&self) -> bool {
        self.0.chars().count() > MAX_REPORT_LENGTH
    }
}

/// Where the reporter currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub map_name: String,
    pub layer_name: String,
}

impl SessionContext {
    /// Builds a context from whatever the game server gave us, filling gaps with sentinels.
    pub fn from_parts(map_name: Option<String>, layer_name: Option<String>) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            map_name: non_blank(map_name).unwrap_or_else(|| UNKNOWN_MAP.to_string()),
            layer_name: non_blank(layer_name).unwrap_or_else(|| UNKNOWN_LAYER.to_string()),
        }
    }

    pub fn unknown() -> Self {
        Self::from_parts(None, None)
    }
}

/// The record handed to the notification channel. Built once per accepted report.
#[derive(Debug, Clone, PartialEq)]
pub struct BugReport {
    pub author_name: String,
    pub steam_id: Option<String>,
    pub eos_id: Option<String>,
    pub description: ReportPayload,
    pub session: SessionContext,
    pub submitted_at: DateTime<Utc>,
}

impl BugReport {
    /// Only identifiers that carry a value are kept, so the layout never shows an empty ID.
    pub fn new(
        player: &Player,
        description: ReportPayload,
        session: SessionContext,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            author_name: player.name.clone(),
            steam_id: player.known_steam_id().map(str::to_string),
            eos_id: player.known_eos_id().map(str::to_string),
            description,
            session,
            submitted_at,
        }
    }

    /// Lay the report out as a channel notification.
    pub fn to_notification(&self) -> Notification {
        let any_id = self
            .steam_id
            .as_deref()
            .or(self.eos_id.as_deref())
            .unwrap_or("unknown ID");

        let steam_field = match &self.steam_id {
            Some(id) => format!("[{id}](https://steamcommunity.com/profiles/{id})"),
            None => "N/A".to_string(),
        };

        Notification {
            title: "New bug report".to_string(),
            description: self.description.as_str().to_string(),
            color: REPORT_COLOR,
            fields: vec![
                NotificationField::inline("Player", format!("{} ({})", self.author_name, any_id)),
                NotificationField::inline("SteamID", steam_field),
                NotificationField::inline(
                    "EOSID",
                    self.eos_id.clone().unwrap_or_else(|| "N/A".to_string()),
                ),
                NotificationField::block(
                    "Map / Layer",
                    format!("{}\n{}", self.session.map_name, self.session.layer_name),
                ),
            ],
            timestamp: self.submitted_at,
        }
    }
}

/// Transport-neutral structured message for the notification channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<NotificationField>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl NotificationField {
    pub fn inline(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: true,
        }
    }

    pub fn block(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: false,
        }
    }
}

// ============================================================================
// PIPELINE RESULTS + CONFIG
// ============================================================================

/// What happened to one chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Not a report command; nothing was done.
    Ignored,
    /// Command without a description; usage was sent.
    UsageShown,
    /// Author is still cooling down.
    OnCooldown { wait_secs: u64 },
    /// Report accepted. `delivered` is false when the notification channel failed.
    Submitted { delivered: bool },
    /// Something unexpected went wrong; the event was dropped.
    Failed,
}

/// Configuration for the report pipeline.
#[derive(Debug, Clone)]
pub struct BugReportConfig {
    /// Prefix for every in-game reply.
    pub brand_tag: String,
    /// Minimum time between two accepted reports from the same author.
    pub cooldown: Duration,
    /// Upper bound for each call to the session or notification collaborators.
    pub collaborator_timeout: Duration,
}

impl Default for BugReportConfig {
    fn default() -> Self {
        Self {
            brand_tag: "[BUG]".to_string(),
            cooldown: Duration::from_secs(60),
            collaborator_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(steam: Option<&str>, eos: Option<&str>) -> Player {
        Player {
            name: "Rook".to_string(),
            steam_id: steam.map(str::to_string),
            eos_id: eos.map(str::to_string),
        }
    }

    #[test]
    fn test_author_key_prefers_steam_then_eos_then_name() {
        assert_eq!(
            player(Some("7656"), Some("eos1")).author_key(),
            AuthorKey("7656".into())
        );
        assert_eq!(player(None, Some("eos1")).author_key(), AuthorKey("eos1".into()));
        assert_eq!(player(None, None).author_key(), AuthorKey("Rook".into()));
        assert_eq!(player(Some("  "), None).author_key(), AuthorKey("Rook".into()));
    }

    #[test]
    fn test_reply_target_prefers_eos() {
        assert_eq!(player(Some("7656"), Some("eos1")).reply_target(), "eos1");
        assert_eq!(player(Some("7656"), None).reply_target(), "7656");
        assert_eq!(player(None, None).reply_target(), "Rook");
    }

    #[test]
    fn test_payload_at_limit_is_kept_whole() {
        let text = "a".repeat(MAX_REPORT_LENGTH);
        let payload = ReportPayload::new(&text);
        assert_eq!(payload.as_str(), text);
        assert!(!payload.is_truncated());
    }

    #[test]
    fn test_payload_over_limit_gets_marker() {
        let text = "a".repeat(MAX_REPORT_LENGTH + 1);
        let payload = ReportPayload::new(&text);
        assert!(payload.is_truncated());
        assert_eq!(payload.as_str().chars().count(), MAX_REPORT_LENGTH + 1);
        assert!(payload.as_str().ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let once = ReportPayload::new(&"ж".repeat(900));
        let twice = ReportPayload::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_payload_is_trimmed() {
        assert_eq!(ReportPayload::new("  door stuck \n").as_str(), "door stuck");
    }

    #[test]
    fn test_session_context_falls_back_to_sentinels() {
        let ctx = SessionContext::from_parts(Some("Narva".into()), Some("".into()));
        assert_eq!(ctx.map_name, "Narva");
        assert_eq!(ctx.layer_name, UNKNOWN_LAYER);
        assert_eq!(SessionContext::unknown().map_name, UNKNOWN_MAP);
    }

    #[test]
    fn test_notification_layout_matches_admin_embed() {
        let report = BugReport {
            author_name: "Rook".into(),
            steam_id: Some("76561198000000000".into()),
            eos_id: None,
            description: ReportPayload::new("door is stuck"),
            session: SessionContext::from_parts(
                Some("Narva".into()),
                Some("Narva_RAAS_v1".into()),
            ),
            submitted_at: Utc::now(),
        };

        let notification = report.to_notification();
        assert_eq!(notification.title, "New bug report");
        assert_eq!(notification.description, "door is stuck");
        assert_eq!(notification.color, REPORT_COLOR);

        let names: Vec<_> = notification.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Player", "SteamID", "EOSID", "Map / Layer"]);
        assert_eq!(notification.fields[0].value, "Rook (76561198000000000)");
        assert_eq!(
            notification.fields[1].value,
            "[76561198000000000](https://steamcommunity.com/profiles/76561198000000000)"
        );
        assert_eq!(notification.fields[2].value, "N/A");
        assert_eq!(notification.fields[3].value, "Narva\nNarva_RAAS_v1");
        assert!(!notification.fields[3].inline);
    }

    #[test]
    fn test_blank_ids_are_left_out_of_the_layout() {
        let rook = player(Some(""), Some("eos1"));
        let report = BugReport::new(
            &rook,
            ReportPayload::new("door is stuck"),
            SessionContext::unknown(),
            Utc::now(),
        );
        assert_eq!(report.steam_id, None);

        let notification = report.to_notification();
        assert_eq!(notification.fields[0].value, "Rook (eos1)");
        assert_eq!(notification.fields[1].value, "N/A");
        assert_eq!(notification.fields[2].value, "eos1");

        let nameless = BugReport::new(
            &player(Some("   "), None),
            ReportPayload::new("x"),
            SessionContext::unknown(),
            Utc::now(),
        );
        let notification = nameless.to_notification();
        assert_eq!(notification.fields[0].value, "Rook (unknown ID)");
        assert_eq!(notification.fields[1].value, "N/A");
        assert_eq!(notification.fields[2].value, "N/A");
    }

    #[test]
    fn test_chat_event_deserializes_bridge_json() {
        let raw = r#"{"message":"!bug x","player":{"name":"Rook","eosID":"abc"}}"#;
        let event: ChatEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.player.eos_id.as_deref(), Some("abc"));
        assert_eq!(event.player.steam_id, None);
    }
}
