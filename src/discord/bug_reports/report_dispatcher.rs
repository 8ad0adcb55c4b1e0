use crate::core::bug_reports::{CollaboratorError, Notification, ReportNotifier};
use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use serenity::model::{Colour, Timestamp};
use std::sync::Arc;

/// Posts bug reports as embeds into a single admin channel.
pub struct DiscordReportNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordReportNotifier {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl ReportNotifier for DiscordReportNotifier {
    async fn submit(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        let embed = build_report_embed(notification);

        self.channel_id
            .send_message(self.http.as_ref(), CreateMessage::new().embed(embed))
            .await
            .map_err(|e| CollaboratorError::Discord(e.to_string()))?;

        tracing::debug!(channel_id = %self.channel_id, "Bug report sent to Discord");
        Ok(())
    }
}

fn build_report_embed(notification: &Notification) -> CreateEmbed {
    let timestamp = Timestamp::from_unix_timestamp(notification.timestamp.timestamp())
        .unwrap_or_else(|_| Timestamp::now());

    let mut embed = CreateEmbed::new()
        .title(&notification.title)
        .description(&notification.description)
        .color(Colour::new(notification.color))
        .timestamp(timestamp)
        .footer(CreateEmbedFooter::new("Filed in-game with !bug"));

    for field in &notification.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }

    embed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bug_reports::{BugReport, ReportPayload, SessionContext, REPORT_COLOR};
    use chrono::{DateTime, Utc};

    fn sample_notification() -> Notification {
        BugReport {
            author_name: "Rook".into(),
            steam_id: None,
            eos_id: Some("0002abcd".into()),
            description: ReportPayload::new("vehicle spawns inside rock"),
            session: SessionContext::unknown(),
            submitted_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
        .to_notification()
    }

    #[test]
    fn test_embed_carries_every_field() {
        let embed = build_report_embed(&sample_notification());
        let json = serde_json::to_value(&embed).unwrap();

        assert_eq!(json["title"], "New bug report");
        assert_eq!(json["description"], "vehicle spawns inside rock");
        assert_eq!(json["color"], REPORT_COLOR);

        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["value"], "Rook (0002abcd)");
        assert_eq!(fields[1]["value"], "N/A");
        assert_eq!(fields[3]["name"], "Map / Layer");
        assert_eq!(fields[3]["inline"], false);
    }
}
