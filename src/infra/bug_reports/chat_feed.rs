// Event source: newline-delimited JSON chat events.
//
// Each line looks like
//   {"message": "!bug door is stuck",
//    "player": {"name": "Rook", "steamID": "7656...", "eosID": "0002..."}}
// (on a single line)
// which is what the game-server bridge prints for every chat message.

use crate::core::bug_reports::ChatEvent;
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub struct ChatFeed<R> {
    lines: Lines<R>,
    line_number: u64,
}

impl<R: AsyncBufRead + Unpin> ChatFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Next well-formed chat event, or `None` once the input is closed.
    /// Blank, malformed and non-UTF-8 lines are skipped; only real read
    /// failures are returned as errors.
    pub async fn next_event(&mut self) -> std::io::Result<Option<ChatEvent>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.line_number += 1;
                    tracing::warn!(
                        line = self.line_number,
                        error = %e,
                        "Skipping chat event that is not valid UTF-8"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.line_number += 1;
            match parse_line(&line) {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        line = self.line_number,
                        error = %e,
                        "Skipping malformed chat event"
                    );
                }
            }
        }
    }
}

fn parse_line(line: &str) -> Result<Option<ChatEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
