// In-memory implementation of CooldownStore.
//
// Cooldowns only matter for the lifetime of the process, so there's nothing
// to persist. The background prune task keeps the map from growing forever.

use crate::core::bug_reports::{AuthorKey, CollaboratorError, CooldownStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Maps author key -> time of their last accepted report.
///
/// **DashMap:**
/// Chat events are handled on separate tasks, so the map has to be shareable
/// without wrapping it in a Mutex.
pub struct InMemoryCooldownStore {
    last_reports: DashMap<AuthorKey, DateTime<Utc>>,
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self {
            last_reports: DashMap::new(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.last_reports.len()
    }
}

impl Default for InMemoryCooldownStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CooldownStore for InMemoryCooldownStore {
    async fn last_report(
        &self,
        key: &AuthorKey,
    ) -> Result<Option<DateTime<Utc>>, CollaboratorError> {
        Ok(self.last_reports.get(key).map(|entry| *entry))
    }

    async fn record_report(
        &self,
        key: &AuthorKey,
        at: DateTime<Utc>,
    ) -> Result<(), CollaboratorError> {
        self.last_reports.insert(key.clone(), at);
        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, CollaboratorError> {
        let before = self.last_reports.len();
        self.last_reports.retain(|_, at| *at >= cutoff);
        Ok(before.saturating_sub(self.last_reports.len()))
    }
}
