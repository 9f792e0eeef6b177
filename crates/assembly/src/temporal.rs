//! Temporal context — recent session summaries for continuity.

use taskbrief_core::session::SessionSummary;
use taskbrief_core::store::ContextStore;
use tracing::warn;

/// Loads recent session summaries for a work-group.
pub struct TemporalLoader {
    limit: usize,
}

impl TemporalLoader {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Recent summaries, newest first. A store failure degrades to an
    /// empty list and reports the cause for the payload's warning list.
    pub fn load_recent(
        &self,
        work_group_id: &str,
        store: &dyn ContextStore,
    ) -> (Vec<SessionSummary>, Option<String>) {
        match store.list_recent_summaries(work_group_id, self.limit) {
            Ok(summaries) => (summaries, None),
            Err(e) => {
                warn!(work_group_id, error = %e, "session history unavailable");
                (
                    Vec::new(),
                    Some(format!("Failed to load session history: {e}")),
                )
            }
        }
    }
}
