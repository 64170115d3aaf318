//! Import vs. reimport decision.

use scanbridge_tracker::{ImportMode, TrackerBackend};
use tracing::{info, warn};

/// Pick the upload operation for an engagement.
///
/// `Reimport` only when the test listing succeeds and is non-empty. A failed
/// listing falls back to `Import`: ingestion is not blocked by a transient
/// lookup error, and the upload enables engagement-level deduplication so a
/// redundant first import is absorbed by the tracker.
pub async fn select_mode(backend: &dyn TrackerBackend, engagement_id: u64) -> ImportMode {
    match backend.list_tests(engagement_id).await {
        Ok(tests) if !tests.is_empty() => {
            info!(engagement_id, tests = tests.len(), "engagement has tests, using reimport");
            ImportMode::Reimport
        }
        Ok(_) => {
            info!(engagement_id, "engagement has no tests, using import");
            ImportMode::Import
        }
        Err(e) => {
            warn!(engagement_id, error = %e, "test lookup failed, falling back to import");
            ImportMode::Import
        }
    }
}
