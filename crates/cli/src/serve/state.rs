//! Application state shared across request handlers.

use scanbridge_reconcile::ReportOrchestrator;

/// Read-only per-process state. Holds no per-request data.
pub(crate) struct AppState {
    pub(crate) orchestrator: ReportOrchestrator,
}
