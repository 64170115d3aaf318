//! Reconciliation of scan-report webhooks against the vulnerability tracker.
//!
//! - [`identity`]: stable service identity from a resource name
//! - [`resolver`]: find-or-create of the engagement for a resource kind
//! - [`strategy`]: import vs. reimport
//! - [`orchestrator`]: the per-report flow tying the above together

pub mod envelope;
pub mod identity;
pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod strategy;

pub use envelope::{ReportEnvelope, ReportSubject};
pub use identity::service_identity;
pub use orchestrator::{
    OrchestratorError, ReconcileSettings, ReportAck, ReportOrchestrator, UploadOutcome,
};
pub use resolver::{EngagementLookup, EngagementResolver, ListingLookup, ResolveError};
pub use retry::RetryPolicy;
pub use strategy::select_mode;
