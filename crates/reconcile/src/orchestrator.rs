//! Top-level reconciliation of one report envelope.
//!
//! Flow: extract the subject, resolve the engagement for its kind, choose
//! import or reimport, derive the service identity, upload. The caller gets
//! a success acknowledgment whether or not the upload went through; only an
//! unresolvable engagement fails the request.

use std::sync::Arc;

use scanbridge_tracker::{format_date, today, Engagement, FindingImport, ImportMode, TrackerBackend};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::envelope::ReportEnvelope;
use crate::identity::service_identity;
use crate::resolver::{EngagementLookup, EngagementResolver, ListingLookup, ResolveError};
use crate::retry::RetryPolicy;
use crate::strategy::select_mode;

/// Per-deployment settings of the reconciliation flow.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Tracker product every engagement is created under.
    pub product_id: u64,
    /// Product display name sent with uploads.
    pub product_name: String,
    /// Re-check schedule after creating an engagement.
    pub recheck: RetryPolicy,
}

/// Result of the upload step. Never changes the acknowledgment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Imported { status: u16 },
    Failed { status: Option<u16>, detail: String },
}

impl UploadOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, UploadOutcome::Imported { .. })
    }
}

/// Success acknowledgment returned to the webhook caller.
///
/// Serializes to the echo body (`status`, `reportVerb`, `reportData`, ...).
/// The engagement, mode and upload outcome are for the caller's logs and
/// are not part of the body.
#[derive(Debug, Clone, Serialize)]
pub struct ReportAck {
    pub status: &'static str,
    #[serde(rename = "reportVerb")]
    pub verb: Value,
    #[serde(rename = "reportData")]
    pub data: Value,
    #[serde(rename = "reportKind")]
    pub kind: String,
    #[serde(rename = "reportName")]
    pub name: String,
    #[serde(rename = "reportNamespace")]
    pub namespace: String,
    #[serde(rename = "reportOperation")]
    pub operation: String,
    #[serde(skip)]
    pub engagement: Engagement,
    #[serde(skip)]
    pub mode: ImportMode,
    #[serde(skip)]
    pub service: String,
    #[serde(skip)]
    pub upload: UploadOutcome,
}

/// Failures that end a request without an upload.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("could not serialize report body: {0}")]
    Report(#[from] serde_json::Error),
}

pub struct ReportOrchestrator {
    backend: Arc<dyn TrackerBackend>,
    resolver: EngagementResolver,
    settings: ReconcileSettings,
}

impl ReportOrchestrator {
    /// Orchestrator that finds engagements by scanning the product listing.
    pub fn new(backend: Arc<dyn TrackerBackend>, settings: ReconcileSettings) -> Self {
        let lookup = Arc::new(ListingLookup::new(backend.clone()));
        Self::with_lookup(backend, lookup, settings)
    }

    pub fn with_lookup(
        backend: Arc<dyn TrackerBackend>,
        lookup: Arc<dyn EngagementLookup>,
        settings: ReconcileSettings,
    ) -> Self {
        let resolver = EngagementResolver::new(lookup, backend.clone(), settings.recheck);
        Self {
            backend,
            resolver,
            settings,
        }
    }

    pub async fn handle(&self, envelope: &ReportEnvelope) -> Result<ReportAck, OrchestratorError> {
        let subject = envelope.subject();
        info!(
            kind = %subject.kind,
            name = %subject.name,
            namespace = %subject.namespace,
            verb = %subject.verb,
            operation = %subject.operation,
            "report received"
        );

        let engagement = self
            .resolver
            .resolve(&subject.kind, self.settings.product_id)
            .await
            .inspect_err(|e| {
                error!(kind = %subject.kind, error = %e, "engagement resolution failed")
            })?;

        let mode = select_mode(self.backend.as_ref(), engagement.id).await;
        let service = service_identity(&subject.name);
        let report = serde_json::to_vec(&envelope.operator_object)?;

        let import = FindingImport {
            product_name: self.settings.product_name.clone(),
            engagement_id: engagement.id,
            engagement_name: subject.kind.clone(),
            service: service.clone(),
            scan_date: format_date(today()),
            report,
        };

        let upload = match self.backend.upload_findings(import, mode).await {
            Ok(receipt) => {
                info!(
                    engagement = %subject.kind,
                    %mode,
                    %service,
                    status = receipt.status,
                    "findings uploaded"
                );
                UploadOutcome::Imported {
                    status: receipt.status,
                }
            }
            Err(e) => {
                error!(
                    engagement = %subject.kind,
                    %mode,
                    %service,
                    error = %e,
                    "findings upload failed"
                );
                UploadOutcome::Failed {
                    status: e.status(),
                    detail: e.to_string(),
                }
            }
        };

        Ok(ReportAck {
            status: "success",
            verb: subject.verb,
            data: envelope.operator_object.clone(),
            kind: subject.kind,
            name: subject.name,
            namespace: subject.namespace,
            operation: subject.operation,
            engagement,
            mode,
            service,
            upload,
        })
    }
}
