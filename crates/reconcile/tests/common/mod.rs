//! Scripted in-memory tracker shared by the reconcile integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scanbridge_reconcile::{ReconcileSettings, ReportEnvelope, RetryPolicy};
use scanbridge_tracker::{
    Engagement, FindingImport, ImportMode, TestRecord, TrackerBackend, TrackerError, UploadReceipt,
};

/// A call observed by the fake tracker.
#[derive(Debug, Clone)]
pub enum Call {
    ListEngagements(u64),
    ListTests(u64),
    Create { name: String, product_id: u64 },
    Upload { mode: ImportMode, import: FindingImport },
}

/// When an engagement created through the fake becomes visible to listings.
#[derive(Debug, Clone, Copy)]
pub enum Visibility {
    /// Listed from the first lookup after the create.
    Immediate { id: u64 },
    /// Listed only after this many further lookups have missed it.
    AfterListings { id: u64, misses: usize },
    /// Never listed.
    Never,
}

#[derive(Debug, Clone)]
pub enum UploadBehavior {
    Accept(u16),
    Reject(u16, String),
    Unreachable(String),
}

struct Pending {
    engagement: Engagement,
    misses_left: usize,
}

pub struct FakeTracker {
    engagements: Mutex<Vec<Engagement>>,
    pending: Mutex<Option<Pending>>,
    tests: Mutex<HashMap<u64, usize>>,
    calls: Mutex<Vec<Call>>,
    visibility: Visibility,
    create_status: u16,
    create_unreachable: bool,
    listing_fails: bool,
    tests_fail: bool,
    upload: UploadBehavior,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            engagements: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            tests: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            visibility: Visibility::Immediate { id: 1 },
            create_status: 201,
            create_unreachable: false,
            listing_fails: false,
            tests_fail: false,
            upload: UploadBehavior::Accept(201),
        }
    }

    pub fn with_engagement(self, id: u64, name: &str) -> Self {
        self.engagements.lock().unwrap().push(Engagement {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_tests(self, engagement_id: u64, count: usize) -> Self {
        self.tests.lock().unwrap().insert(engagement_id, count);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_create_status(mut self, status: u16) -> Self {
        self.create_status = status;
        self
    }

    pub fn with_unreachable_create(mut self) -> Self {
        self.create_unreachable = true;
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn with_failing_tests(mut self) -> Self {
        self.tests_fail = true;
        self
    }

    pub fn with_upload(mut self, upload: UploadBehavior) -> Self {
        self.upload = upload;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<(String, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { name, product_id } => Some((name, product_id)),
                _ => None,
            })
            .collect()
    }

    pub fn listings(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ListEngagements(_)))
            .count()
    }

    pub fn uploads(&self) -> Vec<(ImportMode, FindingImport)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { mode, import } => Some((mode, import)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TrackerBackend for FakeTracker {
    async fn list_engagements(&self, product_id: u64) -> Result<Vec<Engagement>, TrackerError> {
        self.record(Call::ListEngagements(product_id));
        if self.listing_fails {
            return Err(TrackerError::Rejected {
                operation: "list engagements".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut pending = self.pending.lock().unwrap();
        if let Some(p) = pending.as_mut() {
            if p.misses_left == 0 {
                let engagement = p.engagement.clone();
                *pending = None;
                self.engagements.lock().unwrap().push(engagement);
            } else {
                p.misses_left -= 1;
            }
        }
        Ok(self.engagements.lock().unwrap().clone())
    }

    async fn list_tests(&self, engagement_id: u64) -> Result<Vec<TestRecord>, TrackerError> {
        self.record(Call::ListTests(engagement_id));
        if self.tests_fail {
            return Err(TrackerError::Transport {
                operation: "list tests".to_string(),
                detail: "connection reset by peer".to_string(),
            });
        }
        let count = self
            .tests
            .lock()
            .unwrap()
            .get(&engagement_id)
            .copied()
            .unwrap_or(0);
        Ok((0..count as u64).map(|id| TestRecord { id: id + 100 }).collect())
    }

    async fn create_engagement(&self, name: &str, product_id: u64) -> Result<u16, TrackerError> {
        self.record(Call::Create {
            name: name.to_string(),
            product_id,
        });
        if self.create_unreachable {
            return Err(TrackerError::Transport {
                operation: "create engagement".to_string(),
                detail: "Connection refused (os error 111)".to_string(),
            });
        }
        let make = |id| Engagement {
            id,
            name: name.to_string(),
        };
        match self.visibility {
            Visibility::Immediate { id } => self.engagements.lock().unwrap().push(make(id)),
            Visibility::AfterListings { id, misses } => {
                *self.pending.lock().unwrap() = Some(Pending {
                    engagement: make(id),
                    misses_left: misses,
                })
            }
            Visibility::Never => {}
        }
        Ok(self.create_status)
    }

    async fn upload_findings(
        &self,
        import: FindingImport,
        mode: ImportMode,
    ) -> Result<UploadReceipt, TrackerError> {
        self.record(Call::Upload { mode, import });
        match &self.upload {
            UploadBehavior::Accept(status) => Ok(UploadReceipt {
                status: *status,
                body: "{}".to_string(),
            }),
            UploadBehavior::Reject(status, body) => Err(TrackerError::Rejected {
                operation: mode.endpoint().to_string(),
                status: *status,
                body: body.clone(),
            }),
            UploadBehavior::Unreachable(detail) => Err(TrackerError::Transport {
                operation: mode.endpoint().to_string(),
                detail: detail.clone(),
            }),
        }
    }
}

/// Re-check policy that does not actually wait.
pub fn instant(attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed(attempts, Duration::ZERO)
}

pub fn settings() -> ReconcileSettings {
    ReconcileSettings {
        product_id: 3,
        product_name: "Platform".to_string(),
        recheck: instant(1),
    }
}

pub fn shared(tracker: FakeTracker) -> Arc<FakeTracker> {
    Arc::new(tracker)
}

pub fn envelope(kind: &str, name: &str) -> ReportEnvelope {
    serde_json::from_value(serde_json::json!({
        "verb": "update",
        "operatorObject": {
            "apiVersion": "aquasecurity.github.io/v1alpha1",
            "kind": kind,
            "metadata": {"name": name, "namespace": "apps"},
            "managedFields": [{"manager": "trivy-operator", "operation": "Update"}],
            "report": {"summary": {"criticalCount": 1}}
        }
    }))
    .unwrap()
}
