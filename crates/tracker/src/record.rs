use std::fmt;

use serde::{Deserialize, Serialize};

/// An engagement as returned by the tracker's engagement listing.
///
/// Only `id` and `name` are consumed; every other field the tracker
/// returns is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: u64,
    pub name: String,
}

/// A test record scoped to an engagement. Its existence is the signal that
/// the engagement has already received an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: u64,
}

/// Paginated list envelope used by every tracker listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Which of the two mutually-exclusive upload operations to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    /// First-time import: creates a new test under the engagement.
    Import,
    /// Merge into the engagement's existing test with deduplication.
    Reimport,
}

impl ImportMode {
    /// Path segment of the upload endpoint for this mode.
    pub fn endpoint(self) -> &'static str {
        match self {
            ImportMode::Import => "import-scan",
            ImportMode::Reimport => "reimport-scan",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Minimum severity of findings to import.
pub const MINIMUM_SEVERITY: &str = "Critical";

/// Scan type label understood by the tracker's parser.
pub const SCAN_TYPE: &str = "Trivy Operator Scan";

/// Finding grouping policy.
pub const GROUP_BY: &str = "component_name";

/// One upload of a serialized scan report.
///
/// The fixed part of the form (severity floor, flags, scan type, grouping)
/// is not configurable and is added by [`FindingImport::form_fields`].
#[derive(Debug, Clone)]
pub struct FindingImport {
    pub product_name: String,
    pub engagement_id: u64,
    pub engagement_name: String,
    pub service: String,
    /// Scan date, `YYYY-MM-DD`.
    pub scan_date: String,
    /// Raw report body attached as the `file` part.
    pub report: Vec<u8>,
}

impl FindingImport {
    /// Text fields of the multipart form, in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("minimum_severity", MINIMUM_SEVERITY.to_string()),
            ("active", "true".to_string()),
            ("verified", "true".to_string()),
            ("scan_type", SCAN_TYPE.to_string()),
            ("close_old_findings", "true".to_string()),
            ("push_to_jira", "false".to_string()),
            ("deduplication_on_engagement", "true".to_string()),
            ("group_by", GROUP_BY.to_string()),
            ("product_name", self.product_name.clone()),
            ("scan_date", self.scan_date.clone()),
            ("engagement", self.engagement_id.to_string()),
            ("engagement_name", self.engagement_name.clone()),
            ("service", self.service.clone()),
        ]
    }
}

/// A completed, successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    pub body: String,
}
