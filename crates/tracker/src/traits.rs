use async_trait::async_trait;

use crate::error::TrackerError;
use crate::record::{Engagement, FindingImport, ImportMode, TestRecord, UploadReceipt};

/// Client-side protocol against the vulnerability tracker.
///
/// Every operation is a single remote call (or one paginated listing) with
/// no retry. Retry and fallback decisions belong to the caller.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be shared across
/// request handlers behind an `Arc`.
#[async_trait]
pub trait TrackerBackend: Send + Sync + 'static {
    /// List the engagements of a product.
    ///
    /// Any non-200 response is `Err(TrackerError::Rejected)`.
    async fn list_engagements(&self, product_id: u64) -> Result<Vec<Engagement>, TrackerError>;

    /// List the tests recorded under an engagement.
    async fn list_tests(&self, engagement_id: u64) -> Result<Vec<TestRecord>, TrackerError>;

    /// Create an engagement spanning today through one year from today.
    ///
    /// Returns the raw HTTP status, including non-2xx statuses; only a
    /// transport failure is an error. A success status does not mean the
    /// engagement is already visible to listings.
    async fn create_engagement(&self, name: &str, product_id: u64) -> Result<u16, TrackerError>;

    /// Upload a report through the import or reimport endpoint.
    async fn upload_findings(
        &self,
        import: FindingImport,
        mode: ImportMode,
    ) -> Result<UploadReceipt, TrackerError>;
}
