//! Client side of the vulnerability tracker protocol: record types, the
//! [`TrackerBackend`] trait, and its HTTP implementation.

mod config;
mod error;
mod http;
mod record;
mod traits;

pub use config::{TrackerConfig, DEFAULT_AUTH_SCHEME, DEFAULT_REQUEST_TIMEOUT};
pub use error::TrackerError;
pub use http::{engagement_window, format_date, today, HttpTracker, MAX_PAGES};
pub use record::{
    Engagement, FindingImport, ImportMode, Page, TestRecord, UploadReceipt, GROUP_BY,
    MINIMUM_SEVERITY, SCAN_TYPE,
};
pub use traits::TrackerBackend;
