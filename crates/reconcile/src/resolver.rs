//! Find-or-create for the engagement that groups one resource kind.
//!
//! The tracker has read-after-write lag: an engagement created a moment ago
//! may not appear in listings yet. Resolution therefore creates at most once
//! and then re-checks on a bounded [`RetryPolicy`] schedule; if the
//! engagement is still invisible the request fails instead of retrying
//! indefinitely.

use std::sync::Arc;

use async_trait::async_trait;
use scanbridge_tracker::{Engagement, TrackerBackend, TrackerError};
use tracing::{info, warn};

use crate::retry::RetryPolicy;

/// Lookup of an engagement by exact name within a product.
///
/// Whether the match is done server-side or by scanning a listing is an
/// implementation detail behind this seam.
#[async_trait]
pub trait EngagementLookup: Send + Sync {
    async fn find_by_name(
        &self,
        product_id: u64,
        name: &str,
    ) -> Result<Option<Engagement>, TrackerError>;
}

/// [`EngagementLookup`] that lists the product's engagements and scans them
/// client-side. The first exact match is authoritative.
pub struct ListingLookup {
    backend: Arc<dyn TrackerBackend>,
}

impl ListingLookup {
    pub fn new(backend: Arc<dyn TrackerBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EngagementLookup for ListingLookup {
    async fn find_by_name(
        &self,
        product_id: u64,
        name: &str,
    ) -> Result<Option<Engagement>, TrackerError> {
        let engagements = self.backend.list_engagements(product_id).await?;
        Ok(engagements.into_iter().find(|e| e.name == name))
    }
}

/// Why an engagement could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The create call itself could not complete.
    #[error("Engagement {name} could not be created: {source}")]
    Create {
        name: String,
        #[source]
        source: TrackerError,
    },

    /// Creation was issued but the engagement never became visible.
    #[error("Engagement {name} could not be created: not visible after {attempts} re-check(s)")]
    NotVisible { name: String, attempts: u32 },
}

/// Resolves a resource kind to its engagement, creating it if needed.
pub struct EngagementResolver {
    lookup: Arc<dyn EngagementLookup>,
    backend: Arc<dyn TrackerBackend>,
    policy: RetryPolicy,
}

impl EngagementResolver {
    pub fn new(
        lookup: Arc<dyn EngagementLookup>,
        backend: Arc<dyn TrackerBackend>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            lookup,
            backend,
            policy,
        }
    }

    /// Return the engagement named `kind` under `product_id`.
    ///
    /// Fast path: an existing match is returned with no side effects.
    /// Otherwise exactly one create is issued, followed by up to
    /// `policy.max_attempts` re-checks.
    pub async fn resolve(&self, kind: &str, product_id: u64) -> Result<Engagement, ResolveError> {
        if let Some(engagement) = self.find(kind, product_id).await {
            return Ok(engagement);
        }

        info!(engagement = kind, product_id, "creating engagement");
        let status = self
            .backend
            .create_engagement(kind, product_id)
            .await
            .map_err(|source| ResolveError::Create {
                name: kind.to_string(),
                source,
            })?;
        if (200..300).contains(&status) {
            info!(engagement = kind, status, "engagement created");
        } else {
            // A concurrent request may have won the create; the re-check decides.
            warn!(engagement = kind, status, "engagement create not accepted");
        }

        for (attempt, delay) in self.policy.delays().into_iter().enumerate() {
            tokio::time::sleep(delay).await;
            if let Some(engagement) = self.find(kind, product_id).await {
                return Ok(engagement);
            }
            warn!(
                engagement = kind,
                attempt = attempt + 1,
                "engagement not visible yet"
            );
        }

        Err(ResolveError::NotVisible {
            name: kind.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    /// Lookup that treats a failed listing as "not found".
    async fn find(&self, kind: &str, product_id: u64) -> Option<Engagement> {
        match self.lookup.find_by_name(product_id, kind).await {
            Ok(found) => found,
            Err(e) => {
                warn!(engagement = kind, error = %e, "engagement lookup failed");
                None
            }
        }
    }
}
