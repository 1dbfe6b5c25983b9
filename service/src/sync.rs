use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::danlon_api::CreatedPayPart;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedItem {
    pub worker: Arc<str>,
    pub date: Arc<str>,
    pub reason: Arc<str>,
}

/// Structured sync result. Per-row mapping failures land in `skipped` and
/// `unmatched_workers` while the sync as a whole still succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub message: Arc<str>,
    pub created: Arc<[CreatedPayPart]>,
    pub skipped: Arc<[SkippedItem]>,
    pub errors: Arc<[Arc<str>]>,
    pub unmatched_workers: Arc<[Arc<str>]>,
}

/// Pushes a cached preview session to Danløn: applies the pay-code and
/// employee mappings and submits one `createPayParts` mutation.
#[automock]
#[async_trait]
pub trait SyncService {
    async fn sync_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        company_id: Option<Arc<str>>,
    ) -> Result<SyncOutcome, ServiceError>;
}
