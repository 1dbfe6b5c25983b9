use std::sync::Arc;

use crate::DaoError;
use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Bridges the OAuth callback and the marketplace company-select redirect.
/// Rows live for 15 minutes and are removed lazily once expired or when the
/// connection completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSessionEntity {
    pub session_id: Uuid,
    pub user_id: Arc<str>,
    pub select_company_url: Arc<str>,
    pub temp_access_token: Arc<str>,
    pub temp_refresh_token: Option<Arc<str>>,
    pub created_at: PrimitiveDateTime,
    pub expires_at: PrimitiveDateTime,
}

#[automock]
#[async_trait]
pub trait PendingSessionDao {
    async fn create(&self, entity: &PendingSessionEntity) -> Result<(), DaoError>;

    /// Most recent non-expired session for the user, if any.
    async fn find_active_by_user(
        &self,
        user_id: &str,
        now: PrimitiveDateTime,
    ) -> Result<Option<PendingSessionEntity>, DaoError>;

    async fn delete_for_user(&self, user_id: &str) -> Result<(), DaoError>;

    async fn delete_expired(&self, now: PrimitiveDateTime) -> Result<(), DaoError>;
}
