use std::sync::Arc;

use crate::DaoError;
use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;

/// Stored Danløn OAuth tokens for one (user, company) connection.
/// Access tokens are short-lived (minutes); the refresh token is long-lived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OauthTokenEntity {
    pub user_id: Arc<str>,
    pub company_id: Arc<str>,
    pub access_token: Arc<str>,
    pub refresh_token: Arc<str>,
    pub expires_at: PrimitiveDateTime,
    pub company_name: Option<Arc<str>>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[automock]
#[async_trait]
pub trait OauthTokenDao {
    async fn find(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Option<OauthTokenEntity>, DaoError>;

    async fn find_all_for_user(&self, user_id: &str)
        -> Result<Arc<[OauthTokenEntity]>, DaoError>;

    /// Insert or replace the row for (user_id, company_id). A refresh race
    /// between two handlers resolves last-writer-wins through this upsert.
    async fn upsert(&self, entity: &OauthTokenEntity) -> Result<(), DaoError>;

    async fn delete(&self, user_id: &str, company_id: &str) -> Result<(), DaoError>;
}
