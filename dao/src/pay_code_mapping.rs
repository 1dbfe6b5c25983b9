use std::sync::Arc;

use crate::DaoError;
use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;

/// Maps the three derived pay categories to Danløn pay-part codes.
/// Exactly one row per (user, company).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayCodeMappingEntity {
    pub user_id: Arc<str>,
    pub company_id: Arc<str>,
    pub normal_code: Arc<str>,
    pub overtime_code: Arc<str>,
    pub callout_code: Arc<str>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[automock]
#[async_trait]
pub trait PayCodeMappingDao {
    async fn find(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Option<PayCodeMappingEntity>, DaoError>;

    async fn upsert(&self, entity: &PayCodeMappingEntity) -> Result<(), DaoError>;
}
