use std::sync::Arc;

use crate::DaoError;
use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;

/// One FTZ-name → Danløn-employee mapping row. The single row with
/// `is_fallback` set has no FTZ name and catches every unmatched worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeMappingEntity {
    pub user_id: Arc<str>,
    pub company_id: Arc<str>,
    pub ftz_employee_name: Option<Arc<str>>,
    pub danlon_employee_id: Arc<str>,
    pub danlon_employee_name: Arc<str>,
    pub is_fallback: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[automock]
#[async_trait]
pub trait EmployeeMappingDao {
    async fn find_all(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[EmployeeMappingEntity]>, DaoError>;

    /// Replace the full mapping set for (user, company) in one transaction.
    async fn replace_all(
        &self,
        user_id: &str,
        company_id: &str,
        rows: &[EmployeeMappingEntity],
    ) -> Result<(), DaoError>;
}
