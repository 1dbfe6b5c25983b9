use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// Pay-part codes for the three derived categories. The demo defaults are
/// T1/T2/T3 until the user saves a mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayCodeMapping {
    pub normal_code: Arc<str>,
    pub overtime_code: Arc<str>,
    pub callout_code: Arc<str>,
    pub is_default: bool,
}

impl Default for PayCodeMapping {
    fn default() -> Self {
        Self {
            normal_code: "T1".into(),
            overtime_code: "T2".into(),
            callout_code: "T3".into(),
            is_default: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeMappingRow {
    pub ftz_employee_name: Arc<str>,
    pub danlon_employee_id: Arc<str>,
    pub danlon_employee_name: Arc<str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackMapping {
    pub danlon_employee_id: Arc<str>,
    pub danlon_employee_name: Arc<str>,
}

/// Explicit FTZ-name rows plus the optional catch-all fallback.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EmployeeMappings {
    pub rows: Vec<EmployeeMappingRow>,
    pub fallback: Option<FallbackMapping>,
}

#[automock]
#[async_trait]
pub trait MappingService {
    async fn pay_code_mapping(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<PayCodeMapping, ServiceError>;

    async fn save_pay_code_mapping(
        &self,
        user_id: &str,
        company_id: &str,
        mapping: &PayCodeMapping,
    ) -> Result<(), ServiceError>;

    async fn employee_mappings(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<EmployeeMappings, ServiceError>;

    /// Replace the stored mapping set. Rows without a name or employee id
    /// are dropped silently, mirroring the save semantics of the frontend.
    async fn save_employee_mappings(
        &self,
        user_id: &str,
        company_id: &str,
        mappings: &EmployeeMappings,
    ) -> Result<(), ServiceError>;
}
