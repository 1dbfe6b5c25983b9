use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::ServiceError;

/// Low-level GraphQL transport: POST `{query, variables}` with a bearer
/// token. Transport failures (non-200) and GraphQL-level `errors[]` surface
/// as distinct error kinds.
#[automock]
#[async_trait]
pub trait GraphqlService {
    async fn execute(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Value, ServiceError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanlonEmployee {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub domain_id: Option<Arc<str>>,
}

/// A pay-part code together with which value fields it accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayPartCodeMeta {
    pub code: Arc<str>,
    pub description: Arc<str>,
    pub units_allowed: bool,
    pub rate_allowed: bool,
    pub amount_allowed: bool,
}

/// One payroll line to submit. `units` are centesimal integers
/// (hours × 100); `amount` is whole DKK. Exactly one of the two is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayPart {
    pub employee_id: Arc<str>,
    pub code: Arc<str>,
    pub units: Option<i64>,
    pub amount: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedPayPart {
    pub employee_id: Arc<str>,
    pub code: Arc<str>,
    pub units: Option<i64>,
    pub amount: Option<i64>,
}

/// High-level Danløn operations. Tokens are fetched (and refreshed) through
/// the OAuth service on every call.
#[automock]
#[async_trait]
pub trait DanlonApiService {
    async fn get_employees(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[DanlonEmployee]>, ServiceError>;

    async fn get_pay_parts_meta(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[PayPartCodeMeta]>, ServiceError>;

    /// Submit all pay parts in a single `createPayParts` mutation.
    /// Not idempotent; callers must not retry blindly.
    async fn create_pay_parts(
        &self,
        user_id: &str,
        company_id: &str,
        pay_parts: &[PayPart],
    ) -> Result<Arc<[CreatedPayPart]>, ServiceError>;
}
