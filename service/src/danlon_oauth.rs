//! Danløn OAuth2 connection lifecycle.
//!
//! The three-party flow: our authorize redirect to the IdP, a callback code
//! exchanged for temporary tokens, a marketplace company-select handoff, and
//! a final `code2token` exchange producing the company-scoped tokens that
//! are persisted per (user, company).

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::ServiceError;

/// A stored, company-scoped Danløn connection (token row minus the secrets).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub company_id: Arc<str>,
    pub company_name: Option<Arc<str>>,
    pub expires_at: PrimitiveDateTime,
    pub created_at: PrimitiveDateTime,
}

/// An OAuth flow waiting for the marketplace redirect to come back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFlow {
    pub session_id: Uuid,
    pub select_company_url: Arc<str>,
    pub expires_at: PrimitiveDateTime,
}

/// Manually supplied tokens for the demo fallback where the marketplace
/// redirect never arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualTokens {
    pub access_token: Arc<str>,
    pub refresh_token: Arc<str>,
    pub company_id: Option<Arc<str>>,
    pub company_name: Option<Arc<str>>,
    pub expires_in: Option<i64>,
}

#[automock]
#[async_trait]
pub trait DanlonOauthService {
    /// Authorization URL for the IdP redirect. A caller-supplied return URI
    /// is folded into the redirect_uri so it survives the round trip.
    fn authorization_url(&self, return_uri: Option<Arc<str>>) -> Arc<str>;

    /// Handle the IdP callback: exchange the code for temporary tokens,
    /// persist a pending session and return the marketplace
    /// company-select URL to redirect the user to.
    async fn handle_callback(
        &self,
        user_id: &str,
        code: &str,
        return_uri: Option<Arc<str>>,
    ) -> Result<Arc<str>, ServiceError>;

    /// Complete the connection with the marketplace code (success redirect
    /// or manual entry). `company_id` arrives base64-encoded when present;
    /// otherwise it is resolved via GraphQL with the fresh access token.
    async fn complete_with_code(
        &self,
        user_id: &str,
        code: &str,
        company_id_b64: Option<Arc<str>>,
        company_name: Option<Arc<str>>,
    ) -> Result<Connection, ServiceError>;

    /// Fully manual completion: store caller-supplied tokens directly.
    async fn complete_with_tokens(
        &self,
        user_id: &str,
        tokens: &ManualTokens,
    ) -> Result<Connection, ServiceError>;

    /// Active pending flow for the user, if any (15-minute TTL, lazy).
    async fn pending_flow(&self, user_id: &str) -> Result<Option<PendingFlow>, ServiceError>;

    /// Revoke upstream and delete the local row. The local row is deleted
    /// even when the upstream revoke fails; local state must not lie.
    async fn disconnect(&self, user_id: &str, company_id: &str) -> Result<(), ServiceError>;

    /// Connection status; without a company id the first stored connection
    /// for the user is reported.
    async fn status(
        &self,
        user_id: &str,
        company_id: Option<Arc<str>>,
    ) -> Result<Option<Connection>, ServiceError>;

    /// Company id of the first stored connection, used when endpoints are
    /// called without an explicit company.
    async fn resolve_company_id(&self, user_id: &str) -> Result<Option<Arc<str>>, ServiceError>;

    /// The stored access token when it is still valid for at least another
    /// minute, otherwise a refreshed one. `NotConnected` when no row
    /// exists; `TokenRefreshFailed` when the IdP rejects the refresh (the
    /// stored row is kept in that case).
    async fn get_valid_access_token(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<str>, ServiceError>;

    /// Where to send the browser after a connection completes without a
    /// return URI.
    fn frontend_redirect_url(&self) -> Arc<str>;
}
