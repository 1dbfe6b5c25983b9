use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

pub mod clock;
pub mod csv_export;
pub mod csv_import;
pub mod danlon_api;
pub mod danlon_oauth;
pub mod ftz_api;
pub mod mapping;
pub mod preview;
pub mod processing;
pub mod records;
pub mod sync;
pub mod uuid_service;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] dao::DaoError),

    #[error("Invalid input: {0}")]
    InvalidInput(Arc<str>),

    #[error("Preview session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Not connected to Danløn")]
    NotConnected,

    #[error("Danløn token refresh failed: {0}")]
    TokenRefreshFailed(Arc<str>),

    #[error("Upstream HTTP error ({status}): {body}")]
    UpstreamHttpError { status: u16, body: Arc<str> },

    #[error("Upstream GraphQL error: {0}")]
    UpstreamGraphqlError(Arc<str>),

    #[error("Invalid date: {0}")]
    DateError(#[from] lontid_utils::LontidDateError),

    #[error("Invalid date component: {0}")]
    DateComponentError(#[from] time::error::ComponentRange),

    #[error("Internal error")]
    InternalError,
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<Arc<str>>) -> Self {
        Self::InvalidInput(message.into())
    }
}
