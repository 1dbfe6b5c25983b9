use thiserror::Error;

pub mod employee_mapping;
pub mod oauth_token;
pub mod pay_code_mapping;
pub mod pending_session;

pub use employee_mapping::{EmployeeMappingDao, EmployeeMappingEntity, MockEmployeeMappingDao};
pub use oauth_token::{MockOauthTokenDao, OauthTokenDao, OauthTokenEntity};
pub use pay_code_mapping::{MockPayCodeMappingDao, PayCodeMappingDao, PayCodeMappingEntity};
pub use pending_session::{MockPendingSessionDao, PendingSessionDao, PendingSessionEntity};

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Could not parse stored date time: {0}")]
    DateTimeError(#[from] time::error::Parse),
}
