//! Environment-backed configuration records.
//!
//! Read once at startup and passed through constructors; no service reads
//! the environment after boot.

use std::env;
use std::sync::Arc;

/// FTZ Core/Time API access.
#[derive(Clone, Debug)]
pub struct FtzConfig {
    pub core_api_url: Arc<str>,
    pub time_api_url: Arc<str>,
    pub api_auth_key: Arc<str>,
    pub apim_subscription_key: Option<Arc<str>>,
}

impl FtzConfig {
    pub fn from_env() -> Self {
        Self {
            core_api_url: env_arc("CORE_API_URL"),
            time_api_url: env_arc("TIME_API_URL"),
            api_auth_key: env_arc("API_AUTH_KEY"),
            apim_subscription_key: env::var("APIM_SUBSCRIPTION_KEY")
                .ok()
                .filter(|value| !value.is_empty())
                .map(Arc::from),
        }
    }
}

/// Danløn OAuth2 + GraphQL endpoints. The demo and production environments
/// use different realms and hosts.
#[derive(Clone, Debug)]
pub struct DanlonConfig {
    pub client_id: Arc<str>,
    pub client_secret: Arc<str>,
    pub auth_url: Arc<str>,
    pub token_url: Arc<str>,
    pub revoke_url: Arc<str>,
    pub select_company_url: Arc<str>,
    pub code2token_url: Arc<str>,
    pub graphql_url: Arc<str>,
    pub scope: Arc<str>,
    pub redirect_uri: Arc<str>,
    pub success_uri: Arc<str>,
    pub frontend_base_url: Arc<str>,
}

impl DanlonConfig {
    pub fn from_env() -> Self {
        let environment = env::var("DANLON_ENVIRONMENT").unwrap_or_else(|_| "demo".to_string());
        let (auth_base, marketplace_base, graphql_url) = if environment == "prod" {
            (
                "https://auth.lessor.dk/auth/realms/danlon",
                "https://danlon.lessor.dk",
                "https://api.danlon.dk/graphql",
            )
        } else {
            (
                "https://auth.lessor.dk/auth/realms/danlon-integration-demo",
                "https://danlon-integration-demo.lessor.dk",
                "https://api-demo.danlon.dk/graphql",
            )
        };

        let app_base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let frontend_base_url = env::var("FRONTEND_BASE_URL").unwrap_or_else(|_| app_base_url.clone());

        Self {
            client_id: env::var("DANLON_CLIENT_ID")
                .unwrap_or_else(|_| "partner-showcase".to_string())
                .into(),
            client_secret: env_arc("DANLON_CLIENT_SECRET"),
            auth_url: format!("{auth_base}/protocol/openid-connect/auth").into(),
            token_url: format!("{auth_base}/protocol/openid-connect/token").into(),
            revoke_url: format!("{auth_base}/protocol/openid-connect/revoke").into(),
            select_company_url: format!("{marketplace_base}/select-company").into(),
            code2token_url: format!("{marketplace_base}/code2token").into(),
            graphql_url: graphql_url.into(),
            scope: "openid email offline_access".into(),
            redirect_uri: format!("{app_base_url}/danlon/callback").into(),
            success_uri: format!("{app_base_url}/danlon/success").into(),
            frontend_base_url: frontend_base_url.into(),
        }
    }
}

fn env_arc(name: &str) -> Arc<str> {
    env::var(name).unwrap_or_default().into()
}
