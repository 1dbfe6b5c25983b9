//! Bearer-token acquisition for the FTZ Core API.
//!
//! Tokens are exchanged for the configured API key and cached until five
//! minutes before expiry. The cache is process-wide; a refresh race simply
//! exchanges twice, which the upstream tolerates.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use service::ServiceError;
use time::OffsetDateTime;
use tracing::info;

use crate::config::FtzConfig;

const EARLY_REFRESH: time::Duration = time::Duration::minutes(5);

#[derive(Clone)]
struct CachedToken {
    token: Arc<str>,
    expires_at: OffsetDateTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    expires_in: Option<i64>,
    valid_to: Option<String>,
}

pub struct FtzAuthClient {
    config: Arc<FtzConfig>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl FtzAuthClient {
    pub fn new(config: Arc<FtzConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            cached: Mutex::new(None),
        }
    }

    pub fn subscription_key(&self) -> Option<Arc<str>> {
        self.config.apim_subscription_key.clone()
    }

    pub async fn get_token(&self) -> Result<Arc<str>, ServiceError> {
        let now = OffsetDateTime::now_utc();
        {
            let cached = self.cached.lock().expect("token cache mutex poisoned");
            if let Some(token) = cached.as_ref() {
                if now < token.expires_at - EARLY_REFRESH {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *self.cached.lock().expect("token cache mutex poisoned") = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self, now: OffsetDateTime) -> Result<CachedToken, ServiceError> {
        if self.config.core_api_url.is_empty() || self.config.api_auth_key.is_empty() {
            return Err(ServiceError::invalid_input(
                "FTZ API access is not configured; set CORE_API_URL and API_AUTH_KEY",
            ));
        }

        let url = format!("{}/Authentication/apiaccess", self.config.core_api_url);
        let mut request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "key": self.config.api_auth_key.as_ref() }));
        if let Some(key) = &self.config.apim_subscription_key {
            request = request.header("Ocp-Apim-Subscription-Key", key.as_ref());
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let auth: AuthResponse = response.json().await.map_err(transport_error)?;
        let expires_at = match (auth.expires_in, auth.valid_to.as_deref()) {
            (Some(seconds), _) => now + time::Duration::seconds(seconds),
            (None, Some(valid_to)) => OffsetDateTime::parse(
                valid_to,
                &time::format_description::well_known::Rfc3339,
            )
            .unwrap_or(now + time::Duration::hours(1)),
            (None, None) => now + time::Duration::hours(1),
        };

        info!("obtained FTZ API token");
        Ok(CachedToken {
            token: auth.token.into(),
            expires_at,
        })
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> ServiceError {
    ServiceError::UpstreamHttpError {
        status: err.status().map(|status| status.as_u16()).unwrap_or(0),
        body: err.to_string().into(),
    }
}

pub(crate) fn upstream_error(status: u16, body: &str) -> ServiceError {
    let excerpt: String = body.chars().take(500).collect();
    ServiceError::UpstreamHttpError {
        status,
        body: excerpt.into(),
    }
}
