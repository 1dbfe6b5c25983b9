//! Danløn OAuth2 broker.
//!
//! Implements the three-party flow against the Lessor IdP and the Danløn
//! marketplace: authorize, callback code exchange, company-select handoff,
//! final `code2token` exchange, refresh and revoke. Tokens are persisted
//! per (user, company); pending sessions bridge the marketplace redirect
//! for 15 minutes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dao::{OauthTokenDao, OauthTokenEntity, PendingSessionDao, PendingSessionEntity};
use serde::Deserialize;
use service::clock::ClockService;
use service::danlon_api::GraphqlService;
use service::danlon_oauth::{Connection, DanlonOauthService, ManualTokens, PendingFlow};
use service::uuid_service::UuidService;
use service::ServiceError;
use tracing::{info, warn};
use url::Url;

use crate::config::DanlonConfig;
use crate::ftz_auth::{transport_error, upstream_error};

/// Access tokens live five minutes upstream; refresh one minute early.
const TOKEN_VALIDITY_BUFFER: time::Duration = time::Duration::seconds(60);
const DEFAULT_EXPIRES_IN: i64 = 300;
const PENDING_SESSION_TTL: time::Duration = time::Duration::minutes(15);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub struct DanlonOauthServiceImpl<
    TokenDao: OauthTokenDao,
    PendingDao: PendingSessionDao,
    Graphql: GraphqlService,
    Clock: ClockService,
    Uuids: UuidService,
> {
    config: Arc<DanlonConfig>,
    http: reqwest::Client,
    token_dao: Arc<TokenDao>,
    pending_dao: Arc<PendingDao>,
    graphql_service: Arc<Graphql>,
    clock_service: Arc<Clock>,
    uuid_service: Arc<Uuids>,
}

impl<
        TokenDao: OauthTokenDao + Send + Sync,
        PendingDao: PendingSessionDao + Send + Sync,
        Graphql: GraphqlService + Send + Sync,
        Clock: ClockService + Send + Sync,
        Uuids: UuidService + Send + Sync,
    > DanlonOauthServiceImpl<TokenDao, PendingDao, Graphql, Clock, Uuids>
{
    pub fn new(
        config: Arc<DanlonConfig>,
        token_dao: Arc<TokenDao>,
        pending_dao: Arc<PendingDao>,
        graphql_service: Arc<Graphql>,
        clock_service: Arc<Clock>,
        uuid_service: Arc<Uuids>,
    ) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            token_dao,
            pending_dao,
            graphql_service,
            clock_service,
            uuid_service,
        }
    }

    /// The redirect_uri must byte-equal between authorize and exchange, so
    /// a return URI is folded into it the same way in both places.
    fn redirect_uri_with_return(&self, return_uri: Option<&str>) -> String {
        match return_uri {
            Some(return_uri) => format!("{}?return_uri={return_uri}", self.config.redirect_uri),
            None => self.config.redirect_uri.to_string(),
        }
    }

    async fn post_token_endpoint(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, ServiceError> {
        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        response.json().await.map_err(transport_error)
    }

    fn select_company_url(&self, temp_access_token: &str, return_uri: Option<&str>) -> String {
        let encoded_token = BASE64.encode(temp_access_token);
        let success_return = match return_uri {
            Some(return_uri) => format!("{}?return_uri={return_uri}", self.config.success_uri),
            None => self.config.success_uri.to_string(),
        };
        Url::parse_with_params(
            &self.config.select_company_url,
            [
                ("token", encoded_token.as_str()),
                ("return_uri", success_return.as_str()),
            ],
        )
        .map(String::from)
        .unwrap_or_else(|_| self.config.select_company_url.to_string())
    }

    /// Resolve the connected company through GraphQL when the marketplace
    /// did not pass it along.
    async fn query_current_company(
        &self,
        access_token: &str,
    ) -> Result<(Arc<str>, Option<Arc<str>>), ServiceError> {
        let data = self
            .graphql_service
            .execute(access_token, "{current_company{id name}}", None)
            .await?;
        let company = &data["current_company"];
        let id = company["id"]
            .as_str()
            .ok_or_else(|| {
                ServiceError::UpstreamGraphqlError("current_company without an id".into())
            })?
            .into();
        let name = company["name"].as_str().map(Arc::from);
        Ok((id, name))
    }

    async fn store_connection(
        &self,
        user_id: &str,
        company_id: Arc<str>,
        company_name: Option<Arc<str>>,
        access_token: Arc<str>,
        refresh_token: Arc<str>,
        expires_in: i64,
    ) -> Result<Connection, ServiceError> {
        let now = self.clock_service.date_time_now();
        let entity = OauthTokenEntity {
            user_id: user_id.into(),
            company_id: company_id.clone(),
            access_token,
            refresh_token,
            expires_at: now + time::Duration::seconds(expires_in),
            company_name: company_name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.token_dao.upsert(&entity).await?;
        self.pending_dao.delete_for_user(user_id).await?;
        info!(user_id, company_id = %company_id, "stored Danløn connection");
        Ok(Connection {
            company_id,
            company_name,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        })
    }
}

#[async_trait]
impl<
        TokenDao: OauthTokenDao + Send + Sync,
        PendingDao: PendingSessionDao + Send + Sync,
        Graphql: GraphqlService + Send + Sync,
        Clock: ClockService + Send + Sync,
        Uuids: UuidService + Send + Sync,
    > DanlonOauthService for DanlonOauthServiceImpl<TokenDao, PendingDao, Graphql, Clock, Uuids>
{
    fn authorization_url(&self, return_uri: Option<Arc<str>>) -> Arc<str> {
        let redirect_uri = self.redirect_uri_with_return(return_uri.as_deref());
        Url::parse_with_params(
            &self.config.auth_url,
            [
                ("client_id", self.config.client_id.as_ref()),
                ("scope", self.config.scope.as_ref()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri.as_str()),
            ],
        )
        .map(|url| Arc::from(String::from(url)))
        .unwrap_or_else(|_| self.config.auth_url.clone())
    }

    async fn handle_callback(
        &self,
        user_id: &str,
        code: &str,
        return_uri: Option<Arc<str>>,
    ) -> Result<Arc<str>, ServiceError> {
        let redirect_uri = self.redirect_uri_with_return(return_uri.as_deref());
        let tokens = self
            .post_token_endpoint(
                &self.config.token_url,
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", self.config.client_id.as_ref()),
                    ("client_secret", self.config.client_secret.as_ref()),
                    ("code", code),
                    ("redirect_uri", redirect_uri.as_str()),
                ],
            )
            .await?;

        let select_company_url: Arc<str> = self
            .select_company_url(&tokens.access_token, return_uri.as_deref())
            .into();

        let now = self.clock_service.date_time_now();
        let session = PendingSessionEntity {
            session_id: self.uuid_service.new_uuid("danlon-pending-session"),
            user_id: user_id.into(),
            select_company_url: select_company_url.clone(),
            temp_access_token: tokens.access_token.into(),
            temp_refresh_token: tokens.refresh_token.map(Into::into),
            created_at: now,
            expires_at: now + PENDING_SESSION_TTL,
        };
        self.pending_dao.create(&session).await?;
        info!(user_id, "created pending Danløn session");

        Ok(select_company_url)
    }

    async fn complete_with_code(
        &self,
        user_id: &str,
        code: &str,
        company_id_b64: Option<Arc<str>>,
        company_name: Option<Arc<str>>,
    ) -> Result<Connection, ServiceError> {
        let url = format!("{}/{}", self.config.code2token_url, code);
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        let tokens: TokenResponse = response.json().await.map_err(transport_error)?;
        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            ServiceError::UpstreamGraphqlError("code2token response without refresh_token".into())
        })?;

        let decoded_company_id = company_id_b64.as_deref().and_then(|encoded| {
            BASE64
                .decode(encoded)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        });

        let (company_id, resolved_name) = match decoded_company_id {
            Some(id) => (Arc::from(id.as_str()), None),
            None => {
                let (id, name) = self.query_current_company(&tokens.access_token).await?;
                (id, name)
            }
        };

        self.store_connection(
            user_id,
            company_id,
            company_name.or(resolved_name),
            tokens.access_token.into(),
            refresh_token.into(),
            tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        )
        .await
    }

    async fn complete_with_tokens(
        &self,
        user_id: &str,
        tokens: &ManualTokens,
    ) -> Result<Connection, ServiceError> {
        let company_id = tokens
            .company_id
            .clone()
            .unwrap_or_else(|| Arc::from("manual"));
        self.store_connection(
            user_id,
            company_id,
            tokens.company_name.clone(),
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        )
        .await
    }

    async fn pending_flow(&self, user_id: &str) -> Result<Option<PendingFlow>, ServiceError> {
        let now = self.clock_service.date_time_now();
        // Lazy TTL: drop expired rows whenever someone asks.
        self.pending_dao.delete_expired(now).await?;
        Ok(self
            .pending_dao
            .find_active_by_user(user_id, now)
            .await?
            .map(|session| PendingFlow {
                session_id: session.session_id,
                select_company_url: session.select_company_url,
                expires_at: session.expires_at,
            }))
    }

    async fn disconnect(&self, user_id: &str, company_id: &str) -> Result<(), ServiceError> {
        let token = self
            .token_dao
            .find(user_id, company_id)
            .await?
            .ok_or(ServiceError::NotConnected)?;

        let revoke_result = self
            .http
            .post(self.config.revoke_url.as_ref())
            .form(&[
                ("client_id", self.config.client_id.as_ref()),
                ("client_secret", self.config.client_secret.as_ref()),
                ("token", token.refresh_token.as_ref()),
            ])
            .send()
            .await;
        match revoke_result {
            Ok(response) if response.status().is_success() => {
                info!(user_id, company_id, "revoked Danløn refresh token")
            }
            Ok(response) => warn!(
                user_id,
                company_id,
                status = response.status().as_u16(),
                "upstream revoke failed; deleting local tokens anyway"
            ),
            Err(err) => warn!(
                user_id,
                company_id,
                error = %err,
                "upstream revoke unreachable; deleting local tokens anyway"
            ),
        }

        // Local state must not lie: the row goes regardless of upstream.
        self.token_dao.delete(user_id, company_id).await?;
        Ok(())
    }

    async fn status(
        &self,
        user_id: &str,
        company_id: Option<Arc<str>>,
    ) -> Result<Option<Connection>, ServiceError> {
        let token = match company_id {
            Some(company_id) => self.token_dao.find(user_id, company_id.as_ref()).await?,
            None => self
                .token_dao
                .find_all_for_user(user_id)
                .await?
                .first()
                .cloned(),
        };
        Ok(token.map(|token| Connection {
            company_id: token.company_id,
            company_name: token.company_name,
            expires_at: token.expires_at,
            created_at: token.created_at,
        }))
    }

    async fn resolve_company_id(&self, user_id: &str) -> Result<Option<Arc<str>>, ServiceError> {
        Ok(self
            .token_dao
            .find_all_for_user(user_id)
            .await?
            .first()
            .map(|token| token.company_id.clone()))
    }

    async fn get_valid_access_token(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<str>, ServiceError> {
        let token = self
            .token_dao
            .find(user_id, company_id)
            .await?
            .ok_or(ServiceError::NotConnected)?;

        let now = self.clock_service.date_time_now();
        if now + TOKEN_VALIDITY_BUFFER < token.expires_at {
            return Ok(token.access_token);
        }

        // Expired or about to: refresh. A concurrent refresh for the same
        // key resolves last-writer-wins through the upsert; the IdP accepts
        // the superseded token within its grace window.
        let refreshed = self
            .post_token_endpoint(
                &self.config.token_url,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", self.config.client_id.as_ref()),
                    ("client_secret", self.config.client_secret.as_ref()),
                    ("refresh_token", token.refresh_token.as_ref()),
                ],
            )
            .await
            .map_err(|err| match err {
                ServiceError::UpstreamHttpError { body, .. } => {
                    ServiceError::TokenRefreshFailed(body)
                }
                other => other,
            })?;

        let access_token: Arc<str> = refreshed.access_token.into();
        let entity = OauthTokenEntity {
            user_id: user_id.into(),
            company_id: company_id.into(),
            access_token: access_token.clone(),
            refresh_token: refreshed
                .refresh_token
                .map(Into::into)
                .unwrap_or(token.refresh_token),
            expires_at: now
                + time::Duration::seconds(refreshed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)),
            company_name: token.company_name,
            created_at: token.created_at,
            updated_at: now,
        };
        self.token_dao.upsert(&entity).await?;
        info!(user_id, company_id, "refreshed Danløn access token");

        Ok(access_token)
    }

    fn frontend_redirect_url(&self) -> Arc<str> {
        format!("{}?danlon_connected=true", self.config.frontend_base_url).into()
    }
}
