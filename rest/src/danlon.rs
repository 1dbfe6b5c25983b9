//! Danløn connection lifecycle, mapping configuration and sync endpoints.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use rest_types::{
    CompleteRequestTO, CompleteResponseTO, ConnectionStatusTO, DanlonEmployeeTO,
    EmployeeMappingsTO, PayCodeMappingTO, PayPartCodeMetaTO, PendingFlowTO, SyncResponseTO,
};
use serde::Deserialize;
use service::danlon_api::DanlonApiService;
use service::danlon_oauth::{DanlonOauthService, ManualTokens};
use service::mapping::MappingService;
use service::sync::SyncService;
use service::ServiceError;
use tracing::instrument;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{error_handler, json_response, redirect_response, RestStateDef, DEMO_USER_ID};

pub fn generate_route<RestState: RestStateDef>() -> Router<RestState> {
    Router::new()
        .route("/connect", get(connect::<RestState>))
        .route("/callback", get(callback::<RestState>))
        .route("/success", get(success::<RestState>))
        .route("/pending", get(pending::<RestState>))
        .route("/complete", post(complete::<RestState>))
        .route("/disconnect", post(disconnect::<RestState>))
        .route("/status", get(status::<RestState>))
        .route("/payparts-meta", get(payparts_meta::<RestState>))
        .route("/employees", get(employees::<RestState>))
        .route(
            "/paycode-mapping",
            get(get_paycode_mapping::<RestState>).put(put_paycode_mapping::<RestState>),
        )
        .route(
            "/employee-mapping",
            get(get_employee_mapping::<RestState>).put(put_employee_mapping::<RestState>),
        )
        .route("/sync/{session_id}", post(sync::<RestState>))
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct UserCompanyQuery {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    company_id: Option<String>,
}

impl UserCompanyQuery {
    fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEMO_USER_ID)
    }
}

/// Company from the query, or the user's first stored connection.
async fn resolve_company<RestState: RestStateDef>(
    rest_state: &RestState,
    query: &UserCompanyQuery,
) -> Result<std::sync::Arc<str>, ServiceError> {
    match query.company_id.as_deref() {
        Some(company_id) if !company_id.is_empty() => Ok(company_id.into()),
        _ => rest_state
            .danlon_oauth_service()
            .resolve_company_id(query.user_id())
            .await?
            .ok_or(ServiceError::NotConnected),
    }
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct ConnectQuery {
    #[serde(default)]
    return_uri: Option<String>,
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/connect",
    tags = ["Danløn"],
    responses((status = 302, description = "Redirect to the Danløn IdP"))
)]
pub async fn connect<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let url = rest_state
        .danlon_oauth_service()
        .authorization_url(query.return_uri.map(Into::into));
    redirect_response(&url)
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    return_uri: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/callback",
    tags = ["Danløn"],
    responses(
        (status = 302, description = "Redirect to the marketplace company select"),
        (status = 400, description = "OAuth error or missing code")
    )
)]
pub async fn callback<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = &query.error {
        let description = query.error_description.as_deref().unwrap_or("");
        return Response::builder()
            .status(400)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(Body::new(format!(
                "<html><head><title>Connection Failed</title></head><body>\
                 <h1>Connection to Danløn Failed</h1>\
                 <p><strong>Error:</strong> {error}</p>\
                 <p><strong>Description:</strong> {description}</p>\
                 <p><a href=\"/\">Return to Home</a></p></body></html>"
            )))
            .unwrap();
    }

    error_handler(
        (async {
            let code = query
                .code
                .as_deref()
                .ok_or_else(|| ServiceError::invalid_input("Missing authorization code"))?;
            let select_company_url = rest_state
                .danlon_oauth_service()
                .handle_callback(DEMO_USER_ID, code, query.return_uri.clone().map(Into::into))
                .await?;
            Ok(redirect_response(&select_company_url))
        })
        .await,
    )
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct SuccessQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    company_id: Option<String>,
    #[serde(default)]
    return_uri: Option<String>,
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/success",
    tags = ["Danløn"],
    responses(
        (status = 302, description = "Connection stored; redirect back"),
        (status = 400, description = "Missing code")
    )
)]
pub async fn success<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<SuccessQuery>,
) -> Response {
    error_handler(
        (async {
            let code = query
                .code
                .as_deref()
                .ok_or_else(|| ServiceError::invalid_input("Missing code parameter"))?;
            let oauth_service = rest_state.danlon_oauth_service();
            oauth_service
                .complete_with_code(
                    DEMO_USER_ID,
                    code,
                    query.company_id.clone().map(Into::into),
                    None,
                )
                .await?;

            let target = match &query.return_uri {
                Some(return_uri) => return_uri.clone(),
                None => oauth_service.frontend_redirect_url().to_string(),
            };
            Ok(redirect_response(&target))
        })
        .await,
    )
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct UserQuery {
    #[serde(default)]
    user_id: Option<String>,
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/pending",
    tags = ["Danløn"],
    responses((status = 200, description = "Pending OAuth flow, if any", body = PendingFlowTO))
)]
pub async fn pending<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserQuery>,
) -> Response {
    error_handler(
        (async {
            let flow = rest_state
                .danlon_oauth_service()
                .pending_flow(query.user_id.as_deref().unwrap_or(DEMO_USER_ID))
                .await?;
            Ok(json_response(&PendingFlowTO::from(flow)))
        })
        .await,
    )
}

#[instrument(skip(rest_state, request))]
#[utoipa::path(
    post,
    path = "/complete",
    tags = ["Danløn"],
    request_body = CompleteRequestTO,
    responses(
        (status = 200, description = "Connection stored", body = CompleteResponseTO),
        (status = 400, description = "Neither code nor tokens supplied")
    )
)]
pub async fn complete<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Json(request): Json<CompleteRequestTO>,
) -> Response {
    error_handler(
        (async {
            let oauth_service = rest_state.danlon_oauth_service();
            let connection = match (&request.code, &request.access_token, &request.refresh_token)
            {
                (Some(code), _, _) if !code.trim().is_empty() => {
                    oauth_service
                        .complete_with_code(
                            DEMO_USER_ID,
                            code.trim(),
                            request
                                .company_id
                                .as_deref()
                                .filter(|company| !company.is_empty())
                                .map(Into::into),
                            request.company_name.as_deref().map(Into::into),
                        )
                        .await?
                }
                (_, Some(access_token), Some(refresh_token)) => {
                    oauth_service
                        .complete_with_tokens(
                            DEMO_USER_ID,
                            &ManualTokens {
                                access_token: access_token.trim().into(),
                                refresh_token: refresh_token.trim().into(),
                                company_id: request
                                    .company_id
                                    .as_deref()
                                    .filter(|company| !company.is_empty())
                                    .map(Into::into),
                                company_name: request.company_name.as_deref().map(Into::into),
                                expires_in: request.expires_in,
                            },
                        )
                        .await?
                }
                _ => {
                    return Err(ServiceError::invalid_input(
                        "Provide either 'code' or both 'access_token' and 'refresh_token'.",
                    ))
                }
            };

            Ok(json_response(&CompleteResponseTO {
                success: true,
                company_id: connection.company_id.to_string(),
                company_name: connection.company_name.map(|name| name.to_string()),
            }))
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    post,
    path = "/disconnect",
    tags = ["Danløn"],
    responses(
        (status = 200, description = "Disconnected"),
        (status = 400, description = "No connection for this user/company")
    )
)]
pub async fn disconnect<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let company_id = query
                .company_id
                .as_deref()
                .filter(|company| !company.is_empty())
                .ok_or_else(|| ServiceError::invalid_input("company_id is required"))?;
            rest_state
                .danlon_oauth_service()
                .disconnect(query.user_id(), company_id)
                .await?;
            Ok(json_response(&serde_json::json!({
                "success": true,
                "message": "Successfully disconnected from Danløn"
            })))
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/status",
    tags = ["Danløn"],
    responses((status = 200, description = "Connection status", body = ConnectionStatusTO))
)]
pub async fn status<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let connection = rest_state
                .danlon_oauth_service()
                .status(query.user_id(), query.company_id.clone().map(Into::into))
                .await?;
            Ok(json_response(&ConnectionStatusTO::from_connection(
                query.user_id(),
                connection,
            )))
        })
        .await,
    )
}

fn demo_pay_parts_meta() -> Vec<PayPartCodeMetaTO> {
    vec![
        PayPartCodeMetaTO {
            code: "T1".to_string(),
            description: "Timeløn 1".to_string(),
            units_allowed: true,
            rate_allowed: false,
            amount_allowed: true,
        },
        PayPartCodeMetaTO {
            code: "T2".to_string(),
            description: "Timeløn 2".to_string(),
            units_allowed: true,
            rate_allowed: true,
            amount_allowed: true,
        },
        PayPartCodeMetaTO {
            code: "T3".to_string(),
            description: "Timeløn 3".to_string(),
            units_allowed: false,
            rate_allowed: false,
            amount_allowed: false,
        },
    ]
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/payparts-meta",
    tags = ["Danløn"],
    responses((status = 200, description = "Available pay-part codes", body = [PayPartCodeMetaTO]))
)]
pub async fn payparts_meta<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let company_id = resolve_company(&rest_state, &query).await?;
            match rest_state
                .danlon_api_service()
                .get_pay_parts_meta(query.user_id(), &company_id)
                .await
            {
                Ok(meta) => {
                    let meta: Vec<PayPartCodeMetaTO> =
                        meta.iter().map(PayPartCodeMetaTO::from).collect();
                    Ok(json_response(
                        &serde_json::json!({ "pay_parts_meta": meta }),
                    ))
                }
                Err(error) => {
                    // The demo environment is often unreachable; fall back
                    // to the known demo codes so the mapping UI still works.
                    tracing::warn!(%error, "payPartsMeta unavailable; returning demo defaults");
                    Ok(json_response(&serde_json::json!({
                        "pay_parts_meta": demo_pay_parts_meta(),
                        "source": "demo_fallback"
                    })))
                }
            }
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/employees",
    tags = ["Danløn"],
    responses(
        (status = 200, description = "Employees of the connected company", body = [DanlonEmployeeTO]),
        (status = 502, description = "Upstream failure")
    )
)]
pub async fn employees<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let company_id = resolve_company(&rest_state, &query).await?;
            let employees = rest_state
                .danlon_api_service()
                .get_employees(query.user_id(), &company_id)
                .await?;
            let employees: Vec<DanlonEmployeeTO> =
                employees.iter().map(DanlonEmployeeTO::from).collect();
            Ok(json_response(
                &serde_json::json!({ "employees": employees }),
            ))
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/paycode-mapping",
    tags = ["Danløn"],
    responses((status = 200, description = "Saved or default pay-code mapping", body = PayCodeMappingTO))
)]
pub async fn get_paycode_mapping<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            // Without a connection the demo defaults still render.
            let mapping = match resolve_company(&rest_state, &query).await {
                Ok(company_id) => {
                    rest_state
                        .mapping_service()
                        .pay_code_mapping(query.user_id(), &company_id)
                        .await?
                }
                Err(ServiceError::NotConnected) => service::mapping::PayCodeMapping::default(),
                Err(error) => return Err(error),
            };
            Ok(json_response(&PayCodeMappingTO::from(&mapping)))
        })
        .await,
    )
}

#[instrument(skip(rest_state, body))]
#[utoipa::path(
    put,
    path = "/paycode-mapping",
    tags = ["Danløn"],
    request_body = PayCodeMappingTO,
    responses(
        (status = 200, description = "Mapping saved", body = PayCodeMappingTO),
        (status = 400, description = "Not connected")
    )
)]
pub async fn put_paycode_mapping<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
    Json(body): Json<PayCodeMappingTO>,
) -> Response {
    error_handler(
        (async {
            let company_id = resolve_company(&rest_state, &query).await?;
            let mapping = service::mapping::PayCodeMapping::from(&body);
            rest_state
                .mapping_service()
                .save_pay_code_mapping(query.user_id(), &company_id, &mapping)
                .await?;
            Ok(json_response(&PayCodeMappingTO::from(&mapping)))
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/employee-mapping",
    tags = ["Danløn"],
    responses((status = 200, description = "Saved employee mappings", body = EmployeeMappingsTO))
)]
pub async fn get_employee_mapping<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let company_id = resolve_company(&rest_state, &query).await?;
            let mappings = rest_state
                .mapping_service()
                .employee_mappings(query.user_id(), &company_id)
                .await?;
            Ok(json_response(&EmployeeMappingsTO::from(&mappings)))
        })
        .await,
    )
}

#[instrument(skip(rest_state, body))]
#[utoipa::path(
    put,
    path = "/employee-mapping",
    tags = ["Danløn"],
    request_body = EmployeeMappingsTO,
    responses(
        (status = 200, description = "Mappings saved"),
        (status = 400, description = "Not connected")
    )
)]
pub async fn put_employee_mapping<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Query(query): Query<UserCompanyQuery>,
    Json(body): Json<EmployeeMappingsTO>,
) -> Response {
    error_handler(
        (async {
            let company_id = resolve_company(&rest_state, &query).await?;
            let mappings = service::mapping::EmployeeMappings::from(&body);
            rest_state
                .mapping_service()
                .save_employee_mappings(query.user_id(), &company_id, &mappings)
                .await?;
            Ok(json_response(&serde_json::json!({ "success": true })))
        })
        .await,
    )
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    post,
    path = "/sync/{session_id}",
    tags = ["Danløn"],
    params(("session_id" = Uuid, Path, description = "Preview session to push")),
    responses(
        (status = 200, description = "Sync result", body = SyncResponseTO),
        (status = 404, description = "Unknown session"),
        (status = 502, description = "Danløn rejected the submission")
    )
)]
pub async fn sync<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<UserCompanyQuery>,
) -> Response {
    error_handler(
        (async {
            let outcome = rest_state
                .sync_service()
                .sync_session(
                    session_id,
                    query.user_id(),
                    query
                        .company_id
                        .as_deref()
                        .filter(|company| !company.is_empty())
                        .map(Into::into),
                )
                .await?;
            Ok(json_response(&SyncResponseTO::from(&outcome)))
        })
        .await,
    )
}

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Danløn", description = "Danløn connection and payroll sync")
    ),
    paths(
        connect,
        callback,
        success,
        pending,
        complete,
        disconnect,
        status,
        payparts_meta,
        employees,
        get_paycode_mapping,
        put_paycode_mapping,
        get_employee_mapping,
        put_employee_mapping,
        sync
    ),
    components(schemas(
        PendingFlowTO,
        CompleteRequestTO,
        CompleteResponseTO,
        ConnectionStatusTO,
        PayCodeMappingTO,
        EmployeeMappingsTO,
        PayPartCodeMetaTO,
        DanlonEmployeeTO,
        SyncResponseTO
    ))
)]
pub struct DanlonApiDoc;
