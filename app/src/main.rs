#[cfg(test)]
mod integration_test;

use std::sync::Arc;

use service_impl::config::{DanlonConfig, FtzConfig};
use service_impl::{ClockServiceImpl, UuidServiceImpl};
use sqlx::SqlitePool;
use tracing_subscriber::fmt::format::FmtSpan;

type OauthTokenDao = dao_impl_sqlite::OauthTokenDaoImpl;
type PendingSessionDao = dao_impl_sqlite::PendingSessionDaoImpl;
type PayCodeMappingDao = dao_impl_sqlite::PayCodeMappingDaoImpl;
type EmployeeMappingDao = dao_impl_sqlite::EmployeeMappingDaoImpl;

type CsvImportService = service_impl::csv_import::CsvImportServiceImpl;
type ProcessingService = service_impl::processing::ProcessingServiceImpl;
type CsvExportService = service_impl::csv_export::CsvExportServiceImpl;
type PreviewCacheService =
    service_impl::preview::PreviewCacheServiceImpl<ClockServiceImpl, UuidServiceImpl>;
type FtzApiService = service_impl::ftz_api::FtzApiServiceImpl;
type GraphqlService = service_impl::danlon_api::GraphqlServiceImpl;
type DanlonOauthService = service_impl::danlon_oauth::DanlonOauthServiceImpl<
    OauthTokenDao,
    PendingSessionDao,
    GraphqlService,
    ClockServiceImpl,
    UuidServiceImpl,
>;
type DanlonApiService =
    service_impl::danlon_api::DanlonApiServiceImpl<DanlonOauthService, GraphqlService>;
type MappingService =
    service_impl::mapping::MappingServiceImpl<PayCodeMappingDao, EmployeeMappingDao, ClockServiceImpl>;
type SyncService = service_impl::sync::SyncServiceImpl<
    PreviewCacheService,
    MappingService,
    DanlonApiService,
    DanlonOauthService,
>;

#[derive(Clone)]
pub struct RestStateImpl {
    csv_import_service: Arc<CsvImportService>,
    processing_service: Arc<ProcessingService>,
    preview_cache_service: Arc<PreviewCacheService>,
    csv_export_service: Arc<CsvExportService>,
    ftz_api_service: Arc<FtzApiService>,
    danlon_oauth_service: Arc<DanlonOauthService>,
    danlon_api_service: Arc<DanlonApiService>,
    mapping_service: Arc<MappingService>,
    sync_service: Arc<SyncService>,
}

impl rest::RestStateDef for RestStateImpl {
    type CsvImportService = CsvImportService;
    type ProcessingService = ProcessingService;
    type PreviewCacheService = PreviewCacheService;
    type CsvExportService = CsvExportService;
    type FtzApiService = FtzApiService;
    type DanlonOauthService = DanlonOauthService;
    type DanlonApiService = DanlonApiService;
    type MappingService = MappingService;
    type SyncService = SyncService;

    fn csv_import_service(&self) -> Arc<Self::CsvImportService> {
        self.csv_import_service.clone()
    }
    fn processing_service(&self) -> Arc<Self::ProcessingService> {
        self.processing_service.clone()
    }
    fn preview_cache_service(&self) -> Arc<Self::PreviewCacheService> {
        self.preview_cache_service.clone()
    }
    fn csv_export_service(&self) -> Arc<Self::CsvExportService> {
        self.csv_export_service.clone()
    }
    fn ftz_api_service(&self) -> Arc<Self::FtzApiService> {
        self.ftz_api_service.clone()
    }
    fn danlon_oauth_service(&self) -> Arc<Self::DanlonOauthService> {
        self.danlon_oauth_service.clone()
    }
    fn danlon_api_service(&self) -> Arc<Self::DanlonApiService> {
        self.danlon_api_service.clone()
    }
    fn mapping_service(&self) -> Arc<Self::MappingService> {
        self.mapping_service.clone()
    }
    fn sync_service(&self) -> Arc<Self::SyncService> {
        self.sync_service.clone()
    }
}

impl RestStateImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        let ftz_config = Arc::new(FtzConfig::from_env());
        let danlon_config = Arc::new(DanlonConfig::from_env());

        let clock_service = Arc::new(ClockServiceImpl);
        let uuid_service = Arc::new(UuidServiceImpl);

        let oauth_token_dao = Arc::new(OauthTokenDao::new(pool.clone()));
        let pending_session_dao = Arc::new(PendingSessionDao::new(pool.clone()));
        let pay_code_mapping_dao = Arc::new(PayCodeMappingDao::new(pool.clone()));
        let employee_mapping_dao = Arc::new(EmployeeMappingDao::new(pool));

        let csv_import_service = Arc::new(CsvImportService::new());
        let processing_service = Arc::new(service_impl::processing::ProcessingServiceImpl);
        let csv_export_service = Arc::new(service_impl::csv_export::CsvExportServiceImpl);
        let preview_cache_service = Arc::new(PreviewCacheService::new(
            clock_service.clone(),
            uuid_service.clone(),
        ));

        let ftz_auth = Arc::new(service_impl::ftz_auth::FtzAuthClient::new(
            ftz_config.clone(),
        ));
        let ftz_api_service = Arc::new(FtzApiService::new(ftz_config, ftz_auth));

        let graphql_service = Arc::new(GraphqlService::new(danlon_config.clone()));
        let danlon_oauth_service = Arc::new(DanlonOauthService::new(
            danlon_config,
            oauth_token_dao,
            pending_session_dao,
            graphql_service.clone(),
            clock_service.clone(),
            uuid_service,
        ));
        let danlon_api_service = Arc::new(DanlonApiService::new(
            danlon_oauth_service.clone(),
            graphql_service,
        ));
        let mapping_service = Arc::new(MappingService::new(
            pay_code_mapping_dao,
            employee_mapping_dao,
            clock_service,
        ));
        let sync_service = Arc::new(SyncService::new(
            preview_cache_service.clone(),
            mapping_service.clone(),
            danlon_api_service.clone(),
            danlon_oauth_service.clone(),
        ));

        Self {
            csv_import_service,
            processing_service,
            preview_cache_service,
            csv_export_service,
            ftz_api_service,
            danlon_oauth_service,
            danlon_api_service,
            mapping_service,
            sync_service,
        }
    }
}

#[tokio::main]
async fn main() {
    let version = env!("CARGO_PKG_VERSION");

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_span_list(true)
        .with_file(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    tracing::info!("Lontid backend version: {}", version);
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./lontid.sqlite3?mode=rwc".to_string());
    let pool = Arc::new(
        SqlitePool::connect(&database_url)
            .await
            .expect("Could not connect to database"),
    );
    dao_impl_sqlite::create_schema(&pool)
        .await
        .expect("Could not initialize database schema");

    let rest_state = RestStateImpl::new(pool);
    rest::start_server(rest_state).await
}
