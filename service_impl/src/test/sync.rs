use std::sync::Arc;

use mockall::predicate::{always, eq};
use service::danlon_api::{CreatedPayPart, DanlonEmployee, MockDanlonApiService};
use service::danlon_oauth::MockDanlonOauthService;
use service::mapping::{
    EmployeeMappingRow, EmployeeMappings, FallbackMapping, MockMappingService, PayCodeMapping,
};
use service::preview::{MockPreviewCacheService, PreviewSnapshot};
use service::processing::{DailyOutput, OvertimeBreakdown};
use service::records::EmployeeType;
use service::sync::SyncService;
use service::ServiceError;
use time::macros::{date, datetime};
use uuid::uuid;

use crate::sync::SyncServiceImpl;

const SESSION_ID: uuid::Uuid = uuid!("6A1C17AF-0D52-4316-96A2-308E18C923D1");

fn output_for(worker: &str, normal: f32, overtime_1_2: f32) -> DailyOutput {
    let mut output = DailyOutput::empty(worker.into(), date!(2026 - 01 - 12));
    output.normal_hours = normal;
    output.breakdown = OvertimeBreakdown {
        hour_1_2: overtime_1_2,
        ..OvertimeBreakdown::default()
    };
    output
}

fn snapshot_with(outputs: Vec<DailyOutput>) -> PreviewSnapshot {
    PreviewSnapshot {
        records: Vec::new(),
        outputs,
        summaries: Vec::new(),
        call_out_days: Vec::new(),
        employee_type: EmployeeType::Svend,
        created_at: datetime!(2026-01-12 10:00:00),
    }
}

fn live_employee(id: &str, name: &str) -> DanlonEmployee {
    DanlonEmployee {
        id: id.into(),
        name: name.into(),
        domain_id: None,
    }
}

struct Mocks {
    preview: MockPreviewCacheService,
    mapping: MockMappingService,
    api: MockDanlonApiService,
    oauth: MockDanlonOauthService,
}

impl Mocks {
    fn new() -> Self {
        Self {
            preview: MockPreviewCacheService::new(),
            mapping: MockMappingService::new(),
            api: MockDanlonApiService::new(),
            oauth: MockDanlonOauthService::new(),
        }
    }

    fn build(
        self,
    ) -> SyncServiceImpl<
        MockPreviewCacheService,
        MockMappingService,
        MockDanlonApiService,
        MockDanlonOauthService,
    > {
        SyncServiceImpl::new(
            Arc::new(self.preview),
            Arc::new(self.mapping),
            Arc::new(self.api),
            Arc::new(self.oauth),
        )
    }
}

fn expect_mappings(
    mocks: &mut Mocks,
    pay_codes: PayCodeMapping,
    employee_mappings: EmployeeMappings,
) {
    mocks
        .mapping
        .expect_pay_code_mapping()
        .with(eq("demo_user"), eq("company-1"))
        .returning(move |_, _| Ok(pay_codes.clone()));
    mocks
        .mapping
        .expect_employee_mappings()
        .with(eq("demo_user"), eq("company-1"))
        .returning(move |_, _| Ok(employee_mappings.clone()));
}

#[tokio::test]
async fn unknown_session_fails_with_session_not_found() {
    let mut mocks = Mocks::new();
    mocks
        .preview
        .expect_get()
        .returning(|id| Err(ServiceError::SessionNotFound(id)));
    let service = mocks.build();

    let result = service
        .sync_session(SESSION_ID, "demo_user", Some("company-1".into()))
        .await;
    assert!(matches!(result, Err(ServiceError::SessionNotFound(_))));
}

#[tokio::test]
async fn centesimal_units_and_single_mutation() {
    let mut mocks = Mocks::new();
    mocks.preview.expect_get().returning(|_| {
        Ok(snapshot_with(vec![output_for("Jens Hansen", 7.4, 1.5)]))
    });
    expect_mappings(
        &mut mocks,
        PayCodeMapping::default(),
        EmployeeMappings::default(),
    );
    mocks
        .api
        .expect_get_employees()
        .returning(|_, _| Ok(vec![live_employee("emp-1", "Jens Hansen")].into()));
    mocks
        .api
        .expect_create_pay_parts()
        .with(eq("demo_user"), eq("company-1"), always())
        .times(1)
        .returning(|_, _, pay_parts| {
            // 7.4h normal -> 740 units at T1; 1.5h overtime -> 150 at T2.
            assert_eq!(pay_parts.len(), 2);
            assert_eq!(pay_parts[0].code.as_ref(), "T1");
            assert_eq!(pay_parts[0].units, Some(740));
            assert_eq!(pay_parts[1].code.as_ref(), "T2");
            assert_eq!(pay_parts[1].units, Some(150));
            Ok(pay_parts
                .iter()
                .map(|pay_part| CreatedPayPart {
                    employee_id: pay_part.employee_id.clone(),
                    code: pay_part.code.clone(),
                    units: pay_part.units,
                    amount: pay_part.amount,
                })
                .collect())
        });
    let service = mocks.build();

    let outcome = service
        .sync_session(SESSION_ID, "demo_user", Some("company-1".into()))
        .await
        .expect("sync succeeds");
    assert!(outcome.success);
    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.skipped.is_empty());
    assert!(outcome.unmatched_workers.is_empty());
}

#[tokio::test]
async fn fallback_mapping_catches_unmatched_worker() {
    let mut mocks = Mocks::new();
    mocks.preview.expect_get().returning(|_| {
        Ok(snapshot_with(vec![output_for("Ukendt Navn", 7.4, 0.0)]))
    });
    expect_mappings(
        &mut mocks,
        PayCodeMapping::default(),
        EmployeeMappings {
            rows: Vec::new(),
            fallback: Some(FallbackMapping {
                danlon_employee_id: "emp-fallback".into(),
                danlon_employee_name: "Fælleskonto".into(),
            }),
        },
    );
    mocks
        .api
        .expect_get_employees()
        .returning(|_, _| {
            Ok(vec![
                live_employee("emp-1", "Jens Hansen"),
                live_employee("emp-fallback", "Fælleskonto"),
            ]
            .into())
        });
    mocks
        .api
        .expect_create_pay_parts()
        .returning(|_, _, pay_parts| {
            assert_eq!(pay_parts[0].employee_id.as_ref(), "emp-fallback");
            Ok(Vec::new().into())
        });
    let service = mocks.build();

    let outcome = service
        .sync_session(SESSION_ID, "demo_user", Some("company-1".into()))
        .await
        .expect("sync succeeds");
    assert!(outcome.success);
    assert!(outcome.unmatched_workers.is_empty());
}

#[tokio::test]
async fn explicit_mapping_wins_over_fallback() {
    let mut mocks = Mocks::new();
    mocks.preview.expect_get().returning(|_| {
        Ok(snapshot_with(vec![output_for("JH Mekanik", 7.4, 0.0)]))
    });
    expect_mappings(
        &mut mocks,
        PayCodeMapping::default(),
        EmployeeMappings {
            rows: vec![EmployeeMappingRow {
                ftz_employee_name: "JH Mekanik".into(),
                danlon_employee_id: "emp-2".into(),
                danlon_employee_name: "Jens Hansen".into(),
            }],
            fallback: Some(FallbackMapping {
                danlon_employee_id: "emp-fallback".into(),
                danlon_employee_name: "Fælleskonto".into(),
            }),
        },
    );
    mocks.api.expect_get_employees().returning(|_, _| {
        Ok(vec![
            live_employee("emp-2", "Jens Hansen"),
            live_employee("emp-fallback", "Fælleskonto"),
        ]
        .into())
    });
    mocks
        .api
        .expect_create_pay_parts()
        .returning(|_, _, pay_parts| {
            assert_eq!(pay_parts[0].employee_id.as_ref(), "emp-2");
            Ok(Vec::new().into())
        });
    let service = mocks.build();

    let outcome = service
        .sync_session(SESSION_ID, "demo_user", Some("company-1".into()))
        .await
        .expect("sync succeeds");
    assert!(outcome.success);
}

#[tokio::test]
async fn unresolvable_worker_is_skipped_not_fatal() {
    let mut mocks = Mocks::new();
    mocks.preview.expect_get().returning(|_| {
        Ok(snapshot_with(vec![
            output_for("Jens Hansen", 7.4, 0.0),
            output_for("Ukendt Navn", 8.0, 0.0),
        ]))
    });
    expect_mappings(
        &mut mocks,
        PayCodeMapping::default(),
        EmployeeMappings::default(),
    );
    mocks
        .api
        .expect_get_employees()
        .returning(|_, _| Ok(vec![live_employee("emp-1", "Jens Hansen")].into()));
    mocks
        .api
        .expect_create_pay_parts()
        .returning(|_, _, pay_parts| {
            assert_eq!(pay_parts.len(), 1);
            Ok(Vec::new().into())
        });
    let service = mocks.build();

    let outcome = service
        .sync_session(SESSION_ID, "demo_user", Some("company-1".into()))
        .await
        .expect("sync succeeds despite the per-row miss");
    assert!(outcome.success);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.unmatched_workers.len(), 1);
    assert_eq!(outcome.unmatched_workers[0].as_ref(), "Ukendt Navn");
}

#[tokio::test]
async fn company_id_is_resolved_from_stored_connection() {
    let mut mocks = Mocks::new();
    mocks.preview.expect_get().returning(|_| {
        Ok(snapshot_with(vec![output_for("Jens Hansen", 7.4, 0.0)]))
    });
    mocks
        .oauth
        .expect_resolve_company_id()
        .with(eq("demo_user"))
        .returning(|_| Ok(Some("company-1".into())));
    expect_mappings(
        &mut mocks,
        PayCodeMapping::default(),
        EmployeeMappings::default(),
    );
    mocks
        .api
        .expect_get_employees()
        .returning(|_, _| Ok(vec![live_employee("emp-1", "Jens Hansen")].into()));
    mocks
        .api
        .expect_create_pay_parts()
        .returning(|_, _, _| Ok(Vec::new().into()));
    let service = mocks.build();

    let outcome = service
        .sync_session(SESSION_ID, "demo_user", None)
        .await
        .expect("sync succeeds");
    assert!(outcome.success);
}

#[tokio::test]
async fn disconnected_user_without_company_fails() {
    let mut mocks = Mocks::new();
    mocks
        .preview
        .expect_get()
        .returning(|_| Ok(snapshot_with(vec![output_for("Jens Hansen", 7.4, 0.0)])));
    mocks
        .oauth
        .expect_resolve_company_id()
        .returning(|_| Ok(None));
    let service = mocks.build();

    let result = service.sync_session(SESSION_ID, "demo_user", None).await;
    assert!(matches!(result, Err(ServiceError::NotConnected)));
}
