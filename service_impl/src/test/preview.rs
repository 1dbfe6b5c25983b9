use std::sync::Arc;

use service::clock::MockClockService;
use service::preview::{PreviewCacheService, PreviewSnapshot};
use service::records::EmployeeType;
use service::uuid_service::MockUuidService;
use service::ServiceError;
use time::macros::datetime;
use time::PrimitiveDateTime;
use uuid::{uuid, Uuid};

use crate::preview::PreviewCacheServiceImpl;

fn snapshot() -> PreviewSnapshot {
    PreviewSnapshot {
        records: Vec::new(),
        outputs: Vec::new(),
        summaries: Vec::new(),
        call_out_days: Vec::new(),
        employee_type: EmployeeType::Svend,
        created_at: datetime!(2026-01-12 10:00:00),
    }
}

fn service_at(
    times: Vec<PrimitiveDateTime>,
    ids: Vec<Uuid>,
) -> PreviewCacheServiceImpl<MockClockService, MockUuidService> {
    let mut clock = MockClockService::new();
    let mut time_iter = times.into_iter();
    clock
        .expect_date_time_now()
        .returning(move || time_iter.next().expect("unexpected clock call"));

    let mut uuids = MockUuidService::new();
    let mut id_iter = ids.into_iter();
    uuids
        .expect_new_uuid()
        .returning(move |_| id_iter.next().expect("unexpected uuid call"));

    PreviewCacheServiceImpl::new(Arc::new(clock), Arc::new(uuids))
}

#[test]
fn insert_and_get_round_trip() {
    let id = uuid!("6A1C17AF-0D52-4316-96A2-308E18C923D1");
    let service = service_at(vec![datetime!(2026-01-12 10:00:00)], vec![id]);

    let session_id = service.insert(snapshot());
    assert_eq!(session_id, id);
    let cached = service.get(session_id).expect("cached snapshot");
    assert_eq!(cached.created_at, datetime!(2026-01-12 10:00:00));
}

#[test]
fn unknown_session_is_not_found() {
    let service = service_at(vec![], vec![]);
    let missing = uuid!("93C5B602-9F2D-4D35-A8E3-4A91E0A08C5B");
    match service.get(missing) {
        Err(ServiceError::SessionNotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected SessionNotFound, got {other:?}"),
    }
}

#[test]
fn entries_older_than_an_hour_are_swept_on_insert() {
    let first_id = uuid!("6A1C17AF-0D52-4316-96A2-308E18C923D1");
    let second_id = uuid!("93C5B602-9F2D-4D35-A8E3-4A91E0A08C5B");
    let service = service_at(
        vec![
            datetime!(2026-01-12 10:00:00),
            // 61 minutes later: the first session has expired.
            datetime!(2026-01-12 11:01:00),
        ],
        vec![first_id, second_id],
    );

    let first = service.insert(snapshot());
    let second = service.insert(snapshot());
    assert!(service.get(first).is_err());
    assert!(service.get(second).is_ok());
}

#[test]
fn replace_keeps_the_original_expiry_window() {
    let id = uuid!("6A1C17AF-0D52-4316-96A2-308E18C923D1");
    let service = service_at(vec![datetime!(2026-01-12 10:00:00)], vec![id]);

    let session_id = service.insert(snapshot());
    let mut updated = snapshot();
    updated.employee_type = EmployeeType::Funktionaer;
    updated.created_at = datetime!(2026-01-12 11:00:00);
    service.replace(session_id, updated).expect("replace");

    let cached = service.get(session_id).expect("cached snapshot");
    assert_eq!(cached.employee_type, EmployeeType::Funktionaer);
    // The recalculation did not extend the session lifetime.
    assert_eq!(cached.created_at, datetime!(2026-01-12 10:00:00));
}

#[test]
fn replace_of_unknown_session_fails() {
    let service = service_at(vec![], vec![]);
    let missing = uuid!("93C5B602-9F2D-4D35-A8E3-4A91E0A08C5B");
    assert!(service.replace(missing, snapshot()).is_err());
}
