//! In-process preview session cache.
//!
//! One mutex around the whole map; handlers hold it only for the duration
//! of an insert/sweep/read. Sessions expire one hour after creation and are
//! swept on every insert. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use service::clock::ClockService;
use service::preview::{PreviewCacheService, PreviewSnapshot};
use service::uuid_service::UuidService;
use service::ServiceError;
use time::Duration;
use tracing::debug;
use uuid::Uuid;

const SESSION_TTL: Duration = Duration::hours(1);

pub struct PreviewCacheServiceImpl<Clock: ClockService, Uuids: UuidService> {
    cache: Mutex<HashMap<Uuid, PreviewSnapshot>>,
    clock_service: Arc<Clock>,
    uuid_service: Arc<Uuids>,
}

impl<Clock: ClockService, Uuids: UuidService> PreviewCacheServiceImpl<Clock, Uuids> {
    pub fn new(clock_service: Arc<Clock>, uuid_service: Arc<Uuids>) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            clock_service,
            uuid_service,
        }
    }
}

impl<Clock: ClockService, Uuids: UuidService> PreviewCacheService
    for PreviewCacheServiceImpl<Clock, Uuids>
{
    fn insert(&self, mut snapshot: PreviewSnapshot) -> Uuid {
        let now = self.clock_service.date_time_now();
        snapshot.created_at = now;
        let session_id = self.uuid_service.new_uuid("preview-session");

        let mut cache = self.cache.lock().expect("preview cache mutex poisoned");
        let before = cache.len();
        cache.retain(|_, cached| cached.created_at + SESSION_TTL > now);
        if cache.len() < before {
            debug!(swept = before - cache.len(), "swept expired preview sessions");
        }
        cache.insert(session_id, snapshot);
        session_id
    }

    fn get(&self, session_id: Uuid) -> Result<PreviewSnapshot, ServiceError> {
        self.cache
            .lock()
            .expect("preview cache mutex poisoned")
            .get(&session_id)
            .cloned()
            .ok_or(ServiceError::SessionNotFound(session_id))
    }

    fn replace(&self, session_id: Uuid, mut snapshot: PreviewSnapshot) -> Result<(), ServiceError> {
        let mut cache = self.cache.lock().expect("preview cache mutex poisoned");
        let existing = cache
            .get(&session_id)
            .ok_or(ServiceError::SessionNotFound(session_id))?;
        // Recalculations keep the original expiry window.
        snapshot.created_at = existing.created_at;
        cache.insert(session_id, snapshot);
        Ok(())
    }
}
