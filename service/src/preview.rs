use mockall::automock;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::processing::{CallOutDay, DailyOutput, WeeklySummary};
use crate::records::{DailyRecord, EmployeeType};
use crate::ServiceError;

/// Everything a preview session needs for later export, absence edits or
/// Danløn sync. The raw records are kept so the pipeline can re-run.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSnapshot {
    pub records: Vec<DailyRecord>,
    pub outputs: Vec<DailyOutput>,
    pub summaries: Vec<WeeklySummary>,
    pub call_out_days: Vec<CallOutDay>,
    pub employee_type: EmployeeType,
    pub created_at: PrimitiveDateTime,
}

/// Session-scoped in-process cache of processed results. Entries expire
/// after one hour; a restart discards all sessions.
#[automock]
pub trait PreviewCacheService {
    /// Store a snapshot and return its fresh session id. Sweeps expired
    /// entries as a side effect.
    fn insert(&self, snapshot: PreviewSnapshot) -> Uuid;

    fn get(&self, session_id: Uuid) -> Result<PreviewSnapshot, ServiceError>;

    /// Replace a session's snapshot after a recalculation.
    fn replace(&self, session_id: Uuid, snapshot: PreviewSnapshot) -> Result<(), ServiceError>;
}
