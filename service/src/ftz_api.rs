use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use time::Date;

use crate::records::DailyRecord;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtzEmployee {
    pub employee_id: i64,
    pub firstname: Arc<str>,
    pub lastname: Arc<str>,
}

impl FtzEmployee {
    pub fn full_name(&self) -> String {
        match (self.firstname.is_empty(), self.lastname.is_empty()) {
            (false, false) => format!("{} {}", self.firstname, self.lastname),
            (false, true) => self.firstname.to_string(),
            (true, false) => self.lastname.to_string(),
            (true, true) => format!("Employee {}", self.employee_id),
        }
    }
}

/// Pull ingest against the FTZ Core/Time APIs. Registrations arrive with
/// UTC timestamps and are grouped by Europe/Copenhagen local date before
/// entering the pipeline.
#[automock]
#[async_trait]
pub trait FtzApiService {
    async fn fetch_employees(&self) -> Result<Arc<[FtzEmployee]>, ServiceError>;

    /// All completed registrations for the employee in the local-date range
    /// `[from, to]`, already normalized into daily records.
    async fn fetch_daily_records(
        &self,
        employee_id: i64,
        employee_name: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<DailyRecord>, ServiceError>;
}
