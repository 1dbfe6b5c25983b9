use mockall::automock;

use crate::records::DailyRecord;
use crate::ServiceError;

/// Parses the FTZ vendor CSV export (semicolon-delimited, Danish day-header
/// lines) into daily records. Encoding is probed; see the implementation.
#[automock]
pub trait CsvImportService {
    fn parse(&self, content: &[u8]) -> Result<Vec<DailyRecord>, ServiceError>;
}
