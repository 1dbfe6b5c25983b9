use mockall::automock;

use crate::processing::{DailyOutput, WeeklySummary};
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Daily,
    Detailed,
    Weekly,
    WeeklyDetailed,
    Combined,
}

impl ExportFormat {
    pub fn from_form_value(value: &str) -> Self {
        match value {
            "weekly" => ExportFormat::Weekly,
            "weekly_detailed" => ExportFormat::WeeklyDetailed,
            "combined" => ExportFormat::Combined,
            "detailed" => ExportFormat::Detailed,
            _ => ExportFormat::Daily,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Daily => "time_registration_daily.csv",
            ExportFormat::Detailed => "time_registration_detailed.csv",
            ExportFormat::Weekly => "weekly_summary.csv",
            ExportFormat::WeeklyDetailed => "weekly_summary_detailed.csv",
            ExportFormat::Combined => "time_registration_combined.csv",
        }
    }
}

/// Renders processed data as semicolon-delimited CSV for human review.
/// The detailed format also applies the date-versioned DBR rates; this is
/// the only place rates are read.
#[automock]
pub trait CsvExportService {
    fn render(
        &self,
        format: ExportFormat,
        outputs: &[DailyOutput],
        summaries: &[WeeklySummary],
    ) -> Result<String, ServiceError>;
}
