//! Sync orchestrator: cached preview session -> Danløn pay parts.
//!
//! Wire contract: `units` are centesimal integers (hours × 100, rounded)
//! and `amount` is whole DKK. Per-row resolution failures never abort the
//! sync; connectivity and auth failures do.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use service::danlon_api::{DanlonApiService, DanlonEmployee, PayPart};
use service::danlon_oauth::DanlonOauthService;
use service::mapping::MappingService;
use service::preview::PreviewCacheService;
use service::processing::DailyOutput;
use service::sync::{SkippedItem, SyncOutcome, SyncService};
use service::ServiceError;
use tracing::info;
use uuid::Uuid;

pub struct SyncServiceImpl<
    Preview: PreviewCacheService,
    Mapping: MappingService,
    Api: DanlonApiService,
    Oauth: DanlonOauthService,
> {
    preview_cache: Arc<Preview>,
    mapping_service: Arc<Mapping>,
    danlon_api_service: Arc<Api>,
    oauth_service: Arc<Oauth>,
}

fn centesimal_units(hours: f32) -> i64 {
    (hours * 100.0).round() as i64
}

/// Three-stage employee resolution: live name match, explicit mapping row,
/// fallback row. Mapped ids must still exist in the live employee list.
fn resolve_employee_id(
    worker: &str,
    by_name: &HashMap<String, Arc<str>>,
    by_id: &HashMap<Arc<str>, DanlonEmployee>,
    explicit: &HashMap<String, Arc<str>>,
    fallback: Option<&Arc<str>>,
) -> Option<Arc<str>> {
    let key = worker.to_lowercase();
    if let Some(id) = by_name.get(&key) {
        return Some(id.clone());
    }
    if let Some(id) = explicit.get(&key) {
        if by_id.contains_key(id) {
            return Some(id.clone());
        }
    }
    if let Some(id) = fallback {
        if by_id.contains_key(id) {
            return Some(id.clone());
        }
    }
    None
}

fn eligible(output: &DailyOutput) -> bool {
    output.normal_hours > 0.0 || output.total_overtime() > 0.0 || output.call_out_applied
}

impl<
        Preview: PreviewCacheService + Send + Sync,
        Mapping: MappingService + Send + Sync,
        Api: DanlonApiService + Send + Sync,
        Oauth: DanlonOauthService + Send + Sync,
    > SyncServiceImpl<Preview, Mapping, Api, Oauth>
{
    pub fn new(
        preview_cache: Arc<Preview>,
        mapping_service: Arc<Mapping>,
        danlon_api_service: Arc<Api>,
        oauth_service: Arc<Oauth>,
    ) -> Self {
        Self {
            preview_cache,
            mapping_service,
            danlon_api_service,
            oauth_service,
        }
    }
}

#[async_trait]
impl<
        Preview: PreviewCacheService + Send + Sync,
        Mapping: MappingService + Send + Sync,
        Api: DanlonApiService + Send + Sync,
        Oauth: DanlonOauthService + Send + Sync,
    > SyncService for SyncServiceImpl<Preview, Mapping, Api, Oauth>
{
    async fn sync_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        company_id: Option<Arc<str>>,
    ) -> Result<SyncOutcome, ServiceError> {
        let snapshot = self.preview_cache.get(session_id)?;
        if snapshot.outputs.is_empty() {
            return Err(ServiceError::invalid_input("no processed data in session"));
        }

        let company_id = match company_id {
            Some(company_id) => company_id,
            None => self
                .oauth_service
                .resolve_company_id(user_id)
                .await?
                .ok_or(ServiceError::NotConnected)?,
        };

        let pay_codes = self
            .mapping_service
            .pay_code_mapping(user_id, &company_id)
            .await?;
        let employee_mappings = self
            .mapping_service
            .employee_mappings(user_id, &company_id)
            .await?;

        let live_employees = self
            .danlon_api_service
            .get_employees(user_id, &company_id)
            .await?;

        let mut by_name: HashMap<String, Arc<str>> = HashMap::new();
        let mut by_id: HashMap<Arc<str>, DanlonEmployee> = HashMap::new();
        for employee in live_employees.iter() {
            if !employee.name.is_empty() {
                by_name.insert(employee.name.to_lowercase(), employee.id.clone());
            }
            if let Some(domain_id) = &employee.domain_id {
                by_name.insert(domain_id.to_lowercase(), employee.id.clone());
            }
            by_id.insert(employee.id.clone(), employee.clone());
        }
        let explicit: HashMap<String, Arc<str>> = employee_mappings
            .rows
            .iter()
            .map(|row| {
                (
                    row.ftz_employee_name.to_lowercase(),
                    row.danlon_employee_id.clone(),
                )
            })
            .collect();
        let fallback_id = employee_mappings
            .fallback
            .as_ref()
            .map(|fallback| fallback.danlon_employee_id.clone());

        let mut pay_parts: Vec<PayPart> = Vec::new();
        let mut skipped: Vec<SkippedItem> = Vec::new();
        let mut unmatched: BTreeSet<Arc<str>> = BTreeSet::new();

        for output in snapshot.outputs.iter().filter(|output| eligible(output)) {
            let date = lontid_utils::format_date_dmy(output.date)?;
            let Some(employee_id) = resolve_employee_id(
                &output.worker,
                &by_name,
                &by_id,
                &explicit,
                fallback_id.as_ref(),
            ) else {
                unmatched.insert(output.worker.clone());
                skipped.push(SkippedItem {
                    worker: output.worker.clone(),
                    date: date.into(),
                    reason: format!("no matching Danløn employee found for '{}'", output.worker)
                        .into(),
                });
                continue;
            };

            if output.normal_hours > 0.0 {
                pay_parts.push(PayPart {
                    employee_id: employee_id.clone(),
                    code: pay_codes.normal_code.clone(),
                    units: Some(centesimal_units(output.normal_hours)),
                    amount: None,
                });
            }
            let total_overtime = output.total_overtime();
            if total_overtime > 0.0 {
                pay_parts.push(PayPart {
                    employee_id: employee_id.clone(),
                    code: pay_codes.overtime_code.clone(),
                    units: Some(centesimal_units(total_overtime)),
                    amount: None,
                });
            }
            if output.call_out_applied && output.call_out_payment > 0.0 {
                pay_parts.push(PayPart {
                    employee_id,
                    code: pay_codes.callout_code.clone(),
                    units: None,
                    amount: Some(output.call_out_payment.round() as i64),
                });
            }
        }

        let unmatched_workers: Arc<[Arc<str>]> = unmatched.into_iter().collect();

        if pay_parts.is_empty() {
            return Ok(SyncOutcome {
                success: false,
                message:
                    "no pay parts to submit; check employee mappings and that the data has hours"
                        .into(),
                created: Vec::new().into(),
                skipped: skipped.into(),
                errors: Vec::new().into(),
                unmatched_workers,
            });
        }

        let created = self
            .danlon_api_service
            .create_pay_parts(user_id, &company_id, &pay_parts)
            .await?;

        info!(
            user_id,
            company_id = %company_id,
            created = created.len(),
            skipped = skipped.len(),
            "Danløn sync complete"
        );

        Ok(SyncOutcome {
            success: true,
            message: format!("successfully created {} pay part(s) in Danløn", created.len())
                .into(),
            created,
            skipped: skipped.into(),
            errors: Vec::new().into(),
            unmatched_workers,
        })
    }
}
