//! Persisted pay-code and employee mapping configuration.

use std::sync::Arc;

use async_trait::async_trait;
use dao::{EmployeeMappingDao, EmployeeMappingEntity, PayCodeMappingDao, PayCodeMappingEntity};
use service::clock::ClockService;
use service::mapping::{
    EmployeeMappingRow, EmployeeMappings, FallbackMapping, MappingService, PayCodeMapping,
};
use service::ServiceError;
use tracing::info;

pub struct MappingServiceImpl<
    PayCodeDao: PayCodeMappingDao,
    EmployeeDao: EmployeeMappingDao,
    Clock: ClockService,
> {
    pay_code_dao: Arc<PayCodeDao>,
    employee_dao: Arc<EmployeeDao>,
    clock_service: Arc<Clock>,
}

impl<
        PayCodeDao: PayCodeMappingDao + Send + Sync,
        EmployeeDao: EmployeeMappingDao + Send + Sync,
        Clock: ClockService + Send + Sync,
    > MappingServiceImpl<PayCodeDao, EmployeeDao, Clock>
{
    pub fn new(
        pay_code_dao: Arc<PayCodeDao>,
        employee_dao: Arc<EmployeeDao>,
        clock_service: Arc<Clock>,
    ) -> Self {
        Self {
            pay_code_dao,
            employee_dao,
            clock_service,
        }
    }
}

#[async_trait]
impl<
        PayCodeDao: PayCodeMappingDao + Send + Sync,
        EmployeeDao: EmployeeMappingDao + Send + Sync,
        Clock: ClockService + Send + Sync,
    > MappingService for MappingServiceImpl<PayCodeDao, EmployeeDao, Clock>
{
    async fn pay_code_mapping(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<PayCodeMapping, ServiceError> {
        Ok(self
            .pay_code_dao
            .find(user_id, company_id)
            .await?
            .map(|entity| PayCodeMapping {
                normal_code: entity.normal_code,
                overtime_code: entity.overtime_code,
                callout_code: entity.callout_code,
                is_default: false,
            })
            .unwrap_or_default())
    }

    async fn save_pay_code_mapping(
        &self,
        user_id: &str,
        company_id: &str,
        mapping: &PayCodeMapping,
    ) -> Result<(), ServiceError> {
        let now = self.clock_service.date_time_now();
        self.pay_code_dao
            .upsert(&PayCodeMappingEntity {
                user_id: user_id.into(),
                company_id: company_id.into(),
                normal_code: mapping.normal_code.clone(),
                overtime_code: mapping.overtime_code.clone(),
                callout_code: mapping.callout_code.clone(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            user_id,
            company_id,
            normal = %mapping.normal_code,
            overtime = %mapping.overtime_code,
            callout = %mapping.callout_code,
            "saved pay-code mapping"
        );
        Ok(())
    }

    async fn employee_mappings(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<EmployeeMappings, ServiceError> {
        let entities = self.employee_dao.find_all(user_id, company_id).await?;

        let mut mappings = EmployeeMappings::default();
        for entity in entities.iter() {
            if entity.is_fallback {
                mappings.fallback = Some(FallbackMapping {
                    danlon_employee_id: entity.danlon_employee_id.clone(),
                    danlon_employee_name: entity.danlon_employee_name.clone(),
                });
            } else if let Some(name) = &entity.ftz_employee_name {
                mappings.rows.push(EmployeeMappingRow {
                    ftz_employee_name: name.clone(),
                    danlon_employee_id: entity.danlon_employee_id.clone(),
                    danlon_employee_name: entity.danlon_employee_name.clone(),
                });
            }
        }
        Ok(mappings)
    }

    async fn save_employee_mappings(
        &self,
        user_id: &str,
        company_id: &str,
        mappings: &EmployeeMappings,
    ) -> Result<(), ServiceError> {
        let now = self.clock_service.date_time_now();
        let mut entities: Vec<EmployeeMappingEntity> = mappings
            .rows
            .iter()
            .filter(|row| !row.ftz_employee_name.is_empty() && !row.danlon_employee_id.is_empty())
            .map(|row| EmployeeMappingEntity {
                user_id: user_id.into(),
                company_id: company_id.into(),
                ftz_employee_name: Some(row.ftz_employee_name.clone()),
                danlon_employee_id: row.danlon_employee_id.clone(),
                danlon_employee_name: row.danlon_employee_name.clone(),
                is_fallback: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        if let Some(fallback) = &mappings.fallback {
            if !fallback.danlon_employee_id.is_empty() {
                entities.push(EmployeeMappingEntity {
                    user_id: user_id.into(),
                    company_id: company_id.into(),
                    ftz_employee_name: None,
                    danlon_employee_id: fallback.danlon_employee_id.clone(),
                    danlon_employee_name: fallback.danlon_employee_name.clone(),
                    is_fallback: true,
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        self.employee_dao
            .replace_all(user_id, company_id, &entities)
            .await?;
        info!(
            user_id,
            company_id,
            explicit = entities.iter().filter(|entity| !entity.is_fallback).count(),
            fallback = mappings.fallback.is_some(),
            "saved employee mappings"
        );
        Ok(())
    }
}
