use std::sync::Arc;

use async_trait::async_trait;
use dao::{DaoError, PayCodeMappingDao, PayCodeMappingEntity};
use sqlx::{query, query_as, FromRow, SqlitePool};

use crate::datetime;
use crate::ResultDbErrorExt;

#[derive(FromRow)]
struct PayCodeMappingDb {
    user_id: String,
    company_id: String,
    normal_code: String,
    overtime_code: String,
    callout_code: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<&PayCodeMappingDb> for PayCodeMappingEntity {
    type Error = DaoError;

    fn try_from(row: &PayCodeMappingDb) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id.as_str().into(),
            company_id: row.company_id.as_str().into(),
            normal_code: row.normal_code.as_str().into(),
            overtime_code: row.overtime_code.as_str().into(),
            callout_code: row.callout_code.as_str().into(),
            created_at: datetime::from_db(&row.created_at)?,
            updated_at: datetime::from_db(&row.updated_at)?,
        })
    }
}

pub struct PayCodeMappingDaoImpl {
    pool: Arc<SqlitePool>,
}
impl PayCodeMappingDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayCodeMappingDao for PayCodeMappingDaoImpl {
    async fn find(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Option<PayCodeMappingEntity>, DaoError> {
        query_as::<_, PayCodeMappingDb>(
            r"SELECT user_id, company_id, normal_code, overtime_code, callout_code,
                     created_at, updated_at
              FROM paycode_mappings
              WHERE user_id = ? AND company_id = ?",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&*self.pool)
        .await
        .map_db_error()?
        .as_ref()
        .map(PayCodeMappingEntity::try_from)
        .transpose()
    }

    async fn upsert(&self, entity: &PayCodeMappingEntity) -> Result<(), DaoError> {
        query(
            r"INSERT INTO paycode_mappings
                  (user_id, company_id, normal_code, overtime_code, callout_code,
                   created_at, updated_at)
              VALUES (?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT(user_id, company_id) DO UPDATE SET
                  normal_code = excluded.normal_code,
                  overtime_code = excluded.overtime_code,
                  callout_code = excluded.callout_code,
                  updated_at = excluded.updated_at",
        )
        .bind(entity.user_id.as_ref())
        .bind(entity.company_id.as_ref())
        .bind(entity.normal_code.as_ref())
        .bind(entity.overtime_code.as_ref())
        .bind(entity.callout_code.as_ref())
        .bind(datetime::to_db(entity.created_at)?)
        .bind(datetime::to_db(entity.updated_at)?)
        .execute(&*self.pool)
        .await
        .map_db_error()?;
        Ok(())
    }
}
