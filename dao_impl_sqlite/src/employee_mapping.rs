use std::sync::Arc;

use async_trait::async_trait;
use dao::{DaoError, EmployeeMappingDao, EmployeeMappingEntity};
use sqlx::{query, query_as, FromRow, SqlitePool};

use crate::datetime;
use crate::ResultDbErrorExt;

#[derive(FromRow)]
struct EmployeeMappingDb {
    user_id: String,
    company_id: String,
    ftz_employee_name: Option<String>,
    danlon_employee_id: String,
    danlon_employee_name: String,
    is_fallback: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<&EmployeeMappingDb> for EmployeeMappingEntity {
    type Error = DaoError;

    fn try_from(row: &EmployeeMappingDb) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id.as_str().into(),
            company_id: row.company_id.as_str().into(),
            ftz_employee_name: row.ftz_employee_name.as_deref().map(Arc::from),
            danlon_employee_id: row.danlon_employee_id.as_str().into(),
            danlon_employee_name: row.danlon_employee_name.as_str().into(),
            is_fallback: row.is_fallback,
            created_at: datetime::from_db(&row.created_at)?,
            updated_at: datetime::from_db(&row.updated_at)?,
        })
    }
}

pub struct EmployeeMappingDaoImpl {
    pool: Arc<SqlitePool>,
}
impl EmployeeMappingDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeMappingDao for EmployeeMappingDaoImpl {
    async fn find_all(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Arc<[EmployeeMappingEntity]>, DaoError> {
        query_as::<_, EmployeeMappingDb>(
            r"SELECT user_id, company_id, ftz_employee_name, danlon_employee_id,
                     danlon_employee_name, is_fallback, created_at, updated_at
              FROM employee_mappings
              WHERE user_id = ? AND company_id = ?
              ORDER BY is_fallback, ftz_employee_name",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_all(&*self.pool)
        .await
        .map_db_error()?
        .iter()
        .map(EmployeeMappingEntity::try_from)
        .collect::<Result<_, _>>()
    }

    async fn replace_all(
        &self,
        user_id: &str,
        company_id: &str,
        rows: &[EmployeeMappingEntity],
    ) -> Result<(), DaoError> {
        let mut tx = self.pool.begin().await.map_db_error()?;
        query(r"DELETE FROM employee_mappings WHERE user_id = ? AND company_id = ?")
            .bind(user_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await
            .map_db_error()?;
        for row in rows {
            query(
                r"INSERT INTO employee_mappings
                      (user_id, company_id, ftz_employee_name, danlon_employee_id,
                       danlon_employee_name, is_fallback, created_at, updated_at)
                  VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(company_id)
            .bind(row.ftz_employee_name.as_deref())
            .bind(row.danlon_employee_id.as_ref())
            .bind(row.danlon_employee_name.as_ref())
            .bind(row.is_fallback)
            .bind(datetime::to_db(row.created_at)?)
            .bind(datetime::to_db(row.updated_at)?)
            .execute(&mut *tx)
            .await
            .map_db_error()?;
        }
        tx.commit().await.map_db_error()?;
        Ok(())
    }
}
