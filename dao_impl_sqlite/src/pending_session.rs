use std::sync::Arc;

use async_trait::async_trait;
use dao::{DaoError, PendingSessionDao, PendingSessionEntity};
use sqlx::{query, query_as, FromRow, SqlitePool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::datetime;
use crate::ResultDbErrorExt;

#[derive(FromRow)]
struct PendingSessionDb {
    session_id: String,
    user_id: String,
    select_company_url: String,
    temp_access_token: String,
    temp_refresh_token: Option<String>,
    created_at: String,
    expires_at: String,
}

impl TryFrom<&PendingSessionDb> for PendingSessionEntity {
    type Error = DaoError;

    fn try_from(row: &PendingSessionDb) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: Uuid::parse_str(&row.session_id)
                .map_err(|err| DaoError::DatabaseQueryError(Box::new(err)))?,
            user_id: row.user_id.as_str().into(),
            select_company_url: row.select_company_url.as_str().into(),
            temp_access_token: row.temp_access_token.as_str().into(),
            temp_refresh_token: row.temp_refresh_token.as_deref().map(Arc::from),
            created_at: datetime::from_db(&row.created_at)?,
            expires_at: datetime::from_db(&row.expires_at)?,
        })
    }
}

pub struct PendingSessionDaoImpl {
    pool: Arc<SqlitePool>,
}
impl PendingSessionDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingSessionDao for PendingSessionDaoImpl {
    async fn create(&self, entity: &PendingSessionEntity) -> Result<(), DaoError> {
        // One pending flow per user; a new callback supersedes the old one.
        query(r"DELETE FROM pending_sessions WHERE user_id = ?")
            .bind(entity.user_id.as_ref())
            .execute(&*self.pool)
            .await
            .map_db_error()?;
        query(
            r"INSERT INTO pending_sessions
                  (session_id, user_id, select_company_url, temp_access_token,
                   temp_refresh_token, created_at, expires_at)
              VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entity.session_id.to_string())
        .bind(entity.user_id.as_ref())
        .bind(entity.select_company_url.as_ref())
        .bind(entity.temp_access_token.as_ref())
        .bind(entity.temp_refresh_token.as_deref())
        .bind(datetime::to_db(entity.created_at)?)
        .bind(datetime::to_db(entity.expires_at)?)
        .execute(&*self.pool)
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn find_active_by_user(
        &self,
        user_id: &str,
        now: PrimitiveDateTime,
    ) -> Result<Option<PendingSessionEntity>, DaoError> {
        query_as::<_, PendingSessionDb>(
            r"SELECT session_id, user_id, select_company_url, temp_access_token,
                     temp_refresh_token, created_at, expires_at
              FROM pending_sessions
              WHERE user_id = ? AND expires_at > ?
              ORDER BY created_at DESC
              LIMIT 1",
        )
        .bind(user_id)
        .bind(datetime::to_db(now)?)
        .fetch_optional(&*self.pool)
        .await
        .map_db_error()?
        .as_ref()
        .map(PendingSessionEntity::try_from)
        .transpose()
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<(), DaoError> {
        query(r"DELETE FROM pending_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&*self.pool)
            .await
            .map_db_error()?;
        Ok(())
    }

    async fn delete_expired(&self, now: PrimitiveDateTime) -> Result<(), DaoError> {
        query(r"DELETE FROM pending_sessions WHERE expires_at <= ?")
            .bind(datetime::to_db(now)?)
            .execute(&*self.pool)
            .await
            .map_db_error()?;
        Ok(())
    }
}
