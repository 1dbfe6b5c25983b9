use std::sync::Arc;

use async_trait::async_trait;
use dao::{DaoError, OauthTokenDao, OauthTokenEntity};
use sqlx::{query, query_as, FromRow, SqlitePool};

use crate::datetime;
use crate::ResultDbErrorExt;

#[derive(FromRow)]
struct OauthTokenDb {
    user_id: String,
    company_id: String,
    access_token: String,
    refresh_token: String,
    expires_at: String,
    company_name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<&OauthTokenDb> for OauthTokenEntity {
    type Error = DaoError;

    fn try_from(row: &OauthTokenDb) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id.as_str().into(),
            company_id: row.company_id.as_str().into(),
            access_token: row.access_token.as_str().into(),
            refresh_token: row.refresh_token.as_str().into(),
            expires_at: datetime::from_db(&row.expires_at)?,
            company_name: row.company_name.as_deref().map(Arc::from),
            created_at: datetime::from_db(&row.created_at)?,
            updated_at: datetime::from_db(&row.updated_at)?,
        })
    }
}

pub struct OauthTokenDaoImpl {
    pool: Arc<SqlitePool>,
}
impl OauthTokenDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OauthTokenDao for OauthTokenDaoImpl {
    async fn find(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<Option<OauthTokenEntity>, DaoError> {
        query_as::<_, OauthTokenDb>(
            r"SELECT user_id, company_id, access_token, refresh_token, expires_at,
                     company_name, created_at, updated_at
              FROM oauth_tokens
              WHERE user_id = ? AND company_id = ?",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&*self.pool)
        .await
        .map_db_error()?
        .as_ref()
        .map(OauthTokenEntity::try_from)
        .transpose()
    }

    async fn find_all_for_user(
        &self,
        user_id: &str,
    ) -> Result<Arc<[OauthTokenEntity]>, DaoError> {
        query_as::<_, OauthTokenDb>(
            r"SELECT user_id, company_id, access_token, refresh_token, expires_at,
                     company_name, created_at, updated_at
              FROM oauth_tokens
              WHERE user_id = ?
              ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
        .map_db_error()?
        .iter()
        .map(OauthTokenEntity::try_from)
        .collect::<Result<_, _>>()
    }

    async fn upsert(&self, entity: &OauthTokenEntity) -> Result<(), DaoError> {
        query(
            r"INSERT INTO oauth_tokens
                  (user_id, company_id, access_token, refresh_token, expires_at,
                   company_name, created_at, updated_at)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT(user_id, company_id) DO UPDATE SET
                  access_token = excluded.access_token,
                  refresh_token = excluded.refresh_token,
                  expires_at = excluded.expires_at,
                  company_name = COALESCE(excluded.company_name, oauth_tokens.company_name),
                  updated_at = excluded.updated_at",
        )
        .bind(entity.user_id.as_ref())
        .bind(entity.company_id.as_ref())
        .bind(entity.access_token.as_ref())
        .bind(entity.refresh_token.as_ref())
        .bind(datetime::to_db(entity.expires_at)?)
        .bind(entity.company_name.as_deref())
        .bind(datetime::to_db(entity.created_at)?)
        .bind(datetime::to_db(entity.updated_at)?)
        .execute(&*self.pool)
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, company_id: &str) -> Result<(), DaoError> {
        query(r"DELETE FROM oauth_tokens WHERE user_id = ? AND company_id = ?")
            .bind(user_id)
            .bind(company_id)
            .execute(&*self.pool)
            .await
            .map_db_error()?;
        Ok(())
    }
}
