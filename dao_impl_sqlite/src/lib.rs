use dao::DaoError;
use sqlx::SqlitePool;

pub mod employee_mapping;
pub mod oauth_token;
pub mod pay_code_mapping;
pub mod pending_session;

pub use employee_mapping::EmployeeMappingDaoImpl;
pub use oauth_token::OauthTokenDaoImpl;
pub use pay_code_mapping::PayCodeMappingDaoImpl;
pub use pending_session::PendingSessionDaoImpl;

pub trait ResultDbErrorExt<T, E> {
    fn map_db_error(self) -> Result<T, DaoError>;
}
impl<T, E: std::error::Error + Send + Sync + 'static> ResultDbErrorExt<T, E> for Result<T, E> {
    fn map_db_error(self) -> Result<T, DaoError> {
        self.map_err(|err| DaoError::DatabaseQueryError(Box::new(err)))
    }
}

const SCHEMA: &str = include_str!("schema.sql");

/// Create all tables if they do not exist yet. Called once at startup.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), DaoError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await.map_db_error()?;
    Ok(())
}

pub(crate) mod datetime {
    use dao::DaoError;
    use time::format_description::well_known::Iso8601;
    use time::PrimitiveDateTime;

    use crate::ResultDbErrorExt;

    pub fn to_db(value: PrimitiveDateTime) -> Result<String, DaoError> {
        value.format(&Iso8601::DATE_TIME).map_db_error()
    }

    pub fn from_db(value: &str) -> Result<PrimitiveDateTime, DaoError> {
        Ok(PrimitiveDateTime::parse(value, &Iso8601::DATE_TIME)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dao::{OauthTokenDao, OauthTokenEntity};
    use sqlx::SqlitePool;
    use time::macros::datetime;

    use super::*;

    async fn test_pool() -> Arc<SqlitePool> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        create_schema(&pool).await.expect("schema");
        Arc::new(pool)
    }

    fn token(access: &str, refresh: &str) -> OauthTokenEntity {
        OauthTokenEntity {
            user_id: "demo_user".into(),
            company_id: "company-1".into(),
            access_token: access.into(),
            refresh_token: refresh.into(),
            expires_at: datetime!(2026-01-12 10:05:00),
            company_name: Some("Værksted ApS".into()),
            created_at: datetime!(2026-01-12 10:00:00),
            updated_at: datetime!(2026-01-12 10:00:00),
        }
    }

    #[tokio::test]
    async fn oauth_token_upsert_round_trip() {
        let pool = test_pool().await;
        let dao = OauthTokenDaoImpl::new(pool);

        dao.upsert(&token("a1", "r1")).await.expect("insert");
        let stored = dao
            .find("demo_user", "company-1")
            .await
            .expect("find")
            .expect("row");
        assert_eq!(stored.access_token.as_ref(), "a1");

        // Second upsert for the same key replaces the tokens in place.
        let mut rotated = token("a2", "r2");
        rotated.expires_at = datetime!(2026-01-12 10:10:00);
        rotated.updated_at = datetime!(2026-01-12 10:05:00);
        dao.upsert(&rotated).await.expect("update");

        let stored = dao
            .find("demo_user", "company-1")
            .await
            .expect("find")
            .expect("row");
        assert_eq!(stored.access_token.as_ref(), "a2");
        assert_eq!(stored.refresh_token.as_ref(), "r2");
        assert_eq!(stored.expires_at, datetime!(2026-01-12 10:10:00));
        assert_eq!(
            dao.find_all_for_user("demo_user").await.expect("all").len(),
            1
        );
    }
}
