use docket_core::models::ApiKey;
use docket_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new API key. Only the hash and a short prefix are persisted.
    #[tracing::instrument(skip(self, key_hash), fields(db.table = "api_keys", db.operation = "insert"))]
    pub async fn create_api_key(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<ApiKey, AppError> {
        let api_key = sqlx::query_as::<Postgres, ApiKey>(
            r#"
            INSERT INTO api_keys (tenant_id, user_id, name, key_hash, key_prefix)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(name)
        .bind(key_hash)
        .bind(key_prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create API key");
            AppError::Database(e)
        })?;

        tracing::info!(
            api_key_id = %api_key.id,
            tenant_id = %tenant_id,
            name = %name,
            "API key created"
        );

        Ok(api_key)
    }

    /// Get a non-revoked API key by hash
    #[tracing::instrument(skip(self, key_hash), fields(db.table = "api_keys", db.operation = "select"))]
    pub async fn get_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        let api_key = sqlx::query_as::<Postgres, ApiKey>(
            r#"
            SELECT * FROM api_keys
            WHERE key_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get API key by hash");
            AppError::Database(e)
        })?;

        Ok(api_key)
    }

    #[tracing::instrument(skip(self), fields(db.table = "api_keys", db.operation = "update"))]
    pub async fn update_last_used(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, id = %id, "Failed to update API key last_used_at");
                AppError::Database(e)
            })?;

        Ok(())
    }
}
