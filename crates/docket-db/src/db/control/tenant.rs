use docket_core::models::Tenant;
use docket_core::AppError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tenant(&self, name: &str) -> Result<Tenant, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create tenant");
            AppError::Database(e)
        })?;

        tracing::info!(tenant_id = %tenant.id, name = %tenant.name, "Created tenant");
        Ok(tenant)
    }
}
