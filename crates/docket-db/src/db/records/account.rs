use docket_core::models::{Account, CreateAccountRequest};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "select"))]
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Account>, AppError> {
        sqlx::query_as::<Postgres, Account>(
            "SELECT * FROM accounts WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "accounts", db.operation = "insert"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: &CreateAccountRequest,
    ) -> Result<Account, AppError> {
        let account = sqlx::query_as::<Postgres, Account>(
            r#"
            INSERT INTO accounts (
                tenant_id, alias, bank_name, branch_name, account_type,
                account_number, account_holder
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&request.alias)
        .bind(&request.bank_name)
        .bind(&request.branch_name)
        .bind(&request.account_type)
        .bind(&request.account_number)
        .bind(&request.account_holder)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = %tenant_id, "Failed to create account");
            AppError::Database(e)
        })?;

        tracing::info!(account_id = %account.id, tenant_id = %tenant_id, "Account created");
        Ok(account)
    }
}
