use docket_core::models::{User, UserRole};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Validated user fields ready to persist.
#[derive(Debug, Clone)]
pub struct UserInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub department: &'a str,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE tenant_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    #[tracing::instrument(skip(self, input), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create(&self, tenant_id: Uuid, input: UserInput<'_>) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (tenant_id, name, email, department, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.department)
        .bind(input.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = %tenant_id, "Failed to create user");
            AppError::Database(e)
        })?;

        tracing::info!(user_id = %user.id, tenant_id = %tenant_id, "User created");
        Ok(user)
    }

    /// Update a user in the tenant. Returns `None` when no such user exists.
    #[tracing::instrument(skip(self, input), fields(db.table = "users", db.operation = "update"))]
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UserInput<'_>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET name = $3, email = $4, department = $5, role = $6, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.department)
        .bind(input.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to update user");
            AppError::Database(e)
        })
    }

    /// Delete the given users unless that would leave the tenant without any.
    ///
    /// The count check and the delete run in one transaction holding a lock on
    /// the tenant's user rows. Returns the number of rows deleted.
    #[tracing::instrument(skip(self, ids), fields(db.table = "users", db.operation = "delete", count = ids.len()))]
    pub async fn bulk_delete(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Err(AppError::InvalidInput(
                "No user ids given for deletion".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let existing: Vec<Uuid> = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT id FROM users WHERE tenant_id = $1 FOR UPDATE",
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let remaining = existing.iter().filter(|id| !ids.contains(id)).count();
        if remaining == 0 {
            tx.rollback().await.ok();
            return Err(AppError::InvalidInput(
                "At least one user must remain".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND id = ANY($2)")
            .bind(tenant_id)
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            tenant_id = %tenant_id,
            deleted = result.rows_affected(),
            "Users deleted"
        );

        Ok(result.rows_affected())
    }
}
