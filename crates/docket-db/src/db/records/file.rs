use docket_core::models::{ExtractedFields, FileRecord};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistent store for uploaded documents and their extracted fields.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a record in `uploaded` state for a blob that is already stored.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        file_name: &str,
        object_key: &str,
    ) -> Result<FileRecord, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            INSERT INTO files (tenant_id, file_name, object_key, status)
            VALUES ($1, $2, $3, 'uploaded')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(file_name)
        .bind(object_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = %tenant_id, object_key = %object_key, "Failed to insert file record");
            AppError::Database(e)
        })?;

        tracing::debug!(file_id = %record.id, tenant_id = %tenant_id, "File record created");
        Ok(record)
    }

    /// Tenant-scoped lookup. A record owned by another tenant is `None`.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn get_for_tenant(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        sqlx::query_as::<Postgres, FileRecord>(
            "SELECT * FROM files WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Unscoped lookup for background jobs, which carry only the record id.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        sqlx::query_as::<Postgres, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        sqlx::query_as::<Postgres, FileRecord>(
            r#"
            SELECT * FROM files
            WHERE tenant_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Store extraction output and move the record to `needs_review`.
    ///
    /// Only applies while the record is still `uploaded`; returns `false` when
    /// the record has already advanced and nothing was written.
    #[tracing::instrument(skip(self, fields), fields(db.table = "files", db.operation = "update"))]
    pub async fn apply_extraction(
        &self,
        id: Uuid,
        fields: &ExtractedFields,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET status = 'needs_review',
                issuer_name = $2,
                invoice_date = $3,
                registration_number = $4,
                tax_8_base = $5,
                tax_8_amount = $6,
                tax_8_total = $7,
                tax_10_base = $8,
                tax_10_amount = $9,
                tax_10_total = $10,
                total_amount = $11,
                updated_at = NOW()
            WHERE id = $1 AND status = 'uploaded'
            "#,
        )
        .bind(id)
        .bind(&fields.issuer_name)
        .bind(fields.invoice_date)
        .bind(&fields.registration_number)
        .bind(fields.tax_8_base)
        .bind(fields.tax_8_amount)
        .bind(fields.tax_8_total)
        .bind(fields.tax_10_base)
        .bind(fields.tax_10_amount)
        .bind(fields.tax_10_total)
        .bind(fields.total_amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, file_id = %id, "Failed to store extracted fields");
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the extracted fields with user-reviewed values and mark the
    /// record `confirmed`.
    #[tracing::instrument(skip(self, fields), fields(db.table = "files", db.operation = "update"))]
    pub async fn confirm(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        fields: &ExtractedFields,
    ) -> Result<Option<FileRecord>, AppError> {
        sqlx::query_as::<Postgres, FileRecord>(
            r#"
            UPDATE files
            SET status = 'confirmed',
                issuer_name = $3,
                invoice_date = $4,
                registration_number = $5,
                tax_8_base = $6,
                tax_8_amount = $7,
                tax_8_total = $8,
                tax_10_base = $9,
                tax_10_amount = $10,
                tax_10_total = $11,
                total_amount = $12,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&fields.issuer_name)
        .bind(fields.invoice_date)
        .bind(&fields.registration_number)
        .bind(fields.tax_8_base)
        .bind(fields.tax_8_amount)
        .bind(fields.tax_8_total)
        .bind(fields.tax_10_base)
        .bind(fields.tax_10_amount)
        .bind(fields.tax_10_total)
        .bind(fields.total_amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, file_id = %id, "Failed to confirm file record");
            AppError::Database(e)
        })
    }

    /// Remove a record. Used to compensate a half-finished upload.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete"))]
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
