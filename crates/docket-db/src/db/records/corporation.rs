use docket_core::models::{
    invoice_registration_number, Corporation, CorporationLookup, CorporationNumberInfo,
};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};

/// Read access to the corporate registries. The tables are shared reference
/// data, so lookups take no tenant.
#[derive(Clone)]
pub struct CorporationRepository {
    pool: PgPool,
}

impl CorporationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Latest entry of each registry for `corporate_number` (13 digits, no
    /// `T`). `None` when neither registry knows it.
    #[tracing::instrument(skip(self), fields(db.table = "corporations", db.operation = "select"))]
    pub async fn lookup(
        &self,
        corporate_number: &str,
    ) -> Result<Option<CorporationLookup>, AppError> {
        let invoice_info = sqlx::query_as::<Postgres, Corporation>(
            r#"
            SELECT * FROM corporations
            WHERE registrated_number = $1
            ORDER BY latest DESC, sequence_number DESC
            LIMIT 1
            "#,
        )
        .bind(invoice_registration_number(corporate_number))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let number_info = sqlx::query_as::<Postgres, CorporationNumberInfo>(
            r#"
            SELECT * FROM corporation_number_infos
            WHERE corporate_number = $1
            ORDER BY latest DESC, sequence_number DESC
            LIMIT 1
            "#,
        )
        .bind(corporate_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if invoice_info.is_none() && number_info.is_none() {
            return Ok(None);
        }

        Ok(Some(CorporationLookup {
            corporate_invoice_info: invoice_info,
            corporate_number_info: number_info,
        }))
    }
}
