use docket_core::models::{
    CreatePartnerRequest, Partner, PartnerBankAccount, PartnerResponse, DEFAULT_CORPORATE_TYPE,
};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct PartnerRepository {
    pool: PgPool,
}

impl PartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List partners of a tenant with their bank accounts attached.
    #[tracing::instrument(skip(self), fields(db.table = "partners", db.operation = "select"))]
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<PartnerResponse>, AppError> {
        let partners = sqlx::query_as::<Postgres, Partner>(
            "SELECT * FROM partners WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let ids: Vec<Uuid> = partners.iter().map(|p| p.id).collect();
        let accounts = sqlx::query_as::<Postgres, PartnerBankAccount>(
            "SELECT * FROM partner_bank_accounts WHERE partner_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let mut by_partner: HashMap<Uuid, Vec<PartnerBankAccount>> = HashMap::new();
        for account in accounts {
            by_partner.entry(account.partner_id).or_default().push(account);
        }

        Ok(partners
            .into_iter()
            .map(|p| {
                let accounts = by_partner.remove(&p.id).unwrap_or_default();
                PartnerResponse::new(p, accounts)
            })
            .collect())
    }

    /// Create a partner and its bank accounts atomically.
    #[tracing::instrument(skip(self, request), fields(db.table = "partners", db.operation = "insert"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: &CreatePartnerRequest,
    ) -> Result<PartnerResponse, AppError> {
        let data = &request.partner_data;
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let partner = sqlx::query_as::<Postgres, Partner>(
            r#"
            INSERT INTO partners (
                tenant_id, display_name, official_name, ocr_name, company_name_kana,
                corporate_number, invoice_registration_number, corporate_type,
                address, closing_date, payment_terms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&data.display_name)
        .bind(&data.official_name)
        .bind(&data.ocr_name)
        .bind(&data.company_name_kana)
        .bind(&data.corporate_number)
        .bind(&data.invoice_registration_number)
        .bind(
            data.corporate_type
                .as_deref()
                .unwrap_or(DEFAULT_CORPORATE_TYPE),
        )
        .bind(&data.address)
        .bind(&data.closing_date)
        .bind(&data.payment_terms)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = %tenant_id, "Failed to insert partner");
            AppError::Database(e)
        })?;

        let mut bank_accounts = Vec::with_capacity(request.bank_accounts.len());
        for account in &request.bank_accounts {
            let row = sqlx::query_as::<Postgres, PartnerBankAccount>(
                r#"
                INSERT INTO partner_bank_accounts (
                    partner_id, bank_name, branch_name, account_type,
                    account_number, account_holder
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(partner.id)
            .bind(&account.bank_name)
            .bind(&account.branch_name)
            .bind(&account.account_type)
            .bind(&account.account_number)
            .bind(&account.account_holder)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, partner_id = %partner.id, "Failed to insert partner bank account");
                AppError::Database(e)
            })?;
            bank_accounts.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            partner_id = %partner.id,
            tenant_id = %tenant_id,
            bank_accounts = bank_accounts.len(),
            "Partner created"
        );

        Ok(PartnerResponse::new(partner, bank_accounts))
    }
}
