use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_CORPORATE_TYPE: &str = "法人";

/// A business partner (invoice issuer or payee)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Partner {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: String,
    pub official_name: Option<String>,
    pub ocr_name: Option<String>,
    pub company_name_kana: Option<String>,
    pub corporate_number: Option<String>,
    pub invoice_registration_number: Option<String>,
    pub corporate_type: String,
    pub address: Option<String>,
    pub closing_date: Option<String>,
    pub payment_terms: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PartnerBankAccount {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: String,
    pub account_number: String,
    pub account_holder: String,
}

/// Partner with its bank accounts, as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartnerResponse {
    pub id: Uuid,
    pub display_name: String,
    pub official_name: Option<String>,
    pub ocr_name: Option<String>,
    pub company_name_kana: Option<String>,
    pub corporate_number: Option<String>,
    pub invoice_registration_number: Option<String>,
    pub corporate_type: String,
    pub address: Option<String>,
    pub closing_date: Option<String>,
    pub payment_terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub bank_accounts: Vec<PartnerBankAccount>,
}

impl PartnerResponse {
    pub fn new(partner: Partner, bank_accounts: Vec<PartnerBankAccount>) -> Self {
        Self {
            id: partner.id,
            display_name: partner.display_name,
            official_name: partner.official_name,
            ocr_name: partner.ocr_name,
            company_name_kana: partner.company_name_kana,
            corporate_number: partner.corporate_number,
            invoice_registration_number: partner.invoice_registration_number,
            corporate_type: partner.corporate_type,
            address: partner.address,
            closing_date: partner.closing_date,
            payment_terms: partner.payment_terms,
            created_at: partner.created_at,
            bank_accounts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct PartnerData {
    #[validate(length(min = 1, max = 255, message = "display_name is required"))]
    pub display_name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub ocr_name: Option<String>,
    #[serde(default)]
    pub company_name_kana: Option<String>,
    #[serde(default)]
    #[validate(length(equal = 13, message = "corporate_number must be 13 digits"))]
    pub corporate_number: Option<String>,
    #[serde(default)]
    #[validate(length(equal = 14, message = "invoice_registration_number must be T followed by 13 digits"))]
    pub invoice_registration_number: Option<String>,
    #[serde(default)]
    pub corporate_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub closing_date: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewPartnerBankAccount {
    #[validate(length(min = 1, message = "bank_name is required"))]
    pub bank_name: String,
    #[validate(length(min = 1, message = "branch_name is required"))]
    pub branch_name: String,
    #[validate(length(min = 1, message = "account_type is required"))]
    pub account_type: String,
    #[validate(length(min = 1, message = "account_number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "account_holder is required"))]
    pub account_holder: String,
}

/// Partner creation payload: partner fields plus nested bank accounts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreatePartnerRequest {
    #[validate(nested)]
    pub partner_data: PartnerData,
    #[serde(default)]
    #[validate(nested)]
    pub bank_accounts: Vec<NewPartnerBankAccount>,
}
