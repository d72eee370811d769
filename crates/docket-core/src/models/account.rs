use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A bank account owned by the organization itself (payer side)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: Uuid,
    #[serde(skip_serializing, default)]
    pub tenant_id: Uuid,
    pub alias: Option<String>,
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: String,
    pub account_number: String,
    pub account_holder: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "alias must be at most 100 characters"))]
    pub alias: Option<String>,
    #[validate(length(min = 1, max = 255, message = "bank_name is required"))]
    pub bank_name: String,
    #[validate(length(min = 1, max = 255, message = "branch_name is required"))]
    pub branch_name: String,
    #[validate(length(min = 1, max = 50, message = "account_type is required"))]
    pub account_type: String,
    #[validate(length(min = 1, max = 20, message = "account_number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, max = 255, message = "account_holder is required"))]
    pub account_holder: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_account_requires_bank_fields() {
        let req: CreateAccountRequest = serde_json::from_value(json!({
            "bank_name": "",
            "branch_name": "Shibuya",
            "account_type": "普通",
            "account_number": "1234567",
            "account_holder": "ACME KK"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("bank_name"));
    }

    #[test]
    fn alias_is_optional() {
        let req: CreateAccountRequest = serde_json::from_value(json!({
            "bank_name": "Mizuho",
            "branch_name": "Shibuya",
            "account_type": "普通",
            "account_number": "1234567",
            "account_holder": "ACME KK"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.alias.is_none());
    }
}
