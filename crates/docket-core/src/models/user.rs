use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Staff,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Staff => write!(f, "STAFF"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "STAFF" => Ok(UserRole::Staff),
            _ => Err(anyhow::anyhow!("role must be ADMIN or STAFF")),
        }
    }
}

/// A member of an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    #[serde(skip_serializing, default)]
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for both creating and replacing a user. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UserRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "All fields are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "All fields are required"))]
    pub department: String,
    #[serde(default)]
    #[schema(value_type = String, example = "STAFF")]
    pub role: String,
}

impl UserRequest {
    pub fn role(&self) -> Result<UserRole, String> {
        if self.role.is_empty() {
            return Err("All fields are required".to_string());
        }
        self.role.parse().map_err(|e: anyhow::Error| e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteUsersRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(role: &str) -> UserRequest {
        serde_json::from_value(json!({
            "name": "Sato",
            "email": "sato@example.com",
            "department": "Accounting",
            "role": role
        }))
        .unwrap()
    }

    #[test]
    fn role_must_be_admin_or_staff() {
        assert_eq!(request("ADMIN").role().unwrap(), UserRole::Admin);
        assert_eq!(request("STAFF").role().unwrap(), UserRole::Staff);
        assert!(request("admin").role().is_err());
        assert!(request("OWNER").role().is_err());
    }

    #[test]
    fn missing_fields_fail_validation() {
        let req: UserRequest = serde_json::from_value(json!({ "name": "Sato" })).unwrap();
        assert!(req.validate().is_err());
        assert!(req.role().is_err());
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(UserRole::Staff).unwrap(), json!("STAFF"));
    }
}
