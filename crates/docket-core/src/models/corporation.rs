use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Entry of the qualified invoice issuer registry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Corporation {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub sequence_number: i32,
    /// `T` followed by the corporate number
    pub registrated_number: String,
    pub process: i32,
    pub correct: i32,
    pub kind: i32,
    pub country: i32,
    pub latest: i32,
    pub registration_date: NaiveDate,
    pub update_date: NaiveDate,
    pub address: Option<String>,
    pub address_prefecture_code: Option<i32>,
    pub address_city_code: Option<i32>,
}

/// Entry of the corporate number registry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CorporationNumberInfo {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub sequence_number: i32,
    pub corporate_number: String,
    pub process: i32,
    pub correct: i32,
    pub update_date: NaiveDate,
    pub change_date: Option<NaiveDate>,
    pub name: String,
    pub kind: i32,
    pub prefecture_name: Option<String>,
    pub city_name: Option<String>,
    pub street_number: Option<String>,
    pub prefecture_code: Option<i32>,
    pub city_code: Option<i32>,
    pub post_code: Option<String>,
    pub address_outside: Option<String>,
    pub close_date: Option<NaiveDate>,
    pub close_cause: Option<String>,
    pub successor_corporate_number: Option<String>,
    pub change_cause: Option<String>,
    pub assignment_date: NaiveDate,
    pub latest: i32,
    pub en_name: Option<String>,
    pub en_prefecture_name: Option<String>,
    pub en_city_name: Option<String>,
    pub en_address_outside: Option<String>,
    pub furigana: Option<String>,
    pub hihyoji: i32,
}

/// What both registries know about one corporate number. Either side may be
/// missing, but never both.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CorporationLookup {
    pub corporate_invoice_info: Option<Corporation>,
    pub corporate_number_info: Option<CorporationNumberInfo>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CorporationQuery {
    /// Bare 13 digit corporate number; a leading `T` is tolerated
    #[serde(rename = "corporateNumber", default)]
    pub corporate_number: Option<String>,
}

impl CorporationQuery {
    /// The trimmed number without a `T` prefix, if one was given.
    pub fn normalized_number(&self) -> Option<String> {
        let raw = self.corporate_number.as_deref()?.trim();
        let digits = raw
            .strip_prefix('T')
            .or_else(|| raw.strip_prefix('t'))
            .unwrap_or(raw);
        (!digits.is_empty()).then(|| digits.to_string())
    }
}

/// Registration number under which the invoice registry files a corporate
/// number.
pub fn invoice_registration_number(corporate_number: &str) -> String {
    format!("T{}", corporate_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(value: Option<&str>) -> CorporationQuery {
        CorporationQuery {
            corporate_number: value.map(str::to_string),
        }
    }

    #[test]
    fn normalized_number_strips_prefix_and_whitespace() {
        assert_eq!(
            query(Some(" T1234567890123 ")).normalized_number().as_deref(),
            Some("1234567890123")
        );
        assert_eq!(
            query(Some("1234567890123")).normalized_number().as_deref(),
            Some("1234567890123")
        );
    }

    #[test]
    fn missing_or_blank_number_is_none() {
        assert!(query(None).normalized_number().is_none());
        assert!(query(Some("  ")).normalized_number().is_none());
        assert!(query(Some("T")).normalized_number().is_none());
    }

    #[test]
    fn registration_number_is_prefixed() {
        assert_eq!(invoice_registration_number("1234567890123"), "T1234567890123");
    }
}
