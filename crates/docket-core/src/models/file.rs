use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Review state of an uploaded document.
///
/// Transitions only move forward: `uploaded -> needs_review -> confirmed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "file_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploaded,
    NeedsReview,
    Confirmed,
}

impl FileStatus {
    fn rank(self) -> u8 {
        match self {
            FileStatus::Uploaded => 0,
            FileStatus::NeedsReview => 1,
            FileStatus::Confirmed => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps the status monotonic.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        next.rank() >= self.rank()
    }

    /// Extraction has not finished for this record yet
    pub fn is_pending_extraction(self) -> bool {
        self == FileStatus::Uploaded
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileStatus::Uploaded => write!(f, "uploaded"),
            FileStatus::NeedsReview => write!(f, "needs_review"),
            FileStatus::Confirmed => write!(f, "confirmed"),
        }
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(FileStatus::Uploaded),
            "needs_review" => Ok(FileStatus::NeedsReview),
            "confirmed" => Ok(FileStatus::Confirmed),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

/// Invoice fields derived from a document. Every field is independently
/// nullable; monetary amounts are integers in the invoice currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(default)]
pub struct ExtractedFields {
    pub issuer_name: Option<String>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub registration_number: Option<String>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>, example = "10000")]
    pub tax_8_base: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub tax_8_amount: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub tax_8_total: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub tax_10_base: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub tax_10_amount: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub tax_10_total: Option<Decimal>,
    #[serde(with = "amount_text")]
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self == &ExtractedFields::default()
    }

    /// Number of fields that carry a value
    pub fn populated_count(&self) -> usize {
        [
            self.issuer_name.is_some(),
            self.invoice_date.is_some(),
            self.registration_number.is_some(),
            self.tax_8_base.is_some(),
            self.tax_8_amount.is_some(),
            self.tax_8_total.is_some(),
            self.tax_10_base.is_some(),
            self.tax_10_amount.is_some(),
            self.tax_10_total.is_some(),
            self.total_amount.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// One uploaded document and its extracted invoice fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub file_name: String,
    pub object_key: String,
    pub status: FileStatus,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: ExtractedFields,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub file_name: String,
    pub object_key: String,
    pub status: FileStatus,
    #[serde(flatten)]
    pub fields: ExtractedFields,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            file_name: record.file_name,
            object_key: record.object_key,
            status: record.status,
            fields: record.fields,
            uploaded_at: record.uploaded_at,
            updated_at: record.updated_at,
        }
    }
}

/// Summary returned for each file accepted by an upload request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileSummary {
    pub id: Uuid,
    pub file_name: String,
}

/// Partial edit of a record's extracted fields.
///
/// A missing key leaves the stored value untouched, an explicit `null`
/// clears it. Amounts may be sent as JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateFileRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub issuer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "2024-04-30")]
    pub invoice_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub registration_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_8_base: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_8_amount: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_8_total: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_10_base: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_10_amount: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub tax_10_total: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Option<serde_json::Value>>,
}

/// Distinguishes an explicit `null` (Some(None)) from a missing key (None).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateFileRequest {
    /// Merge the edit onto the currently stored fields.
    ///
    /// Fails with a message naming the first field whose value is not a
    /// valid integer amount or date.
    pub fn apply_to(&self, current: &ExtractedFields) -> Result<ExtractedFields, String> {
        fn text(edit: &Option<Option<String>>, current: &Option<String>) -> Option<String> {
            match edit {
                None => current.clone(),
                Some(v) => v
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            }
        }

        fn amount(
            name: &str,
            edit: &Option<Option<serde_json::Value>>,
            current: &Option<Decimal>,
        ) -> Result<Option<Decimal>, String> {
            match edit {
                None => Ok(*current),
                Some(None) => Ok(None),
                Some(Some(serde_json::Value::String(s))) if s.trim().is_empty() => Ok(None),
                Some(Some(value)) => parse_amount(value)
                    .map(Some)
                    .ok_or_else(|| {
                        format!(
                            "{} must be an integer amount of at most {} digits",
                            name, AMOUNT_DIGITS
                        )
                    }),
            }
        }

        let invoice_date = match &self.invoice_date {
            None => current.invoice_date,
            Some(None) => None,
            Some(Some(s)) if s.trim().is_empty() => None,
            Some(Some(s)) => Some(
                parse_invoice_date(s)
                    .ok_or_else(|| "invoice_date must be an ISO 8601 date".to_string())?,
            ),
        };

        Ok(ExtractedFields {
            issuer_name: text(&self.issuer_name, &current.issuer_name),
            invoice_date,
            registration_number: text(&self.registration_number, &current.registration_number),
            tax_8_base: amount("tax_8_base", &self.tax_8_base, &current.tax_8_base)?,
            tax_8_amount: amount("tax_8_amount", &self.tax_8_amount, &current.tax_8_amount)?,
            tax_8_total: amount("tax_8_total", &self.tax_8_total, &current.tax_8_total)?,
            tax_10_base: amount("tax_10_base", &self.tax_10_base, &current.tax_10_base)?,
            tax_10_amount: amount("tax_10_amount", &self.tax_10_amount, &current.tax_10_amount)?,
            tax_10_total: amount("tax_10_total", &self.tax_10_total, &current.tax_10_total)?,
            total_amount: amount("total_amount", &self.total_amount, &current.total_amount)?,
        })
    }
}

/// Precision of the amount columns (`NUMERIC(20, 0)`).
pub const AMOUNT_DIGITS: u32 = 20;

/// Whether an integer amount fits the amount columns.
pub fn amount_in_range(amount: &Decimal) -> bool {
    amount.abs() < Decimal::from_i128_with_scale(10_i128.pow(AMOUNT_DIGITS), 0)
}

/// Parse a monetary amount into an integer decimal.
///
/// Accepts JSON integers, floats with no fractional part, and numeric strings
/// (thousands separators, currency marks and surrounding whitespace are
/// ignored). Returns `None` for anything else, including fractional values
/// and amounts with more than [`AMOUNT_DIGITS`] digits.
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    integer_amount(value).filter(amount_in_range)
}

fn integer_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .and_then(Decimal::from_f64_retain)
                    .map(|d| d.trunc())
            }
        }
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '¥' | '￥' | '円' | ' '))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            let d = Decimal::from_str(&cleaned).ok()?;
            (d.fract().is_zero()).then(|| d.trunc())
        }
        _ => None,
    }
}

/// Amounts go out as JSON strings and come back as strings, numbers or null.
///
/// Works behind `#[serde(flatten)]`, where a null arrives as a unit value.
mod amount_text {
    use super::parse_amount;
    use rust_decimal::Decimal;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.collect_str(d),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(None),
            value => parse_amount(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", value))),
        }
    }
}

/// Parse an invoice date given as RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_invoice_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()?;
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_is_monotonic() {
        assert!(FileStatus::Uploaded.can_transition_to(FileStatus::NeedsReview));
        assert!(FileStatus::NeedsReview.can_transition_to(FileStatus::Confirmed));
        assert!(FileStatus::Uploaded.can_transition_to(FileStatus::Confirmed));
        assert!(!FileStatus::Confirmed.can_transition_to(FileStatus::NeedsReview));
        assert!(!FileStatus::NeedsReview.can_transition_to(FileStatus::Uploaded));
    }

    #[test]
    fn status_text_form() {
        assert_eq!(FileStatus::NeedsReview.to_string(), "needs_review");
        assert_eq!(
            "confirmed".parse::<FileStatus>().unwrap(),
            FileStatus::Confirmed
        );
        assert_eq!(
            serde_json::to_value(FileStatus::NeedsReview).unwrap(),
            json!("needs_review")
        );
    }

    #[test]
    fn parse_amount_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_amount(&json!(1000)), Some(Decimal::from(1000)));
        assert_eq!(parse_amount(&json!(0)), Some(Decimal::ZERO));
        assert_eq!(parse_amount(&json!(1500.0)), Some(Decimal::from(1500)));
        assert_eq!(parse_amount(&json!("12,345")), Some(Decimal::from(12345)));
        assert_eq!(parse_amount(&json!("¥8,800")), Some(Decimal::from(8800)));
        assert_eq!(
            parse_amount(&json!("98765432109876543210")),
            Some(Decimal::from_str("98765432109876543210").unwrap())
        );
    }

    #[test]
    fn parse_amount_rejects_values_wider_than_the_column() {
        assert_eq!(parse_amount(&json!(1e21)), None);
        assert_eq!(parse_amount(&json!("100000000000000000000")), None);
        assert_eq!(parse_amount(&json!("-100000000000000000000")), None);
        assert_eq!(
            parse_amount(&json!("99999999999999999999")),
            Some(Decimal::from_str("99999999999999999999").unwrap())
        );
    }

    #[test]
    fn update_rejects_amount_wider_than_the_column() {
        let req: UpdateFileRequest =
            serde_json::from_value(json!({ "total_amount": "100000000000000000000" })).unwrap();
        let err = req.apply_to(&ExtractedFields::default()).unwrap_err();
        assert!(err.contains("total_amount"));
    }

    #[test]
    fn flattened_response_accepts_null_amounts() {
        let body = json!({
            "id": Uuid::new_v4(),
            "file_name": "a.pdf",
            "object_key": "uploads/a",
            "status": "uploaded",
            "issuer_name": null,
            "invoice_date": null,
            "registration_number": null,
            "tax_8_base": null,
            "tax_8_amount": null,
            "tax_8_total": null,
            "tax_10_base": "2000",
            "tax_10_amount": 200,
            "tax_10_total": null,
            "total_amount": null,
            "uploaded_at": "2024-03-15T09:00:00Z",
            "updated_at": "2024-03-15T09:00:00Z"
        });
        let file: FileResponse = serde_json::from_value(body).unwrap();
        assert_eq!(file.fields.tax_8_base, None);
        assert_eq!(file.fields.tax_10_base, Some(Decimal::from(2000)));
        assert_eq!(file.fields.tax_10_amount, Some(Decimal::from(200)));

        let echoed = serde_json::to_value(&file).unwrap();
        assert_eq!(echoed["tax_10_amount"], json!("200"));
        assert_eq!(echoed["total_amount"], json!(null));
    }

    #[test]
    fn parse_amount_rejects_fractions_and_garbage() {
        assert_eq!(parse_amount(&json!(10.5)), None);
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!(true)), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[test]
    fn parse_invoice_date_formats() {
        let d = parse_invoice_date("2024-04-30").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-04-30T00:00:00+00:00");
        assert!(parse_invoice_date("2024-04-30T09:00:00+09:00").is_some());
        assert!(parse_invoice_date("2024/04/30").is_some());
        assert!(parse_invoice_date("April 30").is_none());
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let fields = ExtractedFields {
            total_amount: Some(Decimal::from(1000)),
            ..Default::default()
        };
        let v = serde_json::to_value(&fields).unwrap();
        assert_eq!(v["total_amount"], json!("1000"));
        assert_eq!(v["tax_8_base"], json!(null));
    }

    #[test]
    fn update_distinguishes_missing_from_null() {
        let current = ExtractedFields {
            issuer_name: Some("Acme".to_string()),
            total_amount: Some(Decimal::from(1000)),
            tax_10_base: Some(Decimal::from(900)),
            ..Default::default()
        };
        let req: UpdateFileRequest =
            serde_json::from_value(json!({ "total_amount": "1100", "tax_10_base": null }))
                .unwrap();

        let merged = req.apply_to(&current).unwrap();
        assert_eq!(merged.issuer_name.as_deref(), Some("Acme"));
        assert_eq!(merged.total_amount, Some(Decimal::from(1100)));
        assert_eq!(merged.tax_10_base, None);
    }

    #[test]
    fn update_rejects_non_integer_amount() {
        let req: UpdateFileRequest =
            serde_json::from_value(json!({ "tax_8_total": "12.5" })).unwrap();
        let err = req.apply_to(&ExtractedFields::default()).unwrap_err();
        assert!(err.contains("tax_8_total"));
    }

    #[test]
    fn empty_update_keeps_everything() {
        let current = ExtractedFields {
            registration_number: Some("T1234567890123".to_string()),
            ..Default::default()
        };
        let merged = UpdateFileRequest::default().apply_to(&current).unwrap();
        assert_eq!(merged, current);
    }

    #[test]
    fn populated_count() {
        let mut fields = ExtractedFields::default();
        assert!(fields.is_empty());
        fields.issuer_name = Some("Acme".to_string());
        fields.total_amount = Some(Decimal::from(1));
        assert_eq!(fields.populated_count(), 2);
    }
}
