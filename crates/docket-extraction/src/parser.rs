//! Model answer → [`ExtractedFields`]
//!
//! The model is asked for a JSON object but nothing about its answer is
//! trusted. Unreadable text yields all-null fields and a recorded reason;
//! each field is then read independently so one bad value never discards the
//! others.

use serde_json::{Map, Value};

use docket_core::models::{parse_amount, parse_invoice_date, ExtractedFields};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub fields: ExtractedFields,
    /// Why the answer could not be read as a JSON object, if it could not.
    pub failure: Option<String>,
}

impl ParseOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            fields: ExtractedFields::default(),
            failure: Some(reason.into()),
        }
    }
}

pub fn parse_extraction(text: &str) -> ParseOutcome {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return ParseOutcome::failed("empty response");
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => return ParseOutcome::failed(format!("invalid JSON: {e}")),
    };

    let Value::Object(map) = value else {
        return ParseOutcome::failed("response is not a JSON object");
    };

    ParseOutcome {
        fields: fields_from_map(&map),
        failure: None,
    }
}

fn fields_from_map(map: &Map<String, Value>) -> ExtractedFields {
    let amount = |key: &str| map.get(key).and_then(parse_amount);

    ExtractedFields {
        issuer_name: text_field(map, "issuer_name"),
        invoice_date: text_field(map, "invoice_date").and_then(|s| parse_invoice_date(&s)),
        registration_number: text_field(map, "registration_number"),
        tax_8_base: amount("tax_8_base"),
        tax_8_amount: amount("tax_8_amount"),
        tax_8_total: amount("tax_8_total"),
        tax_10_base: amount("tax_10_base"),
        tax_10_amount: amount("tax_10_amount"),
        tax_10_total: amount("tax_10_total"),
        total_amount: amount("total_amount"),
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        _ => None,
    }
}

/// Models sometimes wrap JSON in a ```json fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn full_answer_is_parsed() {
        let out = parse_extraction(
            r#"{
                "issuer_name": "Acme",
                "invoice_date": "2024-04-30",
                "registration_number": "T1234567890123",
                "tax_8_base": 0,
                "tax_8_amount": 0,
                "tax_8_total": 0,
                "tax_10_base": 10000,
                "tax_10_amount": 1000,
                "tax_10_total": 11000,
                "total_amount": 11000
            }"#,
        );
        assert!(out.failure.is_none());
        let f = out.fields;
        assert_eq!(f.issuer_name.as_deref(), Some("Acme"));
        assert_eq!(
            f.invoice_date.unwrap().to_rfc3339(),
            "2024-04-30T00:00:00+00:00"
        );
        assert_eq!(f.registration_number.as_deref(), Some("T1234567890123"));
        assert_eq!(f.tax_8_base, Some(Decimal::ZERO));
        assert_eq!(f.tax_10_amount, Some(Decimal::from(1000)));
        assert_eq!(f.total_amount, Some(Decimal::from(11000)));
    }

    #[test]
    fn invalid_json_yields_all_nulls() {
        let out = parse_extraction("I could not read this invoice.");
        assert!(out.failure.is_some());
        assert!(out.fields.is_empty());
    }

    #[test]
    fn empty_object_yields_all_nulls_without_failure() {
        let out = parse_extraction("{}");
        assert!(out.failure.is_none());
        assert!(out.fields.is_empty());
    }

    #[test]
    fn non_object_is_a_failure() {
        assert!(parse_extraction("[1, 2]").failure.is_some());
        assert!(parse_extraction("   ").failure.is_some());
    }

    #[test]
    fn bad_values_are_nulled_individually() {
        let out = parse_extraction(
            r#"{"issuer_name": "", "invoice_date": "someday", "total_amount": "5,500", "tax_10_total": 12.5}"#,
        );
        let f = out.fields;
        assert_eq!(f.issuer_name, None);
        assert_eq!(f.invoice_date, None);
        assert_eq!(f.total_amount, Some(Decimal::from(5500)));
        assert_eq!(f.tax_10_total, None);
    }

    #[test]
    fn amount_too_wide_for_storage_is_nulled() {
        let out = parse_extraction(
            r#"{"issuer_name": "Acme", "total_amount": 1e21, "tax_10_base": 900}"#,
        );
        assert!(out.failure.is_none());
        assert_eq!(out.fields.issuer_name.as_deref(), Some("Acme"));
        assert_eq!(out.fields.total_amount, None);
        assert_eq!(out.fields.tax_10_base, Some(Decimal::from(900)));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let out = parse_extraction("```json\n{\"issuer_name\": \"Acme\"}\n```");
        assert!(out.failure.is_none());
        assert_eq!(out.fields.issuer_name.as_deref(), Some("Acme"));
    }
}
