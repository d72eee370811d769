//! Fixed instruction and response schema sent with every document.

use serde_json::{json, Value};

/// Field names in the order the model is asked to return them.
pub const EXTRACTION_FIELDS: [&str; 10] = [
    "issuer_name",
    "invoice_date",
    "registration_number",
    "tax_8_base",
    "tax_8_amount",
    "tax_8_total",
    "tax_10_base",
    "tax_10_amount",
    "tax_10_total",
    "total_amount",
];

pub const EXTRACTION_INSTRUCTION: &str = "\
Extract the following information from the attached PDF invoice.

Fields:
- issuer company name -> issuer_name
- invoice date -> invoice_date
- qualified invoice registration number -> registration_number
- 8% amount excluding tax -> tax_8_base
- 8% tax -> tax_8_amount
- 8% amount including tax -> tax_8_total
- 10% amount excluding tax -> tax_10_base
- 10% tax -> tax_10_amount
- 10% amount including tax -> tax_10_total
- grand total including tax -> total_amount";

/// JSON schema constraining the model's answer to the ten fields.
pub fn response_schema() -> Value {
    let mut properties = serde_json::Map::new();
    for field in EXTRACTION_FIELDS {
        let schema = match field {
            "issuer_name" | "registration_number" => json!({ "type": "STRING" }),
            "invoice_date" => json!({ "type": "STRING", "format": "date-time" }),
            _ => json!({ "type": "INTEGER" }),
        };
        properties.insert(field.to_string(), schema);
    }

    json!({
        "type": "OBJECT",
        "properties": properties,
        "propertyOrdering": EXTRACTION_FIELDS,
    })
}
