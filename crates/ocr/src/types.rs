use serde::{Deserialize, Serialize};

/// Substituted for any scalar field whose pattern finds no match.
pub const PLACEHOLDER: &str = "N/A";

/// One recognized product row. Numeric-looking columns are kept verbatim as
/// they came out of OCR; nothing is parsed or validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub product_name: String,
    pub rate: String,
    pub quantity: String,
    pub amount: String,
}

/// The structured fields pulled out of a receipt's OCR text.
///
/// Field order here is the order of keys in the JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    pub date: String,
    pub merchant_name: String,
    pub customer_name: String,
    pub billing_address: String,
    pub products: Vec<LineItem>,
}

impl ExtractionResult {
    /// A result where nothing matched.
    pub fn empty() -> Self {
        Self {
            date: PLACEHOLDER.to_string(),
            merchant_name: PLACEHOLDER.to_string(),
            customer_name: PLACEHOLDER.to_string(),
            billing_address: PLACEHOLDER.to_string(),
            products: Vec::new(),
        }
    }

    /// Whether no scalar field matched and no line item was found.
    pub fn is_empty(&self) -> bool {
        [&self.date, &self.merchant_name, &self.customer_name, &self.billing_address]
            .iter()
            .all(|v| v.as_str() == PLACEHOLDER)
            && self.products.is_empty()
    }
}
