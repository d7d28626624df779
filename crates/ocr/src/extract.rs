use std::sync::OnceLock;

use regex::Regex;

use crate::types::{ExtractionResult, LineItem, PLACEHOLDER};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// `\s*` after a label may run across a line break; `(.*)` never does.
re!(re_merchant_name, r"Merchant Name:\s*(.*)");
re!(re_date, r"Date:\s*(\d{2}/\d{2}/\d{4})");
re!(re_billing_address, r"Billing Address:\s*(.*)");
re!(re_customer_name, r"Customer Name:\s*(.*)");

re!(re_line_item, r"(\w+)\s+Rs\.\s*(\d+)\s+(\d+)\s+Rs\.\s*(\d+)");

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract structured fields from raw OCR text. Never fails: a field whose
    /// pattern finds nothing becomes [`PLACEHOLDER`].
    pub fn extract(ocr_text: &str) -> ExtractionResult {
        ExtractionResult {
            date: or_placeholder(Self::date(ocr_text)),
            merchant_name: or_placeholder(Self::merchant_name(ocr_text)),
            customer_name: or_placeholder(Self::customer_name(ocr_text)),
            billing_address: or_placeholder(Self::billing_address(ocr_text)),
            products: Self::line_items(ocr_text),
        }
    }

    // ── Labelled fields ───────────────────────────────────────────────────────

    pub fn merchant_name(text: &str) -> Option<String> {
        first_capture(re_merchant_name(), text)
    }

    /// Only `DD/DD/DDDD` is accepted; `4/18/2023` does not match.
    pub fn date(text: &str) -> Option<String> {
        first_capture(re_date(), text)
    }

    pub fn billing_address(text: &str) -> Option<String> {
        first_capture(re_billing_address(), text)
    }

    pub fn customer_name(text: &str) -> Option<String> {
        first_capture(re_customer_name(), text)
    }

    // ── Line items ────────────────────────────────────────────────────────────

    /// Every non-overlapping `<name> Rs.<rate> <qty> Rs.<amount>` row, in the
    /// order it appears in the text.
    pub fn line_items(text: &str) -> Vec<LineItem> {
        re_line_item()
            .captures_iter(text)
            .map(|c| LineItem {
                product_name: c[1].to_string(),
                rate: c[2].to_string(),
                quantity: c[3].to_string(),
                amount: c[4].to_string(),
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    let c = re.captures(text)?;
    Some(c.get(1)?.as_str().trim().to_string())
}

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ACME SUPERSTORE
Merchant Name: Acme Corp
Date: 04/18/2023
Customer Name: Jane Doe
Billing Address: 12 High Street, Springfield

Item Rate Qty Amount
Widget Rs. 10 2 Rs. 20
Gadget Rs. 5 3 Rs. 15
Total Rs. 35
";

    fn item(name: &str, rate: &str, qty: &str, amount: &str) -> LineItem {
        LineItem {
            product_name: name.into(),
            rate: rate.into(),
            quantity: qty.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn extracts_full_receipt() {
        let r = Extractor::extract(SAMPLE);
        assert_eq!(r.merchant_name, "Acme Corp");
        assert_eq!(r.date, "04/18/2023");
        assert_eq!(r.customer_name, "Jane Doe");
        assert_eq!(r.billing_address, "12 High Street, Springfield");
        assert_eq!(
            r.products,
            vec![item("Widget", "10", "2", "20"), item("Gadget", "5", "3", "15")]
        );
    }

    #[test]
    fn no_labels_gives_placeholders() {
        let r = Extractor::extract("just some noise\nwith no labels at all");
        assert_eq!(r, ExtractionResult::empty());
    }

    #[test]
    fn empty_text_gives_placeholders() {
        assert!(Extractor::extract("").is_empty());
    }

    #[test]
    fn no_panic_on_garbage_input() {
        let _ = Extractor::extract("!@#$%^&*()\n\0\x01\x02 Rs. Rs. Date:");
    }

    // ── Labelled fields ───────────────────────────────────────────────────────

    #[test]
    fn merchant_name_trims_surrounding_whitespace() {
        assert_eq!(
            Extractor::merchant_name("Merchant Name:    Acme Corp   \n").as_deref(),
            Some("Acme Corp")
        );
    }

    #[test]
    fn merchant_name_strips_carriage_return() {
        let text = "Merchant Name: Acme Corp\r\nDate: 04/18/2023\r\n";
        assert_eq!(Extractor::merchant_name(text).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn label_on_its_own_line_captures_next_line() {
        let text = "Customer Name:\nJane Doe\n";
        assert_eq!(Extractor::customer_name(text).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn label_with_nothing_after_it_is_empty_not_placeholder() {
        assert_eq!(Extractor::billing_address("Billing Address:   ").as_deref(), Some(""));
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert_eq!(Extractor::merchant_name("merchant name: Acme"), None);
    }

    #[test]
    fn first_match_wins() {
        let text = "Merchant Name: First\nMerchant Name: Second\n";
        assert_eq!(Extractor::merchant_name(text).as_deref(), Some("First"));
    }

    #[test]
    fn date_requires_two_digit_day_and_month() {
        assert_eq!(Extractor::date("Date: 04/18/2023").as_deref(), Some("04/18/2023"));
        assert_eq!(Extractor::date("Date: 4/18/2023"), None);
        assert_eq!(Extractor::extract("Date: 4/18/2023").date, "N/A");
    }

    #[test]
    fn date_skips_malformed_occurrence() {
        let text = "Due Date: 4/18/2023\nDate: 04/19/2023\n";
        assert_eq!(Extractor::date(text).as_deref(), Some("04/19/2023"));
    }

    #[test]
    fn date_without_label_is_not_picked_up() {
        assert_eq!(Extractor::date("Printed 04/18/2023"), None);
    }

    // ── Line items ────────────────────────────────────────────────────────────

    #[test]
    fn line_items_preserve_order() {
        let text = "Widget Rs. 10 2 Rs. 20\nGadget Rs. 5 3 Rs. 15";
        assert_eq!(
            Extractor::line_items(text),
            vec![item("Widget", "10", "2", "20"), item("Gadget", "5", "3", "15")]
        );
    }

    #[test]
    fn line_item_allows_missing_space_after_currency() {
        assert_eq!(
            Extractor::line_items("Pen Rs.7 4 Rs.28"),
            vec![item("Pen", "7", "4", "28")]
        );
    }

    #[test]
    fn multi_word_product_keeps_last_word() {
        assert_eq!(
            Extractor::line_items("Blue Widget Rs. 10 2 Rs. 20"),
            vec![item("Widget", "10", "2", "20")]
        );
    }

    #[test]
    fn amounts_are_not_cross_checked() {
        assert_eq!(
            Extractor::line_items("Widget Rs. 10 2 Rs. 999"),
            vec![item("Widget", "10", "2", "999")]
        );
    }

    #[test]
    fn totals_row_is_not_a_line_item() {
        assert!(Extractor::line_items("Total Rs. 35").is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        assert_eq!(Extractor::extract(SAMPLE), Extractor::extract(SAMPLE));
    }
}
