//! Line-item row parsing
//!
//! Bill submissions carry their line items as parallel arrays of untyped
//! values, one entry per row. This module turns them into typed drafts and
//! reports every malformed row, so that a caller can either reject the whole
//! submission or knowingly drop the bad rows.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use core_kernel::{CatalogItemId, Currency, CurrencyRegistry, ExchangeRate, Money};

use crate::assignment::MAX_QUANTITY;
use crate::error::BillingError;

/// Raw line-item columns as submitted
///
/// `item_ids`, `quantities` and `prices` must have one entry per row.
/// `currencies` and `exchange_rates` may be left empty altogether, otherwise
/// they need one entry per row too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLineItems {
    pub item_ids: Vec<String>,
    pub quantities: Vec<String>,
    pub prices: Vec<String>,
    pub currencies: Vec<String>,
    pub exchange_rates: Vec<String>,
}

impl RawLineItems {
    /// Number of submitted rows
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    fn check_lengths(&self) -> Result<(), BillingError> {
        let rows = self.len();
        let required = [("quantities", self.quantities.len()), ("prices", self.prices.len())];
        let optional = [
            ("currencies", self.currencies.len()),
            ("exchange_rates", self.exchange_rates.len()),
        ];

        for (name, len) in required {
            if len != rows {
                return Err(BillingError::validation(format!(
                    "{} has {} entries, expected {}",
                    name, len, rows
                )));
            }
        }
        for (name, len) in optional {
            if len != 0 && len != rows {
                return Err(BillingError::validation(format!(
                    "{} has {} entries, expected 0 or {}",
                    name, len, rows
                )));
            }
        }
        Ok(())
    }
}

/// A parsed, well-formed line-item row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDraft {
    /// Zero-based position in the submission
    pub row: usize,
    pub item_id: CatalogItemId,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Normalized currency
    pub currency: Currency,
    /// Submitted rate, `None` when the rate has to be looked up
    pub exchange_rate: Option<Decimal>,
}

/// A problem with one submitted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based position in the submission
    pub row: usize,
    /// Offending column
    pub field: String,
    pub message: String,
}

impl RowError {
    fn new(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.field, self.message)
    }
}

/// What to do with rows that fail to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRowPolicy {
    /// Fail the whole submission and report every bad row
    #[default]
    Reject,
    /// Drop bad rows, keep the rest, and report what was dropped
    Skip,
}

impl FromStr for MalformedRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown malformed row policy: {}", other)),
        }
    }
}

/// Outcome of a successful parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLineItems {
    /// Well-formed rows in submission order
    pub drafts: Vec<LineItemDraft>,
    /// Rows dropped under [`MalformedRowPolicy::Skip`]
    pub skipped: Vec<RowError>,
}

/// Parses raw line-item columns into drafts
///
/// # Errors
///
/// - `BillingError::Validation` if the column lengths disagree
/// - `BillingError::InvalidLineItems` with every row error, under
///   [`MalformedRowPolicy::Reject`], if any row is malformed
pub fn parse_line_items(
    raw: &RawLineItems,
    registry: &CurrencyRegistry,
    policy: MalformedRowPolicy,
) -> Result<ParsedLineItems, BillingError> {
    raw.check_lengths()?;

    let mut parsed = ParsedLineItems::default();
    let mut errors = Vec::new();

    for row in 0..raw.len() {
        match parse_row(raw, row, registry) {
            Ok(draft) => parsed.drafts.push(draft),
            Err(mut row_errors) => errors.append(&mut row_errors),
        }
    }

    if errors.is_empty() {
        return Ok(parsed);
    }

    match policy {
        MalformedRowPolicy::Reject => Err(BillingError::InvalidLineItems(errors)),
        MalformedRowPolicy::Skip => {
            for error in &errors {
                warn!(row = error.row, field = %error.field, "Skipping malformed line item: {}", error.message);
            }
            parsed.skipped = errors;
            Ok(parsed)
        }
    }
}

fn parse_row(
    raw: &RawLineItems,
    row: usize,
    registry: &CurrencyRegistry,
) -> Result<LineItemDraft, Vec<RowError>> {
    let mut errors = Vec::new();

    let item_id = raw.item_ids[row]
        .trim()
        .parse::<CatalogItemId>()
        .map_err(|e| errors.push(RowError::new(row, "item_id", e.to_string())))
        .ok();

    let quantity = match raw.quantities[row].trim().parse::<i64>() {
        Ok(q) if q < 0 => {
            errors.push(RowError::new(row, "quantity", format!("must not be negative, got {}", q)));
            None
        }
        Ok(q) => u32::try_from(q)
            .ok()
            .filter(|q| *q <= MAX_QUANTITY)
            .or_else(|| {
                errors.push(RowError::new(row, "quantity", format!("too large: {}", q)));
                None
            }),
        Err(e) => {
            errors.push(RowError::new(row, "quantity", e.to_string()));
            None
        }
    };

    let currency = registry.normalize_opt(raw.currencies.get(row).map(String::as_str));

    let unit_price = match raw.prices[row].trim().parse::<Decimal>() {
        Ok(p) if p.is_sign_negative() && !p.is_zero() => {
            errors.push(RowError::new(row, "price", format!("must not be negative, got {}", p)));
            None
        }
        Ok(p) => Money::try_new(p, currency)
            .map(|_| p)
            .map_err(|e| errors.push(RowError::new(row, "price", e.to_string())))
            .ok(),
        Err(e) => {
            errors.push(RowError::new(row, "price", e.to_string()));
            None
        }
    };

    let exchange_rate = match raw.exchange_rates.get(row).map(|r| r.trim()) {
        None | Some("") => None,
        Some(r) => match r.parse::<Decimal>() {
            Ok(rate) => ExchangeRate::check(rate)
                .map(|_| rate)
                .map_err(|e| errors.push(RowError::new(row, "exchange_rate", e.to_string())))
                .ok(),
            Err(e) => {
                errors.push(RowError::new(row, "exchange_rate", e.to_string()));
                None
            }
        },
    };

    match (item_id, quantity, unit_price) {
        (Some(item_id), Some(quantity), Some(unit_price)) if errors.is_empty() => Ok(LineItemDraft {
            row,
            item_id,
            quantity,
            unit_price,
            currency,
            exchange_rate,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn raw() -> RawLineItems {
        RawLineItems {
            item_ids: strings(&["1", "ITEM-2"]),
            quantities: strings(&["3", "2"]),
            prices: strings(&["19.99", "24.50"]),
            currencies: strings(&["eur", "USD"]),
            exchange_rates: strings(&["", "0.85"]),
        }
    }

    #[test]
    fn test_parse_well_formed_rows() {
        let parsed = parse_line_items(&raw(), &CurrencyRegistry::default(), MalformedRowPolicy::Reject).unwrap();

        assert_eq!(parsed.drafts.len(), 2);
        assert!(parsed.skipped.is_empty());

        let first = &parsed.drafts[0];
        assert_eq!(first.item_id, CatalogItemId::new(1));
        assert_eq!(first.quantity, 3);
        assert_eq!(first.unit_price, dec!(19.99));
        assert_eq!(first.currency, Currency::EUR);
        assert_eq!(first.exchange_rate, None);

        let second = &parsed.drafts[1];
        assert_eq!(second.item_id, CatalogItemId::new(2));
        assert_eq!(second.currency, Currency::USD);
        assert_eq!(second.exchange_rate, Some(dec!(0.85)));
    }

    #[test]
    fn test_optional_columns_may_be_empty() {
        let mut input = raw();
        input.currencies.clear();
        input.exchange_rates.clear();

        let parsed = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Reject).unwrap();
        assert!(parsed.drafts.iter().all(|d| d.currency == Currency::EUR));
    }

    #[test]
    fn test_unequal_lengths_rejected() {
        let mut input = raw();
        input.prices.pop();

        let result = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Skip);
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }

    #[test]
    fn test_reject_reports_every_row_error() {
        let mut input = raw();
        input.quantities[0] = "-1".to_string();
        input.prices[1] = "abc".to_string();
        input.exchange_rates[1] = "0".to_string();

        let result = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Reject);
        match result {
            Err(BillingError::InvalidLineItems(errors)) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0].row, 0);
                assert_eq!(errors[0].field, "quantity");
                assert_eq!(errors[1].field, "price");
                assert_eq!(errors[2].field, "exchange_rate");
            }
            other => panic!("expected row errors, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_drops_and_reports() {
        let mut input = raw();
        input.item_ids[0] = "not-a-number".to_string();

        let parsed = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Skip).unwrap();
        assert_eq!(parsed.drafts.len(), 1);
        assert_eq!(parsed.drafts[0].row, 1);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].field, "item_id");
    }

    #[test]
    fn test_unsupported_currency_normalizes() {
        let mut input = raw();
        input.currencies[1] = "XYZ".to_string();

        let parsed = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Reject).unwrap();
        assert_eq!(parsed.drafts[1].currency, Currency::EUR);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Skip".parse::<MalformedRowPolicy>(), Ok(MalformedRowPolicy::Skip));
        assert_eq!(" reject ".parse::<MalformedRowPolicy>(), Ok(MalformedRowPolicy::Reject));
        assert!("lenient".parse::<MalformedRowPolicy>().is_err());
        assert_eq!(MalformedRowPolicy::default(), MalformedRowPolicy::Reject);
    }

    #[test]
    fn test_prices_beyond_storage_precision_are_rejected() {
        let mut input = raw();
        input.prices[0] = "0.123456".to_string();
        input.exchange_rates[1] = "0.850000001".to_string();

        let result = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Reject);
        match result {
            Err(BillingError::InvalidLineItems(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!((errors[0].row, errors[0].field.as_str()), (0, "price"));
                assert_eq!((errors[1].row, errors[1].field.as_str()), (1, "exchange_rate"));
            }
            other => panic!("expected row errors, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        let mut input = raw();
        input.prices[0] = "19.990000".to_string();

        let parsed = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Reject).unwrap();
        assert_eq!(parsed.drafts[0].unit_price, dec!(19.99));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut input = raw();
        input.prices[0] = "79228162514264337593543950335".to_string();
        input.quantities[1] = "4294967295".to_string();

        let parsed = parse_line_items(&input, &CurrencyRegistry::default(), MalformedRowPolicy::Skip).unwrap();
        assert!(parsed.drafts.is_empty());
        let fields: Vec<_> = parsed.skipped.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "quantity"]);
    }
}
