//! Currency DTOs

use core_kernel::{Currency, CurrencyRegistry};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub decimal_places: u32,
}

impl From<Currency> for CurrencyInfo {
    fn from(currency: Currency) -> Self {
        Self {
            code: currency.code(),
            symbol: currency.symbol(),
            decimal_places: currency.decimal_places(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub default: Currency,
    pub supported: Vec<CurrencyInfo>,
}

impl From<&CurrencyRegistry> for CurrenciesResponse {
    fn from(registry: &CurrencyRegistry) -> Self {
        Self {
            default: registry.default_currency(),
            supported: registry.supported().into_iter().map(CurrencyInfo::from).collect(),
        }
    }
}
