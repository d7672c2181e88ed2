//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::NaiveDate;
use core_kernel::{CatalogItemId, Currency, CurrencyRegistry, IssuerId, ReceiverId};
use domain_billing::{Address, Bill, LineItemAssignment, Party, RawLineItems};
use fake::faker::address::en::{CityName, CountryCode, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;

use crate::fixtures::due_date;

/// Builder for the raw parallel line-item columns of a bill submission
#[derive(Debug, Clone, Default)]
pub struct LineItemsBuilder {
    raw: RawLineItems,
}

impl LineItemsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row; pass `""` for an absent currency or rate
    pub fn row(
        mut self,
        item_id: CatalogItemId,
        quantity: &str,
        price: &str,
        currency: &str,
        exchange_rate: &str,
    ) -> Self {
        self.raw.item_ids.push(item_id.get().to_string());
        self.raw.quantities.push(quantity.to_string());
        self.raw.prices.push(price.to_string());
        self.raw.currencies.push(currency.to_string());
        self.raw.exchange_rates.push(exchange_rate.to_string());
        self
    }

    pub fn build(self) -> RawLineItems {
        self.raw
    }
}

/// Builder for in-memory bills with computed totals
pub struct BillBuilder {
    due_date: NaiveDate,
    issuer_id: IssuerId,
    receiver_id: ReceiverId,
    registry: CurrencyRegistry,
    lines: Vec<(CatalogItemId, u32, Decimal, Currency, Decimal)>,
    paid: bool,
}

impl Default for BillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillBuilder {
    pub fn new() -> Self {
        Self {
            due_date: due_date(),
            issuer_id: IssuerId::new(1),
            receiver_id: ReceiverId::new(1),
            registry: CurrencyRegistry::default(),
            lines: Vec::new(),
            paid: false,
        }
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = date;
        self
    }

    pub fn with_parties(mut self, issuer_id: IssuerId, receiver_id: ReceiverId) -> Self {
        self.issuer_id = issuer_id;
        self.receiver_id = receiver_id;
        self
    }

    pub fn with_registry(mut self, registry: CurrencyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a line item; the rate is ignored for base-currency lines
    pub fn with_line(
        mut self,
        item_id: CatalogItemId,
        quantity: u32,
        unit_price: Decimal,
        currency: Currency,
        exchange_rate: Decimal,
    ) -> Self {
        self.lines.push((item_id, quantity, unit_price, currency, exchange_rate));
        self
    }

    pub fn paid(mut self) -> Self {
        self.paid = true;
        self
    }

    /// Builds the bill and recomputes its totals
    ///
    /// # Panics
    ///
    /// Panics if a line is rejected (negative or over-precise price, invalid
    /// foreign rate) or an amount leaves the storable range
    pub fn build(self) -> Bill {
        let mut bill = Bill::new(self.due_date, self.issuer_id, self.receiver_id, &self.registry);
        for (item_id, quantity, price, currency, rate) in self.lines {
            let line = LineItemAssignment::new(item_id, quantity, price, currency.code(), rate, &self.registry)
                .expect("valid line item");
            bill.add_item(line).expect("same base currency");
        }
        bill.recompute_totals().expect("totals within range");
        if self.paid {
            bill.toggle_paid();
        }
        bill
    }
}

/// Builder for issuers and receivers filled with fake company data
pub struct PartyBuilder {
    name: String,
    vat_number: String,
    address: Address,
}

impl Default for PartyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PartyBuilder {
    pub fn new() -> Self {
        Self {
            name: CompanyName().fake(),
            vat_number: format!("VAT{}", (100_000_000u32..999_999_999).fake::<u32>()),
            address: Address {
                street: StreetName().fake(),
                city: CityName().fake(),
                state: StateAbbr().fake(),
                zip_code: ZipCode().fake(),
                country: CountryCode().fake(),
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds an unsaved issuer or receiver
    ///
    /// # Panics
    ///
    /// Panics if the name is blank
    pub fn build<Id>(self) -> Party<Id> {
        Party::new(self.name, self.vat_number, self.address).expect("valid party")
    }
}
