//! Bill DTOs

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{AssignmentId, BillId, CatalogItemId, Currency, IssuerId, ReceiverId};
use domain_billing::{Bill, LineItemAssignment, NewBillRequest, PaidState, RawLineItems, RowError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bill submission with line items as parallel columns
#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    pub due_date: NaiveDate,
    pub issuer_id: IssuerId,
    pub receiver_id: ReceiverId,
    #[serde(default)]
    pub line_items: RawLineItems,
}

impl From<CreateBillRequest> for NewBillRequest {
    fn from(request: CreateBillRequest) -> Self {
        NewBillRequest {
            due_date: request.due_date,
            issuer_id: request.issuer_id,
            receiver_id: request.receiver_id,
            line_items: request.line_items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub due_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PartyRef<Id> {
    pub id: Id,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub id: Option<AssignmentId>,
    pub item_id: CatalogItemId,
    pub item_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub currency: Currency,
    pub exchange_rate: Decimal,
    pub original_amount: Decimal,
    pub base_amount: Decimal,
}

impl From<&LineItemAssignment> for LineItemResponse {
    fn from(item: &LineItemAssignment) -> Self {
        Self {
            id: item.id,
            item_id: item.item_id,
            item_name: item.item.as_ref().map(|i| i.name.clone()),
            quantity: item.quantity,
            unit_price: item.unit_price,
            currency: item.currency,
            exchange_rate: item.exchange_rate,
            original_amount: item.original_amount().amount(),
            base_amount: item.base_amount().amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: Option<BillId>,
    pub due_date: NaiveDate,
    pub paid: PaidState,
    pub overdue: bool,
    pub currency: Currency,
    pub original_total: Decimal,
    pub base_currency: Currency,
    pub base_total: Decimal,
    pub issuer: PartyRef<IssuerId>,
    pub receiver: PartyRef<ReceiverId>,
    pub items: Vec<LineItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            due_date: bill.due_date,
            paid: bill.paid_state(),
            overdue: bill.is_overdue(Utc::now().date_naive()),
            currency: bill.currency(),
            original_total: bill.original_total().amount(),
            base_currency: bill.base_currency(),
            base_total: bill.base_total().amount(),
            items: bill.items().iter().map(LineItemResponse::from).collect(),
            issuer: PartyRef {
                id: bill.issuer_id,
                name: bill.issuer_name,
            },
            receiver: PartyRef {
                id: bill.receiver_id,
                name: bill.receiver_name,
            },
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}

/// Response to a bill submission
#[derive(Debug, Serialize)]
pub struct CreateBillResponse {
    pub bill: BillResponse,
    /// Rows dropped under the lenient row policy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_rows: Vec<RowError>,
}
