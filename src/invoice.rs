//! Invoice snapshots and the gateway invoice mapper.
//!
//! Domain invoices are immutable point-in-time snapshots built solely by
//! [`map_invoice`] from the gateway's invoice shape; callers never assemble
//! one field-by-field. Mapping is pure: no network, no persistence, and no
//! guessing when the gateway object is malformed; the caller supplying the
//! gateway shape owns its well-formedness.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Period start (unix seconds).
    pub start: u64,
    /// Period end (unix seconds).
    pub end: u64,
}

/// A point-in-time snapshot of the plan a line item billed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Gateway plan id.
    pub id: String,
    /// Plan display name at invoicing time.
    pub name: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// When the plan was created (unix seconds).
    pub created: Option<u64>,
    pub currency: String,
    /// Interval wire code at invoicing time.
    pub interval: String,
    pub interval_count: u32,
    pub trial_period_days: Option<u32>,
}

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Gateway line item id.
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    /// The period this line covers; absent for non-period charges.
    pub period: Option<Period>,
    /// The plan billed against; absent for one-off items.
    pub plan: Option<PlanSnapshot>,
    /// Whether this line is a proration adjustment.
    pub proration: bool,
    pub quantity: Option<u32>,
    /// Gateway line type (e.g. "subscription", "invoiceitem").
    pub kind: Option<String>,
}

/// An invoice snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Gateway invoice id.
    pub id: String,
    /// Owning gateway customer id.
    pub customer_id: String,
    /// Amount due in minor units.
    pub amount_due: i64,
    /// Application fee in minor units.
    pub application_fee: i64,
    pub attempt_count: u32,
    pub attempted: bool,
    pub currency: String,
    /// Due date (unix seconds).
    pub date: Option<u64>,
    pub description: Option<String>,
    /// Ending balance in minor units.
    pub ending_balance: i64,
    /// Next payment attempt (unix seconds).
    pub next_payment_attempt: Option<u64>,
    pub paid: bool,
    /// Billing period start (unix seconds).
    pub period_start: u64,
    /// Billing period end (unix seconds).
    pub period_end: u64,
    pub receipt_number: Option<String>,
    /// Starting balance in minor units.
    pub starting_balance: i64,
    pub statement_descriptor: Option<String>,
    /// Tax in minor units.
    pub tax: i64,
    pub tax_percent: Option<Decimal>,
    /// Subtotal in minor units.
    pub subtotal: i64,
    /// Total in minor units.
    pub total: i64,
    /// Line items; `None` when the gateway reported no line collection.
    pub line_items: Option<Vec<LineItem>>,
}

/// The gateway's invoice shape.
///
/// Monetary fields arrive as gateway decimals and are truncated to minor
/// units during mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInvoice {
    pub id: String,
    pub customer_id: String,
    pub amount_due: Decimal,
    #[serde(default)]
    pub application_fee: Decimal,
    pub attempt_count: u32,
    pub attempted: bool,
    pub currency: String,
    #[serde(default)]
    pub due_date: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ending_balance: Decimal,
    #[serde(default)]
    pub next_payment_attempt: Option<u64>,
    pub paid: bool,
    pub period_start: u64,
    pub period_end: u64,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub starting_balance: Decimal,
    #[serde(default)]
    pub statement_descriptor: Option<String>,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub tax_percent: Option<Decimal>,
    pub subtotal: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub lines: Option<Vec<GatewayInvoiceLine>>,
}

/// The gateway's invoice line shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInvoiceLine {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub period: Option<GatewayPeriod>,
    #[serde(default)]
    pub plan: Option<GatewayPlanSnapshot>,
    #[serde(default)]
    pub proration: bool,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// The gateway's period shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GatewayPeriod {
    pub start: u64,
    pub end: u64,
}

/// The gateway's embedded plan shape on a line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPlanSnapshot {
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub created: Option<u64>,
    pub currency: String,
    pub interval: String,
    #[serde(default = "one")]
    pub interval_count: u32,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
}

fn one() -> u32 {
    1
}

/// Trait for gateway invoice reads.
pub trait InvoiceGatewayClient: Send + Sync {
    /// List a customer's invoices, most recent first.
    async fn list_invoices(&self, customer_id: &str, limit: u8) -> Result<Vec<GatewayInvoice>>;

    /// Fetch a single invoice.
    async fn get_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice>;
}

/// Map a gateway invoice into a domain [`Invoice`].
///
/// Monetary amounts are truncated toward zero to minor units, never
/// rounded. A missing period or line collection maps to `None`, not to a
/// zero value or an empty collection.
#[must_use]
pub fn map_invoice(invoice: &GatewayInvoice) -> Invoice {
    Invoice {
        id: invoice.id.clone(),
        customer_id: invoice.customer_id.clone(),
        amount_due: minor_units(invoice.amount_due),
        application_fee: minor_units(invoice.application_fee),
        attempt_count: invoice.attempt_count,
        attempted: invoice.attempted,
        currency: invoice.currency.clone(),
        date: invoice.due_date,
        description: invoice.description.clone(),
        ending_balance: minor_units(invoice.ending_balance),
        next_payment_attempt: invoice.next_payment_attempt,
        paid: invoice.paid,
        period_start: invoice.period_start,
        period_end: invoice.period_end,
        receipt_number: invoice.receipt_number.clone(),
        starting_balance: minor_units(invoice.starting_balance),
        statement_descriptor: invoice.statement_descriptor.clone(),
        tax: minor_units(invoice.tax),
        tax_percent: invoice.tax_percent,
        subtotal: minor_units(invoice.subtotal),
        total: minor_units(invoice.total),
        line_items: map_lines(invoice.lines.as_deref()),
    }
}

fn map_lines(lines: Option<&[GatewayInvoiceLine]>) -> Option<Vec<LineItem>> {
    lines.map(|lines| lines.iter().map(map_line).collect())
}

fn map_line(line: &GatewayInvoiceLine) -> LineItem {
    LineItem {
        id: line.id.clone(),
        amount: minor_units(line.amount),
        currency: line.currency.clone(),
        period: line.period.map(map_period),
        plan: line.plan.as_ref().map(map_plan_snapshot),
        proration: line.proration,
        quantity: line.quantity,
        kind: line.kind.clone(),
    }
}

fn map_period(period: GatewayPeriod) -> Period {
    Period {
        start: period.start,
        end: period.end,
    }
}

fn map_plan_snapshot(plan: &GatewayPlanSnapshot) -> PlanSnapshot {
    PlanSnapshot {
        id: plan.id.clone(),
        name: plan.nickname.clone(),
        amount: minor_units(plan.amount),
        created: plan.created,
        currency: plan.currency.clone(),
        interval: plan.interval.clone(),
        interval_count: plan.interval_count,
        trial_period_days: plan.trial_period_days,
    }
}

/// Truncate a gateway decimal toward zero into minor units.
fn minor_units(amount: Decimal) -> i64 {
    amount.trunc().to_i64().unwrap_or(i64::MAX)
}

/// Mock invoice gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Mock invoice gateway client.
    #[derive(Default)]
    pub struct MockInvoiceGatewayClient {
        invoices: RwLock<HashMap<String, GatewayInvoice>>,
    }

    impl MockInvoiceGatewayClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a gateway invoice.
        pub fn seed_invoice(&self, invoice: GatewayInvoice) {
            self.invoices
                .write()
                .unwrap()
                .insert(invoice.id.clone(), invoice);
        }
    }

    impl InvoiceGatewayClient for MockInvoiceGatewayClient {
        async fn list_invoices(
            &self,
            customer_id: &str,
            limit: u8,
        ) -> Result<Vec<GatewayInvoice>> {
            let mut invoices: Vec<GatewayInvoice> = self
                .invoices
                .read()
                .unwrap()
                .values()
                .filter(|invoice| invoice.customer_id == customer_id)
                .cloned()
                .collect();
            invoices.sort_by(|a, b| b.period_start.cmp(&a.period_start));
            invoices.truncate(limit as usize);
            Ok(invoices)
        }

        async fn get_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice> {
            self.invoices
                .read()
                .unwrap()
                .get(invoice_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("invoice {invoice_id}")))
        }
    }
}
