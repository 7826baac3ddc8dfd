//! Tollway - billing gateway orchestration for SaaS applications
//!
//! Tollway turns domain intents (start a trial, change plan, cancel at
//! period end, attach a card) into calls against a Stripe-style billing
//! gateway, and maps the gateway's responses back into a stable domain
//! model. The gateway stays authoritative for money movement, trial
//! windows, and proration; local storage stays authoritative for ownership.
//!
//! Each resource gets a narrow client trait (`PlanGatewayClient`,
//! `CustomerGatewayClient`, `CardGatewayClient`,
//! `SubscriptionGatewayClient`, `InvoiceGatewayClient`), a provider that
//! encodes the business rules on top of it, and a mock implementation for
//! tests behind the `test-gateway` feature. [`LiveGatewayClient`] implements
//! all of them against the real gateway.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tollway::{
//!     CreateCustomerOptions, CustomerProvider, LiveGatewayClient,
//!     SubscriptionProvider,
//! };
//! use rust_decimal::Decimal;
//!
//! let client = LiveGatewayClient::with_default_config(api_key)?;
//!
//! // Create a customer on a plan; the 15-day default trial applies.
//! let customers = CustomerProvider::new(client.clone());
//! let customer = customers.create_customer(&user, CreateCustomerOptions {
//!     plan_id: Some("starter".to_string()),
//!     ..Default::default()
//! }).await?;
//!
//! // Later: move them to another plan, preserving a running trial.
//! let subscriptions = SubscriptionProvider::new(client);
//! let outcome = subscriptions
//!     .update_subscription(&customer.id, &sub_id, "pro", true)
//!     .await;
//! if !outcome.succeeded() {
//!     tracing::warn!("plan change failed");
//! }
//! ```

#![allow(async_fn_in_trait)] // client traits are consumed generically, not as trait objects

pub mod audit;
pub mod card;
pub mod customer;
mod error;
pub mod invoice;
pub mod live_client;
pub mod plans;
pub mod store;
pub mod subscription;
pub mod validation;

// Re-exports for public API
pub use audit::{AuditEvent, AuditLogger, NoOpAuditLogger, TracingAuditLogger};
pub use card::{
    CardGatewayClient, CardProvider, CreditCard, GatewayCard, GatewayToken, TokenizeCardRequest,
};
pub use customer::{
    CreateCustomerOptions, CreateCustomerRequest, CustomerAccount, CustomerGatewayClient,
    CustomerProvider, GatewayCustomer, UpdateCustomerRequest, DEFAULT_TRIAL_DAYS,
};
pub use error::{Error, Result};
pub use invoice::{
    map_invoice, GatewayInvoice, GatewayInvoiceLine, GatewayPeriod, GatewayPlanSnapshot, Invoice,
    InvoiceGatewayClient, LineItem, Period, PlanSnapshot,
};
pub use live_client::{InvalidApiKeyError, LiveGatewayClient, LiveGatewayClientConfig};
pub use plans::{
    CreatePlanRequest, GatewayPlan, PlanGatewayClient, PlanInterval, PlanListOptions,
    PlanProperty, PlanProvider, SubscriptionPlan, UpdatePlanRequest,
};
pub use store::{CardStore, InvoiceStore, PlanStore};
pub use subscription::{
    CancelSubscriptionRequest, CreateSubscriptionRequest, GatewaySubscription, Subscription,
    SubscriptionGatewayClient, SubscriptionProvider, SubscriptionStatus,
    UpdateOutcome, UpdateSubscriptionRequest,
};

// Test exports
#[cfg(any(test, feature = "test-gateway"))]
pub use card::test::MockCardGatewayClient;

#[cfg(any(test, feature = "test-gateway"))]
pub use customer::test::MockCustomerGatewayClient;

#[cfg(any(test, feature = "test-gateway"))]
pub use invoice::test::MockInvoiceGatewayClient;

#[cfg(any(test, feature = "test-gateway"))]
pub use plans::test::MockPlanGatewayClient;

#[cfg(any(test, feature = "test-gateway"))]
pub use store::test::{InMemoryCardStore, InMemoryInvoiceStore, InMemoryPlanStore};

#[cfg(any(test, feature = "test-gateway"))]
pub use subscription::test::MockSubscriptionGatewayClient;

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
