//! Persistence adapter traits for locally-owned billing records.
//!
//! The gateway is authoritative for money movement; these adapters hold the
//! local side of the picture (card references, invoice snapshots, plan
//! catalogs) in whatever database the host application uses. Providers call
//! them within their own async operations and do not retry on failure.
//!
//! In-memory implementations for tests live in [`test`].

use async_trait::async_trait;

use crate::card::CreditCard;
use crate::error::Result;
use crate::invoice::Invoice;
use crate::plans::SubscriptionPlan;

/// Storage for locally-persisted card records.
///
/// Raw card fields are transient; implementations should persist only the
/// identifiers, expiry, and the gateway card reference.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Find a card by owner and local id.
    async fn find(&self, account_id: &str, card_id: i64) -> Result<Option<CreditCard>>;

    /// All cards for an owner.
    async fn get_all(&self, account_id: &str) -> Result<Vec<CreditCard>>;

    /// Persist a new card record.
    async fn add(&self, card: &CreditCard) -> Result<()>;

    /// Update an existing card record.
    async fn update(&self, account_id: &str, card: &CreditCard) -> Result<()>;

    /// Delete a card record.
    async fn delete(&self, account_id: &str, card_id: i64) -> Result<()>;

    /// Check whether a card exists and belongs to the owner.
    async fn exists(&self, card_id: i64, account_id: &str) -> Result<bool>;
}

/// Storage for invoice snapshots mapped from the gateway.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Find an invoice by owning customer and gateway invoice id.
    async fn find(&self, customer_id: &str, invoice_id: &str) -> Result<Option<Invoice>>;

    /// All invoices for a customer.
    async fn get_all(&self, customer_id: &str) -> Result<Vec<Invoice>>;

    /// Persist a new invoice snapshot.
    async fn add(&self, invoice: &Invoice) -> Result<()>;

    /// Replace an existing invoice snapshot.
    async fn update(&self, customer_id: &str, invoice: &Invoice) -> Result<()>;

    /// Delete an invoice snapshot.
    async fn delete(&self, customer_id: &str, invoice_id: &str) -> Result<()>;

    /// Check whether an invoice exists and belongs to the customer.
    async fn exists(&self, invoice_id: &str, customer_id: &str) -> Result<bool>;
}

/// Storage for a local mirror of the plan catalog.
///
/// Plans are catalog-global rather than per-account, so these methods are
/// not ownership-scoped.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Find a plan by id.
    async fn find(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>>;

    /// All plans.
    async fn get_all(&self) -> Result<Vec<SubscriptionPlan>>;

    /// Persist a new plan.
    async fn add(&self, plan: &SubscriptionPlan) -> Result<()>;

    /// Update an existing plan.
    async fn update(&self, plan: &SubscriptionPlan) -> Result<()>;

    /// Delete a plan.
    async fn delete(&self, plan_id: &str) -> Result<()>;

    /// Check whether a plan exists.
    async fn exists(&self, plan_id: &str) -> Result<bool>;
}

/// In-memory stores for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::RwLock;

    /// In-memory card store.
    #[derive(Default)]
    pub struct InMemoryCardStore {
        next_id: AtomicI64,
        cards: RwLock<HashMap<i64, CreditCard>>,
    }

    impl InMemoryCardStore {
        /// Create a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self {
                next_id: AtomicI64::new(1),
                cards: RwLock::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl CardStore for InMemoryCardStore {
        async fn find(&self, account_id: &str, card_id: i64) -> Result<Option<CreditCard>> {
            Ok(self
                .cards
                .read()
                .unwrap()
                .get(&card_id)
                .filter(|card| card.account_id == account_id)
                .cloned())
        }

        async fn get_all(&self, account_id: &str) -> Result<Vec<CreditCard>> {
            let mut cards: Vec<CreditCard> = self
                .cards
                .read()
                .unwrap()
                .values()
                .filter(|card| card.account_id == account_id)
                .cloned()
                .collect();
            cards.sort_by_key(|card| card.id);
            Ok(cards)
        }

        async fn add(&self, card: &CreditCard) -> Result<()> {
            let mut stored = card.clone();
            if stored.id == 0 {
                stored.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            }
            self.cards.write().unwrap().insert(stored.id, stored);
            Ok(())
        }

        async fn update(&self, account_id: &str, card: &CreditCard) -> Result<()> {
            let mut cards = self.cards.write().unwrap();
            match cards.get(&card.id) {
                Some(existing) if existing.account_id == account_id => {
                    cards.insert(card.id, card.clone());
                    Ok(())
                }
                _ => Err(Error::Storage(format!("card {} not found", card.id))),
            }
        }

        async fn delete(&self, account_id: &str, card_id: i64) -> Result<()> {
            let mut cards = self.cards.write().unwrap();
            match cards.get(&card_id) {
                Some(existing) if existing.account_id == account_id => {
                    cards.remove(&card_id);
                    Ok(())
                }
                _ => Err(Error::Storage(format!("card {card_id} not found"))),
            }
        }

        async fn exists(&self, card_id: i64, account_id: &str) -> Result<bool> {
            Ok(self
                .cards
                .read()
                .unwrap()
                .get(&card_id)
                .is_some_and(|card| card.account_id == account_id))
        }
    }

    /// In-memory invoice store.
    #[derive(Default)]
    pub struct InMemoryInvoiceStore {
        invoices: RwLock<HashMap<String, Invoice>>,
    }

    impl InMemoryInvoiceStore {
        /// Create a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl InvoiceStore for InMemoryInvoiceStore {
        async fn find(&self, customer_id: &str, invoice_id: &str) -> Result<Option<Invoice>> {
            Ok(self
                .invoices
                .read()
                .unwrap()
                .get(invoice_id)
                .filter(|invoice| invoice.customer_id == customer_id)
                .cloned())
        }

        async fn get_all(&self, customer_id: &str) -> Result<Vec<Invoice>> {
            let mut invoices: Vec<Invoice> = self
                .invoices
                .read()
                .unwrap()
                .values()
                .filter(|invoice| invoice.customer_id == customer_id)
                .cloned()
                .collect();
            invoices.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(invoices)
        }

        async fn add(&self, invoice: &Invoice) -> Result<()> {
            self.invoices
                .write()
                .unwrap()
                .insert(invoice.id.clone(), invoice.clone());
            Ok(())
        }

        async fn update(&self, customer_id: &str, invoice: &Invoice) -> Result<()> {
            let mut invoices = self.invoices.write().unwrap();
            match invoices.get(&invoice.id) {
                Some(existing) if existing.customer_id == customer_id => {
                    invoices.insert(invoice.id.clone(), invoice.clone());
                    Ok(())
                }
                _ => Err(Error::Storage(format!("invoice {} not found", invoice.id))),
            }
        }

        async fn delete(&self, customer_id: &str, invoice_id: &str) -> Result<()> {
            let mut invoices = self.invoices.write().unwrap();
            match invoices.get(invoice_id) {
                Some(existing) if existing.customer_id == customer_id => {
                    invoices.remove(invoice_id);
                    Ok(())
                }
                _ => Err(Error::Storage(format!("invoice {invoice_id} not found"))),
            }
        }

        async fn exists(&self, invoice_id: &str, customer_id: &str) -> Result<bool> {
            Ok(self
                .invoices
                .read()
                .unwrap()
                .get(invoice_id)
                .is_some_and(|invoice| invoice.customer_id == customer_id))
        }
    }

    /// In-memory plan store.
    #[derive(Default)]
    pub struct InMemoryPlanStore {
        plans: RwLock<HashMap<String, SubscriptionPlan>>,
    }

    impl InMemoryPlanStore {
        /// Create a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PlanStore for InMemoryPlanStore {
        async fn find(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>> {
            Ok(self.plans.read().unwrap().get(plan_id).cloned())
        }

        async fn get_all(&self) -> Result<Vec<SubscriptionPlan>> {
            let mut plans: Vec<SubscriptionPlan> =
                self.plans.read().unwrap().values().cloned().collect();
            plans.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(plans)
        }

        async fn add(&self, plan: &SubscriptionPlan) -> Result<()> {
            self.plans
                .write()
                .unwrap()
                .insert(plan.id.clone(), plan.clone());
            Ok(())
        }

        async fn update(&self, plan: &SubscriptionPlan) -> Result<()> {
            let mut plans = self.plans.write().unwrap();
            if !plans.contains_key(&plan.id) {
                return Err(Error::Storage(format!("plan {} not found", plan.id)));
            }
            plans.insert(plan.id.clone(), plan.clone());
            Ok(())
        }

        async fn delete(&self, plan_id: &str) -> Result<()> {
            self.plans
                .write()
                .unwrap()
                .remove(plan_id)
                .map(|_| ())
                .ok_or_else(|| Error::Storage(format!("plan {plan_id} not found")))
        }

        async fn exists(&self, plan_id: &str) -> Result<bool> {
            Ok(self.plans.read().unwrap().contains_key(plan_id))
        }
    }
}
