//! Payment card management.
//!
//! Coordinates two systems that must agree on which card is current: the
//! gateway (which holds the tokenized instrument) and local storage (which
//! holds ownership and the gateway reference). The coordination is not
//! transactional; each operation documents which side can be left ahead of
//! the other when a step fails partway.

use crate::audit::{AuditEvent, AuditLogger, NoOpAuditLogger};
use crate::customer::CustomerAccount;
use crate::error::{Error, Result};
use crate::store::CardStore;
use crate::validation::validate_card;

/// A payment card.
///
/// PAN, CVC, and address fields are transient: they exist only to build a
/// gateway tokenization request and are never persisted in raw form. The
/// only identifier that outlives the operation is `gateway_card_id`.
#[derive(Clone, PartialEq, Eq)]
pub struct CreditCard {
    /// Local record id (0 until persisted, for stores that assign ids).
    pub id: i64,
    /// Owning account id.
    pub account_id: String,
    /// Cardholder name.
    pub name: Option<String>,
    /// Card number (transient).
    pub number: String,
    /// Expiry month, 1-12.
    pub exp_month: u32,
    /// Expiry year, four digits.
    pub exp_year: u32,
    /// Card verification code (transient).
    pub cvc: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    /// The gateway-side card reference; the only card identifier persisted
    /// long-term.
    pub gateway_card_id: Option<String>,
}

impl CreditCard {
    /// Create a card with the required fields.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        number: impl Into<String>,
        exp_month: u32,
        exp_year: u32,
        cvc: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            account_id: account_id.into(),
            name: None,
            number: number.into(),
            exp_month,
            exp_year,
            cvc: cvc.into(),
            address_line1: None,
            address_line2: None,
            address_city: None,
            address_state: None,
            address_zip: None,
            gateway_card_id: None,
        }
    }

    /// Last four digits of the card number.
    #[must_use]
    pub fn last4(&self) -> &str {
        let len = self.number.len();
        &self.number[len.saturating_sub(4)..]
    }
}

// PAN and CVC never reach debug output.
impl std::fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditCard")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("last4", &self.last4())
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("gateway_card_id", &self.gateway_card_id)
            .finish_non_exhaustive()
    }
}

/// Request to tokenize card details at the gateway.
#[derive(Debug, Clone)]
pub struct TokenizeCardRequest {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
}

impl TokenizeCardRequest {
    /// Build a tokenization request from a card's transient fields.
    #[must_use]
    pub fn from_card(card: &CreditCard) -> Self {
        Self {
            number: card.number.clone(),
            exp_month: card.exp_month,
            exp_year: card.exp_year,
            cvc: card.cvc.clone(),
            name: card.name.clone(),
            address_line1: card.address_line1.clone(),
            address_line2: card.address_line2.clone(),
            address_city: card.address_city.clone(),
            address_state: card.address_state.clone(),
            address_zip: card.address_zip.clone(),
        }
    }
}

/// A single-use card token issued by the gateway.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GatewayToken {
    pub id: String,
}

/// The gateway's card shape.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GatewayCard {
    pub id: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
}

/// Trait for gateway card operations.
pub trait CardGatewayClient: Send + Sync {
    /// Tokenize raw card details.
    async fn create_token(&self, request: TokenizeCardRequest) -> Result<GatewayToken>;

    /// Attach a tokenized card to a customer.
    async fn attach_card(&self, customer_id: &str, token_id: &str) -> Result<GatewayCard>;

    /// Delete a card from a customer.
    async fn delete_card(&self, customer_id: &str, card_id: &str) -> Result<()>;
}

/// Card management across the gateway and local storage.
pub struct CardProvider<S, C, A = NoOpAuditLogger> {
    store: S,
    client: C,
    audit: A,
}

impl<S: CardStore, C: CardGatewayClient> CardProvider<S, C> {
    /// Create a card provider with no audit logging.
    #[must_use]
    pub fn new(store: S, client: C) -> Self {
        Self {
            store,
            client,
            audit: NoOpAuditLogger,
        }
    }
}

impl<S: CardStore, C: CardGatewayClient, A: AuditLogger> CardProvider<S, C, A> {
    /// Create a card provider with an audit logger.
    #[must_use]
    pub fn with_audit(store: S, client: C, audit: A) -> Self {
        Self {
            store,
            client,
            audit,
        }
    }

    /// All locally-persisted cards for an account.
    pub async fn get_all(&self, account_id: &str) -> Result<Vec<CreditCard>> {
        self.store.get_all(account_id).await
    }

    /// Find a locally-persisted card.
    pub async fn find(&self, account_id: &str, card_id: i64) -> Result<Option<CreditCard>> {
        self.store.find(account_id, card_id).await
    }

    /// Tokenize and attach a new card, then persist the local record.
    ///
    /// Sequence: tokenize → attach at gateway → persist locally. If the
    /// local persist fails after the gateway attach succeeded, the gateway
    /// holds an orphaned card with no local record; the condition is logged
    /// as a `GatewayDesync` audit event and the storage error propagates.
    /// Recommended mitigation: retry with a compensating gateway delete, or
    /// run a reconciliation sweep over the customer's gateway card list.
    pub async fn add(&self, account: &impl CustomerAccount, mut card: CreditCard) -> Result<()> {
        validate_card(&card)?;
        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        let gateway_card = self.attach_to_gateway(customer_id, &card).await?;

        card.account_id = account.account_id().to_string();
        card.gateway_card_id = Some(gateway_card.id.clone());

        if let Err(err) = self.store.add(&card).await {
            self.record_desync(
                account.account_id(),
                format!(
                    "gateway card {} attached but local persist failed: {err}",
                    gateway_card.id
                ),
            )
            .await;
            return Err(err);
        }

        self.audit
            .log(AuditEvent::CardAdded {
                account_id: account.account_id().to_string(),
                gateway_card_id: gateway_card.id,
            })
            .await;

        Ok(())
    }

    /// Replace an existing card with new details.
    ///
    /// Sequence: look up the current record → delete the **old** gateway
    /// reference → tokenize and attach the **new** card → persist. Deleting
    /// before attaching keeps the customer under the gateway's instrument
    /// limit, at the cost of a narrow window with zero valid instruments if
    /// the attach fails after the delete succeeded; that window is reported
    /// as a `GatewayDesync` audit event.
    pub async fn update(&self, account: &impl CustomerAccount, mut card: CreditCard) -> Result<()> {
        validate_card(&card)?;
        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        let current = self
            .store
            .find(account.account_id(), card.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("card {}", card.id)))?;

        let old_reference = current.gateway_card_id;
        if let Some(ref old) = old_reference {
            self.client.delete_card(customer_id, old).await?;
        }

        let gateway_card = match self.attach_to_gateway(customer_id, &card).await {
            Ok(gateway_card) => gateway_card,
            Err(err) => {
                self.record_desync(
                    account.account_id(),
                    format!(
                        "old gateway card {} deleted but replacement attach failed: {err}",
                        old_reference.as_deref().unwrap_or("<none>")
                    ),
                )
                .await;
                return Err(err);
            }
        };

        card.account_id = account.account_id().to_string();
        card.gateway_card_id = Some(gateway_card.id.clone());

        if let Err(err) = self.store.update(account.account_id(), &card).await {
            self.record_desync(
                account.account_id(),
                format!(
                    "gateway card {} attached but local update failed: {err}",
                    gateway_card.id
                ),
            )
            .await;
            return Err(err);
        }

        self.audit
            .log(AuditEvent::CardReplaced {
                account_id: account.account_id().to_string(),
                old_gateway_card_id: old_reference,
                new_gateway_card_id: gateway_card.id,
            })
            .await;

        Ok(())
    }

    /// Check whether a card belongs to an account.
    pub async fn card_belongs_to_account(&self, card_id: i64, account_id: &str) -> Result<bool> {
        self.store.exists(card_id, account_id).await
    }

    /// Delete a card at the gateway, then locally.
    ///
    /// Fail-fast: a gateway failure prevents the local delete, so the local
    /// record is never removed while the gateway still holds the card.
    pub async fn delete(&self, account_id: &str, customer_id: &str, card_id: i64) -> Result<()> {
        let card = self
            .store
            .find(account_id, card_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("card {card_id}")))?;

        if let Some(ref gateway_reference) = card.gateway_card_id {
            self.client.delete_card(customer_id, gateway_reference).await?;
        }

        self.store.delete(account_id, card_id).await?;

        self.audit
            .log(AuditEvent::CardDeleted {
                account_id: account_id.to_string(),
                gateway_card_id: card.gateway_card_id.unwrap_or_default(),
            })
            .await;

        Ok(())
    }

    /// Tokenize the card and attach the token to the customer.
    async fn attach_to_gateway(
        &self,
        customer_id: &str,
        card: &CreditCard,
    ) -> Result<GatewayCard> {
        let token = self
            .client
            .create_token(TokenizeCardRequest::from_card(card))
            .await?;
        self.client.attach_card(customer_id, &token.id).await
    }

    async fn record_desync(&self, account_id: &str, detail: String) {
        tracing::error!(
            target: "tollway::consistency",
            account_id = %account_id,
            "{detail}"
        );
        self.audit
            .log(AuditEvent::GatewayDesync {
                account_id: account_id.to_string(),
                detail,
            })
            .await;
    }
}

/// Mock card gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Mock card gateway client that records operation order.
    #[derive(Default)]
    pub struct MockCardGatewayClient {
        counter: AtomicU64,
        operations: Mutex<Vec<String>>,
        fail_attach: AtomicBool,
        fail_delete: AtomicBool,
    }

    impl MockCardGatewayClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent attach calls fail.
        pub fn fail_attach(&self) {
            self.fail_attach.store(true, Ordering::SeqCst);
        }

        /// Make subsequent delete calls fail.
        pub fn fail_delete(&self) {
            self.fail_delete.store(true, Ordering::SeqCst);
        }

        /// Gateway operations performed, in order.
        pub fn operations(&self) -> Vec<String> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl CardGatewayClient for MockCardGatewayClient {
        async fn create_token(&self, _request: TokenizeCardRequest) -> Result<GatewayToken> {
            let id = format!("tok_test_{}", self.counter.fetch_add(1, Ordering::SeqCst));
            self.operations
                .lock()
                .unwrap()
                .push(format!("tokenize:{id}"));
            Ok(GatewayToken { id })
        }

        async fn attach_card(&self, customer_id: &str, token_id: &str) -> Result<GatewayCard> {
            if self.fail_attach.load(Ordering::SeqCst) {
                return Err(Error::gateway("attach_card", "gateway unavailable"));
            }
            let id = format!("card_test_{}", self.counter.fetch_add(1, Ordering::SeqCst));
            self.operations
                .lock()
                .unwrap()
                .push(format!("attach:{customer_id}:{token_id}:{id}"));
            Ok(GatewayCard {
                id,
                brand: Some("visa".to_string()),
                last4: Some("4242".to_string()),
            })
        }

        async fn delete_card(&self, customer_id: &str, card_id: &str) -> Result<()> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(Error::gateway("delete_card", "gateway unavailable"));
            }
            self.operations
                .lock()
                .unwrap()
                .push(format!("delete:{customer_id}:{card_id}"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MockCardGatewayClient;
    use super::*;
    use crate::store::test::InMemoryCardStore;
    use async_trait::async_trait;

    struct TestAccount;

    impl CustomerAccount for TestAccount {
        fn account_id(&self) -> &str {
            "acct_1"
        }

        fn email(&self) -> &str {
            "owner@example.com"
        }

        fn gateway_customer_id(&self) -> Option<&str> {
            Some("cus_1")
        }
    }

    fn new_card() -> CreditCard {
        CreditCard::new("acct_1", "4242424242424242", 12, 2030, "123")
    }

    #[test]
    fn test_debug_redacts_pan_and_cvc() {
        let card = new_card();
        let debug = format!("{card:?}");
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123"));
        assert!(debug.contains("4242"));
    }

    #[tokio::test]
    async fn test_add_tokenizes_attaches_then_persists() {
        let provider = CardProvider::new(InMemoryCardStore::new(), MockCardGatewayClient::new());

        provider.add(&TestAccount, new_card()).await.unwrap();

        let ops = provider.client.operations();
        assert_eq!(ops.len(), 2);
        assert!(ops[0].starts_with("tokenize:"));
        assert!(ops[1].starts_with("attach:cus_1:tok_test_0:"));

        let cards = provider.get_all("acct_1").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].gateway_card_id.as_deref(), Some("card_test_1"));
    }

    #[tokio::test]
    async fn test_add_gateway_failure_persists_nothing() {
        let client = MockCardGatewayClient::new();
        client.fail_attach();
        let provider = CardProvider::new(InMemoryCardStore::new(), client);

        let result = provider.add(&TestAccount, new_card()).await;
        assert!(matches!(result, Err(Error::Gateway { .. })));
        assert!(provider.get_all("acct_1").await.unwrap().is_empty());
    }

    /// Store whose writes always fail.
    struct BrokenCardStore;

    #[async_trait]
    impl crate::store::CardStore for BrokenCardStore {
        async fn find(&self, _: &str, _: i64) -> Result<Option<CreditCard>> {
            Ok(None)
        }
        async fn get_all(&self, _: &str) -> Result<Vec<CreditCard>> {
            Ok(Vec::new())
        }
        async fn add(&self, _: &CreditCard) -> Result<()> {
            Err(Error::Storage("disk full".to_string()))
        }
        async fn update(&self, _: &str, _: &CreditCard) -> Result<()> {
            Err(Error::Storage("disk full".to_string()))
        }
        async fn delete(&self, _: &str, _: i64) -> Result<()> {
            Err(Error::Storage("disk full".to_string()))
        }
        async fn exists(&self, _: i64, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    /// Audit logger that captures events through a shared handle.
    #[derive(Clone, Default)]
    struct CapturingAudit {
        events: std::sync::Arc<std::sync::Mutex<Vec<AuditEvent>>>,
    }

    impl AuditLogger for CapturingAudit {
        async fn log(&self, event: AuditEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_add_persist_failure_leaves_orphaned_gateway_card() {
        let provider = CardProvider::new(BrokenCardStore, MockCardGatewayClient::new());

        let result = provider.add(&TestAccount, new_card()).await;
        assert!(matches!(result, Err(Error::Storage(_))));
        // The gateway attach happened before the persist failed.
        let ops = provider.client.operations();
        assert!(ops.iter().any(|op| op.starts_with("attach:")));
    }

    #[tokio::test]
    async fn test_add_persist_failure_emits_desync_audit_event() {
        let audit = CapturingAudit::default();
        let provider = CardProvider::with_audit(
            BrokenCardStore,
            MockCardGatewayClient::new(),
            audit.clone(),
        );

        let result = provider.add(&TestAccount, new_card()).await;
        assert!(result.is_err());

        let events = audit.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AuditEvent::GatewayDesync { .. }));
    }

    #[tokio::test]
    async fn test_update_deletes_old_reference_before_attaching_new() {
        let store = InMemoryCardStore::new();
        let mut existing = new_card();
        existing.id = 7;
        existing.gateway_card_id = Some("card_old".to_string());
        store.add(&existing).await.unwrap();

        let provider = CardProvider::new(store, MockCardGatewayClient::new());

        let mut replacement = CreditCard::new("acct_1", "5555555555554444", 6, 2031, "321");
        replacement.id = 7;
        provider.update(&TestAccount, replacement).await.unwrap();

        let ops = provider.client.operations();
        assert_eq!(ops[0], "delete:cus_1:card_old");
        assert!(ops[1].starts_with("tokenize:"));
        assert!(ops[2].starts_with("attach:"));

        let updated = provider.find("acct_1", 7).await.unwrap().unwrap();
        assert_eq!(updated.gateway_card_id.as_deref(), Some("card_test_1"));
    }

    #[tokio::test]
    async fn test_update_attach_failure_leaves_instrumentless_window() {
        let store = InMemoryCardStore::new();
        let mut existing = new_card();
        existing.id = 7;
        existing.gateway_card_id = Some("card_old".to_string());
        store.add(&existing).await.unwrap();

        let client = MockCardGatewayClient::new();
        client.fail_attach();
        let provider = CardProvider::new(store, client);

        let mut replacement = new_card();
        replacement.id = 7;
        let result = provider.update(&TestAccount, replacement).await;
        assert!(matches!(result, Err(Error::Gateway { .. })));

        // The old reference was already deleted: the documented window.
        let ops = provider.client.operations();
        assert_eq!(ops[0], "delete:cus_1:card_old");
        // Local record still points at the deleted reference.
        let local = provider.find("acct_1", 7).await.unwrap().unwrap();
        assert_eq!(local.gateway_card_id.as_deref(), Some("card_old"));
    }

    #[tokio::test]
    async fn test_delete_gateway_failure_keeps_local_record() {
        let store = InMemoryCardStore::new();
        let mut existing = new_card();
        existing.id = 3;
        existing.gateway_card_id = Some("card_live".to_string());
        store.add(&existing).await.unwrap();

        let client = MockCardGatewayClient::new();
        client.fail_delete();
        let provider = CardProvider::new(store, client);

        let result = provider.delete("acct_1", "cus_1", 3).await;
        assert!(matches!(result, Err(Error::Gateway { .. })));
        assert!(provider.find("acct_1", 3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_gateway_then_local() {
        let store = InMemoryCardStore::new();
        let mut existing = new_card();
        existing.id = 3;
        existing.gateway_card_id = Some("card_live".to_string());
        store.add(&existing).await.unwrap();

        let provider = CardProvider::new(store, MockCardGatewayClient::new());
        provider.delete("acct_1", "cus_1", 3).await.unwrap();

        assert_eq!(provider.client.operations(), vec!["delete:cus_1:card_live"]);
        assert!(provider.find("acct_1", 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_card_belongs_to_account() {
        let store = InMemoryCardStore::new();
        let mut existing = new_card();
        existing.id = 9;
        store.add(&existing).await.unwrap();

        let provider = CardProvider::new(store, MockCardGatewayClient::new());
        assert!(provider.card_belongs_to_account(9, "acct_1").await.unwrap());
        assert!(!provider.card_belongs_to_account(9, "acct_2").await.unwrap());
    }
}
