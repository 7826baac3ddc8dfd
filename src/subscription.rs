//! Subscription lifecycle management at the billing gateway.
//!
//! Subscribing, cancelling, changing plans (with proration and trial
//! preservation), and tax updates. Error policy is deliberately uneven and
//! matches the contract callers already depend on: subscribe/cancel paths
//! propagate gateway failures, while the two update operations swallow them
//! into an [`UpdateOutcome`] that carries the legacy boolean observable plus
//! the error detail.

use rust_decimal::Decimal;

use crate::customer::CustomerAccount;
use crate::error::{Error, Result};
use crate::unix_now;
use crate::validation::{validate_plan_id, validate_tax_percent};

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing deferred until the trial window ends.
    Trialing,
    /// Billing in effect.
    Active,
    /// Terminal: the subscription has ended.
    Canceled,
}

impl SubscriptionStatus {
    /// Map a gateway status string into the three-state lifecycle.
    ///
    /// `past_due` still bills, so it maps to `Active`; anything unrecognized
    /// is treated as ended.
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "trialing" => Self::Trialing,
            "active" | "past_due" => Self::Active,
            _ => Self::Canceled,
        }
    }

    /// The lifecycle state as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription in the domain model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Subscription {
    /// Gateway subscription id.
    pub id: String,
    /// Owning gateway customer id.
    pub customer_id: String,
    /// Current plan id.
    pub plan_id: String,
    /// Lifecycle state.
    pub status: SubscriptionStatus,
    /// Trial end (unix seconds), if a trial window exists.
    pub trial_end: Option<u64>,
    /// Tax percentage applied to invoices, 0-100.
    pub tax_percent: Decimal,
}

impl Subscription {
    /// Build a domain subscription from the gateway shape.
    #[must_use]
    pub fn from_gateway(data: GatewaySubscription) -> Self {
        Self {
            id: data.id,
            customer_id: data.customer_id,
            plan_id: data.plan_id.unwrap_or_default(),
            status: SubscriptionStatus::from_gateway(&data.status),
            trial_end: data.trial_end,
            tax_percent: data.tax_percent.unwrap_or_default(),
        }
    }

    /// Check if the subscription still bills (trialing counts).
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }

    /// Check if the subscription is inside a trial window.
    #[must_use]
    pub fn is_trialing(&self) -> bool {
        self.status == SubscriptionStatus::Trialing
    }
}

/// The gateway's subscription shape.
#[derive(Debug, Clone)]
pub struct GatewaySubscription {
    pub id: String,
    pub customer_id: String,
    pub plan_id: Option<String>,
    /// Gateway status string.
    pub status: String,
    /// Trial end (unix seconds).
    pub trial_end: Option<u64>,
    /// When the subscription ended (unix seconds); set after cancellation.
    pub ended_at: Option<u64>,
    pub tax_percent: Option<Decimal>,
    pub cancel_at_period_end: bool,
    pub current_period_start: Option<u64>,
    pub current_period_end: Option<u64>,
}

/// Request to update a subscription (or subscribe a customer).
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscriptionRequest {
    /// New plan id.
    pub plan_id: Option<String>,
    /// Trial end to set (unix seconds). A plan change that omits this ends
    /// any running trial, which is why plan changes re-send a live window.
    pub trial_end: Option<u64>,
    /// Tax percentage, 0-100.
    pub tax_percent: Option<Decimal>,
    /// Whether to prorate a mid-cycle plan change.
    pub prorate: Option<bool>,
}

impl UpdateSubscriptionRequest {
    /// Create an empty update request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plan id.
    #[must_use]
    pub fn plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Set the trial end.
    #[must_use]
    pub fn trial_end(mut self, trial_end: u64) -> Self {
        self.trial_end = Some(trial_end);
        self
    }

    /// Set the tax percentage.
    #[must_use]
    pub fn tax_percent(mut self, tax_percent: Decimal) -> Self {
        self.tax_percent = Some(tax_percent);
        self
    }

    /// Set the proration flag.
    #[must_use]
    pub fn prorate(mut self, prorate: bool) -> Self {
        self.prorate = Some(prorate);
        self
    }
}

/// Request to create a new subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub plan_id: String,
    /// Fixed calendar date (unix seconds) aligning invoice periods
    /// regardless of signup date.
    pub billing_cycle_anchor: Option<u64>,
    pub tax_percent: Decimal,
}

/// Request to cancel a subscription.
#[derive(Debug, Clone, Default)]
pub struct CancelSubscriptionRequest {
    /// Generate a final invoice for pending proration items immediately.
    pub invoice_now: bool,
}

/// Trait for gateway subscription operations.
pub trait SubscriptionGatewayClient: Send + Sync {
    /// Fetch a subscription.
    async fn get_subscription(&self, subscription_id: &str) -> Result<GatewaySubscription>;

    /// Update a subscription, or subscribe the customer when `target_id` is
    /// a customer reference.
    async fn update_subscription(
        &self,
        target_id: &str,
        request: UpdateSubscriptionRequest,
    ) -> Result<GatewaySubscription>;

    /// Cancel a subscription immediately.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        request: CancelSubscriptionRequest,
    ) -> Result<GatewaySubscription>;

    /// Create a new subscription.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription>;
}

/// Outcome of a swallow-on-failure update operation.
///
/// Carries the legacy boolean observable (`succeeded`) without losing the
/// error detail the legacy contract discarded.
#[derive(Debug)]
#[must_use]
pub enum UpdateOutcome {
    /// The gateway accepted the update.
    Applied,
    /// The update failed; the subscription may or may not have changed
    /// (partial proration failures are indistinguishable from success at
    /// the gateway).
    Failed(Error),
}

impl UpdateOutcome {
    /// The legacy boolean view of the outcome.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The error detail, when the update failed.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Applied => None,
            Self::Failed(err) => Some(err),
        }
    }

    /// Convert into a `Result` for callers that prefer propagation.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Applied => Ok(()),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Subscription management against the billing gateway.
pub struct SubscriptionProvider<C: SubscriptionGatewayClient> {
    client: C,
}

impl<C: SubscriptionGatewayClient> SubscriptionProvider<C> {
    /// Create a new subscription provider.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Subscribe the account's customer to a plan with a trial measured in
    /// days from now.
    ///
    /// Returns the gateway subscription id. `trial_in_days` of zero sets a
    /// trial ending now, i.e. no effective trial.
    pub async fn subscribe(
        &self,
        account: &impl CustomerAccount,
        plan_id: &str,
        trial_in_days: u32,
        tax_percent: Decimal,
    ) -> Result<String> {
        let trial_end = unix_now() + u64::from(trial_in_days) * 86_400;
        self.apply_subscription(account, plan_id, Some(trial_end), tax_percent)
            .await
    }

    /// Subscribe the account's customer to a plan with an explicit trial
    /// end, or none.
    ///
    /// Converges on the same gateway update call as
    /// [`subscribe`](Self::subscribe); the two differ only in how the trial
    /// end is computed.
    pub async fn subscribe_until(
        &self,
        account: &impl CustomerAccount,
        plan_id: &str,
        trial_end: Option<u64>,
        tax_percent: Decimal,
    ) -> Result<String> {
        self.apply_subscription(account, plan_id, trial_end, tax_percent)
            .await
    }

    async fn apply_subscription(
        &self,
        account: &impl CustomerAccount,
        plan_id: &str,
        trial_end: Option<u64>,
        tax_percent: Decimal,
    ) -> Result<String> {
        validate_plan_id(plan_id)?;
        validate_tax_percent(tax_percent)?;

        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        let mut request = UpdateSubscriptionRequest::new()
            .plan_id(plan_id)
            .tax_percent(tax_percent);
        request.trial_end = trial_end;

        let subscription = self.client.update_subscription(customer_id, request).await?;

        tracing::debug!(
            customer_id = %customer_id,
            subscription_id = %subscription.id,
            plan_id = %plan_id,
            "subscribed customer to plan"
        );

        Ok(subscription.id)
    }

    /// Cancel a subscription.
    ///
    /// The gateway request is always an immediate cancel with a final
    /// invoice. The returned timestamp branches on the **caller's intent
    /// flag**, not on the gateway's actual timing: with
    /// `cancel_at_period_end` the gateway's reported `ended_at` comes back,
    /// otherwise the current time does. Callers depend on this asymmetry;
    /// do not straighten it out.
    pub async fn end_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
        cancel_at_period_end: bool,
    ) -> Result<u64> {
        let subscription = self
            .client
            .cancel_subscription(
                subscription_id,
                CancelSubscriptionRequest { invoice_now: true },
            )
            .await?;

        tracing::debug!(
            customer_id = %customer_id,
            subscription_id = %subscription_id,
            cancel_at_period_end,
            "canceled subscription"
        );

        if cancel_at_period_end {
            subscription.ended_at.ok_or_else(|| {
                Error::Internal(format!(
                    "gateway reported no ended_at for canceled subscription {subscription_id}"
                ))
            })
        } else {
            Ok(unix_now())
        }
    }

    /// Change a subscription's plan.
    ///
    /// An in-progress trial survives the change: when the current
    /// subscription's trial end is still in the future it is re-sent with
    /// the update, so the new plan does not reset the window. A trial that
    /// already ended (or never existed) is not re-sent.
    ///
    /// Gateway failures are swallowed into the outcome; note that a
    /// proration failure after the update commits is indistinguishable from
    /// success.
    pub async fn update_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
        new_plan_id: &str,
        prorate: bool,
    ) -> UpdateOutcome {
        match self
            .change_plan(subscription_id, new_plan_id, prorate)
            .await
        {
            Ok(()) => UpdateOutcome::Applied,
            Err(err) => {
                tracing::warn!(
                    customer_id = %customer_id,
                    subscription_id = %subscription_id,
                    new_plan_id = %new_plan_id,
                    error = %err,
                    "plan change failed"
                );
                UpdateOutcome::Failed(err)
            }
        }
    }

    async fn change_plan(
        &self,
        subscription_id: &str,
        new_plan_id: &str,
        prorate: bool,
    ) -> Result<()> {
        validate_plan_id(new_plan_id)?;

        let current = self.client.get_subscription(subscription_id).await?;

        let mut request = UpdateSubscriptionRequest::new()
            .plan_id(new_plan_id)
            .prorate(prorate);

        // Keep the same trial window as initially created.
        if let Some(trial_end) = current.trial_end {
            if trial_end > unix_now() {
                request.trial_end = Some(trial_end);
            }
        }

        self.client
            .update_subscription(subscription_id, request)
            .await?;
        Ok(())
    }

    /// Update a subscription's tax percentage.
    ///
    /// Same swallow-on-failure contract as
    /// [`update_subscription`](Self::update_subscription), scoped to tax.
    pub async fn update_subscription_tax(
        &self,
        customer_id: &str,
        subscription_id: &str,
        tax_percent: Decimal,
    ) -> UpdateOutcome {
        let result = async {
            validate_tax_percent(tax_percent)?;
            self.client
                .update_subscription(
                    subscription_id,
                    UpdateSubscriptionRequest::new().tax_percent(tax_percent),
                )
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => UpdateOutcome::Applied,
            Err(err) => {
                tracing::warn!(
                    customer_id = %customer_id,
                    subscription_id = %subscription_id,
                    error = %err,
                    "tax update failed"
                );
                UpdateOutcome::Failed(err)
            }
        }
    }

    /// Create a new subscription anchored to a billing-cycle date, for
    /// customers whose invoices should align to calendar months rather than
    /// signup date.
    ///
    /// Unlike [`subscribe`](Self::subscribe) this creates a fresh
    /// subscription rather than updating the customer's existing one.
    pub async fn subscribe_natural_month(
        &self,
        account: &impl CustomerAccount,
        plan_id: &str,
        billing_cycle_anchor: Option<u64>,
        tax_percent: Decimal,
    ) -> Result<GatewaySubscription> {
        validate_plan_id(plan_id)?;
        validate_tax_percent(tax_percent)?;

        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        self.client
            .create_subscription(CreateSubscriptionRequest {
                customer_id: customer_id.to_string(),
                plan_id: plan_id.to_string(),
                billing_cycle_anchor,
                tax_percent,
            })
            .await
    }

    /// List an account's subscriptions.
    ///
    /// Not yet supported: fails unconditionally with
    /// [`Error::NotSupported`].
    pub async fn user_subscriptions(&self, _account_id: &str) -> Result<Vec<Subscription>> {
        Err(Error::NotSupported("listing subscriptions by account"))
    }
}

/// Mock subscription gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::RwLock;

    /// Mock subscription gateway client.
    ///
    /// `update_subscription` against an unknown target creates a fresh
    /// subscription owned by that target, mirroring the gateway's
    /// subscribe-by-customer-update behavior.
    #[derive(Default)]
    pub struct MockSubscriptionGatewayClient {
        counter: AtomicU64,
        subscriptions: RwLock<HashMap<String, GatewaySubscription>>,
        update_requests: RwLock<Vec<(String, UpdateSubscriptionRequest)>>,
        fail_updates: AtomicBool,
    }

    impl MockSubscriptionGatewayClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a subscription.
        pub fn seed_subscription(&self, subscription: GatewaySubscription) {
            self.subscriptions
                .write()
                .unwrap()
                .insert(subscription.id.clone(), subscription);
        }

        /// Make subsequent update calls fail.
        pub fn fail_updates(&self) {
            self.fail_updates.store(true, Ordering::SeqCst);
        }

        /// Update requests received, in order (for test assertions).
        pub fn update_requests(&self) -> Vec<(String, UpdateSubscriptionRequest)> {
            self.update_requests.read().unwrap().clone()
        }

        /// Fetch a subscription's current mock state.
        pub fn subscription(&self, subscription_id: &str) -> Option<GatewaySubscription> {
            self.subscriptions
                .read()
                .unwrap()
                .get(subscription_id)
                .cloned()
        }
    }

    impl SubscriptionGatewayClient for MockSubscriptionGatewayClient {
        async fn get_subscription(&self, subscription_id: &str) -> Result<GatewaySubscription> {
            self.subscriptions
                .read()
                .unwrap()
                .get(subscription_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("subscription {subscription_id}")))
        }

        async fn update_subscription(
            &self,
            target_id: &str,
            request: UpdateSubscriptionRequest,
        ) -> Result<GatewaySubscription> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(Error::gateway("update_subscription", "gateway unavailable"));
            }

            self.update_requests
                .write()
                .unwrap()
                .push((target_id.to_string(), request.clone()));

            let mut subscriptions = self.subscriptions.write().unwrap();
            if let Some(subscription) = subscriptions.get_mut(target_id) {
                if let Some(plan_id) = request.plan_id {
                    subscription.plan_id = Some(plan_id);
                }
                if let Some(tax) = request.tax_percent {
                    subscription.tax_percent = Some(tax);
                }
                subscription.trial_end = request.trial_end;
                return Ok(subscription.clone());
            }

            // Unknown target: treat it as a customer reference and create.
            let id = format!("sub_test_{}", self.counter.fetch_add(1, Ordering::SeqCst));
            let subscription = GatewaySubscription {
                id: id.clone(),
                customer_id: target_id.to_string(),
                plan_id: request.plan_id,
                status: if request.trial_end.is_some_and(|end| end > crate::unix_now()) {
                    "trialing".to_string()
                } else {
                    "active".to_string()
                },
                trial_end: request.trial_end,
                ended_at: None,
                tax_percent: request.tax_percent,
                cancel_at_period_end: false,
                current_period_start: None,
                current_period_end: None,
            };
            subscriptions.insert(id, subscription.clone());
            Ok(subscription)
        }

        async fn cancel_subscription(
            &self,
            subscription_id: &str,
            _request: CancelSubscriptionRequest,
        ) -> Result<GatewaySubscription> {
            let mut subscriptions = self.subscriptions.write().unwrap();
            let subscription = subscriptions
                .get_mut(subscription_id)
                .ok_or_else(|| Error::NotFound(format!("subscription {subscription_id}")))?;
            subscription.status = "canceled".to_string();
            if subscription.ended_at.is_none() {
                subscription.ended_at = subscription.current_period_end;
            }
            Ok(subscription.clone())
        }

        async fn create_subscription(
            &self,
            request: CreateSubscriptionRequest,
        ) -> Result<GatewaySubscription> {
            let id = format!("sub_test_{}", self.counter.fetch_add(1, Ordering::SeqCst));
            let subscription = GatewaySubscription {
                id: id.clone(),
                customer_id: request.customer_id,
                plan_id: Some(request.plan_id),
                status: "active".to_string(),
                trial_end: None,
                ended_at: None,
                tax_percent: Some(request.tax_percent),
                cancel_at_period_end: false,
                current_period_start: request.billing_cycle_anchor,
                current_period_end: None,
            };
            self.subscriptions
                .write()
                .unwrap()
                .insert(id, subscription.clone());
            Ok(subscription)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MockSubscriptionGatewayClient;
    use super::*;
    use crate::customer::CustomerAccount;

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

    fn active_subscription(id: &str) -> GatewaySubscription {
        GatewaySubscription {
            id: id.to_string(),
            customer_id: "cus_1".to_string(),
            plan_id: Some("p1".to_string()),
            status: "active".to_string(),
            trial_end: None,
            ended_at: None,
            tax_percent: Some(Decimal::ZERO),
            cancel_at_period_end: false,
            current_period_start: Some(1_700_000_000),
            current_period_end: Some(1_702_592_000),
        }
    }

    #[tokio::test]
    async fn test_subscribe_sets_trial_from_days() {
        let provider = SubscriptionProvider::new(MockSubscriptionGatewayClient::new());

        let id = provider
            .subscribe(&TestAccount, "p1", 14, Decimal::from(20))
            .await
            .unwrap();
        assert!(id.starts_with("sub_test_"));

        let requests = provider.client.update_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "cus_1");
        assert_eq!(requests[0].1.plan_id.as_deref(), Some("p1"));
        assert_eq!(requests[0].1.tax_percent, Some(Decimal::from(20)));

        let expected = crate::unix_now() + 14 * 86_400;
        assert!(requests[0].1.trial_end.unwrap().abs_diff(expected) <= 5);
    }

    #[tokio::test]
    async fn test_subscribe_until_passes_trial_end_through() {
        let provider = SubscriptionProvider::new(MockSubscriptionGatewayClient::new());

        let trial_end = crate::unix_now() + 30 * 86_400;
        provider
            .subscribe_until(&TestAccount, "p1", Some(trial_end), Decimal::ZERO)
            .await
            .unwrap();

        let requests = provider.client.update_requests();
        assert_eq!(requests[0].1.trial_end, Some(trial_end));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_out_of_range_tax() {
        let provider = SubscriptionProvider::new(MockSubscriptionGatewayClient::new());

        let result = provider
            .subscribe(&TestAccount, "p1", 0, Decimal::from(150))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_end_subscription_with_period_end_returns_gateway_ended_at() {
        let client = MockSubscriptionGatewayClient::new();
        client.seed_subscription(active_subscription("sub_1"));
        let provider = SubscriptionProvider::new(client);

        let ended = provider
            .end_subscription("cus_1", "sub_1", true)
            .await
            .unwrap();
        // Exactly the gateway's reported timestamp, not "now".
        assert_eq!(ended, 1_702_592_000);
    }

    #[tokio::test]
    async fn test_end_subscription_immediate_returns_now() {
        let client = MockSubscriptionGatewayClient::new();
        client.seed_subscription(active_subscription("sub_1"));
        let provider = SubscriptionProvider::new(client);

        let ended = provider
            .end_subscription("cus_1", "sub_1", false)
            .await
            .unwrap();
        assert!(ended.abs_diff(crate::unix_now()) <= 5);

        // The gateway cancel itself always happened.
        let canceled = provider.client.subscription("sub_1").unwrap();
        assert_eq!(canceled.status, "canceled");
    }

    #[tokio::test]
    async fn test_update_subscription_preserves_future_trial() {
        let client = MockSubscriptionGatewayClient::new();
        let mut subscription = active_subscription("sub_1");
        let future_trial = crate::unix_now() + 7 * 86_400;
        subscription.status = "trialing".to_string();
        subscription.trial_end = Some(future_trial);
        client.seed_subscription(subscription);

        let provider = SubscriptionProvider::new(client);
        let outcome = provider
            .update_subscription("cus_1", "sub_1", "p2", true)
            .await;
        assert!(outcome.succeeded());

        let requests = provider.client.update_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.plan_id.as_deref(), Some("p2"));
        assert_eq!(requests[0].1.prorate, Some(true));
        // The trial window travels with the plan change.
        assert_eq!(requests[0].1.trial_end, Some(future_trial));
    }

    #[tokio::test]
    async fn test_update_subscription_drops_expired_trial() {
        let client = MockSubscriptionGatewayClient::new();
        let mut subscription = active_subscription("sub_1");
        subscription.trial_end = Some(crate::unix_now() - 86_400);
        client.seed_subscription(subscription);

        let provider = SubscriptionProvider::new(client);
        let outcome = provider
            .update_subscription("cus_1", "sub_1", "p2", false)
            .await;
        assert!(outcome.succeeded());

        let requests = provider.client.update_requests();
        assert_eq!(requests[0].1.trial_end, None);
        assert_eq!(requests[0].1.prorate, Some(false));
    }

    #[tokio::test]
    async fn test_update_subscription_without_trial_sends_none() {
        let client = MockSubscriptionGatewayClient::new();
        client.seed_subscription(active_subscription("sub_1"));

        let provider = SubscriptionProvider::new(client);
        let outcome = provider
            .update_subscription("cus_1", "sub_1", "p2", true)
            .await;
        assert!(outcome.succeeded());
        assert_eq!(provider.client.update_requests()[0].1.trial_end, None);
    }

    #[tokio::test]
    async fn test_update_subscription_swallows_gateway_failure() {
        let client = MockSubscriptionGatewayClient::new();
        client.seed_subscription(active_subscription("sub_1"));
        client.fail_updates();

        let provider = SubscriptionProvider::new(client);
        let outcome = provider
            .update_subscription("cus_1", "sub_1", "p2", true)
            .await;

        assert!(!outcome.succeeded());
        assert!(matches!(outcome.error(), Some(Error::Gateway { .. })));
    }

    #[tokio::test]
    async fn test_update_subscription_tax() {
        let client = MockSubscriptionGatewayClient::new();
        client.seed_subscription(active_subscription("sub_1"));

        let provider = SubscriptionProvider::new(client);
        let outcome = provider
            .update_subscription_tax("cus_1", "sub_1", Decimal::new(215, 1))
            .await;
        assert!(outcome.succeeded());

        let requests = provider.client.update_requests();
        assert_eq!(requests[0].1.tax_percent, Some(Decimal::new(215, 1)));
        assert_eq!(requests[0].1.plan_id, None);
    }

    #[tokio::test]
    async fn test_update_subscription_tax_swallows_validation_failure() {
        let provider = SubscriptionProvider::new(MockSubscriptionGatewayClient::new());

        let outcome = provider
            .update_subscription_tax("cus_1", "sub_1", Decimal::from(-3))
            .await;
        assert!(!outcome.succeeded());
        assert!(matches!(outcome.error(), Some(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_subscribe_natural_month_creates_new_subscription() {
        let client = MockSubscriptionGatewayClient::new();
        // The customer already has a subscription; anchored signup must not
        // touch it.
        client.seed_subscription(active_subscription("sub_existing"));

        let provider = SubscriptionProvider::new(client);
        let anchor = 1_706_745_600; // first of a month
        let created = provider
            .subscribe_natural_month(&TestAccount, "p1", Some(anchor), Decimal::ZERO)
            .await
            .unwrap();

        assert_ne!(created.id, "sub_existing");
        assert_eq!(created.current_period_start, Some(anchor));
        assert_eq!(created.plan_id.as_deref(), Some("p1"));
        assert!(provider.client.subscription("sub_existing").is_some());
    }

    #[tokio::test]
    async fn test_user_subscriptions_is_not_supported() {
        let provider = SubscriptionProvider::new(MockSubscriptionGatewayClient::new());
        let result = provider.user_subscriptions("acct_1").await;
        assert!(matches!(result, Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_status_from_gateway() {
        assert_eq!(
            SubscriptionStatus::from_gateway("trialing"),
            SubscriptionStatus::Trialing
        );
        assert_eq!(
            SubscriptionStatus::from_gateway("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_gateway("past_due"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_gateway("incomplete_expired"),
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn test_subscription_from_gateway() {
        let mut data = active_subscription("sub_1");
        data.status = "trialing".to_string();
        data.trial_end = Some(1_701_000_000);

        let subscription = Subscription::from_gateway(data);
        assert_eq!(subscription.id, "sub_1");
        assert_eq!(subscription.plan_id, "p1");
        assert!(subscription.is_trialing());
        assert!(subscription.is_active());
        assert_eq!(subscription.trial_end, Some(1_701_000_000));
    }

    #[test]
    fn test_update_outcome_into_result() {
        assert!(UpdateOutcome::Applied.into_result().is_ok());
        let failed = UpdateOutcome::Failed(Error::gateway("update_subscription", "boom"));
        assert!(failed.into_result().is_err());
    }
}
