//! Customer management at the billing gateway.
//!
//! Creates, updates, and deletes gateway customers for billable accounts,
//! encoding the default-trial business rule: a customer created onto a plan
//! without an explicit trial end gets the standard trial starting now.

use crate::card::CreditCard;
use crate::error::{Error, Result};
use crate::unix_now;
use crate::validation::validate_plan_id;

/// Default trial length granted when a customer is created onto a plan
/// without an explicit trial end.
pub const DEFAULT_TRIAL_DAYS: u64 = 15;

/// A billable account in the host application.
///
/// Implement this for your user or organization type. The gateway customer
/// reference is the link between local identity and gateway state; accounts
/// without one cannot be updated or deleted at the gateway.
pub trait CustomerAccount {
    /// Local account identifier.
    fn account_id(&self) -> &str;

    /// Billing email address.
    fn email(&self) -> &str;

    /// The gateway customer reference, if the account has one.
    fn gateway_customer_id(&self) -> Option<&str>;
}

/// The gateway's customer shape.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// The customer's default payment source reference.
    #[serde(default)]
    pub default_source: Option<String>,
}

/// Request to create a customer at the gateway.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    pub email: String,
    /// Starting account balance in minor units; always zero here.
    pub balance: i64,
    /// Plan to subscribe the customer to at creation.
    pub plan_id: Option<String>,
    /// Trial end as a unix timestamp; only meaningful with a plan.
    pub trial_end: Option<u64>,
    /// Tokenized payment source to attach at creation.
    pub card_token: Option<String>,
}

/// Request to update a customer at the gateway.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerRequest {
    pub email: Option<String>,
    /// Gateway card reference to set as the default payment source.
    pub default_source: Option<String>,
}

/// Trait for gateway customer operations.
pub trait CustomerGatewayClient: Send + Sync {
    /// Create a new customer at the gateway.
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<GatewayCustomer>;

    /// Update an existing customer.
    async fn update_customer(
        &self,
        customer_id: &str,
        request: UpdateCustomerRequest,
    ) -> Result<GatewayCustomer>;

    /// Delete a customer.
    async fn delete_customer(&self, customer_id: &str) -> Result<()>;
}

/// Options for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct CreateCustomerOptions {
    /// Plan to subscribe the customer to at creation.
    pub plan_id: Option<String>,
    /// Explicit trial end (unix seconds). When unset and a plan is given,
    /// defaults to now + [`DEFAULT_TRIAL_DAYS`].
    pub trial_end: Option<u64>,
    /// Tokenized payment source to attach at creation.
    pub card_token: Option<String>,
}

/// Customer management against the billing gateway.
pub struct CustomerProvider<C: CustomerGatewayClient> {
    client: C,
}

impl<C: CustomerGatewayClient> CustomerProvider<C> {
    /// Create a new customer provider.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Create a gateway customer for the account.
    ///
    /// When `options.plan_id` is set and `options.trial_end` is not, the
    /// trial end defaults to now + [`DEFAULT_TRIAL_DAYS`]. A plan-less
    /// customer never gets a trial field, explicit or defaulted.
    pub async fn create_customer(
        &self,
        account: &impl CustomerAccount,
        options: CreateCustomerOptions,
    ) -> Result<GatewayCustomer> {
        if let Some(ref plan_id) = options.plan_id {
            validate_plan_id(plan_id)?;
        }

        // Trial only travels with a plan.
        let trial_end = match options.plan_id {
            Some(_) => Some(
                options
                    .trial_end
                    .unwrap_or_else(|| unix_now() + DEFAULT_TRIAL_DAYS * 86_400),
            ),
            None => None,
        };

        let customer = self
            .client
            .create_customer(CreateCustomerRequest {
                email: account.email().to_string(),
                balance: 0,
                plan_id: options.plan_id,
                trial_end,
                card_token: options.card_token,
            })
            .await?;

        tracing::debug!(
            account_id = %account.account_id(),
            customer_id = %customer.id,
            "created gateway customer"
        );

        Ok(customer)
    }

    /// Update the customer's email and, when a card with a gateway reference
    /// is supplied, its default payment source.
    pub async fn update_customer(
        &self,
        account: &impl CustomerAccount,
        card: Option<&CreditCard>,
    ) -> Result<GatewayCustomer> {
        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        self.client
            .update_customer(
                customer_id,
                UpdateCustomerRequest {
                    email: Some(account.email().to_string()),
                    default_source: card.and_then(|c| c.gateway_card_id.clone()),
                },
            )
            .await
    }

    /// Delete the customer at the gateway.
    ///
    /// Fire-and-forget: the gateway's deletion confirmation is discarded and
    /// nothing about gateway-side success is surfaced beyond transport
    /// errors.
    pub async fn delete_customer(&self, account: &impl CustomerAccount) -> Result<()> {
        let customer_id = account
            .gateway_customer_id()
            .ok_or_else(|| Error::NotFound("no gateway customer linked".to_string()))?;

        self.client.delete_customer(customer_id).await?;

        tracing::debug!(
            account_id = %account.account_id(),
            customer_id = %customer_id,
            "deleted gateway customer"
        );

        Ok(())
    }
}

/// Mock customer gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    /// Mock customer gateway client.
    #[derive(Default)]
    pub struct MockCustomerGatewayClient {
        counter: AtomicU64,
        customers: RwLock<HashMap<String, GatewayCustomer>>,
        create_requests: RwLock<Vec<CreateCustomerRequest>>,
        update_requests: RwLock<Vec<(String, UpdateCustomerRequest)>>,
    }

    impl MockCustomerGatewayClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create requests received, in order (for test assertions).
        pub fn create_requests(&self) -> Vec<CreateCustomerRequest> {
            self.create_requests.read().unwrap().clone()
        }

        /// Update requests received, in order (for test assertions).
        pub fn update_requests(&self) -> Vec<(String, UpdateCustomerRequest)> {
            self.update_requests.read().unwrap().clone()
        }

        /// Whether a customer currently exists at the mock gateway.
        pub fn has_customer(&self, customer_id: &str) -> bool {
            self.customers.read().unwrap().contains_key(customer_id)
        }
    }

    impl CustomerGatewayClient for MockCustomerGatewayClient {
        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> Result<GatewayCustomer> {
            let id = format!("cus_test_{}", self.counter.fetch_add(1, Ordering::SeqCst));
            let customer = GatewayCustomer {
                id: id.clone(),
                email: Some(request.email.clone()),
                default_source: request.card_token.clone(),
            };
            self.create_requests.write().unwrap().push(request);
            self.customers
                .write()
                .unwrap()
                .insert(id, customer.clone());
            Ok(customer)
        }

        async fn update_customer(
            &self,
            customer_id: &str,
            request: UpdateCustomerRequest,
        ) -> Result<GatewayCustomer> {
            self.update_requests
                .write()
                .unwrap()
                .push((customer_id.to_string(), request.clone()));
            let mut customers = self.customers.write().unwrap();
            let customer = customers
                .get_mut(customer_id)
                .ok_or_else(|| Error::NotFound(format!("customer {customer_id}")))?;
            if let Some(email) = request.email {
                customer.email = Some(email);
            }
            if let Some(source) = request.default_source {
                customer.default_source = Some(source);
            }
            Ok(customer.clone())
        }

        async fn delete_customer(&self, customer_id: &str) -> Result<()> {
            self.customers
                .write()
                .unwrap()
                .remove(customer_id)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound(format!("customer {customer_id}")))
        }
    }
}
