//! Live gateway client.
//!
//! Production implementation of the per-resource gateway client traits,
//! speaking the gateway's form-encoded HTTP protocol directly. Carries
//! retry logic with exponential backoff and jitter, per-request timeouts,
//! idempotency keys on mutating calls, and secure API key handling.

use std::time::Duration;

use reqwest::Method;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::card::{CardGatewayClient, GatewayCard, GatewayToken, TokenizeCardRequest};
use crate::customer::{
    CreateCustomerRequest, CustomerGatewayClient, GatewayCustomer, UpdateCustomerRequest,
};
use crate::error::{Error, Result};
use crate::invoice::{GatewayInvoice, GatewayInvoiceLine, InvoiceGatewayClient};
use crate::plans::{
    CreatePlanRequest, GatewayPlan, PlanGatewayClient, PlanListOptions, UpdatePlanRequest,
};
use crate::subscription::{
    CancelSubscriptionRequest, CreateSubscriptionRequest, GatewaySubscription,
    SubscriptionGatewayClient, UpdateSubscriptionRequest,
};

/// Default gateway API base URL.
const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the live gateway client.
#[derive(Debug, Clone)]
pub struct LiveGatewayClientConfig {
    /// Maximum number of retry attempts for transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Gateway API base URL; override for test servers.
    pub api_base: String,
}

impl Default for LiveGatewayClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            timeout_seconds: 30,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl LiveGatewayClientConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set base delay for exponential backoff.
    #[must_use]
    pub fn base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Set maximum delay between retries.
    #[must_use]
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set request timeout.
    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the gateway API base URL.
    #[must_use]
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

// ============================================================================
// API Key Validation
// ============================================================================

/// Error returned when API key validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidApiKeyError {
    /// Description of why the key is invalid.
    pub reason: String,
}

impl std::fmt::Display for InvalidApiKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid gateway API key: {}", self.reason)
    }
}

impl std::error::Error for InvalidApiKeyError {}

/// Validate a gateway API key format.
///
/// Valid formats:
/// - `sk_test_*` / `sk_live_*` - secret keys
/// - `rk_test_*` / `rk_live_*` - restricted keys
fn validate_api_key(key: &str) -> std::result::Result<(), InvalidApiKeyError> {
    const MIN_KEY_LENGTH: usize = 20;

    if key.is_empty() {
        return Err(InvalidApiKeyError {
            reason: "API key cannot be empty".to_string(),
        });
    }

    if key.len() < MIN_KEY_LENGTH {
        return Err(InvalidApiKeyError {
            reason: format!("API key too short (minimum {} characters)", MIN_KEY_LENGTH),
        });
    }

    let valid_prefixes = ["sk_test_", "sk_live_", "rk_test_", "rk_live_"];
    if !valid_prefixes.iter().any(|prefix| key.starts_with(prefix)) {
        return Err(InvalidApiKeyError {
            reason: "API key must start with sk_test_, sk_live_, rk_test_, or rk_live_"
                .to_string(),
        });
    }

    Ok(())
}

// ============================================================================
// Live Gateway Client
// ============================================================================

/// Live gateway client for production use.
///
/// Implements all gateway client traits with:
/// - Secure API key handling using `SecretString`
/// - Retry logic with exponential backoff for transient failures
/// - Idempotency keys on mutating operations
/// - Per-request timeouts
///
/// The client holds no per-call state; construct one per API key and share
/// it across providers and tasks.
///
/// # Example
///
/// ```rust,ignore
/// use tollway::{LiveGatewayClient, LiveGatewayClientConfig, PlanProvider};
///
/// let client = LiveGatewayClient::with_default_config("sk_live_xxx".to_string())?;
/// let plans = PlanProvider::new(client);
/// ```
#[derive(Clone)]
pub struct LiveGatewayClient {
    http: reqwest::Client,
    config: LiveGatewayClientConfig,
    api_key: SecretString,
}

impl LiveGatewayClient {
    /// Create a new live gateway client.
    ///
    /// The API key is validated and stored securely; it never appears in
    /// debug output.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key format is invalid.
    pub fn new(
        api_key: impl Into<SecretString>,
        config: LiveGatewayClientConfig,
    ) -> std::result::Result<Self, InvalidApiKeyError> {
        let api_key: SecretString = api_key.into();
        validate_api_key(api_key.expose_secret())?;

        Ok(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        })
    }

    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key format is invalid.
    pub fn with_default_config(
        api_key: impl Into<SecretString>,
    ) -> std::result::Result<Self, InvalidApiKeyError> {
        Self::new(api_key, LiveGatewayClientConfig::default())
    }

    /// Check if the client is using a test mode API key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        let key = self.api_key.expose_secret();
        key.starts_with("sk_test_") || key.starts_with("rk_test_")
    }

    /// Check if the client is using a live mode API key.
    #[must_use]
    pub fn is_live_mode(&self) -> bool {
        let key = self.api_key.expose_secret();
        key.starts_with("sk_live_") || key.starts_with("rk_live_")
    }

    /// Generate an idempotency key for a mutating operation.
    #[inline]
    fn generate_idempotency_key(operation: &str) -> String {
        format!("{}_{}", operation, uuid::Uuid::new_v4())
    }

    /// Issue a request with retries, decoding a JSON response.
    async fn request_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<Vec<(String, String)>>,
    ) -> Result<T> {
        let url = format!("{}{}", self.config.api_base, path);
        // One key across all attempts, so a retried mutation cannot apply
        // twice.
        let idempotency_key = (method == Method::POST)
            .then(|| Self::generate_idempotency_key(operation));

        let mut attempts = 0u32;
        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(self.api_key.expose_secret())
                .timeout(Duration::from_secs(self.config.timeout_seconds));

            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(ref form) = form {
                request = request.form(form);
            }
            if let Some(ref key) = idempotency_key {
                request = request.header("Idempotency-Key", key);
            }

            let err = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(|err| {
                            Error::Internal(format!(
                                "failed to decode gateway response for '{operation}': {err}"
                            ))
                        });
                    }
                    let body = response.text().await.unwrap_or_default();
                    parse_gateway_error(operation, status.as_u16(), &body)
                }
                Err(transport) => transport_error(operation, &transport),
            };

            if err.is_retryable() && attempts < self.config.max_retries {
                let delay = calculate_backoff_delay(
                    attempts,
                    self.config.base_delay_ms,
                    self.config.max_delay_ms,
                );
                tracing::warn!(
                    target: "tollway::gateway",
                    operation,
                    attempt = attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying gateway call after transient error"
                );
                tokio::time::sleep(delay).await;
                attempts += 1;
                continue;
            }

            return Err(err);
        }
    }
}

// Debug implementation that doesn't expose the API key.
impl std::fmt::Debug for LiveGatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveGatewayClient")
            .field("config", &self.config)
            .field("is_test_mode", &self.is_test_mode())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Backoff & Error Mapping
// ============================================================================

/// Calculate backoff delay with exponential backoff and jitter.
#[inline]
fn calculate_backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    // Exponential backoff: base_ms * 2^attempt, capped at max_ms.
    let delay_ms = base_ms.saturating_mul(2_u64.saturating_pow(attempt));
    let delay_ms = delay_ms.min(max_ms);

    // Jitter: 0-25% of the delay.
    let jitter = if delay_ms > 0 {
        fastrand::u64(0..=delay_ms / 4)
    } else {
        0
    };
    Duration::from_millis(delay_ms.saturating_add(jitter))
}

/// The gateway's error envelope.
#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    error: GatewayErrorBody,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Map a non-success gateway response into an [`Error::Gateway`].
fn parse_gateway_error(operation: &str, http_status: u16, body: &str) -> Error {
    let parsed: Option<GatewayErrorEnvelope> = serde_json::from_str(body).ok();
    let (message, code) = match parsed {
        Some(envelope) => (
            envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {http_status}")),
            envelope.error.code,
        ),
        None => (format!("HTTP {http_status}"), None),
    };

    Error::Gateway {
        operation: operation.to_string(),
        message,
        code,
        http_status: Some(http_status),
    }
}

/// Map a transport failure into an [`Error::Gateway`] with no HTTP status,
/// which classifies as retryable.
fn transport_error(operation: &str, err: &reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    Error::gateway(operation, message)
}

// ============================================================================
// Form Encoding
// ============================================================================

fn push_opt(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        params.push((key.to_string(), value.to_string()));
    }
}

fn plan_create_params(request: &CreatePlanRequest) -> Vec<(String, String)> {
    vec![
        ("id".to_string(), request.id.clone()),
        ("nickname".to_string(), request.nickname.clone()),
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        ("interval".to_string(), request.interval.clone()),
        (
            "interval_count".to_string(),
            request.interval_count.to_string(),
        ),
        (
            "trial_period_days".to_string(),
            request.trial_period_days.to_string(),
        ),
    ]
}

fn customer_create_params(request: &CreateCustomerRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("email".to_string(), request.email.clone()),
        ("balance".to_string(), request.balance.to_string()),
    ];
    push_opt(&mut params, "plan", request.plan_id.as_deref());
    if let Some(trial_end) = request.trial_end {
        params.push(("trial_end".to_string(), trial_end.to_string()));
    }
    push_opt(&mut params, "source", request.card_token.as_deref());
    params
}

fn customer_update_params(request: &UpdateCustomerRequest) -> Vec<(String, String)> {
    let mut params = Vec::new();
    push_opt(&mut params, "email", request.email.as_deref());
    push_opt(
        &mut params,
        "default_source",
        request.default_source.as_deref(),
    );
    params
}

fn token_params(request: &TokenizeCardRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("card[number]".to_string(), request.number.clone()),
        ("card[exp_month]".to_string(), request.exp_month.to_string()),
        ("card[exp_year]".to_string(), request.exp_year.to_string()),
        ("card[cvc]".to_string(), request.cvc.clone()),
    ];
    push_opt(&mut params, "card[name]", request.name.as_deref());
    push_opt(
        &mut params,
        "card[address_line1]",
        request.address_line1.as_deref(),
    );
    push_opt(
        &mut params,
        "card[address_line2]",
        request.address_line2.as_deref(),
    );
    push_opt(
        &mut params,
        "card[address_city]",
        request.address_city.as_deref(),
    );
    push_opt(
        &mut params,
        "card[address_state]",
        request.address_state.as_deref(),
    );
    push_opt(
        &mut params,
        "card[address_zip]",
        request.address_zip.as_deref(),
    );
    params
}

fn subscription_update_params(request: &UpdateSubscriptionRequest) -> Vec<(String, String)> {
    let mut params = Vec::new();
    push_opt(&mut params, "plan", request.plan_id.as_deref());
    if let Some(trial_end) = request.trial_end {
        params.push(("trial_end".to_string(), trial_end.to_string()));
    }
    if let Some(tax_percent) = request.tax_percent {
        params.push(("tax_percent".to_string(), tax_percent.to_string()));
    }
    if let Some(prorate) = request.prorate {
        params.push(("prorate".to_string(), prorate.to_string()));
    }
    params
}

fn subscription_create_params(request: &CreateSubscriptionRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("customer".to_string(), request.customer_id.clone()),
        ("plan".to_string(), request.plan_id.clone()),
        (
            "tax_percent".to_string(),
            request.tax_percent.to_string(),
        ),
    ];
    if let Some(anchor) = request.billing_cycle_anchor {
        params.push(("billing_cycle_anchor".to_string(), anchor.to_string()));
    }
    params
}

// ============================================================================
// Wire Shapes
// ============================================================================

/// Generic list envelope.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
}

/// Deletion confirmation; consumed and discarded.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DeletedResource {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct PlanRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResource {
    id: String,
    customer: String,
    status: String,
    #[serde(default)]
    trial_end: Option<u64>,
    #[serde(default)]
    ended_at: Option<u64>,
    #[serde(default)]
    tax_percent: Option<Decimal>,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    current_period_start: Option<u64>,
    #[serde(default)]
    current_period_end: Option<u64>,
    #[serde(default)]
    plan: Option<PlanRef>,
}

impl SubscriptionResource {
    fn into_gateway(self) -> GatewaySubscription {
        GatewaySubscription {
            id: self.id,
            customer_id: self.customer,
            plan_id: self.plan.map(|plan| plan.id),
            status: self.status,
            trial_end: self.trial_end,
            ended_at: self.ended_at,
            tax_percent: self.tax_percent,
            cancel_at_period_end: self.cancel_at_period_end,
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinesEnvelope {
    data: Vec<GatewayInvoiceLine>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResource {
    id: String,
    customer: String,
    amount_due: Decimal,
    #[serde(default)]
    application_fee_amount: Option<Decimal>,
    #[serde(default)]
    attempt_count: u32,
    #[serde(default)]
    attempted: bool,
    currency: String,
    #[serde(default)]
    due_date: Option<u64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    ending_balance: Option<Decimal>,
    #[serde(default)]
    next_payment_attempt: Option<u64>,
    #[serde(default)]
    paid: bool,
    period_start: u64,
    period_end: u64,
    #[serde(default)]
    receipt_number: Option<String>,
    #[serde(default)]
    starting_balance: Option<Decimal>,
    #[serde(default)]
    statement_descriptor: Option<String>,
    #[serde(default)]
    tax: Option<Decimal>,
    #[serde(default)]
    tax_percent: Option<Decimal>,
    subtotal: Decimal,
    total: Decimal,
    #[serde(default)]
    lines: Option<LinesEnvelope>,
}

impl InvoiceResource {
    fn into_gateway(self) -> GatewayInvoice {
        GatewayInvoice {
            id: self.id,
            customer_id: self.customer,
            amount_due: self.amount_due,
            application_fee: self.application_fee_amount.unwrap_or_default(),
            attempt_count: self.attempt_count,
            attempted: self.attempted,
            currency: self.currency,
            due_date: self.due_date,
            description: self.description,
            ending_balance: self.ending_balance.unwrap_or_default(),
            next_payment_attempt: self.next_payment_attempt,
            paid: self.paid,
            period_start: self.period_start,
            period_end: self.period_end,
            receipt_number: self.receipt_number,
            starting_balance: self.starting_balance.unwrap_or_default(),
            statement_descriptor: self.statement_descriptor,
            tax: self.tax.unwrap_or_default(),
            tax_percent: self.tax_percent,
            subtotal: self.subtotal,
            total: self.total,
            lines: self.lines.map(|lines| lines.data),
        }
    }
}

// ============================================================================
// PlanGatewayClient Implementation
// ============================================================================

impl PlanGatewayClient for LiveGatewayClient {
    async fn create_plan(&self, request: CreatePlanRequest) -> Result<GatewayPlan> {
        self.request_json(
            "create_plan",
            Method::POST,
            "/plans",
            &[],
            Some(plan_create_params(&request)),
        )
        .await
    }

    async fn update_plan(&self, plan_id: &str, request: UpdatePlanRequest) -> Result<GatewayPlan> {
        let params = vec![("nickname".to_string(), request.nickname)];
        self.request_json(
            "update_plan",
            Method::POST,
            &format!("/plans/{plan_id}"),
            &[],
            Some(params),
        )
        .await
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        let _: DeletedResource = self
            .request_json(
                "delete_plan",
                Method::DELETE,
                &format!("/plans/{plan_id}"),
                &[],
                None,
            )
            .await?;
        Ok(())
    }

    async fn get_plan(&self, plan_id: &str) -> Result<GatewayPlan> {
        self.request_json(
            "get_plan",
            Method::GET,
            &format!("/plans/{plan_id}"),
            &[],
            None,
        )
        .await
    }

    async fn list_plans(&self, options: PlanListOptions) -> Result<Vec<GatewayPlan>> {
        let mut query = Vec::new();
        if let Some(limit) = options.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        push_opt(&mut query, "starting_after", options.starting_after.as_deref());

        let envelope: ListEnvelope<GatewayPlan> = self
            .request_json("list_plans", Method::GET, "/plans", &query, None)
            .await?;
        Ok(envelope.data)
    }
}

// ============================================================================
// CustomerGatewayClient Implementation
// ============================================================================

impl CustomerGatewayClient for LiveGatewayClient {
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<GatewayCustomer> {
        self.request_json(
            "create_customer",
            Method::POST,
            "/customers",
            &[],
            Some(customer_create_params(&request)),
        )
        .await
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        request: UpdateCustomerRequest,
    ) -> Result<GatewayCustomer> {
        self.request_json(
            "update_customer",
            Method::POST,
            &format!("/customers/{customer_id}"),
            &[],
            Some(customer_update_params(&request)),
        )
        .await
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<()> {
        let _: DeletedResource = self
            .request_json(
                "delete_customer",
                Method::DELETE,
                &format!("/customers/{customer_id}"),
                &[],
                None,
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// CardGatewayClient Implementation
// ============================================================================

impl CardGatewayClient for LiveGatewayClient {
    async fn create_token(&self, request: TokenizeCardRequest) -> Result<GatewayToken> {
        self.request_json(
            "create_token",
            Method::POST,
            "/tokens",
            &[],
            Some(token_params(&request)),
        )
        .await
    }

    async fn attach_card(&self, customer_id: &str, token_id: &str) -> Result<GatewayCard> {
        let params = vec![("source".to_string(), token_id.to_string())];
        self.request_json(
            "attach_card",
            Method::POST,
            &format!("/customers/{customer_id}/sources"),
            &[],
            Some(params),
        )
        .await
    }

    async fn delete_card(&self, customer_id: &str, card_id: &str) -> Result<()> {
        let _: DeletedResource = self
            .request_json(
                "delete_card",
                Method::DELETE,
                &format!("/customers/{customer_id}/sources/{card_id}"),
                &[],
                None,
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// SubscriptionGatewayClient Implementation
// ============================================================================

impl SubscriptionGatewayClient for LiveGatewayClient {
    async fn get_subscription(&self, subscription_id: &str) -> Result<GatewaySubscription> {
        let resource: SubscriptionResource = self
            .request_json(
                "get_subscription",
                Method::GET,
                &format!("/subscriptions/{subscription_id}"),
                &[],
                None,
            )
            .await?;
        Ok(resource.into_gateway())
    }

    async fn update_subscription(
        &self,
        target_id: &str,
        request: UpdateSubscriptionRequest,
    ) -> Result<GatewaySubscription> {
        let resource: SubscriptionResource = self
            .request_json(
                "update_subscription",
                Method::POST,
                &format!("/subscriptions/{target_id}"),
                &[],
                Some(subscription_update_params(&request)),
            )
            .await?;
        Ok(resource.into_gateway())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        request: CancelSubscriptionRequest,
    ) -> Result<GatewaySubscription> {
        let query = vec![(
            "invoice_now".to_string(),
            request.invoice_now.to_string(),
        )];
        let resource: SubscriptionResource = self
            .request_json(
                "cancel_subscription",
                Method::DELETE,
                &format!("/subscriptions/{subscription_id}"),
                &query,
                None,
            )
            .await?;
        Ok(resource.into_gateway())
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription> {
        let resource: SubscriptionResource = self
            .request_json(
                "create_subscription",
                Method::POST,
                "/subscriptions",
                &[],
                Some(subscription_create_params(&request)),
            )
            .await?;
        Ok(resource.into_gateway())
    }
}

// ============================================================================
// InvoiceGatewayClient Implementation
// ============================================================================

impl InvoiceGatewayClient for LiveGatewayClient {
    async fn list_invoices(&self, customer_id: &str, limit: u8) -> Result<Vec<GatewayInvoice>> {
        let query = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        let envelope: ListEnvelope<InvoiceResource> = self
            .request_json("list_invoices", Method::GET, "/invoices", &query, None)
            .await?;
        Ok(envelope
            .data
            .into_iter()
            .map(InvoiceResource::into_gateway)
            .collect())
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice> {
        let resource: InvoiceResource = self
            .request_json(
                "get_invoice",
                Method::GET,
                &format!("/invoices/{invoice_id}"),
                &[],
                None,
            )
            .await?;
        Ok(resource.into_gateway())
    }
}
