//! Subscription plan management at the billing gateway.
//!
//! Plans are owned by the gateway: creating, updating, and deleting them are
//! gateway calls, and reads map the gateway's plan shape back into
//! [`SubscriptionPlan`]. The gateway assigns the plan id at creation and the
//! id is immutable afterwards.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{validate_currency, validate_plan_id};

/// Billing interval for a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    /// Billed weekly.
    Weekly,
    /// Billed monthly.
    Monthly,
    /// Billed every three months.
    EveryThreeMonths,
    /// Billed every six months.
    EverySixMonths,
    /// Billed yearly.
    Yearly,
}

/// The bidirectional interval/code table.
///
/// These five codes are the gateway's full recognized set; translation in
/// either direction outside the table is an error, never a silent fallback.
const INTERVAL_CODES: [(PlanInterval, &str); 5] = [
    (PlanInterval::Weekly, "week"),
    (PlanInterval::Monthly, "month"),
    (PlanInterval::EveryThreeMonths, "3-month"),
    (PlanInterval::EverySixMonths, "6-month"),
    (PlanInterval::Yearly, "year"),
];

impl PlanInterval {
    /// The gateway wire code for this interval.
    #[must_use]
    pub fn as_code(&self) -> &'static str {
        INTERVAL_CODES
            .iter()
            .find(|(interval, _)| interval == self)
            .map(|(_, code)| *code)
            .unwrap_or("month")
    }

    /// Parse a gateway wire code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIntervalCode`] for codes outside the
    /// recognized set.
    pub fn from_code(code: &str) -> Result<Self> {
        INTERVAL_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(interval, _)| *interval)
            .ok_or_else(|| Error::UnknownIntervalCode(code.to_string()))
    }
}

impl std::fmt::Display for PlanInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// A key/value extension pair attached to a plan.
///
/// Order of insertion carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProperty {
    pub key: String,
    pub value: String,
}

/// A subscription plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Gateway-assigned identifier, globally unique and immutable.
    pub id: String,
    /// Display name (the gateway's nickname).
    pub name: String,
    /// Billing interval.
    pub interval: PlanInterval,
    /// Trial period granted to new subscribers, in days.
    pub trial_period_days: u32,
    /// Price in major currency units (e.g. 199.00).
    pub price: Decimal,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Extension properties.
    #[serde(default)]
    pub properties: Vec<PlanProperty>,
}

impl SubscriptionPlan {
    /// Create a plan with no trial and no extension properties.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        interval: PlanInterval,
        price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            interval,
            trial_period_days: 0,
            price,
            currency: currency.into(),
            properties: Vec::new(),
        }
    }
}

/// The gateway's plan shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPlan {
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Amount in minor currency units.
    pub amount: Decimal,
    pub currency: String,
    /// Interval wire code.
    pub interval: String,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
}

/// Request to create a plan at the gateway.
#[derive(Debug, Clone)]
pub struct CreatePlanRequest {
    pub id: String,
    pub nickname: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    /// Interval wire code.
    pub interval: String,
    /// Billing cycles per interval; always 1 here, the multi-cycle intervals
    /// are expressed through the interval code itself.
    pub interval_count: u32,
    pub trial_period_days: u32,
}

/// Request to update a plan at the gateway.
///
/// Only the nickname is updatable: the gateway rejects amount or interval
/// changes on an existing plan.
#[derive(Debug, Clone)]
pub struct UpdatePlanRequest {
    pub nickname: String,
}

/// Options for listing plans.
#[derive(Debug, Clone, Default)]
pub struct PlanListOptions {
    /// Page size (gateway default applies when unset).
    pub limit: Option<u8>,
    /// Cursor: id of the last plan from the previous page.
    pub starting_after: Option<String>,
}

/// Trait for gateway plan operations.
pub trait PlanGatewayClient: Send + Sync {
    /// Create a new plan at the gateway.
    async fn create_plan(&self, request: CreatePlanRequest) -> Result<GatewayPlan>;

    /// Update an existing plan's nickname.
    async fn update_plan(&self, plan_id: &str, request: UpdatePlanRequest) -> Result<GatewayPlan>;

    /// Delete a plan.
    async fn delete_plan(&self, plan_id: &str) -> Result<()>;

    /// Fetch a plan by id.
    async fn get_plan(&self, plan_id: &str) -> Result<GatewayPlan>;

    /// List plans.
    async fn list_plans(&self, options: PlanListOptions) -> Result<Vec<GatewayPlan>>;
}

/// Plan CRUD against the billing gateway.
pub struct PlanProvider<C: PlanGatewayClient> {
    client: C,
}

impl<C: PlanGatewayClient> PlanProvider<C> {
    /// Create a new plan provider.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Create the plan at the gateway.
    ///
    /// The price is converted to minor units with round-to-nearest; note the
    /// asymmetry with [`find`](Self::find), which does not scale the amount
    /// back down.
    pub async fn add(&self, plan: &SubscriptionPlan) -> Result<GatewayPlan> {
        validate_plan_id(&plan.id)?;
        validate_currency(&plan.currency)?;

        let request = CreatePlanRequest {
            id: plan.id.clone(),
            nickname: plan.name.clone(),
            amount: round_to_minor_units(plan.price)?,
            currency: plan.currency.clone(),
            interval: plan.interval.as_code().to_string(),
            interval_count: 1,
            trial_period_days: plan.trial_period_days,
        };

        let created = self.client.create_plan(request).await?;
        tracing::debug!(plan_id = %created.id, "created plan at gateway");
        Ok(created)
    }

    /// Update the plan's display name at the gateway.
    ///
    /// Amount and interval are immutable gateway-side and are never sent.
    pub async fn update(&self, plan: &SubscriptionPlan) -> Result<GatewayPlan> {
        validate_plan_id(&plan.id)?;

        self.client
            .update_plan(
                &plan.id,
                UpdatePlanRequest {
                    nickname: plan.name.clone(),
                },
            )
            .await
    }

    /// Delete the plan at the gateway.
    pub async fn delete(&self, plan_id: &str) -> Result<()> {
        validate_plan_id(plan_id)?;
        self.client.delete_plan(plan_id).await
    }

    /// Fetch a plan by id.
    ///
    /// Returns `Ok(None)` both when the plan does not exist and when the
    /// gateway call fails for any other reason; the two cases are
    /// indistinguishable to the caller. The underlying error is logged at
    /// WARN before being swallowed.
    pub async fn find(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>> {
        validate_plan_id(plan_id)?;

        match self.client.get_plan(plan_id).await {
            Ok(gateway_plan) => Ok(Some(map_plan(gateway_plan)?)),
            Err(err) => {
                tracing::warn!(
                    plan_id = %plan_id,
                    error = %err,
                    "gateway plan lookup failed, reporting plan as absent"
                );
                Ok(None)
            }
        }
    }

    /// List plans at the gateway.
    pub async fn list(&self, options: PlanListOptions) -> Result<Vec<SubscriptionPlan>> {
        self.client
            .list_plans(options)
            .await?
            .into_iter()
            .map(map_plan)
            .collect()
    }
}

/// Convert a major-unit price to minor units, rounding to nearest.
///
/// Rounding here is bankers' (half-to-even); contrast with the truncation
/// used for invoice amounts in [`crate::invoice`].
fn round_to_minor_units(price: Decimal) -> Result<i64> {
    (price * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| Error::InvalidInput(format!("price out of range: {price}")))
}

/// Map a gateway plan into the domain model.
///
/// The gateway amount is in minor units but is assigned to `price` without
/// re-scaling, so a plan read back after [`PlanProvider::add`] reports a
/// price 100× the one written. Preserved deliberately; see DESIGN.md.
fn map_plan(gateway_plan: GatewayPlan) -> Result<SubscriptionPlan> {
    Ok(SubscriptionPlan {
        id: gateway_plan.id,
        name: gateway_plan.nickname.unwrap_or_default(),
        interval: PlanInterval::from_code(&gateway_plan.interval)?,
        trial_period_days: gateway_plan.trial_period_days.unwrap_or(0),
        price: gateway_plan.amount,
        currency: gateway_plan.currency,
        properties: Vec::new(),
    })
}

/// Mock plan gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Mock plan gateway client backed by an in-memory map.
    #[derive(Default)]
    pub struct MockPlanGatewayClient {
        plans: RwLock<HashMap<String, GatewayPlan>>,
        updates: RwLock<Vec<(String, UpdatePlanRequest)>>,
    }

    impl MockPlanGatewayClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a gateway plan directly (e.g. with an unrecognized interval).
        pub fn seed_plan(&self, plan: GatewayPlan) {
            self.plans.write().unwrap().insert(plan.id.clone(), plan);
        }

        /// Update requests received, in order (for test assertions).
        pub fn update_requests(&self) -> Vec<(String, UpdatePlanRequest)> {
            self.updates.read().unwrap().clone()
        }
    }

    impl PlanGatewayClient for MockPlanGatewayClient {
        async fn create_plan(&self, request: CreatePlanRequest) -> Result<GatewayPlan> {
            let plan = GatewayPlan {
                id: request.id.clone(),
                nickname: Some(request.nickname),
                amount: Decimal::from(request.amount),
                currency: request.currency,
                interval: request.interval,
                trial_period_days: Some(request.trial_period_days),
            };
            self.plans
                .write()
                .unwrap()
                .insert(request.id, plan.clone());
            Ok(plan)
        }

        async fn update_plan(
            &self,
            plan_id: &str,
            request: UpdatePlanRequest,
        ) -> Result<GatewayPlan> {
            self.updates
                .write()
                .unwrap()
                .push((plan_id.to_string(), request.clone()));
            let mut plans = self.plans.write().unwrap();
            let plan = plans
                .get_mut(plan_id)
                .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))?;
            plan.nickname = Some(request.nickname);
            Ok(plan.clone())
        }

        async fn delete_plan(&self, plan_id: &str) -> Result<()> {
            self.plans
                .write()
                .unwrap()
                .remove(plan_id)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))
        }

        async fn get_plan(&self, plan_id: &str) -> Result<GatewayPlan> {
            self.plans
                .read()
                .unwrap()
                .get(plan_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))
        }

        async fn list_plans(&self, options: PlanListOptions) -> Result<Vec<GatewayPlan>> {
            let mut plans: Vec<GatewayPlan> =
                self.plans.read().unwrap().values().cloned().collect();
            plans.sort_by(|a, b| a.id.cmp(&b.id));
            if let Some(limit) = options.limit {
                plans.truncate(limit as usize);
            }
            Ok(plans)
        }
    }
}
