//! Audit logging for billing operations.
//!
//! Trait-based audit logging for the operations that move money-adjacent
//! state. The `GatewayDesync` event is the one load-bearing entry: it marks
//! a detected divergence between gateway and local records (e.g. a card
//! attached at the gateway whose local persist failed) and must be
//! distinguishable from a clean failure in log output.

use std::fmt;

/// Audit event types for billing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// Gateway customer created.
    CustomerCreated {
        account_id: String,
        customer_id: String,
    },
    /// Gateway customer deleted.
    CustomerDeleted {
        account_id: String,
        customer_id: String,
    },
    /// Subscription started or re-pointed at a plan.
    SubscriptionStarted {
        customer_id: String,
        subscription_id: String,
        plan_id: String,
    },
    /// Subscription canceled.
    SubscriptionEnded {
        customer_id: String,
        subscription_id: String,
        at_period_end: bool,
    },
    /// Subscription moved to a different plan.
    PlanChanged {
        customer_id: String,
        subscription_id: String,
        plan_id: String,
    },
    /// Subscription tax rate updated.
    TaxUpdated {
        customer_id: String,
        subscription_id: String,
    },
    /// Payment card attached.
    CardAdded {
        account_id: String,
        gateway_card_id: String,
    },
    /// Payment card replaced (old reference removed, new attached).
    CardReplaced {
        account_id: String,
        old_gateway_card_id: Option<String>,
        new_gateway_card_id: String,
    },
    /// Payment card removed.
    CardDeleted {
        account_id: String,
        gateway_card_id: String,
    },
    /// Gateway and local records have diverged after a partial failure.
    GatewayDesync { account_id: String, detail: String },
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomerCreated { account_id, customer_id } => {
                write!(f, "Customer created: account={}, customer={}", account_id, customer_id)
            }
            Self::CustomerDeleted { account_id, customer_id } => {
                write!(f, "Customer deleted: account={}, customer={}", account_id, customer_id)
            }
            Self::SubscriptionStarted { customer_id, subscription_id, plan_id } => {
                write!(f, "Subscription started: customer={}, sub={}, plan={}", customer_id, subscription_id, plan_id)
            }
            Self::SubscriptionEnded { customer_id, subscription_id, at_period_end } => {
                write!(f, "Subscription ended: customer={}, sub={}, at_period_end={}", customer_id, subscription_id, at_period_end)
            }
            Self::PlanChanged { customer_id, subscription_id, plan_id } => {
                write!(f, "Plan changed: customer={}, sub={}, plan={}", customer_id, subscription_id, plan_id)
            }
            Self::TaxUpdated { customer_id, subscription_id } => {
                write!(f, "Tax updated: customer={}, sub={}", customer_id, subscription_id)
            }
            Self::CardAdded { account_id, gateway_card_id } => {
                write!(f, "Card added: account={}, card={}", account_id, gateway_card_id)
            }
            Self::CardReplaced { account_id, old_gateway_card_id, new_gateway_card_id } => {
                write!(
                    f,
                    "Card replaced: account={}, old={}, new={}",
                    account_id,
                    old_gateway_card_id.as_deref().unwrap_or("<none>"),
                    new_gateway_card_id
                )
            }
            Self::CardDeleted { account_id, gateway_card_id } => {
                write!(f, "Card deleted: account={}, card={}", account_id, gateway_card_id)
            }
            Self::GatewayDesync { account_id, detail } => {
                write!(f, "Gateway/local state diverged: account={}, {}", account_id, detail)
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implementations should handle their own failures gracefully so that audit
/// plumbing never disrupts a billing operation.
pub trait AuditLogger: Send + Sync {
    /// Log a billing audit event.
    async fn log(&self, event: AuditEvent);
}

/// No-op audit logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: AuditEvent) {
        // No-op
    }
}

/// Tracing-based audit logger.
///
/// Regular events log at INFO; `GatewayDesync` logs at ERROR so divergence
/// stands apart from clean failures in log pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    async fn log(&self, event: AuditEvent) {
        if matches!(event, AuditEvent::GatewayDesync { .. }) {
            tracing::error!(
                target: "tollway::audit",
                event_type = %event_kind(&event),
                "{}", event
            );
        } else {
            tracing::info!(
                target: "tollway::audit",
                event_type = %event_kind(&event),
                "{}", event
            );
        }
    }
}

/// Get the event kind as a string for structured logging.
fn event_kind(event: &AuditEvent) -> &'static str {
    match event {
        AuditEvent::CustomerCreated { .. } => "customer_created",
        AuditEvent::CustomerDeleted { .. } => "customer_deleted",
        AuditEvent::SubscriptionStarted { .. } => "subscription_started",
        AuditEvent::SubscriptionEnded { .. } => "subscription_ended",
        AuditEvent::PlanChanged { .. } => "plan_changed",
        AuditEvent::TaxUpdated { .. } => "tax_updated",
        AuditEvent::CardAdded { .. } => "card_added",
        AuditEvent::CardReplaced { .. } => "card_replaced",
        AuditEvent::CardDeleted { .. } => "card_deleted",
        AuditEvent::GatewayDesync { .. } => "gateway_desync",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Test audit logger that captures events.
    #[derive(Default)]
    pub struct TestAuditLogger {
        events: Arc<Mutex<Vec<AuditEvent>>>,
    }

    impl TestAuditLogger {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn events(&self) -> Vec<AuditEvent> {
            self.events.lock().await.clone()
        }
    }

    impl AuditLogger for TestAuditLogger {
        async fn log(&self, event: AuditEvent) {
            self.events.lock().await.push(event);
        }
    }

    #[tokio::test]
    async fn test_noop_logger() {
        let logger = NoOpAuditLogger;
        logger
            .log(AuditEvent::CardAdded {
                account_id: "acct_1".to_string(),
                gateway_card_id: "card_1".to_string(),
            })
            .await;
        // Just verifies it doesn't panic.
    }

    #[tokio::test]
    async fn test_capturing_logger() {
        let logger = TestAuditLogger::new();

        logger
            .log(AuditEvent::CardAdded {
                account_id: "acct_1".to_string(),
                gateway_card_id: "card_1".to_string(),
            })
            .await;
        logger
            .log(AuditEvent::GatewayDesync {
                account_id: "acct_1".to_string(),
                detail: "orphaned gateway card card_1".to_string(),
            })
            .await;

        let events = logger.events().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], AuditEvent::CardAdded { .. }));
        assert!(matches!(events[1], AuditEvent::GatewayDesync { .. }));
    }

    #[test]
    fn test_event_display() {
        let event = AuditEvent::CardReplaced {
            account_id: "acct_1".to_string(),
            old_gateway_card_id: Some("card_old".to_string()),
            new_gateway_card_id: "card_new".to_string(),
        };
        let display = format!("{}", event);
        assert!(display.contains("card_old"));
        assert!(display.contains("card_new"));

        let event = AuditEvent::GatewayDesync {
            account_id: "acct_1".to_string(),
            detail: "orphaned gateway card".to_string(),
        };
        assert!(format!("{}", event).contains("diverged"));
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(
            event_kind(&AuditEvent::SubscriptionEnded {
                customer_id: String::new(),
                subscription_id: String::new(),
                at_period_end: false,
            }),
            "subscription_ended"
        );
        assert_eq!(
            event_kind(&AuditEvent::GatewayDesync {
                account_id: String::new(),
                detail: String::new(),
            }),
            "gateway_desync"
        );
    }
}
