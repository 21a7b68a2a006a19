//! Premium entitlement and a store-less purchase flow.
//!
//! [`MockEntitlementGateway`] stands in for a real billing SDK: purchases
//! always succeed (unless a failure is queued), are recorded in the
//! key-value store, and can be restored later.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, PurchaseError};
use crate::storage::{keys, load_json, try_save_json, KeyValueStore};
use crate::timer::Clock;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Access level granted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entitlement {
    pub is_premium: bool,
    pub active_product_ids: Vec<String>,
    /// `None` with `is_premium` means a lifetime unlock.
    pub expires_at_ms: Option<i64>,
}

impl Entitlement {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn premium(active_product_ids: Vec<String>, expires_at_ms: Option<i64>) -> Self {
        Self {
            is_premium: true,
            active_product_ids,
            expires_at_ms,
        }
    }
}

/// Purchasable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub title: &'static str,
    /// `None` never expires.
    pub duration_days: Option<i64>,
}

pub const PRODUCTS: &[Product] = &[
    Product {
        id: "premium_monthly",
        title: "Premium (monthly)",
        duration_days: Some(30),
    },
    Product {
        id: "premium_yearly",
        title: "Premium (yearly)",
        duration_days: Some(365),
    },
    Product {
        id: "premium_lifetime",
        title: "Premium (lifetime)",
        duration_days: None,
    },
];

pub type EntitlementListener = Box<dyn Fn(&Entitlement) + Send + Sync>;

/// Billing / entitlement service.
pub trait EntitlementGateway: Send + Sync {
    fn entitlement(&self) -> Result<Entitlement, GatewayError>;

    fn purchase(&self, product_id: &str) -> Result<Entitlement, PurchaseError>;

    fn restore(&self) -> Result<Entitlement, PurchaseError>;

    /// Push-style change notifications.
    fn subscribe(&self, listener: EntitlementListener);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PurchaseLedger {
    purchases: Vec<PurchaseRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PurchaseRecord {
    product_id: String,
    purchased_at_ms: i64,
}

impl PurchaseLedger {
    fn entitlement_at(&self, now_ms: i64) -> Entitlement {
        let mut active = Vec::new();
        let mut lifetime = false;
        let mut latest_expiry: Option<i64> = None;

        for record in &self.purchases {
            let Some(product) = PRODUCTS.iter().find(|p| p.id == record.product_id) else {
                continue;
            };
            match product.duration_days {
                None => lifetime = true,
                Some(days) => {
                    let expiry = record.purchased_at_ms + days * DAY_MS;
                    if expiry <= now_ms {
                        continue;
                    }
                    latest_expiry = Some(latest_expiry.map_or(expiry, |e| e.max(expiry)));
                }
            }
            if !active.contains(&record.product_id) {
                active.push(record.product_id.clone());
            }
        }

        if active.is_empty() {
            Entitlement::free()
        } else {
            Entitlement::premium(active, if lifetime { None } else { latest_expiry })
        }
    }
}

/// In-process purchase flow backed by the key-value store.
pub struct MockEntitlementGateway {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    listeners: Mutex<Vec<EntitlementListener>>,
    next_failure: Mutex<Option<PurchaseError>>,
}

impl MockEntitlementGateway {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            listeners: Mutex::new(Vec::new()),
            next_failure: Mutex::new(None),
        }
    }

    /// Make the next `purchase` or `restore` fail with `error`.
    pub fn fail_next(&self, error: PurchaseError) {
        if let Ok(mut slot) = self.next_failure.lock() {
            *slot = Some(error);
        }
    }

    fn take_failure(&self) -> Option<PurchaseError> {
        self.next_failure.lock().ok().and_then(|mut slot| slot.take())
    }

    fn ledger(&self) -> PurchaseLedger {
        load_json(self.store.as_ref(), keys::ENTITLEMENT).unwrap_or_default()
    }

    fn notify(&self, entitlement: &Entitlement) {
        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(entitlement);
            }
        }
    }
}

impl EntitlementGateway for MockEntitlementGateway {
    fn entitlement(&self) -> Result<Entitlement, GatewayError> {
        Ok(self.ledger().entitlement_at(self.clock.now_ms()))
    }

    fn purchase(&self, product_id: &str) -> Result<Entitlement, PurchaseError> {
        if let Some(err) = self.take_failure() {
            tracing::debug!(product_id, error = %err, "purchase failed");
            return Err(err);
        }
        if !PRODUCTS.iter().any(|p| p.id == product_id) {
            return Err(PurchaseError::ProductNotFound(product_id.to_string()));
        }

        let now = self.clock.now_ms();
        let mut ledger = self.ledger();
        ledger.purchases.push(PurchaseRecord {
            product_id: product_id.to_string(),
            purchased_at_ms: now,
        });
        try_save_json(self.store.as_ref(), keys::ENTITLEMENT, &ledger)
            .map_err(|e| PurchaseError::StoreUnavailable(e.to_string()))?;

        let entitlement = ledger.entitlement_at(now);
        tracing::info!(product_id, "purchase completed");
        self.notify(&entitlement);
        Ok(entitlement)
    }

    fn restore(&self) -> Result<Entitlement, PurchaseError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let ledger = self.ledger();
        if ledger.purchases.is_empty() {
            return Err(PurchaseError::NothingToRestore);
        }
        let entitlement = ledger.entitlement_at(self.clock.now_ms());
        self.notify(&entitlement);
        Ok(entitlement)
    }

    fn subscribe(&self, listener: EntitlementListener) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }
}
