//! Plan catalog value types.
//!
//! The catalog itself is external, read-only deployment data; the engine only
//! resolves a plan id to the price frozen into the order.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, PlanId};

/// One purchasable plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Catalog key, e.g. `vip7`.
    pub id: PlanId,

    /// Display name used in payment descriptions.
    pub name: String,

    /// Price charged at order creation.
    pub price: Amount,
}

/// Read-only lookup over the configured plans.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Creates a catalog from configured plans.
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Resolves a plan by id.
    pub fn find(&self, id: &PlanId) -> Option<&Plan> {
        self.plans.iter().find(|p| &p.id == id)
    }

    /// Whether the catalog has no plans.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn catalog() -> PlanCatalog {
        PlanCatalog::new(vec![Plan {
            id: PlanId::new("vip7").unwrap(),
            name: "VIP 7 dias".to_string(),
            price: Amount::new(dec!(9.90)).unwrap(),
        }])
    }

    #[test]
    fn find_resolves_known_plan() {
        let catalog = catalog();
        let plan = catalog.find(&PlanId::new("vip7").unwrap()).unwrap();
        assert_eq!(plan.name, "VIP 7 dias");
    }

    #[test]
    fn find_misses_unknown_plan() {
        assert!(catalog().find(&PlanId::new("vip365").unwrap()).is_none());
    }
}
