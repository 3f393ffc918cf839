//! Plan catalog configuration.
//!
//! Catalog contents are deployment data, not engine logic. A default catalog
//! ships so development runs work out of the box; deployments override it
//! with a JSON document in `VIP_GATE__PLANS__CATALOG_JSON`.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::foundation::{Amount, PlanId};
use crate::domain::plan::{Plan, PlanCatalog};

use super::error::ValidationError;

/// Plan catalog configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlansConfig {
    /// JSON array of `{id, name, price}` objects overriding the default
    /// catalog.
    pub catalog_json: Option<String>,
}

/// One configured plan entry as it appears in the JSON document.
#[derive(Debug, Clone, Deserialize)]
struct PlanEntry {
    id: String,
    name: String,
    price: Decimal,
}

impl PlansConfig {
    /// Builds the catalog, falling back to the default plans.
    pub fn catalog(&self) -> Result<PlanCatalog, ValidationError> {
        let entries: Vec<PlanEntry> = match &self.catalog_json {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| ValidationError::InvalidPlanCatalog(e.to_string()))?,
            None => default_entries(),
        };

        if entries.is_empty() {
            return Err(ValidationError::EmptyPlanCatalog);
        }

        let mut plans = Vec::with_capacity(entries.len());
        for entry in entries {
            if plans
                .iter()
                .any(|p: &Plan| p.id.as_str() == entry.id.as_str())
            {
                return Err(ValidationError::DuplicatePlanId(entry.id));
            }
            plans.push(Plan {
                id: PlanId::new(&entry.id)
                    .map_err(|e| ValidationError::InvalidPlanCatalog(e.to_string()))?,
                name: entry.name,
                price: Amount::new(entry.price)
                    .map_err(|e| ValidationError::InvalidPlanCatalog(e.to_string()))?,
            });
        }

        Ok(PlanCatalog::new(plans))
    }

    /// Validates the catalog by building it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.catalog().map(|_| ())
    }
}

fn default_entries() -> Vec<PlanEntry> {
    vec![
        PlanEntry {
            id: "vip7".to_string(),
            name: "VIP 7 dias".to_string(),
            price: Decimal::new(990, 2),
        },
        PlanEntry {
            id: "vip30".to_string(),
            name: "VIP 30 dias".to_string(),
            price: Decimal::new(2990, 2),
        },
        PlanEntry {
            id: "vip90".to_string(),
            name: "VIP 90 dias".to_string(),
            price: Decimal::new(6990, 2),
        },
    ]
}
