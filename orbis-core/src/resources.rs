//! Resource definitions and the claim/tenant model.
//!
//! A resource is either storable (it has per-quantity volume and mass and
//! lives in storage facilities) or land-bound (it lives on a planet as a set
//! of claims and is consumed through the tenant mechanism). The distinction
//! is a variant, not a sentinel: land-bound resources are unrepresentable in
//! storage.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::types::AgentId;

/// Name of the staple consumed by planetary populations each tick.
pub const FOOD_RESOURCE: &str = "Agricultural Product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ResourcePhase {
    Solid,
    Liquid,
    Gas,
    Pieces,
    Persons,
    FrozenGoods,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceKind {
    Storable {
        phase: ResourcePhase,
        volume_per_quantity: f64,
        mass_per_quantity: f64,
    },
    LandBound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn storable(
        name: impl Into<String>,
        phase: ResourcePhase,
        volume_per_quantity: f64,
        mass_per_quantity: f64,
    ) -> Result<Self, ConfigError> {
        if volume_per_quantity < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "volume_per_quantity",
                value: volume_per_quantity,
            });
        }
        if mass_per_quantity < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "mass_per_quantity",
                value: mass_per_quantity,
            });
        }
        Ok(Self {
            name: name.into(),
            kind: ResourceKind::Storable {
                phase,
                volume_per_quantity,
                mass_per_quantity,
            },
        })
    }

    pub fn land_bound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::LandBound,
        }
    }

    pub fn is_land_bound(&self) -> bool {
        matches!(self.kind, ResourceKind::LandBound)
    }
}

// === CLAIMS ===

/// A deposit of a resource on a planet. `claim` owns it, `tenant` may use it;
/// both assignments are made outside the core and only read each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceClaim {
    pub id: u32,
    pub resource: String,
    pub quantity: f64,
    pub regeneration_rate: f64,
    pub maximum_capacity: f64,
    pub claim: Option<AgentId>,
    pub tenant: Option<AgentId>,
    pub tenant_cost: f64,
}

impl ResourceClaim {
    pub fn new(
        id: u32,
        resource: impl Into<String>,
        quantity: f64,
        regeneration_rate: f64,
        maximum_capacity: f64,
    ) -> Result<Self, ConfigError> {
        if maximum_capacity < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "maximum_capacity",
                value: maximum_capacity,
            });
        }
        if quantity < 0.0 || quantity > maximum_capacity {
            return Err(ConfigError::NegativeQuantity {
                name: "quantity",
                value: quantity,
            });
        }
        if regeneration_rate < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "regeneration_rate",
                value: regeneration_rate,
            });
        }
        Ok(Self {
            id,
            resource: resource.into(),
            quantity,
            regeneration_rate,
            maximum_capacity,
            claim: None,
            tenant: None,
            tenant_cost: 0.0,
        })
    }

    pub fn with_claim(mut self, agent: AgentId) -> Self {
        self.claim = Some(agent);
        self
    }

    pub fn with_tenant(mut self, agent: AgentId, tenant_cost: f64) -> Self {
        self.tenant = Some(agent);
        self.tenant_cost = tenant_cost;
        self
    }

    /// One tick of renewable growth, capped at capacity.
    pub fn regenerate(&mut self) {
        if self.regeneration_rate > 0.0 {
            self.quantity = (self.quantity + self.regeneration_rate).min(self.maximum_capacity);
        }
    }
}

/// Total quantity the agent can draw on as tenant across the claims of one
/// resource on one planet.
pub fn query_claimed_resource(claims: &[ResourceClaim], agent: AgentId) -> f64 {
    claims
        .iter()
        .filter(|c| c.tenant == Some(agent))
        .map(|c| c.quantity)
        .sum()
}

/// Greedily deduct up to `amount` from the agent's tenanted claims in list
/// order. Returns the total actually extracted.
pub fn extract_from_claimed_resource(
    claims: &mut [ResourceClaim],
    agent: AgentId,
    amount: f64,
) -> f64 {
    let mut remaining = amount.max(0.0);
    let mut extracted = 0.0;
    for claim in claims.iter_mut() {
        if remaining <= 0.0 {
            break;
        }
        if claim.tenant != Some(agent) {
            continue;
        }
        let take = claim.quantity.min(remaining);
        claim.quantity -= take;
        remaining -= take;
        extracted += take;
    }
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn agent_ids(n: usize) -> Vec<AgentId> {
        let mut map: SlotMap<AgentId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn regeneration_caps_at_capacity() {
        let mut claim = ResourceClaim::new(0, "Forest", 9.5, 1.0, 10.0).unwrap();
        claim.regenerate();
        assert_eq!(claim.quantity, 10.0);
        claim.regenerate();
        assert_eq!(claim.quantity, 10.0);
    }

    #[test]
    fn query_only_counts_tenant() {
        let ids = agent_ids(2);
        let claims = vec![
            ResourceClaim::new(0, "Ore", 5.0, 0.0, 10.0)
                .unwrap()
                .with_tenant(ids[0], 1.0),
            ResourceClaim::new(1, "Ore", 7.0, 0.0, 10.0)
                .unwrap()
                .with_tenant(ids[1], 1.0),
            ResourceClaim::new(2, "Ore", 3.0, 0.0, 10.0).unwrap(),
        ];
        assert_eq!(query_claimed_resource(&claims, ids[0]), 5.0);
        assert_eq!(query_claimed_resource(&claims, ids[1]), 7.0);
    }

    #[test]
    fn extraction_is_greedy_in_list_order() {
        let ids = agent_ids(1);
        let mut claims = vec![
            ResourceClaim::new(0, "Ore", 2.0, 0.0, 10.0)
                .unwrap()
                .with_tenant(ids[0], 1.0),
            ResourceClaim::new(1, "Ore", 5.0, 0.0, 10.0)
                .unwrap()
                .with_tenant(ids[0], 1.0),
        ];
        let got = extract_from_claimed_resource(&mut claims, ids[0], 4.0);
        assert_eq!(got, 4.0);
        assert_eq!(claims[0].quantity, 0.0);
        assert_eq!(claims[1].quantity, 3.0);
    }

    #[test]
    fn extraction_caps_at_available() {
        let ids = agent_ids(1);
        let mut claims = vec![
            ResourceClaim::new(0, "Ore", 2.0, 0.0, 10.0)
                .unwrap()
                .with_tenant(ids[0], 1.0),
        ];
        let got = extract_from_claimed_resource(&mut claims, ids[0], 100.0);
        assert_eq!(got, 2.0);
        assert_eq!(claims[0].quantity, 0.0);
    }

    #[test]
    fn invalid_claim_rejected() {
        assert!(ResourceClaim::new(0, "Ore", 11.0, 0.0, 10.0).is_err());
        assert!(ResourceClaim::new(0, "Ore", -1.0, 0.0, 10.0).is_err());
        assert!(ResourceClaim::new(0, "Ore", 1.0, 0.0, -10.0).is_err());
    }
}
