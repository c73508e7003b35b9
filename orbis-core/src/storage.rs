//! Mass- and volume-capped storage buckets, one per agent per planet.
//!
//! `current` totals are recomputed from the entries after every mutation, so
//! the parity invariant (current == sum of contents) holds exactly in integer
//! and float arithmetic alike.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::resources::{Resource, ResourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StorageLoad {
    pub volume: f64,
    pub mass: f64,
}

impl StorageLoad {
    pub fn new(volume: f64, mass: f64) -> Self {
        Self { volume, mass }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub resource: Resource,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFacility {
    pub capacity: StorageLoad,
    pub current: StorageLoad,
    pub scale: f64,
    pub by_resource: BTreeMap<String, StorageEntry>,
}

impl StorageFacility {
    pub fn new(capacity: StorageLoad, scale: f64) -> Result<Self, ConfigError> {
        if scale < 0.0 {
            return Err(ConfigError::NegativeScale(scale));
        }
        if capacity.volume < 0.0 || capacity.mass < 0.0 {
            return Err(ConfigError::NegativeQuantity {
                name: "storage capacity",
                value: capacity.volume.min(capacity.mass),
            });
        }
        Ok(Self {
            capacity,
            current: StorageLoad::default(),
            scale,
            by_resource: BTreeMap::new(),
        })
    }

    pub fn stored(&self, name: &str) -> f64 {
        self.by_resource.get(name).map_or(0.0, |e| e.quantity)
    }

    /// Store as much of `quantity` as the remaining volume and mass headroom
    /// admits; returns the amount actually stored. Land-bound resources are
    /// rejected outright.
    pub fn put(&mut self, resource: &Resource, quantity: f64) -> f64 {
        let ResourceKind::Storable {
            volume_per_quantity,
            mass_per_quantity,
            ..
        } = resource.kind
        else {
            return 0.0;
        };
        if quantity <= 0.0 {
            return 0.0;
        }

        let restriction = self
            .headroom_fraction(self.capacity.volume * self.scale - self.current.volume, quantity * volume_per_quantity)
            .min(self.headroom_fraction(self.capacity.mass * self.scale - self.current.mass, quantity * mass_per_quantity));
        let stored = quantity * restriction;
        if stored <= 0.0 {
            return 0.0;
        }

        let entry = self
            .by_resource
            .entry(resource.name.clone())
            .or_insert_with(|| StorageEntry {
                resource: resource.clone(),
                quantity: 0.0,
            });
        entry.quantity += stored;
        self.recompute_load();
        stored
    }

    /// Remove up to `quantity` of the named resource; returns the amount
    /// actually removed.
    pub fn remove(&mut self, name: &str, quantity: f64) -> f64 {
        let Some(entry) = self.by_resource.get_mut(name) else {
            return 0.0;
        };
        let removed = entry.quantity.min(quantity.max(0.0));
        entry.quantity -= removed;
        if entry.quantity <= 0.0 {
            self.by_resource.remove(name);
        }
        self.recompute_load();
        removed
    }

    /// Totals derived from the entries alone, for the parity check.
    pub fn content_load(&self) -> StorageLoad {
        let mut load = StorageLoad::default();
        for entry in self.by_resource.values() {
            if let ResourceKind::Storable {
                volume_per_quantity,
                mass_per_quantity,
                ..
            } = entry.resource.kind
            {
                load.volume += entry.quantity * volume_per_quantity;
                load.mass += entry.quantity * mass_per_quantity;
            }
        }
        load
    }

    fn headroom_fraction(&self, headroom: f64, demand: f64) -> f64 {
        if demand <= 0.0 {
            1.0
        } else {
            (headroom / demand).clamp(0.0, 1.0)
        }
    }

    fn recompute_load(&mut self) {
        self.current = self.content_load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourcePhase;

    fn ore() -> Resource {
        Resource::storable("Iron Ore", ResourcePhase::Solid, 0.5, 2.0).unwrap()
    }

    fn facility(volume: f64, mass: f64) -> StorageFacility {
        StorageFacility::new(StorageLoad::new(volume, mass), 1.0).unwrap()
    }

    #[test]
    fn put_then_remove_round_trips() {
        let mut storage = facility(100.0, 100.0);
        let stored = storage.put(&ore(), 10.0);
        assert_eq!(stored, 10.0);
        assert_eq!(storage.current.volume, 5.0);
        assert_eq!(storage.current.mass, 20.0);

        let removed = storage.remove("Iron Ore", 10.0);
        assert_eq!(removed, 10.0);
        assert_eq!(storage.current, StorageLoad::default());
        assert!(storage.by_resource.is_empty());
    }

    #[test]
    fn put_is_capped_by_tightest_axis() {
        // Mass cap binds first: 100 mass / 2.0 per unit = 50 units max.
        let mut storage = facility(1000.0, 100.0);
        let stored = storage.put(&ore(), 80.0);
        assert_eq!(stored, 50.0);
        assert_eq!(storage.current.mass, 100.0);
    }

    #[test]
    fn put_into_full_storage_stores_nothing() {
        let mut storage = facility(1000.0, 100.0);
        storage.put(&ore(), 50.0);
        assert_eq!(storage.put(&ore(), 1.0), 0.0);
        assert_eq!(storage.stored("Iron Ore"), 50.0);
    }

    #[test]
    fn scale_multiplies_capacity() {
        let mut storage = StorageFacility::new(StorageLoad::new(10.0, 10.0), 2.0).unwrap();
        // Volume cap: 20 / 0.5 = 40 units; mass cap: 20 / 2 = 10 units.
        assert_eq!(storage.put(&ore(), 40.0), 10.0);
    }

    #[test]
    fn land_bound_resources_are_rejected() {
        let mut storage = facility(100.0, 100.0);
        let land = Resource::land_bound("Arable Land");
        assert_eq!(storage.put(&land, 10.0), 0.0);
        assert!(storage.by_resource.is_empty());
    }

    #[test]
    fn remove_caps_at_inventory() {
        let mut storage = facility(100.0, 100.0);
        storage.put(&ore(), 5.0);
        assert_eq!(storage.remove("Iron Ore", 50.0), 5.0);
        assert_eq!(storage.remove("Iron Ore", 1.0), 0.0);
    }

    #[test]
    fn parity_holds_after_mutations() {
        let mut storage = facility(100.0, 100.0);
        storage.put(&ore(), 7.0);
        storage.remove("Iron Ore", 2.5);
        let content = storage.content_load();
        assert_eq!(storage.current.volume, content.volume);
        assert_eq!(storage.current.mass, content.mass);
    }

    #[test]
    fn negative_scale_rejected() {
        assert!(StorageFacility::new(StorageLoad::new(1.0, 1.0), -1.0).is_err());
    }
}
