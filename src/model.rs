//! Core data model: locations, entities, and the bundled problem instance.
//!
//! Mirrors the tuple contract produced by the external instance builder
//! (`weight, cust, plant, dc, dc_lb, dc_ub, demand, plant_ub, name`; see
//! spec §6) without reimplementing the builder itself.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type PlantId = String;
pub type DcId = String;
pub type CustomerId = String;
pub type ProductId = String;

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::invalid_input(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::invalid_input(format!(
                "longitude {lon} out of range [-180, 180]"
            )));
        }
        Ok(Location { lat, lon })
    }
}

/// A product with a positive integer unit weight (cost multiplier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub weight: u32,
}

/// A fully assembled problem instance: plants, DCs, customers, products,
/// demand, and capacity bounds. Immutable for the lifetime of one solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Plant id -> location.
    pub plants: IndexMap<PlantId, Location>,
    /// DC id -> location.
    pub dcs: IndexMap<DcId, Location>,
    /// Customer id -> location, in the order used by the pre-clusterer's
    /// nearest-DC assignment.
    pub customers: IndexMap<CustomerId, Location>,
    pub products: Vec<Product>,
    /// Human-readable customer labels, passed through unused by the core.
    pub customer_name: HashMap<CustomerId, String>,
    /// `dc_lb[j] = 0` for all `j` per spec; kept for contract fidelity.
    pub dc_lb: HashMap<DcId, f64>,
    /// `dc_ub[j] > 0`: total per-DC throughput upper bound.
    pub dc_ub: HashMap<DcId, f64>,
    /// `demand[(customer, product)] >= 0`. Zero entries are permitted but
    /// treated as absent arcs downstream.
    pub demand: HashMap<(CustomerId, ProductId), f64>,
    /// `plant_ub[(plant, product)] >= 0`; eligibility is `> 0`.
    pub plant_ub: HashMap<(PlantId, ProductId), f64>,
}

impl Instance {
    /// Validate the preconditions every downstream component trusts.
    ///
    /// Fails fast with `InvalidInput` per spec §7; components do not
    /// re-validate an instance once this has passed.
    pub fn validate(&self) -> Result<()> {
        if self.customers.is_empty() {
            return Err(Error::invalid_input("instance has no customers"));
        }
        if self.dcs.is_empty() {
            return Err(Error::invalid_input("instance has no distribution centers"));
        }
        if self.plants.is_empty() {
            return Err(Error::invalid_input("instance has no plants"));
        }
        for product in &self.products {
            if product.weight == 0 {
                return Err(Error::invalid_input(format!(
                    "product {} has non-positive weight",
                    product.id
                )));
            }
        }
        for (dc, &ub) in &self.dc_ub {
            if ub <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "dc {dc} has non-positive throughput upper bound {ub}"
                )));
            }
        }
        for (&ref key, &demand) in &self.demand {
            if demand < 0.0 {
                return Err(Error::invalid_input(format!(
                    "negative demand for {key:?}"
                )));
            }
        }
        for (&ref key, &ub) in &self.plant_ub {
            if ub < 0.0 {
                return Err(Error::invalid_input(format!(
                    "negative plant capacity for {key:?}"
                )));
            }
        }
        Ok(())
    }

    /// Total demand for customer `k` across all products.
    pub fn total_demand(&self, k: &CustomerId) -> f64 {
        self.products
            .iter()
            .map(|p| *self.demand.get(&(k.clone(), p.id.clone())).unwrap_or(&0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_rejects_out_of_range_coordinates() {
        assert!(Location::new(91.0, 0.0).is_err());
        assert!(Location::new(0.0, 181.0).is_err());
        assert!(Location::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn validate_rejects_empty_customer_set() {
        let instance = Instance {
            name: "t".into(),
            plants: IndexMap::from([("i1".to_string(), Location::new(0.0, 0.0).unwrap())]),
            dcs: IndexMap::from([("j1".to_string(), Location::new(0.0, 1.0).unwrap())]),
            customers: IndexMap::new(),
            products: vec![Product { id: "P01".into(), weight: 1 }],
            customer_name: HashMap::new(),
            dc_lb: HashMap::from([("j1".to_string(), 0.0)]),
            dc_ub: HashMap::from([("j1".to_string(), 100.0)]),
            demand: HashMap::new(),
            plant_ub: HashMap::new(),
        };
        assert!(instance.validate().is_err());
    }
}
