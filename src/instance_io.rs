//! Instance I/O: deserializes the external instance-builder contract
//! (spec §6) from JSON. This is the minimal amount of instance consumption
//! the core needs to be runnable — not the instance *generator*, which is
//! out of scope (spec §1 Non-goals).

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{CustomerId, DcId, Instance, Location, PlantId, Product, ProductId};

/// Wire shape of the tuple `(weight, cust, plant, dc, dc_lb, dc_ub, demand,
/// plant_ub, name)` from spec §6. Tuple-keyed maps (`demand`, `plant_ub`)
/// are nested two levels deep (`id -> product -> value`) since JSON object
/// keys cannot themselves be tuples.
#[derive(Debug, Deserialize, Serialize)]
pub struct InstanceContract {
    pub weight: IndexMap<ProductId, u32>,
    pub cust: IndexMap<CustomerId, (f64, f64)>,
    pub plant: IndexMap<PlantId, (f64, f64)>,
    pub dc: IndexMap<DcId, (f64, f64)>,
    pub dc_lb: HashMap<DcId, f64>,
    pub dc_ub: HashMap<DcId, f64>,
    pub demand: HashMap<CustomerId, HashMap<ProductId, f64>>,
    pub plant_ub: HashMap<PlantId, HashMap<ProductId, f64>>,
    pub name: HashMap<CustomerId, String>,
}

impl InstanceContract {
    /// Read and parse an instance contract from a JSON file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| Error::invalid_input(format!("failed to open {}: {e}", path.as_ref().display())))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::invalid_input(format!("failed to parse instance JSON: {e}")))
    }

    /// Convert the wire contract into the core [`Instance`] type,
    /// validating coordinates and reassembling tuple-keyed maps.
    pub fn into_instance(self, instance_name: String) -> Result<Instance> {
        debug!(
            "loading instance: {} customers, {} plants, {} DCs, {} products",
            self.cust.len(),
            self.plant.len(),
            self.dc.len(),
            self.weight.len()
        );

        let mut customers = IndexMap::with_capacity(self.cust.len());
        for (id, (lat, lon)) in self.cust {
            customers.insert(id, Location::new(lat, lon)?);
        }

        let mut plants = IndexMap::with_capacity(self.plant.len());
        for (id, (lat, lon)) in self.plant {
            plants.insert(id, Location::new(lat, lon)?);
        }

        let mut dcs = IndexMap::with_capacity(self.dc.len());
        for (id, (lat, lon)) in self.dc {
            dcs.insert(id, Location::new(lat, lon)?);
        }

        let products = self
            .weight
            .into_iter()
            .map(|(id, weight)| Product { id, weight })
            .collect();

        let mut demand = HashMap::new();
        for (customer_id, per_product) in self.demand {
            for (product_id, value) in per_product {
                demand.insert((customer_id.clone(), product_id), value);
            }
        }

        let mut plant_ub = HashMap::new();
        for (plant_id, per_product) in self.plant_ub {
            for (product_id, value) in per_product {
                plant_ub.insert((plant_id.clone(), product_id), value);
            }
        }

        let instance = Instance {
            name: instance_name,
            plants,
            dcs,
            customers,
            products,
            customer_name: self.name,
            dc_lb: self.dc_lb,
            dc_ub: self.dc_ub,
            demand,
            plant_ub,
        };
        instance.validate()?;
        Ok(instance)
    }
}

/// Load and validate an instance from a JSON file in one step.
pub fn load_instance<P: AsRef<Path>>(path: P, instance_name: impl Into<String>) -> Result<Instance> {
    InstanceContract::from_file(path)?.into_instance(instance_name.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "weight": {"P01": 1},
            "cust": {"k1": [0.0, 2.0]},
            "plant": {"i1": [0.0, 0.0]},
            "dc": {"j1": [0.0, 1.0]},
            "dc_lb": {"j1": 0.0},
            "dc_ub": {"j1": 100.0},
            "demand": {"k1": {"P01": 10.0}},
            "plant_ub": {"i1": {"P01": 100.0}},
            "name": {"k1": "Customer One"}
        }"#
    }

    #[test]
    fn parses_and_validates_minimal_contract() {
        let contract: InstanceContract = serde_json::from_str(sample_json()).unwrap();
        let instance = contract.into_instance("t".to_string()).unwrap();
        assert_eq!(instance.customers.len(), 1);
        assert_eq!(instance.demand[&("k1".to_string(), "P01".to_string())], 10.0);
        assert_eq!(instance.plant_ub[&("i1".to_string(), "P01".to_string())], 100.0);
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        let bad = sample_json().replace("[0.0, 2.0]", "[200.0, 2.0]");
        let contract: InstanceContract = serde_json::from_str(&bad).unwrap();
        assert!(contract.into_instance("t".to_string()).is_err());
    }
}
