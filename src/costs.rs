//! Cost builder: pure, deterministic function of plant/DC/customer
//! locations (spec §4.2).

use std::collections::HashMap;

use crate::geo::haversine_km;
use crate::model::{DcId, Instance, PlantId};

/// Unit-cost scalars. Defaults match the reference (spec §3).
#[derive(Debug, Clone, Copy)]
pub struct CostParams {
    pub unit_tp_cost: f64,
    pub unit_del_cost: f64,
    pub unit_dc_fc: f64,
    pub unit_dc_vc: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        CostParams {
            unit_tp_cost: 1.0,
            unit_del_cost: 10.0,
            unit_dc_fc: 1000.0,
            unit_dc_vc: 1.0,
        }
    }
}

/// The four cost tables consumed by the MIP builders.
#[derive(Debug, Clone)]
pub struct CostTables {
    /// Unit transport cost, plant -> DC.
    pub tp_cost: HashMap<(PlantId, DcId), f64>,
    /// Unit delivery cost, DC -> customer.
    pub del_cost: HashMap<(DcId, String), f64>,
    /// Fixed cost of opening each DC.
    pub dc_fc: HashMap<DcId, f64>,
    /// Unit variable (per-flow) cost at each DC.
    pub dc_vc: HashMap<DcId, f64>,
}

/// Build the dense plant->DC and DC->customer cost tables plus the
/// per-DC fixed/variable cost scalars.
pub fn build_costs(instance: &Instance, params: &CostParams) -> CostTables {
    let mut tp_cost = HashMap::with_capacity(instance.plants.len() * instance.dcs.len());
    for (i, &loc_i) in &instance.plants {
        for (j, &loc_j) in &instance.dcs {
            tp_cost.insert((i.clone(), j.clone()), params.unit_tp_cost * haversine_km(loc_i, loc_j));
        }
    }

    let mut del_cost = HashMap::with_capacity(instance.dcs.len() * instance.customers.len());
    for (j, &loc_j) in &instance.dcs {
        for (k, &loc_k) in &instance.customers {
            del_cost.insert((j.clone(), k.clone()), params.unit_del_cost * haversine_km(loc_j, loc_k));
        }
    }

    let mut dc_fc = HashMap::with_capacity(instance.dcs.len());
    let mut dc_vc = HashMap::with_capacity(instance.dcs.len());
    for j in instance.dcs.keys() {
        dc_fc.insert(j.clone(), params.unit_dc_fc);
        dc_vc.insert(j.clone(), params.unit_dc_vc);
    }

    CostTables { tp_cost, del_cost, dc_fc, dc_vc }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Product};
    use indexmap::IndexMap;
    use std::collections::HashMap as Map;

    fn trivial_instance() -> Instance {
        Instance {
            name: "t".into(),
            plants: IndexMap::from([("i1".to_string(), Location::new(0.0, 0.0).unwrap())]),
            dcs: IndexMap::from([("j1".to_string(), Location::new(0.0, 1.0).unwrap())]),
            customers: IndexMap::from([("k1".to_string(), Location::new(0.0, 2.0).unwrap())]),
            products: vec![Product { id: "P01".into(), weight: 1 }],
            customer_name: Map::new(),
            dc_lb: Map::from([("j1".to_string(), 0.0)]),
            dc_ub: Map::from([("j1".to_string(), 100.0)]),
            demand: Map::from([(("k1".to_string(), "P01".to_string()), 10.0)]),
            plant_ub: Map::from([(("i1".to_string(), "P01".to_string()), 100.0)]),
        }
    }

    #[test]
    fn costs_are_proportional_to_distance() {
        let instance = trivial_instance();
        let params = CostParams::default();
        let tables = build_costs(&instance, &params);

        let d = haversine_km(instance.plants["i1"], instance.dcs["j1"]);
        assert!((tables.tp_cost[&("i1".to_string(), "j1".to_string())] - params.unit_tp_cost * d).abs() < 1e-9);

        let d2 = haversine_km(instance.dcs["j1"], instance.customers["k1"]);
        assert!((tables.del_cost[&("j1".to_string(), "k1".to_string())] - params.unit_del_cost * d2).abs() < 1e-9);

        assert_eq!(tables.dc_fc["j1"], params.unit_dc_fc);
        assert_eq!(tables.dc_vc["j1"], params.unit_dc_vc);
    }

    #[test]
    fn distance_symmetry_holds_for_swapped_locations() {
        let a = Location::new(10.0, 20.0).unwrap();
        let b = Location::new(30.0, 40.0).unwrap();
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
