//! MIP model builders.
//!
//! Two variants share the plant->DC arc set `P` and the opened-DC
//! cardinality/throughput machinery; they differ in how DC->customer flow
//! is modeled (spec §4.4 vs §4.5). Each returns an explicit [`MipModel`]
//! record rather than stashing variable maps as side-channel attributes on
//! the solver model (spec §9, "globalish solver handle").

#[cfg(feature = "gurobi")]
use std::collections::HashMap;

use crate::model::{CustomerId, DcId, Instance, PlantId, ProductId};

#[cfg(feature = "gurobi")]
pub mod multi_source;
#[cfg(feature = "gurobi")]
pub mod single_source;

#[cfg(not(feature = "gurobi"))]
mod multi_source_stub;
#[cfg(not(feature = "gurobi"))]
mod single_source_stub;
#[cfg(not(feature = "gurobi"))]
pub use multi_source_stub as multi_source;
#[cfg(not(feature = "gurobi"))]
pub use single_source_stub as single_source;

/// `(plant, dc, product)` arcs eligible for flow: `plant_ub[i,p] > 0`.
pub type PlantDcArc = (PlantId, DcId, ProductId);
/// `(dc, customer, product)` arcs eligible for flow: `demand[k,p] > 0`.
pub type DcCustomerArc = (DcId, CustomerId, ProductId);

/// The two arc sets `P` and `C` from spec §3, restricted to the clustered
/// candidate DC set `dc_candidates`.
pub struct ArcSets {
    pub plant_dc: Vec<PlantDcArc>,
    pub dc_customer: Vec<DcCustomerArc>,
}

/// Compute `P = {(i,j,p) : plant_ub[i,p] > 0}` and
/// `C = {(j,k,p) : demand[k,p] > 0}`, restricted to DCs in `dc_candidates`.
pub fn arcs(instance: &Instance, dc_candidates: &[DcId]) -> ArcSets {
    let mut plant_dc = Vec::new();
    for (i, _) in &instance.plants {
        for j in dc_candidates {
            for product in &instance.products {
                let ub = instance
                    .plant_ub
                    .get(&(i.clone(), product.id.clone()))
                    .copied()
                    .unwrap_or(0.0);
                if ub > 0.0 {
                    plant_dc.push((i.clone(), j.clone(), product.id.clone()));
                }
            }
        }
    }

    let mut dc_customer = Vec::new();
    for j in dc_candidates {
        for (k, _) in &instance.customers {
            for product in &instance.products {
                let demand = instance
                    .demand
                    .get(&(k.clone(), product.id.clone()))
                    .copied()
                    .unwrap_or(0.0);
                if demand > 0.0 {
                    dc_customer.push((j.clone(), k.clone(), product.id.clone()));
                }
            }
        }
    }

    ArcSets { plant_dc, dc_customer }
}

/// Large-M penalty on unmet demand for the multiple-source variant
/// (spec §4.4). Kept as a named constant per spec §9's configurability
/// note, defaulting to the reference value.
pub const MULTI_SOURCE_SLACK_PENALTY: f64 = 1e6;
/// Large-M penalty for the single-source variant (spec §4.5).
pub const SINGLE_SOURCE_SLACK_PENALTY: f64 = 1e8;

/// Numeric tolerance used when extracting variable values (spec §4.6).
pub const EPSILON: f64 = 1e-6;

/// A built MIP, ready for [`crate::solver::SolverDriver::solve`].
///
/// `y` and the flow variables are keyed explicitly rather than attached to
/// the underlying solver model (spec §9).
#[cfg(feature = "gurobi")]
pub struct MipModel {
    pub model: grb::Model,
    pub x_plant_dc: HashMap<PlantDcArc, grb::Var>,
    pub dc_customer_vars: DcCustomerVars,
    pub y: HashMap<DcId, grb::Var>,
    pub dc_candidates: Vec<DcId>,
}

/// The DC->customer side differs by variant: continuous split flow for
/// multiple-source, binary single assignment for single-source.
#[cfg(feature = "gurobi")]
pub enum DcCustomerVars {
    MultiSource {
        x: HashMap<DcCustomerArc, grb::Var>,
        slack: HashMap<(CustomerId, ProductId), grb::Var>,
    },
    SingleSource {
        z: HashMap<(DcId, CustomerId), grb::Var>,
        slack: HashMap<CustomerId, grb::Var>,
    },
}
