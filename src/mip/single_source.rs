//! Single-source MIP builder (spec §4.5): every customer is served by
//! exactly one DC for all of its demand, modeled with binary assignment
//! variables `z[j,k]` and weak DC activation `z[j,k] <= y[j]`.

use std::collections::{HashMap, HashSet};

use grb::prelude::*;

use crate::costs::CostTables;
use crate::error::{Error, Result};
use crate::model::{CustomerId, DcId, Instance, PlantId, ProductId};

use super::{arcs, DcCustomerVars, MipModel, SINGLE_SOURCE_SLACK_PENALTY};

/// Build the single-source MIP over the clustered DC subset.
pub fn build(
    instance: &Instance,
    costs: &CostTables,
    dc_candidates: &[DcId],
    dc_num: u32,
) -> Result<MipModel> {
    if dc_num == 0 {
        return Err(Error::invalid_input("dc_num must be positive"));
    }

    let arc_sets = arcs(instance, dc_candidates);

    let env = Env::new("").map_err(|e| Error::solver(format!("failed to create environment: {e}")))?;
    let mut model = Model::with_env("lnd-single-source", env)
        .map_err(|e| Error::solver(format!("failed to create model: {e}")))?;

    let mut x_plant_dc = HashMap::with_capacity(arc_sets.plant_dc.len());
    for (i, j, p) in &arc_sets.plant_dc {
        let weight = product_weight(instance, p);
        let tp_cost = costs.tp_cost[&(i.clone(), j.clone())];
        let dc_vc = costs.dc_vc[j];
        let obj = weight * tp_cost + dc_vc;
        let var = add_ctsvar!(model, name: &format!("x_{i}_{j}_{p}"), bounds: 0.0.., obj: obj)
            .map_err(|e| Error::solver(format!("failed to add x[{i},{j},{p}]: {e}")))?;
        x_plant_dc.insert((i.clone(), j.clone(), p.clone()), var);
    }

    let assignment_pairs: HashSet<(DcId, CustomerId)> = arc_sets
        .dc_customer
        .iter()
        .map(|(j, k, _)| (j.clone(), k.clone()))
        .collect();

    let mut z = HashMap::with_capacity(assignment_pairs.len());
    for (j, k) in &assignment_pairs {
        let del_cost = costs.del_cost[&(j.clone(), k.clone())];
        let weighted_cost: f64 = instance
            .products
            .iter()
            .map(|product| {
                let demand = instance
                    .demand
                    .get(&(k.clone(), product.id.clone()))
                    .copied()
                    .unwrap_or(0.0);
                if demand > 0.0 {
                    product.weight as f64 * del_cost * demand
                } else {
                    0.0
                }
            })
            .sum();
        let var = add_binvar!(model, name: &format!("z_{j}_{k}"), obj: weighted_cost)
            .map_err(|e| Error::solver(format!("failed to add z[{j},{k}]: {e}")))?;
        z.insert((j.clone(), k.clone()), var);
    }

    let mut y = HashMap::with_capacity(dc_candidates.len());
    for j in dc_candidates {
        let var = add_binvar!(model, name: &format!("y_{j}"), obj: costs.dc_fc[j])
            .map_err(|e| Error::solver(format!("failed to add y[{j}]: {e}")))?;
        y.insert(j.clone(), var);
    }

    let mut slack = HashMap::new();
    for k in instance.customers.keys() {
        let var = add_ctsvar!(model, name: &format!("slack_{k}"), bounds: 0.0.., obj: SINGLE_SOURCE_SLACK_PENALTY)
            .map_err(|e| Error::solver(format!("failed to add slack[{k}]: {e}")))?;
        slack.insert(k.clone(), var);
    }

    model
        .update()
        .map_err(|e| Error::solver(format!("failed to update model: {e}")))?;

    // Constraint 1: single assignment.
    for (k, slack_var) in &slack {
        let expr: Expr = assignment_pairs
            .iter()
            .filter(|(_, ck)| ck == k)
            .map(|(j, _)| z[&(j.clone(), k.clone())])
            .grb_sum();
        model
            .add_constr(&format!("assign_{k}"), c!(expr + *slack_var == 1.0))
            .map_err(|e| Error::solver(format!("failed to add assignment constraint for {k}: {e}")))?;
    }

    // Constraint 2: DC flow conservation, demand aggregated through z.
    let mut dc_product_pairs: HashSet<(DcId, ProductId)> = HashSet::new();
    for (_, j, p) in &arc_sets.plant_dc {
        dc_product_pairs.insert((j.clone(), p.clone()));
    }
    for j in dc_candidates {
        for product in &instance.products {
            dc_product_pairs.insert((j.clone(), product.id.clone()));
        }
    }
    for (j, p) in &dc_product_pairs {
        let inflow: Expr = arc_sets
            .plant_dc
            .iter()
            .filter(|(_, aj, ap)| aj == j && ap == p)
            .map(|(i, _, _)| x_plant_dc[&(i.clone(), j.clone(), p.clone())])
            .grb_sum();
        let outflow: Expr = assignment_pairs
            .iter()
            .filter(|(aj, _)| aj == j)
            .map(|(_, k)| {
                let demand = instance
                    .demand
                    .get(&(k.clone(), p.clone()))
                    .copied()
                    .unwrap_or(0.0);
                demand * z[&(j.clone(), k.clone())]
            })
            .grb_sum();
        model
            .add_constr(&format!("conserve_{j}_{p}"), c!(inflow == outflow))
            .map_err(|e| Error::solver(format!("failed to add conservation constraint for {j},{p}: {e}")))?;
    }

    // Constraint 3: weak DC activation.
    for (j, k) in &assignment_pairs {
        let z_var = z[&(j.clone(), k.clone())];
        let y_var = y[j];
        model
            .add_constr(&format!("activate_{j}_{k}"), c!(z_var <= y_var))
            .map_err(|e| Error::solver(format!("failed to add activation constraint for {j},{k}: {e}")))?;
    }

    // Constraint 4: DC throughput upper bound.
    for j in dc_candidates {
        let expr: Expr = arc_sets
            .plant_dc
            .iter()
            .filter(|(_, aj, _)| aj == j)
            .map(|(i, _, p)| x_plant_dc[&(i.clone(), j.clone(), p.clone())])
            .grb_sum();
        let ub = instance.dc_ub[j];
        let y_var = y[j];
        model
            .add_constr(&format!("throughput_{j}"), c!(expr <= ub * y_var))
            .map_err(|e| Error::solver(format!("failed to add throughput constraint for {j}: {e}")))?;
    }

    // Plant capacity.
    let mut plant_product_pairs: HashSet<(PlantId, ProductId)> = HashSet::new();
    for (i, _, p) in &arc_sets.plant_dc {
        plant_product_pairs.insert((i.clone(), p.clone()));
    }
    for (i, p) in &plant_product_pairs {
        let expr: Expr = arc_sets
            .plant_dc
            .iter()
            .filter(|(ai, _, ap)| ai == i && ap == p)
            .map(|(_, j, _)| x_plant_dc[&(i.clone(), j.clone(), p.clone())])
            .grb_sum();
        let ub = instance.plant_ub[&(i.clone(), p.clone())];
        model
            .add_constr(&format!("plant_cap_{i}_{p}"), c!(expr <= ub))
            .map_err(|e| Error::solver(format!("failed to add plant capacity constraint for {i},{p}: {e}")))?;
    }

    // Cardinality on opened DCs.
    let open_count: Expr = dc_candidates.iter().map(|j| y[j]).grb_sum();
    model
        .add_constr("dc_num", c!(open_count <= dc_num as f64))
        .map_err(|e| Error::solver(format!("failed to add cardinality constraint: {e}")))?;

    model
        .update()
        .map_err(|e| Error::solver(format!("failed to update model after adding constraints: {e}")))?;

    Ok(MipModel {
        model,
        x_plant_dc,
        dc_customer_vars: DcCustomerVars::SingleSource { z, slack },
        y,
        dc_candidates: dc_candidates.to_vec(),
    })
}

fn product_weight(instance: &Instance, product_id: &ProductId) -> f64 {
    instance
        .products
        .iter()
        .find(|p| &p.id == product_id)
        .map(|p| p.weight as f64)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::{build_costs, CostParams};
    use crate::model::{Location, Product};
    use indexmap::IndexMap;

    fn two_dc_instance() -> Instance {
        Instance {
            name: "t".into(),
            plants: IndexMap::from([("i1".to_string(), Location::new(0.0, 0.0).unwrap())]),
            dcs: IndexMap::from([
                ("j1".to_string(), Location::new(0.0, 1.0).unwrap()),
                ("j2".to_string(), Location::new(0.0, 1.0).unwrap()),
            ]),
            customers: IndexMap::from([("k1".to_string(), Location::new(0.0, 2.0).unwrap())]),
            products: vec![Product { id: "P01".into(), weight: 1 }],
            customer_name: HashMap::new(),
            dc_lb: HashMap::from([("j1".to_string(), 0.0), ("j2".to_string(), 0.0)]),
            dc_ub: HashMap::from([("j1".to_string(), 100.0), ("j2".to_string(), 100.0)]),
            demand: HashMap::from([(("k1".to_string(), "P01".to_string()), 10.0)]),
            plant_ub: HashMap::from([(("i1".to_string(), "P01".to_string()), 100.0)]),
        }
    }

    #[test]
    fn rejects_zero_dc_num() {
        let instance = two_dc_instance();
        let costs = build_costs(&instance, &CostParams::default());
        let dcs: Vec<DcId> = instance.dcs.keys().cloned().collect();
        assert!(build(&instance, &costs, &dcs, 0).is_err());
    }

    // Requires a Gurobi license, like the teacher's own `test_gurobi_solver`.
    #[test]
    #[ignore]
    fn solved_model_assigns_each_customer_to_exactly_one_dc() {
        use crate::solver::{SolverDriver, Variant};

        let instance = two_dc_instance();
        let costs = build_costs(&instance, &CostParams::default());
        let dcs: Vec<DcId> = instance.dcs.keys().cloned().collect();
        let mip = SolverDriver::build(&instance, &costs, Variant::SingleSource, &dcs, 1).unwrap();
        let outcome = SolverDriver::solve(mip, &instance, 30.0).unwrap();

        assert!(outcome.opened_dcs.len() <= 1);

        let serving_dcs: HashSet<&String> = outcome
            .flows
            .iter()
            .filter(|f| f.destination == "k1")
            .map(|f| &f.origin)
            .collect();
        assert_eq!(serving_dcs.len(), 1, "single-source demand must be served by exactly one DC");
    }
}
