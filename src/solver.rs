//! Solver driver (spec §4.6): builds a variant's MIP, invokes the
//! branch-and-cut solver with a wall-clock budget, and extracts a
//! post-processed [`SolveOutcome`]. Thin supervisor — it neither retries
//! nor transforms the model (spec §5).

use crate::model::{CustomerId, DcId, ProductId};

/// Which DC->customer formulation to build (spec §4.4 vs §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    MultiSource,
    SingleSource,
}

/// Solver outcome status, mirroring spec §7's non-error kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverStatus {
    Optimal,
    TimeLimit,
    Infeasible { unmet: Vec<(CustomerId, ProductId)> },
    Unbounded,
}

/// A flow-assignment record: `(origin, destination, product, value)`
/// (spec §6). `origin` is a plant id for plant->DC arcs and a DC id for
/// DC->customer arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub origin: String,
    pub destination: String,
    pub product: ProductId,
    pub value: f64,
}

/// The post-processed result of one solve (spec §4.6).
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub opened_dcs: Vec<DcId>,
    pub flows: Vec<FlowRecord>,
    pub objective: f64,
    pub status: SolverStatus,
}

/// Time limit default per spec §4.6/§5.
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 300.0;

/// Fixed solver seed so repeated solves of an unchanged model are
/// reproducible as far as Gurobi's own seed guarantee allows (spec §9).
pub const DEFAULT_SOLVER_SEED: i32 = 42;

#[cfg(feature = "gurobi")]
pub use gurobi_driver::SolverDriver;

#[cfg(feature = "gurobi")]
mod gurobi_driver {
    use grb::prelude::*;

    use super::{FlowRecord, SolveOutcome, SolverStatus, Variant};
    use crate::costs::CostTables;
    use crate::error::{Error, Result};
    use crate::mip::{DcCustomerVars, MipModel, EPSILON};
    use crate::model::{DcId, Instance};

    /// Builds and solves one variant's MIP over a clustered DC subset.
    pub struct SolverDriver;

    impl SolverDriver {
        /// Build the chosen variant's model (spec §4.6's `build`).
        pub fn build(
            instance: &Instance,
            costs: &CostTables,
            variant: Variant,
            dc_candidates: &[DcId],
            dc_num: u32,
        ) -> Result<MipModel> {
            match variant {
                Variant::MultiSource => crate::mip::multi_source::build(instance, costs, dc_candidates, dc_num),
                Variant::SingleSource => crate::mip::single_source::build(instance, costs, dc_candidates, dc_num),
            }
        }

        /// Solve a built model with the given wall-clock budget in seconds
        /// (spec §4.6's `solve`). Never retries or mutates the model.
        pub fn solve(mut mip: MipModel, instance: &Instance, time_limit_secs: f64) -> Result<SolveOutcome> {
            mip.model
                .set_param(param::TimeLimit, time_limit_secs)
                .map_err(|e| Error::solver(format!("failed to set time limit: {e}")))?;
            mip.model
                .set_param(param::OutputFlag, 0)
                .map_err(|e| Error::solver(format!("failed to set output flag: {e}")))?;
            mip.model
                .set_param(param::Seed, super::DEFAULT_SOLVER_SEED)
                .map_err(|e| Error::solver(format!("failed to set seed: {e}")))?;

            mip.model
                .optimize()
                .map_err(|e| Error::solver(format!("optimization failed: {e}")))?;

            let status = mip
                .model
                .status()
                .map_err(|e| Error::solver(format!("failed to read solver status: {e}")))?;

            match status {
                Status::Optimal | Status::TimeLimit | Status::SolutionLimit => {
                    extract_outcome(&mip, instance, status)
                }
                Status::Infeasible | Status::InfOrUnbd => Ok(SolveOutcome {
                    opened_dcs: Vec::new(),
                    flows: Vec::new(),
                    objective: f64::INFINITY,
                    status: SolverStatus::Infeasible { unmet: Vec::new() },
                }),
                Status::Unbounded => Ok(SolveOutcome {
                    opened_dcs: Vec::new(),
                    flows: Vec::new(),
                    objective: f64::NEG_INFINITY,
                    status: SolverStatus::Unbounded,
                }),
                other => Err(Error::solver(format!("unexpected solver status: {other:?}"))),
            }
        }
    }

    fn extract_outcome(mip: &MipModel, instance: &Instance, status: Status) -> Result<SolveOutcome> {
        let objective = mip
            .model
            .get_attr(attr::ObjVal)
            .map_err(|e| Error::solver(format!("failed to read objective: {e}")))?;

        let mut opened_dcs: Vec<DcId> = Vec::new();
        for (j, var) in &mip.y {
            let value: f64 = mip
                .model
                .get_obj_attr(attr::X, var)
                .map_err(|e| Error::solver(format!("failed to read y[{j}]: {e}")))?;
            if value > 0.5 {
                opened_dcs.push(j.clone());
            }
        }
        opened_dcs.sort();

        let mut flows = Vec::new();
        for ((i, j, p), var) in &mip.x_plant_dc {
            let value: f64 = mip
                .model
                .get_obj_attr(attr::X, var)
                .map_err(|e| Error::solver(format!("failed to read x[{i},{j},{p}]: {e}")))?;
            if value > EPSILON {
                flows.push(FlowRecord {
                    origin: i.clone(),
                    destination: j.clone(),
                    product: p.clone(),
                    value,
                });
            }
        }

        let mut unmet = Vec::new();
        match &mip.dc_customer_vars {
            DcCustomerVars::MultiSource { x, slack } => {
                for ((j, k, p), var) in x {
                    let value: f64 = mip
                        .model
                        .get_obj_attr(attr::X, var)
                        .map_err(|e| Error::solver(format!("failed to read x[{j},{k},{p}]: {e}")))?;
                    if value > EPSILON {
                        flows.push(FlowRecord {
                            origin: j.clone(),
                            destination: k.clone(),
                            product: p.clone(),
                            value,
                        });
                    }
                }
                for ((k, p), var) in slack {
                    let value: f64 = mip
                        .model
                        .get_obj_attr(attr::X, var)
                        .map_err(|e| Error::solver(format!("failed to read slack[{k},{p}]: {e}")))?;
                    if value > EPSILON {
                        unmet.push((k.clone(), p.clone()));
                    }
                }
            }
            DcCustomerVars::SingleSource { z, slack } => {
                for ((j, k), var) in z {
                    let value: f64 = mip
                        .model
                        .get_obj_attr(attr::X, var)
                        .map_err(|e| Error::solver(format!("failed to read z[{j},{k}]: {e}")))?;
                    if value > 0.5 {
                        for product in &instance.products {
                            let demand = instance
                                .demand
                                .get(&(k.clone(), product.id.clone()))
                                .copied()
                                .unwrap_or(0.0);
                            if demand > EPSILON {
                                flows.push(FlowRecord {
                                    origin: j.clone(),
                                    destination: k.clone(),
                                    product: product.id.clone(),
                                    value: demand,
                                });
                            }
                        }
                    }
                }
                for (k, var) in slack {
                    let value: f64 = mip
                        .model
                        .get_obj_attr(attr::X, var)
                        .map_err(|e| Error::solver(format!("failed to read slack[{k}]: {e}")))?;
                    if value > EPSILON {
                        for product in &instance.products {
                            if instance
                                .demand
                                .get(&(k.clone(), product.id.clone()))
                                .copied()
                                .unwrap_or(0.0)
                                > 0.0
                            {
                                unmet.push((k.clone(), product.id.clone()));
                            }
                        }
                    }
                }
            }
        }

        let status_kind = if status == Status::TimeLimit {
            SolverStatus::TimeLimit
        } else if !unmet.is_empty() {
            SolverStatus::Infeasible { unmet }
        } else {
            SolverStatus::Optimal
        };

        Ok(SolveOutcome { opened_dcs, flows, objective, status: status_kind })
    }
}

#[cfg(not(feature = "gurobi"))]
pub use stub_driver::SolverDriver;

#[cfg(not(feature = "gurobi"))]
mod stub_driver {
    use super::Variant;
    use crate::costs::CostTables;
    use crate::error::{Error, Result};
    use crate::model::{DcId, Instance};

    pub struct SolverDriver;

    impl SolverDriver {
        pub fn build(
            _instance: &Instance,
            _costs: &CostTables,
            _variant: Variant,
            _dc_candidates: &[DcId],
            _dc_num: u32,
        ) -> Result<()> {
            Err(Error::solver("gurobi feature not enabled in this build"))
        }

        pub fn solve(_mip: (), _instance: &Instance, _time_limit_secs: f64) -> Result<super::SolveOutcome> {
            Err(Error::solver("gurobi feature not enabled in this build"))
        }
    }
}
