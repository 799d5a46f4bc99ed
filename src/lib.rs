//! Logistics Network Design Core
//!
//! A two-stage pipeline for capacitated multi-product facility-location
//! network design: hierarchical pre-clustering of candidate distribution
//! centers followed by a two-echelon multi-commodity MIP.
//!
//! # Pipeline
//!
//! - Geodesic distance oracle (`geo`)
//! - Cost builder (`costs`)
//! - Pre-clusterer (`cluster`)
//! - MIP model builders, multiple- and single-source (`mip`)
//! - Solver driver (`solver`)
//!
//! # Example
//!
//! Requires the `gurobi` feature (see `Cargo.toml`).
//!
//! ```ignore
//! use lnd_solver::costs::{build_costs, CostParams};
//! use lnd_solver::cluster::pre_cluster;
//! use lnd_solver::instance_io::load_instance;
//! use lnd_solver::solver::{SolverDriver, Variant, DEFAULT_TIME_LIMIT_SECS};
//!
//! # fn main() -> lnd_solver::error::Result<()> {
//! let instance = load_instance("instance.json", "demo")?;
//! let costs = build_costs(&instance, &CostParams::default());
//! let dc_candidates = pre_cluster(&instance, 3)?;
//! let mip = SolverDriver::build(&instance, &costs, Variant::MultiSource, &dc_candidates, 1)?;
//! let outcome = SolverDriver::solve(mip, &instance, DEFAULT_TIME_LIMIT_SECS)?;
//! println!("objective: {:.2}", outcome.objective);
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod costs;
pub mod error;
pub mod geo;
pub mod instance_io;
pub mod mip;
pub mod model;
pub mod solver;

pub use error::Error;
pub use model::Instance;
