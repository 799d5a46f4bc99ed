//! Error taxonomy for the network design core.
//!
//! `InvalidInput` and `SolverError` are the only two error *kinds* — every
//! component validates its own preconditions at entry and fails fast with
//! `InvalidInput`. `TimeLimit` and `Infeasible` are not errors: they are
//! normal solver outcomes carried in [`crate::solver::SolverStatus`].

use thiserror::Error;

/// Errors surfaced by the core pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Parameters that make the request impossible to satisfy: bad `K`,
    /// bad `dc_num`, negative demand, out-of-range coordinates, empty
    /// input sets.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The MIP solver reported a hard failure: rejected model, missing
    /// license, numerical failure. Distinct from `TimeLimit`/`Infeasible`,
    /// which are normal completions.
    #[error("solver error: {0}")]
    SolverError(String),
}

impl Error {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn solver<S: Into<String>>(msg: S) -> Self {
        Error::SolverError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
