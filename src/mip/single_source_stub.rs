use crate::costs::CostTables;
use crate::error::{Error, Result};
use crate::model::{DcId, Instance};

/// Stub used when the crate is built without the `gurobi` feature.
pub fn build(_instance: &Instance, _costs: &CostTables, _dc_candidates: &[DcId], _dc_num: u32) -> Result<()> {
    Err(Error::solver("gurobi feature not enabled in this build"))
}
