//! The v2+ (`schema_version >= 2`) engine: the extended engine, which adds
//! support for delayed wiring via synthetic delay instances.

use rand_core::RngCore;

use crate::error::Error;
use crate::instance::RunResult;
use crate::model::Model;

pub fn run<R: RngCore>(
    model: &Model,
    rng: &mut R,
    run_index: u64,
    seed: u64,
) -> Result<RunResult, Error> {
    super::run(model, rng, run_index, seed, true)
}
