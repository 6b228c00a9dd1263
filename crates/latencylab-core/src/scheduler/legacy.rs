//! The v1 (`schema_version == 1`) engine.
//!
//! Schema v1 models never carry delayed wiring edges; validation upstream
//! is responsible for rejecting any that do. Gated behind the `legacy`
//! feature: hosts that cannot provide this engine get a clear
//! [`Error::LegacyUnavailable`] rather than a silent fallback to the
//! extended engine.

use rand_core::RngCore;

use crate::error::Error;
use crate::instance::RunResult;
use crate::model::Model;

#[cfg(feature = "legacy")]
pub fn run<R: RngCore>(
    model: &Model,
    rng: &mut R,
    run_index: u64,
    seed: u64,
) -> Result<RunResult, Error> {
    super::run(model, rng, run_index, seed, false)
}

#[cfg(not(feature = "legacy"))]
pub fn run<R: RngCore>(
    _model: &Model,
    _rng: &mut R,
    _run_index: u64,
    _seed: u64,
) -> Result<RunResult, Error> {
    Err(Error::LegacyUnavailable)
}
