//! Samples nonnegative durations (ms) from a [`DurationDist`]. A pure
//! function of `(distribution, rng_state)` — no other state is read or
//! mutated.

use rand_core::RngCore;
use rand_distr::{Distribution, LogNormal, Normal};

use crate::model::DurationDist;

/// Sample a nonnegative duration in milliseconds from `dist` using `rng`.
pub fn sample<R: RngCore>(dist: &DurationDist, rng: &mut R) -> f64 {
    match *dist {
        DurationDist::Fixed { value } => value,
        DurationDist::Normal { mean, std, min } => {
            let raw = if std == 0.0 {
                mean
            } else {
                Normal::new(mean, std).unwrap().sample(rng)
            };
            let clamped = raw.max(0.0);
            match min {
                Some(min) => clamped.max(min),
                None => clamped,
            }
        }
        DurationDist::Lognormal { mu, sigma } => {
            if sigma == 0.0 {
                mu.exp()
            } else {
                LogNormal::new(mu, sigma).unwrap().sample(rng)
            }
        }
    }
}
