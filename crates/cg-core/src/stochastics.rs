//! Random sampling collaborator.
//!
//! Plugins and the profile samplers draw every random number through the
//! [`Stochastics`] trait so that a run is reproducible from its seed.  The
//! framework implementation, [`SimStochastics`], wraps a `SmallRng` that is
//! re-seeded at the start of every invocation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Random sampling primitives.
///
/// Methods take `&self` because one instance is shared by every component
/// of an invocation; implementations synchronise internally.
pub trait Stochastics: Send + Sync {
    /// Re-seed the generator.
    fn init_generator(&self, seed: u64);

    /// Uniform draw in `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64;

    /// Normal draw with the given mean and standard deviation.
    fn normal(&self, mean: f64, std_dev: f64) -> f64;

    /// Exponential draw with rate `lambda`.
    fn exponential(&self, lambda: f64) -> f64;

    /// The seed most recently passed to [`init_generator`](Self::init_generator).
    fn seed(&self) -> u64;
}

struct State {
    rng:  SmallRng,
    seed: u64,
}

/// Default [`Stochastics`] backed by a seeded `SmallRng`.
pub struct SimStochastics(Mutex<State>);

impl SimStochastics {
    pub fn new(seed: u64) -> Self {
        SimStochastics(Mutex::new(State {
            rng: SmallRng::seed_from_u64(seed ^ MIXING_CONSTANT),
            seed,
        }))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves the rng in a valid state.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Stochastics for SimStochastics {
    fn init_generator(&self, seed: u64) {
        let mut state = self.state();
        state.rng = SmallRng::seed_from_u64(seed ^ MIXING_CONSTANT);
        state.seed = seed;
    }

    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.state().rng.gen_range(low..high)
    }

    fn normal(&self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        // Box-Muller transform; u1 is kept away from 0 to avoid ln(0).
        let mut state = self.state();
        let u1: f64 = state.rng.r#gen::<f64>().max(1e-12);
        let u2: f64 = state.rng.r#gen();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }

    fn exponential(&self, lambda: f64) -> f64 {
        if lambda <= 0.0 {
            return f64::INFINITY;
        }
        let u: f64 = self.state().rng.r#gen::<f64>().max(1e-12);
        -u.ln() / lambda
    }

    fn seed(&self) -> u64 {
        self.state().seed
    }
}
