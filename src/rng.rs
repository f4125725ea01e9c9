//! Seedable uniform draws and binomial deviates used throughout the engine.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution, Exp1};

/// Clamp against `log(0)` in the Gillespie time-increment formula (spec §4.1).
const EPSILON: f64 = 1e-16;

/// Thin wrapper around [`SmallRng`] that only exposes the draws the engine
/// needs, so call sites read as "what quantity do I want" rather than
/// "which distribution object do I reach for".
#[derive(Clone, Debug)]
pub struct Rng64 {
    inner: SmallRng,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Rng64 { inner: SmallRng::seed_from_u64(seed) }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.inner = SmallRng::seed_from_u64(seed);
    }

    /// A uniform draw in `(0, 1]`, as required by the Gillespie clock and
    /// the Shea-Ackers roulette sampler.
    pub fn uniform_open(&mut self) -> f64 {
        (1.0 - self.inner.gen::<f64>()).max(EPSILON)
    }

    /// The standard exponential draw used for the Gillespie time increment
    /// when callers want `Exp1` directly rather than the `-ln(r)/a0` form.
    pub fn exp1(&mut self) -> f64 {
        self.inner.sample(Exp1)
    }

    /// `ε`-clamped natural log of a `(0,1]` draw, matching spec §4.1's
    /// `-ln(max(r1, ε))` exactly (kept distinct from `exp1` because the
    /// spec's tolerance clamp is on the *input* to the log, not on the
    /// sampled exponential itself).
    pub fn neg_log_uniform(&mut self) -> f64 {
        let r = self.inner.gen::<f64>();
        -(r.max(EPSILON)).ln()
    }

    /// Binomial(n, p) deviate, used by cell division to partition species
    /// counts (spec §4.6). `n` is a non-negative molecule count.
    pub fn binomial(&mut self, n: i64, p: f64) -> i64 {
        if n <= 0 {
            return 0;
        }
        if !(0.0..=1.0).contains(&p) {
            return 0;
        }
        let dist = Binomial::new(n as u64, p).expect("p is in [0, 1]");
        dist.sample(&mut self.inner) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_open_is_in_range() {
        let mut rng = Rng64::new(42);
        for _ in 0..10_000 {
            let r = rng.uniform_open();
            assert!(r > 0.0 && r <= 1.0);
        }
    }

    #[test]
    fn binomial_conserves_mass_on_average() {
        let mut rng = Rng64::new(7);
        let n = 100_000;
        let mut total = 0i64;
        let trials = 200;
        for _ in 0..trials {
            total += rng.binomial(n, 0.5);
        }
        let mean = total as f64 / trials as f64;
        assert!((mean - n as f64 / 2.0).abs() < n as f64 * 0.01);
    }

    #[test]
    fn binomial_zero_is_zero() {
        let mut rng = Rng64::new(1);
        assert_eq!(rng.binomial(0, 0.5), 0);
    }
}
