//! Cell volume growth and division (spec §3, §4.6), grounded on
//! `CellManager.c`'s `Balloon()` (deterministic volume growth plus a
//! binomial partition of every species count at division).

use crate::rng::Rng64;
use crate::species::SpeciesRegistry;

/// Avogadro's number, in the original's convention (6.023e23, not the more
/// precise 6.022e23 — kept for parity with `PromotorDynamics.c`'s
/// `Molec_to_Molar`).
pub const AVOGADRO: f64 = 6.023e23;

/// Volume increment applied on every executed `ChangeCellVolume` reaction,
/// in litres (spec §4.6: `V += 1e-18`).
const VOLUME_STEP: f64 = 1e-18;

#[derive(Debug, Clone)]
pub struct Cell {
    /// Initial volume, used as the division threshold (`V/VI >= 2`).
    pub vi: f64,
    /// Reference volume: the rate-normalisation unit (`V0/V` factors).
    pub v0: f64,
    /// Current volume.
    pub v: f64,
    /// Deterministic growth rate, litres/sec x 1e-18; zero disables both
    /// the `ChangeCellVolume` reaction and division entirely.
    pub growth_rate: f64,
    /// Number of divisions that have fired, for observability.
    pub generations: u64,
}

impl Cell {
    pub fn new(vi: f64, v0: f64, growth_rate: f64) -> Self {
        assert!(vi > 0.0, "initial volume must be positive");
        assert!(v0 > 0.0, "reference volume must be positive");
        Cell { vi, v0, v: vi, growth_rate, generations: 0 }
    }

    /// `V0/V` volume-correction factor used throughout the rate formulas.
    pub fn volume_factor(&self) -> f64 {
        self.v0 / self.v
    }

    /// `V/VI`: used only for the division threshold (`Balloon()` divides
    /// once this reaches 2).
    pub fn volume_ratio(&self) -> f64 {
        self.v / self.vi
    }

    /// `V/V0`: the trace's printed volume column (`Main.c`'s
    /// `EColi->V/EColi->V0` under `RMM_MODS`).
    pub fn v0_ratio(&self) -> f64 {
        self.v / self.v0
    }

    /// Executes a `ChangeCellVolume` reaction (spec §4.6): grow by one step,
    /// then halve and binomially partition every species count if the
    /// doubling threshold has been crossed.
    pub fn grow_and_maybe_divide(&mut self, species: &mut SpeciesRegistry, rng: &mut Rng64) {
        self.v += VOLUME_STEP;

        if self.v / self.vi >= 2.0 {
            self.v /= 2.0;
            self.generations += 1;
            for i in 0..species.len() {
                let n = species.get(i);
                species.set(i, rng.binomial(n, 0.5));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_division_below_threshold() {
        let mut cell = Cell::new(1.0, 1.0, 0.0);
        let mut species = SpeciesRegistry::new();
        species.add("A", 100).unwrap();
        let mut rng = Rng64::new(1);
        cell.v = 1.5;
        cell.grow_and_maybe_divide(&mut species, &mut rng);
        assert_eq!(cell.generations, 0);
        assert_eq!(species.get(2), 100);
    }

    #[test]
    fn volume_ratio_and_v0_ratio_diverge_when_vi_and_v0_differ() {
        let mut cell = Cell::new(2.0, 1.0, 0.0);
        cell.v = 3.0;
        assert_eq!(cell.volume_ratio(), 1.5); // V/VI, division threshold
        assert_eq!(cell.v0_ratio(), 3.0); // V/V0, the trace column
    }

    #[test]
    fn divides_and_halves_volume() {
        let mut cell = Cell::new(1.0, 1.0, 0.0);
        let mut species = SpeciesRegistry::new();
        species.add("A", 100_000).unwrap();
        let mut rng = Rng64::new(2);
        cell.v = 2.0 - 1e-18;
        cell.grow_and_maybe_divide(&mut species, &mut rng);
        assert_eq!(cell.generations, 1);
        assert!(cell.v >= 1.0 && cell.v < 1.1);
        let n = species.get(2);
        assert!(n > 40_000 && n < 60_000);
    }
}
