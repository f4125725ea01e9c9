//! Shea-Ackers statistical-mechanical operator sampler (spec §4.2),
//! grounded on `PromotorDynamics.c`'s `CalculateAckersProbabilities` /
//! `CalculateAckersState` / `SetAckersState`.

use crate::cell::{Cell, AVOGADRO};
use crate::error::SimError;
use crate::math::binomial_coefficient;
use crate::rng::Rng64;
use crate::species::SpeciesRegistry;

/// `RT` in kcal/mol, at 310.15 K (37 C), matching `PromotorDynamics.c`'s
/// `#define RT (8.314*310.15*kcal_per_joule)`.
const RT_KCAL_PER_MOL: f64 = 8.314 * 310.15 * (0.001 / 4.184);

/// Converts a free-energy difference (kcal/mol) to the Boltzmann weight an
/// [`OperatorConfig`] stores, i.e. `exp(-delta_g / RT)`.
pub fn boltzmann_weight(delta_g_kcal_per_mol: f64) -> f64 {
    (-delta_g_kcal_per_mol / RT_KCAL_PER_MOL).exp()
}

/// One configuration of an operator: a precomputed Boltzmann weight and the
/// compact list of (species, count-bound) pairs it removes from the free
/// pool while active.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub weight: f64,
    pub bound: Vec<(usize, i64)>,
}

impl OperatorConfig {
    pub fn new(weight: f64, bound: Vec<(usize, i64)>) -> Self {
        OperatorConfig { weight, bound }
    }
}

#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub n_sites: usize,
    pub configs: Vec<OperatorConfig>,
    pub current_state: usize,
}

impl Operator {
    pub fn new(name: impl Into<String>, n_sites: usize, configs: Vec<OperatorConfig>) -> Self {
        assert!(!configs.is_empty(), "an operator needs at least one configuration");
        Operator { name: name.into(), n_sites, configs, current_state: 0 }
    }

    pub fn n_configs(&self) -> usize {
        self.configs.len()
    }

    fn release_current(&self, species: &mut SpeciesRegistry) {
        for &(s, k) in &self.configs[self.current_state].bound {
            species.add_to(s, k);
        }
    }

    fn bind(&mut self, state: usize, species: &mut SpeciesRegistry) {
        for &(s, k) in &self.configs[state].bound {
            species.add_to(s, -k);
        }
        self.current_state = state;
    }

    /// Spec §4.2: release the current state's bound species, recompute the
    /// normalized configuration-probability vector from the free-species
    /// pool at the current volume, roulette-sample a new configuration, and
    /// bind its species.
    pub fn resample(&mut self, species: &mut SpeciesRegistry, cell: &Cell, rng: &mut Rng64) {
        self.release_current(species);

        let molar_factor = 1.0 / (AVOGADRO * cell.v);
        let mut weights = vec![0.0; self.configs.len()];
        let mut total = 0.0;
        for (i, config) in self.configs.iter().enumerate() {
            let mut w = config.weight;
            for &(s, k) in &config.bound {
                let n = species.get(s);
                w *= binomial_coefficient(n, k);
                if w == 0.0 {
                    break;
                }
                w *= molar_factor.powi(k as i32);
            }
            weights[i] = w;
            total += w;
        }

        let new_state = if total <= 0.0 {
            // No configuration has nonzero weight (e.g. every bound species
            // is at zero free count): the vacuous state is config 0, as
            // it is for an operator with no free modifiers at all.
            0
        } else {
            let r = rng.uniform_open() * total;
            let mut running = weights[0];
            let mut chosen = 0;
            let mut i = 1;
            while i < weights.len() && running < r {
                if weights[i] > 1e-20 {
                    chosen = i;
                }
                running += weights[i];
                i += 1;
            }
            chosen
        };

        self.bind(new_state, species);
    }

    /// `ChangePromoterState` (spec §4.3): after a transcription initiation
    /// consumes one RNAP from the current configuration, find the unique
    /// configuration with the same (species, count) multiset modulo that
    /// one fewer bound RNAP, and make it current without touching the free
    /// species pool (the RNAP was already taken from the pool by the
    /// allocation that preceded this call).
    pub fn rebind_after_initiation(&mut self) -> Result<(), SimError> {
        let cs = &self.configs[self.current_state];
        let mut target: Vec<(usize, i64)> = cs
            .bound
            .iter()
            .map(|&(s, k)| if s == crate::species::RNAP { (s, k - 1) } else { (s, k) })
            .filter(|&(_, k)| k != 0)
            .collect();
        target.sort_unstable();

        for (i, config) in self.configs.iter().enumerate() {
            let mut candidate = config.bound.clone();
            candidate.sort_unstable();
            if candidate == target {
                self.current_state = i;
                return Ok(());
            }
        }

        Err(SimError::Model(format!(
            "operator '{}': no configuration matches the post-initiation state",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn vacuous_state_with_no_free_species() {
        // A single config bound to a modifier that is always at zero: the
        // sampler should still settle on some state without panicking.
        let mut species = SpeciesRegistry::new();
        let modifier = species.add("TF", 0).unwrap();
        let mut op = Operator::new(
            "O1",
            1,
            vec![
                OperatorConfig::new(1.0, vec![]),
                OperatorConfig::new(1.0, vec![(modifier, 1)]),
            ],
        );
        let cell = Cell::new(1.0, 1.0, 0.0);
        let mut rng = Rng64::new(3);
        for _ in 0..50 {
            op.resample(&mut species, &cell, &mut rng);
        }
        assert_eq!(op.current_state, 0);
    }

    #[test]
    fn rebind_after_initiation_drops_one_rnap() {
        let mut species = SpeciesRegistry::new();
        species.set(crate::species::RNAP, 10);
        let mut op = Operator::new(
            "Op",
            1,
            vec![
                OperatorConfig::new(1.0, vec![]),
                OperatorConfig::new(1.0, vec![(crate::species::RNAP, 1)]),
            ],
        );
        op.current_state = 1;
        op.rebind_after_initiation().unwrap();
        assert_eq!(op.current_state, 0);
    }

    #[test]
    fn rebind_fails_without_matching_configuration() {
        let mut op = Operator::new(
            "Op",
            1,
            vec![OperatorConfig::new(1.0, vec![(crate::species::RNAP, 2)])],
        );
        op.current_state = 0;
        assert!(op.rebind_after_initiation().is_err());
    }
}
