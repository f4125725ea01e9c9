//! Mass-action reaction submitter (spec §4.5), grounded on `Kinetics.c`'s
//! `SubmitKineticReactions` / `ExecuteKineticReaction`: propensity from a
//! rate constant and a falling-factorial combinatorial factor per reactant,
//! corrected for the cell's volume via `(V0/V)^(order-1)`.

use crate::math::binomial_coefficient;
use crate::reaction::Reaction;
use crate::world::World;

/// A single mass-action reaction: a rate constant, the reactant species with
/// their stoichiometric coefficients, and the net (product - reactant)
/// change applied on execution.
#[derive(Debug, Clone)]
pub struct MassActionReaction {
    pub name: Option<String>,
    pub rate: f64,
    pub reactants: Vec<(usize, i64)>,
    pub deltas: Vec<(usize, i64)>,
}

fn propensity(world: &World, reaction: &MassActionReaction) -> f64 {
    let mut weight = reaction.rate;
    let mut order: i64 = 0;
    for &(species, coeff) in &reaction.reactants {
        weight *= binomial_coefficient(world.species.get(species), coeff);
        order += coeff;
        if weight == 0.0 {
            return 0.0;
        }
    }
    if order != 1 {
        // Zeroth order (order == 0) gives exponent -1, i.e. a V/V0 scale-up;
        // every other order is scaled down by V0/V per extra reactant.
        weight *= world.cell.volume_factor().powi((order - 1) as i32);
    }
    weight
}

pub(crate) fn submit_mass_action(world: &mut World) {
    for i in 0..world.mass_action.len() {
        let weight = propensity(world, &world.mass_action[i]);
        if weight != 0.0 {
            world.queue.submit(Reaction::Kinetic { index: i }, weight);
        }
    }
}

pub(crate) fn execute_mass_action(world: &mut World, index: usize) {
    let deltas = world.mass_action[index].deltas.clone();
    for (species, delta) in deltas {
        world.species.add_to(species, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::rng::Rng64;
    use crate::species::SpeciesRegistry;

    fn bare_world() -> World {
        World::new_for_test(Rng64::new(1), SpeciesRegistry::new(), Cell::new(1.0, 1.0, 0.0))
    }

    #[test]
    fn zeroth_order_scales_by_v_over_v0() {
        let mut world = bare_world();
        world.cell.v = 2.0;
        let r = MassActionReaction { name: None, rate: 5.0, reactants: vec![], deltas: vec![] };
        assert!((propensity(&world, &r) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn first_order_has_no_volume_correction() {
        let mut world = bare_world();
        world.cell.v = 2.0;
        let a = world.species.add("A", 50).unwrap();
        let r = MassActionReaction { name: None, rate: 1.0, reactants: vec![(a, 1)], deltas: vec![] };
        assert!((propensity(&world, &r) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn insufficient_reactant_count_gives_zero_propensity() {
        let mut world = bare_world();
        let a = world.species.add("A", 1).unwrap();
        let r = MassActionReaction { name: None, rate: 1.0, reactants: vec![(a, 2)], deltas: vec![] };
        assert_eq!(propensity(&world, &r), 0.0);
    }
}
