//! The simulation world: owns every species, operator, DNA sequence, and
//! in-flight transcript/ribosome/RNAP, and drives the Gillespie tick loop
//! (spec §4.7, §6), grounded on `Main.c`'s driver loop and the builder-style
//! public API of `rebop`'s `Gillespie`.

use crate::arena::Arena;
use crate::cell::Cell;
use crate::dna::{self, Rnap, Segment, Sequence, SegmentKind};
use crate::error::SimError;
use crate::ids::TranscriptId;
use crate::kinetics::{self, MassActionReaction};
use crate::operator::{Operator, OperatorConfig};
use crate::reaction::{Reaction, ReactionQueue};
use crate::rng::Rng64;
use crate::species::SpeciesRegistry;
use crate::trace::TraceWriter;
use crate::translation::{self, Ribosome, Transcript};
use std::io::Write;

/// Global per-event rates that are not tied to a specific segment or
/// operator (spec §4.3: polymerase motion, collision escape/failure;
/// §4.4: ribosome motion). Matches `Main.c`'s module-level
/// `Rate_Of_*` globals.
#[derive(Debug, Clone)]
pub struct Rates {
    pub polymerase_motion: f64,
    pub collision_escape: f64,
    pub collision_failure: f64,
    pub ribosome_motion: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Rates { polymerase_motion: 30.0, collision_escape: 5.0, collision_failure: 30.0, ribosome_motion: 100.0 }
    }
}

pub struct World {
    pub(crate) species: SpeciesRegistry,
    pub(crate) cell: Cell,
    pub(crate) operators: Vec<Operator>,
    pub(crate) sequences: Vec<Sequence>,
    pub(crate) rnaps: Arena<Rnap>,
    pub(crate) transcripts: Arena<Transcript>,
    pub(crate) free_transcripts: Vec<TranscriptId>,
    pub(crate) ribosomes: Arena<Ribosome>,
    pub(crate) mass_action: Vec<MassActionReaction>,
    pub(crate) queue: ReactionQueue,
    pub(crate) rng: Rng64,
    pub(crate) rates: Rates,
    pub(crate) time: f64,
    /// spec §9 open question 3: collision escape is off by default.
    pub(crate) collision_escape_enabled: bool,
    /// spec §6: suppresses `ChangeCellVolume` submission entirely, for runs
    /// that want pure reaction-network dynamics at a fixed volume.
    pub(crate) single_cell: bool,
}

impl World {
    pub fn new(seed: u64, vi: f64, v0: f64, growth_rate: f64) -> Self {
        World {
            species: SpeciesRegistry::new(),
            cell: Cell::new(vi, v0, growth_rate),
            operators: Vec::new(),
            sequences: Vec::new(),
            rnaps: Arena::new(),
            transcripts: Arena::new(),
            free_transcripts: Vec::new(),
            ribosomes: Arena::new(),
            mass_action: Vec::new(),
            queue: ReactionQueue::new(),
            rng: Rng64::new(seed),
            rates: Rates::default(),
            time: 0.0,
            collision_escape_enabled: false,
            single_cell: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(rng: Rng64, species: SpeciesRegistry, cell: Cell) -> Self {
        World {
            species,
            cell,
            operators: Vec::new(),
            sequences: Vec::new(),
            rnaps: Arena::new(),
            transcripts: Arena::new(),
            free_transcripts: Vec::new(),
            ribosomes: Arena::new(),
            mass_action: Vec::new(),
            queue: ReactionQueue::new(),
            rng,
            rates: Rates::default(),
            time: 0.0,
            collision_escape_enabled: false,
            single_cell: false,
        }
    }

    pub fn with_collision_escape(mut self, enabled: bool) -> Self {
        self.collision_escape_enabled = enabled;
        self
    }

    pub fn with_single_cell(mut self, enabled: bool) -> Self {
        self.single_cell = enabled;
        self
    }

    pub fn with_rates(mut self, rates: Rates) -> Self {
        self.rates = rates;
        self
    }

    pub fn add_species(&mut self, name: impl Into<String>, initial: i64) -> Result<usize, SimError> {
        self.species.add(name, initial)
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.index_of(name)
    }

    pub fn species_count(&self, index: usize) -> i64 {
        self.species.get(index)
    }

    /// Overrides a species' current count, e.g. to seed the reserved `RNAP`
    /// and `Ribosome` pools away from their zero default.
    pub fn set_species_count(&mut self, index: usize, value: i64) {
        self.species.set(index, value);
    }

    pub fn add_operator(&mut self, name: impl Into<String>, n_sites: usize, configs: Vec<OperatorConfig>) -> usize {
        self.operators.push(Operator::new(name, n_sites, configs));
        self.operators.len() - 1
    }

    /// Adds `copies` identical copies of a sequence (multiplicity of
    /// infection); returns the indices of the created sequences.
    pub fn add_sequence(&mut self, segments: Vec<Segment>, copies: u32) -> Vec<usize> {
        let mut created = Vec::new();
        for _ in 0..copies.max(1) {
            self.sequences.push(Sequence { segments: segments.clone() });
            created.push(self.sequences.len() - 1);
        }
        created
    }

    /// Builds a mass-action reaction from sparse reactant/product
    /// stoichiometries and stores the net per-species delta, mirroring
    /// `rebop`'s `add_reaction`.
    pub fn add_reaction(
        &mut self,
        name: Option<&str>,
        rate: f64,
        reactants: &[(usize, i64)],
        products: &[(usize, i64)],
    ) -> usize {
        use std::collections::BTreeMap;
        let mut delta: BTreeMap<usize, i64> = BTreeMap::new();
        for &(s, k) in reactants {
            *delta.entry(s).or_insert(0) -= k;
        }
        for &(s, k) in products {
            *delta.entry(s).or_insert(0) += k;
        }
        let deltas: Vec<(usize, i64)> = delta.into_iter().filter(|&(_, d)| d != 0).collect();
        self.mass_action.push(MassActionReaction {
            name: name.map(str::to_owned),
            rate,
            reactants: reactants.to_vec(),
            deltas,
        });
        self.mass_action.len() - 1
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn nb_operators(&self) -> usize {
        self.operators.len()
    }

    pub fn nb_promoters(&self) -> usize {
        self.sequences
            .iter()
            .flat_map(|s| s.segments.iter())
            .filter(|seg| matches!(seg.kind, SegmentKind::Promoter(_)))
            .count()
    }

    /// Segment name and cumulative transcription-initiation count for every
    /// promoter, in sequence-then-segment order (spec §4.12, ported from
    /// the original's `RMM_MODS`/`PROMOTOR.RNAPCount` trace column).
    pub fn promoter_rnap_counts(&self) -> Vec<(String, u64)> {
        self.sequences
            .iter()
            .flat_map(|s| s.segments.iter())
            .filter_map(|seg| match &seg.kind {
                SegmentKind::Promoter(p) => Some((seg.name.clone(), p.rnap_count)),
                _ => None,
            })
            .collect()
    }

    fn operator_states(&self) -> Vec<usize> {
        self.operators.iter().map(|o| o.current_state).collect()
    }

    fn resample_operators(&mut self) {
        let n = self.operators.len();
        if n == 0 {
            return;
        }
        let start = ((self.rng.uniform_open() * n as f64) as usize).min(n - 1);
        for k in 0..n {
            let idx = (start + k) % n;
            self.operators[idx].resample(&mut self.species, &self.cell, &mut self.rng);
        }
    }

    /// One tick's submission phase: resample operators in a random
    /// rotation, then submit every DNA/translation/kinetic/cell-volume
    /// reaction that is currently possible.
    fn submit_all(&mut self) {
        self.queue.drain();
        self.resample_operators();
        dna::submit_polymerization(self);
        translation::submit_polymerize_ribosomes(self);
        kinetics::submit_mass_action(self);
        if self.cell.growth_rate > 0.0 && !self.single_cell {
            self.queue.submit(Reaction::ChangeCellVolume, self.cell.growth_rate);
        }
    }

    fn execute(&mut self, reaction: Reaction) -> Result<(), SimError> {
        use crate::reaction::DnaAction;
        match reaction {
            Reaction::Kinetic { index } => {
                kinetics::execute_mass_action(self, index);
                Ok(())
            }
            Reaction::TransInit { promoter } => dna::execute_trans_init(self, promoter),
            Reaction::MoveRNAP { segment, rnap } => {
                dna::apply_move(self, segment, rnap);
                Ok(())
            }
            Reaction::DNAAction { segment, rnap, action } => match action {
                DnaAction::FallOff => {
                    dna::execute_falls_off(self, segment, rnap);
                    Ok(())
                }
                DnaAction::PassThrough => dna::execute_next_segment(self, segment, rnap),
                DnaAction::AntiTerminateBind => dna::execute_antiterminate_bind(self, segment, rnap),
                DnaAction::AntiTerminateUnbind => dna::execute_antiterminate_unbind(self, segment, rnap),
            },
            Reaction::NextSegment { segment, rnap } => dna::execute_next_segment(self, segment, rnap),
            Reaction::EatmRNA { transcript } => {
                translation::execute_eat_mrna(self, transcript);
                Ok(())
            }
            Reaction::MoveRibosome { ribosome, .. } => {
                translation::execute_move_ribosome(self, ribosome);
                Ok(())
            }
            Reaction::ProduceProtein { .. } => {
                Err(SimError::Engine("ProduceProtein is never submitted and should never fire".into()))
            }
            Reaction::ProduceNewProtein { transcript, ribosome } => {
                translation::execute_produce_new_protein(self, transcript, ribosome)
            }
            Reaction::RnapRnap { segment, rnap } => {
                dna::execute_falls_off(self, segment, rnap);
                Ok(())
            }
            Reaction::BindRibosome { transcript } => {
                translation::execute_bind_ribosome(self, transcript);
                Ok(())
            }
            Reaction::ChangeCellVolume => {
                self.cell.grow_and_maybe_divide(&mut self.species, &mut self.rng);
                Ok(())
            }
        }
    }

    /// Runs the Gillespie loop from the current time up to `max_time`,
    /// writing a trace row every `print_interval` (spec §4.7, §6),
    /// grounded on `Main.c`'s `main()` loop.
    pub fn run<W: Write>(
        &mut self,
        max_time: f64,
        print_interval: f64,
        mut trace: Option<&mut TraceWriter<W>>,
    ) -> Result<(), SimError> {
        if let Some(t) = trace.as_deref_mut() {
            self.write_row(t, self.time, 0, 0.0)?;
        }

        let mut write_time = self.time + print_interval;
        let mut reaction_count: u64 = 0;
        let mut queue_len_sum: u64 = 0;

        loop {
            self.submit_all();
            if self.queue.total_probability() <= 0.0 {
                break;
            }

            let (index, tau) = self.queue.select(&mut self.rng)?;
            if self.time + tau > max_time {
                break;
            }

            while self.time + tau > write_time {
                let rpq = average(queue_len_sum, reaction_count);
                if let Some(t) = trace.as_deref_mut() {
                    self.write_row(t, write_time, reaction_count, rpq)?;
                }
                write_time += print_interval;
                reaction_count = 0;
                queue_len_sum = 0;
            }

            queue_len_sum += self.queue.len() as u64;
            let reaction = self.queue.reaction_at(index);
            self.execute(reaction)?;
            reaction_count += 1;
            self.time += tau;
        }

        while self.time < max_time {
            let rpq = average(queue_len_sum, reaction_count);
            if let Some(t) = trace.as_deref_mut() {
                self.write_row(t, write_time, reaction_count, rpq)?;
            }
            write_time += print_interval;
            reaction_count = 0;
            queue_len_sum = 0;
            self.time += print_interval;
        }
        let rpq = average(queue_len_sum, reaction_count);
        if let Some(t) = trace.as_deref_mut() {
            self.write_row(t, write_time, reaction_count, rpq)?;
        }

        Ok(())
    }

    fn write_row<W: Write>(
        &self,
        trace: &mut TraceWriter<W>,
        time: f64,
        reaction_count: u64,
        rpq: f64,
    ) -> Result<(), SimError> {
        trace
            .write_row(
                self.species.names(),
                time,
                reaction_count,
                rpq,
                self.species.counts(),
                self.cell.v0_ratio(),
                &self.operator_states(),
            )
            .map_err(|e| SimError::Engine(format!("trace write failed: {e}")))
    }

    /// Spec §8 testable property 3: no two same-direction RNAPs on a
    /// segment are closer than the footprint.
    pub fn check_rnap_spacing(&self) -> Result<(), SimError> {
        dna::check_rnap_spacing(self)
    }

    /// Spec §8 testable property 1: every species count stays non-negative.
    pub fn check_species_nonnegative(&self) -> Result<(), SimError> {
        if self.species.all_nonnegative() {
            Ok(())
        } else {
            Err(SimError::Engine("a species count went negative".into()))
        }
    }
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_mass_action_conserves_total_count() {
        let mut world = World::new(1, 1.0, 1.0, 0.0).with_single_cell(true);
        let a = world.add_species("A", 1000).unwrap();
        let b = world.add_species("B", 0).unwrap();
        world.add_reaction(Some("A->B"), 2.0, &[(a, 1)], &[(b, 1)]);
        world.add_reaction(Some("B->A"), 1.0, &[(b, 1)], &[(a, 1)]);

        world.run::<std::io::Sink>(50.0, 10.0, None).unwrap();

        assert_eq!(world.species_count(a) + world.species_count(b), 1000);
    }

    #[test]
    fn single_cell_suppresses_volume_change_even_with_growth_rate() {
        let mut world = World::new(3, 1.0, 1.0, 1e-4).with_single_cell(true);
        world.add_species("A", 10).unwrap();
        world.run::<std::io::Sink>(100.0, 10.0, None).unwrap();
        assert_eq!(world.cell().v, world.cell().vi, "single_cell must keep the volume fixed");
        assert_eq!(world.cell().generations, 0);
    }

    #[test]
    fn no_reactions_halts_immediately_without_error() {
        let mut world = World::new(2, 1.0, 1.0, 0.0).with_single_cell(true);
        world.add_species("A", 10).unwrap();
        world.run::<std::io::Sink>(10.0, 5.0, None).unwrap();
        assert!(world.time() <= 10.0);
    }
}
