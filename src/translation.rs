//! Ribosome/translation engine (spec §3, §4.4), grounded on
//! `SegmentDynamics.c`'s ribosome half of `MoveRNAPs`/`Polymerize`
//! (`SubmitClearRBS`, `SubmitMoveRibosome`, `SubmitProduceProtein`,
//! `BindRibosome`, `EatmRNA`, `SimpleRibosomeMover`, `ProduceNewProtein`).

use crate::error::SimError;
use crate::ids::{RibosomeId, SegmentRef, TranscriptId};
use crate::reaction::Reaction;
use crate::species::RIBOSOME;
use crate::world::World;

/// Ribosome footprint, in nucleotides.
pub const RIBOSOME_FOOTPRINT: i64 = 10;
/// A transcript shorter than this is never translated.
const MIN_TRANSLATABLE_LENGTH: i64 = 20;
/// The RBS is considered clear of the lead ribosome once it has moved past
/// this position.
const RBS_CLEARANCE_POSITION: i64 = 14;
/// A ribosome may not approach closer than this to the tethering RNAP.
const RNAP_ABUTMENT_MARGIN: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbsState {
    Intact,
    Chewed,
    AntiSensed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKind {
    Sense,
    AntiSense,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    /// The coding segment this transcript was produced from.
    pub gene: SegmentRef,
    /// `Some` while still tethered to the producing RNAP.
    pub rnap: Option<crate::ids::RnapId>,
    pub rbs_state: RbsState,
    pub current_length: i64,
    pub kind: TranscriptKind,
    /// Ascending by position: index 0 is nearest the RBS, the last entry is
    /// nearest the full-length end (mirrors "RiboQueues are always in
    /// order").
    pub ribosome_queue: Vec<RibosomeId>,
}

#[derive(Debug, Clone)]
pub struct Ribosome {
    pub position: i64,
    pub bound_modifiers: Vec<usize>,
}

enum Outcome {
    Kept,
    Removed,
}

/// Entry point for the translation half of one tick's submission phase
/// (spec §4.4): walk every sense transcript, tethered or free, submitting
/// RBS-clearance and ribosome-motion reactions; garbage-collect spent free
/// transcripts along the way.
pub(crate) fn submit_polymerize_ribosomes(world: &mut World) {
    for seq in 0..world.sequences.len() {
        for seg in 0..world.sequences[seq].segments.len() {
            let r = SegmentRef::new(seq, seg);
            if !crate::dna::is_coding_segment(world, r) {
                continue;
            }
            let rnaps = crate::dna::rnap_queue_of(world, r);
            for rnap_id in rnaps {
                if let Some(tid) = world.rnaps.get(rnap_id).transcript {
                    if world.transcripts.get(tid).kind == TranscriptKind::Sense {
                        submit_for_transcript(world, tid);
                    }
                }
            }
        }
    }

    let free_ids = world.free_transcripts.clone();
    let mut removed = Vec::new();
    for tid in free_ids {
        if let Outcome::Removed = submit_for_transcript(world, tid) {
            removed.push(tid);
        }
    }
    if !removed.is_empty() {
        world.free_transcripts.retain(|tid| !removed.contains(tid));
    }
}

fn submit_for_transcript(world: &mut World, tid: TranscriptId) -> Outcome {
    let t = world.transcripts.get(tid);
    if t.kind == TranscriptKind::AntiSense || t.current_length < MIN_TRANSLATABLE_LENGTH {
        return Outcome::Kept;
    }

    let is_free = t.rnap.is_none();
    let chewed = t.rbs_state == RbsState::Chewed;
    let queue_empty = t.ribosome_queue.is_empty();
    if is_free && chewed && queue_empty {
        world.transcripts.remove(tid);
        return Outcome::Removed;
    }

    let head_clear = t
        .ribosome_queue
        .first()
        .map_or(true, |&id| world.ribosomes.get(id).position > RBS_CLEARANCE_POSITION);
    if t.rbs_state != RbsState::Chewed && head_clear {
        submit_clear_rbs(world, tid);
    }

    let t = world.transcripts.get(tid);
    let full_length = crate::dna::segment_length(world, t.gene);
    let current_length = t.current_length;
    let queue = t.ribosome_queue.clone();

    for (i, &rib_id) in queue.iter().enumerate() {
        let position = world.ribosomes.get(rib_id).position;
        let clear_ahead = match queue.get(i + 1) {
            None => true,
            Some(&ahead) => world.ribosomes.get(ahead).position - position >= RIBOSOME_FOOTPRINT,
        };
        if !clear_ahead {
            continue;
        }

        if current_length < full_length {
            if position < current_length - RNAP_ABUTMENT_MARGIN {
                submit_move_ribosome(world, tid, rib_id);
            }
        } else if position == full_length {
            submit_produce_protein(world, tid, rib_id);
        } else {
            submit_move_ribosome(world, tid, rib_id);
        }
    }

    Outcome::Kept
}

fn submit_clear_rbs(world: &mut World, tid: TranscriptId) {
    let gene = world.transcripts.get(tid).gene;
    let (degradation_rate, binding_rate) = crate::dna::coding_rates(world, gene);
    let ribosome_conc = world.species.get(RIBOSOME) as f64;
    let bind_weight = binding_rate * ribosome_conc * world.cell.volume_factor();
    if bind_weight != 0.0 {
        world.queue.submit(Reaction::BindRibosome { transcript: tid }, bind_weight);
    }
    if degradation_rate != 0.0 {
        world.queue.submit(Reaction::EatmRNA { transcript: tid }, degradation_rate);
    }
}

fn submit_move_ribosome(world: &mut World, tid: TranscriptId, ribosome: RibosomeId) {
    world.queue.submit(Reaction::MoveRibosome { transcript: tid, ribosome }, world.rates.ribosome_motion);
}

fn submit_produce_protein(world: &mut World, tid: TranscriptId, ribosome: RibosomeId) {
    world.queue.submit(Reaction::ProduceNewProtein { transcript: tid, ribosome }, world.rates.ribosome_motion);
}

/// `BindRibosome` (spec §4.4): consume a free ribosome onto the RBS.
pub(crate) fn execute_bind_ribosome(world: &mut World, tid: TranscriptId) {
    let rib_id = world.ribosomes.insert(Ribosome { position: 1, bound_modifiers: Vec::new() });
    world.transcripts.get_mut(tid).ribosome_queue.insert(0, rib_id);
    world.species.add_to(RIBOSOME, -1);
}

/// `EatmRNA` (spec §4.4): the RBS has been degraded; no further binding.
pub(crate) fn execute_eat_mrna(world: &mut World, tid: TranscriptId) {
    world.transcripts.get_mut(tid).rbs_state = RbsState::Chewed;
}

/// `SimpleRibosomeMover` (spec §4.4).
pub(crate) fn execute_move_ribosome(world: &mut World, ribosome: RibosomeId) {
    world.ribosomes.get_mut(ribosome).position += 1;
}

/// `ProduceNewProtein` (spec §4.4): the tail ribosome completes translation,
/// releases its bound modifiers, and returns a free ribosome to the pool.
pub(crate) fn execute_produce_new_protein(
    world: &mut World,
    tid: TranscriptId,
    ribosome: RibosomeId,
) -> Result<(), SimError> {
    let gene = world.transcripts.get(tid).gene;
    let produced = crate::dna::coding_produced_species(world, gene);
    world.species.add_to(produced, 1);
    world.species.add_to(RIBOSOME, 1);

    let t = world.transcripts.get_mut(tid);
    match t.ribosome_queue.last() {
        Some(&last) if last == ribosome => {
            t.ribosome_queue.pop();
        }
        _ => {
            return Err(SimError::Engine(
                "ProduceNewProtein fired for a ribosome that was not the tail of its queue".into(),
            ))
        }
    }

    let ribosome = world.ribosomes.remove(ribosome).expect("ribosome handle must be live at release");
    for modifier in ribosome.bound_modifiers {
        world.species.add_to(modifier, 1);
    }
    Ok(())
}
