//! DNA topology and the RNAP polymerization engine (spec §3, §4.3),
//! grounded on `SegmentDynamics.c` (`MoveRNAPs`, `Submit*`, `Simple*`,
//! `(Un)AntiTerminateRNAP`) and `PromotorDynamics.c` (`PromotorAction`,
//! `InitiateTranscription`).

use crate::error::SimError;
use crate::ids::{RnapId, SegmentRef, TranscriptId};
use crate::reaction::{DnaAction, Reaction};
use crate::species::RNAP;
use crate::translation::{RbsState, Transcript, TranscriptKind};
use crate::world::World;

/// RNAP footprint, in nucleotides: two same-direction polymerases must stay
/// at least this far apart, and this is also the "is anything blocking
/// promoter initiation" radius (spec §3, §4.3).
pub const RNAP_FOOTPRINT: i64 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Rnap {
    pub direction: Direction,
    pub position: i64,
    pub bound_modifiers: Vec<usize>,
    pub transcript: Option<TranscriptId>,
}

#[derive(Debug, Clone)]
pub struct PromoterData {
    pub operator_index: usize,
    /// Isomerization rate per operator configuration, indexed the same way
    /// as `Operator::configs`.
    pub iso_rate: Vec<f64>,
    pub rnap_count: u64,
}

#[derive(Debug, Clone)]
pub struct CodingData {
    pub produced_species: usize,
    pub mrna_degradation_rate: f64,
    pub ribosome_binding_rate: f64,
}

#[derive(Debug, Clone)]
pub struct TerminatorData {
    pub antiterm_species: Option<usize>,
    pub base_fall_off_rate: f64,
    pub base_pass_through_rate: f64,
    pub antiterminated_fall_off_rate: f64,
    pub antiterminated_pass_through_rate: f64,
}

#[derive(Debug, Clone)]
pub struct AntiTerminatorData {
    pub modifier_species: usize,
    pub unbound_pass_through_rate: f64,
    pub binding_rate: f64,
    pub bound_pass_through_rate: f64,
    pub unbinding_rate: f64,
}

#[derive(Debug, Clone)]
pub enum SegmentKind {
    Promoter(PromoterData),
    Coding(CodingData),
    NonCoding,
    Terminator(TerminatorData),
    AntiTerminator(AntiTerminatorData),
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub length: i64,
    pub direction: Direction,
    pub kind: SegmentKind,
    pub rnap_queue: Vec<RnapId>,
}

impl Segment {
    fn base(name: impl Into<String>, length: i64, direction: Direction, kind: SegmentKind) -> Self {
        Segment { name: name.into(), length, direction, kind, rnap_queue: Vec::new() }
    }

    pub fn promoter(
        name: impl Into<String>,
        length: i64,
        direction: Direction,
        operator_index: usize,
        iso_rate: Vec<f64>,
    ) -> Self {
        Self::base(
            name,
            length,
            direction,
            SegmentKind::Promoter(PromoterData { operator_index, iso_rate, rnap_count: 0 }),
        )
    }

    pub fn coding(
        name: impl Into<String>,
        length: i64,
        direction: Direction,
        produced_species: usize,
        mrna_degradation_rate: f64,
        ribosome_binding_rate: f64,
    ) -> Self {
        Self::base(
            name,
            length,
            direction,
            SegmentKind::Coding(CodingData { produced_species, mrna_degradation_rate, ribosome_binding_rate }),
        )
    }

    pub fn non_coding(name: impl Into<String>, length: i64, direction: Direction) -> Self {
        Self::base(name, length, direction, SegmentKind::NonCoding)
    }

    pub fn terminator(
        name: impl Into<String>,
        length: i64,
        direction: Direction,
        antiterm_species: Option<usize>,
        base_fall_off_rate: f64,
        base_pass_through_rate: f64,
        antiterminated_fall_off_rate: f64,
        antiterminated_pass_through_rate: f64,
    ) -> Self {
        Self::base(
            name,
            length,
            direction,
            SegmentKind::Terminator(TerminatorData {
                antiterm_species,
                base_fall_off_rate,
                base_pass_through_rate,
                antiterminated_fall_off_rate,
                antiterminated_pass_through_rate,
            }),
        )
    }

    pub fn antiterminator(
        name: impl Into<String>,
        length: i64,
        direction: Direction,
        modifier_species: usize,
        unbound_pass_through_rate: f64,
        binding_rate: f64,
        bound_pass_through_rate: f64,
        unbinding_rate: f64,
    ) -> Self {
        Self::base(
            name,
            length,
            direction,
            SegmentKind::AntiTerminator(AntiTerminatorData {
                modifier_species,
                unbound_pass_through_rate,
                binding_rate,
                bound_pass_through_rate,
                unbinding_rate,
            }),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub segments: Vec<Segment>,
}

pub(crate) fn segment(world: &World, r: SegmentRef) -> &Segment {
    &world.sequences[r.sequence].segments[r.segment]
}

pub(crate) fn segment_mut(world: &mut World, r: SegmentRef) -> &mut Segment {
    &mut world.sequences[r.sequence].segments[r.segment]
}

/// The coding segment's produced-species index, mRNA degradation rate, and
/// ribosome binding rate, for the translation engine.
pub(crate) fn coding_rates(world: &World, r: SegmentRef) -> (f64, f64) {
    match &segment(world, r).kind {
        SegmentKind::Coding(c) => (c.mrna_degradation_rate, c.ribosome_binding_rate),
        _ => unreachable!("coding_rates called on a non-coding segment"),
    }
}

pub(crate) fn coding_produced_species(world: &World, r: SegmentRef) -> usize {
    match &segment(world, r).kind {
        SegmentKind::Coding(c) => c.produced_species,
        _ => unreachable!("coding_produced_species called on a non-coding segment"),
    }
}

pub(crate) fn segment_length(world: &World, r: SegmentRef) -> i64 {
    segment(world, r).length
}

pub(crate) fn rnap_queue_of(world: &World, r: SegmentRef) -> Vec<RnapId> {
    segment(world, r).rnap_queue.clone()
}

pub(crate) fn is_coding_segment(world: &World, r: SegmentRef) -> bool {
    matches!(segment(world, r).kind, SegmentKind::Coding(_))
}

fn neighbor(world: &World, r: SegmentRef, direction: Direction) -> Option<SegmentRef> {
    match direction {
        Direction::Left => (r.segment > 0).then(|| SegmentRef::new(r.sequence, r.segment - 1)),
        Direction::Right => {
            let len = world.sequences[r.sequence].segments.len();
            (r.segment + 1 < len).then(|| SegmentRef::new(r.sequence, r.segment + 1))
        }
    }
}

fn remove_from_queue(segment: &mut Segment, rnap: RnapId) {
    segment.rnap_queue.retain(|&id| id != rnap);
}

/// Entry point for the DNA/RNAP half of one tick's submission phase (spec
/// §4.3, `Polymerize`'s first loop): walk every segment of every sequence,
/// in order, submitting promoter-initiation and RNAP-motion reactions.
pub(crate) fn submit_polymerization(world: &mut World) {
    for seq in 0..world.sequences.len() {
        for seg in 0..world.sequences[seq].segments.len() {
            submit_for_segment(world, SegmentRef::new(seq, seg));
        }
    }
}

fn submit_for_segment(world: &mut World, r: SegmentRef) {
    if matches!(segment(world, r).kind, SegmentKind::Promoter(_)) {
        submit_promoter_action(world, r);
    }

    let queue = segment(world, r).rnap_queue.clone();
    for rnap in queue {
        submit_for_rnap(world, r, rnap);
    }
}

fn submit_for_rnap(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    let dna_direction = segment(world, r).direction;
    let length = segment(world, r).length;
    let rnap = world.rnaps.get(rnap_id);
    let direction = rnap.direction;
    let position = rnap.position;

    let at_end = if direction == dna_direction { position == length } else { position == 1 };

    if at_end {
        match &segment(world, r).kind {
            SegmentKind::Promoter(_) | SegmentKind::NonCoding => submit_simple_jump(world, r, rnap_id),
            SegmentKind::Coding(_) => submit_produce_transcript(world, r, rnap_id),
            SegmentKind::Terminator(_) => submit_termination(world, r, rnap_id),
            SegmentKind::AntiTerminator(_) => submit_antitermination(world, r, rnap_id),
        }
        return;
    }

    // Mid-segment: scan every other RNAP on this segment for blocking or
    // a convergent (opposite-direction) close approach.
    let others = segment(world, r).rnap_queue.clone();
    let mut blocked = false;
    for other_id in others {
        if other_id == rnap_id {
            continue;
        }
        let other = world.rnaps.get(other_id);
        if (other.position - position).abs() <= RNAP_FOOTPRINT {
            if other.direction != direction {
                submit_convergent(world, r, rnap_id);
                blocked = true;
                break;
            } else if position < other.position {
                blocked = true;
                break;
            }
        }
    }

    if !blocked {
        world.queue.submit(Reaction::MoveRNAP { segment: r, rnap: rnap_id }, world.rates.polymerase_motion);
    }
}

fn submit_simple_jump(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    world.queue.submit(Reaction::NextSegment { segment: r, rnap: rnap_id }, world.rates.polymerase_motion);
}

fn submit_convergent(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    // spec §9 open question 3: the escape path is disabled by default and
    // collisions always end in fall-off; exposed as a toggle rather than
    // compiled out.
    if world.collision_escape_enabled {
        world.queue.submit(Reaction::MoveRNAP { segment: r, rnap: rnap_id }, world.rates.collision_escape);
    }
    world.queue.submit(Reaction::RnapRnap { segment: r, rnap: rnap_id }, world.rates.collision_failure);
}

fn submit_produce_transcript(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    if let Some(tid) = world.rnaps.get(rnap_id).transcript {
        world.transcripts.get_mut(tid).current_length += 1;
        world.free_transcripts.push(tid);
        world.rnaps.get_mut(rnap_id).transcript = None;
    }
    submit_simple_jump(world, r, rnap_id);
}

fn submit_termination(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    let seg_direction = segment(world, r).direction;
    let rnap = world.rnaps.get(rnap_id);
    if rnap.direction != seg_direction {
        submit_simple_jump(world, r, rnap_id);
        return;
    }

    let term = match &segment(world, r).kind {
        SegmentKind::Terminator(t) => t.clone(),
        _ => unreachable!("submit_termination called on a non-terminator segment"),
    };
    let antiterminated = term
        .antiterm_species
        .map(|s| rnap.bound_modifiers.contains(&s))
        .unwrap_or(false);

    let (fall_off, pass_through) = if antiterminated {
        (term.antiterminated_fall_off_rate, term.antiterminated_pass_through_rate)
    } else {
        (term.base_fall_off_rate, term.base_pass_through_rate)
    };

    if fall_off != 0.0 {
        world.queue.submit(Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::FallOff }, fall_off);
    }
    if pass_through != 0.0 {
        world.queue.submit(
            Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::PassThrough },
            pass_through,
        );
    }
}

fn submit_antitermination(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    let seg_direction = segment(world, r).direction;
    let rnap = world.rnaps.get(rnap_id);
    if rnap.direction != seg_direction {
        submit_simple_jump(world, r, rnap_id);
        return;
    }

    let at = match &segment(world, r).kind {
        SegmentKind::AntiTerminator(a) => a.clone(),
        _ => unreachable!("submit_antitermination called on a non-antiterminator segment"),
    };
    let bound = rnap.bound_modifiers.contains(&at.modifier_species);

    if !bound {
        if at.unbound_pass_through_rate != 0.0 {
            world.queue.submit(
                Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::PassThrough },
                at.unbound_pass_through_rate,
            );
        }
        if at.binding_rate != 0.0 {
            let conc = world.species.get(at.modifier_species) as f64;
            let rate = at.binding_rate * conc * world.cell.volume_factor();
            world.queue.submit(
                Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::AntiTerminateBind },
                rate,
            );
        }
    } else {
        if at.bound_pass_through_rate != 0.0 {
            world.queue.submit(
                Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::PassThrough },
                at.bound_pass_through_rate,
            );
        }
        if at.unbinding_rate != 0.0 {
            world.queue.submit(
                Reaction::DNAAction { segment: r, rnap: rnap_id, action: DnaAction::AntiTerminateUnbind },
                at.unbinding_rate,
            );
        }
    }
}

fn submit_promoter_action(world: &mut World, r: SegmentRef) {
    let (direction, operator_index) = match &segment(world, r).kind {
        SegmentKind::Promoter(p) => (segment(world, r).direction, p.operator_index),
        _ => unreachable!(),
    };
    let pstate = world.operators[operator_index].current_state;
    let rate = match &segment(world, r).kind {
        SegmentKind::Promoter(p) => p.iso_rate[pstate],
        _ => unreachable!(),
    };
    if rate == 0.0 {
        return;
    }

    let Some(next) = neighbor(world, r, direction) else { return };
    let blocked = segment(world, next).rnap_queue.iter().any(|&id| {
        let rnap = world.rnaps.get(id);
        rnap.direction == direction && rnap.position <= RNAP_FOOTPRINT
    });
    if blocked {
        return;
    }

    world.queue.submit(Reaction::TransInit { promoter: r }, rate);
}

/// `InitiateTranscription` (spec §4.3): allocate an RNAP at the head of the
/// downstream segment's queue, rebind the operator to the post-initiation
/// configuration, and force the first motion step.
pub(crate) fn execute_trans_init(world: &mut World, promoter: SegmentRef) -> Result<(), SimError> {
    let (direction, operator_index) = match &segment(world, promoter).kind {
        SegmentKind::Promoter(p) => (segment(world, promoter).direction, p.operator_index),
        _ => return Err(SimError::Engine("TransInit fired on a non-promoter segment".into())),
    };

    if let SegmentKind::Promoter(p) = &mut segment_mut(world, promoter).kind {
        p.rnap_count += 1;
    }

    let target = neighbor(world, promoter, direction)
        .ok_or_else(|| SimError::Engine(format!("promoter {:?} has no downstream segment", promoter)))?;

    let target_direction = segment(world, target).direction;
    let target_length = segment(world, target).length;
    let start_position = if direction == target_direction { 0 } else { target_length + 1 };

    let rnap_id = world.rnaps.insert(Rnap {
        direction,
        position: start_position,
        bound_modifiers: Vec::new(),
        transcript: None,
    });
    segment_mut(world, target).rnap_queue.insert(0, rnap_id);

    world.operators[operator_index].rebind_after_initiation()?;

    apply_move(world, target, rnap_id);
    Ok(())
}

/// `SimpleRNAPMover` (spec §4.3): advance one nucleotide and, on a coding
/// segment, create or extend the tethered transcript.
pub(crate) fn apply_move(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    let seg_direction = segment(world, r).direction;
    let is_coding = matches!(segment(world, r).kind, SegmentKind::Coding(_));

    {
        let rnap = world.rnaps.get_mut(rnap_id);
        if rnap.direction == seg_direction {
            rnap.position += 1;
        } else {
            rnap.position -= 1;
        }
    }

    if !is_coding {
        return;
    }

    let rnap_direction = world.rnaps.get(rnap_id).direction;
    match world.rnaps.get(rnap_id).transcript {
        None => {
            let kind = if rnap_direction == seg_direction { TranscriptKind::Sense } else { TranscriptKind::AntiSense };
            let tid = world.transcripts.insert(Transcript {
                gene: r,
                rnap: Some(rnap_id),
                rbs_state: RbsState::Intact,
                current_length: 2,
                kind,
                ribosome_queue: Vec::new(),
            });
            world.rnaps.get_mut(rnap_id).transcript = Some(tid);
        }
        Some(tid) => {
            world.transcripts.get_mut(tid).current_length += 1;
        }
    }
}

/// `SimpleJumpSegment` (spec §4.3): splice the RNAP onto the neighboring
/// segment, or release it at the end of the chain.
pub(crate) fn execute_next_segment(world: &mut World, r: SegmentRef, rnap_id: RnapId) -> Result<(), SimError> {
    remove_from_queue(segment_mut(world, r), rnap_id);
    let direction = world.rnaps.get(rnap_id).direction;

    match neighbor(world, r, direction) {
        Some(next) => {
            segment_mut(world, next).rnap_queue.insert(0, rnap_id);
            let next_direction = segment(world, next).direction;
            let next_length = segment(world, next).length;
            {
                let rnap = world.rnaps.get_mut(rnap_id);
                rnap.position = if rnap.direction != next_direction { next_length } else { 1 };
            }
            if world.rnaps.get(rnap_id).transcript.is_some() {
                return Err(SimError::Engine(format!(
                    "RNAP still tethered to a transcript at a hand-off onto segment {:?}",
                    next
                )));
            }
            apply_move(world, next, rnap_id);
        }
        None => release_rnap(world, rnap_id, true),
    }
    Ok(())
}

/// `RNAPFallsOff` (spec §4.3): remove the RNAP from its segment queue and
/// release it. Shared by terminator fall-off and convergent-collision
/// fall-off (`Reaction::RnapRnap`).
pub(crate) fn execute_falls_off(world: &mut World, r: SegmentRef, rnap_id: RnapId) {
    remove_from_queue(segment_mut(world, r), rnap_id);
    release_rnap(world, rnap_id, false);
}

fn release_rnap(world: &mut World, rnap_id: RnapId, anomalous_if_tethered: bool) {
    world.species.add_to(RNAP, 1);
    let rnap = world.rnaps.remove(rnap_id).expect("rnap handle must be live at release");
    for modifier in rnap.bound_modifiers {
        world.species.add_to(modifier, 1);
    }
    if let Some(tid) = rnap.transcript {
        if anomalous_if_tethered {
            log::warn!("releasing an RNAP with an unexpectedly tethered transcript at chain end");
        }
        release_transcript_and_ribosomes(world, tid);
    }
}

fn release_transcript_and_ribosomes(world: &mut World, tid: TranscriptId) {
    let transcript = world.transcripts.remove(tid).expect("transcript handle must be live at release");
    for rib_id in transcript.ribosome_queue {
        let ribosome = world.ribosomes.remove(rib_id).expect("ribosome handle must be live at release");
        for modifier in ribosome.bound_modifiers {
            world.species.add_to(modifier, 1);
        }
    }
}

/// `AntiTerminateRNAP` (spec §4.3).
pub(crate) fn execute_antiterminate_bind(world: &mut World, r: SegmentRef, rnap_id: RnapId) -> Result<(), SimError> {
    let modifier = match &segment(world, r).kind {
        SegmentKind::AntiTerminator(a) => a.modifier_species,
        _ => return Err(SimError::Engine("AntiTerminateBind fired on a non-antiterminator segment".into())),
    };
    let rnap = world.rnaps.get(rnap_id);
    if rnap.bound_modifiers.contains(&modifier) {
        return Err(SimError::Model("antitermination bind on an already-antiterminated RNAP".into()));
    }
    world.species.add_to(modifier, -1);
    world.rnaps.get_mut(rnap_id).bound_modifiers.push(modifier);
    Ok(())
}

/// `UnAntiTerminateRNAP` (spec §4.3).
pub(crate) fn execute_antiterminate_unbind(world: &mut World, r: SegmentRef, rnap_id: RnapId) -> Result<(), SimError> {
    let modifier = match &segment(world, r).kind {
        SegmentKind::AntiTerminator(a) => a.modifier_species,
        _ => return Err(SimError::Engine("AntiTerminateUnbind fired on a non-antiterminator segment".into())),
    };
    let rnap = world.rnaps.get_mut(rnap_id);
    match rnap.bound_modifiers.iter().position(|&m| m == modifier) {
        Some(i) => {
            rnap.bound_modifiers.remove(i);
        }
        None => return Err(SimError::Model("antitermination unbind on a non-antiterminated RNAP".into())),
    }
    world.species.add_to(modifier, 1);
    Ok(())
}

/// Spec §8 invariant 3 (the RNAP-footprint half): every pair of same-
/// direction RNAPs on a segment is at least [`RNAP_FOOTPRINT`] apart.
pub fn check_rnap_spacing(world: &World) -> Result<(), SimError> {
    for seq in &world.sequences {
        for seg in &seq.segments {
            for (i, &a) in seg.rnap_queue.iter().enumerate() {
                for &b in &seg.rnap_queue[i + 1..] {
                    let ra = world.rnaps.get(a);
                    let rb = world.rnaps.get(b);
                    if ra.direction == rb.direction && (ra.position - rb.position).abs() < RNAP_FOOTPRINT {
                        return Err(SimError::Engine(format!(
                            "RNAPs on segment '{}' are closer than the {}nt footprint",
                            seg.name, RNAP_FOOTPRINT
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}
