//! The twelve-variant reaction taxonomy and the Gillespie submission queue
//! (spec §3, §4.1), grounded on `ReactionManager.c`'s `SubmitReaction` /
//! `SelectReaction` / `ExecuteReaction` / `DrainReactions`.

use crate::error::SimError;
use crate::ids::{RibosomeId, RnapId, SegmentRef, TranscriptId};
use crate::rng::Rng64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnaAction {
    FallOff,
    PassThrough,
    AntiTerminateBind,
    AntiTerminateUnbind,
}

/// The reaction taxonomy. `ProduceProtein` is carried for parity with the
/// original discriminant set but is never submitted: every completed
/// translation goes through `ProduceNewProtein` instead (see
/// `translation::submit_produce_protein`).
#[derive(Debug, Clone, Copy)]
pub enum Reaction {
    Kinetic { index: usize },
    TransInit { promoter: SegmentRef },
    MoveRNAP { segment: SegmentRef, rnap: RnapId },
    DNAAction { segment: SegmentRef, rnap: RnapId, action: DnaAction },
    NextSegment { segment: SegmentRef, rnap: RnapId },
    EatmRNA { transcript: TranscriptId },
    MoveRibosome { transcript: TranscriptId, ribosome: RibosomeId },
    ProduceProtein { transcript: TranscriptId, ribosome: RibosomeId },
    ProduceNewProtein { transcript: TranscriptId, ribosome: RibosomeId },
    RnapRnap { segment: SegmentRef, rnap: RnapId },
    BindRibosome { transcript: TranscriptId },
    ChangeCellVolume,
}

#[derive(Debug, Clone, Copy)]
struct Submission {
    reaction: Reaction,
    weight: f64,
}

/// One tick's candidate-reaction pool: submit every possible reaction with
/// its propensity, select one weighted by probability and draw the time
/// step, then drain for the next tick.
#[derive(Debug, Default)]
pub struct ReactionQueue {
    items: Vec<Submission>,
    total: f64,
}

impl ReactionQueue {
    pub fn new() -> Self {
        ReactionQueue::default()
    }

    /// Rejects a weight of exactly zero, matching `SubmitReaction`'s guard;
    /// a reaction that cannot happen this tick simply isn't added to the
    /// pool.
    pub fn submit(&mut self, reaction: Reaction, weight: f64) {
        if weight == 0.0 {
            return;
        }
        self.items.push(Submission { reaction, weight });
        self.total += weight;
    }

    pub fn total_probability(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn drain(&mut self) {
        self.items.clear();
        self.total = 0.0;
    }

    pub(crate) fn reaction_at(&self, index: usize) -> Reaction {
        self.items[index].reaction
    }

    /// `SelectReaction`: draws the waiting time `tau` and scans the pool by
    /// cumulative weight against an independent roulette draw, returning the
    /// index of the selected reaction. Preserves the original's
    /// "lastreaction" tie-break (spec §9): on a tie at the scan boundary,
    /// the reaction whose cumulative weight crosses the threshold wins, and
    /// a near-equal shortfall at the end of the pool (within 1e-6 of the
    /// total) is tolerated rather than treated as an inconsistency.
    pub fn select(&self, rng: &mut Rng64) -> Result<(usize, f64), SimError> {
        if self.items.is_empty() || self.total <= 0.0 {
            return Err(SimError::Engine("select() called on an empty reaction queue".into()));
        }

        let tau = rng.neg_log_uniform() / self.total;
        let threshold = rng.uniform_open() * self.total;

        let mut last_index = 0;
        let mut sum = self.items[0].weight;
        let mut i = 1;
        while sum < threshold {
            if i == self.items.len() {
                if self.total - sum < 1e-6 {
                    break;
                }
                return Err(SimError::Engine(format!(
                    "select(): reaction pool exhausted before reaching its own total (sum={sum}, total={})",
                    self.total
                )));
            }
            sum += self.items[i].weight;
            if sum - self.total > 1e-5 {
                return Err(SimError::Engine(format!(
                    "select(): cumulative weight {sum} exceeds the pool total {}",
                    self.total
                )));
            }
            last_index = i;
            i += 1;
        }

        Ok((last_index, tau))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_resets_total_and_length() {
        let mut q = ReactionQueue::new();
        q.submit(Reaction::ChangeCellVolume, 1.0);
        q.submit(Reaction::ChangeCellVolume, 2.0);
        assert_eq!(q.len(), 2);
        q.drain();
        assert_eq!(q.len(), 0);
        assert_eq!(q.total_probability(), 0.0);
    }

    #[test]
    fn zero_weight_reactions_are_rejected() {
        let mut q = ReactionQueue::new();
        q.submit(Reaction::ChangeCellVolume, 0.0);
        assert!(q.is_empty());
    }

    #[test]
    fn select_picks_a_valid_index_and_positive_tau() {
        let mut q = ReactionQueue::new();
        q.submit(Reaction::ChangeCellVolume, 1.0);
        q.submit(Reaction::ChangeCellVolume, 3.0);
        let mut rng = Rng64::new(7);
        for _ in 0..20 {
            let (idx, tau) = q.select(&mut rng).unwrap();
            assert!(idx < 2);
            assert!(tau > 0.0);
        }
    }

    #[test]
    fn select_on_empty_queue_errs() {
        let q = ReactionQueue::new();
        let mut rng = Rng64::new(1);
        assert!(q.select(&mut rng).is_err());
    }
}
