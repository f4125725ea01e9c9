//! Handle type aliases shared across the DNA, translation, and reaction
//! modules, plus a position reference into the segment forest.

use crate::arena::Handle;
use crate::dna::Rnap;
use crate::translation::{Ribosome, Transcript};

pub type RnapId = Handle<Rnap>;
pub type RibosomeId = Handle<Ribosome>;
pub type TranscriptId = Handle<Transcript>;

/// Addresses one segment within the DNA forest: the sequence it belongs to
/// and its position along that sequence's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    pub sequence: usize,
    pub segment: usize,
}

impl SegmentRef {
    pub fn new(sequence: usize, segment: usize) -> Self {
        SegmentRef { sequence, segment }
    }
}
