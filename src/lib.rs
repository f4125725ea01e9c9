//! A stochastic simulator for gene-regulatory networks inside a growing
//! bacterial cell: Gillespie's direct method driving a Shea-Ackers operator
//! sampler, an RNAP polymerization engine over a DNA segment forest, a
//! ribosome translation engine, and deterministic cell growth with division.

pub mod arena;
pub mod cell;
pub mod dna;
pub mod error;
pub mod ids;
pub mod kinetics;
pub mod math;
pub mod operator;
pub mod reaction;
pub mod rng;
pub mod species;
pub mod trace;
pub mod translation;
pub mod world;

pub use cell::Cell;
pub use dna::{Direction, Segment};
pub use error::{SimError, SimResult};
pub use operator::{Operator, OperatorConfig};
pub use world::{Rates, World};
