//! Error taxonomy (spec §7): parse / model / engine inconsistencies are all
//! fatal and carry a single diagnostic message identifying the operation and
//! offending object; there is no partial-state recovery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed model construction (reserved for a future text front end;
    /// the builder API raises this for e.g. a duplicated species name).
    #[error("parse error: {0}")]
    Parse(String),

    /// A Shea-Ackers configuration table could not match a requested state,
    /// or an antitermination bind/unbind was attempted against the wrong
    /// RNAP state.
    #[error("model inconsistency: {0}")]
    Model(String),

    /// Internal bookkeeping violated an engine invariant: circular queue
    /// linkage, a reaction-selection tolerance breach, an RNAP still
    /// tethered to a transcript at a segment hand-off.
    #[error("engine inconsistency: {0}")]
    Engine(String),
}

pub type SimResult<T> = Result<T, SimError>;
