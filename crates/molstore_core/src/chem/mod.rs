//! Structural notation parsing and containment matching.
//!
//! # Responsibility
//! - Turn untrusted notation strings into queryable structural handles.
//! - Answer asymmetric "pattern contained in target" questions.
//!
//! # Invariants
//! - Parse failures are typed (`NotationError`), never a `false` match.
//! - `contains` is not assumed symmetric by any caller.
//! - Every handle contains itself.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod molecule;
mod smiles;

pub use molecule::{Atom, BondOrder, Molecule};
pub use smiles::SmilesParser;

/// Parsed structure that can answer containment queries.
pub trait StructuralHandle {
    /// Returns whether `pattern` occurs in `self` as a substructure.
    fn contains(&self, pattern: &Self) -> bool;
}

/// Parser from a notation string into a structural handle.
///
/// The service layer only depends on this seam, so alternative notations or
/// external matching engines can be swapped in without touching storage.
pub trait StructureParser {
    type Handle: StructuralHandle;

    /// Parses `notation` or rejects it with a positioned reason.
    fn parse(&self, notation: &str) -> Result<Self::Handle, NotationError>;

    /// Returns whether `notation` parses.
    fn is_valid(&self, notation: &str) -> bool {
        self.parse(notation).is_ok()
    }
}

/// Rejection of a notation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationError {
    /// Zero-based character offset where parsing stopped.
    pub position: usize,
    pub reason: NotationErrorReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationErrorReason {
    Empty,
    UnexpectedCharacter(char),
    UnknownElement(String),
    InvalidBracketAtom(String),
    UnbalancedParenthesis,
    DanglingBond,
    UnclosedRing(u16),
    ConflictingRingBond(u16),
    RingBondToSelf(u16),
    DuplicateBond,
    ExceededValence { element: String, valence: u32 },
}

impl NotationError {
    pub(crate) fn new(position: usize, reason: NotationErrorReason) -> Self {
        Self { position, reason }
    }
}

impl Display for NotationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let at = self.position;
        match &self.reason {
            NotationErrorReason::Empty => write!(f, "empty notation"),
            NotationErrorReason::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character `{ch}` at {at}")
            }
            NotationErrorReason::UnknownElement(symbol) => {
                write!(f, "unknown element `{symbol}` at {at}")
            }
            NotationErrorReason::InvalidBracketAtom(text) => {
                write!(f, "invalid bracket atom `[{text}]` at {at}")
            }
            NotationErrorReason::UnbalancedParenthesis => {
                write!(f, "unbalanced parenthesis at {at}")
            }
            NotationErrorReason::DanglingBond => write!(f, "bond without a following atom at {at}"),
            NotationErrorReason::UnclosedRing(label) => write!(f, "ring bond {label} never closed"),
            NotationErrorReason::ConflictingRingBond(label) => {
                write!(f, "ring bond {label} closed with a conflicting bond at {at}")
            }
            NotationErrorReason::RingBondToSelf(label) => {
                write!(f, "ring bond {label} closes on its own atom at {at}")
            }
            NotationErrorReason::DuplicateBond => {
                write!(f, "duplicate bond between the same atoms at {at}")
            }
            NotationErrorReason::ExceededValence { element, valence } => write!(
                f,
                "atom `{element}` at {at} exceeds its maximum valence with {valence} bonds"
            ),
        }
    }
}

impl Error for NotationError {}
