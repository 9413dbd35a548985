//! SMILES line-notation parser.
//!
//! # Responsibility
//! - Validate SMILES syntax and build a `Molecule` graph.
//!
//! # Invariants
//! - Unbracketed organic-subset atoms never exceed their highest allowed
//!   valence.
//! - Unbracketed bonds between two aromatic atoms are aromatic, otherwise
//!   single.
//! - Six-membered C/N rings written in Kekulé form with alternating single
//!   and double bonds are stored aromatic, so both spellings of benzene
//!   parse to the same graph. Other rings keep the aromaticity as written.

use super::molecule::{Atom, BondOrder, Molecule};
use super::{NotationError, NotationErrorReason, StructureParser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static BRACKET_ATOM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<isotope>\d{1,3})?(?P<symbol>\*|[A-Z][a-z]?|se|as|te|[bcnops])(?P<chirality>@(?:@|TH[12]|AL[12]|SP[123]|TB\d{1,2}|OH\d{1,2})?)?(?P<hcount>H\d?)?(?P<charge>\+\+?|--?|[+-]\d{1,2})?(?::(?P<class>\d+))?$",
    )
    .expect("valid bracket atom regex")
});

const ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Parser for the SMILES notation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesParser;

impl StructureParser for SmilesParser {
    type Handle = Molecule;

    fn parse(&self, notation: &str) -> Result<Molecule, NotationError> {
        if notation.is_empty() {
            return Err(NotationError::new(0, NotationErrorReason::Empty));
        }
        Parser::new(notation).run()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Start,
    Atom,
    Bond,
    Open,
    Close,
    Ring,
    Dot,
}

struct OpenRing {
    atom: usize,
    bond: Option<BondOrder>,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    molecule: Molecule,
    atom_positions: Vec<usize>,
    previous: Option<usize>,
    pending_bond: Option<BondOrder>,
    branches: Vec<(usize, usize)>,
    rings: BTreeMap<u16, OpenRing>,
    last: Token,
}

impl Parser {
    fn new(notation: &str) -> Self {
        Self {
            chars: notation.chars().collect(),
            pos: 0,
            molecule: Molecule::default(),
            atom_positions: Vec::new(),
            previous: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: BTreeMap::new(),
            last: Token::Start,
        }
    }

    fn run(mut self) -> Result<Molecule, NotationError> {
        while let Some(&ch) = self.chars.get(self.pos) {
            match ch {
                '(' => self.open_branch()?,
                ')' => self.close_branch()?,
                '.' => self.dot()?,
                '-' | '=' | '#' | '$' | ':' | '/' | '\\' => self.bond(ch)?,
                '0'..='9' | '%' => self.ring_bond()?,
                '[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }
        self.finish()
    }

    fn error(&self, reason: NotationErrorReason) -> NotationError {
        NotationError::new(self.pos, reason)
    }

    fn unexpected(&self) -> NotationError {
        let ch = self.chars.get(self.pos).copied().unwrap_or(' ');
        self.error(NotationErrorReason::UnexpectedCharacter(ch))
    }

    fn open_branch(&mut self) -> Result<(), NotationError> {
        let Some(previous) = self.previous else {
            return Err(self.unexpected());
        };
        if !matches!(self.last, Token::Atom | Token::Ring | Token::Close) {
            return Err(self.unexpected());
        }
        self.branches.push((previous, self.pos));
        self.last = Token::Open;
        self.pos += 1;
        Ok(())
    }

    fn close_branch(&mut self) -> Result<(), NotationError> {
        match self.last {
            Token::Bond => return Err(self.error(NotationErrorReason::DanglingBond)),
            Token::Atom | Token::Ring | Token::Close => {}
            _ => return Err(self.unexpected()),
        }
        let Some((anchor, _)) = self.branches.pop() else {
            return Err(self.error(NotationErrorReason::UnbalancedParenthesis));
        };
        self.previous = Some(anchor);
        self.last = Token::Close;
        self.pos += 1;
        Ok(())
    }

    fn dot(&mut self) -> Result<(), NotationError> {
        if !matches!(self.last, Token::Atom | Token::Ring | Token::Close) {
            return Err(self.unexpected());
        }
        self.previous = None;
        self.last = Token::Dot;
        self.pos += 1;
        Ok(())
    }

    fn bond(&mut self, symbol: char) -> Result<(), NotationError> {
        if self.previous.is_none()
            || !matches!(
                self.last,
                Token::Atom | Token::Ring | Token::Open | Token::Close
            )
        {
            return Err(self.unexpected());
        }
        self.pending_bond = Some(match symbol {
            '=' => BondOrder::Double,
            '#' => BondOrder::Triple,
            '$' => BondOrder::Quadruple,
            ':' => BondOrder::Aromatic,
            _ => BondOrder::Single,
        });
        self.last = Token::Bond;
        self.pos += 1;
        Ok(())
    }

    fn ring_bond(&mut self) -> Result<(), NotationError> {
        let start = self.pos;
        let Some(atom) = self.previous else {
            return Err(self.unexpected());
        };
        if !matches!(self.last, Token::Atom | Token::Ring | Token::Bond) {
            return Err(self.unexpected());
        }

        let label = if self.chars[self.pos] == '%' {
            let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
            if digits.len() != 2 || !digits.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(self.unexpected());
            }
            self.pos += 3;
            digits.parse::<u16>().map_err(|_| self.unexpected())?
        } else {
            let digit = self.chars[self.pos].to_digit(10).unwrap_or(0);
            self.pos += 1;
            digit as u16
        };

        let bond = self.pending_bond.take();
        match self.rings.remove(&label) {
            Some(open) => {
                if open.atom == atom {
                    return Err(NotationError::new(
                        start,
                        NotationErrorReason::RingBondToSelf(label),
                    ));
                }
                let order = match (open.bond, bond) {
                    (Some(first), Some(second)) if first != second => {
                        return Err(NotationError::new(
                            start,
                            NotationErrorReason::ConflictingRingBond(label),
                        ));
                    }
                    (Some(order), _) | (None, Some(order)) => order,
                    (None, None) => self.default_bond(open.atom, atom),
                };
                if !self.molecule.add_bond(open.atom, atom, order) {
                    return Err(NotationError::new(start, NotationErrorReason::DuplicateBond));
                }
            }
            None => {
                self.rings.insert(label, OpenRing { atom, bond });
            }
        }

        self.last = Token::Ring;
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), NotationError> {
        let start = self.pos;
        let ch = self.chars[self.pos];
        let next = self.chars.get(self.pos + 1).copied();
        let (symbol, aromatic, width) = match (ch, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            ('*', _) => ("*", false, 1),
            (upper, _) if upper.is_ascii_uppercase() => {
                let symbol: String = self
                    .chars
                    .iter()
                    .skip(self.pos)
                    .take_while(|c| c.is_ascii_alphabetic())
                    .take(2)
                    .collect();
                return Err(self.error(NotationErrorReason::UnknownElement(symbol)));
            }
            _ => return Err(self.unexpected()),
        };

        self.pos += width;
        self.push_atom(
            Atom {
                symbol: symbol.to_string(),
                aromatic,
                charge: 0,
                isotope: None,
                hydrogens: None,
                bracket: false,
            },
            start,
        )
    }

    fn bracket_atom(&mut self) -> Result<(), NotationError> {
        let start = self.pos;
        let Some(close) = self.chars[start..].iter().position(|ch| *ch == ']') else {
            let rest: String = self.chars[start + 1..].iter().collect();
            return Err(self.error(NotationErrorReason::InvalidBracketAtom(rest)));
        };
        let body: String = self.chars[start + 1..start + close].iter().collect();
        let invalid = || {
            NotationError::new(start, NotationErrorReason::InvalidBracketAtom(body.clone()))
        };

        let captures = BRACKET_ATOM_RE.captures(&body).ok_or_else(invalid)?;
        let raw_symbol = captures.name("symbol").map_or("", |m| m.as_str());
        let aromatic = raw_symbol
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_lowercase());
        let symbol = if aromatic {
            capitalize(raw_symbol)
        } else {
            raw_symbol.to_string()
        };
        if symbol != "*" && !ELEMENTS.contains(&symbol.as_str()) {
            return Err(NotationError::new(
                start,
                NotationErrorReason::UnknownElement(symbol),
            ));
        }

        let isotope = match captures.name("isotope") {
            Some(m) => Some(m.as_str().parse::<u16>().map_err(|_| invalid())?),
            None => None,
        };
        let hydrogens = match captures.name("hcount") {
            Some(m) if m.as_str().len() > 1 => {
                Some(m.as_str()[1..].parse::<u8>().map_err(|_| invalid())?)
            }
            Some(_) => Some(1),
            None => Some(0),
        };
        let charge = match captures.name("charge") {
            Some(m) => parse_charge(m.as_str()).ok_or_else(invalid)?,
            None => 0,
        };

        self.pos = start + close + 1;
        self.push_atom(
            Atom {
                symbol,
                aromatic,
                charge,
                isotope,
                hydrogens,
                bracket: true,
            },
            start,
        )
    }

    fn push_atom(&mut self, atom: Atom, start: usize) -> Result<(), NotationError> {
        let index = self.molecule.add_atom(atom);
        self.atom_positions.push(start);

        if let Some(previous) = self.previous {
            if self.last != Token::Dot {
                let order = self
                    .pending_bond
                    .take()
                    .unwrap_or_else(|| self.default_bond(previous, index));
                self.molecule.add_bond(previous, index, order);
            }
        }

        self.previous = Some(index);
        self.last = Token::Atom;
        Ok(())
    }

    fn default_bond(&self, a: usize, b: usize) -> BondOrder {
        let atoms = self.molecule.atoms();
        if atoms[a].aromatic && atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn finish(self) -> Result<Molecule, NotationError> {
        let end = self.chars.len();
        match self.last {
            Token::Bond => {
                return Err(NotationError::new(end, NotationErrorReason::DanglingBond));
            }
            Token::Dot => {
                return Err(NotationError::new(
                    end - 1,
                    NotationErrorReason::UnexpectedCharacter('.'),
                ));
            }
            _ => {}
        }
        if let Some((_, position)) = self.branches.first() {
            return Err(NotationError::new(
                *position,
                NotationErrorReason::UnbalancedParenthesis,
            ));
        }
        if let Some(label) = self.rings.keys().next() {
            return Err(NotationError::new(
                end,
                NotationErrorReason::UnclosedRing(*label),
            ));
        }

        for (index, atom) in self.molecule.atoms().iter().enumerate() {
            if atom.bracket || atom.aromatic {
                continue;
            }
            let Some(max) = max_valence(&atom.symbol) else {
                continue;
            };
            let valence = self.molecule.explicit_valence(index);
            if valence > max {
                return Err(NotationError::new(
                    self.atom_positions[index],
                    NotationErrorReason::ExceededValence {
                        element: atom.symbol.clone(),
                        valence,
                    },
                ));
            }
        }

        let mut molecule = self.molecule;
        molecule.aromatize_kekule_rings();
        Ok(molecule)
    }
}

fn max_valence(symbol: &str) -> Option<u32> {
    match symbol {
        "B" => Some(3),
        "C" => Some(4),
        "N" => Some(3),
        "O" => Some(2),
        "P" => Some(7),
        "S" => Some(6),
        "F" | "Cl" | "Br" => Some(1),
        "I" => Some(5),
        _ => None,
    }
}

fn parse_charge(text: &str) -> Option<i8> {
    match text {
        "+" => Some(1),
        "++" => Some(2),
        "-" => Some(-1),
        "--" => Some(-2),
        other => other.parse::<i8>().ok(),
    }
}

fn capitalize(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
