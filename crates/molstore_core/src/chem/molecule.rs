//! Molecular graph and substructure containment.
//!
//! # Invariants
//! - At most one bond exists between any pair of atoms.
//! - Containment is a non-induced subgraph match: extra target bonds between
//!   mapped atoms are allowed.

use super::StructuralHandle;

const KEKULE_RING_SIZE: usize = 6;

/// Bond multiplicity as written in the notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution of this bond to an atom's explicit valence.
    pub(crate) fn valence(self) -> u32 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quadruple => 4,
        }
    }
}

/// One atom of a parsed structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Capitalized element symbol, or `*` for the wildcard atom.
    pub symbol: String,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Hydrogen count written inside a bracket atom.
    pub hydrogens: Option<u8>,
    /// Whether the atom was written in bracket form.
    pub bracket: bool,
}

impl Atom {
    pub fn is_wildcard(&self) -> bool {
        self.symbol == "*"
    }

    /// Returns whether this atom, used as a pattern atom, matches `target`.
    fn matches(&self, target: &Self) -> bool {
        if self.is_wildcard() {
            return true;
        }
        if self.symbol != target.symbol || self.aromatic != target.aromatic {
            return false;
        }
        if self.charge != 0 && self.charge != target.charge {
            return false;
        }
        match self.isotope {
            Some(isotope) => target.isotope == Some(isotope),
            None => true,
        }
    }
}

/// Backtracking state for one pattern atom.
struct Frame {
    pattern_atom: usize,
    candidates: Vec<usize>,
    next: usize,
}

/// Parsed structure: atoms plus adjacency lists keyed by atom index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    neighbors: Vec<Vec<(usize, BondOrder)>>,
    bond_count: usize,
}

impl Molecule {
    pub(crate) fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.neighbors.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds an undirected bond. Returns `false` when the pair is already bonded.
    pub(crate) fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) -> bool {
        if self.bond_between(a, b).is_some() {
            return false;
        }
        self.neighbors[a].push((b, order));
        self.neighbors[b].push((a, order));
        self.bond_count += 1;
        true
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bond_count
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.neighbors.get(atom).map_or(0, Vec::len)
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<BondOrder> {
        self.neighbors
            .get(a)?
            .iter()
            .find(|(other, _)| *other == b)
            .map(|(_, order)| *order)
    }

    /// Sum of explicit bond valences around `atom`.
    pub(crate) fn explicit_valence(&self, atom: usize) -> u32 {
        self.neighbors.get(atom).map_or(0, |bonds| {
            bonds
                .iter()
                .fold(0u32, |total, (_, order)| total.saturating_add(order.valence()))
        })
    }

    /// Rewrites six-membered C/N rings written with alternating single and
    /// double bonds into aromatic atoms joined by aromatic bonds.
    pub(crate) fn aromatize_kekule_rings(&mut self) {
        let mut rings = Vec::new();
        for start in 0..self.atoms.len() {
            if self.is_kekule_candidate(start) {
                let mut path = vec![start];
                self.collect_alternating_rings(&mut path, None, &mut rings);
            }
        }

        for ring in rings {
            for (offset, &atom) in ring.iter().enumerate() {
                let next = ring[(offset + 1) % ring.len()];
                self.atoms[atom].aromatic = true;
                self.set_bond_order(atom, next, BondOrder::Aromatic);
            }
        }
    }

    fn is_kekule_candidate(&self, atom: usize) -> bool {
        let atom = &self.atoms[atom];
        !atom.aromatic && atom.charge == 0 && matches!(atom.symbol.as_str(), "C" | "N")
    }

    // Depth is bounded by KEKULE_RING_SIZE. `path[0]` is the lowest index on
    // the ring so each ring is found from one start atom only.
    fn collect_alternating_rings(
        &self,
        path: &mut Vec<usize>,
        last: Option<BondOrder>,
        rings: &mut Vec<Vec<usize>>,
    ) {
        let (Some(&start), Some(&current)) = (path.first(), path.last()) else {
            return;
        };
        for &(next, order) in &self.neighbors[current] {
            if !matches!(order, BondOrder::Single | BondOrder::Double) || last == Some(order) {
                continue;
            }
            if path.len() == KEKULE_RING_SIZE {
                if next == start {
                    rings.push(path.clone());
                }
                continue;
            }
            if next <= start || path.contains(&next) || !self.is_kekule_candidate(next) {
                continue;
            }
            path.push(next);
            self.collect_alternating_rings(path, Some(order), rings);
            path.pop();
        }
    }

    fn set_bond_order(&mut self, a: usize, b: usize, order: BondOrder) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(bond) = self.neighbors[from].iter_mut().find(|(other, _)| *other == to) {
                bond.1 = order;
            }
        }
    }

    /// Breadth-first visiting order so each atom after the first of its
    /// component has an already-placed neighbor to anchor candidate lookup.
    fn search_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.atoms.len());
        let mut seen = vec![false; self.atoms.len()];
        for root in 0..self.atoms.len() {
            if seen[root] {
                continue;
            }
            seen[root] = true;
            let mut cursor = order.len();
            order.push(root);
            while cursor < order.len() {
                let current = order[cursor];
                cursor += 1;
                for &(next, _) in &self.neighbors[current] {
                    if !seen[next] {
                        seen[next] = true;
                        order.push(next);
                    }
                }
            }
        }
        order
    }

    /// Searches for an embedding of `pattern` with an explicit frame stack,
    /// so pattern size never bounds the call stack.
    fn find_embedding(&self, pattern: &Self, order: &[usize]) -> bool {
        let Some(&first) = order.first() else {
            return true;
        };
        let mut mapping = vec![None; pattern.atom_count()];
        let mut used = vec![false; self.atom_count()];
        let mut stack = vec![self.frame(pattern, first, &mapping)];

        while let Some(frame) = stack.last_mut() {
            if let Some(previous) = mapping[frame.pattern_atom].take() {
                used[previous] = false;
            }

            let mut placed = false;
            while let Some(&candidate) = frame.candidates.get(frame.next) {
                frame.next += 1;
                if !used[candidate]
                    && self.is_feasible(pattern, frame.pattern_atom, candidate, &mapping)
                {
                    mapping[frame.pattern_atom] = Some(candidate);
                    used[candidate] = true;
                    placed = true;
                    break;
                }
            }

            if !placed {
                stack.pop();
                continue;
            }
            match order.get(stack.len()) {
                Some(&next_atom) => {
                    let next = self.frame(pattern, next_atom, &mapping);
                    stack.push(next);
                }
                None => return true,
            }
        }

        false
    }

    /// Candidate targets for `pattern_atom`: neighbors of an already-mapped
    /// anchor when one exists, every target atom otherwise.
    fn frame(&self, pattern: &Self, pattern_atom: usize, mapping: &[Option<usize>]) -> Frame {
        let anchor = pattern.neighbors[pattern_atom]
            .iter()
            .find_map(|(other, _)| mapping[*other]);
        let candidates = match anchor {
            Some(target_atom) => self.neighbors[target_atom]
                .iter()
                .map(|(other, _)| *other)
                .collect(),
            None => (0..self.atoms.len()).collect(),
        };
        Frame {
            pattern_atom,
            candidates,
            next: 0,
        }
    }

    fn is_feasible(
        &self,
        pattern: &Self,
        pattern_atom: usize,
        candidate: usize,
        mapping: &[Option<usize>],
    ) -> bool {
        if !pattern.atoms[pattern_atom].matches(&self.atoms[candidate]) {
            return false;
        }
        if pattern.degree(pattern_atom) > self.degree(candidate) {
            return false;
        }
        pattern.neighbors[pattern_atom]
            .iter()
            .all(|&(other, order)| match mapping[other] {
                Some(mapped) => self.bond_between(candidate, mapped) == Some(order),
                None => true,
            })
    }
}

impl StructuralHandle for Molecule {
    fn contains(&self, pattern: &Self) -> bool {
        if pattern.atom_count() > self.atom_count() || pattern.bond_count() > self.bond_count() {
            return false;
        }

        self.find_embedding(pattern, &pattern.search_order())
    }
}
