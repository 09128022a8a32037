//! Sum-formula comparison across coordinate representations.
//!
//! Conversions between representations preserve the atoms of a molecule,
//! so comparing element counts is a cheap sanity check that two objects
//! describe the same chemical system, regardless of atom order or of the
//! representation they are stored in.

use std::collections::BTreeMap;

/// Types that know their element composition.
pub trait SumFormula {
    /// Counts atoms per element symbol.
    fn element_counts(&self) -> BTreeMap<String, usize>;

    /// Whether two molecules share the same sum formula.
    ///
    /// Atom order and labels are irrelevant; only the per-element counts
    /// are compared. Works across representations.
    fn has_same_sum_formula<T: SumFormula + ?Sized>(&self, other: &T) -> bool {
        self.element_counts() == other.element_counts()
    }
}

/// Tallies element symbols into an ordered map.
pub(crate) fn count_elements<'a>(atoms: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for atom in atoms {
        *counts.entry(atom.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Atoms(Vec<&'static str>);

    impl SumFormula for Atoms {
        fn element_counts(&self) -> BTreeMap<String, usize> {
            count_elements(self.0.iter().copied())
        }
    }

    #[test]
    fn test_element_counts() {
        let water = Atoms(vec!["O", "H", "H"]);
        let counts = water.element_counts();
        assert_eq!(counts.get("H"), Some(&2));
        assert_eq!(counts.get("O"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = Atoms(vec!["H", "O", "H"]);
        let b = Atoms(vec!["O", "H", "H"]);
        assert!(a.has_same_sum_formula(&b));
        assert!(b.has_same_sum_formula(&a));
    }

    #[test]
    fn test_composition_mismatch() {
        let hydroxide = Atoms(vec!["O", "H"]);
        let water = Atoms(vec!["O", "H", "H"]);
        assert!(!hydroxide.has_same_sum_formula(&water));
    }
}
