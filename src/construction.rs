//! Construction tables describing the reference topology of a Z-matrix.
//!
//! A construction table is the Z-matrix stripped of its values: for each
//! atom, just the (b, a, d) reference triple and the order in which atoms
//! are defined. Two Z-matrices with equal construction tables describe
//! their atoms against the same frames, which is what makes row-wise
//! arithmetic between them meaningful.

use crate::error::{CoordError, Result};
use crate::reference::Reference;
use std::collections::HashSet;

/// The reference triple defining one atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionRow {
    /// Label of the atom this row defines.
    pub label: usize,
    /// Bond reference.
    pub b: Reference,
    /// Angle reference.
    pub a: Reference,
    /// Dihedral reference.
    pub d: Reference,
}

/// A validated, ordered sequence of construction rows.
///
/// Row order is definition order: every real reference of a row must
/// point at an atom defined in an earlier row, the first row may only
/// reference absolute anchors, and every later row must bond to a real
/// atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionTable {
    rows: Vec<ConstructionRow>,
}

impl ConstructionTable {
    /// Builds a table after checking the structural rules.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MalformedConstructionTable`] naming the
    /// first offending row.
    pub fn new(rows: Vec<ConstructionRow>) -> Result<Self> {
        Self::validate(&rows)?;
        Ok(Self { rows })
    }

    /// Checks the structural rules without building a table.
    pub fn validate(rows: &[ConstructionRow]) -> Result<()> {
        let mut defined: HashSet<usize> = HashSet::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if defined.contains(&row.label) {
                return Err(CoordError::MalformedConstructionTable {
                    label: row.label,
                    detail: "label appears more than once".to_string(),
                });
            }
            if i == 0 {
                if row.b.is_atom() || row.a.is_atom() || row.d.is_atom() {
                    return Err(CoordError::MalformedConstructionTable {
                        label: row.label,
                        detail: "the first row must reference absolute anchors only".to_string(),
                    });
                }
            } else if !row.b.is_atom() {
                return Err(CoordError::MalformedConstructionTable {
                    label: row.label,
                    detail: "rows after the first must bond to a real atom".to_string(),
                });
            }
            for (slot, reference) in [("b", row.b), ("a", row.a), ("d", row.d)] {
                if let Reference::Atom(other) = reference {
                    if !defined.contains(&other) {
                        return Err(CoordError::MalformedConstructionTable {
                            label: row.label,
                            detail: format!(
                                "{} reference {} is not defined in an earlier row",
                                slot, other
                            ),
                        });
                    }
                }
            }
            defined.insert(row.label);
        }
        Ok(())
    }

    /// Wraps rows already known to satisfy the structural rules.
    pub(crate) fn from_validated(rows: Vec<ConstructionRow>) -> Self {
        debug_assert!(Self::validate(&rows).is_ok());
        Self { rows }
    }

    /// The rows in definition order.
    pub fn rows(&self) -> &[ConstructionRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up the row defining `label`.
    pub fn get(&self, label: usize) -> Option<&ConstructionRow> {
        self.rows.iter().find(|row| row.label == label)
    }
}
