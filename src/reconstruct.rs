//! Sequential placement driver shared by the Z-matrix conversions.
//!
//! Works on dense rows whose real references have already been remapped to
//! positional indices, so resolution is a plain vector lookup. Label
//! bookkeeping and error attribution stay in [`crate::zmat`].

use crate::algebra::{self, Placement};
use crate::reference::Reference;
use nalgebra::Vector3;

/// One row ready for placement. Real references are dense indices into
/// the rows placed so far; angles are in radians.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DenseRow {
    pub b: Reference,
    pub a: Reference,
    pub d: Reference,
    pub bond: f64,
    pub angle: f64,
    pub dihedral: f64,
}

/// Why the driver stopped, by dense row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriveError {
    /// The row's references are colinear or coincident.
    Degenerate(usize),
    /// The row references an atom that has not been placed yet.
    Unresolved { row: usize, referenced: usize },
}

/// Places every row in order, stopping at the first failure.
///
/// On success the returned positions are index-aligned with `rows`. On
/// failure nothing about the failing row is guessed at; the caller maps
/// the dense index back to an atom label.
pub(crate) fn reconstruct_positions(rows: &[DenseRow]) -> Result<Vec<Vector3<f64>>, DriveError> {
    let mut positions: Vec<Vector3<f64>> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let resolve = |reference: Reference| match reference {
            Reference::Anchor(anchor) => Ok(anchor.position()),
            Reference::Atom(j) if j < i => Ok(positions[j]),
            Reference::Atom(j) => Err(DriveError::Unresolved {
                row: i,
                referenced: j,
            }),
        };
        let pos_b = resolve(row.b)?;
        let pos_a = resolve(row.a)?;
        let pos_d = resolve(row.d)?;
        match algebra::place_atom(row.bond, row.angle, row.dihedral, pos_b, pos_a, pos_d) {
            Placement::Position(position) => positions.push(position),
            Placement::InvalidReference => return Err(DriveError::Degenerate(i)),
        }
    }
    Ok(positions)
}
