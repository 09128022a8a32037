//! Error types for coordinate construction and conversion.
//!
//! Every fallible operation in this crate returns [`CoordError`]. Failures
//! carry the atom labels involved so a caller can report which row of a
//! Z-matrix broke and why, rather than a bare message.

use crate::reference::Reference;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoordError>;

/// Errors raised while building or converting coordinate representations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Raw input records lack columns required for a meaningful molecule.
    #[error("columns missing for a meaningful description of a molecule: {}", missing.join(", "))]
    MissingColumns {
        /// Names of the absent columns, in canonical column order.
        missing: Vec<String>,
    },

    /// A construction table or definition order violates a structural rule.
    #[error("malformed construction table at atom {label}: {detail}")]
    MalformedConstructionTable {
        /// Label of the offending row.
        label: usize,
        /// Human-readable description of the violated rule.
        detail: String,
    },

    /// The references of a row are geometrically unusable: the three
    /// reference positions are colinear or coincident, so the atom's
    /// position (or its internal coordinates) cannot be determined.
    #[error("invalid reference at atom {label} (b: {b}, a: {a}, d: {d})")]
    InvalidReference {
        /// Label of the atom whose placement failed.
        label: usize,
        /// Bond reference of the failing row.
        b: Reference,
        /// Angle reference of the failing row.
        a: Reference,
        /// Dihedral reference of the failing row.
        d: Reference,
    },

    /// Two Z-matrices cannot be combined arithmetically.
    #[error("incompatible z-matrices: {0}")]
    IncompatibleZmatrices(String),

    /// A renumbering was given the wrong number of new labels.
    #[error("cannot renumber {rows} rows with {new} labels")]
    LengthMismatch {
        /// Number of rows in the structure being renumbered.
        rows: usize,
        /// Number of replacement labels supplied.
        new: usize,
    },

    /// A vector that must be normalized has (near-)zero length.
    #[error("cannot normalize a vector of norm {0:e}")]
    DegenerateVector(f64),
}
