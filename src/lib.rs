#![deny(missing_docs)]

//! intcoord - Z-matrix and Cartesian molecular coordinate interconversion
//!
//! A Z-matrix describes each atom by a bond length, an angle and a
//! dihedral measured against three references. Here every row carries a
//! full reference triple: references are either earlier atoms or fixed
//! [`Anchor`] points of the absolute frame, so the leading rows pin the
//! molecule in space and a round trip through internal coordinates
//! reproduces absolute positions, not just the molecular shape.
//!
//! # Features
//!
//! - **Validated construction tables**: reference topology separated from
//!   coordinate values and checked once, at construction
//! - **Cartesian reconstruction**: precise failure attribution, plus
//!   dummy-atom repair for rows whose references are colinear
//! - **Internal coordinate derivation**: exact inverse of reconstruction,
//!   with a heuristic for synthesizing a construction table from scratch
//! - **Z-matrix arithmetic**: row-wise sums, differences and scalings for
//!   displacements and interpolation in internal coordinates
//! - **Bookkeeping**: simultaneous relabeling, sum-formula comparison and
//!   serde-ready exchange records
//!
//! # Quick Start
//!
//! ```
//! use intcoord::{Anchor, Reference, SumFormula, Zmat, ZmatRecord};
//!
//! // Water: oxygen pinned to the absolute frame, hydrogens measured
//! // against it.
//! let rows = vec![
//!     ZmatRecord {
//!         label: 0,
//!         atom: "O".to_string(),
//!         b: Anchor::Origin.into(),
//!         bond: 0.0,
//!         a: Anchor::XAxis.into(),
//!         angle: 0.0,
//!         d: Anchor::YAxis.into(),
//!         dihedral: 0.0,
//!     },
//!     ZmatRecord {
//!         label: 1,
//!         atom: "H".to_string(),
//!         b: Reference::Atom(0),
//!         bond: 0.9584,
//!         a: Anchor::XAxis.into(),
//!         angle: 0.0,
//!         d: Anchor::YAxis.into(),
//!         dihedral: 0.0,
//!     },
//!     ZmatRecord {
//!         label: 2,
//!         atom: "H".to_string(),
//!         b: Reference::Atom(0),
//!         bond: 0.9584,
//!         a: Reference::Atom(1),
//!         angle: 104.45,
//!         d: Anchor::YAxis.into(),
//!         dihedral: 0.0,
//!     },
//! ];
//! let zmat = Zmat::new(rows, None)?;
//!
//! let cartesian = zmat.to_cartesian()?;
//! let oxygen = cartesian.position(0).unwrap();
//! let hydrogen = cartesian.position(2).unwrap();
//! assert!(((hydrogen - oxygen).norm() - 0.9584).abs() < 1e-9);
//!
//! // and back again, against the same reference topology
//! let restored = cartesian.to_zmat(&zmat.construction_table())?;
//! assert!((restored.records()[2].angle - 104.45).abs() < 1e-6);
//! assert!(zmat.has_same_sum_formula(&restored));
//! # Ok::<(), intcoord::CoordError>(())
//! ```

pub mod algebra;
pub mod cartesian;
pub mod construction;
pub mod error;
pub mod formula;
mod reconstruct;
pub mod reference;
pub mod zmat;

pub use cartesian::{Cartesian, CartesianRecord, RawCartesianRecord};
pub use construction::{ConstructionRow, ConstructionTable};
pub use error::{CoordError, Result};
pub use formula::SumFormula;
pub use reference::{Anchor, Reference};
pub use zmat::{RawZmatRecord, Zmat, ZmatRecord};
