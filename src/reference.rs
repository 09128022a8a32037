//! References used by Z-matrix rows.
//!
//! Each Z-matrix row positions its atom relative to three references. A
//! reference is either an earlier atom of the same molecule or one of four
//! fixed [`Anchor`] points of the absolute frame. Anchors let the leading
//! rows of a Z-matrix pin the molecule in space, so every row carries a
//! full (b, a, d) triple and a round trip through internal coordinates
//! reproduces absolute positions, not just the molecular shape.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed point of the absolute coordinate frame.
///
/// The three axis anchors sit at unit distance from [`Anchor::Origin`]
/// along the corresponding axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    /// The point (0, 0, 0).
    Origin,
    /// The point (1, 0, 0).
    XAxis,
    /// The point (0, 1, 0).
    YAxis,
    /// The point (0, 0, 1).
    ZAxis,
}

impl Anchor {
    /// Absolute position of this anchor.
    ///
    /// # Examples
    ///
    /// ```
    /// use intcoord::Anchor;
    ///
    /// assert_eq!(Anchor::YAxis.position().y, 1.0);
    /// ```
    pub fn position(self) -> Vector3<f64> {
        match self {
            Anchor::Origin => Vector3::new(0.0, 0.0, 0.0),
            Anchor::XAxis => Vector3::new(1.0, 0.0, 0.0),
            Anchor::YAxis => Vector3::new(0.0, 1.0, 0.0),
            Anchor::ZAxis => Vector3::new(0.0, 0.0, 1.0),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Anchor::Origin => "origin",
            Anchor::XAxis => "x-axis",
            Anchor::YAxis => "y-axis",
            Anchor::ZAxis => "z-axis",
        };
        write!(f, "{}", name)
    }
}

/// A single reference slot of a Z-matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// An atom of the same molecule, identified by its label.
    Atom(usize),
    /// A fixed point of the absolute frame.
    Anchor(Anchor),
}

impl Reference {
    /// Returns the referenced atom label, or `None` for an anchor.
    pub fn atom(self) -> Option<usize> {
        match self {
            Reference::Atom(label) => Some(label),
            Reference::Anchor(_) => None,
        }
    }

    /// Whether this reference points at a real atom.
    pub fn is_atom(self) -> bool {
        matches!(self, Reference::Atom(_))
    }

    /// Whether this reference points at an absolute-frame anchor.
    pub fn is_anchor(self) -> bool {
        matches!(self, Reference::Anchor(_))
    }
}

impl From<Anchor> for Reference {
    fn from(anchor: Anchor) -> Self {
        Reference::Anchor(anchor)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Atom(label) => write!(f, "atom {}", label),
            Reference::Anchor(anchor) => write!(f, "{} anchor", anchor),
        }
    }
}

/// Picks the anchor with the longest lever arm about an axis.
///
/// Each candidate is scored by the norm of the cross product between its
/// offset from `from` and the unit axis; the first maximum in the fixed
/// candidate order x, y, z, origin wins. Used when synthesizing
/// references for atoms with too few earlier neighbors.
pub(crate) fn best_anchor(
    exclude: Option<Anchor>,
    from: Vector3<f64>,
    axis: Vector3<f64>,
) -> Anchor {
    let axis_hat = match crate::algebra::normalize(axis) {
        Ok(unit) => unit,
        Err(_) => Vector3::zeros(),
    };
    let mut best = Anchor::XAxis;
    let mut best_score = f64::NEG_INFINITY;
    for candidate in [Anchor::XAxis, Anchor::YAxis, Anchor::ZAxis, Anchor::Origin] {
        if Some(candidate) == exclude {
            continue;
        }
        let score = (candidate.position() - from).cross(&axis_hat).norm();
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}
