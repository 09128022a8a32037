//! Z-matrix representation of a molecule.
//!
//! A [`Zmat`] stores one row per atom: an element symbol, three
//! [`Reference`]s and the bond, angle and dihedral measured against them.
//! Angles are degrees; bond lengths are whatever length unit the caller
//! works in. Because the leading rows reference absolute-frame anchors,
//! a Z-matrix fixes the molecule in space and [`Zmat::to_cartesian`]
//! reproduces absolute positions, not just the shape.
//!
//! Rows are kept in storage order, which is the order records were given
//! in and the order they are returned in. Reconstruction instead walks
//! the definition order, a permutation of the labels in which every real
//! reference points backwards. The two usually coincide but are tracked
//! separately, so rows may be stored in any order a caller finds
//! convenient.

use crate::algebra::{self, COLINEAR_TOL, NORM_TOL};
use crate::cartesian::{Cartesian, CartesianRecord};
use crate::construction::{ConstructionRow, ConstructionTable};
use crate::error::{CoordError, Result};
use crate::formula::{self, SumFormula};
use crate::reconstruct::{reconstruct_positions, DenseRow, DriveError};
use crate::reference::{best_anchor, Reference};
use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::{Mul, Neg};

/// One fully-specified Z-matrix row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZmatRecord {
    /// Label identifying the atom across representations.
    pub label: usize,
    /// Element symbol, e.g. `"O"` or `"X"` for a dummy atom.
    pub atom: String,
    /// Bond reference.
    pub b: Reference,
    /// Distance to the bond reference.
    pub bond: f64,
    /// Angle reference.
    pub a: Reference,
    /// Angle at the bond reference, in degrees.
    pub angle: f64,
    /// Dihedral reference.
    pub d: Reference,
    /// Torsion about the b-a axis, in degrees.
    pub dihedral: f64,
}

/// A Z-matrix row as read from an external source, before completeness
/// has been checked. Absent fields deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawZmatRecord {
    /// Label identifying the atom.
    pub label: Option<usize>,
    /// Element symbol.
    pub atom: Option<String>,
    /// Bond reference.
    pub b: Option<Reference>,
    /// Distance to the bond reference.
    pub bond: Option<f64>,
    /// Angle reference.
    pub a: Option<Reference>,
    /// Angle in degrees.
    pub angle: Option<f64>,
    /// Dihedral reference.
    pub d: Option<Reference>,
    /// Dihedral in degrees.
    pub dihedral: Option<f64>,
}

/// Canonical column order for Z-matrix records.
const ZMAT_COLUMNS: [&str; 8] = [
    "label", "atom", "b", "bond", "a", "angle", "d", "dihedral",
];

/// A molecule in internal coordinates.
///
/// Construction validates the reference topology once; every operation
/// afterwards can rely on it. Values are not range-checked, so the
/// results of [`Zmat::try_sub`] and scalar arithmetic, whose angles may
/// leave the chemically meaningful ranges, are legal Z-matrices.
///
/// # Examples
///
/// ```
/// use intcoord::{Anchor, Reference, Zmat, ZmatRecord};
///
/// let rows = vec![
///     ZmatRecord {
///         label: 0,
///         atom: "C".to_string(),
///         b: Anchor::Origin.into(),
///         bond: 0.0,
///         a: Anchor::XAxis.into(),
///         angle: 0.0,
///         d: Anchor::YAxis.into(),
///         dihedral: 0.0,
///     },
///     ZmatRecord {
///         label: 1,
///         atom: "O".to_string(),
///         b: Reference::Atom(0),
///         bond: 1.128,
///         a: Anchor::XAxis.into(),
///         angle: 0.0,
///         d: Anchor::YAxis.into(),
///         dihedral: 0.0,
///     },
/// ];
/// let zmat = Zmat::new(rows, None)?;
/// assert_eq!(zmat.len(), 2);
/// # Ok::<(), intcoord::CoordError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Zmat {
    rows: Vec<ZmatRecord>,
    order: Vec<usize>,
}

impl Zmat {
    /// Builds a Z-matrix from records and an optional definition order.
    ///
    /// When `order` is `None` the storage order of `records` is used.
    /// The definition order must cover exactly the record labels, and
    /// the resulting reference topology must satisfy the construction
    /// table rules.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MalformedConstructionTable`] naming the
    /// first offending label.
    pub fn new(records: Vec<ZmatRecord>, order: Option<Vec<usize>>) -> Result<Self> {
        let mut unique = HashSet::with_capacity(records.len());
        for record in &records {
            if !unique.insert(record.label) {
                return Err(CoordError::MalformedConstructionTable {
                    label: record.label,
                    detail: "label appears more than once".to_string(),
                });
            }
        }
        let order = match order {
            Some(order) => {
                Self::check_order(&records, &order)?;
                order
            }
            None => records.iter().map(|record| record.label).collect(),
        };
        let table_rows = Self::table_rows_in(&records, &order)?;
        ConstructionTable::validate(&table_rows)?;
        Ok(Self {
            rows: records,
            order,
        })
    }

    /// Builds a Z-matrix from raw records, checking column completeness
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MissingColumns`] listing every column that
    /// is absent in at least one record, in canonical column order.
    /// Complete records are then validated as in [`Zmat::new`].
    pub fn from_raw_records(raw: &[RawZmatRecord], order: Option<Vec<usize>>) -> Result<Self> {
        let mut absent = [false; 8];
        for record in raw {
            let flags = [
                record.label.is_none(),
                record.atom.is_none(),
                record.b.is_none(),
                record.bond.is_none(),
                record.a.is_none(),
                record.angle.is_none(),
                record.d.is_none(),
                record.dihedral.is_none(),
            ];
            for (seen, flag) in absent.iter_mut().zip(flags) {
                *seen |= flag;
            }
        }
        let missing: Vec<String> = ZMAT_COLUMNS
            .iter()
            .zip(absent)
            .filter(|(_, absent)| *absent)
            .map(|(column, _)| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CoordError::MissingColumns { missing });
        }
        let records = raw
            .iter()
            .map(|record| {
                Ok(ZmatRecord {
                    label: required(record.label, "label")?,
                    atom: required(record.atom.clone(), "atom")?,
                    b: required(record.b, "b")?,
                    bond: required(record.bond, "bond")?,
                    a: required(record.a, "a")?,
                    angle: required(record.angle, "angle")?,
                    d: required(record.d, "d")?,
                    dihedral: required(record.dihedral, "dihedral")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(records, order)
    }

    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the Z-matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows in storage order.
    pub fn records(&self) -> &[ZmatRecord] {
        &self.rows
    }

    /// Copies the rows out, e.g. for serialization.
    pub fn to_records(&self) -> Vec<ZmatRecord> {
        self.rows.clone()
    }

    /// Looks up the row for `label`.
    pub fn get(&self, label: usize) -> Option<&ZmatRecord> {
        self.rows.iter().find(|record| record.label == label)
    }

    /// Labels in storage order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|record| record.label)
    }

    /// The definition order: labels in the order atoms are placed.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Projects out the reference topology, in definition order.
    ///
    /// Two Z-matrices can be combined arithmetically exactly when their
    /// rows agree on everything this table contains.
    pub fn construction_table(&self) -> ConstructionTable {
        let rows = self
            .order
            .iter()
            .filter_map(|&label| {
                self.get(label).map(|record| ConstructionRow {
                    label,
                    b: record.b,
                    a: record.a,
                    d: record.d,
                })
            })
            .collect();
        ConstructionTable::from_validated(rows)
    }

    /// Row-wise sum of the bond, angle and dihedral columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::IncompatibleZmatrices`] unless both
    /// operands have identical labels, elements, references and
    /// definition orders. Neither operand is modified on failure.
    pub fn try_add(&self, other: &Zmat) -> Result<Zmat> {
        self.check_combinable(other)?;
        Ok(self.zip_values(other, |x, y| x + y))
    }

    /// Row-wise difference of the bond, angle and dihedral columns.
    ///
    /// The result is a displacement in internal coordinates; its values
    /// may be negative or otherwise outside chemical ranges.
    ///
    /// # Errors
    ///
    /// Same compatibility requirements as [`Zmat::try_add`].
    pub fn try_sub(&self, other: &Zmat) -> Result<Zmat> {
        self.check_combinable(other)?;
        Ok(self.zip_values(other, |x, y| x - y))
    }

    /// Absolute value of every bond, angle and dihedral.
    pub fn abs(&self) -> Zmat {
        self.map_values(f64::abs)
    }

    /// Returns a copy with every label replaced at once.
    ///
    /// `new_labels` pairs up with the rows in storage order; references
    /// and the definition order are rewritten through the same mapping,
    /// so old and new label sets may overlap freely. `None` assigns
    /// `0..n` in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::LengthMismatch`] when the label count is
    /// wrong, or [`CoordError::MalformedConstructionTable`] when the new
    /// labels repeat.
    pub fn renumbered(&self, new_labels: Option<&[usize]>) -> Result<Zmat> {
        let new_labels: Vec<usize> = match new_labels {
            Some(labels) => {
                if labels.len() != self.rows.len() {
                    return Err(CoordError::LengthMismatch {
                        rows: self.rows.len(),
                        new: labels.len(),
                    });
                }
                labels.to_vec()
            }
            None => (0..self.rows.len()).collect(),
        };
        let mut unique = HashSet::with_capacity(new_labels.len());
        for &label in &new_labels {
            if !unique.insert(label) {
                return Err(CoordError::MalformedConstructionTable {
                    label,
                    detail: "replacement labels repeat a label".to_string(),
                });
            }
        }
        let map: HashMap<usize, usize> = self
            .rows
            .iter()
            .map(|record| record.label)
            .zip(new_labels.iter().copied())
            .collect();
        let relabel = |reference: Reference| match reference {
            Reference::Atom(old) => match map.get(&old) {
                Some(&new) => Reference::Atom(new),
                None => reference,
            },
            anchor => anchor,
        };
        let rows: Vec<ZmatRecord> = self
            .rows
            .iter()
            .zip(new_labels.iter())
            .map(|(record, &label)| ZmatRecord {
                label,
                atom: record.atom.clone(),
                b: relabel(record.b),
                bond: record.bond,
                a: relabel(record.a),
                angle: record.angle,
                d: relabel(record.d),
                dihedral: record.dihedral,
            })
            .collect();
        let order: Vec<usize> = self
            .order
            .iter()
            .map(|old| map.get(old).copied().unwrap_or(*old))
            .collect();
        Zmat::new(rows, Some(order))
    }

    /// In-place version of [`Zmat::renumbered`]. The receiver is left
    /// untouched when the relabeling is rejected.
    pub fn renumber(&mut self, new_labels: Option<&[usize]>) -> Result<()> {
        *self = self.renumbered(new_labels)?;
        Ok(())
    }

    /// Reconstructs absolute Cartesian positions.
    ///
    /// Atoms are placed along the definition order; the returned
    /// [`Cartesian`] lists them in this Z-matrix's storage order with
    /// the same labels. The receiver is never modified, so a failed
    /// conversion leaves it fully usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::InvalidReference`] for the first atom, in
    /// definition order, whose references are colinear or coincident.
    /// [`Zmat::insert_dummy`] can repair such a row.
    pub fn to_cartesian(&self) -> Result<Cartesian> {
        debug!("reconstructing cartesian positions for {} atoms", self.len());
        let dense = self.dense_rows(self.len())?;
        let positions =
            reconstruct_positions(&dense).map_err(|error| self.drive_error(error))?;
        let mut position_of: HashMap<usize, Vector3<f64>> = HashMap::with_capacity(self.len());
        for (i, &label) in self.order.iter().enumerate() {
            position_of.insert(label, positions[i]);
        }
        let records = self
            .rows
            .iter()
            .map(|record| {
                let position = position_of.get(&record.label).copied().ok_or_else(|| {
                    CoordError::MalformedConstructionTable {
                        label: record.label,
                        detail: "row is missing from the definition order".to_string(),
                    }
                })?;
                Ok(CartesianRecord {
                    label: record.label,
                    atom: record.atom.clone(),
                    x: position.x,
                    y: position.y,
                    z: position.z,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Cartesian::new(records)
    }

    /// Returns a copy with a dummy atom inserted ahead of `label`.
    ///
    /// This is the standard repair when [`Zmat::to_cartesian`] reports
    /// an [`CoordError::InvalidReference`]: the atoms preceding `label`
    /// are placed as usual, a dummy atom (element `"X"`) is positioned
    /// at unit distance from the angle reference, perpendicular to the
    /// b-a axis in the plane of the three references, and the flagged
    /// row's dihedral reference is redirected at the dummy. When the
    /// three references are exactly colinear there is no such plane and
    /// the coordinate axis least aligned with the b-a direction orients
    /// the dummy instead.
    ///
    /// The dummy receives the smallest label above every existing one
    /// and sits immediately before `label` in both storage and
    /// definition order. Its own references are the flagged row's b and
    /// a (the real one first) plus the nearest earlier atom clear of the
    /// b-a axis, or the anchor with the longest lever arm off that axis
    /// when no such atom exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MalformedConstructionTable`] for an unknown
    /// label or the first defined atom, and
    /// [`CoordError::InvalidReference`] when an atom preceding `label`
    /// cannot be placed or when `label`'s b and a references coincide.
    pub fn insert_dummy(&self, label: usize) -> Result<Zmat> {
        let storage_idx = self
            .rows
            .iter()
            .position(|record| record.label == label)
            .ok_or_else(|| CoordError::MalformedConstructionTable {
                label,
                detail: "no row with this label".to_string(),
            })?;
        let def_idx = self
            .order
            .iter()
            .position(|&other| other == label)
            .ok_or_else(|| CoordError::MalformedConstructionTable {
                label,
                detail: "row is missing from the definition order".to_string(),
            })?;
        if def_idx == 0 {
            return Err(CoordError::MalformedConstructionTable {
                label,
                detail: "cannot insert a dummy before the first defined atom".to_string(),
            });
        }
        debug!("inserting a dummy atom ahead of atom {}", label);

        let prefix = self.dense_rows(def_idx)?;
        let positions =
            reconstruct_positions(&prefix).map_err(|error| self.drive_error(error))?;
        let row = self.rows[storage_idx].clone();
        let resolve = |reference: Reference| -> Result<Vector3<f64>> {
            match reference {
                Reference::Anchor(anchor) => Ok(anchor.position()),
                Reference::Atom(other) => self
                    .order
                    .iter()
                    .take(def_idx)
                    .position(|&earlier| earlier == other)
                    .map(|dense| positions[dense])
                    .ok_or_else(|| CoordError::MalformedConstructionTable {
                        label,
                        detail: format!("reference {} is not defined before this row", other),
                    }),
            }
        };
        let pos_b = resolve(row.b)?;
        let pos_a = resolve(row.a)?;
        let pos_d = resolve(row.d)?;

        let ba = pos_a - pos_b;
        let ba_hat = algebra::normalize(ba).map_err(|_| CoordError::InvalidReference {
            label,
            b: row.b,
            a: row.a,
            d: row.d,
        })?;

        // Dummy direction: perpendicular to b-a within the reference
        // plane, via the double cross product. Exactly colinear
        // references leave no plane, so a coordinate axis steps in.
        let n1 = ba.cross(&(pos_d - pos_a));
        let n2 = if n1.cross(&ba).norm() <= NORM_TOL {
            let (axis_name, axis) = least_aligned_axis(ba_hat);
            warn!(
                "references of atom {} are colinear, orienting its dummy along the {} axis",
                label, axis_name
            );
            algebra::normalize(ba.cross(&axis).cross(&ba))?
        } else {
            algebra::normalize(n1.cross(&ba))?
        };
        let dummy_pos = pos_a + n2;

        let dummy_label = self
            .rows
            .iter()
            .map(|record| record.label)
            .max()
            .map_or(0, |highest| highest + 1);
        let (dummy_b, dummy_a, pos_db, pos_da) = if row.a.is_atom() {
            (row.a, row.b, pos_a, pos_b)
        } else {
            (row.b, row.a, pos_b, pos_a)
        };

        let mut nearest: Option<(usize, f64)> = None;
        for (dense, &candidate) in self.order.iter().take(def_idx).enumerate() {
            let off_axis = (positions[dense] - pos_b).cross(&ba_hat).norm();
            if off_axis <= COLINEAR_TOL {
                continue;
            }
            let distance = (positions[dense] - pos_a).norm();
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((candidate, distance));
            }
        }
        let (dummy_d, pos_dd) = match nearest {
            Some((candidate, _)) => (Reference::Atom(candidate), resolve(Reference::Atom(candidate))?),
            None => {
                let anchor = best_anchor(None, pos_b, ba);
                (Reference::Anchor(anchor), anchor.position())
            }
        };

        let (bond, angle, dihedral) = algebra::derive_internal(dummy_pos, pos_db, pos_da, pos_dd)
            .map_err(|_| CoordError::InvalidReference {
                label,
                b: dummy_b,
                a: dummy_a,
                d: dummy_d,
            })?;
        let dummy = ZmatRecord {
            label: dummy_label,
            atom: "X".to_string(),
            b: dummy_b,
            bond,
            a: dummy_a,
            angle: angle.to_degrees(),
            d: dummy_d,
            dihedral: dihedral.to_degrees(),
        };

        let mut rows = self.rows.clone();
        rows.insert(storage_idx, dummy);
        rows[storage_idx + 1].d = Reference::Atom(dummy_label);
        let mut order = self.order.clone();
        order.insert(def_idx, dummy_label);
        Zmat::new(rows, Some(order))
    }

    fn check_order(records: &[ZmatRecord], order: &[usize]) -> Result<()> {
        let labels: HashSet<usize> = records.iter().map(|record| record.label).collect();
        let mut seen = HashSet::with_capacity(order.len());
        for &label in order {
            if !labels.contains(&label) {
                return Err(CoordError::MalformedConstructionTable {
                    label,
                    detail: "definition order names a label with no row".to_string(),
                });
            }
            if !seen.insert(label) {
                return Err(CoordError::MalformedConstructionTable {
                    label,
                    detail: "definition order repeats a label".to_string(),
                });
            }
        }
        for record in records {
            if !seen.contains(&record.label) {
                return Err(CoordError::MalformedConstructionTable {
                    label: record.label,
                    detail: "row is missing from the definition order".to_string(),
                });
            }
        }
        Ok(())
    }

    fn table_rows_in(records: &[ZmatRecord], order: &[usize]) -> Result<Vec<ConstructionRow>> {
        let by_label: HashMap<usize, &ZmatRecord> =
            records.iter().map(|record| (record.label, record)).collect();
        order
            .iter()
            .map(|&label| {
                by_label
                    .get(&label)
                    .map(|record| ConstructionRow {
                        label,
                        b: record.b,
                        a: record.a,
                        d: record.d,
                    })
                    .ok_or_else(|| CoordError::MalformedConstructionTable {
                        label,
                        detail: "definition order names a label with no row".to_string(),
                    })
            })
            .collect()
    }

    /// Dense rows for the first `upto` atoms of the definition order,
    /// with real references remapped to definition positions and the
    /// angle columns converted from degrees to radians.
    fn dense_rows(&self, upto: usize) -> Result<Vec<DenseRow>> {
        let dense_of: HashMap<usize, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, &label)| (label, i))
            .collect();
        let by_label: HashMap<usize, &ZmatRecord> =
            self.rows.iter().map(|record| (record.label, record)).collect();
        let mut rows = Vec::with_capacity(upto);
        for &label in self.order.iter().take(upto) {
            let record = by_label.get(&label).ok_or_else(|| {
                CoordError::MalformedConstructionTable {
                    label,
                    detail: "definition order names a label with no row".to_string(),
                }
            })?;
            let remap = |reference: Reference| -> Result<Reference> {
                match reference {
                    Reference::Anchor(_) => Ok(reference),
                    Reference::Atom(other) => dense_of
                        .get(&other)
                        .map(|&i| Reference::Atom(i))
                        .ok_or_else(|| CoordError::MalformedConstructionTable {
                            label,
                            detail: format!("reference {} has no row", other),
                        }),
                }
            };
            rows.push(DenseRow {
                b: remap(record.b)?,
                a: remap(record.a)?,
                d: remap(record.d)?,
                bond: record.bond,
                angle: record.angle.to_radians(),
                dihedral: record.dihedral.to_radians(),
            });
        }
        Ok(rows)
    }

    /// Maps a dense-row failure back to the offending label.
    fn drive_error(&self, error: DriveError) -> CoordError {
        match error {
            DriveError::Degenerate(i) => self.invalid_reference_at(self.order[i]),
            DriveError::Unresolved { row, referenced } => CoordError::MalformedConstructionTable {
                label: self.order[row],
                detail: format!("reference to atom {} which is defined later", self.order[referenced]),
            },
        }
    }

    fn invalid_reference_at(&self, label: usize) -> CoordError {
        match self.get(label) {
            Some(record) => CoordError::InvalidReference {
                label,
                b: record.b,
                a: record.a,
                d: record.d,
            },
            None => CoordError::MalformedConstructionTable {
                label,
                detail: "definition order names a label with no row".to_string(),
            },
        }
    }

    fn check_combinable(&self, other: &Zmat) -> Result<()> {
        if self.rows.len() != other.rows.len() {
            return Err(CoordError::IncompatibleZmatrices(format!(
                "row counts differ: {} vs {}",
                self.rows.len(),
                other.rows.len()
            )));
        }
        for (mine, theirs) in self.rows.iter().zip(other.rows.iter()) {
            if mine.label != theirs.label
                || mine.atom != theirs.atom
                || mine.b != theirs.b
                || mine.a != theirs.a
                || mine.d != theirs.d
            {
                return Err(CoordError::IncompatibleZmatrices(format!(
                    "row for atom {} differs in element or references",
                    mine.label
                )));
            }
        }
        if self.order != other.order {
            return Err(CoordError::IncompatibleZmatrices(
                "definition orders differ".to_string(),
            ));
        }
        Ok(())
    }

    fn zip_values(&self, other: &Zmat, f: impl Fn(f64, f64) -> f64) -> Zmat {
        let rows = self
            .rows
            .iter()
            .zip(other.rows.iter())
            .map(|(mine, theirs)| ZmatRecord {
                bond: f(mine.bond, theirs.bond),
                angle: f(mine.angle, theirs.angle),
                dihedral: f(mine.dihedral, theirs.dihedral),
                ..mine.clone()
            })
            .collect();
        Zmat {
            rows,
            order: self.order.clone(),
        }
    }

    fn map_values(&self, f: impl Fn(f64) -> f64) -> Zmat {
        let rows = self
            .rows
            .iter()
            .map(|record| ZmatRecord {
                bond: f(record.bond),
                angle: f(record.angle),
                dihedral: f(record.dihedral),
                ..record.clone()
            })
            .collect();
        Zmat {
            rows,
            order: self.order.clone(),
        }
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| CoordError::MissingColumns {
        missing: vec![column.to_string()],
    })
}

/// Coordinate axis least aligned with `direction`, for orienting a dummy
/// atom when the reference plane has collapsed.
fn least_aligned_axis(direction: Vector3<f64>) -> (&'static str, Vector3<f64>) {
    let axes = [("x", Vector3::x()), ("y", Vector3::y()), ("z", Vector3::z())];
    let mut best = axes[0];
    let mut best_score = f64::INFINITY;
    for (name, axis) in axes {
        let score = direction.dot(&axis).abs();
        if score < best_score {
            best_score = score;
            best = (name, axis);
        }
    }
    best
}

impl Mul<f64> for &Zmat {
    type Output = Zmat;

    fn mul(self, scale: f64) -> Zmat {
        self.map_values(|value| value * scale)
    }
}

impl Mul<f64> for Zmat {
    type Output = Zmat;

    fn mul(self, scale: f64) -> Zmat {
        &self * scale
    }
}

impl Mul<&Zmat> for f64 {
    type Output = Zmat;

    fn mul(self, zmat: &Zmat) -> Zmat {
        zmat.map_values(|value| value * self)
    }
}

impl Mul<Zmat> for f64 {
    type Output = Zmat;

    fn mul(self, zmat: Zmat) -> Zmat {
        self * &zmat
    }
}

impl Neg for &Zmat {
    type Output = Zmat;

    fn neg(self) -> Zmat {
        self.map_values(|value| -value)
    }
}

impl Neg for Zmat {
    type Output = Zmat;

    fn neg(self) -> Zmat {
        -&self
    }
}

impl SumFormula for Zmat {
    fn element_counts(&self) -> BTreeMap<String, usize> {
        formula::count_elements(self.rows.iter().map(|record| record.atom.as_str()))
    }
}
