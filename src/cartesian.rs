//! Cartesian representation of a molecule.
//!
//! A [`Cartesian`] is a flat list of labeled atoms with absolute
//! positions. It is the dual of [`Zmat`]: [`Cartesian::to_zmat`] derives
//! internal coordinates against a construction table, and
//! [`Cartesian::construction_table`] synthesizes a reasonable table from
//! the positions alone, preferring nearby real atoms as references and
//! falling back to absolute-frame anchors while too few atoms exist.

use crate::algebra;
use crate::construction::{ConstructionRow, ConstructionTable};
use crate::error::{CoordError, Result};
use crate::formula::{self, SumFormula};
use crate::reference::{best_anchor, Anchor, Reference};
use crate::zmat::{Zmat, ZmatRecord};
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One atom with an absolute position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianRecord {
    /// Label identifying the atom across representations.
    pub label: usize,
    /// Element symbol.
    pub atom: String,
    /// Position along x.
    pub x: f64,
    /// Position along y.
    pub y: f64,
    /// Position along z.
    pub z: f64,
}

/// A Cartesian row as read from an external source, before completeness
/// has been checked. Absent fields deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCartesianRecord {
    /// Label identifying the atom.
    pub label: Option<usize>,
    /// Element symbol.
    pub atom: Option<String>,
    /// Position along x.
    pub x: Option<f64>,
    /// Position along y.
    pub y: Option<f64>,
    /// Position along z.
    pub z: Option<f64>,
}

/// Canonical column order for Cartesian records.
const CARTESIAN_COLUMNS: [&str; 5] = ["label", "atom", "x", "y", "z"];

/// A molecule in absolute Cartesian coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Cartesian {
    rows: Vec<CartesianRecord>,
}

impl Cartesian {
    /// Builds a molecule from records, rejecting duplicate labels.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MalformedConstructionTable`] naming the
    /// first repeated label.
    pub fn new(records: Vec<CartesianRecord>) -> Result<Self> {
        let mut unique = HashSet::with_capacity(records.len());
        for record in &records {
            if !unique.insert(record.label) {
                return Err(CoordError::MalformedConstructionTable {
                    label: record.label,
                    detail: "label appears more than once".to_string(),
                });
            }
        }
        Ok(Self { rows: records })
    }

    /// Builds a molecule from raw records, checking column completeness
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MissingColumns`] listing every column that
    /// is absent in at least one record, in canonical column order.
    pub fn from_raw_records(raw: &[RawCartesianRecord]) -> Result<Self> {
        let mut absent = [false; 5];
        for record in raw {
            let flags = [
                record.label.is_none(),
                record.atom.is_none(),
                record.x.is_none(),
                record.y.is_none(),
                record.z.is_none(),
            ];
            for (seen, flag) in absent.iter_mut().zip(flags) {
                *seen |= flag;
            }
        }
        let missing: Vec<String> = CARTESIAN_COLUMNS
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
                Ok(CartesianRecord {
                    label: required(record.label, "label")?,
                    atom: required(record.atom.clone(), "atom")?,
                    x: required(record.x, "x")?,
                    y: required(record.y, "y")?,
                    z: required(record.z, "z")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(records)
    }

    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the molecule has no atoms.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows in storage order.
    pub fn records(&self) -> &[CartesianRecord] {
        &self.rows
    }

    /// Copies the rows out, e.g. for serialization.
    pub fn to_records(&self) -> Vec<CartesianRecord> {
        self.rows.clone()
    }

    /// Looks up the row for `label`.
    pub fn get(&self, label: usize) -> Option<&CartesianRecord> {
        self.rows.iter().find(|record| record.label == label)
    }

    /// Labels in storage order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|record| record.label)
    }

    /// Position of the atom with `label`, if present.
    pub fn position(&self, label: usize) -> Option<Vector3<f64>> {
        self.get(label)
            .map(|record| Vector3::new(record.x, record.y, record.z))
    }

    /// Synthesizes a construction table from the positions.
    ///
    /// Works through the atoms in storage order. Each atom bonds to its
    /// nearest predecessor; the angle reference is the predecessor
    /// nearest to that bond partner and the dihedral reference the
    /// predecessor nearest to the angle partner. While fewer than three
    /// predecessors exist, the slots are filled with the anchors that
    /// have the longest lever arm off the axis already chosen, so the
    /// first rows pin the absolute frame.
    ///
    /// The result always satisfies the construction table rules, but a
    /// derived dihedral can still be degenerate for colinear molecules;
    /// [`Cartesian::to_zmat`] reports such rows.
    pub fn construction_table(&self) -> ConstructionTable {
        debug!("synthesizing a construction table for {} atoms", self.len());
        let points: Vec<Vector3<f64>> = self
            .rows
            .iter()
            .map(|record| Vector3::new(record.x, record.y, record.z))
            .collect();
        let mut rows = Vec::with_capacity(points.len());
        for (i, &point) in points.iter().enumerate() {
            let (b, a, d) = if i == 0 {
                (
                    Reference::Anchor(Anchor::Origin),
                    Reference::Anchor(Anchor::XAxis),
                    Reference::Anchor(Anchor::YAxis),
                )
            } else {
                let b_idx = nearest(&points[..i], point, &[]);
                if i == 1 {
                    let a = best_anchor(None, points[b_idx], point - points[b_idx]);
                    let d = best_anchor(Some(a), a.position(), a.position() - points[b_idx]);
                    (
                        Reference::Atom(self.rows[b_idx].label),
                        Reference::Anchor(a),
                        Reference::Anchor(d),
                    )
                } else {
                    let a_idx = nearest(&points[..i], points[b_idx], &[b_idx]);
                    let d = if i == 2 {
                        let anchor =
                            best_anchor(None, points[a_idx], points[a_idx] - points[b_idx]);
                        Reference::Anchor(anchor)
                    } else {
                        let d_idx = nearest(&points[..i], points[a_idx], &[b_idx, a_idx]);
                        Reference::Atom(self.rows[d_idx].label)
                    };
                    (
                        Reference::Atom(self.rows[b_idx].label),
                        Reference::Atom(self.rows[a_idx].label),
                        d,
                    )
                }
            };
            rows.push(ConstructionRow {
                label: self.rows[i].label,
                b,
                a,
                d,
            });
        }
        ConstructionTable::from_validated(rows)
    }

    /// Derives a Z-matrix against a construction table.
    ///
    /// The table must cover exactly this molecule's labels. The
    /// resulting Z-matrix lists atoms in table order and reconstructs to
    /// these absolute positions, since the anchor references pin the
    /// frame. Atoms with a zero-length bond or an angle at 0 or 180
    /// degrees get a zero dihedral.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::MalformedConstructionTable`] when the label
    /// sets differ, or [`CoordError::InvalidReference`] for a row whose
    /// references are colinear so no dihedral is defined.
    ///
    /// # Examples
    ///
    /// ```
    /// use intcoord::{Cartesian, CartesianRecord};
    ///
    /// let carbon_monoxide = Cartesian::new(vec![
    ///     CartesianRecord { label: 0, atom: "C".to_string(), x: 0.0, y: 0.0, z: 0.0 },
    ///     CartesianRecord { label: 1, atom: "O".to_string(), x: 1.128, y: 0.0, z: 0.0 },
    /// ])?;
    /// let table = carbon_monoxide.construction_table();
    /// let zmat = carbon_monoxide.to_zmat(&table)?;
    /// assert!((zmat.records()[1].bond - 1.128).abs() < 1e-12);
    /// # Ok::<(), intcoord::CoordError>(())
    /// ```
    pub fn to_zmat(&self, table: &ConstructionTable) -> Result<Zmat> {
        debug!("deriving internal coordinates for {} atoms", self.len());
        let covered: HashSet<usize> = table.rows().iter().map(|row| row.label).collect();
        for record in &self.rows {
            if !covered.contains(&record.label) {
                return Err(CoordError::MalformedConstructionTable {
                    label: record.label,
                    detail: "atom is not covered by the construction table".to_string(),
                });
            }
        }
        let mut records = Vec::with_capacity(table.len());
        for row in table.rows() {
            let record = self.get(row.label).ok_or_else(|| {
                CoordError::MalformedConstructionTable {
                    label: row.label,
                    detail: "table row has no atom in this molecule".to_string(),
                }
            })?;
            let position = Vector3::new(record.x, record.y, record.z);
            let resolve = |reference: Reference| -> Result<Vector3<f64>> {
                match reference {
                    Reference::Anchor(anchor) => Ok(anchor.position()),
                    Reference::Atom(other) => self.position(other).ok_or_else(|| {
                        CoordError::MalformedConstructionTable {
                            label: row.label,
                            detail: format!("reference {} has no atom in this molecule", other),
                        }
                    }),
                }
            };
            let pos_b = resolve(row.b)?;
            let pos_a = resolve(row.a)?;
            let pos_d = resolve(row.d)?;
            let (bond, angle, dihedral) = algebra::derive_internal(position, pos_b, pos_a, pos_d)
                .map_err(|_| CoordError::InvalidReference {
                    label: row.label,
                    b: row.b,
                    a: row.a,
                    d: row.d,
                })?;
            records.push(ZmatRecord {
                label: row.label,
                atom: record.atom.clone(),
                b: row.b,
                bond,
                a: row.a,
                angle: angle.to_degrees(),
                d: row.d,
                dihedral: dihedral.to_degrees(),
            });
        }
        Zmat::new(records, None)
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| CoordError::MissingColumns {
        missing: vec![column.to_string()],
    })
}

/// Index of the point nearest to `target`, skipping excluded indices.
/// Ties go to the lowest index. Callers guarantee at least one
/// candidate remains.
fn nearest(points: &[Vector3<f64>], target: Vector3<f64>, exclude: &[usize]) -> usize {
    let mut best = 0usize;
    let mut best_distance = f64::INFINITY;
    for (j, &point) in points.iter().enumerate() {
        if exclude.contains(&j) {
            continue;
        }
        let distance = (point - target).norm();
        if distance < best_distance {
            best_distance = distance;
            best = j;
        }
    }
    best
}

impl SumFormula for Cartesian {
    fn element_counts(&self) -> BTreeMap<String, usize> {
        formula::count_elements(self.rows.iter().map(|record| record.atom.as_str()))
    }
}
