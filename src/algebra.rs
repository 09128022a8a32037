//! Vector algebra for placing atoms and deriving internal coordinates.
//!
//! This module is the numeric kernel of the crate. It works entirely in
//! radians and absolute positions; the degree conversions and label
//! bookkeeping live in [`crate::zmat`] and [`crate::cartesian`]. The two
//! central operations are exact inverses of each other:
//!
//! * [`place_atom`] turns a (bond, angle, dihedral) triple plus three
//!   reference positions into an absolute position.
//! * [`derive_internal`] turns an absolute position plus the same three
//!   references back into the (bond, angle, dihedral) triple.

use crate::error::{CoordError, Result};
use nalgebra::{Rotation3, Unit, Vector3};

/// Norm below which a vector cannot be normalized.
pub const NORM_TOL: f64 = 1e-9;

/// Tolerance below which directions are treated as colinear.
///
/// Used both for cross-product norms and for angles in radians near
/// 0 or pi.
pub const COLINEAR_TOL: f64 = 1e-8;

/// Outcome of a single atom placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The atom was placed at this absolute position.
    Position(Vector3<f64>),
    /// The three reference positions are colinear or coincident, so no
    /// placement plane exists. The caller decides which atom to blame.
    InvalidReference,
}

fn is_close(x: f64, y: f64, tol: f64) -> bool {
    (x - y).abs() < tol
}

/// Normalizes a vector, rejecting (near-)zero input.
///
/// # Errors
///
/// Returns [`CoordError::DegenerateVector`] when the norm is at or below
/// [`NORM_TOL`].
pub fn normalize(v: Vector3<f64>) -> Result<Vector3<f64>> {
    let n = v.norm();
    if n <= NORM_TOL {
        return Err(CoordError::DegenerateVector(n));
    }
    Ok(v / n)
}

/// Rotation by `angle` radians about a unit axis, right-handed.
pub fn rotation_about(axis: Unit<Vector3<f64>>, angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&axis, angle)
}

/// Places an atom from its internal coordinates and reference positions.
///
/// The atom sits at distance `bond` from `pos_b`, forming the given
/// `angle` with the direction from `pos_b` to `pos_a`, rotated by
/// `dihedral` about that direction out of the plane spanned by the three
/// references. Angles near 0 or pi place the atom on the b-a line
/// directly, without consulting `pos_d`.
///
/// # Arguments
///
/// * `bond` - distance from `pos_b`
/// * `angle` - angle at `pos_b` in radians
/// * `dihedral` - torsion about the b-a axis in radians
/// * `pos_b`, `pos_a`, `pos_d` - resolved reference positions
///
/// # Examples
///
/// ```
/// use intcoord::algebra::{place_atom, Placement};
/// use nalgebra::Vector3;
///
/// let pos = place_atom(
///     1.0,
///     90f64.to_radians(),
///     90f64.to_radians(),
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::new(1.0, 1.0, 0.0),
/// );
/// let Placement::Position(p) = pos else { panic!("colinear references") };
/// assert!((p - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
/// ```
pub fn place_atom(
    bond: f64,
    angle: f64,
    dihedral: f64,
    pos_b: Vector3<f64>,
    pos_a: Vector3<f64>,
    pos_d: Vector3<f64>,
) -> Placement {
    let ba_raw = pos_a - pos_b;
    let ba = match normalize(ba_raw) {
        Ok(v) => v,
        Err(_) => return Placement::InvalidReference,
    };
    let d = if is_close(angle, std::f64::consts::PI, COLINEAR_TOL) {
        -bond * ba
    } else if is_close(angle, 0.0, COLINEAR_TOL) {
        bond * ba
    } else {
        let ad = pos_d - pos_a;
        let n1_raw = ba_raw.cross(&ad);
        let n1_norm = n1_raw.norm();
        if n1_norm < COLINEAR_TOL {
            return Placement::InvalidReference;
        }
        let n1 = Unit::new_unchecked(n1_raw / n1_norm);
        let ba_axis = Unit::new_unchecked(ba);
        let d = rotation_about(n1, angle) * (bond * ba);
        rotation_about(ba_axis, dihedral) * d
    };
    Placement::Position(pos_b + d)
}

/// Derives (bond, angle, dihedral) for an atom from absolute positions.
///
/// Inverse of [`place_atom`]: feeding the result back with the same
/// reference positions reproduces `pos_i`. Angles are returned in
/// radians, the dihedral in the half-open range `[0, 2*pi)`.
///
/// A zero-length bond yields `(0, 0, 0)`, and an angle at 0 or pi yields
/// a zero dihedral, since no torsion plane exists in either case.
///
/// # Errors
///
/// Returns [`CoordError::DegenerateVector`] when the b and a references
/// coincide, or when a dihedral is requested but b, a and d are
/// colinear.
pub fn derive_internal(
    pos_i: Vector3<f64>,
    pos_b: Vector3<f64>,
    pos_a: Vector3<f64>,
    pos_d: Vector3<f64>,
) -> Result<(f64, f64, f64)> {
    let ib = pos_i - pos_b;
    let bond = ib.norm();
    if bond < NORM_TOL {
        return Ok((bond, 0.0, 0.0));
    }
    let ba_raw = pos_a - pos_b;
    let ba = normalize(ba_raw)?;
    let bi = ib / bond;
    let angle = bi.dot(&ba).clamp(-1.0, 1.0).acos();
    if is_close(angle, 0.0, COLINEAR_TOL) || is_close(angle, std::f64::consts::PI, COLINEAR_TOL) {
        return Ok((bond, angle, 0.0));
    }
    let ad = pos_d - pos_a;
    let n2_raw = ba_raw.cross(&ad);
    let n2_norm = n2_raw.norm();
    if n2_norm < COLINEAR_TOL {
        return Err(CoordError::DegenerateVector(n2_norm));
    }
    let n1 = normalize((pos_b - pos_i).cross(&ba_raw))?;
    let n2 = n2_raw / n2_norm;
    let mut dihedral = n1.dot(&n2).clamp(-1.0, 1.0).acos();
    if ba_raw.dot(&n1.cross(&n2)) > 0.0 {
        dihedral = 2.0 * std::f64::consts::PI - dihedral;
    }
    Ok((bond, angle, dihedral))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame() -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        (
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )
    }

    fn placed(p: Placement) -> Vector3<f64> {
        match p {
            Placement::Position(v) => v,
            Placement::InvalidReference => panic!("expected a position, got InvalidReference"),
        }
    }

    fn angular_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_normalize() {
        let v = normalize(Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(v, Vector3::new(0.6, 0.0, 0.8), epsilon = 1e-15);
    }

    #[test]
    fn test_normalize_rejects_zero() {
        let err = normalize(Vector3::zeros()).unwrap_err();
        assert!(matches!(err, CoordError::DegenerateVector(_)));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let rot = rotation_about(Unit::new_normalize(Vector3::z()), 90f64.to_radians());
        let v = rot * Vector3::x();
        assert_abs_diff_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_place_linear_angles() {
        let pb = Vector3::new(0.0, 0.0, 0.0);
        let pa = Vector3::new(2.0, 0.0, 0.0);
        let pd = Vector3::new(0.0, 0.0, 9.0);
        let straight = placed(place_atom(1.5, std::f64::consts::PI, 0.0, pb, pa, pd));
        assert_abs_diff_eq!(straight, Vector3::new(-1.5, 0.0, 0.0), epsilon = 1e-12);
        let toward = placed(place_atom(1.5, 0.0, 0.0, pb, pa, pd));
        assert_abs_diff_eq!(toward, Vector3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_place_hand_frame() {
        let (pb, pa, pd) = frame();
        let up = placed(place_atom(1.0, 90f64.to_radians(), 90f64.to_radians(), pb, pa, pd));
        assert_abs_diff_eq!(up, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        let down = placed(place_atom(
            1.0,
            90f64.to_radians(),
            270f64.to_radians(),
            pb,
            pa,
            pd,
        ));
        assert_abs_diff_eq!(down, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_place_colinear_references_invalid() {
        let pb = Vector3::new(0.0, 0.0, 0.0);
        let pa = Vector3::new(1.0, 0.0, 0.0);
        let pd = Vector3::new(2.0, 0.0, 0.0);
        let outcome = place_atom(1.0, 90f64.to_radians(), 0.0, pb, pa, pd);
        assert_eq!(outcome, Placement::InvalidReference);
    }

    #[test]
    fn test_place_coincident_references_invalid() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let outcome = place_atom(1.0, 90f64.to_radians(), 0.0, p, p, Vector3::zeros());
        assert_eq!(outcome, Placement::InvalidReference);
    }

    #[test]
    fn test_derive_hand_frame() {
        let (pb, pa, pd) = frame();
        let (bond, angle, dihedral) =
            derive_internal(Vector3::new(0.0, 0.0, 1.0), pb, pa, pd).unwrap();
        assert_abs_diff_eq!(bond, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle.to_degrees(), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dihedral.to_degrees(), 90.0, epsilon = 1e-9);

        let (bond, angle, dihedral) =
            derive_internal(Vector3::new(0.0, 0.0, -1.0), pb, pa, pd).unwrap();
        assert_abs_diff_eq!(bond, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle.to_degrees(), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dihedral.to_degrees(), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_derive_zero_bond() {
        let (pb, pa, pd) = frame();
        let (bond, angle, dihedral) = derive_internal(pb, pb, pa, pd).unwrap();
        assert_eq!((bond, angle, dihedral), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_derive_linear_angle_has_zero_dihedral() {
        // Atom on the b-a line: the angle branch returns before any
        // torsion plane is required, even with a colinear d.
        let pb = Vector3::new(0.0, 0.0, 0.0);
        let pa = Vector3::new(1.0, 0.0, 0.0);
        let pd = Vector3::new(2.0, 0.0, 0.0);
        let (bond, angle, dihedral) =
            derive_internal(Vector3::new(3.0, 0.0, 0.0), pb, pa, pd).unwrap();
        assert_abs_diff_eq!(bond, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle, 0.0, epsilon = 1e-9);
        assert_eq!(dihedral, 0.0);
    }

    #[test]
    fn test_derive_degenerate_plane() {
        let pb = Vector3::new(0.0, 0.0, 0.0);
        let pa = Vector3::new(1.0, 0.0, 0.0);
        let pd = Vector3::new(2.0, 0.0, 0.0);
        let err = derive_internal(Vector3::new(0.0, 1.0, 0.0), pb, pa, pd).unwrap_err();
        assert!(matches!(err, CoordError::DegenerateVector(_)));
    }

    #[test]
    fn test_place_derive_roundtrip() {
        let pb = Vector3::new(0.3, -0.2, 0.5);
        let pa = Vector3::new(1.4, 0.8, -0.1);
        let pd = Vector3::new(-0.5, 1.0, 2.0);
        for &angle in &[20.0, 90.0, 150.0] {
            for &dihedral in &[0.0, 60.0, 180.0, 300.0] {
                let pos = placed(place_atom(
                    1.8,
                    f64::to_radians(angle),
                    f64::to_radians(dihedral),
                    pb,
                    pa,
                    pd,
                ));
                let (bond, ang, dih) = derive_internal(pos, pb, pa, pd).unwrap();
                assert_abs_diff_eq!(bond, 1.8, epsilon = 1e-9);
                assert_abs_diff_eq!(ang.to_degrees(), angle, epsilon = 1e-9);
                assert!(
                    angular_diff(dih.to_degrees(), dihedral) < 1e-9,
                    "dihedral {} deg came back as {} deg",
                    dihedral,
                    dih.to_degrees()
                );
            }
        }
    }
}
