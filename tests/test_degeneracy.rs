//! Degenerate reference detection and dummy-atom repair.

use approx::assert_abs_diff_eq;
use intcoord::{Anchor, CoordError, Reference, Zmat, ZmatRecord};
use nalgebra::Vector3;

#[allow(clippy::too_many_arguments)]
fn zrec(
    label: usize,
    atom: &str,
    b: Reference,
    bond: f64,
    a: Reference,
    angle: f64,
    d: Reference,
    dihedral: f64,
) -> ZmatRecord {
    ZmatRecord {
        label,
        atom: atom.to_string(),
        b,
        bond,
        a,
        angle,
        d,
        dihedral,
    }
}

fn anchored_first(label: usize, atom: &str) -> ZmatRecord {
    zrec(
        label,
        atom,
        Anchor::Origin.into(),
        0.0,
        Anchor::XAxis.into(),
        0.0,
        Anchor::YAxis.into(),
        0.0,
    )
}

/// Atoms 0 and 1 on the x axis; atom 2 asks for a 90 degree angle with a
/// dihedral reference that also sits on that axis.
fn colinear_triatomic() -> Zmat {
    let rows = vec![
        anchored_first(0, "C"),
        zrec(
            1,
            "C",
            Reference::Atom(0),
            1.0,
            Anchor::XAxis.into(),
            0.0,
            Anchor::YAxis.into(),
            0.0,
        ),
        zrec(
            2,
            "O",
            Reference::Atom(1),
            1.0,
            Reference::Atom(0),
            90.0,
            Anchor::XAxis.into(),
            0.0,
        ),
    ];
    Zmat::new(rows, None).unwrap()
}

/// A bent four-atom chain whose last row references the x-axis anchor
/// from two atoms that lie on the x axis themselves.
fn bent_four_atom() -> Zmat {
    let rows = vec![
        anchored_first(0, "C"),
        zrec(
            1,
            "C",
            Reference::Atom(0),
            2.0,
            Anchor::XAxis.into(),
            0.0,
            Anchor::YAxis.into(),
            0.0,
        ),
        zrec(
            2,
            "O",
            Reference::Atom(0),
            1.5,
            Reference::Atom(1),
            90.0,
            Anchor::YAxis.into(),
            90.0,
        ),
        zrec(
            3,
            "H",
            Reference::Atom(1),
            1.0,
            Reference::Atom(0),
            120.0,
            Anchor::XAxis.into(),
            0.0,
        ),
    ];
    Zmat::new(rows, None).unwrap()
}

#[test]
fn test_colinear_references_are_flagged() {
    let err = colinear_triatomic().to_cartesian().unwrap_err();
    assert_eq!(
        err,
        CoordError::InvalidReference {
            label: 2,
            b: Reference::Atom(1),
            a: Reference::Atom(0),
            d: Anchor::XAxis.into(),
        }
    );
}

#[test]
fn test_coincident_bond_and_angle_references() {
    // atom 1 lands exactly on the x-axis anchor, so b and a coincide
    let rows = vec![
        anchored_first(0, "C"),
        zrec(
            1,
            "C",
            Reference::Atom(0),
            1.0,
            Anchor::XAxis.into(),
            0.0,
            Anchor::YAxis.into(),
            0.0,
        ),
        zrec(
            2,
            "O",
            Reference::Atom(1),
            1.0,
            Anchor::XAxis.into(),
            90.0,
            Anchor::Origin.into(),
            0.0,
        ),
    ];
    let zmat = Zmat::new(rows, None).unwrap();
    let err = zmat.to_cartesian().unwrap_err();
    assert_eq!(
        err,
        CoordError::InvalidReference {
            label: 2,
            b: Reference::Atom(1),
            a: Anchor::XAxis.into(),
            d: Anchor::Origin.into(),
        }
    );
}

#[test]
fn test_dummy_insertion_repairs_colinear_row() {
    let broken = colinear_triatomic();
    let repaired = broken.insert_dummy(2).unwrap();

    assert_eq!(repaired.len(), 4);
    assert_eq!(repaired.order(), &[0, 1, 3, 2]);

    let dummy = repaired.get(3).unwrap();
    assert_eq!(dummy.atom, "X");
    assert_eq!(dummy.b, Reference::Atom(0));
    assert_eq!(dummy.a, Reference::Atom(1));
    assert_eq!(dummy.d, Reference::Anchor(Anchor::YAxis));
    assert_abs_diff_eq!(dummy.bond, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.angle, 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.dihedral, 0.0, epsilon = 1e-9);
    // the dummy sits immediately before the repaired row in storage
    assert_eq!(repaired.records()[2].label, 3);

    let flagged = repaired.get(2).unwrap();
    assert_eq!(flagged.d, Reference::Atom(3));
    assert_abs_diff_eq!(flagged.dihedral, 0.0, epsilon = 1e-12);

    let cartesian = repaired.to_cartesian().unwrap();
    assert_abs_diff_eq!(
        cartesian.position(3).unwrap(),
        Vector3::new(0.0, 1.0, 0.0),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        cartesian.position(2).unwrap(),
        Vector3::new(1.0, 1.0, 0.0),
        epsilon = 1e-9
    );

    // the original is untouched and still fails
    assert_eq!(broken.len(), 3);
    assert!(broken.to_cartesian().is_err());
}

#[test]
fn test_dummy_insertion_uses_real_off_axis_atom() {
    let broken = bent_four_atom();
    let err = broken.to_cartesian().unwrap_err();
    assert_eq!(
        err,
        CoordError::InvalidReference {
            label: 3,
            b: Reference::Atom(1),
            a: Reference::Atom(0),
            d: Anchor::XAxis.into(),
        }
    );

    let repaired = broken.insert_dummy(3).unwrap();
    assert_eq!(repaired.order(), &[0, 1, 2, 4, 3]);

    // atom 2 is off the b-a axis, so the dummy references it instead of
    // an anchor
    let dummy = repaired.get(4).unwrap();
    assert_eq!(dummy.b, Reference::Atom(0));
    assert_eq!(dummy.a, Reference::Atom(1));
    assert_eq!(dummy.d, Reference::Atom(2));
    assert_abs_diff_eq!(dummy.bond, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.angle, 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.dihedral, 270.0, epsilon = 1e-9);

    let cartesian = repaired.to_cartesian().unwrap();
    assert_abs_diff_eq!(
        cartesian.position(2).unwrap(),
        Vector3::new(0.0, 0.0, 1.5),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        cartesian.position(4).unwrap(),
        Vector3::new(0.0, 1.0, 0.0),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        cartesian.position(3).unwrap(),
        Vector3::new(2.5, 0.8660254038, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn test_dummy_insertion_uses_reference_plane() {
    // bent water: row 2's references span a real plane, so the dummy
    // direction comes from the references themselves, not an axis
    let rows = vec![
        anchored_first(0, "O"),
        zrec(
            1,
            "H",
            Reference::Atom(0),
            0.9584,
            Anchor::XAxis.into(),
            0.0,
            Anchor::YAxis.into(),
            0.0,
        ),
        zrec(
            2,
            "H",
            Reference::Atom(0),
            0.9584,
            Reference::Atom(1),
            104.45,
            Anchor::YAxis.into(),
            0.0,
        ),
    ];
    let water = Zmat::new(rows, None).unwrap();
    let before = water.to_cartesian().unwrap();

    let repaired = water.insert_dummy(2).unwrap();
    assert_eq!(repaired.order(), &[0, 1, 3, 2]);

    let dummy = repaired.get(3).unwrap();
    assert_eq!(dummy.atom, "X");
    assert_eq!(dummy.b, Reference::Atom(1));
    assert_eq!(dummy.a, Reference::Atom(0));
    assert_eq!(dummy.d, Reference::Anchor(Anchor::YAxis));
    assert_abs_diff_eq!(dummy.bond, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.angle, 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(dummy.dihedral, 0.0, epsilon = 1e-9);
    assert_eq!(repaired.get(2).unwrap().d, Reference::Atom(3));

    // unit step from the angle reference, perpendicular to b-a, on the
    // same side as the old dihedral reference
    let cartesian = repaired.to_cartesian().unwrap();
    assert_abs_diff_eq!(
        cartesian.position(3).unwrap(),
        Vector3::new(0.9584, 1.0, 0.0),
        epsilon = 1e-9
    );

    // redirecting the dihedral through the dummy leaves every real
    // atom where it was
    for record in before.records() {
        assert_abs_diff_eq!(
            cartesian.position(record.label).unwrap(),
            before.position(record.label).unwrap(),
            epsilon = 1e-9
        );
    }
    assert_abs_diff_eq!(
        cartesian.position(2).unwrap(),
        Vector3::new(-0.2391543829, 0.9280817535, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn test_dummy_insertion_reports_failure_before_target() {
    let rows = vec![
        anchored_first(0, "C"),
        zrec(
            1,
            "C",
            Reference::Atom(0),
            1.0,
            Anchor::XAxis.into(),
            0.0,
            Anchor::YAxis.into(),
            0.0,
        ),
        zrec(
            2,
            "C",
            Reference::Atom(1),
            1.0,
            Reference::Atom(0),
            90.0,
            Anchor::XAxis.into(),
            0.0,
        ),
        zrec(
            3,
            "H",
            Reference::Atom(1),
            1.0,
            Reference::Atom(2),
            109.5,
            Reference::Atom(0),
            60.0,
        ),
    ];
    let zmat = Zmat::new(rows, None).unwrap();
    // atom 2 already fails, so repairing atom 3 cannot even start
    let err = zmat.insert_dummy(3).unwrap_err();
    assert_eq!(
        err,
        CoordError::InvalidReference {
            label: 2,
            b: Reference::Atom(1),
            a: Reference::Atom(0),
            d: Anchor::XAxis.into(),
        }
    );
}

#[test]
fn test_dummy_changes_topology_for_arithmetic() {
    let broken = colinear_triatomic();
    let repaired = broken.insert_dummy(2).unwrap();
    assert_ne!(broken.construction_table(), repaired.construction_table());
    assert!(matches!(
        broken.try_add(&repaired),
        Err(CoordError::IncompatibleZmatrices(_))
    ));
    // repairing the same molecule twice yields compatible operands
    let twin = broken.insert_dummy(2).unwrap();
    assert!(repaired.try_sub(&twin).is_ok());
}
