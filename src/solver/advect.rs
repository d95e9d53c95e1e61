//! Upwind transport of label vectors along one row.

use crate::field::{AxisOrder, PaddedField, PaddedFieldMut};
use crate::svector::{NormalizedView, SparseLabelVector};

/// Index of position `t` along `axis` in a single-row view.
#[inline]
pub(crate) fn along(axis: usize, t: i32) -> [i32; 3] {
    let mut idx = [0; 3];
    idx[axis] = t;
    idx
}

#[inline]
fn get<T: Copy, O: AxisOrder>(v: &PaddedField<'_, T, O>, idx: [i32; 3]) -> T {
    *v.at(idx[0], idx[1], idx[2])
}

/// Advect one row of `n` cells plus one ghost on each side.
///
/// Face `t` (for `t` in `-1..n`) sits between cells `t` and `t + 1` and
/// carries `flux[t]`; the donor is cell `t + 1` when the flux is positive and
/// cell `t` otherwise. The donor's labels are rescaled to sum to the flux,
/// then cell `t` gains and cell `t + 1` loses that amount, each divided by
/// its own cell size. All face terms are taken from the pre-update state.
///
/// `row`, `flux` and `del` are single-row views indexed along `axis`.
pub(crate) fn advect_row<O: AxisOrder>(
    axis: usize,
    n: i32,
    mut row: PaddedFieldMut<'_, SparseLabelVector, O>,
    flux: PaddedField<'_, f64, O>,
    del: PaddedField<'_, f64, O>,
    faces: &mut Vec<NormalizedView>,
) {
    faces.resize_with((n + 1) as usize, NormalizedView::default);
    for t in -1..n {
        let fl = get(&flux, along(axis, t));
        let donor = if fl > 0.0 { t + 1 } else { t };
        let [i, j, k] = along(axis, donor);
        faces[(t + 1) as usize].assign(row.at(i, j, k), fl);
    }
    for c in -1..=n {
        let inv = 1.0 / get(&del, along(axis, c));
        let [i, j, k] = along(axis, c);
        let cell = row.at_mut(i, j, k);
        if c > -1 {
            cell.add(&faces[c as usize], -inv);
        }
        if c < n {
            cell.add(&faces[(c + 1) as usize], inv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldShape, OwnedField, RowMajor};
    use crate::svector::Element;

    fn line(vals: &[f64], lo: usize) -> OwnedField<f64, RowMajor> {
        let shape = FieldShape::line(0, vals.len() - lo - 1, lo, 1).unwrap();
        OwnedField::from_vec(vals.to_vec(), shape).unwrap()
    }

    #[test]
    fn positive_flux_moves_material_toward_minus() {
        let shape = FieldShape::line(0, 3, 1, 1).unwrap();
        let mut row = OwnedField::<SparseLabelVector, RowMajor>::new(shape);
        *row.at_mut(1, 0, 0) = Element::new(4, 1.0).into();
        // faces -1..3 carry flux; only face 0 (between cells 0 and 1) is active
        let flux = FieldShape::line(0, 3, 1, 0).unwrap();
        let mut fluxes = OwnedField::<f64, RowMajor>::new(flux);
        *fluxes.at_mut(0, 0, 0) = 0.25;
        let del = line(&[1.0, 0.5, 1.0, 2.0, 1.0], 1);
        let mut faces = Vec::new();
        advect_row(0, 3, row.view_mut(), fluxes.view(), del.view(), &mut faces);

        assert_eq!(row.at(0, 0, 0).get(4), Some(0.5));
        assert_eq!(row.at(1, 0, 0).get(4), Some(0.75));
        assert!(row.at(-1, 0, 0).is_empty() && row.at(2, 0, 0).is_empty());
    }

    #[test]
    fn negative_flux_uses_minus_donor() {
        let shape = FieldShape::line(0, 2, 1, 1).unwrap();
        let mut row = OwnedField::<SparseLabelVector, RowMajor>::new(shape);
        *row.at_mut(-1, 0, 0) = SparseLabelVector::from_sorted(vec![
            Element::new(1, 1.0),
            Element::new(2, 3.0),
        ]);
        let mut fluxes = OwnedField::<f64, RowMajor>::new(FieldShape::line(0, 2, 1, 0).unwrap());
        *fluxes.at_mut(-1, 0, 0) = -0.4;
        let del = line(&[1.0, 1.0, 1.0, 1.0], 1);
        let mut faces = Vec::new();
        advect_row(0, 2, row.view_mut(), fluxes.view(), del.view(), &mut faces);

        let gained = row.at(0, 0, 0);
        assert!((gained.get(1).unwrap() - 0.1).abs() < 1e-15);
        assert!((gained.get(2).unwrap() - 0.3).abs() < 1e-15);
        assert!((row.at(-1, 0, 0).sum() - 3.6).abs() < 1e-14);
    }
}
