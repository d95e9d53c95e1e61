//! Operator-split label transport.
//!
//! A host step drives the [`Solver`] in this order per sub-step: optionally
//! [`save_dilation`](Solver::save_dilation), one
//! [`advect_labels`](Solver::advect_labels) per direction, optionally
//! [`dilate_labels`](Solver::dilate_labels), then
//! [`normalize_labels`](Solver::normalize_labels) and
//! [`filter_labels`](Solver::filter_labels) to bring the labels back in line
//! with the host's volume fraction.

pub mod advect;
pub mod config;

pub use config::{FractionConvention, SolverConfig};

use itertools::{iproduct, izip};
use std::ops::Range;

use crate::domain::{Axis, Domain, LabelDomain};
use crate::field::{AxisOrder, DefaultOrder, FieldShape, OwnedField, PaddedField};
use crate::label_error::LabelError;
use crate::svector::NormalizedView;
use advect::{advect_row, along};

/// Transport engine. Holds the saved dilation per instance and scratch
/// space for face terms.
#[derive(Clone, Debug)]
pub struct Solver<O: AxisOrder = DefaultOrder> {
    config: SolverConfig,
    n: [usize; 3],
    dilation: Vec<OwnedField<NormalizedView, O>>,
    dilation_saved: bool,
    faces: Vec<NormalizedView>,
}

fn require_padding(
    shape: FieldShape,
    axis: usize,
    need_lo: usize,
    need_hi: usize,
) -> Result<(), LabelError> {
    let lo = shape.pad_lo(axis) as usize;
    let hi = shape.pad_hi(axis) as usize;
    if lo < need_lo || hi < need_hi {
        return Err(LabelError::InsufficientPadding {
            axis,
            lo,
            hi,
            need_lo,
            need_hi,
        });
    }
    Ok(())
}

fn row_ranges(axis: usize, n: i32, p: i32, q: i32) -> [Range<i32>; 3] {
    let (b, c) = match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };
    let mut r = [0..0, 0..0, 0..0];
    r[axis] = 0..n;
    r[b] = p..p + 1;
    r[c] = q..q + 1;
    r
}

impl<O: AxisOrder> Solver<O> {
    pub fn new(domain: &Domain<O>, config: SolverConfig) -> Result<Self, LabelError> {
        let shape = domain.shape()?;
        Ok(Self {
            config,
            n: domain.counts(),
            dilation: (0..domain.nn()).map(|_| OwnedField::new(shape)).collect(),
            dilation_saved: false,
            faces: Vec::new(),
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn dilation_saved(&self) -> bool {
        self.dilation_saved
    }

    fn check_counts(&self, shape: FieldShape) -> Result<(), LabelError> {
        let counts = shape.counts().map(|c| c as usize);
        if counts == self.n {
            Ok(())
        } else {
            Err(LabelError::LayoutMismatch {
                layout: counts,
                domain: self.n,
            })
        }
    }

    /// Store `s` rescaled to total `1 − c` wherever `c != 1`, for a later
    /// [`dilate_labels`](Self::dilate_labels).
    pub fn save_dilation<D: LabelDomain<Order = O>>(
        &mut self,
        domain: &D,
        c: PaddedField<'_, f64, O>,
    ) -> Result<(), LabelError> {
        self.check_counts(c.shape())?;
        let mut stored = 0usize;
        for (field, dil) in domain.local().fields().iter().zip(&mut self.dilation) {
            for (s, &cv, view) in izip!(field.iter(), c.iter(), dil.iter_mut()) {
                if cv != 1.0 {
                    view.assign(s, 1.0 - cv);
                    stored += 1;
                } else {
                    view.clear();
                }
            }
        }
        self.dilation_saved = true;
        log::debug!("saved dilation in {stored} cells");
        Ok(())
    }

    /// Drop the saved dilation, keeping its storage.
    pub fn clear_dilation(&mut self) {
        for dil in &mut self.dilation {
            dil.for_each_raw_mut(NormalizedView::clear);
        }
        self.dilation_saved = false;
    }

    /// `s ← s + c̃·u_div` with `c̃` the saved dilation.
    pub fn dilate_labels<D: LabelDomain<Order = O>>(
        &self,
        domain: &mut D,
        u_div: PaddedField<'_, f64, O>,
    ) -> Result<(), LabelError> {
        if !self.dilation_saved {
            log::warn!("dilate_labels called without a saved dilation");
            return Err(LabelError::DilationNotSaved);
        }
        self.check_counts(u_div.shape())?;
        for (field, dil) in domain.local_mut().fields_mut().iter_mut().zip(&self.dilation) {
            for (s, &div, view) in izip!(field.iter_mut(), u_div.iter(), dil.iter()) {
                s.add(view, div);
            }
        }
        Ok(())
    }

    /// Per cell: drop round-off, then rescale to the convention's target of `f`.
    pub fn normalize_labels<D: LabelDomain<Order = O>>(
        &self,
        domain: &mut D,
        f: PaddedField<'_, f64, O>,
    ) -> Result<(), LabelError> {
        self.check_counts(f.shape())?;
        let convention = self.config.convention;
        for field in domain.local_mut().fields_mut() {
            for (s, &fv) in field.iter_mut().zip(f.iter()) {
                s.chop_default();
                s.normalize(convention.target(fv));
            }
        }
        Ok(())
    }

    /// Snap cells that are within `tol` of fully labelled (normalize to 1),
    /// then clear cells within `tol` of label-free. With `tol >= 0.5` a cell
    /// can match both and ends up empty.
    pub fn filter_labels<D: LabelDomain<Order = O>>(
        &self,
        domain: &mut D,
        tol: f64,
        f: PaddedField<'_, f64, O>,
    ) -> Result<(), LabelError> {
        if !(tol.is_finite() && tol >= 0.0) {
            return Err(LabelError::InvalidTolerance(tol));
        }
        self.check_counts(f.shape())?;
        let convention = self.config.convention;
        for field in domain.local_mut().fields_mut() {
            for (s, &fv) in field.iter_mut().zip(f.iter()) {
                let t = convention.target(fv);
                if 1.0 - t <= tol {
                    s.normalize(1.0);
                }
                if t <= tol {
                    s.clear();
                }
            }
        }
        Ok(())
    }

    /// One directional upwind sweep over every instance.
    ///
    /// `flux` has the host's 3-D shape and at least one padding layer below
    /// along `direction`. `cell_size` is a single row along `direction` with
    /// at least one padding layer on both sides.
    ///
    /// Ghosts along `direction` are refreshed first, so a rank whose local
    /// input fails validation still takes part in the exchange.
    pub fn advect_labels<D: LabelDomain<Order = O>>(
        &mut self,
        domain: &mut D,
        direction: i64,
        flux: PaddedField<'_, f64, O>,
        cell_size: PaddedField<'_, f64, O>,
    ) -> Result<(), LabelError> {
        let axis = Axis::from_direction(direction)?;
        let a = axis.index();

        // Collective: every rank refreshes its ghosts before any local
        // check can bail out.
        domain.update_ghost(axis.minus())?;
        domain.update_ghost(axis.plus())?;

        self.check_counts(flux.shape())?;
        let row_counts = cell_size.shape().counts();
        let mut want = [1i32; 3];
        want[a] = self.n[a] as i32;
        if row_counts != want {
            return Err(LabelError::LayoutMismatch {
                layout: row_counts.map(|c| c as usize),
                domain: self.n,
            });
        }
        require_padding(flux.shape(), a, 1, 0)?;
        require_padding(cell_size.shape(), a, 1, 1)?;

        let na = self.n[a] as i32;
        for t in -1..=na {
            let [i, j, k] = along(a, t);
            let value = *cell_size.at(i, j, k);
            if !value.is_normal() {
                return Err(LabelError::NonNormalCellSize {
                    axis: a,
                    index: t,
                    value,
                });
            }
        }

        let others: Vec<usize> = (0..3).filter(|&x| x != a).collect();
        let (nb, nc) = (self.n[others[0]] as i32, self.n[others[1]] as i32);
        log::trace!("advecting {:?} rows of {na} cells along {axis:?}", (nb, nc));
        for field in domain.local_mut().fields_mut() {
            for (p, q) in iproduct!(0..nb, 0..nc) {
                let [ri, rj, rk] = row_ranges(a, na, p, q);
                let row = field.slice_mut(ri, rj, rk);
                let [fi, fj, fk] = row_ranges(a, na, p, q);
                let frow = flux.slice(fi, fj, fk);
                advect_row(a, na, row, frow, cell_size, &mut self.faces);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::RowMajor;
    use crate::svector::{Element, SparseLabelVector};

    fn domain_with(label: u32, value: f64) -> Domain<RowMajor> {
        let mut d = Domain::<RowMajor>::new(2, 2, 2, 1).unwrap();
        for v in d.field_mut(0).iter_mut() {
            *v = Element::new(label, value).into();
        }
        d
    }

    fn host(value: f64) -> OwnedField<f64, RowMajor> {
        let mut f = OwnedField::new(FieldShape::uniform([2, 2, 2], 1).unwrap());
        f.for_each_raw_mut(|v| *v = value);
        f
    }

    #[test]
    fn dilation_requires_save() {
        let mut d = domain_with(1, 0.5);
        let mut s = Solver::new(&d, SolverConfig::default()).unwrap();
        let err = s.dilate_labels(&mut d, host(1.0).view()).unwrap_err();
        assert!(matches!(err, LabelError::DilationNotSaved));

        s.save_dilation(&d, host(0.75).view()).unwrap();
        s.dilate_labels(&mut d, host(2.0).view()).unwrap();
        // 0.5 + 2 * 0.25
        assert_eq!(d.field(0).at(1, 1, 1).get(1), Some(1.0));

        s.clear_dilation();
        assert!(!s.dilation_saved());
        assert!(s.dilate_labels(&mut d, host(2.0).view()).is_err());
    }

    #[test]
    fn unit_dilation_is_not_stored() {
        let mut d = domain_with(1, 0.5);
        let mut s = Solver::new(&d, SolverConfig::default()).unwrap();
        s.save_dilation(&d, host(1.0).view()).unwrap();
        s.dilate_labels(&mut d, host(5.0).view()).unwrap();
        assert_eq!(d.field(0).at(0, 0, 0).get(1), Some(0.5));
    }

    #[test]
    fn normalize_follows_convention() {
        let mut d = domain_with(3, 2.0);
        *d.field_mut(0).at_mut(0, 0, 0) = SparseLabelVector::from_sorted(vec![
            Element::new(1, -1e-18),
            Element::new(3, 2.0),
        ]);
        let void = Solver::new(&d, SolverConfig::default()).unwrap();
        void.normalize_labels(&mut d, host(0.25).view()).unwrap();
        assert!(d.field(0).iter().all(|s| s.nnz() == 1 && s.get(3) == Some(0.75)));

        let phase = Solver::new(&d, SolverConfig::with_convention(FractionConvention::Phase)).unwrap();
        phase.normalize_labels(&mut d, host(0.25).view()).unwrap();
        assert!(d.field(0).iter().all(|s| (s.get(3).unwrap() - 0.25).abs() < 1e-15));
        phase.normalize_labels(&mut d, host(0.0).view()).unwrap();
        assert!(d.field(0).iter().all(SparseLabelVector::is_empty));
    }

    #[test]
    fn filter_snaps_both_ends() {
        let s = Solver::new(&domain_with(1, 0.5), SolverConfig::default()).unwrap();
        let mut d = domain_with(1, 0.5);
        s.filter_labels(&mut d, 1e-6, host(1e-9).view()).unwrap();
        assert!(d.field(0).iter().all(|v| v.get(1) == Some(1.0)));

        let mut d = domain_with(1, 0.5);
        s.filter_labels(&mut d, 1e-6, host(1.0 - 1e-9).view()).unwrap();
        assert!(d.field(0).iter().all(SparseLabelVector::is_empty));

        let mut d = domain_with(1, 0.5);
        s.filter_labels(&mut d, 1e-6, host(0.5).view()).unwrap();
        assert!(d.field(0).iter().all(|v| v.get(1) == Some(0.5)));

        assert!(matches!(
            s.filter_labels(&mut d, -1.0, host(0.5).view()),
            Err(LabelError::InvalidTolerance(_))
        ));
        assert!(s.filter_labels(&mut d, f64::NAN, host(0.5).view()).is_err());
    }

    #[test]
    fn wide_filter_tolerance_clears_after_normalizing() {
        let mut d = domain_with(3, 0.25);
        let s = Solver::new(&d, SolverConfig::default()).unwrap();
        s.filter_labels(&mut d, 0.6, host(0.5).view()).unwrap();
        assert!(d.field(0).iter().all(SparseLabelVector::is_empty));

        let mut d = domain_with(3, 0.25);
        s.filter_labels(&mut d, 0.6, host(0.3).view()).unwrap();
        assert!(d.field(0).iter().all(|v| v.get(3) == Some(1.0)));
    }

    #[test]
    fn advect_validates_inputs() {
        let mut d = domain_with(1, 1.0);
        let mut s = Solver::new(&d, SolverConfig::default()).unwrap();
        let flux = host(0.0);
        let dx = OwnedField::<f64, RowMajor>::from_vec(vec![1.0; 4], FieldShape::line(1, 2, 1, 1).unwrap())
            .unwrap();

        assert!(matches!(
            s.advect_labels(&mut d, 3, flux.view(), dx.view()),
            Err(LabelError::InvalidDirection(3))
        ));
        // cell size row laid out along j, not i
        assert!(matches!(
            s.advect_labels(&mut d, 0, flux.view(), dx.view()),
            Err(LabelError::LayoutMismatch { .. })
        ));
        s.advect_labels(&mut d, 1, flux.view(), dx.view()).unwrap();

        let thin = OwnedField::<f64, RowMajor>::from_vec(vec![1.0; 3], FieldShape::line(1, 2, 1, 0).unwrap())
            .unwrap();
        assert!(matches!(
            s.advect_labels(&mut d, 1, flux.view(), thin.view()),
            Err(LabelError::InsufficientPadding { axis: 1, need_hi: 1, .. })
        ));

        let zero = OwnedField::<f64, RowMajor>::from_vec(vec![1.0, 1.0, 0.0, 1.0], FieldShape::line(1, 2, 1, 1).unwrap())
            .unwrap();
        assert!(matches!(
            s.advect_labels(&mut d, 1, flux.view(), zero.view()),
            Err(LabelError::NonNormalCellSize { axis: 1, index: 1, .. })
        ));
    }
}
