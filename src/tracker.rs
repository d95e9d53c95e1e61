//! `LabelTracker`: one label-tracking session bound to a host solver's grid.
//!
//! The tracker owns the domain and the transport engine, validates every host
//! buffer against the [`HostLayout`] given at construction, and wraps it in a
//! padded view before handing it on.

use std::path::Path;

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::algs::reduce::local_max;
use crate::checkpoint;
use crate::domain::{Axis, LabelDomain};
use crate::field::{AxisOrder, FieldShape, PaddedField};
use crate::label_error::LabelError;
use crate::solver::{Solver, SolverConfig};
use crate::svector::{Element, Label, SparseLabelVector};

/// Shape of the host's own fields: cell counts plus the host's padding
/// `[i-, i+, j-, j+, k-, k+]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostLayout {
    pub n: [usize; 3],
    pub pad: [usize; 6],
}

impl HostLayout {
    pub fn new(n: [usize; 3], pad: [usize; 6]) -> Result<Self, LabelError> {
        FieldShape::new(n, pad)?;
        Ok(Self { n, pad })
    }

    pub fn shape(&self) -> Result<FieldShape, LabelError> {
        FieldShape::new(self.n, self.pad)
    }

    /// Length of a full host buffer, padding included.
    pub fn len(&self) -> usize {
        (0..3)
            .map(|a| self.n[a] + self.pad[2 * a] + self.pad[2 * a + 1])
            .product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View a full host buffer.
    pub fn wrap<'a, T, O: AxisOrder>(&self, data: &'a [T]) -> Result<PaddedField<'a, T, O>, LabelError> {
        PaddedField::new(data, self.shape()?)
    }

    /// View a one-dimensional host array along `axis`, padded like the host
    /// grid along that axis.
    pub fn cell_row<'a, O: AxisOrder>(
        &self,
        axis: usize,
        data: &'a [f64],
    ) -> Result<PaddedField<'a, f64, O>, LabelError> {
        let shape = FieldShape::line(axis, self.n[axis], self.pad[2 * axis], self.pad[2 * axis + 1])?;
        PaddedField::new(data, shape)
    }
}

/// A label-tracking session.
pub struct LabelTracker<D: LabelDomain> {
    domain: D,
    layout: HostLayout,
    solver: Solver<D::Order>,
    max_labels: Vec<Label>,
}

impl<D: LabelDomain> LabelTracker<D> {
    pub fn new(domain: D, layout: HostLayout, config: SolverConfig) -> Result<Self, LabelError> {
        let counts = domain.local().counts();
        if layout.n != counts {
            return Err(LabelError::LayoutMismatch {
                layout: layout.n,
                domain: counts,
            });
        }
        layout.shape()?;
        let solver = Solver::new(domain.local(), config)?;
        let max_labels = vec![0; domain.local().nn()];
        Ok(Self {
            domain,
            layout,
            solver,
            max_labels,
        })
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut D {
        &mut self.domain
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    pub fn config(&self) -> &SolverConfig {
        self.solver.config()
    }

    pub fn into_domain(self) -> D {
        self.domain
    }

    fn wrap<'a>(&self, data: &'a [f64]) -> Result<PaddedField<'a, f64, D::Order>, LabelError> {
        self.layout.wrap(data)
    }

    /// Give every cell of `instance` the single label from `labels`, carrying
    /// the convention's target of `f`. Returns the largest label over all
    /// ranks.
    pub fn seed_labels(&mut self, instance: usize, labels: &[i32], f: &[f64]) -> Result<Label, LabelError> {
        let lv: PaddedField<'_, i32, D::Order> = self.layout.wrap(labels)?;
        let fv = self.wrap(f)?;
        let bad = lv.iter().enumerate().find(|&(_, &l)| l < 0);

        // Every rank joins the reduction, even one about to reject its input.
        let local = local_max(lv.iter().map(|&l| l.max(0) as Label));
        let max = self.domain.reduce_max(local)?;
        if let Some((cell, &label)) = bad {
            return Err(LabelError::InvalidLabel {
                label: i64::from(label),
                cell,
            });
        }

        let convention = self.solver.config().convention;
        let mut field = self.domain.local_mut().field_mut(instance);
        for (s, &l, &fr) in izip!(field.iter_mut(), lv.iter(), fv.iter()) {
            *s = SparseLabelVector::from(Element::new(l as Label, convention.target(fr)));
        }
        self.max_labels[instance] = max;
        log::info!("seeded instance {instance}: max label {max}");
        Ok(max)
    }

    /// Largest label seeded (or restored) into `instance`.
    pub fn max_label(&self, instance: usize) -> Label {
        self.max_labels[instance]
    }

    /// First label stored at a cell, `0` if none.
    pub fn label_at(&self, i: i32, j: i32, k: i32, instance: usize) -> Label {
        self.domain
            .local()
            .field(instance)
            .at(i, j, k)
            .first_label()
            .unwrap_or(0)
    }

    /// True if any rank holds a NaN value.
    pub fn contains_nan(&self) -> Result<bool, LabelError> {
        let local = u32::from(self.domain.local().contains_nan());
        Ok(self.domain.reduce_max(local)? != 0)
    }

    pub fn save_dilation(&mut self, c: &[f64]) -> Result<(), LabelError> {
        let cv = self.layout.wrap(c)?;
        self.solver.save_dilation(&self.domain, cv)
    }

    pub fn clear_dilation(&mut self) {
        self.solver.clear_dilation();
    }

    pub fn dilate_labels(&mut self, u_div: &[f64]) -> Result<(), LabelError> {
        let uv = self.layout.wrap(u_div)?;
        self.solver.dilate_labels(&mut self.domain, uv)
    }

    pub fn normalize_labels(&mut self, f: &[f64]) -> Result<(), LabelError> {
        let fv = self.layout.wrap(f)?;
        self.solver.normalize_labels(&mut self.domain, fv)
    }

    pub fn filter_labels(&mut self, tol: f64, f: &[f64]) -> Result<(), LabelError> {
        let fv = self.layout.wrap(f)?;
        self.solver.filter_labels(&mut self.domain, tol, fv)
    }

    /// One directional sweep. `flux` is a full host buffer, `cell_size` the
    /// host's padded one-dimensional cell-size array along `direction`.
    pub fn advect_labels(&mut self, direction: i64, flux: &[f64], cell_size: &[f64]) -> Result<(), LabelError> {
        let axis = Axis::from_direction(direction)?;
        let fv = self.layout.wrap(flux)?;
        let dv = self.layout.cell_row(axis.index(), cell_size)?;
        self.solver.advect_labels(&mut self.domain, direction, fv, dv)
    }

    pub fn create_checkpoint(&self, path: impl AsRef<Path>) -> Result<(), LabelError> {
        checkpoint::create(path, &self.domain)
    }

    /// Restore the domain from `path` and recompute the per-instance maximum
    /// labels.
    pub fn load_checkpoint(&mut self, path: impl AsRef<Path>) -> Result<(), LabelError> {
        let loaded = checkpoint::load(path, &mut self.domain);
        // The reductions run on every rank whether or not the local load
        // succeeded; a failed load leaves the domain and the maxima as they were.
        let mut maxima = Vec::with_capacity(self.max_labels.len());
        for n in 0..self.max_labels.len() {
            let local = local_max(
                self.domain
                    .local()
                    .field(n)
                    .iter()
                    .map(SparseLabelVector::max_label),
            );
            maxima.push(self.domain.reduce_max(local)?);
        }
        loaded?;
        self.max_labels = maxima;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::field::RowMajor;
    use crate::solver::FractionConvention;

    fn layout() -> HostLayout {
        HostLayout::new([3, 2, 2], [2, 2, 1, 1, 0, 3]).unwrap()
    }

    #[test]
    fn layout_lengths() {
        let l = layout();
        assert_eq!(l.len(), 7 * 4 * 5);
        let data = vec![0.0; l.len()];
        assert!(l.wrap::<f64, RowMajor>(&data).is_ok());
        assert!(matches!(
            l.wrap::<f64, RowMajor>(&data[1..]),
            Err(LabelError::FieldLength { .. })
        ));
        let row = vec![1.0; 5];
        assert_eq!(l.cell_row::<RowMajor>(2, &row).unwrap().size(), 2);
        assert!(l.cell_row::<RowMajor>(0, &row).is_err());
    }

    #[test]
    fn counts_must_match_domain() {
        let d = Domain::<RowMajor>::new(3, 2, 1, 1).unwrap();
        assert!(matches!(
            LabelTracker::new(d, layout(), SolverConfig::default()),
            Err(LabelError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn seeding_and_queries() {
        let l = layout();
        let d = Domain::<RowMajor>::new(3, 2, 2, 2).unwrap();
        let mut t = LabelTracker::new(d, l, SolverConfig::with_convention(FractionConvention::Phase)).unwrap();
        let labels: Vec<i32> = (0..l.len() as i32).collect();
        let f = vec![0.5; l.len()];
        let max = t.seed_labels(1, &labels, &f).unwrap();
        // last interior cell (2, 1, 1) sits at offset (4 * 4 + 2) * 5 + 1
        assert_eq!(max, 91);
        assert_eq!(t.max_label(1), max);
        assert_eq!(t.max_label(0), 0);
        // first interior cell of a [2,2 | 1,1 | 0,3] padded buffer
        assert_eq!(t.label_at(0, 0, 0, 1), (2 * 4 * 5 + 5) as u32);
        assert_eq!(t.label_at(0, 0, 0, 0), 0);
        assert!(!t.contains_nan().unwrap());

        let mut bad = labels.clone();
        bad[3] = -4; // padding is never read
        t.seed_labels(0, &bad, &f).unwrap();
        bad[50] = -4; // interior cell (0, 1, 0)
        assert!(matches!(
            t.seed_labels(0, &bad, &f),
            Err(LabelError::InvalidLabel { label: -4, cell: 2 })
        ));
    }
}
