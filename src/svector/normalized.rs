//! `NormalizedView`: a sparse vector with a deferred normalization factor.

use super::element::Value;
use super::sparse::{SparseLabelVector, degenerate_ratio};

/// `base * factor`, kept unevaluated.
///
/// Constructed as "`a` rescaled so that its sum equals `total`" without
/// dividing every element up front. A degenerate target (zero total, zero
/// sum, subnormal ratio) yields an empty base and a factor of zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedView {
    base: SparseLabelVector,
    factor: Value,
}

impl NormalizedView {
    /// View of `a` normalized to sum to `total`.
    pub fn new(a: &SparseLabelVector, total: Value) -> Self {
        let s = a.sum();
        if degenerate_ratio(s, total) {
            return Self::default();
        }
        let factor = total / s;
        debug_assert!(factor.is_finite());
        Self {
            base: a.clone(),
            factor,
        }
    }

    /// Re-point this view at `a`, reusing the base allocation.
    pub fn assign(&mut self, a: &SparseLabelVector, total: Value) {
        let s = a.sum();
        if degenerate_ratio(s, total) {
            self.clear();
            return;
        }
        self.base.clone_from(a);
        self.factor = total / s;
    }

    #[inline]
    pub fn base(&self) -> &SparseLabelVector {
        &self.base
    }

    #[inline]
    pub fn factor(&self) -> Value {
        self.factor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Sum of the materialized vector.
    pub fn sum(&self) -> Value {
        self.base.sum() * self.factor
    }

    pub fn clear(&mut self) {
        self.base.clear();
        self.factor = 0.0;
    }

    /// Evaluate `base * factor`.
    pub fn materialize(&self) -> SparseLabelVector {
        let mut out = self.base.clone();
        out.scale_in_place(self.factor);
        out
    }
}

impl From<&NormalizedView> for SparseLabelVector {
    fn from(view: &NormalizedView) -> Self {
        view.materialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svector::Element;

    #[test]
    fn deferred_factor() {
        let a = SparseLabelVector::from_sorted(vec![Element::new(2, 1.0), Element::new(5, 3.0)]);
        let v = NormalizedView::new(&a, 0.5);
        assert_eq!(v.factor(), 0.125);
        assert_eq!(v.base(), &a);
        assert_eq!(v.sum(), 0.5);

        let m = v.materialize();
        assert_eq!(m.get(2), Some(0.125));
        assert_eq!(m.get(5), Some(0.375));
    }

    #[test]
    fn degenerate_targets_are_empty() {
        let a = SparseLabelVector::from_sorted(vec![Element::new(0, 1.0), Element::new(1, -1.0)]);
        assert!(NormalizedView::new(&a, 1.0).is_empty());

        let b = SparseLabelVector::from(Element::new(0, 2.0));
        let zero = NormalizedView::new(&b, 0.0);
        assert!(zero.is_empty());
        assert_eq!(zero.factor(), 0.0);
        assert!(zero.materialize().is_empty());

        assert!(NormalizedView::new(&SparseLabelVector::new(), 1.0).is_empty());
    }

    #[test]
    fn assign_reuses_view() {
        let a = SparseLabelVector::from(Element::new(4, 2.0));
        let mut v = NormalizedView::default();
        v.assign(&a, 1.0);
        assert_eq!(v.factor(), 0.5);
        v.assign(&a, 0.0);
        assert!(v.is_empty());
        assert_eq!(v.factor(), 0.0);
    }
}
