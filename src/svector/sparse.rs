//! `SparseLabelVector`: sorted `(label, value)` storage and its merge algebra.
//!
//! The vector stores a volume fraction per blob label in a single cell. Labels
//! are strictly increasing; every merge below relies on that ordering. Stored
//! values are *not* guaranteed non-zero: near-zero and negative noise is only
//! removed by [`SparseLabelVector::chop`].

use super::element::{Element, Label, Value};
use super::normalized::NormalizedView;
use serde::{Deserialize, Serialize};

/// Sparse vector of per-label values in one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseLabelVector {
    elements: Vec<Element>,
}

/// Something that can be added into a [`SparseLabelVector`]: a base vector
/// together with a deferred scale factor.
pub trait LabelTerm {
    /// The base vector and the factor it must be multiplied by.
    fn parts(&self) -> (&SparseLabelVector, Value);
}

impl LabelTerm for SparseLabelVector {
    #[inline]
    fn parts(&self) -> (&SparseLabelVector, Value) {
        (self, 1.0)
    }
}

impl LabelTerm for NormalizedView {
    #[inline]
    fn parts(&self) -> (&SparseLabelVector, Value) {
        (self.base(), self.factor())
    }
}

/// `value / total` would overflow (or `total` is zero): the vector is emptied
/// instead of producing infinities.
#[inline]
pub(crate) fn degenerate_ratio(sum: Value, total: Value) -> bool {
    total == 0.0 || sum == 0.0 || (sum / total).abs() < Value::MIN_POSITIVE
}

impl SparseLabelVector {
    /// Empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from elements already sorted by strictly increasing label.
    ///
    /// # Panics
    /// Panics if labels are not strictly increasing or the sentinel is present.
    pub fn from_sorted(elements: Vec<Element>) -> Self {
        assert!(
            is_strictly_sorted(&elements),
            "sparse label vector elements must have strictly increasing labels"
        );
        assert!(
            elements.last().is_none_or(|e| !e.is_end()),
            "sentinel label inside sparse label vector"
        );
        Self { elements }
    }

    /// Build from a buffer terminated by [`END_ELEMENT`](super::END_ELEMENT).
    ///
    /// Reading stops at the first sentinel; everything after it is ignored.
    ///
    /// # Panics
    /// Panics if no sentinel is found or labels before it are not strictly
    /// increasing.
    pub fn from_terminated(buf: &[Element]) -> Self {
        let end = buf
            .iter()
            .position(Element::is_end)
            .expect("element buffer must be terminated by END_ELEMENT");
        Self::from_sorted(buf[..end].to_vec())
    }

    /// Number of stored elements (not necessarily non-zero).
    #[inline]
    pub fn nnz(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Value stored for `label`, if any.
    pub fn get(&self, label: Label) -> Option<Value> {
        self.elements
            .binary_search_by_key(&label, |e| e.label)
            .ok()
            .map(|i| self.elements[i].value)
    }

    /// Lowest stored label.
    pub fn first_label(&self) -> Option<Label> {
        self.elements.first().map(|e| e.label)
    }

    pub fn sum(&self) -> Value {
        self.elements.iter().map(|e| e.value).sum()
    }

    pub fn min_value(&self) -> Option<Value> {
        self.elements.iter().map(|e| e.value).reduce(Value::min)
    }

    pub fn max_value(&self) -> Option<Value> {
        self.elements.iter().map(|e| e.value).reduce(Value::max)
    }

    /// Highest stored label, `0` when empty.
    pub fn max_label(&self) -> Label {
        self.elements.last().map_or(0, |e| e.label)
    }

    pub fn contains_nan(&self) -> bool {
        self.elements.iter().any(|e| e.value.is_nan())
    }

    /// `self ← self + scale · term`.
    ///
    /// In-place merge: shared labels get a fused multiply-add, labels only in
    /// `term` are inserted at their sorted position. Inserting is O(n) each, so
    /// many interleaved new labels make this quadratic; label sets of
    /// neighbouring cells overlap heavily, which keeps it linear in practice.
    /// The result equals `fused_merge_add(term, scale, self)` exactly.
    pub fn add<T: LabelTerm + ?Sized>(&mut self, term: &T, scale: Value) {
        let (base, factor) = term.parts();
        self.add_scaled(base, scale * factor);
    }

    fn add_scaled(&mut self, other: &SparseLabelVector, c: Value) {
        if other.is_empty() {
            return;
        }

        let mut i = 0;
        let mut incoming = other.elements.iter();
        while let Some(&elm) = incoming.next() {
            while i < self.elements.len() && self.elements[i].label < elm.label {
                i += 1;
            }
            if i == self.elements.len() {
                // tail of `other` is entirely new
                self.elements.reserve(incoming.len() + 1);
                self.elements.push(elm.scaled(c));
                self.elements.extend(incoming.map(|e| e.scaled(c)));
                return;
            }
            let local = &mut self.elements[i];
            if local.label == elm.label {
                *local = elm.fma(c, *local);
            } else {
                self.elements.insert(i, elm.scaled(c));
            }
            i += 1;
        }
    }

    /// Rescale so that `sum() == total`.
    ///
    /// Clears the vector when `total` is zero, the current sum is zero, or the
    /// ratio `sum/total` is subnormal.
    pub fn normalize(&mut self, total: Value) {
        if self.is_empty() {
            return;
        }
        let s = self.sum();
        if degenerate_ratio(s, total) {
            self.clear();
            return;
        }
        let factor = total / s;
        for elm in &mut self.elements {
            *elm *= factor;
        }
    }

    /// Remove every element with value `<= f64::EPSILON * reference`.
    ///
    /// This drops negative noise and exact zeros in one pass.
    pub fn chop(&mut self, reference: Value) {
        let threshold = Value::EPSILON * reference;
        self.elements.retain(|e| e.value > threshold);
    }

    /// `chop(1.0)`.
    pub fn chop_default(&mut self) {
        self.chop(1.0);
    }

    /// Remove the element with `label`, if present.
    pub fn zero_entry(&mut self, label: Label) {
        if let Ok(i) = self.elements.binary_search_by_key(&label, |e| e.label) {
            self.elements.remove(i);
        }
    }

    /// Empty the vector, keeping its allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Replace the contents, reusing the allocation. `src` must already be
    /// strictly sorted and sentinel-free.
    pub(crate) fn assign_sorted(&mut self, src: impl IntoIterator<Item = Element>) {
        self.elements.clear();
        self.elements.extend(src);
        debug_assert!(is_strictly_sorted(&self.elements));
    }

    pub(crate) fn scale_in_place(&mut self, c: Value) {
        for elm in &mut self.elements {
            *elm *= c;
        }
    }
}

fn is_strictly_sorted(elements: &[Element]) -> bool {
    elements.windows(2).all(|w| w[0].label < w[1].label)
}

/// Fused multiply and add, `c·a + b`, with absent labels read as zero.
pub fn fused_merge_add(a: &SparseLabelVector, c: Value, b: &SparseLabelVector) -> SparseLabelVector {
    let lhs = &a.elements;
    let rhs = &b.elements;
    let mut out = Vec::with_capacity(lhs.len().max(rhs.len()));

    let (mut l, mut r) = (0, 0);
    while l < lhs.len() && r < rhs.len() {
        let (el, er) = (lhs[l], rhs[r]);
        if el.label < er.label {
            out.push(el.scaled(c));
            l += 1;
        } else if el.label > er.label {
            out.push(er);
            r += 1;
        } else {
            out.push(el.fma(c, er));
            l += 1;
            r += 1;
        }
    }
    out.extend(lhs[l..].iter().map(|e| e.scaled(c)));
    out.extend_from_slice(&rhs[r..]);

    SparseLabelVector { elements: out }
}

impl From<Element> for SparseLabelVector {
    fn from(elm: Element) -> Self {
        assert!(!elm.is_end(), "sentinel label inside sparse label vector");
        Self {
            elements: vec![elm],
        }
    }
}

impl<'a> IntoIterator for &'a SparseLabelVector {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;
    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl std::ops::Mul<Value> for &SparseLabelVector {
    type Output = SparseLabelVector;
    fn mul(self, c: Value) -> SparseLabelVector {
        let mut out = self.clone();
        out.scale_in_place(c);
        out
    }
}

impl std::ops::Div<Value> for &SparseLabelVector {
    type Output = SparseLabelVector;
    fn div(self, c: Value) -> SparseLabelVector {
        let mut out = self.clone();
        for elm in &mut out.elements {
            *elm /= c;
        }
        out
    }
}
