//! `Element`: one `(label, value)` entry of a sparse label vector.

use serde::{Deserialize, Serialize};

/// Blob label. Label `0` conventionally means "unassigned/background".
pub type Label = u32;

/// Sub-cell volume fraction carried by a label.
pub type Value = f64;

/// A single entry of a [`SparseLabelVector`](super::SparseLabelVector).
///
/// Binary operations between elements assume both carry the same label; that
/// is checked with `debug_assert!` only.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Blob label.
    pub label: Label,
    /// Value carried for that label.
    pub value: Value,
}

/// Marks the end of a run of elements in serialized buffers.
///
/// Only the label is significant.
pub const END_ELEMENT: Element = Element {
    label: Label::MAX,
    value: 0.0,
};

impl Element {
    #[inline]
    pub const fn new(label: Label, value: Value) -> Self {
        Self { label, value }
    }

    /// True for the sentinel [`END_ELEMENT`].
    #[inline]
    pub fn is_end(&self) -> bool {
        self.label == END_ELEMENT.label
    }

    /// `self * c`, label unchanged.
    #[inline]
    pub fn scaled(self, c: Value) -> Self {
        Self {
            label: self.label,
            value: self.value * c,
        }
    }

    /// Fused `c * self + other`. Both must carry the same label.
    #[inline]
    pub fn fma(self, c: Value, other: Element) -> Self {
        debug_assert_eq!(self.label, other.label);
        Self {
            label: self.label,
            value: self.value.mul_add(c, other.value),
        }
    }
}

impl std::ops::MulAssign<Value> for Element {
    fn mul_assign(&mut self, rhs: Value) {
        self.value *= rhs;
    }
}

impl std::ops::DivAssign<Value> for Element {
    fn div_assign(&mut self, rhs: Value) {
        self.value /= rhs;
    }
}
