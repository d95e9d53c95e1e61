//! Sparse label vectors: per-cell `(label → volume)` storage and algebra.

pub mod element;
pub mod normalized;
pub mod sparse;

pub use element::{END_ELEMENT, Element, Label, Value};
pub use normalized::NormalizedView;
pub use sparse::{LabelTerm, SparseLabelVector, fused_merge_add};
