//! Padded 3-D fields.
//!
//! A field is a flat buffer interpreted as `ni × nj × nk` cells surrounded by
//! per-face padding. [`PaddedField`] and [`PaddedFieldMut`] borrow a buffer,
//! [`OwnedField`] owns one. Slicing never copies: a slice is the same buffer
//! with re-derived counts and padding, so index `0` of the slice lands on the
//! slice start in the parent.
//!
//! ```
//! use label_advection::field::{FieldShape, OwnedField, RowMajor};
//!
//! let shape = FieldShape::uniform([3, 2, 2], 1).unwrap();
//! let mut f: OwnedField<i32, RowMajor> = OwnedField::new(shape);
//! *f.at_mut(-1, 0, 0) = 7;
//! let ghost = f.slice(-1..0, 0..2, 0..2);
//! assert_eq!(*ghost.at(0, 0, 0), 7);
//! assert_eq!(ghost.size(), 4);
//! ```

pub mod iter;
pub mod order;
pub mod shape;
pub mod view;

pub use iter::{Iter, IterMut};
pub use order::{AxisOrder, ColumnMajor, DefaultOrder, RowMajor};
pub use shape::{CellIndices, FieldShape};
pub use view::{OwnedField, PaddedField, PaddedFieldMut};
