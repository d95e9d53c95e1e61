//! Padded 3-D views over flat buffers, and the owning variant.

use super::iter::{Iter, IterMut};
use super::order::{AxisOrder, DefaultOrder};
use super::shape::FieldShape;
use crate::label_error::LabelError;
use std::marker::PhantomData;
use std::ops::Range;

fn check_len(found: usize, shape: &FieldShape) -> Result<(), LabelError> {
    let expected = shape.len();
    if found == expected {
        Ok(())
    } else {
        Err(LabelError::FieldLength { expected, found })
    }
}

/// Read-only padded view.
#[derive(Debug)]
pub struct PaddedField<'a, T, O: AxisOrder = DefaultOrder> {
    data: &'a [T],
    shape: FieldShape,
    _order: PhantomData<O>,
}

impl<T, O: AxisOrder> Clone for PaddedField<'_, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, O: AxisOrder> Copy for PaddedField<'_, T, O> {}

impl<'a, T, O: AxisOrder> PaddedField<'a, T, O> {
    /// Wrap an external buffer; its length must equal `shape.len()`.
    pub fn new(data: &'a [T], shape: FieldShape) -> Result<Self, LabelError> {
        check_len(data.len(), &shape)?;
        Ok(Self::from_parts(data, shape))
    }

    pub(crate) fn from_parts(data: &'a [T], shape: FieldShape) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self {
            data,
            shape,
            _order: PhantomData,
        }
    }

    #[inline]
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Number of non-padded cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn at(&self, i: i32, j: i32, k: i32) -> &'a T {
        &self.data[self.shape.offset::<O>([i, j, k])]
    }

    /// Sub-view `i × j × k` (end-exclusive) over the same buffer.
    pub fn slice(&self, i: Range<i32>, j: Range<i32>, k: Range<i32>) -> PaddedField<'a, T, O> {
        PaddedField::from_parts(self.data, self.shape.slice(i, j, k))
    }

    pub fn iter(&self) -> Iter<'a, T> {
        Iter::new::<O>(self.data, &self.shape)
    }

    /// The whole underlying buffer, padding included.
    pub fn as_raw(&self) -> &'a [T] {
        self.data
    }
}

impl<'a, T, O: AxisOrder> IntoIterator for PaddedField<'a, T, O> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Mutable padded view.
#[derive(Debug)]
pub struct PaddedFieldMut<'a, T, O: AxisOrder = DefaultOrder> {
    data: &'a mut [T],
    shape: FieldShape,
    _order: PhantomData<O>,
}

impl<'a, T, O: AxisOrder> PaddedFieldMut<'a, T, O> {
    pub fn new(data: &'a mut [T], shape: FieldShape) -> Result<Self, LabelError> {
        check_len(data.len(), &shape)?;
        Ok(Self::from_parts(data, shape))
    }

    pub(crate) fn from_parts(data: &'a mut [T], shape: FieldShape) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self {
            data,
            shape,
            _order: PhantomData,
        }
    }

    #[inline]
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn at(&self, i: i32, j: i32, k: i32) -> &T {
        &self.data[self.shape.offset::<O>([i, j, k])]
    }

    #[inline]
    pub fn at_mut(&mut self, i: i32, j: i32, k: i32) -> &mut T {
        &mut self.data[self.shape.offset::<O>([i, j, k])]
    }

    pub fn view(&self) -> PaddedField<'_, T, O> {
        PaddedField::from_parts(self.data, self.shape)
    }

    pub fn slice(&self, i: Range<i32>, j: Range<i32>, k: Range<i32>) -> PaddedField<'_, T, O> {
        PaddedField::from_parts(self.data, self.shape.slice(i, j, k))
    }

    pub fn slice_mut(
        &mut self,
        i: Range<i32>,
        j: Range<i32>,
        k: Range<i32>,
    ) -> PaddedFieldMut<'_, T, O> {
        let shape = self.shape.slice(i, j, k);
        PaddedFieldMut::from_parts(self.data, shape)
    }

    /// Like [`slice_mut`](Self::slice_mut) but keeps the original borrow.
    pub fn into_slice_mut(
        self,
        i: Range<i32>,
        j: Range<i32>,
        k: Range<i32>,
    ) -> PaddedFieldMut<'a, T, O> {
        let shape = self.shape.slice(i, j, k);
        PaddedFieldMut::from_parts(self.data, shape)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new::<O>(self.data, &self.shape)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new::<O>(self.data, &self.shape)
    }
}

impl<'a, T, O: AxisOrder> IntoIterator for PaddedFieldMut<'a, T, O> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        IterMut::new::<O>(self.data, &self.shape)
    }
}

/// Padded field that owns its buffer. `clone` deep-copies.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedField<T, O: AxisOrder = DefaultOrder> {
    data: Vec<T>,
    shape: FieldShape,
    _order: PhantomData<O>,
}

impl<T: Default, O: AxisOrder> OwnedField<T, O> {
    /// Allocate `shape.len()` default elements.
    pub fn new(shape: FieldShape) -> Self {
        let data = std::iter::repeat_with(T::default).take(shape.len()).collect();
        Self {
            data,
            shape,
            _order: PhantomData,
        }
    }
}

impl<T, O: AxisOrder> OwnedField<T, O> {
    pub fn from_vec(data: Vec<T>, shape: FieldShape) -> Result<Self, LabelError> {
        check_len(data.len(), &shape)?;
        Ok(Self {
            data,
            shape,
            _order: PhantomData,
        })
    }

    #[inline]
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn at(&self, i: i32, j: i32, k: i32) -> &T {
        &self.data[self.shape.offset::<O>([i, j, k])]
    }

    #[inline]
    pub fn at_mut(&mut self, i: i32, j: i32, k: i32) -> &mut T {
        &mut self.data[self.shape.offset::<O>([i, j, k])]
    }

    pub fn view(&self) -> PaddedField<'_, T, O> {
        PaddedField::from_parts(&self.data, self.shape)
    }

    pub fn view_mut(&mut self) -> PaddedFieldMut<'_, T, O> {
        PaddedFieldMut::from_parts(&mut self.data, self.shape)
    }

    pub fn slice(&self, i: Range<i32>, j: Range<i32>, k: Range<i32>) -> PaddedField<'_, T, O> {
        PaddedField::from_parts(&self.data, self.shape.slice(i, j, k))
    }

    pub fn slice_mut(
        &mut self,
        i: Range<i32>,
        j: Range<i32>,
        k: Range<i32>,
    ) -> PaddedFieldMut<'_, T, O> {
        let shape = self.shape.slice(i, j, k);
        PaddedFieldMut::from_parts(&mut self.data, shape)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new::<O>(&self.data, &self.shape)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new::<O>(&mut self.data, &self.shape)
    }

    /// Raw buffer including padding.
    pub fn as_raw(&self) -> &[T] {
        &self.data
    }

    /// Apply `f` to every element of the buffer, padding included.
    pub fn for_each_raw_mut(&mut self, f: impl FnMut(&mut T)) {
        self.data.iter_mut().for_each(f);
    }
}

impl<'a, T, O: AxisOrder> IntoIterator for &'a OwnedField<T, O> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, O: AxisOrder> IntoIterator for &'a mut OwnedField<T, O> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
