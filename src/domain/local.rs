//! The per-process label domain and the trait shared with its distributed
//! counterpart.

use std::ops::Range;

use super::face::Face;
use crate::algs::reduce::ReduceMax;
use crate::field::{AxisOrder, DefaultOrder, FieldShape, OwnedField, PaddedField, PaddedFieldMut};
use crate::label_error::LabelError;
use crate::svector::SparseLabelVector;

/// Label field of one instance: one sparse vector per cell, one padding layer.
pub type LabelField<O = DefaultOrder> = OwnedField<SparseLabelVector, O>;

/// `nn` independent label fields over the same `ni × nj × nk` cells.
///
/// Every field carries exactly one layer of padding per face, whatever the
/// host's own padding is.
#[derive(Clone, Debug)]
pub struct Domain<O: AxisOrder = DefaultOrder> {
    n: [usize; 3],
    fields: Vec<LabelField<O>>,
}

impl<O: AxisOrder> Domain<O> {
    pub fn new(ni: usize, nj: usize, nk: usize, nn: usize) -> Result<Self, LabelError> {
        let n = [ni, nj, nk];
        if n.contains(&0) {
            return Err(LabelError::InvalidShape {
                n,
                reason: "cell counts must be positive",
            });
        }
        let shape = FieldShape::uniform(n, 1)?;
        let fields = (0..nn).map(|_| LabelField::new(shape)).collect();
        Ok(Self { n, fields })
    }

    /// Cell counts `[ni, nj, nk]`.
    #[inline]
    pub fn counts(&self) -> [usize; 3] {
        self.n
    }

    /// Number of instances.
    #[inline]
    pub fn nn(&self) -> usize {
        self.fields.len()
    }

    /// Shape shared by every label field.
    pub fn shape(&self) -> Result<FieldShape, LabelError> {
        FieldShape::uniform(self.n, 1)
    }

    pub fn field(&self, n: usize) -> PaddedField<'_, SparseLabelVector, O> {
        self.fields[n].view()
    }

    pub fn field_mut(&mut self, n: usize) -> PaddedFieldMut<'_, SparseLabelVector, O> {
        self.fields[n].view_mut()
    }

    pub(crate) fn fields(&self) -> &[LabelField<O>] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [LabelField<O>] {
        &mut self.fields
    }

    /// Index ranges of the one-cell layer just outside (`ghost`) or just
    /// inside `face`.
    fn layer(&self, face: Face, ghost: bool) -> [Range<i32>; 3] {
        let mut r = self.n.map(|c| 0..c as i32);
        let a = face.axis().index();
        let c = self.n[a] as i32;
        r[a] = match (face.is_plus(), ghost) {
            (false, true) => -1..0,
            (false, false) => 0..1,
            (true, false) => c - 1..c,
            (true, true) => c..c + 1,
        };
        r
    }

    pub fn ghost(&self, face: Face, n: usize) -> PaddedField<'_, SparseLabelVector, O> {
        let [i, j, k] = self.layer(face, true);
        self.fields[n].slice(i, j, k)
    }

    pub fn ghost_mut(&mut self, face: Face, n: usize) -> PaddedFieldMut<'_, SparseLabelVector, O> {
        let [i, j, k] = self.layer(face, true);
        self.fields[n].slice_mut(i, j, k)
    }

    pub fn edge(&self, face: Face, n: usize) -> PaddedField<'_, SparseLabelVector, O> {
        let [i, j, k] = self.layer(face, false);
        self.fields[n].slice(i, j, k)
    }

    pub fn edge_mut(&mut self, face: Face, n: usize) -> PaddedFieldMut<'_, SparseLabelVector, O> {
        let [i, j, k] = self.layer(face, false);
        self.fields[n].slice_mut(i, j, k)
    }

    /// True if any stored value in any instance, padding included, is NaN.
    pub fn contains_nan(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.as_raw().iter().any(SparseLabelVector::contains_nan))
    }
}

/// Operations shared by serial and distributed label domains.
pub trait LabelDomain {
    type Order: AxisOrder;
    /// Recorded in checkpoint headers.
    const DISTRIBUTED: bool;

    fn local(&self) -> &Domain<Self::Order>;
    fn local_mut(&mut self) -> &mut Domain<Self::Order>;

    /// True if another rank owns the cells behind `face`.
    fn has_neighbor(&self, face: Face) -> bool;

    /// True on exactly one rank.
    fn is_root(&self) -> bool;

    /// Refresh the ghost layer behind `face` of every instance. Must be called
    /// collectively.
    fn update_ghost(&mut self, face: Face) -> Result<(), LabelError>;

    /// Maximum of `value` over every rank. Must be called collectively.
    fn reduce_max<T: ReduceMax>(&self, value: T) -> Result<T, LabelError>;
}

impl<O: AxisOrder> LabelDomain for Domain<O> {
    type Order = O;
    const DISTRIBUTED: bool = false;

    fn local(&self) -> &Domain<O> {
        self
    }

    fn local_mut(&mut self) -> &mut Domain<O> {
        self
    }

    fn has_neighbor(&self, _face: Face) -> bool {
        false
    }

    fn is_root(&self) -> bool {
        true
    }

    fn update_ghost(&mut self, _face: Face) -> Result<(), LabelError> {
        Ok(())
    }

    fn reduce_max<T: ReduceMax>(&self, value: T) -> Result<T, LabelError> {
        Ok(value)
    }
}
