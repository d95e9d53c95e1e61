//! `FieldShape`: logical cell counts plus per-face padding of a 3-D buffer.

use super::order::AxisOrder;
use crate::label_error::LabelError;
use std::ops::Range;

/// Cell counts `[ni, nj, nk]` and padding `[i-, i+, j-, j+, k-, k+]`.
///
/// Indices handed to a field may run from `-pad_lo` to `n + pad_hi - 1` on
/// every axis. Slices keep the padded extent of their parent, so a shape
/// always describes the whole underlying buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldShape {
    n: [i32; 3],
    pad: [i32; 6],
}

fn to_i32(v: usize, n: [usize; 3], reason: &'static str) -> Result<i32, LabelError> {
    i32::try_from(v).map_err(|_| LabelError::InvalidShape { n, reason })
}

impl FieldShape {
    /// Validated shape for an external or owned buffer.
    pub fn new(n: [usize; 3], pad: [usize; 6]) -> Result<Self, LabelError> {
        let mut ni = [0i32; 3];
        let mut pi = [0i32; 6];
        for axis in 0..3 {
            ni[axis] = to_i32(n[axis], n, "cell count exceeds i32")?;
            pi[2 * axis] = to_i32(pad[2 * axis], n, "padding exceeds i32")?;
            pi[2 * axis + 1] = to_i32(pad[2 * axis + 1], n, "padding exceeds i32")?;
            let extent = n[axis]
                .checked_add(pad[2 * axis])
                .and_then(|e| e.checked_add(pad[2 * axis + 1]));
            match extent {
                Some(e) if i32::try_from(e).is_ok() => {}
                _ => {
                    return Err(LabelError::InvalidShape {
                        n,
                        reason: "padded extent exceeds i32",
                    });
                }
            }
        }
        Ok(Self { n: ni, pad: pi })
    }

    /// Same padding on every face.
    pub fn uniform(n: [usize; 3], pad: usize) -> Result<Self, LabelError> {
        Self::new(n, [pad; 6])
    }

    #[inline]
    pub fn counts(&self) -> [i32; 3] {
        self.n
    }

    #[inline]
    pub fn padding(&self) -> [i32; 6] {
        self.pad
    }

    #[inline]
    pub fn count(&self, axis: usize) -> i32 {
        self.n[axis]
    }

    #[inline]
    pub fn pad_lo(&self, axis: usize) -> i32 {
        self.pad[2 * axis]
    }

    #[inline]
    pub fn pad_hi(&self, axis: usize) -> i32 {
        self.pad[2 * axis + 1]
    }

    /// Padded extent along `axis`.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        (self.n[axis] + self.pad[2 * axis] + self.pad[2 * axis + 1]) as usize
    }

    /// Buffer length including padding.
    pub fn len(&self) -> usize {
        self.extent(0) * self.extent(1) * self.extent(2)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-padded cells.
    pub fn size(&self) -> usize {
        self.n.iter().map(|&c| c.max(0) as usize).product()
    }

    /// True if `idx` lies within the padded region.
    #[inline]
    pub fn contains(&self, idx: [i32; 3]) -> bool {
        (0..3).all(|a| idx[a] >= -self.pad_lo(a) && idx[a] < self.n[a] + self.pad_hi(a))
    }

    /// Offset of `idx` in the underlying buffer.
    #[inline]
    pub fn offset<O: AxisOrder>(&self, idx: [i32; 3]) -> usize {
        debug_assert!(
            self.contains(idx),
            "index {idx:?} outside padded field {:?} / {:?}",
            self.n,
            self.pad
        );
        let [slow, mid, fast] = O::AXES;
        let p = |axis: usize| (idx[axis] + self.pad_lo(axis)) as usize;
        (p(slow) * self.extent(mid) + p(mid)) * self.extent(fast) + p(fast)
    }

    /// Shape of the sub-block `i × j × k` (end-exclusive) of this shape.
    ///
    /// Index `0` of the result maps to `i.start` (etc.) of `self`.
    ///
    /// # Panics
    /// Panics if the block leaves the padded region or has a negative extent.
    pub fn slice(&self, i: Range<i32>, j: Range<i32>, k: Range<i32>) -> Self {
        let ranges = [i, j, k];
        let mut out = *self;
        for (axis, r) in ranges.into_iter().enumerate() {
            assert!(
                r.start <= r.end
                    && r.start >= -self.pad_lo(axis)
                    && r.end <= self.n[axis] + self.pad_hi(axis),
                "slice {r:?} outside padded axis {axis} (n={}, pad=[{}, {}])",
                self.n[axis],
                self.pad_lo(axis),
                self.pad_hi(axis)
            );
            out.n[axis] = r.end - r.start;
            out.pad[2 * axis] = self.pad_lo(axis) + r.start;
            out.pad[2 * axis + 1] = self.pad_hi(axis) + (self.n[axis] - r.end);
        }
        out
    }

    /// One-dimensional shape along `axis` with the given padding.
    pub fn line(axis: usize, n: usize, lo: usize, hi: usize) -> Result<Self, LabelError> {
        let mut counts = [1usize; 3];
        let mut pad = [0usize; 6];
        counts[axis] = n;
        pad[2 * axis] = lo;
        pad[2 * axis + 1] = hi;
        Self::new(counts, pad)
    }

    /// All non-padded indices in `O`'s storage order.
    pub fn cells<O: AxisOrder>(&self) -> CellIndices<O> {
        CellIndices {
            n: self.n,
            next: [0; 3],
            remaining: self.size(),
            order: std::marker::PhantomData,
        }
    }
}

/// Iterator over the `[i, j, k]` indices of non-padded cells.
#[derive(Clone, Debug)]
pub struct CellIndices<O> {
    n: [i32; 3],
    next: [i32; 3],
    remaining: usize,
    order: std::marker::PhantomData<O>,
}

impl<O: AxisOrder> Iterator for CellIndices<O> {
    type Item = [i32; 3];

    fn next(&mut self) -> Option<[i32; 3]> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let out = self.next;
        for axis in [O::fastest(), O::middle(), O::slowest()] {
            self.next[axis] += 1;
            if self.next[axis] < self.n[axis] {
                break;
            }
            self.next[axis] = 0;
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<O: AxisOrder> ExactSizeIterator for CellIndices<O> {}
