//! Iterators over the non-padded cells of a padded field.
//!
//! Both iterators hold the still-unvisited span of the buffer, from the next
//! front cell to the next back cell, and shrink it from either end. Wrapping
//! past the end of a fast row or a middle plane skips the padding gap.

use super::order::AxisOrder;
use super::shape::FieldShape;

#[derive(Clone, Debug)]
struct Cursor {
    n: [usize; 2],
    jump: [usize; 2],
    front: [usize; 2],
    back: [usize; 2],
    remaining: usize,
}

impl Cursor {
    /// Cursor and the `[first, last]` buffer offsets of the walk, if any.
    fn new<O: AxisOrder>(shape: &FieldShape) -> (Self, Option<(usize, usize)>) {
        let remaining = shape.size();
        let fast = O::fastest();
        let mid = O::middle();
        let n = [shape.count(fast) as usize, shape.count(mid) as usize];
        let jump = [
            (shape.pad_lo(fast) + shape.pad_hi(fast)) as usize,
            (shape.pad_lo(mid) + shape.pad_hi(mid)) as usize * shape.extent(fast),
        ];
        let span = (remaining > 0).then(|| {
            let c = shape.counts();
            (
                shape.offset::<O>([0, 0, 0]),
                shape.offset::<O>([c[0] - 1, c[1] - 1, c[2] - 1]),
            )
        });
        let cursor = Cursor {
            n,
            jump,
            front: [0, 0],
            back: [n[0].saturating_sub(1), n[1].saturating_sub(1)],
            remaining,
        };
        (cursor, span)
    }

    /// Gap to skip after stepping the front forward.
    #[inline]
    fn advance(&mut self) -> usize {
        self.front[0] += 1;
        if self.front[0] < self.n[0] {
            return 0;
        }
        self.front[0] = 0;
        self.front[1] += 1;
        if self.front[1] < self.n[1] {
            return self.jump[0];
        }
        self.front[1] = 0;
        self.jump[0] + self.jump[1]
    }

    /// Gap to skip after stepping the back backward.
    #[inline]
    fn retreat(&mut self) -> usize {
        if self.back[0] > 0 {
            self.back[0] -= 1;
            return 0;
        }
        self.back[0] = self.n[0] - 1;
        if self.back[1] > 0 {
            self.back[1] -= 1;
            return self.jump[0];
        }
        self.back[1] = self.n[1] - 1;
        self.jump[0] + self.jump[1]
    }
}

/// Shared iterator over non-padded cells.
#[derive(Debug)]
pub struct Iter<'a, T> {
    rest: &'a [T],
    cursor: Cursor,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            rest: self.rest,
            cursor: self.cursor.clone(),
        }
    }
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new<O: AxisOrder>(data: &'a [T], shape: &FieldShape) -> Self {
        let (cursor, span) = Cursor::new::<O>(shape);
        let rest = match span {
            Some((first, last)) => &data[first..=last],
            None => &[],
        };
        Self { rest, cursor }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cursor.remaining == 0 {
            return None;
        }
        self.cursor.remaining -= 1;
        let (head, tail) = self.rest.split_first()?;
        self.rest = tail;
        if self.cursor.remaining > 0 {
            let gap = self.cursor.advance();
            self.rest = &self.rest[gap..];
        }
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.cursor.remaining == 0 {
            return None;
        }
        self.cursor.remaining -= 1;
        let (last, init) = self.rest.split_last()?;
        self.rest = init;
        if self.cursor.remaining > 0 {
            let gap = self.cursor.retreat();
            self.rest = &self.rest[..self.rest.len() - gap];
        }
        Some(last)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> std::iter::FusedIterator for Iter<'_, T> {}

/// Exclusive iterator over non-padded cells.
#[derive(Debug)]
pub struct IterMut<'a, T> {
    rest: &'a mut [T],
    cursor: Cursor,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new<O: AxisOrder>(data: &'a mut [T], shape: &FieldShape) -> Self {
        let (cursor, span) = Cursor::new::<O>(shape);
        let rest = match span {
            Some((first, last)) => &mut data[first..=last],
            None => &mut [],
        };
        Self { rest, cursor }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.cursor.remaining == 0 {
            return None;
        }
        self.cursor.remaining -= 1;
        let (head, tail) = std::mem::take(&mut self.rest).split_first_mut()?;
        self.rest = tail;
        if self.cursor.remaining > 0 {
            let gap = self.cursor.advance();
            let rest = std::mem::take(&mut self.rest);
            self.rest = &mut rest[gap..];
        }
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.cursor.remaining == 0 {
            return None;
        }
        self.cursor.remaining -= 1;
        let (last, init) = std::mem::take(&mut self.rest).split_last_mut()?;
        self.rest = init;
        if self.cursor.remaining > 0 {
            let gap = self.cursor.retreat();
            let rest = std::mem::take(&mut self.rest);
            let keep = rest.len() - gap;
            self.rest = &mut rest[..keep];
        }
        Some(last)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> std::iter::FusedIterator for IterMut<'_, T> {}
