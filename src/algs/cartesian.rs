//! Cartesian process grids: rank ↔ coordinates and neighbour shifts.

use serde::{Deserialize, Serialize};

use crate::label_error::LabelError;

/// A `dims[0] × dims[1] × dims[2]` process grid. Ranks are numbered with
/// the last axis varying fastest, as MPI does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartesianGrid {
    dims: [usize; 3],
    periodic: [bool; 3],
}

impl CartesianGrid {
    pub fn new(dims: [usize; 3], periodic: [bool; 3]) -> Result<Self, LabelError> {
        let grid = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if dims.contains(&0) || grid.is_none() {
            return Err(LabelError::NotCartesian {
                dims,
                grid: grid.unwrap_or(usize::MAX),
                comm: 0,
            });
        }
        Ok(Self { dims, periodic })
    }

    /// A balanced grid of `size` ranks with non-increasing dims.
    pub fn balanced(size: usize, periodic: [bool; 3]) -> Result<Self, LabelError> {
        let mut dims = [1usize; 3];
        let mut rest = size;
        let mut factors = Vec::new();
        let mut p = 2;
        while p * p <= rest {
            while rest % p == 0 {
                factors.push(p);
                rest /= p;
            }
            p += 1;
        }
        if rest > 1 {
            factors.push(rest);
        }
        for f in factors.into_iter().rev() {
            if let Some(d) = dims.iter_mut().min() {
                *d *= f;
            }
        }
        dims.sort_unstable_by(|a, b| b.cmp(a));
        if size == 0 {
            dims = [0; 3];
        }
        Self::new(dims, periodic)
    }

    /// A single-rank grid.
    pub fn single(periodic: [bool; 3]) -> Self {
        Self {
            dims: [1; 3],
            periodic,
        }
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    /// Number of ranks in the grid.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the grid spans exactly `comm_size` ranks.
    pub fn check_size(&self, comm_size: usize) -> Result<(), LabelError> {
        if self.len() == comm_size {
            Ok(())
        } else {
            Err(LabelError::NotCartesian {
                dims: self.dims,
                grid: self.len(),
                comm: comm_size,
            })
        }
    }

    pub fn coords(&self, rank: usize) -> [usize; 3] {
        let [_, d1, d2] = self.dims;
        [rank / (d1 * d2), (rank / d2) % d1, rank % d2]
    }

    pub fn rank_of(&self, coords: [usize; 3]) -> usize {
        (coords[0] * self.dims[1] + coords[1]) * self.dims[2] + coords[2]
    }

    /// `(minus, plus)` neighbours of `rank` along `axis`.
    pub fn shift(&self, rank: usize, axis: usize) -> (Option<usize>, Option<usize>) {
        let c = self.coords(rank);
        let d = self.dims[axis];
        let step = |forward: bool| {
            let x = c[axis];
            let next = match (forward, self.periodic[axis]) {
                (true, _) if x + 1 < d => x + 1,
                (true, true) => 0,
                (false, _) if x > 0 => x - 1,
                (false, true) => d - 1,
                _ => return None,
            };
            let mut n = c;
            n[axis] = next;
            Some(self.rank_of(n))
        };
        (step(false), step(true))
    }
}
