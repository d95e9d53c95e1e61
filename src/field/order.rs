//! Axis orderings of padded 3-D buffers.
//!
//! The ordering is a type parameter rather than a build switch, so both
//! layouts can coexist in one program; [`DefaultOrder`] picks the one used
//! when nothing is specified (`column-major` feature: Fortran layout).

use std::fmt::Debug;

/// Index-to-offset convention of a 3-D buffer.
pub trait AxisOrder: Copy + Clone + Default + Debug + Send + Sync + 'static {
    /// Axes from slowest to fastest varying.
    const AXES: [usize; 3];
    /// Recorded in checkpoint headers; `true` for the Fortran layout.
    const COLUMN_MAJOR: bool;

    /// Fastest-varying axis.
    #[inline]
    fn fastest() -> usize {
        Self::AXES[2]
    }

    /// Middle axis.
    #[inline]
    fn middle() -> usize {
        Self::AXES[1]
    }

    /// Slowest-varying axis.
    #[inline]
    fn slowest() -> usize {
        Self::AXES[0]
    }
}

/// C layout, `[i][j][k]`: `k` varies fastest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RowMajor;

/// Fortran layout, `(i,j,k)`: `i` varies fastest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColumnMajor;

impl AxisOrder for RowMajor {
    const AXES: [usize; 3] = [0, 1, 2];
    const COLUMN_MAJOR: bool = false;
}

impl AxisOrder for ColumnMajor {
    const AXES: [usize; 3] = [2, 1, 0];
    const COLUMN_MAJOR: bool = true;
}

/// Build-wide default ordering.
#[cfg(not(feature = "column-major"))]
pub type DefaultOrder = RowMajor;

/// Build-wide default ordering.
#[cfg(feature = "column-major")]
pub type DefaultOrder = ColumnMajor;
