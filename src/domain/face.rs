//! Faces and axes of the box-shaped local domain.

use crate::label_error::LabelError;

/// Grid axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    I,
    J,
    K,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::I, Axis::J, Axis::K];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis for a sweep direction `0`, `1` or `2`.
    pub fn from_direction(direction: i64) -> Result<Axis, LabelError> {
        match direction {
            0 => Ok(Axis::I),
            1 => Ok(Axis::J),
            2 => Ok(Axis::K),
            d => Err(LabelError::InvalidDirection(d)),
        }
    }

    #[inline]
    pub fn minus(self) -> Face {
        Face::ALL[2 * self.index()]
    }

    #[inline]
    pub fn plus(self) -> Face {
        Face::ALL[2 * self.index() + 1]
    }
}

/// One of the six faces, in padding order `[i-, i+, j-, j+, k-, k+]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    IMinus,
    IPlus,
    JMinus,
    JPlus,
    KMinus,
    KPlus,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::IMinus,
        Face::IPlus,
        Face::JMinus,
        Face::JPlus,
        Face::KMinus,
        Face::KPlus,
    ];

    /// Position in [`Face::ALL`] and in padding arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn axis(self) -> Axis {
        Axis::ALL[self.index() / 2]
    }

    #[inline]
    pub fn is_plus(self) -> bool {
        self.index() % 2 == 1
    }

    #[inline]
    pub fn opposite(self) -> Face {
        Face::ALL[self.index() ^ 1]
    }
}
