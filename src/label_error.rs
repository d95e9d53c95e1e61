//! LabelError: unified validation error for label-advection public APIs
//!
//! Violated preconditions (unsorted element runs, indices outside the padding,
//! instance indices out of range) are programming errors and panic. Everything a
//! correct caller can still trigger at runtime with bad input is reported
//! through this type instead.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for label-advection operations.
#[derive(Debug, Error)]
pub enum LabelError {
    /// A sweep direction outside `0..=2`.
    #[error("direction {0} outside of 0, 1, or 2")]
    InvalidDirection(i64),
    /// A cell size on the active row that is zero, subnormal, infinite or NaN.
    #[error("cell size {value} at index {index} along axis {axis} is not normal")]
    NonNormalCellSize { axis: usize, index: i32, value: f64 },
    /// Host padding too thin for the requested operation.
    #[error("host padding along axis {axis} is [{lo}, {hi}], need at least [{need_lo}, {need_hi}]")]
    InsufficientPadding {
        axis: usize,
        lo: usize,
        hi: usize,
        need_lo: usize,
        need_hi: usize,
    },
    /// A host buffer whose length does not match the configured layout.
    #[error("field buffer has {found} elements, layout expects {expected}")]
    FieldLength { expected: usize, found: usize },
    /// Cell counts that are zero or do not fit the index type.
    #[error("invalid domain shape {n:?}: {reason}")]
    InvalidShape { n: [usize; 3], reason: &'static str },
    /// Host layout and domain disagree on the cell counts.
    #[error("host layout counts {layout:?} do not match domain counts {domain:?}")]
    LayoutMismatch { layout: [usize; 3], domain: [usize; 3] },
    /// Process grid does not describe the communicator.
    #[error("not a Cartesian communicator: grid {dims:?} has {grid} ranks, communicator has {comm}")]
    NotCartesian { dims: [usize; 3], grid: usize, comm: usize },
    /// A point-to-point message failed or had the wrong shape.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// Tag space exhausted for the requested exchange.
    #[error("message tag overflow: base {base} + offset {offset}")]
    TagOverflow { base: u16, offset: usize },
    /// A compressed sparse-vector buffer that cannot be decoded.
    #[error("compressed buffer malformed: {0}")]
    Codec(String),
    /// `dilate_labels` called with no dilation saved.
    #[error("no dilation saved; call save_dilation before dilate_labels")]
    DilationNotSaved,
    /// A filter tolerance that is negative or not finite.
    #[error("invalid filter tolerance {0}")]
    InvalidTolerance(f64),
    /// A seed label that cannot be represented.
    #[error("invalid label {label} at cell {cell} of the seed field")]
    InvalidLabel { label: i64, cell: usize },
    /// Checkpoint written by an unknown format version.
    #[error("unknown checkpoint file version {0}")]
    CheckpointVersion(u8),
    /// Checkpoint incompatible with the reading build or domain.
    #[error("checkpoint mismatch: {0}")]
    CheckpointMismatch(String),
    /// Checkpoint contents inconsistent with themselves.
    #[error("checkpoint corrupt: {0}")]
    CheckpointCorrupt(String),
    /// Underlying filesystem failure.
    #[error("I/O error on {path:?}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for LabelError {
    fn from(source: std::io::Error) -> Self {
        LabelError::Io { path: None, source }
    }
}

impl LabelError {
    /// Attach a path to an I/O error; other variants pass through.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            LabelError::Io { source, .. } => LabelError::Io {
                path: Some(path.into()),
                source,
            },
            other => other,
        }
    }
}
