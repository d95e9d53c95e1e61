#![cfg_attr(docsrs, feature(doc_cfg))]
//! # label-advection
//!
//! label-advection tracks which disjoint blob of a dispersed phase every cell
//! of a structured 3-D grid belongs to. Each cell carries a sparse vector of
//! `(label, volume fraction)` pairs, and those vectors are transported with
//! the same operator-split upwind scheme a volume-of-fluid solver uses for
//! its own volume fraction. The host solver supplies fluxes, cell sizes and
//! the volume fraction; this crate owns only the label state.
//!
//! ## Features
//! - Sorted sparse label vectors with an in-place fused merge
//! - Padded 3-D field views with the axis order as a type parameter
//!   (`RowMajor` or `ColumnMajor`) and zero-copy slices
//! - Serial and Cartesian-decomposed domains with non-blocking ghost exchange
//!   over a compact wire encoding
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - Versioned, checksummed checkpoints
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! label-advection = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "column-major"]
//! ```
//!
//! ```
//! use label_advection::prelude::*;
//!
//! let layout = HostLayout::new([4, 4, 4], [1; 6]).unwrap();
//! let domain = Domain::<RowMajor>::new(4, 4, 4, 1).unwrap();
//! let mut tracker = LabelTracker::new(domain, layout, SolverConfig::default()).unwrap();
//!
//! let labels = vec![1; layout.len()];
//! let f = vec![0.25; layout.len()];
//! tracker.seed_labels(0, &labels, &f).unwrap();
//! tracker.normalize_labels(&f).unwrap();
//! assert_eq!(tracker.label_at(0, 0, 0, 0), 1);
//! ```
//!
//! ## Determinism
//!
//! No operation depends on message arrival order: ghost layers are decoded
//! into per-instance slots, and reductions are exact maxima.

pub mod algs;
pub mod checkpoint;
pub mod domain;
pub mod field;
pub mod label_error;
pub mod solver;
pub mod svector;
pub mod tracker;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::cartesian::CartesianGrid;
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::domain::{Axis, DistributedDomain, Domain, Face, LabelDomain};
    pub use crate::field::{
        AxisOrder, ColumnMajor, DefaultOrder, FieldShape, OwnedField, PaddedField, PaddedFieldMut,
        RowMajor,
    };
    pub use crate::label_error::LabelError;
    pub use crate::solver::{FractionConvention, Solver, SolverConfig};
    pub use crate::svector::{Element, Label, NormalizedView, SparseLabelVector, Value};
    pub use crate::tracker::{HostLayout, LabelTracker};
}
