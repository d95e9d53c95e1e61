//! Communication algorithms: transport façade, wire records, exchanges,
//! reductions and process-grid topology.

pub mod cartesian;
pub mod communicator;
pub mod exchange;
pub mod reduce;
pub mod wire;

pub use cartesian::CartesianGrid;
pub use communicator::{CommTag, Communicator, NoComm, ThreadComm, Wait, wait_any};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use reduce::{ReduceMax, all_reduce_max};
