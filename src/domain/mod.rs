//! Label domains: the per-process [`Domain`], its distributed counterpart
//! and the codec used to ship ghost layers between them.

pub mod compression;
pub mod distributed;
pub mod face;
pub mod local;

pub use compression::{compress, compress_into, compressed_size, decompress};
pub use distributed::DistributedDomain;
pub use face::{Axis, Face};
pub use local::{Domain, LabelDomain, LabelField};
