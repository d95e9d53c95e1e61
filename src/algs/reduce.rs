//! All-process maximum over a [`Communicator`].

use bytemuck::Pod;
use num_traits::Bounded;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::label_error::LabelError;

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for i64 {}
    impl Sealed for u64 {}
    impl Sealed for f64 {}
}

/// Scalars that can be max-reduced across ranks. Encoded in native byte
/// order; ranks of one job are assumed homogeneous.
pub trait ReduceMax: sealed::Sealed + Pod + PartialOrd + Bounded {}

impl ReduceMax for i32 {}
impl ReduceMax for u32 {}
impl ReduceMax for i64 {}
impl ReduceMax for u64 {}
impl ReduceMax for f64 {}

/// Larger of `a` and `b`; a NaN `b` is ignored.
#[inline]
pub fn max_of<T: ReduceMax>(a: T, b: T) -> T {
    if b > a { b } else { a }
}

/// Maximum of a local sequence, `T::min_value()` if empty.
pub fn local_max<T: ReduceMax>(values: impl IntoIterator<Item = T>) -> T {
    values.into_iter().fold(T::min_value(), max_of)
}

fn decode<T: ReduceMax>(peer: usize, data: Option<Vec<u8>>) -> Result<T, LabelError> {
    match data {
        Some(d) if d.len() == std::mem::size_of::<T>() => Ok(bytemuck::pod_read_unaligned(&d)),
        Some(d) => Err(LabelError::CommError {
            neighbor: peer,
            reason: format!("expected {} bytes, got {}", std::mem::size_of::<T>(), d.len()),
        }),
        None => Err(LabelError::CommError {
            neighbor: peer,
            reason: "missing reduction payload".into(),
        }),
    }
}

/// Gather to rank 0, take the maximum, broadcast it back.
pub fn all_reduce_max<C: Communicator, T: ReduceMax>(
    comm: &C,
    value: T,
    tag: CommTag,
) -> Result<T, LabelError> {
    let size = comm.size();
    if size <= 1 {
        return Ok(value);
    }
    if comm.rank() != 0 {
        let recv = comm.irecv(0, tag.as_u16());
        let _ = comm.isend(0, tag.as_u16(), bytemuck::bytes_of(&value)).wait();
        return decode(0, recv.wait());
    }

    let pending: Vec<_> = (1..size).map(|r| (r, comm.irecv(r, tag.as_u16()))).collect();
    let mut acc = value;
    let mut maybe_err = None;
    for (peer, h) in pending {
        match decode::<T>(peer, h.wait()) {
            Ok(v) => acc = max_of(acc, v),
            Err(e) if maybe_err.is_none() => maybe_err = Some(e),
            Err(_) => {}
        }
    }
    // broadcast even on error so no rank is left waiting
    let sends: Vec<_> = (1..size)
        .map(|r| comm.isend(r, tag.as_u16(), bytemuck::bytes_of(&acc)))
        .collect();
    for s in sends {
        let _ = s.wait();
    }
    match maybe_err {
        Some(e) => Err(e),
        None => Ok(acc),
    }
}
