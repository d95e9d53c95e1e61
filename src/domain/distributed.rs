//! `DistributedDomain`: a local [`Domain`] on one rank of a Cartesian process
//! grid, with ghost layers refreshed from the neighbouring ranks.
//!
//! # Ghost exchange
//! `update_ghost(face)` is collective: every rank fills the ghost layer behind
//! `face` from the neighbour there, and sends the edge layer on the opposite
//! side to the neighbour there. Per call:
//!
//! 1. encoded sizes of the outgoing edge layers are computed per instance;
//! 2. the size arrays are swapped in one paired blocking exchange;
//! 3. receives are posted per instance;
//! 4. edge layers are encoded and posted as sends;
//! 5. receives are drained in completion order, each decoded straight into
//!    its ghost layer;
//! 6. sends are drained.
//!
//! Every posted handle is drained before returning, even when an error
//! occurred; the first error is returned.

use crate::algs::cartesian::CartesianGrid;
use crate::algs::communicator::{CommTag, Communicator, Wait, wait_any};
use crate::algs::exchange::sendrecv;
use crate::algs::reduce::{ReduceMax, all_reduce_max};
use crate::algs::wire::{decode_lens, encode_lens};
use crate::domain::compression::{compress, compressed_size, decompress};
use crate::domain::face::Face;
use crate::domain::local::{Domain, LabelDomain};
use crate::field::{AxisOrder, DefaultOrder};
use crate::label_error::LabelError;

/// Ghost traffic: six size slots, then one slot per face and instance.
const GHOST_TAG: CommTag = CommTag::new(0x4C00);
const REDUCE_TAG: CommTag = CommTag::new(0x4B00);

pub struct DistributedDomain<C: Communicator, O: AxisOrder = DefaultOrder> {
    domain: Domain<O>,
    comm: C,
    grid: CartesianGrid,
    neighbors: [Option<usize>; 6],
    root: bool,
}

impl<C: Communicator, O: AxisOrder> DistributedDomain<C, O> {
    /// Local domain of `comm.rank()` on `grid`; the grid must span exactly
    /// `comm.size()` ranks.
    pub fn new(
        ni: usize,
        nj: usize,
        nk: usize,
        nn: usize,
        comm: C,
        grid: CartesianGrid,
    ) -> Result<Self, LabelError> {
        grid.check_size(comm.size())?;
        let domain = Domain::new(ni, nj, nk, nn)?;
        let rank = comm.rank();
        let mut neighbors = [None; 6];
        for axis in 0..3 {
            let (minus, plus) = grid.shift(rank, axis);
            neighbors[2 * axis] = minus;
            neighbors[2 * axis + 1] = plus;
        }
        log::debug!(
            "rank {rank} at {:?} of grid {:?}: neighbours {neighbors:?}",
            grid.coords(rank),
            grid.dims()
        );
        Ok(Self {
            domain,
            comm,
            grid,
            neighbors,
            root: rank == 0,
        })
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn grid(&self) -> &CartesianGrid {
        &self.grid
    }

    /// Rank behind `face`, if any.
    pub fn neighbor(&self, face: Face) -> Option<usize> {
        self.neighbors[face.index()]
    }

    fn data_tag(&self, face: Face, n: usize) -> Result<CommTag, LabelError> {
        GHOST_TAG.offset(Face::ALL.len() + face.index() * self.domain.nn() + n)
    }

    fn exchange(&mut self, recv_face: Face) -> Result<(), LabelError> {
        let send_face = recv_face.opposite();
        let recv_from = self.neighbors[recv_face.index()];
        let send_to = self.neighbors[send_face.index()];
        let nn = self.domain.nn();

        let size_tag = GHOST_TAG.offset(recv_face.index())?;
        let tags = (0..nn)
            .map(|n| self.data_tag(recv_face, n))
            .collect::<Result<Vec<_>, _>>()?;

        // 1) + 2) sizes
        let sizes: Vec<usize> = (0..nn)
            .map(|n| match send_to {
                Some(_) => compressed_size(self.domain.edge(send_face, n)),
                None => 0,
            })
            .collect();
        let incoming = sendrecv(&self.comm, send_to, recv_from, size_tag, &encode_lens(&sizes))?;
        let recv_sizes = match (recv_from, incoming) {
            (Some(peer), Some(buf)) => decode_lens(&buf, nn)
                .map_err(|reason| LabelError::CommError { neighbor: peer, reason })?,
            _ => vec![0; nn],
        };
        log::trace!(
            "ghost {recv_face:?}: sending {sizes:?} to {send_to:?}, expecting {recv_sizes:?} from {recv_from:?}"
        );

        // 3) receives
        let mut pending_recv = Vec::with_capacity(nn);
        if let Some(peer) = recv_from {
            for (n, tag) in tags.iter().enumerate() {
                pending_recv.push(((peer, n), self.comm.irecv(peer, tag.as_u16())));
            }
        }

        // 4) sends
        let mut pending_send = Vec::with_capacity(nn);
        if let Some(peer) = send_to {
            for (n, tag) in tags.iter().enumerate() {
                let buf = compress(self.domain.edge(send_face, n));
                pending_send.push(self.comm.isend(peer, tag.as_u16(), &buf));
            }
        }

        // 5) receives in completion order; keep draining after an error
        let mut maybe_err = None;
        while let Some(((peer, n), data)) = wait_any(&mut pending_recv) {
            if maybe_err.is_some() {
                continue;
            }
            let outcome = match data {
                Some(buf) if buf.len() == recv_sizes[n] => {
                    decompress(&buf, self.domain.ghost_mut(recv_face, n))
                }
                Some(buf) => Err(LabelError::CommError {
                    neighbor: peer,
                    reason: format!(
                        "instance {n}: announced {} bytes, received {}",
                        recv_sizes[n],
                        buf.len()
                    ),
                }),
                None => Err(LabelError::CommError {
                    neighbor: peer,
                    reason: format!("instance {n}: no ghost payload"),
                }),
            };
            if let Err(e) = outcome {
                maybe_err = Some(e);
            }
        }

        // 6) always drain sends
        for s in pending_send {
            let _ = s.wait();
        }

        match maybe_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C: Communicator, O: AxisOrder> LabelDomain for DistributedDomain<C, O> {
    type Order = O;
    const DISTRIBUTED: bool = true;

    fn local(&self) -> &Domain<O> {
        &self.domain
    }

    fn local_mut(&mut self) -> &mut Domain<O> {
        &mut self.domain
    }

    fn has_neighbor(&self, face: Face) -> bool {
        self.neighbors[face.index()].is_some()
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn update_ghost(&mut self, face: Face) -> Result<(), LabelError> {
        self.exchange(face)
    }

    fn reduce_max<T: ReduceMax>(&self, value: T) -> Result<T, LabelError> {
        all_reduce_max(&self.comm, value, REDUCE_TAG)
    }
}
