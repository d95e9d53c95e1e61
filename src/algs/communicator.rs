//! Thin façade over in-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are contiguous byte slices. Handles are non-blocking: `test`
//! polls, `wait` blocks, and every handle must be waited on (or tested to
//! completion) before its payload is trusted.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::label_error::LabelError;

/// Typed message tag. Separate exchanges use separate bases so their
/// messages can never match each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(base: u16) -> Self {
        Self(base)
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn base(self) -> u16 {
        self.0
    }

    /// `base + offset`, or [`LabelError::TagOverflow`] past `u16::MAX`.
    pub fn offset(self, offset: usize) -> Result<CommTag, LabelError> {
        u16::try_from(offset)
            .ok()
            .and_then(|o| self.0.checked_add(o))
            .map(CommTag)
            .ok_or(LabelError::TagOverflow {
                base: self.0,
                offset,
            })
    }
}

/// Non-blocking point-to-point messaging.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Post a send of a copy of `buf`.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of the next message from `peer` with `tag`.
    fn irecv(&self, peer: usize, tag: u16) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Poll for completion without blocking.
    fn test(&mut self) -> bool;
    /// Block until complete and return the received data (sends yield `None`).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Block until one of `pending` completes, remove it and return its key and
/// payload. `None` once nothing is pending.
pub fn wait_any<K, W: Wait>(pending: &mut Vec<(K, W)>) -> Option<(K, Option<Vec<u8>>)> {
    if pending.is_empty() {
        return None;
    }
    loop {
        if let Some(idx) = pending.iter_mut().position(|(_, h)| h.test()) {
            let (key, handle) = pending.swap_remove(idx);
            return Some((key, handle.wait()));
        }
        std::thread::yield_now();
    }
}

/// Compile-time no-op comm for pure serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn test(&mut self) -> bool {
        true
    }
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16) {}
}

// --- ThreadComm: ranks are threads of one process ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug, Default)]
struct Mailbox {
    queues: DashMap<Key, VecDeque<Bytes>>,
    lock: Mutex<()>,
    arrived: Condvar,
}

impl Mailbox {
    fn pop(&self, key: &Key) -> Option<Bytes> {
        self.queues.get_mut(key).and_then(|mut q| q.pop_front())
    }
}

/// In-process communicator. Every rank of a world shares one mailbox of
/// per-`(src, dst, tag)` FIFO queues, so successive rounds arrive in order.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl ThreadComm {
    /// All `size` ranks of a fresh world; move each into its own thread.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

/// Sends to a [`ThreadComm`] peer complete on posting.
#[derive(Debug)]
pub struct ThreadSend;

impl Wait for ThreadSend {
    fn test(&mut self) -> bool {
        true
    }
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

#[derive(Debug)]
pub struct ThreadRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
    data: Option<Bytes>,
}

impl Wait for ThreadRecv {
    fn test(&mut self) -> bool {
        if self.data.is_none() {
            self.data = self.mailbox.pop(&self.key);
        }
        self.data.is_some()
    }

    fn wait(mut self) -> Option<Vec<u8>> {
        if let Some(b) = self.data.take() {
            return Some(b.to_vec());
        }
        let mut guard = self.mailbox.lock.lock();
        loop {
            if let Some(b) = self.mailbox.pop(&self.key) {
                return Some(b.to_vec());
            }
            self.mailbox.arrived.wait(&mut guard);
        }
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ThreadSend;
    type RecvHandle = ThreadRecv;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> ThreadSend {
        let key = (self.rank, peer, tag);
        {
            let _guard = self.mailbox.lock.lock();
            self.mailbox
                .queues
                .entry(key)
                .or_default()
                .push_back(Bytes::copy_from_slice(buf));
        }
        self.mailbox.arrived.notify_all();
        ThreadSend
    }

    fn irecv(&self, peer: usize, tag: u16) -> ThreadRecv {
        ThreadRecv {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            data: None,
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use crate::label_error::LabelError;
    use mpi::environment::Universe;
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;
    use std::sync::Arc;

    /// rsmpi-backed communicator over `MPI_COMM_WORLD`.
    pub struct MpiComm {
        world: Arc<SimpleCommunicator>,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI. Fails if it was already initialized.
        pub fn new() -> Result<Self, LabelError> {
            let universe = mpi::initialize().ok_or_else(|| LabelError::CommError {
                neighbor: 0,
                reason: "MPI already initialized".into(),
            })?;
            let world = Arc::new(universe.world());
            Ok(Self {
                world,
                _universe: universe,
            })
        }
    }

    /// Pending send. The payload is owned by the request until it completes.
    pub struct MpiSend {
        poll: Box<dyn FnMut(bool) -> bool>,
        done: bool,
    }

    impl Wait for MpiSend {
        fn test(&mut self) -> bool {
            if !self.done {
                self.done = (self.poll)(false);
            }
            self.done
        }

        fn wait(mut self) -> Option<Vec<u8>> {
            if !self.done {
                self.done = (self.poll)(true);
            }
            None
        }
    }

    impl Drop for MpiSend {
        fn drop(&mut self) {
            if !self.done {
                self.done = (self.poll)(true);
            }
        }
    }

    /// Pending receive, matched by probing so the length need not be known.
    pub struct MpiRecv {
        world: Arc<SimpleCommunicator>,
        peer: i32,
        tag: i32,
        data: Option<Vec<u8>>,
    }

    impl Wait for MpiRecv {
        fn test(&mut self) -> bool {
            if self.data.is_none() {
                let process = self.world.process_at_rank(self.peer);
                if let Some((msg, _status)) = process.immediate_matched_probe_with_tag(self.tag) {
                    let (data, _status) = msg.matched_receive_vec::<u8>();
                    self.data = Some(data);
                }
            }
            self.data.is_some()
        }

        fn wait(mut self) -> Option<Vec<u8>> {
            if let Some(data) = self.data.take() {
                return Some(data);
            }
            let process = self.world.process_at_rank(self.peer);
            let (msg, _status) = process.matched_probe_with_tag(self.tag);
            let (data, _status) = msg.matched_receive_vec::<u8>();
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSend;
        type RecvHandle = MpiRecv;

        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSend {
            let payload: &'static [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let raw = payload as *const [u8] as *mut [u8];
            let mut request = Some(
                self.world
                    .process_at_rank(peer as i32)
                    .immediate_send_with_tag(StaticScope, payload, i32::from(tag)),
            );
            let poll = move |block: bool| -> bool {
                let Some(req) = request.take() else {
                    return true;
                };
                if block {
                    req.wait();
                } else if let Err(req) = req.test() {
                    request = Some(req);
                    return false;
                }
                // SAFETY: `raw` came from `Box::leak` above and the only
                // borrow of it belonged to the request, now completed.
                unsafe { drop(Box::from_raw(raw)) };
                true
            };
            MpiSend {
                poll: Box::new(poll),
                done: false,
            }
        }

        fn irecv(&self, peer: usize, tag: u16) -> MpiRecv {
            MpiRecv {
                world: Arc::clone(&self.world),
                peer: peer as i32,
                tag: i32::from(tag),
                data: None,
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiRecv, MpiSend};
