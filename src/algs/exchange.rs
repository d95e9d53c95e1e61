//! Paired blocking exchange between a send neighbour and a receive neighbour.
//!
//! Every posted handle is drained before returning, even on error.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::label_error::LabelError;

/// Send `buf` to `send_to` and receive one message from `recv_from`.
///
/// Either side may be absent; the receive yields `None` when `recv_from` is.
pub fn sendrecv<C: Communicator>(
    comm: &C,
    send_to: Option<usize>,
    recv_from: Option<usize>,
    tag: CommTag,
    buf: &[u8],
) -> Result<Option<Vec<u8>>, LabelError> {
    // post the receive first so a self-send cannot block
    let recv = recv_from.map(|peer| (peer, comm.irecv(peer, tag.as_u16())));
    let send = send_to.map(|peer| comm.isend(peer, tag.as_u16(), buf));

    let result = match recv {
        Some((peer, h)) => match h.wait() {
            Some(data) => Ok(Some(data)),
            None => Err(LabelError::CommError {
                neighbor: peer,
                reason: format!("no message with tag {} from rank {peer}", tag.as_u16()),
            }),
        },
        None => Ok(None),
    };

    if let Some(s) = send {
        let _ = s.wait();
    }
    result
}
