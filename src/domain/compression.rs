//! Byte codec for slices of sparse label vectors.
//!
//! Each cell is written as its elements followed by one sentinel, all as
//! 16-byte [`WireElement`]s, in the slice's iteration order. Decoding reads
//! every cell up to its sentinel and rejects anything malformed.

use crate::algs::wire::{WIRE_ELEMENT_SIZE, WireElement};
use crate::field::{AxisOrder, PaddedField, PaddedFieldMut};
use crate::label_error::LabelError;
use crate::svector::{END_ELEMENT, Element, SparseLabelVector};

/// Exact encoded size of `cells` in bytes.
pub fn compressed_size<O: AxisOrder>(cells: PaddedField<'_, SparseLabelVector, O>) -> usize {
    cells.iter().map(|s| (s.nnz() + 1) * WIRE_ELEMENT_SIZE).sum()
}

/// Encode `cells` into a fresh buffer.
pub fn compress<O: AxisOrder>(cells: PaddedField<'_, SparseLabelVector, O>) -> Vec<u8> {
    let mut out = Vec::with_capacity(compressed_size(cells));
    for s in cells.iter() {
        for &e in s.iter() {
            out.extend_from_slice(bytemuck::bytes_of(&WireElement::new(e)));
        }
        out.extend_from_slice(bytemuck::bytes_of(&WireElement::new(END_ELEMENT)));
    }
    out
}

/// Encode `cells` into `out`, returning the number of bytes written.
pub fn compress_into<O: AxisOrder>(
    out: &mut [u8],
    cells: PaddedField<'_, SparseLabelVector, O>,
) -> Result<usize, LabelError> {
    let need = compressed_size(cells);
    if out.len() < need {
        return Err(LabelError::Codec(format!(
            "output buffer holds {} bytes, need {need}",
            out.len()
        )));
    }
    let terminated = cells
        .iter()
        .flat_map(|s| s.iter().copied().chain(std::iter::once(END_ELEMENT)));
    for (chunk, e) in out.chunks_exact_mut(WIRE_ELEMENT_SIZE).zip(terminated) {
        chunk.copy_from_slice(bytemuck::bytes_of(&WireElement::new(e)));
    }
    Ok(need)
}

/// Decode `buf` into `cells`, replacing every cell.
pub fn decompress<O: AxisOrder>(
    buf: &[u8],
    mut cells: PaddedFieldMut<'_, SparseLabelVector, O>,
) -> Result<(), LabelError> {
    if buf.len() % WIRE_ELEMENT_SIZE != 0 {
        return Err(LabelError::Codec(format!(
            "length {} is not a multiple of {WIRE_ELEMENT_SIZE}",
            buf.len()
        )));
    }
    let mut wire = buf
        .chunks_exact(WIRE_ELEMENT_SIZE)
        .map(|c| bytemuck::pod_read_unaligned::<WireElement>(c).element());

    // Runs are staged and only committed once the whole buffer decoded.
    let mut staged: Vec<Element> = Vec::with_capacity(buf.len() / WIRE_ELEMENT_SIZE);
    let mut ends: Vec<usize> = Vec::with_capacity(cells.size());
    for cell_idx in 0..cells.size() {
        let start = staged.len();
        loop {
            let Some(e) = wire.next() else {
                return Err(LabelError::Codec(format!(
                    "buffer ends inside cell {cell_idx}"
                )));
            };
            if e.is_end() {
                break;
            }
            if staged.len() > start && staged[staged.len() - 1].label >= e.label {
                return Err(LabelError::Codec(format!(
                    "labels not strictly increasing in cell {cell_idx}"
                )));
            }
            staged.push(e);
        }
        ends.push(staged.len());
    }
    let trailing = wire.count();
    if trailing > 0 {
        return Err(LabelError::Codec(format!(
            "{} trailing bytes after last cell",
            trailing * WIRE_ELEMENT_SIZE
        )));
    }

    let mut start = 0;
    for (cell, &end) in cells.iter_mut().zip(&ends) {
        cell.assign_sorted(staged[start..end].iter().copied());
        start = end;
    }
    Ok(())
}
