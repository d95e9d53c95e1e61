//! Fixed little-endian wire records for ghost exchange and checkpoints.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

use crate::svector::{Element, Label};

/// One sparse-vector element on the wire: label, four zero bytes, value.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireElement {
    label_le: u32,
    reserved: u32,
    value_le: u64,
}

/// Element count of one run.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireLen(u64);

const_assert_eq!(size_of::<WireElement>(), 16);
const_assert_eq!(size_of::<WireLen>(), 8);

/// Bytes per [`WireElement`].
pub const WIRE_ELEMENT_SIZE: usize = size_of::<WireElement>();

impl WireElement {
    #[inline]
    pub fn new(e: Element) -> Self {
        Self {
            label_le: e.label.to_le(),
            reserved: 0,
            value_le: e.value.to_bits().to_le(),
        }
    }

    #[inline]
    pub fn label(&self) -> Label {
        u32::from_le(self.label_le)
    }

    #[inline]
    pub fn element(&self) -> Element {
        Element::new(self.label(), f64::from_bits(u64::from_le(self.value_le)))
    }
}

impl WireLen {
    #[inline]
    pub fn new(n: usize) -> Self {
        Self((n as u64).to_le())
    }

    #[inline]
    pub fn get(self) -> u64 {
        u64::from_le(self.0)
    }
}

/// Encode a run of lengths.
pub fn encode_lens(lens: &[usize]) -> Vec<u8> {
    let wire: Vec<WireLen> = lens.iter().map(|&n| WireLen::new(n)).collect();
    bytemuck::cast_slice(&wire).to_vec()
}

/// Decode exactly `count` lengths from a buffer of unknown alignment.
pub fn decode_lens(buf: &[u8], count: usize) -> Result<Vec<usize>, String> {
    expect_exact_len(buf.len(), count * size_of::<WireLen>())?;
    buf.chunks_exact(size_of::<WireLen>())
        .map(|c| {
            let n = bytemuck::pod_read_unaligned::<WireLen>(c).get();
            usize::try_from(n).map_err(|_| format!("length {n} exceeds usize"))
        })
        .collect()
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svector::END_ELEMENT;

    #[test]
    fn element_layout_is_little_endian() {
        let w = WireElement::new(Element::new(0x0102_0304, 1.0));
        let bytes = bytemuck::bytes_of(&w);
        assert_eq!(&bytes[..4], &[4, 3, 2, 1]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..], &1.0f64.to_le_bytes());
        assert!(WireElement::new(END_ELEMENT).element().is_end());
    }

    #[test]
    fn lens_reject_wrong_length() {
        let buf = encode_lens(&[3, 0, 7]);
        assert_eq!(decode_lens(&buf, 3).unwrap(), vec![3, 0, 7]);
        assert!(decode_lens(&buf[1..], 3).is_err());
        assert!(decode_lens(&buf, 2).is_err());
    }
}
