//! Versioned whole-domain checkpoints.
//!
//! Layout, all little-endian:
//!
//! ```text
//! [version:1][flags:1][ni:4][nj:4][nk:4][nn:4]
//! per instance, per non-padded cell in iteration order:
//!     [nnz:8] nnz × ([label:4][value:8])
//! [label checksum:4][value checksum:8]
//! ```
//!
//! The label checksum is the wrapping sum of every label, the value checksum
//! the running sum of every value in file order. Loading validates the whole
//! file before the domain is touched.

pub mod header;

pub use header::{CHECKPOINT_VERSION, CheckpointHeader};

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::domain::LabelDomain;
use crate::label_error::LabelError;
use crate::svector::{Element, Label, SparseLabelVector, Value};

#[derive(Debug, Default)]
struct Checksums {
    labels: u32,
    values: f64,
}

impl Checksums {
    fn push(&mut self, e: Element) {
        self.labels = self.labels.wrapping_add(e.label);
        self.values += e.value;
    }
}

/// Write `domain` to a new file at `path`.
pub fn create<D: LabelDomain>(path: impl AsRef<Path>, domain: &D) -> Result<(), LabelError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| LabelError::from(e).with_path(path))?;
    let mut w = BufWriter::new(file);
    write_to(&mut w, domain).map_err(|e| e.with_path(path))?;
    w.flush().map_err(|e| LabelError::from(e).with_path(path))?;
    log::info!("checkpoint written to {}", path.display());
    Ok(())
}

/// Serialize `domain` into `w`.
pub fn write_to<W: Write, D: LabelDomain>(w: &mut W, domain: &D) -> Result<(), LabelError> {
    let local = domain.local();
    let header = CheckpointHeader::current::<D::Order>(D::DISTRIBUTED);
    w.write_all(&header.to_bytes())?;
    for c in local.counts() {
        w.write_all(&dim_to_i32(c)?.to_le_bytes())?;
    }
    w.write_all(&dim_to_i32(local.nn())?.to_le_bytes())?;

    let mut sums = Checksums::default();
    let mut cells = 0usize;
    for n in 0..local.nn() {
        for s in local.field(n).iter() {
            w.write_all(&(s.nnz() as u64).to_le_bytes())?;
            for &e in s.iter() {
                w.write_all(&e.label.to_le_bytes())?;
                w.write_all(&e.value.to_le_bytes())?;
                sums.push(e);
            }
            cells += 1;
        }
    }
    w.write_all(&sums.labels.to_le_bytes())?;
    w.write_all(&sums.values.to_le_bytes())?;
    log::debug!("checkpoint body: {cells} cells, label checksum {}", sums.labels);
    Ok(())
}

/// Replace the contents of `domain` with the checkpoint at `path`.
pub fn load<D: LabelDomain>(path: impl AsRef<Path>, domain: &mut D) -> Result<(), LabelError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LabelError::from(e).with_path(path))?;
    read_from(&mut BufReader::new(file), domain).map_err(|e| e.with_path(path))?;
    log::info!("checkpoint loaded from {}", path.display());
    Ok(())
}

/// Deserialize from `r` into `domain`. On error the domain is unchanged.
pub fn read_from<R: Read, D: LabelDomain>(r: &mut R, domain: &mut D) -> Result<(), LabelError> {
    let mut hdr = [0u8; 2];
    read_exact(r, &mut hdr, "header")?;
    let expected = CheckpointHeader::current::<D::Order>(D::DISTRIBUTED);
    CheckpointHeader::from_bytes(hdr).check_compatible(&expected)?;

    let local = domain.local();
    let mut dims = [0i32; 4];
    for d in &mut dims {
        *d = read_i32(r)?;
    }
    let want_n = local.counts();
    let got_n = [dims[0], dims[1], dims[2]];
    if got_n.iter().zip(want_n).any(|(&g, w)| g < 0 || g as usize != w) {
        return Err(LabelError::CheckpointMismatch(format!(
            "file shape {got_n:?}, domain shape {want_n:?}"
        )));
    }
    if dims[3] < 0 || dims[3] as usize != local.nn() {
        return Err(LabelError::CheckpointMismatch(format!(
            "file holds {} instances, domain has {}",
            dims[3],
            local.nn()
        )));
    }

    let cells: usize = want_n.iter().product();
    let mut staged: Vec<Vec<SparseLabelVector>> = Vec::with_capacity(local.nn());
    let mut sums = Checksums::default();
    for n in 0..local.nn() {
        let mut inst = Vec::with_capacity(cells);
        for cell in 0..cells {
            inst.push(read_run(r, &mut sums, n, cell)?);
        }
        staged.push(inst);
    }

    let label_sum = read_u32(r)?;
    let mut vbuf = [0u8; 8];
    read_exact(r, &mut vbuf, "value checksum")?;
    let value_sum = f64::from_le_bytes(vbuf);
    if label_sum != sums.labels {
        return Err(LabelError::CheckpointCorrupt(format!(
            "label checksum {label_sum} does not match contents ({})",
            sums.labels
        )));
    }
    if value_sum.to_bits() != sums.values.to_bits() {
        return Err(LabelError::CheckpointCorrupt(format!(
            "value checksum {value_sum} does not match contents ({})",
            sums.values
        )));
    }
    let mut probe = [0u8; 1];
    if r.read(&mut probe)? != 0 {
        return Err(LabelError::CheckpointCorrupt("trailing bytes after checksums".into()));
    }

    let local = domain.local_mut();
    for (n, inst) in staged.into_iter().enumerate() {
        for (slot, s) in local.field_mut(n).iter_mut().zip(inst) {
            *slot = s;
        }
    }
    log::debug!("checkpoint restored {} instances of {cells} cells", local.nn());
    Ok(())
}

fn read_run<R: Read>(
    r: &mut R,
    sums: &mut Checksums,
    instance: usize,
    cell: usize,
) -> Result<SparseLabelVector, LabelError> {
    let mut nbuf = [0u8; 8];
    read_exact(r, &mut nbuf, "element count")?;
    let nnz = u64::from_le_bytes(nbuf);
    // never trust the count for the allocation size
    let mut run: Vec<Element> = Vec::with_capacity(nnz.min(64) as usize);
    for _ in 0..nnz {
        let label: Label = read_u32(r)?;
        let mut vbuf = [0u8; 8];
        read_exact(r, &mut vbuf, "element value")?;
        let e = Element::new(label, Value::from_le_bytes(vbuf));
        if e.is_end() || run.last().is_some_and(|p| p.label >= label) {
            return Err(LabelError::CheckpointCorrupt(format!(
                "instance {instance}, cell {cell}: labels not strictly increasing"
            )));
        }
        sums.push(e);
        run.push(e);
    }
    Ok(SparseLabelVector::from_sorted(run))
}

fn dim_to_i32(v: usize) -> Result<i32, LabelError> {
    i32::try_from(v).map_err(|_| LabelError::CheckpointMismatch(format!("{v} does not fit in i32")))
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> Result<(), LabelError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => LabelError::CheckpointCorrupt(format!("file truncated in {what}")),
        _ => LabelError::from(e),
    })
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32, LabelError> {
    let mut b = [0u8; 4];
    read_exact(r, &mut b, "label")?;
    Ok(u32::from_le_bytes(b))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, LabelError> {
    let mut b = [0u8; 4];
    read_exact(r, &mut b, "shape")?;
    Ok(i32::from_le_bytes(b))
}
