mod util;

use label_advection::domain::{compress, compressed_size, decompress};
use label_advection::prelude::*;

fn round_trip<O: AxisOrder>() {
    let mut rng = util::rng(7);
    let mut d = Domain::<O>::new(5, 4, 3, 1).unwrap();
    util::fill_random(&mut d, &mut rng);

    for face in Face::ALL {
        let bytes = compress(d.edge(face, 0));
        assert_eq!(bytes.len(), compressed_size(d.edge(face, 0)));
        let mut other = Domain::<O>::new(5, 4, 3, 1).unwrap();
        decompress(&bytes, other.ghost_mut(face, 0)).unwrap();
        assert!(other.ghost(face, 0).iter().eq(d.edge(face, 0).iter()));
    }

    let whole = compress(d.field(0));
    let mut copy = Domain::<O>::new(5, 4, 3, 1).unwrap();
    decompress(&whole, copy.field_mut(0)).unwrap();
    assert!(copy.field(0).iter().eq(d.field(0).iter()));
}

#[test]
fn random_fields_round_trip_row_major() {
    round_trip::<RowMajor>();
}

#[test]
fn random_fields_round_trip_column_major() {
    round_trip::<ColumnMajor>();
}

#[test]
fn all_empty_cells_are_sentinels_only() {
    let d = Domain::<RowMajor>::new(2, 3, 4, 1).unwrap();
    let bytes = compress(d.field(0));
    assert_eq!(bytes.len(), 24 * 16);
    assert!(bytes.chunks_exact(16).all(|c| c[..4] == [0xff; 4]));
    let mut e = Domain::<RowMajor>::new(2, 3, 4, 1).unwrap();
    decompress(&bytes, e.field_mut(0)).unwrap();
    assert!(e.field(0).iter().all(SparseLabelVector::is_empty));
}

#[test]
fn dense_cells_round_trip() {
    let mut d = Domain::<RowMajor>::new(2, 2, 2, 1).unwrap();
    let dense = SparseLabelVector::from_sorted((0..200).map(|l| Element::new(l * 3, l as f64 / 7.0)).collect());
    for v in d.field_mut(0).iter_mut() {
        *v = dense.clone();
    }
    let bytes = compress(d.field(0));
    assert_eq!(bytes.len(), 8 * 201 * 16);
    let mut e = Domain::<RowMajor>::new(2, 2, 2, 1).unwrap();
    decompress(&bytes, e.field_mut(0)).unwrap();
    assert!(e.field(0).iter().all(|v| *v == dense));
}

#[test]
fn truncated_buffers_rejected() {
    let mut rng = util::rng(11);
    let mut d = Domain::<RowMajor>::new(3, 3, 3, 1).unwrap();
    util::fill_random(&mut d, &mut rng);
    let bytes = compress(d.field(0));
    let mut e = Domain::<RowMajor>::new(3, 3, 3, 1).unwrap();
    for cut in [1usize, 16, 17, bytes.len() / 2] {
        let err = decompress(&bytes[..bytes.len() - cut], e.field_mut(0)).unwrap_err();
        assert!(matches!(err, LabelError::Codec(_)), "cut {cut}: {err:?}");
    }
}
