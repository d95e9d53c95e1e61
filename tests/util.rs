#![allow(dead_code)]
use label_advection::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Up to four distinct labels from `1..10` with values in `[0, 1)`.
pub fn random_vector(rng: &mut SmallRng) -> SparseLabelVector {
    let k = rng.gen_range(0..=4);
    let mut labels: Vec<u32> = rand::seq::index::sample(rng, 9, k)
        .into_iter()
        .map(|l| l as u32 + 1)
        .collect();
    labels.sort_unstable();
    SparseLabelVector::from_sorted(
        labels
            .into_iter()
            .map(|l| Element::new(l, rng.gen_range(0.0..1.0)))
            .collect(),
    )
}

/// Two to four distinct labels with values in `[0.5, 1)`: the sum is at
/// least one and every value positive.
pub fn dense_vector(rng: &mut SmallRng) -> SparseLabelVector {
    let k = rng.gen_range(2..=4);
    let mut labels: Vec<u32> = rand::seq::index::sample(rng, 9, k)
        .into_iter()
        .map(|l| l as u32 + 1)
        .collect();
    labels.sort_unstable();
    SparseLabelVector::from_sorted(
        labels
            .into_iter()
            .map(|l| Element::new(l, rng.gen_range(0.5..1.0)))
            .collect(),
    )
}

/// Every cell of every instance, padding included, gets a random vector.
pub fn fill_random<O: AxisOrder>(d: &mut Domain<O>, rng: &mut SmallRng) {
    fill_with(d, rng, random_vector);
}

/// Like [`fill_random`] with [`dense_vector`]s.
pub fn fill_dense<O: AxisOrder>(d: &mut Domain<O>, rng: &mut SmallRng) {
    fill_with(d, rng, dense_vector);
}

fn fill_with<O: AxisOrder>(
    d: &mut Domain<O>,
    rng: &mut SmallRng,
    make: fn(&mut SmallRng) -> SparseLabelVector,
) {
    let [ni, nj, nk] = d.counts().map(|c| c as i32);
    for n in 0..d.nn() {
        let mut f = d.field_mut(n);
        for i in -1..=ni {
            for j in -1..=nj {
                for k in -1..=nk {
                    *f.at_mut(i, j, k) = make(rng);
                }
            }
        }
    }
}

/// Negated copy of a host buffer.
pub fn negated(v: &[f64]) -> Vec<f64> {
    v.iter().map(|x| -x).collect()
}

/// Uniformly random host buffer.
pub fn random_host(len: usize, lo: f64, hi: f64, rng: &mut SmallRng) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(lo..hi)).collect()
}

/// Volume-weighted total per label over `range` on every axis.
/// `dx[a][t + 1]` is the size of cell `t` along axis `a`.
pub fn weighted_totals<O: AxisOrder>(
    field: PaddedField<'_, SparseLabelVector, O>,
    dx: &[Vec<f64>; 3],
    lo: i32,
    hi: [i32; 3],
) -> BTreeMap<u32, f64> {
    let mut out = BTreeMap::new();
    for i in lo..=hi[0] {
        for j in lo..=hi[1] {
            for k in lo..=hi[2] {
                let w = dx[0][(i + 1) as usize] * dx[1][(j + 1) as usize] * dx[2][(k + 1) as usize];
                for e in field.at(i, j, k).iter() {
                    *out.entry(e.label).or_insert(0.0) += w * e.value;
                }
            }
        }
    }
    out
}

pub fn assert_totals_close(before: &BTreeMap<u32, f64>, after: &BTreeMap<u32, f64>, rel: f64) {
    let scale: f64 = before.values().map(|v| v.abs()).sum::<f64>().max(1.0);
    for (label, &b) in before {
        let a = after.get(label).copied().unwrap_or(0.0);
        assert!(
            (a - b).abs() <= rel * scale,
            "label {label}: before {b}, after {a}"
        );
    }
    for (label, &a) in after {
        assert!(before.contains_key(label) || a.abs() <= rel * scale, "new label {label}");
    }
}
