//! Repeated three-direction sweeps on a serial domain conserve the
//! volume-weighted total of every label over the padded box.
//!
//! Sweeps alternate between a flux field and its negation so that cell totals
//! stay away from zero and every value stays positive.

mod util;

use label_advection::prelude::*;

const N: [usize; 3] = [6, 5, 4];

fn run<O: AxisOrder>(seed: u64) {
    let mut rng = util::rng(seed);
    let layout = HostLayout::new(N, [2, 1, 1, 1, 1, 2]).unwrap();
    let mut domain = Domain::<O>::new(N[0], N[1], N[2], 2).unwrap();
    util::fill_dense(&mut domain, &mut rng);

    // host cell-size rows along each axis, with the host's own padding
    let rows: Vec<Vec<f64>> = (0..3)
        .map(|a| util::random_host(N[a] + layout.pad[2 * a] + layout.pad[2 * a + 1], 0.5, 1.5, &mut rng))
        .collect();
    // the same sizes seen from the domain's single padding layer
    let dx: [Vec<f64>; 3] = std::array::from_fn(|a| {
        let lo = layout.pad[2 * a] - 1;
        rows[a][lo..lo + N[a] + 2].to_vec()
    });
    let fluxes: Vec<Vec<f64>> = (0..3)
        .map(|_| util::random_host(layout.len(), -0.05, 0.05, &mut rng))
        .collect();
    let reversed: Vec<Vec<f64>> = fluxes.iter().map(|f| util::negated(f)).collect();

    let hi = N.map(|c| c as i32);
    let before: Vec<_> = (0..2)
        .map(|n| util::weighted_totals(domain.field(n), &dx, -1, hi))
        .collect();

    let mut tracker = LabelTracker::new(domain, layout, SolverConfig::default()).unwrap();
    for sweep in 0..100 {
        let flux = if sweep % 2 == 0 { &fluxes } else { &reversed };
        for dir in 0..3 {
            tracker
                .advect_labels(dir as i64, &flux[dir], &rows[dir])
                .unwrap();
        }
    }

    let domain = tracker.into_domain();
    for n in 0..2 {
        let after = util::weighted_totals(domain.field(n), &dx, -1, hi);
        util::assert_totals_close(&before[n], &after, 1e-13);
    }
}

#[test]
fn closed_box_conserves_row_major() {
    run::<RowMajor>(17);
}

#[test]
fn closed_box_conserves_column_major() {
    run::<ColumnMajor>(18);
}

#[test]
fn zero_flux_changes_nothing() {
    let mut rng = util::rng(3);
    let layout = HostLayout::new([3, 3, 3], [1; 6]).unwrap();
    let mut domain = Domain::<RowMajor>::new(3, 3, 3, 1).unwrap();
    util::fill_random(&mut domain, &mut rng);
    let snapshot = domain.clone();
    let mut tracker = LabelTracker::new(domain, layout, SolverConfig::default()).unwrap();
    let zero = vec![0.0; layout.len()];
    let ones = vec![1.0; 5];
    for dir in 0..3 {
        tracker.advect_labels(dir, &zero, &ones).unwrap();
    }
    let domain = tracker.into_domain();
    assert!(domain.field(0).iter().eq(snapshot.field(0).iter()));
}
