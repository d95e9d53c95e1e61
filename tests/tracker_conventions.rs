mod util;

use label_advection::prelude::*;
use rand::Rng;

fn tracker(convention: FractionConvention) -> LabelTracker<Domain<RowMajor>> {
    let layout = HostLayout::new([4, 3, 2], [1, 2, 0, 1, 1, 1]).unwrap();
    let domain = Domain::<RowMajor>::new(4, 3, 2, 1).unwrap();
    LabelTracker::new(domain, layout, SolverConfig::with_convention(convention)).unwrap()
}

fn fraction_for(convention: FractionConvention, target: f64) -> f64 {
    match convention {
        FractionConvention::Void => 1.0 - target,
        FractionConvention::Phase => target,
    }
}

fn check_convention(convention: FractionConvention) {
    let mut t = tracker(convention);
    let len = t.layout().len();
    let mut rng = util::rng(5);
    let labels: Vec<i32> = (0..len).map(|_| rng.gen_range(1..50)).collect();
    let f = util::random_host(len, 0.05, 0.95, &mut rng);
    t.seed_labels(0, &labels, &f).unwrap();

    let shape = t.layout().shape().unwrap();
    let fv = PaddedField::<f64, RowMajor>::new(&f, shape).unwrap();
    for (s, &fr) in t.domain().field(0).iter().zip(fv.iter()) {
        assert_eq!(s.nnz(), 1);
        assert_eq!(s.sum(), convention.target(fr));
    }

    let g = util::random_host(len, 0.05, 0.95, &mut rng);
    t.normalize_labels(&g).unwrap();
    let gv = PaddedField::<f64, RowMajor>::new(&g, shape).unwrap();
    for (s, &gr) in t.domain().field(0).iter().zip(gv.iter()) {
        assert!((s.sum() - convention.target(gr)).abs() < 1e-14);
    }

    let tol = 1e-3;
    let targets = [1e-4, 1.0 - 1e-4, 0.5];
    let snapped: Vec<f64> = (0..len)
        .map(|i| fraction_for(convention, targets[i % 3]))
        .collect();
    t.filter_labels(tol, &snapped).unwrap();
    let sv = PaddedField::<f64, RowMajor>::new(&snapped, shape).unwrap();
    for ((s, &fr), &gr) in t.domain().field(0).iter().zip(sv.iter()).zip(gv.iter()) {
        let target = convention.target(fr);
        if target > 1.0 - tol {
            assert!((s.sum() - 1.0).abs() < 1e-12);
        } else if target < tol {
            assert!(s.is_empty());
        } else {
            assert!((s.sum() - convention.target(gr)).abs() < 1e-14);
        }
    }
}

#[test]
fn void_convention_is_consistent() {
    check_convention(FractionConvention::Void);
}

#[test]
fn phase_convention_is_consistent() {
    check_convention(FractionConvention::Phase);
}

#[test]
fn nan_is_detected() {
    let mut t = tracker(FractionConvention::Void);
    let len = t.layout().len();
    let f = vec![0.5; len];
    t.seed_labels(0, &vec![1; len], &f).unwrap();
    assert!(!t.contains_nan().unwrap());
    *t.domain_mut().field_mut(0).at_mut(1, 1, 1) =
        SparseLabelVector::from_sorted(vec![Element::new(2, f64::NAN)]);
    assert!(t.contains_nan().unwrap());
}

#[test]
fn host_buffers_are_length_checked() {
    let mut t = tracker(FractionConvention::Void);
    let len = t.layout().len();
    assert!(matches!(
        t.normalize_labels(&vec![0.0; len - 1]),
        Err(LabelError::FieldLength { .. })
    ));
    assert!(matches!(
        t.advect_labels(1, &vec![0.0; len], &[1.0; 3]),
        Err(LabelError::FieldLength { .. })
    ));
    assert!(matches!(
        t.advect_labels(5, &vec![0.0; len], &[1.0; 3]),
        Err(LabelError::InvalidDirection(5))
    ));
}

#[test]
fn checkpoint_restores_max_labels() {
    let dir = std::env::temp_dir().join(format!("label-advection-tracker-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tracker.bin");

    let mut t = tracker(FractionConvention::Void);
    let len = t.layout().len();
    let labels: Vec<i32> = (0..len as i32).map(|l| l % 17).collect();
    t.seed_labels(0, &labels, &vec![0.0; len]).unwrap();
    t.create_checkpoint(&path).unwrap();

    let mut u = tracker(FractionConvention::Void);
    assert_eq!(u.max_label(0), 0);
    u.load_checkpoint(&path).unwrap();
    assert_eq!(u.max_label(0), t.max_label(0));
    assert_eq!(u.label_at(3, 2, 1, 0), t.label_at(3, 2, 1, 0));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn dilation_adds_saved_fraction() {
    let mut t = tracker(FractionConvention::Void);
    let len = t.layout().len();
    let labels: Vec<i32> = (0..len as i32).map(|l| 1 + l % 5).collect();
    t.seed_labels(0, &labels, &vec![0.5; len]).unwrap();

    assert!(matches!(
        t.dilate_labels(&vec![2.0; len]),
        Err(LabelError::DilationNotSaved)
    ));

    let c: Vec<f64> = (0..len).map(|i| if i % 2 == 0 { 0.75 } else { 1.0 }).collect();
    t.save_dilation(&c).unwrap();
    t.dilate_labels(&vec![2.0; len]).unwrap();

    let shape = t.layout().shape().unwrap();
    let cv = PaddedField::<f64, RowMajor>::new(&c, shape).unwrap();
    for (s, &cr) in t.domain().field(0).iter().zip(cv.iter()) {
        let want = if cr == 1.0 { 0.5 } else { 1.0 };
        assert!((s.sum() - want).abs() < 1e-15);
        assert_eq!(s.nnz(), 1);
    }

    t.clear_dilation();
    assert!(matches!(
        t.dilate_labels(&vec![2.0; len]),
        Err(LabelError::DilationNotSaved)
    ));
}
