use std::f64::consts::FRAC_PI_2;

use approx::assert_abs_diff_eq;
use blobtrack_core::{Calibration, Image, Shape, Spot, SpotFeatureAnalyzer};
use blobtrack_morphology::{
    analyze, BlobMorphology, MorphologyError, MorphologyParams, ShapeLabel, AXIS_PHI, MORPHOLOGY,
    SEMI_AXIS_LENGTH,
};

const N: usize = 40;
const CENTRE: f64 = 20.0;

fn gaussian_volume(sigma: [f64; 3]) -> Image {
    let shape = Shape::volumetric(N, N, N).expect("shape");
    let mut img = Image::zeros(shape);
    for pos in shape.interval().positions() {
        let e: f64 = (0..3)
            .map(|d| (pos[d] as f64 - CENTRE).powi(2) / (2.0 * sigma[d] * sigma[d]))
            .sum();
        img.set(&pos, (100.0 * (-e).exp()) as f32);
    }
    img
}

fn centre_spot(radius: f64) -> Spot {
    Spot::new([CENTRE, CENTRE, CENTRE], radius)
}

#[test]
fn isotropic_gaussian_is_a_sphere() {
    let img = gaussian_volume([2.0, 2.0, 2.0]);
    let (axes, label) = analyze(
        &centre_spot(8.0),
        8.0,
        &img.view(),
        &Calibration::default(),
    )
    .expect("fit");
    assert_eq!(label, ShapeLabel::Sphere);
    let l = axes.lengths();
    assert_abs_diff_eq!(l[0], l[2], epsilon = 1e-6);
}

#[test]
fn elongated_gaussian_is_prolate() {
    let img = gaussian_volume([2.0, 2.0, 4.0]);
    let (axes, label) = analyze(
        &centre_spot(12.0),
        12.0,
        &img.view(),
        &Calibration::default(),
    )
    .expect("fit");
    assert_eq!(label, ShapeLabel::Prolate);
    // the long axis is Z
    let long = axes.largest().expect("three axes");
    assert!(long.elevation < 1e-3 || (std::f64::consts::PI - long.elevation) < 1e-3);
}

#[test]
fn flattened_gaussian_is_oblate() {
    let img = gaussian_volume([2.0, 4.0, 4.0]);
    let (axes, label) = analyze(
        &centre_spot(12.0),
        12.0,
        &img.view(),
        &Calibration::default(),
    )
    .expect("fit");
    assert_eq!(label, ShapeLabel::Oblate);
    // the short axis is X
    let short = axes.smallest().expect("three axes");
    assert_abs_diff_eq!(short.elevation, FRAC_PI_2, epsilon = 1e-3);
    assert_abs_diff_eq!(short.azimuth, 0.0, epsilon = 1e-3);
}

#[test]
fn uniform_ball_recovers_its_radius() {
    let shape = Shape::volumetric(N, N, N).expect("shape");
    let mut img = Image::zeros(shape);
    for pos in shape.interval().positions() {
        let r2: f64 = pos.iter().map(|&p| (p as f64 - CENTRE).powi(2)).sum();
        if r2 <= 100.0 {
            img.set(&pos, 1.0);
        }
    }
    let (axes, label) = analyze(
        &centre_spot(14.0),
        14.0,
        &img.view(),
        &Calibration::default(),
    )
    .expect("fit");
    assert_eq!(label, ShapeLabel::Sphere);
    for l in axes.lengths() {
        assert_abs_diff_eq!(l, 10.0, epsilon = 0.3);
    }
}

#[test]
fn planar_ellipse_orientation_is_recovered() {
    let (a, b) = (10.0, 5.0);
    let phi = 30f64.to_radians();
    let (s, c) = phi.sin_cos();
    let shape = Shape::planar(64, 64).expect("shape");
    let mut img = Image::zeros(shape);
    for pos in shape.interval().positions() {
        let (x, y) = (pos[0] as f64 - 32.0, pos[1] as f64 - 32.0);
        let u = c * x + s * y;
        let v = -s * x + c * y;
        if (u / a).powi(2) + (v / b).powi(2) <= 1.0 {
            img.set(&pos, 1.0);
        }
    }

    let analyzer = BlobMorphology::new(
        img.view(),
        Calibration::default(),
        &MorphologyParams::default(),
    )
    .expect("analyzer");
    let mut spot = Spot::new([32.0, 32.0, 0.0], 12.0);
    analyzer.process(&mut spot).expect("process");

    // planar fits fill C (minor) and B (major); A stays 0
    let major = spot.feature(SEMI_AXIS_LENGTH[1]).expect("major");
    let minor = spot.feature(SEMI_AXIS_LENGTH[0]).expect("minor");
    assert_abs_diff_eq!(major, a, epsilon = 0.3);
    assert_abs_diff_eq!(minor, b, epsilon = 0.3);
    assert_eq!(spot.feature(SEMI_AXIS_LENGTH[2]), Some(0.0));
    assert_abs_diff_eq!(spot.feature(AXIS_PHI[1]).expect("phi"), phi, epsilon = 0.02);
    assert_abs_diff_eq!(
        spot.feature(AXIS_PHI[0]).expect("phi"),
        phi - FRAC_PI_2,
        epsilon = 0.02
    );
    assert_eq!(
        spot.feature(MORPHOLOGY),
        Some(ShapeLabel::Prolate.code() as f64)
    );
}

#[test]
fn azimuths_stay_in_half_open_range() {
    for deg in [-90.0f64, -60.0, -1.0, 0.0, 45.0, 89.0, 90.0, 135.0] {
        let phi = deg.to_radians();
        let (s, c) = phi.sin_cos();
        let shape = Shape::planar(48, 48).expect("shape");
        let mut img = Image::zeros(shape);
        for pos in shape.interval().positions() {
            let (x, y) = (pos[0] as f64 - 24.0, pos[1] as f64 - 24.0);
            let u = c * x + s * y;
            let v = -s * x + c * y;
            if (u / 9.0).powi(2) + (v / 3.0).powi(2) <= 1.0 {
                img.set(&pos, 1.0);
            }
        }
        let analyzer = BlobMorphology::new(
            img.view(),
            Calibration::default(),
            &MorphologyParams::default(),
        )
        .expect("analyzer");
        let m = analyzer
            .analyze(&Spot::new([24.0, 24.0, 0.0], 11.0))
            .expect("fit");
        let lengths = m.axes.lengths();
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
        for axis in m.axes.axes() {
            assert!(
                axis.azimuth > -FRAC_PI_2 && axis.azimuth <= FRAC_PI_2,
                "{deg}: {}",
                axis.azimuth
            );
        }
    }
}

#[test]
fn anisotropic_calibration_measures_physical_lengths() {
    // isotropic ball of radius 6 units sampled at 0.5 x 0.5 x 1.0
    let shape = Shape::volumetric(40, 40, 20).expect("shape");
    let cal = Calibration::new(&[0.5, 0.5, 1.0]).expect("calibration");
    let mut img = Image::zeros(shape);
    for pos in shape.interval().positions() {
        let r2 = (pos[0] as f64 * 0.5 - 10.0).powi(2)
            + (pos[1] as f64 * 0.5 - 10.0).powi(2)
            + (pos[2] as f64 - 10.0).powi(2);
        if r2 <= 36.0 {
            img.set(&pos, 1.0);
        }
    }
    let (axes, label) = analyze(
        &Spot::new([10.0, 10.0, 10.0], 8.0),
        8.0,
        &img.view(),
        &cal,
    )
    .expect("fit");
    assert_eq!(label, ShapeLabel::Sphere);
    for l in axes.lengths() {
        assert_abs_diff_eq!(l, 6.0, epsilon = 0.3);
    }
}

#[test]
fn empty_region_reports_degenerate_input() {
    let img = Image::zeros(Shape::volumetric(10, 10, 10).expect("shape"));
    let err = analyze(
        &Spot::new([5.0, 5.0, 5.0], 3.0),
        3.0,
        &img.view(),
        &Calibration::default(),
    )
    .expect_err("no mass");
    assert_eq!(err, MorphologyError::DegenerateInput { total_mass: 0.0 });
}
