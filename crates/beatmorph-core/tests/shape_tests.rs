use beatmorph_core::shapes::{generate, generate_named, SCATTER_HALF_EXTENT};
use beatmorph_core::{ShapeKind, ShapeLibrary, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn envelope(points: &[Vec3]) -> (Vec3, Vec3, Vec3) {
    let lo = points.iter().fold(Vec3::splat(f32::MAX), |a, p| a.min(*p));
    let hi = points.iter().fold(Vec3::splat(f32::MIN), |a, p| a.max(*p));
    let mean = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    (lo, hi, mean)
}

#[test]
fn test_unknown_shape_has_scatter_envelope() {
    let mut rng_a = StdRng::seed_from_u64(100);
    let mut rng_b = StdRng::seed_from_u64(200);
    let unknown = generate_named("definitely-not-a-shape", 10_000, &mut rng_a);
    let scatter = generate_named("scatter", 10_000, &mut rng_b);

    let (lo_u, hi_u, mean_u) = envelope(&unknown);
    let (lo_s, hi_s, mean_s) = envelope(&scatter);

    for (lo, hi) in [(lo_u, hi_u), (lo_s, hi_s)] {
        assert!(lo.min_element() >= -SCATTER_HALF_EXTENT);
        assert!(hi.max_element() <= SCATTER_HALF_EXTENT);
        assert!(lo.max_element() < -24.0);
        assert!(hi.min_element() > 24.0);
    }
    // Uniform cube is centered
    assert!(mean_u.length() < 1.5);
    assert!(mean_s.length() < 1.5);
}

#[test]
fn test_at_least_twenty_distinct_shapes() {
    let mut rng = StdRng::seed_from_u64(300);
    let library = ShapeLibrary::new(400, &mut rng);
    assert!(ShapeKind::ALL.len() >= 20);

    for (i, a) in ShapeKind::ALL.iter().enumerate() {
        for b in &ShapeKind::ALL[i + 1..] {
            assert_ne!(library.get(*a), library.get(*b), "{} matches {}", a, b);
        }
    }
}

#[test]
fn test_closed_form_shapes_are_deterministic() {
    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(2);
    for shape in [ShapeKind::Knot, ShapeKind::Grid, ShapeKind::Dna] {
        assert_eq!(generate(shape, 300, &mut rng_a), generate(shape, 300, &mut rng_b));
    }
}

#[test]
fn test_knot_stays_on_trefoil() {
    let mut rng = StdRng::seed_from_u64(3);
    let points = generate(ShapeKind::Knot, 720, &mut rng);
    let (lo, hi, _) = envelope(&points);
    // Trefoil (sin t + 2 sin 2t, cos t - 2 cos 2t, -sin 3t) scaled by 4
    assert!(hi.max_element() <= 12.0 + 1e-3);
    assert!(lo.min_element() >= -12.0 - 1e-3);
    assert!((hi.z - 4.0).abs() < 0.1);
}

#[test]
fn test_shape_names_serialize_as_identifiers() {
    for shape in ShapeKind::ALL {
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(json, format!("\"{}\"", shape.name()));
    }
}

#[test]
fn test_shape_names_deserialize_leniently() {
    let known: ShapeKind = serde_json::from_str("\"cube_hollow\"").unwrap();
    assert_eq!(known, ShapeKind::CubeHollow);

    let unknown: ShapeKind = serde_json::from_str("\"hyperplane\"").unwrap();
    assert_eq!(unknown, ShapeKind::Scatter);
}
