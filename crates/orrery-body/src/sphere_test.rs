use nalgebra::Point3;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::sphere::random_in_sphere;

#[test]
fn test_points_stay_inside_radius() {
    let mut rng = ChaChaRng::seed_from_u64(99);
    let center = Point3::new(-20.0, 35.0, 7.0);

    for _ in 0..500 {
        let p = random_in_sphere(&mut rng, center, 4.0);
        assert!((p - center).norm() <= 4.0 + 1e-12);
    }
}

#[test]
fn test_points_spread_through_the_volume() {
    let mut rng = ChaChaRng::seed_from_u64(7);
    let center = Point3::origin();

    let mut above = 0;
    let mut below = 0;
    for _ in 0..500 {
        let p = random_in_sphere(&mut rng, center, 1.0);
        if p.z > 0.0 {
            above += 1;
        } else {
            below += 1;
        }
    }
    // uniform sampling lands on both sides of every axis
    assert!(above > 100);
    assert!(below > 100);
}

#[test]
fn test_zero_radius_collapses_to_center() {
    let mut rng = ChaChaRng::seed_from_u64(1);
    let center = Point3::new(1.0, 2.0, 3.0);

    let p = random_in_sphere(&mut rng, center, 0.0);
    assert_eq!(p, center);
}
