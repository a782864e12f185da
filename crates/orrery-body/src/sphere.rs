//! Uniform sampling inside a sphere

use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand_chacha::ChaChaRng;

/// Sample a point uniformly within a sphere
///
/// Rejection-samples the unit cube until the point falls inside the unit
/// ball, then scales and translates. Used to place fragments around a
/// shattering body and to seed scenario clumps.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `center` - Center of the sphere
/// * `radius` - Radius of the sphere
///
/// # Examples
///
/// ```
/// use nalgebra::Point3;
/// use rand::SeedableRng;
/// use rand_chacha::ChaChaRng;
/// use orrery_body::random_in_sphere;
///
/// let mut rng = ChaChaRng::seed_from_u64(7);
/// let p = random_in_sphere(&mut rng, Point3::new(10.0, 0.0, 0.0), 2.0);
/// assert!((p - Point3::new(10.0, 0.0, 0.0)).norm() <= 2.0);
/// ```
pub fn random_in_sphere(rng: &mut ChaChaRng, center: Point3<f64>, radius: f64) -> Point3<f64> {
    loop {
        let x = rng.random::<f64>() * 2.0 - 1.0;
        let y = rng.random::<f64>() * 2.0 - 1.0;
        let z = rng.random::<f64>() * 2.0 - 1.0;
        if x * x + y * y + z * z <= 1.0 {
            return center + Vector3::new(x, y, z) * radius;
        }
    }
}
