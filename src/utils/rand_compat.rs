// Random number generation helpers for rand 0.9

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded generator when a seed is configured, OS-entropy seeded otherwise
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = rng_from_seed(Some(42));
        let mut b = rng_from_seed(Some(42));
        for _ in 0..10 {
            assert_eq!(a.random_range(0..1000), b.random_range(0..1000));
        }
    }

    #[test]
    fn test_unseeded_generator_works() {
        let mut rng = rng_from_seed(None);
        let v: f64 = rng.random();
        assert!((0.0..1.0).contains(&v));
    }
}
