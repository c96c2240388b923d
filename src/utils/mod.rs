pub mod rand_compat;

pub use rand_compat::rng_from_seed;
