//! Random streams and direction sampling.

use std::f32::consts::TAU;

use lumen_math::Vec3A;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// SplitMix64 finaliser: a cheap bijective mix of a 64-bit word.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed for one pixel's stream in one frame.
///
/// Distinct `(seed, frame, pixel)` triples give unrelated streams, so a
/// frame renders identically whichever worker picks up each pixel.
#[inline]
pub fn pixel_seed(seed: u64, frame: u64, pixel: u64) -> u64 {
    splitmix64(splitmix64(splitmix64(seed) ^ frame) ^ pixel)
}

/// Random stream owned by a single pixel for a single frame.
pub fn pixel_rng(seed: u64, frame: u64, pixel: u64) -> SmallRng {
    SmallRng::seed_from_u64(pixel_seed(seed, frame, pixel))
}

/// Uniform direction on the unit sphere.
pub fn uniform_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3A {
    let z = 1.0 - 2.0 * rng.gen::<f32>();
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = TAU * rng.gen::<f32>();
    Vec3A::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform direction on the hemisphere around `normal`: a sphere sample
/// mirrored to the normal's side.
pub fn uniform_hemisphere<R: Rng + ?Sized>(normal: Vec3A, rng: &mut R) -> Vec3A {
    let dir = uniform_sphere(rng);
    if dir.dot(normal) < 0.0 {
        -dir
    } else {
        dir
    }
}
