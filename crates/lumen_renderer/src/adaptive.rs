//! Per-pixel accumulation and the adaptive sample budget.

use lumen_math::Vec3A;

/// Running radiance statistics of one pixel.
///
/// Kept across frames while the camera is still and cleared whenever it
/// moves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelState {
    pub sum: Vec3A,
    pub sum_squared: Vec3A,
    pub count: u32,
}

impl PixelState {
    /// Fold in one radiance sample.
    #[inline]
    pub fn add(&mut self, sample: Vec3A) {
        self.sum += sample;
        self.sum_squared += sample * sample;
        self.count += 1;
    }

    /// Mean radiance, or black before the first sample.
    #[inline]
    pub fn mean(&self) -> Vec3A {
        if self.count == 0 {
            Vec3A::ZERO
        } else {
            self.sum / self.count as f32
        }
    }

    /// Estimated variance of the pixel mean (sample variance over `n`),
    /// summed over the three channels.
    ///
    /// `None` below two samples, where the estimator is undefined. Each
    /// channel is clamped at zero, since cancellation between the two terms
    /// can leave a tiny negative residue for identical samples.
    pub fn variance(&self) -> Option<f32> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f32;
        let per_channel =
            self.sum_squared / (n * (n - 1.0)) - self.sum * self.sum / ((n - 1.0) * n * n);
        Some(per_channel.max(Vec3A::ZERO).element_sum())
    }

    /// Extra samples this pixel should take right now.
    ///
    /// Pixels without a variance estimate get the full `cap`; otherwise the
    /// budget grows with the square of how far the variance overshoots
    /// `target`.
    pub fn extra_samples(&self, target: f32, cap: u32) -> u32 {
        match self.variance() {
            None => cap,
            Some(variance) if variance > target => {
                let ratio = variance / target;
                (ratio * ratio).min(cap as f32) as u32
            }
            Some(_) => 0,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
