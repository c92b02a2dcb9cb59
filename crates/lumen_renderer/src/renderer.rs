//! Frame driver: progressive, adaptive rendering into a packed buffer.
//!
//! Each frame traces one sample per pixel and folds it into that pixel's
//! running statistics. While the camera stays still the statistics carry
//! over between frames and noisy pixels get extra samples immediately; any
//! camera or resolution change clears them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::Scene;
use lumen_math::Frustum;
use rayon::prelude::*;
use thiserror::Error;

use crate::adaptive::PixelState;
use crate::buffer::{check_dimensions, pack_color, PixelBuffer};
use crate::bvh::Bvh;
use crate::config::RenderConfig;
use crate::integrator::RenderContext;
use crate::sampling::pixel_rng;

/// Errors raised when a frame is requested with an unusable target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("render target is {width}x{height}; both dimensions must be non-zero")]
    EmptyTarget { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Shared flag for abandoning a frame in flight.
///
/// Checked by workers before each row; rows already started finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Re-arm the token for the next frame.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Zero-based index of the frame
    pub frame: u64,
    /// Primary samples traced, adaptive ones included
    pub rays: u64,
    /// Samples added by the adaptive controller
    pub extra_samples: u64,
    /// Consecutive frames rendered from the same camera, this one included
    pub still_frames: u32,
    /// False if the frame was cancelled before every row ran
    pub completed: bool,
    pub elapsed: Duration,
}

/// Per-row tallies, merged across workers.
#[derive(Debug, Clone, Copy, Default)]
struct RowStats {
    rows: u32,
    rays: u64,
    extra_samples: u64,
}

impl RowStats {
    fn merge(self, other: Self) -> Self {
        Self {
            rows: self.rows + other.rows,
            rays: self.rays + other.rays,
            extra_samples: self.extra_samples + other.extra_samples,
        }
    }
}

/// Progressive renderer owning the scene, its BVH and the per-pixel history.
pub struct Renderer {
    scene: Scene,
    bvh: Bvh,
    config: RenderConfig,
    accumulation: Vec<PixelState>,
    width: u32,
    height: u32,
    last_frustum: Option<Frustum>,
    frame: u64,
    still_frames: u32,
}

impl Renderer {
    /// Build the BVH over the scene and set up an empty history.
    pub fn new(scene: Scene, config: RenderConfig) -> Self {
        let start = Instant::now();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        log::info!(
            "Built BVH over {} triangles ({} nodes) in {:.2?}",
            scene.triangle_count(),
            bvh.nodes().len(),
            start.elapsed()
        );

        Self {
            scene,
            bvh,
            config,
            accumulation: Vec::new(),
            width: 0,
            height: 0,
            last_frustum: None,
            frame: 0,
            still_frames: 0,
        }
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Per-pixel history, row-major.
    #[inline]
    pub fn accumulation(&self) -> &[PixelState] {
        &self.accumulation
    }

    #[inline]
    pub fn still_frames(&self) -> u32 {
        self.still_frames
    }

    /// Forget all history; the next frame starts from scratch.
    pub fn reset(&mut self) {
        self.accumulation.iter_mut().for_each(PixelState::reset);
        self.last_frustum = None;
        self.still_frames = 0;
    }

    /// Render one frame into `target`.
    pub fn render_frame(
        &mut self,
        frustum: &Frustum,
        target: &mut PixelBuffer,
    ) -> Result<FrameStats, RenderError> {
        self.render_frame_cancellable(frustum, target, &CancelToken::new())
    }

    /// Render one frame into `target`, stopping early if `cancel` fires.
    pub fn render_frame_cancellable(
        &mut self,
        frustum: &Frustum,
        target: &mut PixelBuffer,
        cancel: &CancelToken,
    ) -> Result<FrameStats, RenderError> {
        let (width, height) = (target.width(), target.height());
        self.render_into(frustum, width, height, target.pixels_mut(), cancel)
    }

    /// Render one frame into host-owned storage of `width * height` pixels.
    pub fn render_into(
        &mut self,
        frustum: &Frustum,
        width: u32,
        height: u32,
        pixels: &mut [u32],
        cancel: &CancelToken,
    ) -> Result<FrameStats, RenderError> {
        check_dimensions(width, height, pixels.len())?;

        let start = Instant::now();
        // Runs to completion before any worker starts, so a new frame never
        // sees stale history.
        let still = self.prepare(frustum, width, height);
        let frame = self.frame;
        self.frame += 1;

        let ctx = RenderContext::new(&self.scene, &self.bvh, &self.config);
        let config = &self.config;
        let row_width = width as usize;

        let render_row = |(y, (row, states)): (usize, (&mut [u32], &mut [PixelState]))| {
            if cancel.is_cancelled() {
                return RowStats::default();
            }

            let mut stats = RowStats {
                rows: 1,
                ..RowStats::default()
            };
            for (x, (pixel, state)) in row.iter_mut().zip(states.iter_mut()).enumerate() {
                let index = (y * row_width + x) as u64;
                let Some(ray) = frustum.primary_ray(x as u32, y as u32, width, height) else {
                    *pixel = pack_color(state.mean());
                    continue;
                };
                let mut rng = pixel_rng(config.seed, frame, index);

                state.add(ctx.radiance(&ray, &mut rng));
                stats.rays += 1;

                if still {
                    let extra = state.extra_samples(config.target_variance, config.sampling_cap);
                    for _ in 0..extra {
                        state.add(ctx.radiance(&ray, &mut rng));
                    }
                    stats.rays += u64::from(extra);
                    stats.extra_samples += u64::from(extra);
                }

                *pixel = pack_color(state.mean());
            }
            stats
        };

        let totals = if config.parallel {
            pixels
                .par_chunks_mut(row_width)
                .zip(self.accumulation.par_chunks_mut(row_width))
                .enumerate()
                .map(render_row)
                .reduce(RowStats::default, RowStats::merge)
        } else {
            pixels
                .chunks_mut(row_width)
                .zip(self.accumulation.chunks_mut(row_width))
                .enumerate()
                .map(render_row)
                .fold(RowStats::default(), RowStats::merge)
        };

        let stats = FrameStats {
            frame,
            rays: totals.rays,
            extra_samples: totals.extra_samples,
            still_frames: self.still_frames,
            completed: totals.rows == height,
            elapsed: start.elapsed(),
        };

        if stats.completed {
            log::info!(
                "Frame {}: {} rays ({} adaptive), still for {} frames, {:.2?}",
                stats.frame,
                stats.rays,
                stats.extra_samples,
                stats.still_frames,
                stats.elapsed
            );
        } else {
            log::debug!(
                "Frame {} cancelled after {}/{} rows",
                stats.frame,
                totals.rows,
                height
            );
        }
        Ok(stats)
    }

    /// Match history to the target size and camera. Returns whether the
    /// camera is unchanged since the previous frame.
    fn prepare(&mut self, frustum: &Frustum, width: u32, height: u32) -> bool {
        let resized = self.width != width || self.height != height;
        if resized {
            log::debug!("Render target resized to {}x{}", width, height);
            self.width = width;
            self.height = height;
            self.accumulation = vec![PixelState::default(); width as usize * height as usize];
        }

        let still = !resized
            && self
                .last_frustum
                .is_some_and(|last| last.same_as(frustum));

        if still {
            self.still_frames += 1;
        } else {
            if !resized {
                self.accumulation.iter_mut().for_each(PixelState::reset);
            }
            self.still_frames = 1;
        }
        self.last_frustum = Some(*frustum);
        still
    }
}
