//! Monte Carlo radiance estimation.
//!
//! One call to [`RenderContext::radiance`] returns one sample of the radiance
//! arriving along a ray. Emitters are kept out of the BVH and tested
//! explicitly after the tree query. At diffuse surfaces the estimate combines
//! next-event estimation toward a random light with a uniform hemisphere
//! bounce, both weighted with the combined light/hemisphere PDF.

use std::f32::consts::{FRAC_1_PI, PI};

use lumen_core::{Light, Scene, Triangle};
use lumen_math::{Interval, Ray, Vec3A};
use rand::Rng;

use crate::bvh::Bvh;
use crate::config::RenderConfig;
use crate::sampling::uniform_hemisphere;
use crate::scatter::{reflect, refract};

/// PDF of a uniform hemisphere direction.
const HEMISPHERE_PDF: f32 = 1.0 / (2.0 * PI);

/// What the nearest hit along a ray landed on.
#[derive(Debug, Clone, Copy)]
pub enum Surface<'a> {
    Geometry(&'a Triangle),
    Light(&'a Light),
}

/// Nearest surface along a ray, scene geometry and emitters combined.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit<'a> {
    pub surface: Surface<'a>,
    pub t: f32,
}

/// Outcome of one next-event estimation step.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSample {
    pub radiance: Vec3A,
    /// Solid angle subtended by the sampled light point, when positive
    pub solid_angle: Option<f32>,
}

/// Combined PDF used to weight both sampling strategies.
///
/// Falls back to the hemisphere PDF when no light sample produced a usable
/// solid angle.
#[inline]
pub fn mis_pdf(solid_angle: Option<f32>) -> f32 {
    match solid_angle {
        Some(omega) => 1.0 / omega + HEMISPHERE_PDF,
        None => HEMISPHERE_PDF,
    }
}

/// Read-only state shared by every worker for the duration of a frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub bvh: &'a Bvh,
    pub config: &'a RenderConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(scene: &'a Scene, bvh: &'a Bvh, config: &'a RenderConfig) -> Self {
        Self { scene, bvh, config }
    }

    /// Nearest surface hit past `epsilon`: BVH geometry first, then every
    /// light against the shrunken range.
    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit<'a>> {
        let triangles = self.scene.triangles();
        let mut range = Interval::forward(self.config.epsilon);

        let mut nearest = self.bvh.nearest_hit(triangles, ray, range).map(|hit| {
            range = range.with_max(hit.t);
            SurfaceHit {
                surface: Surface::Geometry(&triangles[hit.triangle as usize]),
                t: hit.t,
            }
        });

        for light in self.scene.lights() {
            if let Some(t) = light.triangle().intersect(ray, range) {
                range = range.with_max(t);
                nearest = Some(SurfaceHit {
                    surface: Surface::Light(light),
                    t,
                });
            }
        }
        nearest
    }

    /// One radiance sample along a primary ray.
    pub fn radiance<R: Rng + ?Sized>(&self, ray: &Ray, rng: &mut R) -> Vec3A {
        self.trace(ray, 0, true, rng)
    }

    /// Recursive estimator. `last_specular` marks primary rays and rays that
    /// left a mirror or glass event; only those see emitters directly.
    fn trace<R: Rng + ?Sized>(
        &self,
        ray: &Ray,
        depth: u32,
        last_specular: bool,
        rng: &mut R,
    ) -> Vec3A {
        if depth > self.config.max_depth {
            return Vec3A::ZERO;
        }

        let Some(hit) = self.intersect(ray) else {
            return Vec3A::ZERO;
        };

        let triangle = match hit.surface {
            Surface::Light(light) => {
                // After a diffuse bounce the light was already counted by
                // next-event estimation.
                return if last_specular {
                    self.scene.emission(light)
                } else {
                    Vec3A::ZERO
                };
            }
            Surface::Geometry(triangle) => triangle,
        };

        let material = self.scene.material(triangle.material);
        let point = ray.at(hit.t);
        let normal = triangle.normal();
        let facing = if normal.dot(ray.direction) > 0.0 {
            -normal
        } else {
            normal
        };
        let epsilon = self.config.epsilon;

        let choice: f32 = rng.gen();
        if choice < material.reflection {
            let direction = reflect(ray.direction, facing);
            return self.trace(&Ray::offset(point, direction, epsilon), depth + 1, true, rng);
        }
        if choice < material.reflection + material.refraction {
            // Total internal reflection falls through to the diffuse branch.
            if let Some(direction) = refract(ray.direction, normal, material.ior) {
                return self.trace(&Ray::offset(point, direction, epsilon), depth + 1, true, rng);
            }
        }

        let brdf = Vec3A::from(material.color) * FRAC_1_PI;
        let direct = self.sample_direct(point, facing, brdf, rng);

        let direction = uniform_hemisphere(facing, rng);
        let incoming = self.trace(&Ray::offset(point, direction, epsilon), depth + 1, false, rng);
        let cosine = direction.dot(facing).max(0.0);
        let indirect = brdf * incoming * (cosine / mis_pdf(direct.solid_angle));

        indirect + direct.radiance
    }

    /// Next-event estimation: sample a point on one uniformly chosen light
    /// and add its contribution if the shadow ray reaches it.
    pub fn sample_direct<R: Rng + ?Sized>(
        &self,
        point: Vec3A,
        normal: Vec3A,
        brdf: Vec3A,
        rng: &mut R,
    ) -> DirectSample {
        if !self.scene.has_lights() {
            return DirectSample::default();
        }
        let lights = self.scene.lights();

        let light = &lights[rng.gen_range(0..lights.len())];
        let sample = light.sample(rng);

        let to_light = sample.point - point;
        let distance = to_light.length();
        let Some(direction) = to_light.try_normalize() else {
            return DirectSample::default();
        };

        let cos_surface = normal.dot(direction);
        let cos_light = sample.normal.dot(-direction);
        let solid_angle = cos_light * sample.area / (distance * distance);
        let solid_angle = (solid_angle > 0.0 && solid_angle.is_finite()).then_some(solid_angle);

        let unlit = DirectSample {
            radiance: Vec3A::ZERO,
            solid_angle,
        };
        let Some(omega) = solid_angle else {
            return unlit;
        };
        if cos_surface <= 0.0 || cos_light <= 0.0 {
            return unlit;
        }

        let epsilon = self.config.epsilon;
        let shadow = Ray::offset(point, direction, epsilon);
        let reach = Interval::new(epsilon, distance - 2.0 * epsilon);
        if self.bvh.occluded(self.scene.triangles(), &shadow, reach) {
            return unlit;
        }

        let radiance = self.scene.emission(light)
            * brdf
            * (cos_surface / mis_pdf(Some(omega)))
            * lights.len() as f32;
        DirectSample {
            radiance,
            solid_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Material;
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Unit-ish floor at y = 0 and a downward-facing light at y = 2.
    fn floor_and_light(blocker: bool) -> Scene {
        let mut builder = Scene::builder();
        let grey = builder.add_material(Material::diffuse(Vec3::splat(0.8)));
        let lamp = builder.add_material(Material::emitter(Vec3::splat(5.0)));
        builder
            .add_triangle(
                Vec3A::new(-5.0, 0.0, -5.0),
                Vec3A::new(-5.0, 0.0, 5.0),
                Vec3A::new(5.0, 0.0, 0.0),
                grey,
            )
            .add_light(
                Vec3A::new(-0.5, 2.0, -0.5),
                Vec3A::new(0.5, 2.0, -0.5),
                Vec3A::new(0.0, 2.0, 0.5),
                lamp,
            );
        if blocker {
            builder.add_triangle(
                Vec3A::new(-3.0, 1.0, -3.0),
                Vec3A::new(3.0, 1.0, -3.0),
                Vec3A::new(0.0, 1.0, 3.0),
                grey,
            );
        }
        builder.build().expect("valid scene")
    }

    #[test]
    fn test_mis_pdf_fallback() {
        assert_eq!(mis_pdf(None), HEMISPHERE_PDF);
        assert!((mis_pdf(Some(0.5)) - (2.0 + HEMISPHERE_PDF)).abs() < 1e-6);
    }

    #[test]
    fn test_intersect_prefers_nearer_light() {
        let scene = floor_and_light(false);
        let config = RenderConfig::default();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);

        let up = Ray::new(Vec3A::new(0.0, 1.0, 0.0), Vec3A::Y);
        let hit = ctx.intersect(&up).expect("light above");
        assert!(matches!(hit.surface, Surface::Light(_)));
        assert!((hit.t - 1.0).abs() < 1e-5);

        let down = Ray::new(Vec3A::new(0.0, 1.0, 0.0), -Vec3A::Y);
        let hit = ctx.intersect(&down).expect("floor below");
        assert!(matches!(hit.surface, Surface::Geometry(_)));
    }

    #[test]
    fn test_direct_light_reaches_unblocked_floor() {
        let scene = floor_and_light(false);
        let config = RenderConfig::default();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);
        let mut rng = StdRng::seed_from_u64(1);

        let brdf = Vec3A::splat(0.8 * FRAC_1_PI);
        let sample = ctx.sample_direct(Vec3A::ZERO, Vec3A::Y, brdf, &mut rng);
        assert!(sample.solid_angle.is_some());
        assert!(sample.radiance.min_element() > 0.0);
    }

    #[test]
    fn test_direct_light_blocked_by_occluder() {
        let scene = floor_and_light(true);
        let config = RenderConfig::default();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..32 {
            let sample = ctx.sample_direct(Vec3A::ZERO, Vec3A::Y, Vec3A::ONE, &mut rng);
            assert_eq!(sample.radiance, Vec3A::ZERO);
            // Still usable for weighting the hemisphere bounce.
            assert!(sample.solid_angle.is_some());
        }
    }

    #[test]
    fn test_surface_facing_away_gets_no_direct_light() {
        let scene = floor_and_light(false);
        let config = RenderConfig::default();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);
        let mut rng = StdRng::seed_from_u64(2);

        let sample = ctx.sample_direct(Vec3A::ZERO, -Vec3A::Y, Vec3A::ONE, &mut rng);
        assert_eq!(sample.radiance, Vec3A::ZERO);
    }

    #[test]
    fn test_no_lights_disables_direct_sampling() {
        let mut builder = Scene::builder();
        let grey = builder.add_material(Material::default());
        builder.add_triangle(
            Vec3A::new(-1.0, 0.0, -1.0),
            Vec3A::new(-1.0, 0.0, 1.0),
            Vec3A::new(1.0, 0.0, 0.0),
            grey,
        );
        let scene = builder.build().expect("valid scene");
        let config = RenderConfig::default();
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);
        let mut rng = StdRng::seed_from_u64(3);

        let sample = ctx.sample_direct(Vec3A::ZERO, Vec3A::Y, Vec3A::ONE, &mut rng);
        assert_eq!(sample.radiance, Vec3A::ZERO);
        assert_eq!(sample.solid_angle, None);

        let ray = Ray::new(Vec3A::new(0.0, 1.0, 0.0), -Vec3A::Y);
        assert_eq!(ctx.radiance(&ray, &mut rng), Vec3A::ZERO);
    }

    #[test]
    fn test_depth_cutoff_returns_black() {
        let scene = floor_and_light(false);
        let config = RenderConfig {
            max_depth: 0,
            ..RenderConfig::default()
        };
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);
        let mut rng = StdRng::seed_from_u64(4);

        assert_eq!(ctx.trace(&Ray::new(Vec3A::ZERO, Vec3A::Y), 1, true, &mut rng), Vec3A::ZERO);
    }
}
