//! Integrator and frame driver behaviour on small scenes.

use lumen_renderer::sampling::pixel_rng;
use lumen_renderer::{
    Bvh, Frustum, Material, PixelBuffer, Ray, RenderConfig, RenderContext, Renderer, Scene,
    SceneBuilder, Vec3, Vec3A,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Open box (floor, back wall, two side walls) under a ceiling light, with a
/// prism of `material` in the middle.
fn box_scene(material: Material) -> Scene {
    let mut builder = Scene::builder();
    let white = builder.add_material(Material::diffuse(Vec3::splat(0.75)));
    let red = builder.add_material(Material::diffuse(Vec3::new(0.75, 0.1, 0.1)));
    let subject = builder.add_material(material);
    let lamp = builder.add_material(Material::emitter(Vec3::splat(10.0)));

    let quad = |builder: &mut SceneBuilder, [a, b, c, d]: [Vec3A; 4], m: u32| {
        builder.add_triangle(a, b, c, m).add_triangle(a, c, d, m);
    };

    let v = Vec3A::new;
    // Floor, back wall, left and right walls
    let floor = [v(-2.0, 0.0, -2.0), v(-2.0, 0.0, 2.0), v(2.0, 0.0, 2.0), v(2.0, 0.0, -2.0)];
    let back = [v(-2.0, 0.0, -2.0), v(2.0, 0.0, -2.0), v(2.0, 4.0, -2.0), v(-2.0, 4.0, -2.0)];
    let left = [v(-2.0, 0.0, -2.0), v(-2.0, 4.0, -2.0), v(-2.0, 4.0, 2.0), v(-2.0, 0.0, 2.0)];
    let right = [v(2.0, 0.0, -2.0), v(2.0, 0.0, 2.0), v(2.0, 4.0, 2.0), v(2.0, 4.0, -2.0)];
    quad(&mut builder, floor, white);
    quad(&mut builder, back, white);
    quad(&mut builder, left, red);
    quad(&mut builder, right, white);

    // Prism in the middle
    let (p0, p1, p2, top) = (
        Vec3A::new(-0.6, 0.0, -0.4),
        Vec3A::new(0.6, 0.0, -0.4),
        Vec3A::new(0.0, 0.0, 0.6),
        Vec3A::new(0.0, 1.5, 0.0),
    );
    builder
        .add_triangle(p0, p1, top, subject)
        .add_triangle(p1, p2, top, subject)
        .add_triangle(p2, p0, top, subject);

    // Ceiling light facing down
    builder.add_light(
        Vec3A::new(-0.5, 3.9, -0.5),
        Vec3A::new(0.5, 3.9, -0.5),
        Vec3A::new(0.0, 3.9, 0.5),
        lamp,
    );

    builder.build().expect("valid scene")
}

fn camera() -> Frustum {
    Frustum::look_at(Vec3::new(0.0, 2.0, 6.0), Vec3::new(0.0, 1.5, 0.0), Vec3::Y, 50.0, 1.0)
}

#[test]
fn test_radiance_never_negative_for_any_material() {
    init_logging();
    let materials = [
        Material::diffuse(Vec3::splat(0.9)),
        Material::mirror(Vec3::ONE, 1.0),
        Material::glass(Vec3::ONE, 1.0, 1.5),
        Material {
            color: Vec3::new(0.3, 0.6, 0.9),
            reflection: 0.3,
            refraction: 0.3,
            ior: 1.33,
        },
        Material::emitter(Vec3::splat(3.0)),
    ];

    let frustum = camera();
    for material in materials {
        let scene = box_scene(material);
        let config = RenderConfig {
            max_depth: 5,
            ..RenderConfig::default()
        };
        let bvh = Bvh::build(scene.triangles(), &config.bvh);
        let ctx = RenderContext::new(&scene, &bvh, &config);

        for y in (0..32).step_by(3) {
            for x in (0..32).step_by(3) {
                let ray = frustum.primary_ray(x, y, 32, 32).expect("valid direction");
                let mut rng = pixel_rng(7, 0, u64::from(y * 32 + x));
                for _ in 0..8 {
                    let radiance = ctx.radiance(&ray, &mut rng);
                    assert!(radiance.is_finite(), "{:?}", radiance);
                    assert!(radiance.min_element() >= 0.0, "{:?}", radiance);
                }
            }
        }
    }
}

#[test]
fn test_primary_ray_at_light_returns_emission() {
    init_logging();
    let scene = box_scene(Material::default());
    let config = RenderConfig::default();
    let bvh = Bvh::build(scene.triangles(), &config.bvh);
    let ctx = RenderContext::new(&scene, &bvh, &config);
    let mut rng = pixel_rng(0, 0, 0);

    // Straight up from the floor, beside the prism, into the light.
    let ray = Ray::new(Vec3A::new(0.0, 2.0, 0.0), Vec3A::Y);
    assert_eq!(ctx.radiance(&ray, &mut rng), Vec3A::splat(10.0));
}

#[test]
fn test_mirror_shows_light_through_specular_bounce() {
    init_logging();
    let mut builder = Scene::builder();
    let mirror = builder.add_material(Material::mirror(Vec3::ONE, 1.0));
    let lamp = builder.add_material(Material::emitter(Vec3::splat(2.0)));
    builder
        .add_triangle(
            Vec3A::new(-5.0, 0.0, -5.0),
            Vec3A::new(-5.0, 0.0, 5.0),
            Vec3A::new(5.0, 0.0, 0.0),
            mirror,
        )
        .add_light(
            Vec3A::new(-1.0, 3.0, -1.0),
            Vec3A::new(1.0, 3.0, -1.0),
            Vec3A::new(0.0, 3.0, 1.0),
            lamp,
        );
    let scene = builder.build().expect("valid scene");

    let config = RenderConfig::default();
    let bvh = Bvh::build(scene.triangles(), &config.bvh);
    let ctx = RenderContext::new(&scene, &bvh, &config);
    let mut rng = pixel_rng(1, 0, 0);

    // Down onto the mirror at a slant; reflected straight into the light.
    let direction = Vec3A::new(0.1, -1.0, 0.0).normalize();
    let ray = Ray::new(Vec3A::new(-0.1, 1.0, 0.0), direction);
    assert_eq!(ctx.radiance(&ray, &mut rng), Vec3A::splat(2.0));
}

#[test]
fn test_unchanged_camera_never_loses_samples() {
    init_logging();
    let mut renderer = Renderer::new(box_scene(Material::default()), RenderConfig::default());
    let mut target = PixelBuffer::new(12, 10).expect("valid size");
    let frustum = camera();

    renderer.render_frame(&frustum, &mut target).expect("frame");
    let cap = renderer.config().sampling_cap;
    for _ in 0..4 {
        let before: Vec<u32> = renderer.accumulation().iter().map(|s| s.count).collect();
        renderer.render_frame(&frustum, &mut target).expect("frame");
        for (state, &b) in renderer.accumulation().iter().zip(&before) {
            assert!(state.count > b);
            assert!(state.count <= b + 1 + cap);
        }
    }
    assert_eq!(renderer.still_frames(), 5);
}

#[test]
fn test_any_frustum_component_change_resets_all_pixels() {
    init_logging();
    let base = camera();
    let nudges: [fn(&mut Frustum); 4] = [
        |f: &mut Frustum| f.position.y += 1e-3,
        |f: &mut Frustum| f.top_left.x -= 1e-3,
        |f: &mut Frustum| f.top_right.z += 1e-3,
        |f: &mut Frustum| f.bottom_left.y -= 1e-3,
    ];

    for nudge in nudges {
        let mut renderer = Renderer::new(box_scene(Material::default()), RenderConfig::default());
        let mut target = PixelBuffer::new(8, 8).expect("valid size");
        renderer.render_frame(&base, &mut target).expect("frame");
        renderer.render_frame(&base, &mut target).expect("frame");
        assert!(renderer.accumulation().iter().all(|s| s.count >= 2));

        let mut moved = base;
        nudge(&mut moved);
        let stats = renderer.render_frame(&moved, &mut target).expect("frame");
        assert_eq!(stats.extra_samples, 0);
        assert!(renderer.accumulation().iter().all(|s| s.count == 1));
    }
}

#[test]
fn test_resolution_change_resets_history() {
    init_logging();
    let mut renderer = Renderer::new(box_scene(Material::default()), RenderConfig::default());
    let frustum = camera();

    let mut small = PixelBuffer::new(4, 4).expect("valid size");
    renderer.render_frame(&frustum, &mut small).expect("frame");
    renderer.render_frame(&frustum, &mut small).expect("frame");

    let mut large = PixelBuffer::new(6, 5).expect("valid size");
    let stats = renderer.render_frame(&frustum, &mut large).expect("frame");
    assert_eq!(stats.still_frames, 1);
    assert_eq!(renderer.accumulation().len(), 30);
    assert!(renderer.accumulation().iter().all(|s| s.count == 1));
}
