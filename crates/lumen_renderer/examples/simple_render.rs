//! Simple progressive render example.
//!
//! Scatters random triangles over a floor under a single area light, renders
//! a handful of still frames and saves the result to PPM format.

use lumen_renderer::{
    unpack_color, Frustum, Material, PixelBuffer, RenderConfig, Renderer, Scene, Vec3, Vec3A,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() {
    println!("Lumen Path Tracer - Simple Example");
    println!("==================================");

    let start = std::time::Instant::now();
    let scene = build_scene();
    println!(
        "Scene built in {:?} ({} triangles, {} lights)",
        start.elapsed(),
        scene.triangle_count(),
        scene.light_count()
    );

    let (width, height) = (320, 240);
    let frustum = Frustum::look_at(
        Vec3::new(0.0, 3.0, 9.0), // look_from
        Vec3::new(0.0, 0.5, 0.0), // look_at
        Vec3::Y,
        45.0,
        width as f32 / height as f32,
    );

    let mut renderer = Renderer::new(scene, RenderConfig::default());
    let mut image = PixelBuffer::new(width, height).expect("non-empty target");

    let frames = 16;
    println!("Rendering {}x{} for {} frames...", width, height, frames);
    let start = std::time::Instant::now();
    for _ in 0..frames {
        let stats = renderer.render_frame(&frustum, &mut image).expect("matching target");
        println!(
            "  frame {:2}: {} rays, {} adaptive",
            stats.frame, stats.rays, stats.extra_samples
        );
    }
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.ppm";
    save_ppm(&image, filename).expect("Failed to save image");
    println!("Saved to {}", filename);
}

fn build_scene() -> Scene {
    let mut builder = Scene::builder();
    let floor = builder.add_material(Material::diffuse(Vec3::splat(0.6)));
    let mirror = builder.add_material(Material::mirror(Vec3::ONE, 0.9));
    let glass = builder.add_material(Material::glass(Vec3::ONE, 0.9, 1.5));
    let lamp = builder.add_material(Material::emitter(Vec3::splat(12.0)));

    // Ground, two triangles
    let (a, b, c, d) = (
        Vec3A::new(-10.0, 0.0, -10.0),
        Vec3A::new(10.0, 0.0, -10.0),
        Vec3A::new(10.0, 0.0, 10.0),
        Vec3A::new(-10.0, 0.0, 10.0),
    );
    builder.add_triangle(a, c, b, floor).add_triangle(a, d, c, floor);

    // Light facing down
    builder.add_light(
        Vec3A::new(-1.5, 5.0, -1.5),
        Vec3A::new(1.5, 5.0, -1.5),
        Vec3A::new(0.0, 5.0, 1.5),
        lamp,
    );

    // Small random triangles
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let center = Vec3A::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(0.1..2.5),
            rng.gen_range(-4.0..4.0),
        );
        let mut corner = || {
            center
                + Vec3A::new(
                    rng.gen_range(-0.4..0.4),
                    rng.gen_range(-0.4..0.4),
                    rng.gen_range(-0.4..0.4),
                )
        };
        let (v0, v1, v2) = (corner(), corner(), corner());

        let choose_mat: f32 = rng.gen();
        let material = if choose_mat < 0.8 {
            // Diffuse
            let color = Vec3::new(rng.gen(), rng.gen(), rng.gen()) * 0.8;
            builder.add_material(Material::diffuse(color))
        } else if choose_mat < 0.95 {
            mirror
        } else {
            glass
        };
        builder.add_triangle(v0, v1, v2, material);
    }

    builder.build().expect("valid scene")
}

fn save_ppm(image: &PixelBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width(), image.height())?;
    writeln!(writer, "255")?;

    for y in 0..image.height() {
        for x in 0..image.width() {
            let color = unpack_color(image.get(x, y)) * 255.0;
            writeln!(writer, "{} {} {}", color.x as u8, color.y as u8, color.z as u8)?;
        }
    }

    Ok(())
}
