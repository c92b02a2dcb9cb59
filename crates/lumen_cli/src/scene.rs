//! Built-in demo scene: a closed box with a mirror block and a glass prism.
//!
//! Geometry goes through the same flat float buffer a host application
//! would upload, four floats per vertex.

use lumen_core::{Material, Scene, SceneResult};
use lumen_math::{Vec3, Vec3A};

const WHITE: u32 = 0;
const RED: u32 = 1;
const GREEN: u32 = 2;
const MIRROR: u32 = 3;
const GLASS: u32 = 4;
const LAMP: u32 = 5;

/// Box interior spans [-2, 2] x [0, 4] x [-2, 2]; the front is open.
pub fn demo_box() -> SceneResult<Scene> {
    let materials = vec![
        Material::diffuse(Vec3::splat(0.73)),
        Material::diffuse(Vec3::new(0.65, 0.05, 0.05)),
        Material::diffuse(Vec3::new(0.12, 0.45, 0.15)),
        Material::mirror(Vec3::ONE, 0.85),
        Material::glass(Vec3::ONE, 0.9, 1.5),
        Material::emitter(Vec3::splat(15.0)),
    ];

    let mut mesh = FloatMesh::default();
    let corner = |x: f32, y: f32, z: f32| Vec3A::new(x, y, z);

    // Floor, ceiling, back
    mesh.quad(
        [
            corner(-2.0, 0.0, -2.0),
            corner(-2.0, 0.0, 2.0),
            corner(2.0, 0.0, 2.0),
            corner(2.0, 0.0, -2.0),
        ],
        WHITE,
    );
    mesh.quad(
        [
            corner(-2.0, 4.0, -2.0),
            corner(2.0, 4.0, -2.0),
            corner(2.0, 4.0, 2.0),
            corner(-2.0, 4.0, 2.0),
        ],
        WHITE,
    );
    mesh.quad(
        [
            corner(-2.0, 0.0, -2.0),
            corner(2.0, 0.0, -2.0),
            corner(2.0, 4.0, -2.0),
            corner(-2.0, 4.0, -2.0),
        ],
        WHITE,
    );
    // Left red, right green
    mesh.quad(
        [
            corner(-2.0, 0.0, -2.0),
            corner(-2.0, 4.0, -2.0),
            corner(-2.0, 4.0, 2.0),
            corner(-2.0, 0.0, 2.0),
        ],
        RED,
    );
    mesh.quad(
        [
            corner(2.0, 0.0, -2.0),
            corner(2.0, 0.0, 2.0),
            corner(2.0, 4.0, 2.0),
            corner(2.0, 4.0, -2.0),
        ],
        GREEN,
    );

    mesh.block(corner(-1.2, 0.0, -1.3), corner(-0.2, 2.2, -0.3), MIRROR);
    mesh.prism(corner(0.9, 0.0, 0.4), 0.7, 1.4, GLASS);

    let mut builder = Scene::builder().materials(materials);
    builder.add_vertex_floats(&mesh.floats, &mesh.materials)?;

    // Two triangles of ceiling light, slightly below the ceiling
    let y = 3.98;
    let (a, b, c, d) = (
        corner(-0.6, y, -0.6),
        corner(0.6, y, -0.6),
        corner(0.6, y, 0.6),
        corner(-0.6, y, 0.6),
    );
    builder.add_light(a, b, c, LAMP).add_light(a, c, d, LAMP);

    builder.build()
}

/// Host-style vertex buffer under construction.
#[derive(Default)]
struct FloatMesh {
    floats: Vec<f32>,
    materials: Vec<u32>,
}

impl FloatMesh {
    fn triangle(&mut self, vertices: [Vec3A; 3], material: u32) {
        for v in vertices {
            self.floats.extend_from_slice(&[v.x, v.y, v.z, 1.0]);
        }
        self.materials.push(material);
    }

    fn quad(&mut self, [a, b, c, d]: [Vec3A; 4], material: u32) {
        self.triangle([a, b, c], material);
        self.triangle([a, c, d], material);
    }

    /// Axis-aligned block between two corners.
    fn block(&mut self, min: Vec3A, max: Vec3A, material: u32) {
        let p = |x: f32, y: f32, z: f32| Vec3A::new(x, y, z);
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);

        self.quad([p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)], material);
        self.quad([p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)], material);
        self.quad([p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)], material);
        self.quad([p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)], material);
        self.quad([p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1), p(x1, y0, z1)], material);
    }

    /// Triangular prism standing on the floor around `base`.
    fn prism(&mut self, base: Vec3A, radius: f32, height: f32, material: u32) {
        let ring: Vec<Vec3A> = (0..3)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 3.0;
                base + Vec3A::new(angle.cos() * radius, 0.0, angle.sin() * radius)
            })
            .collect();
        let lift = Vec3A::new(0.0, height, 0.0);

        self.triangle([ring[0] + lift, ring[1] + lift, ring[2] + lift], material);
        for i in 0..3 {
            let (a, b) = (ring[i], ring[(i + 1) % 3]);
            self.quad([a, b, b + lift, a + lift], material);
        }
    }
}
