//! Headless signed-distance-field ray marcher.
//!
//! Every pixel unprojects a ray through the inverse view-projection matrix
//! and sphere-traces the union of the scene's primitives. Shading is a single
//! directional light plus ambient. Rows are rendered in parallel.

use crate::buffer::{pixel_count, RgbImage};
use crate::camera::CameraSpec;
use crate::error::RenderError;
use glam::{Mat4, Vec3, Vec4};
use physics::{Color, SceneBodies};
use rayon::prelude::*;

const MAX_STEPS: usize = 128;
const HIT_EPSILON: f32 = 1e-4;
const NORMAL_EPSILON: f32 = 1e-3;
const AMBIENT: f32 = 0.35;

/// What [`SdfRenderer::capture`] produces: the color image and the raw
/// depth buffer, normalized to `[0, 1]` with `1.0` for empty background.
#[derive(Clone, Debug)]
pub struct RawCapture {
    pub rgb: RgbImage,
    pub depth_buffer: Vec<f32>,
}

pub struct SdfRenderer {
    pub camera: CameraSpec,
    pub background: Color,
    pub light_dir: Vec3,
}

impl Default for SdfRenderer {
    fn default() -> Self {
        Self::new(CameraSpec::default())
    }
}

impl SdfRenderer {
    #[must_use]
    pub fn new(camera: CameraSpec) -> Self {
        Self {
            camera,
            background: [0.75, 0.82, 0.9],
            light_dir: Vec3::new(-0.4, -0.3, 1.0).normalize(),
        }
    }

    /// Render `bodies` at `resolution × resolution`.
    pub fn capture(&self, bodies: &SceneBodies, resolution: u32) -> Result<RawCapture, RenderError> {
        let n = pixel_count(resolution)?;
        let view_proj_inv = self.camera.view_projection(1.0).inverse();
        let forward = self.camera.forward();
        let res = resolution as usize;

        let mut pixels = vec![0u8; n * 3];
        let mut depth_buffer = vec![1.0_f32; n];
        pixels
            .par_chunks_mut(res * 3)
            .zip(depth_buffer.par_chunks_mut(res))
            .enumerate()
            .for_each(|(y, (row_rgb, row_depth))| {
                for x in 0..res {
                    let dir = self.ray_direction(&view_proj_inv, x, y, res);
                    let (color, depth) = match self.march(bodies, dir) {
                        Some((t, color)) => {
                            let z = t * dir.dot(forward);
                            (color, self.camera.normalized_depth(z))
                        }
                        None => (self.background, 1.0),
                    };
                    row_depth[x] = depth;
                    for (c, v) in row_rgb[x * 3..x * 3 + 3].iter_mut().zip(color) {
                        *c = to_byte(v);
                    }
                }
            });

        Ok(RawCapture { rgb: RgbImage::new(resolution, pixels)?, depth_buffer })
    }

    fn ray_direction(&self, view_proj_inv: &Mat4, x: usize, y: usize, res: usize) -> Vec3 {
        let ndc_x = (x as f32 + 0.5) / res as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y as f32 + 0.5) / res as f32 * 2.0;
        let far = *view_proj_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        (far.truncate() / far.w - self.camera.eye).normalize()
    }

    /// Sphere-trace along `dir` from the eye. Returns the hit distance and
    /// shaded color.
    fn march(&self, bodies: &SceneBodies, dir: Vec3) -> Option<(f32, Color)> {
        let origin = self.camera.eye;
        let mut t = self.camera.znear;
        for _ in 0..MAX_STEPS {
            let p = origin + dir * t;
            let (d, albedo) = scene_sdf(bodies, p);
            if d < HIT_EPSILON * t.max(1.0) {
                let normal = scene_normal(bodies, p);
                let diffuse = normal.dot(self.light_dir).max(0.0);
                let shade = AMBIENT + (1.0 - AMBIENT) * diffuse;
                return Some((t, albedo.map(|c| c * shade)));
            }
            t += d;
            if t > self.camera.zfar {
                return None;
            }
        }
        None
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn scene_sdf(bodies: &SceneBodies, p: Vec3) -> (f32, Color) {
    let mut best = (f32::INFINITY, [0.0; 3]);
    let mut consider = |d: f32, color: Color| {
        if d < best.0 {
            best = (d, color);
        }
    };
    for s in &bodies.spheres {
        consider((p - s.center).length() - s.radius, s.color);
    }
    for c in &bodies.capsules {
        consider(sd_capsule(p, c.a, c.b, c.radius), c.color);
    }
    for b in &bodies.boxes {
        consider(sd_box(p - b.center, b.half_extents), b.color);
    }
    for pl in &bodies.planes {
        consider(Vec3::from(pl.normal).dot(p) - pl.d, pl.color);
    }
    best
}

fn scene_normal(bodies: &SceneBodies, p: Vec3) -> Vec3 {
    let e = NORMAL_EPSILON;
    let d = |q: Vec3| scene_sdf(bodies, q).0;
    Vec3::new(
        d(p + Vec3::X * e) - d(p - Vec3::X * e),
        d(p + Vec3::Y * e) - d(p - Vec3::Y * e),
        d(p + Vec3::Z * e) - d(p - Vec3::Z * e),
    )
    .normalize_or_zero()
}

fn sd_capsule(p: Vec3, a: Vec3, b: Vec3, r: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.length_squared().max(f32::EPSILON)).clamp(0.0, 1.0);
    (pa - ba * h).length() - r
}

fn sd_box(p: Vec3, half_extents: Vec3) -> f32 {
    let q = p.abs() - half_extents;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}
