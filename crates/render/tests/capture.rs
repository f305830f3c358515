//! End-to-end captures of small scenes.

use physics::{BoxBody, Plane, SceneBodies, Sphere, Vec3};
use render::{CameraSpec, DepthImage, RenderError, SdfRenderer};

const RES: u32 = 33;

fn marker_scene(center: Vec3) -> SceneBodies {
    SceneBodies {
        boxes: vec![BoxBody { center, half_extents: Vec3::splat(0.05), color: [0.0, 1.0, 0.0] }],
        planes: vec![Plane::ground()],
        ..SceneBodies::default()
    }
}

#[test]
fn empty_scene_is_background_at_far_plane() {
    let renderer = SdfRenderer::default();
    let cap = renderer.capture(&SceneBodies::default(), RES).unwrap();
    assert_eq!(cap.rgb.resolution(), RES);
    assert!(cap.depth_buffer.iter().all(|d| (*d - 1.0).abs() < f32::EPSILON));
    let bg = cap.rgb.pixel(0, 0);
    assert!(cap.rgb.pixels().chunks(3).all(|p| p == bg));
}

#[test]
fn object_at_target_fills_the_center_pixel() {
    let cam = CameraSpec::default();
    let renderer = SdfRenderer::new(cam.clone());
    let bodies = SceneBodies {
        spheres: vec![Sphere { center: cam.target, radius: 0.2, color: [1.0, 0.0, 0.0] }],
        ..SceneBodies::default()
    };
    let cap = renderer.capture(&bodies, RES).unwrap();
    let center = (RES / 2) as usize;
    let depth = cam.linearize_depth(cap.depth_buffer[center * RES as usize + center]);
    let expected = (cam.target - cam.eye).length() - 0.2;
    assert!((depth - expected).abs() < 0.01, "depth {depth}, expected {expected}");
    let [r, g, b] = cap.rgb.pixel(RES / 2, RES / 2);
    assert!(r > g && r > b);
}

#[test]
fn closer_objects_have_smaller_depth() {
    let cam = CameraSpec::default();
    let renderer = SdfRenderer::new(cam.clone());
    let center = (RES / 2) as usize;
    let toward_eye = (cam.eye - cam.target).normalize();
    let near = renderer.capture(&marker_scene(cam.target + toward_eye * 0.8), RES).unwrap();
    let far = renderer.capture(&marker_scene(cam.target + toward_eye * 0.2), RES).unwrap();
    let i = center * RES as usize + center;
    assert!(near.depth_buffer[i] < far.depth_buffer[i]);
}

#[test]
fn captures_are_deterministic() {
    let renderer = SdfRenderer::default();
    let scene = marker_scene(Vec3::new(0.5, 0.0, 0.3));
    let a = renderer.capture(&scene, RES).unwrap();
    let b = renderer.capture(&scene, RES).unwrap();
    assert_eq!(a.rgb, b.rgb);
    assert_eq!(a.depth_buffer, b.depth_buffer);
}

#[test]
fn zero_resolution_is_rejected() {
    let renderer = SdfRenderer::default();
    let err = renderer.capture(&SceneBodies::default(), 0).unwrap_err();
    assert!(matches!(err, RenderError::InvalidResolution(0)));
}

#[test]
fn depth_image_from_buffer() {
    let cam = CameraSpec::default();
    let cap = SdfRenderer::default().capture(&marker_scene(cam.target), RES).unwrap();
    let metric: Vec<f32> = cap.depth_buffer.iter().map(|d| cam.linearize_depth(*d)).collect();
    let depth = DepthImage::new(RES, metric).unwrap();
    assert!(depth.values().iter().all(|d| *d >= cam.znear && *d <= cam.zfar + 1e-3));
}
