use glam::Vec3;

use fishtank_engine::coords::ColorRgba;
use fishtank_engine::projection::WindowPlane;
use fishtank_engine::render::LineBatch;

const ROOM_DEPTH: f32 = 240.0;
const FRAME: ColorRgba = ColorRgba::rgb(1.0, 0.55, 0.1);
const WALL: ColorRgba = ColorRgba::rgb(0.25, 0.45, 0.7);
const GRID: ColorRgba = ColorRgba::rgb(0.12, 0.2, 0.3);
const MARKER: ColorRgba = ColorRgba::rgb(0.9, 0.9, 0.95);

/// A box-shaped room behind `window`, the window frame itself and a few
/// markers at increasing depth so parallax is easy to judge.
pub fn reference_room(window: &WindowPlane) -> LineBatch {
    let mut batch = LineBatch::new();

    let half = window.width / 2.0;
    let h = window.height;
    let origin = window.position;

    // The room is as wide and tall as the window so its walls run straight
    // back from the frame edges.
    let bottom_left = origin - Vec3::Y * half;
    let across = Vec3::Y * window.width;
    let up = Vec3::Z * h;
    let back = Vec3::X * ROOM_DEPTH;

    batch.quad_outline(bottom_left, across, up, FRAME);

    batch.grid(bottom_left, back, across, 12, 4, GRID);
    batch.grid(bottom_left + up, back, across, 12, 4, GRID);
    batch.grid(bottom_left, back, up, 12, 3, GRID);
    batch.grid(bottom_left + across, back, up, 12, 3, GRID);
    batch.grid(bottom_left + back, across, up, 4, 3, WALL);

    for (i, depth) in [30.0, 90.0, 170.0].into_iter().enumerate() {
        let y = (i as f32 - 1.0) * half * 0.5;
        let base = origin + Vec3::new(depth, y, 0.0);
        let footprint = Vec3::new(4.0, 4.0, 0.0);
        batch.box_edges(base - footprint, base + footprint + Vec3::Z * h * 0.6, MARKER);
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_comes_first_and_matches_window() {
        let window = WindowPlane { position: Vec3::new(100.0, 0.0, 0.0), width: 60.0, height: 40.0 };
        let batch = reference_room(&window);
        let corners: Vec<_> = batch.vertices()[..8].iter().map(|v| v.position).collect();

        assert_eq!(corners[0], [100.0, -30.0, 0.0]);
        assert_eq!(corners[1], [100.0, 30.0, 0.0]);
        assert_eq!(corners[3], [100.0, 30.0, 40.0]);
    }

    #[test]
    fn nothing_is_in_front_of_the_window() {
        let window = WindowPlane::default();
        let batch = reference_room(&window);
        assert!(batch.vertices().iter().all(|v| v.position[0] >= window.position.x - 1e-3));
    }
}
