//! Triangle-fan meshes describing the Kugelpanzer hull and turret.

use battle_arena_rendering::{Color, Mesh, ObjectVertex};
use glam::Vec2;
use std::f32::consts::TAU;

/// Outer radius of the hull mesh; the hit tester uses the same circle.
pub const HULL_RADIUS: f32 = 1.0;

const HULL_SEGMENTS: u32 = 120;
const HULL_COLOR: Color = Color::WHITE;
const FACING_MARKER_COLOR: Color = Color::grey(0.4);

const TURRET_RADIUS: f32 = 0.5;
const TURRET_SEGMENTS: u32 = 60;
const TURRET_COLOR: Color = Color::grey(0.7);
const BARREL_HALF_WIDTH: f32 = 0.1;
const BARREL_LENGTH: f32 = 1.2;

/// Builds the hull: a unit circle fan plus a small triangle marking the front.
#[must_use]
pub fn hull_mesh() -> Mesh {
    let mut mesh = circle_fan(HULL_SEGMENTS, HULL_RADIUS, HULL_COLOR);

    let base = mesh.vertices.len() as u32;
    mesh.vertices.extend([
        ObjectVertex::untextured(Vec2::new(-0.15, 0.8), FACING_MARKER_COLOR),
        ObjectVertex::untextured(Vec2::new(0.15, 0.8), FACING_MARKER_COLOR),
        ObjectVertex::untextured(Vec2::new(0.0, 0.9), FACING_MARKER_COLOR),
    ]);
    mesh.indices.extend([base, base + 1, base + 2]);
    mesh
}

/// Builds the turret: a half-radius circle fan plus a barrel strip along +y.
#[must_use]
pub fn turret_mesh() -> Mesh {
    let mut mesh = circle_fan(TURRET_SEGMENTS, TURRET_RADIUS, TURRET_COLOR);

    let base = mesh.vertices.len() as u32;
    mesh.vertices.extend([
        ObjectVertex::untextured(Vec2::new(-BARREL_HALF_WIDTH, 0.0), TURRET_COLOR),
        ObjectVertex::untextured(Vec2::new(BARREL_HALF_WIDTH, 0.0), TURRET_COLOR),
        ObjectVertex::untextured(Vec2::new(-BARREL_HALF_WIDTH, BARREL_LENGTH), TURRET_COLOR),
        ObjectVertex::untextured(Vec2::new(BARREL_HALF_WIDTH, BARREL_LENGTH), TURRET_COLOR),
    ]);
    mesh.indices
        .extend([base, base + 1, base + 2, base + 1, base + 2, base + 3]);
    mesh
}

/// Rim samples are offset by half a step so none lies exactly on an axis.
/// The shared center vertex is stored right after the rim.
fn circle_fan(segments: u32, radius: f32, color: Color) -> Mesh {
    let center = segments;
    let mut mesh = Mesh {
        vertices: Vec::with_capacity(segments as usize + 1),
        indices: Vec::with_capacity(segments as usize * 3),
    };

    for i in 0..segments {
        let theta = (i as f32 + 0.5) / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.vertices
            .push(ObjectVertex::untextured(Vec2::new(sin, cos) * radius, color));
        mesh.indices.extend([i, (i + 1) % segments, center]);
    }
    mesh.vertices
        .push(ObjectVertex::untextured(Vec2::ZERO, color));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_is_a_full_fan_plus_marker() {
        let mesh = hull_mesh();

        assert_eq!(mesh.vertices.len(), 120 + 1 + 3);
        assert_eq!(mesh.triangle_count(), 120 + 1);
        assert!(mesh
            .indices
            .iter()
            .all(|&index| (index as usize) < mesh.vertices.len()));
    }

    #[test]
    fn hull_rim_matches_hit_radius() {
        let mesh = hull_mesh();

        for vertex in &mesh.vertices[..120] {
            assert!((vertex.position.length() - HULL_RADIUS).abs() < 1e-5);
        }
        assert_eq!(mesh.vertices[120].position, Vec2::ZERO);
    }

    #[test]
    fn no_rim_vertex_sits_on_the_forward_axis() {
        let mesh = hull_mesh();

        assert!(mesh.vertices[..120]
            .iter()
            .all(|vertex| vertex.position.x.abs() > 1e-3));
    }

    #[test]
    fn facing_marker_is_shaded_and_points_forward() {
        let mesh = hull_mesh();
        let marker = &mesh.vertices[121..];

        assert!(marker.iter().all(|vertex| vertex.color == Color::grey(0.4)));
        assert!(marker.iter().all(|vertex| vertex.position.y > 0.0));
        assert_eq!(&mesh.indices[mesh.indices.len() - 3..], &[121, 122, 123]);
    }

    #[test]
    fn turret_has_half_radius_and_barrel_strip() {
        let mesh = turret_mesh();

        assert_eq!(mesh.vertices.len(), 60 + 1 + 4);
        assert_eq!(mesh.triangle_count(), 60 + 2);
        for vertex in &mesh.vertices[..60] {
            assert!((vertex.position.length() - 0.5).abs() < 1e-5);
        }
        let barrel_tip = mesh
            .vertices
            .iter()
            .map(|vertex| vertex.position.y)
            .fold(f32::MIN, f32::max);
        assert!((barrel_tip - 1.2).abs() < 1e-6);
    }
}
