#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for battle arena adapters.
//!
//! Units never talk to a graphics API directly. They register their meshes
//! once through [`ModelRegistry`] and submit per-frame draw calls through
//! [`RenderSubmission`]. [`RecordingRenderer`] implements both contracts
//! without a GPU so headless drivers and tests can observe what a unit drew.

use battle_arena_core::PlayerColor;
use glam::Vec2;
use std::sync::OnceLock;
use tracing::trace;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white, the neutral tint.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque grey where every channel shares the same intensity.
    #[must_use]
    pub const fn grey(intensity: f32) -> Self {
        Self::new(intensity, intensity, intensity, 1.0)
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

impl From<PlayerColor> for Color {
    fn from(color: PlayerColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

/// Single vertex of a registered mesh, expressed in the unit's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectVertex {
    /// Position in local units.
    pub position: Vec2,
    /// Texture coordinate.
    pub tex_coord: Vec2,
    /// Per-vertex color multiplied with the submitted tint.
    pub color: Color,
}

impl ObjectVertex {
    /// Creates an untextured vertex with the provided color.
    #[must_use]
    pub const fn untextured(position: Vec2, color: Color) -> Self {
        Self {
            position,
            tex_coord: Vec2::ZERO,
            color,
        }
    }
}

/// Indexed triangle list ready for registration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Vertex buffer.
    pub vertices: Vec<ObjectVertex>,
    /// Index buffer; every three entries describe one triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of triangles described by the index buffer.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Opaque handle returned by [`ModelRegistry::register_model`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(u32);

impl ModelHandle {
    /// Creates a new handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a texture known to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

impl TextureId {
    /// Texture slot that samples plain white, leaving vertex colors untouched.
    pub const UNTEXTURED: Self = Self(0);

    /// Creates a new texture identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Backend capability that uploads meshes and hands back opaque handles.
///
/// Registration is assumed to always succeed; a backend that cannot register
/// a mesh is misconfigured and should abort before the simulation starts.
pub trait ModelRegistry {
    /// Uploads a mesh and returns the handle used to draw it later.
    fn register_model(&mut self, vertices: &[ObjectVertex], indices: &[u32]) -> ModelHandle;
}

/// Per-frame draw submission consumed by unit renderers.
pub trait RenderSubmission {
    /// Sets the model transform used by subsequent draws.
    fn set_transformation(&mut self, position: Vec2, rotation: f32);

    /// Binds the texture used by subsequent draws.
    fn set_texture(&mut self, texture: TextureId);

    /// Sets the tint multiplied into subsequent draws.
    fn set_color(&mut self, color: Color);

    /// Overrides the rotation of the current transform, keeping its position.
    fn set_rotation(&mut self, rotation: f32);

    /// Draws a previously registered model with the current state.
    fn draw_model(&mut self, model: ModelHandle);
}

/// Lazily built, process-wide cache of model handles for one unit type.
///
/// Declare one `static` per unit type. The first caller of
/// [`ModelCache::get_or_build`] runs the build closure; concurrent callers
/// block until it finishes and every later caller receives the cached value
/// without invoking its closure.
#[derive(Debug)]
pub struct ModelCache<T> {
    cell: OnceLock<T>,
}

impl<T> ModelCache<T> {
    /// Creates an empty cache, usable in `static` items.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the cached value, building it on first use.
    pub fn get_or_build<F>(&self, build: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(build)
    }

    /// Returns the cached value if it has been built.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Reports whether the build closure already ran.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for ModelCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw call captured by [`RecordingRenderer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    /// Transform set through [`RenderSubmission::set_transformation`].
    SetTransformation {
        /// Translation in world units.
        position: Vec2,
        /// Rotation in radians.
        rotation: f32,
    },
    /// Texture bound through [`RenderSubmission::set_texture`].
    SetTexture(TextureId),
    /// Tint set through [`RenderSubmission::set_color`].
    SetColor(Color),
    /// Rotation override set through [`RenderSubmission::set_rotation`].
    SetRotation(f32),
    /// Model drawn through [`RenderSubmission::draw_model`].
    DrawModel(ModelHandle),
}

/// Headless backend that stores registered meshes and records draw calls.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    meshes: Vec<Mesh>,
    commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes registered so far.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.meshes.len()
    }

    /// Returns the mesh registered under the handle.
    #[must_use]
    pub fn mesh(&self, model: ModelHandle) -> Option<&Mesh> {
        usize::try_from(model.get())
            .ok()
            .and_then(|index| self.meshes.get(index))
    }

    /// Draw calls recorded since the last [`RecordingRenderer::take_commands`].
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drains the recorded draw calls, typically once per frame.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ModelRegistry for RecordingRenderer {
    fn register_model(&mut self, vertices: &[ObjectVertex], indices: &[u32]) -> ModelHandle {
        let handle = ModelHandle::new(self.meshes.len() as u32);
        self.meshes.push(Mesh {
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
        trace!(
            model = handle.get(),
            vertices = vertices.len(),
            indices = indices.len(),
            "registered model"
        );
        handle
    }
}

impl RenderSubmission for RecordingRenderer {
    fn set_transformation(&mut self, position: Vec2, rotation: f32) {
        self.commands
            .push(DrawCommand::SetTransformation { position, rotation });
    }

    fn set_texture(&mut self, texture: TextureId) {
        self.commands.push(DrawCommand::SetTexture(texture));
    }

    fn set_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetColor(color));
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.commands.push(DrawCommand::SetRotation(rotation));
    }

    fn draw_model(&mut self, model: ModelHandle) {
        self.commands.push(DrawCommand::DrawModel(model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn player_color_converts_to_normalised_channels() {
        let color = Color::from(PlayerColor::from_rgb(255, 0, 51));

        assert_eq!(color, Color::new(1.0, 0.0, 0.2, 1.0));
    }

    #[test]
    fn recorder_hands_out_sequential_handles() {
        let mut renderer = RecordingRenderer::new();
        let vertex = ObjectVertex::untextured(Vec2::ZERO, Color::WHITE);

        let first = renderer.register_model(&[vertex; 3], &[0, 1, 2]);
        let second = renderer.register_model(&[vertex; 3], &[2, 1, 0]);

        assert_eq!(first, ModelHandle::new(0));
        assert_eq!(second, ModelHandle::new(1));
        assert_eq!(renderer.registration_count(), 2);
        assert_eq!(
            renderer.mesh(second).map(|mesh| mesh.indices.clone()),
            Some(vec![2, 1, 0])
        );
        assert!(renderer.mesh(ModelHandle::new(7)).is_none());
    }

    #[test]
    fn recorder_drains_commands_per_frame() {
        let mut renderer = RecordingRenderer::new();
        renderer.set_texture(TextureId::UNTEXTURED);
        renderer.draw_model(ModelHandle::new(3));

        let frame = renderer.take_commands();

        assert_eq!(
            frame,
            vec![
                DrawCommand::SetTexture(TextureId::UNTEXTURED),
                DrawCommand::DrawModel(ModelHandle::new(3)),
            ]
        );
        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn model_cache_runs_build_closure_once() {
        let cache: ModelCache<u32> = ModelCache::new();
        let builds = Cell::new(0);

        for _ in 0..4 {
            let value = cache.get_or_build(|| {
                builds.set(builds.get() + 1);
                42
            });
            assert_eq!(*value, 42);
        }

        assert_eq!(builds.get(), 1);
        assert!(cache.is_built());
    }

    #[test]
    fn independent_caches_do_not_share_state() {
        let hulls: ModelCache<u32> = ModelCache::new();
        let turrets: ModelCache<u32> = ModelCache::new();

        let _ = hulls.get_or_build(|| 1);

        assert!(hulls.is_built());
        assert!(!turrets.is_built());
        assert_eq!(turrets.get(), None);
    }

    #[test]
    fn model_cache_initialises_once_across_threads() {
        static CACHE: ModelCache<usize> = ModelCache::new();
        let builds = std::sync::atomic::AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let _ = scope.spawn(|| {
                    let _ = CACHE.get_or_build(|| {
                        builds.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1
                    });
                });
            }
        });

        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(CACHE.get(), Some(&1));
    }
}
