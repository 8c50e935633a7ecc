//! Engine-facing ports.
//!
//! The frame graph core never talks to a renderer directly. It is handed two
//! ports when it is constructed:
//!
//! - [`FrameGraphBackend`] - the engine's node graph: instantiate typed
//!   nodes, enable/disable them, wire channels, and fill per-node render
//!   queues and uniforms
//! - [`ResourceBackend`] - creation and destruction of geometry, textures,
//!   render targets and materials
//!
//! # Available Backends
//!
//! - `dummy` (default): records every call, for tests and headless use
//!
//! Engine integrations implement both traits on their own types.

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(feature = "dummy")]
pub use dummy::DummyBackend;

use uiframe_core::math::{Mat4, Vec4};

use crate::error::GraphicsResult;
use crate::graph::PassKind;
use crate::materials::MaterialDescriptor;
use crate::types::{GpuVertex, TextureDescriptor};

/// Engine node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Engine geometry (vertex + index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

/// Engine texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Engine material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Endpoint of a channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// Graph entry node, fed by the background target.
    Start,
    /// Graph terminal node, writing into the output target.
    End,
    Node(NodeId),
}

/// Render object submitted to a node's render queue.
///
/// `transform` indexes the transform array passed to
/// [`FrameGraphBackend::update_transforms`] for the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderObject {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: u32,
}

/// The engine's frame graph.
///
/// Nodes are created once and then only enabled or disabled. Connections
/// are rebuilt every frame and take effect on [`commit`](Self::commit).
/// `pass` arguments select a sub-pass inside the node's template.
pub trait FrameGraphBackend {
    /// Instantiate a node of `kind` under the unique `name`.
    fn create_node(&mut self, kind: PassKind, name: &str) -> GraphicsResult<NodeId>;

    fn set_node_enabled(&mut self, node: NodeId, enabled: bool);

    /// Register the external render targets. Index 0 is the output, 1 the
    /// background, the rest back saved layers.
    fn set_external_targets(&mut self, targets: &[TextureId]);

    /// Drop every channel connection.
    fn clear_connections(&mut self);

    /// Connect output channel `from_channel` of `from` to input `to_channel` of `to`.
    fn connect(&mut self, from: NodeRef, from_channel: u32, to: NodeRef, to_channel: u32);

    /// Feed external target `external` into input `to_channel` of `to`.
    fn connect_external(&mut self, external: usize, to: NodeRef, to_channel: u32);

    /// Apply the connections made since the last clear.
    fn commit(&mut self) -> GraphicsResult<()>;

    /// Drop render objects queued into a node during a previous frame.
    fn clear_render_queue(&mut self, node: NodeId, pass: u32);

    /// Append a render object; objects draw in submission order.
    fn queue_render_object(&mut self, node: NodeId, pass: u32, object: RenderObject);

    /// Scissor as `(left, top, width, height)` fractions of the target.
    fn set_scissor(&mut self, node: NodeId, pass: u32, region: Vec4);

    /// Stencil reference for clip-mask passes, `None` disables the test.
    fn set_stencil_reference(&mut self, node: NodeId, pass: u32, reference: Option<u8>);

    /// UI transform applied on top of per-object translations.
    fn set_transform(&mut self, node: NodeId, pass: u32, transform: Mat4);

    /// Material of a full-screen quad pass.
    fn set_material(&mut self, node: NodeId, pass: u32, material: MaterialId);

    /// Projection shared by all UI passes.
    fn set_projection(&mut self, projection: Mat4);

    /// Update every render object's transform in one batch.
    fn update_transforms(&mut self, transforms: &[Mat4]);
}

/// Creation and destruction of engine resources.
pub trait ResourceBackend {
    fn create_geometry(&mut self, vertices: &[GpuVertex], indices: &[u32])
    -> GraphicsResult<GeometryId>;

    fn destroy_geometry(&mut self, geometry: GeometryId);

    /// Create a sampled texture initialised with `pixels`.
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> GraphicsResult<TextureId>;

    /// Create a texture that can be rendered into and sampled.
    fn create_render_target(&mut self, descriptor: &TextureDescriptor)
    -> GraphicsResult<TextureId>;

    fn resize_render_target(&mut self, target: TextureId, width: u32, height: u32)
    -> GraphicsResult<()>;

    /// Destroy a texture or render target.
    fn destroy_texture(&mut self, texture: TextureId);

    fn create_material(&mut self, descriptor: &MaterialDescriptor) -> GraphicsResult<MaterialId>;

    fn destroy_material(&mut self, material: MaterialId);
}
