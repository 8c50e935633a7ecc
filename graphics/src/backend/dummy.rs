//! Dummy backend for testing and headless use.
//!
//! This backend doesn't render anything. It implements both engine ports by
//! recording every call, so tests can inspect the resulting graph topology,
//! node state and resource lifetimes.

use std::collections::{BTreeMap, HashMap};

use uiframe_core::math::{Mat4, Vec4};

use crate::error::{GraphicsError, GraphicsResult};
use crate::graph::PassKind;
use crate::materials::MaterialDescriptor;
use crate::types::{GpuVertex, TextureDescriptor};

use super::{
    FrameGraphBackend, GeometryId, MaterialId, NodeId, NodeRef, RenderObject, ResourceBackend,
    TextureId,
};

/// State recorded for one sub-pass of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DummyNodePass {
    pub objects: Vec<RenderObject>,
    pub scissor: Option<Vec4>,
    pub stencil_reference: Option<u8>,
    pub transform: Option<Mat4>,
    pub material: Option<MaterialId>,
}

/// A node created through [`FrameGraphBackend::create_node`].
#[derive(Debug, Clone, PartialEq)]
pub struct DummyNode {
    pub kind: PassKind,
    pub name: String,
    pub enabled: bool,
    pub passes: BTreeMap<u32, DummyNodePass>,
}

/// A recorded channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DummyLink {
    Node {
        from: NodeRef,
        from_channel: u32,
        to: NodeRef,
        to_channel: u32,
    },
    External {
        external: usize,
        to: NodeRef,
        to_channel: u32,
    },
}

/// Recording backend.
#[derive(Debug)]
pub struct DummyBackend {
    nodes: Vec<DummyNode>,
    pending: Vec<DummyLink>,
    committed: Vec<DummyLink>,
    externals: Vec<TextureId>,
    projection: Mat4,
    transforms: Vec<Mat4>,
    commits: usize,
    next_id: u64,
    geometries: HashMap<GeometryId, usize>,
    textures: HashMap<TextureId, TextureDescriptor>,
    materials: HashMap<MaterialId, MaterialDescriptor>,
    fail_resources: bool,
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            pending: Vec::new(),
            committed: Vec::new(),
            externals: Vec::new(),
            projection: Mat4::identity(),
            transforms: Vec::new(),
            commits: 0,
            next_id: 1,
            geometries: HashMap::new(),
            textures: HashMap::new(),
            materials: HashMap::new(),
            fail_resources: false,
        }
    }
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    /// Make every following resource creation fail.
    pub fn set_fail_resources(&mut self, fail: bool) {
        self.fail_resources = fail;
    }

    pub fn nodes(&self) -> &[DummyNode] {
        &self.nodes
    }

    /// # Panics
    ///
    /// Panics if `node` was not created by this backend.
    pub fn node(&self, node: NodeId) -> &DummyNode {
        &self.nodes[node.0 as usize]
    }

    /// Recorded state of sub-pass `pass` of `node`.
    pub fn node_pass(&self, node: NodeId, pass: u32) -> Option<&DummyNodePass> {
        self.node(node).passes.get(&pass)
    }

    /// Ids of enabled nodes in creation order.
    pub fn enabled_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.enabled)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// Nodes of `kind` in creation order.
    pub fn nodes_of_kind(&self, kind: PassKind) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == kind)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// Connections applied by the last commit.
    pub fn committed_links(&self) -> &[DummyLink] {
        &self.committed
    }

    /// Follow channel 0 from `Start` to `End`.
    ///
    /// Returns the visited endpoints, including `Start` and, when reached, `End`.
    pub fn primary_chain(&self) -> Vec<NodeRef> {
        let mut chain = vec![NodeRef::Start];
        let mut current = NodeRef::Start;
        for _ in 0..=self.nodes.len() {
            let next = self.committed.iter().find_map(|link| match *link {
                DummyLink::Node {
                    from,
                    from_channel: 0,
                    to,
                    to_channel: 0,
                } if from == current => Some(to),
                _ => None,
            });
            match next {
                Some(next) => {
                    chain.push(next);
                    if next == NodeRef::End {
                        break;
                    }
                    current = next;
                }
                None => break,
            }
        }
        chain
    }

    pub fn external_targets(&self) -> &[TextureId] {
        &self.externals
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Transforms from the last bulk update.
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn live_geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture(&self, texture: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(&texture)
    }

    pub fn material(&self, material: MaterialId) -> Option<&MaterialDescriptor> {
        self.materials.get(&material)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_resources(&self, what: &str) -> GraphicsResult<()> {
        if self.fail_resources {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "DummyBackend: {what} creation disabled"
            )));
        }
        Ok(())
    }

    fn pass_mut(&mut self, node: NodeId, pass: u32) -> &mut DummyNodePass {
        self.nodes[node.0 as usize].passes.entry(pass).or_default()
    }
}

impl FrameGraphBackend for DummyBackend {
    fn create_node(&mut self, kind: PassKind, name: &str) -> GraphicsResult<NodeId> {
        if self.nodes.iter().any(|node| node.name == name) {
            return Err(GraphicsError::NodeCreationFailed(format!(
                "duplicate node name {name}"
            )));
        }
        log::trace!("DummyBackend: creating node {name} ({kind:?})");
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DummyNode {
            kind,
            name: name.to_string(),
            enabled: true,
            passes: BTreeMap::new(),
        });
        Ok(id)
    }

    fn set_node_enabled(&mut self, node: NodeId, enabled: bool) {
        self.nodes[node.0 as usize].enabled = enabled;
    }

    fn set_external_targets(&mut self, targets: &[TextureId]) {
        self.externals = targets.to_vec();
    }

    fn clear_connections(&mut self) {
        self.pending.clear();
    }

    fn connect(&mut self, from: NodeRef, from_channel: u32, to: NodeRef, to_channel: u32) {
        self.pending.push(DummyLink::Node {
            from,
            from_channel,
            to,
            to_channel,
        });
    }

    fn connect_external(&mut self, external: usize, to: NodeRef, to_channel: u32) {
        self.pending.push(DummyLink::External {
            external,
            to,
            to_channel,
        });
    }

    fn commit(&mut self) -> GraphicsResult<()> {
        if let Some(external) = self.pending.iter().find_map(|link| match *link {
            DummyLink::External { external, .. } if external >= self.externals.len() => {
                Some(external)
            }
            _ => None,
        }) {
            return Err(GraphicsError::Backend(format!(
                "external target {external} is not registered"
            )));
        }
        self.committed = self.pending.clone();
        self.commits += 1;
        log::trace!(
            "DummyBackend: committed {} connections",
            self.committed.len()
        );
        Ok(())
    }

    fn clear_render_queue(&mut self, node: NodeId, pass: u32) {
        self.pass_mut(node, pass).objects.clear();
    }

    fn queue_render_object(&mut self, node: NodeId, pass: u32, object: RenderObject) {
        self.pass_mut(node, pass).objects.push(object);
    }

    fn set_scissor(&mut self, node: NodeId, pass: u32, region: Vec4) {
        self.pass_mut(node, pass).scissor = Some(region);
    }

    fn set_stencil_reference(&mut self, node: NodeId, pass: u32, reference: Option<u8>) {
        self.pass_mut(node, pass).stencil_reference = reference;
    }

    fn set_transform(&mut self, node: NodeId, pass: u32, transform: Mat4) {
        self.pass_mut(node, pass).transform = Some(transform);
    }

    fn set_material(&mut self, node: NodeId, pass: u32, material: MaterialId) {
        self.pass_mut(node, pass).material = Some(material);
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn update_transforms(&mut self, transforms: &[Mat4]) {
        self.transforms.clear();
        self.transforms.extend_from_slice(transforms);
    }
}

impl ResourceBackend for DummyBackend {
    fn create_geometry(
        &mut self,
        vertices: &[GpuVertex],
        indices: &[u32],
    ) -> GraphicsResult<GeometryId> {
        self.check_resources("geometry")?;
        let id = GeometryId(self.next_id());
        log::trace!(
            "DummyBackend: creating geometry {:?} ({} bytes, {} indices)",
            id,
            GpuVertex::as_bytes(vertices).len(),
            indices.len()
        );
        self.geometries.insert(id, vertices.len());
        Ok(id)
    }

    fn destroy_geometry(&mut self, geometry: GeometryId) {
        self.geometries.remove(&geometry);
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> GraphicsResult<TextureId> {
        self.check_resources("texture")?;
        if pixels.len() < descriptor.byte_size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "expected {} bytes of pixel data, got {}",
                descriptor.byte_size(),
                pixels.len()
            )));
        }
        let id = TextureId(self.next_id());
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{})",
            descriptor.label,
            descriptor.width,
            descriptor.height
        );
        self.textures.insert(id, descriptor.clone());
        Ok(id)
    }

    fn create_render_target(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> GraphicsResult<TextureId> {
        self.check_resources("render target")?;
        let id = TextureId(self.next_id());
        log::trace!(
            "DummyBackend: creating render target {:?} ({}x{})",
            descriptor.label,
            descriptor.width,
            descriptor.height
        );
        self.textures.insert(id, descriptor.clone());
        Ok(id)
    }

    fn resize_render_target(
        &mut self,
        target: TextureId,
        width: u32,
        height: u32,
    ) -> GraphicsResult<()> {
        match self.textures.get_mut(&target) {
            Some(descriptor) => {
                descriptor.width = width;
                descriptor.height = height;
                Ok(())
            }
            None => Err(GraphicsError::InvalidParameter(format!(
                "unknown render target {target:?}"
            ))),
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn create_material(&mut self, descriptor: &MaterialDescriptor) -> GraphicsResult<MaterialId> {
        self.check_resources("material")?;
        let id = MaterialId(self.next_id());
        self.materials.insert(id, descriptor.clone());
        Ok(id)
    }

    fn destroy_material(&mut self, material: MaterialId) {
        self.materials.remove(&material);
    }
}
