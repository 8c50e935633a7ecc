//! The render interface: entry point for the UI layout engine.
//!
//! [`RenderInterface`] receives the UI draw stream between
//! [`begin_frame`](RenderInterface::begin_frame) and
//! [`end_frame`](RenderInterface::end_frame), records it as a
//! [`PassSequence`], and on `end_frame` hands the sequence to the
//! [`GraphBuilder`] which maps it onto engine nodes.
//!
//! # Example
//!
//! ```ignore
//! let mut ui = RenderInterface::new(
//!     RenderConfig::default(),
//!     DummyBackend::new(),
//!     DummyBackend::new(),
//!     output,
//!     background,
//!     (1280, 720),
//! )?;
//! let quad = ui.compile_geometry(&vertices, &[0, 1, 2, 2, 1, 3])?;
//!
//! ui.begin_frame();
//! ui.render_geometry(quad, Vec2::new(10.0, 10.0), None);
//! let stats = ui.end_frame()?;
//! ```

use std::mem;
#[cfg(feature = "texture-loading")]
use std::path::Path;

use uiframe_core::index::{ObjectIndex, ObjectKey};
use uiframe_core::math::{Mat4, Rect, Vec2};
use uiframe_core::pool::ResourcePool;

use crate::backend::{FrameGraphBackend, GeometryId, MaterialId, ResourceBackend, TextureId};
use crate::config::RenderConfig;
use crate::error::{GraphicsError, GraphicsResult};
use crate::filters::{
    Filter, FilterContext, FilterMaker, FilterRegistry, FilterResources, MaskImageFilter,
};
use crate::graph::{
    BlendMode, CompositeOptions, DrawItem, FrameStats, GraphBuilder, LayerHandle, LayerStack,
    Pass, PassKind, PassSequence, PassSettings, RenderToTexturePass,
};
use crate::materials::{MaterialBlend, MaterialCache, MaterialDescriptor, programs};
use crate::params::Dictionary;
use crate::shaders::{ShaderMaker, ShaderRegistry};
use crate::types::{GpuVertex, TextureDescriptor, TextureUsage, Vertex};

/// External target index of the first pooled render target.
const FIRST_POOLED_EXTERNAL: usize = 2;

/// Texture unit sampled by textured geometry.
pub const GEOMETRY_TEXTURE_UNIT: &str = "diffuse";

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(ObjectKey);

        impl $name {
            /// Inert handle; every operation on it is a no-op.
            pub const NULL: Self = Self(ObjectKey::NULL);

            pub fn is_null(self) -> bool {
                self.0.is_null()
            }
        }
    };
}

define_handle!(
    /// Compiled geometry.
    GeometryHandle
);
define_handle!(
    /// Loaded, generated or saved texture.
    TextureHandle
);
define_handle!(
    /// Compiled filter.
    FilterHandle
);
define_handle!(
    /// Compiled shader.
    ShaderHandle
);

/// Clip mask operation of [`RenderInterface::render_to_clip_mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipMaskOperation {
    /// Replace the mask with the geometry.
    Set,
    /// Replace the mask with everything outside the geometry.
    SetInverse,
    /// Intersect the mask with the geometry.
    Intersect,
}

#[derive(Debug, Clone, Copy)]
struct TextureEntry {
    texture: TextureId,
    material: MaterialId,
    dimensions: (u32, u32),
    /// Backed by a pooled render target rather than owned.
    pooled: bool,
}

/// Resource whose release waits until the engine is done with the last frame.
#[derive(Debug)]
enum PendingRelease {
    Geometry(GeometryId),
    Texture(TextureEntry),
    Filter(Box<dyn Filter>),
    Shader(MaterialId),
}

#[derive(Debug, Clone, Copy)]
struct RenderState {
    scissor_enabled: bool,
    scissor_region: Rect,
    clip_mask_enabled: bool,
    stencil_ref: u8,
    transform: Option<Mat4>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            scissor_enabled: false,
            scissor_region: Rect::default(),
            clip_mask_enabled: false,
            stencil_ref: 1,
            transform: None,
        }
    }
}

/// Translates UI draw calls into the engine's frame graph.
///
/// `G` is the engine's node graph and `R` creates its resources. Both are
/// owned by the interface for its whole lifetime; every resource still
/// alive when the interface is dropped is destroyed through `R`.
pub struct RenderInterface<G: FrameGraphBackend, R: ResourceBackend> {
    config: RenderConfig,
    graph: G,
    resources: R,

    builder: GraphBuilder,
    seq: PassSequence,
    layers: LayerStack,
    state: RenderState,
    in_frame: bool,

    materials: MaterialCache,
    filter_registry: FilterRegistry,
    shader_registry: ShaderRegistry,

    geometries: ObjectIndex<GeometryId>,
    textures: ObjectIndex<TextureEntry>,
    filters: ObjectIndex<Box<dyn Filter>>,
    shaders: ObjectIndex<MaterialId>,

    render_targets: ResourcePool<TextureId>,
    pending: Vec<PendingRelease>,
    released_targets: Vec<TextureId>,

    output: TextureId,
    background: TextureId,
    viewport: (u32, u32),
    untextured: MaterialId,
    composite: MaterialId,
    copy: MaterialId,
}

impl<G: FrameGraphBackend, R: ResourceBackend> RenderInterface<G, R> {
    /// Create the interface.
    ///
    /// `output` receives the composed UI and `background` is the image the
    /// root layer starts from. The built-in materials and the initial
    /// render targets are created here.
    pub fn new(
        config: RenderConfig,
        graph: G,
        mut resources: R,
        output: TextureId,
        background: TextureId,
        viewport: (u32, u32),
    ) -> GraphicsResult<Self> {
        uiframe_core::profile_function!();

        let mut materials = MaterialCache::new();
        let untextured =
            materials.acquire(MaterialDescriptor::new(programs::UNLIT), &mut resources)?;
        let composite =
            materials.acquire(MaterialDescriptor::new(programs::COMPOSITE), &mut resources)?;
        let copy = materials.acquire(
            MaterialDescriptor::new(programs::COPY).with_blend(MaterialBlend::Replace),
            &mut resources,
        )?;

        let mut ui = Self {
            builder: GraphBuilder::new(config.node_prefix.clone(), config.max_primary_channels),
            seq: PassSequence::new(),
            layers: LayerStack::new(config.elide_redundant_copies),
            state: RenderState::default(),
            in_frame: false,
            materials,
            filter_registry: FilterRegistry::with_builtin(),
            shader_registry: ShaderRegistry::with_builtin(),
            geometries: ObjectIndex::new(),
            textures: ObjectIndex::new(),
            filters: ObjectIndex::new(),
            shaders: ObjectIndex::new(),
            render_targets: ResourcePool::new(),
            pending: Vec::new(),
            released_targets: Vec::new(),
            output,
            background,
            viewport: (viewport.0.max(1), viewport.1.max(1)),
            untextured,
            composite,
            copy,
            graph,
            resources,
            config,
        };

        let descriptor = ui.render_target_descriptor();
        let prefix = &ui.config.node_prefix;
        let resources = &mut ui.resources;
        ui.render_targets
            .try_reserve(ui.config.initial_render_targets, |slot| {
                resources.create_render_target(
                    &descriptor.clone().with_label(format!("{prefix}/SavedLayer{slot}")),
                )
            })?;

        log::info!(
            "RenderInterface: {}x{} viewport, {} render targets, node prefix {:?}",
            ui.viewport.0,
            ui.viewport.1,
            ui.render_targets.size(),
            ui.config.node_prefix
        );
        Ok(ui)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The engine node graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// The engine resource port.
    pub fn resources(&self) -> &R {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut R {
        &mut self.resources
    }

    /// Passes recorded so far in the current frame.
    pub fn sequence(&self) -> &PassSequence {
        &self.seq
    }

    pub fn builder(&self) -> &GraphBuilder {
        &self.builder
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    /// Render targets backing saved layers.
    pub fn render_targets(&self) -> &ResourcePool<TextureId> {
        &self.render_targets
    }

    /// Number of pushed layers plus the root.
    pub fn layer_depth(&self) -> usize {
        self.layers.depth()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Set the size of the output in pixels.
    ///
    /// Saved layers claimed afterwards are resized to the new viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        log::debug!("RenderInterface: viewport {width}x{height}");
        self.viewport = (width.max(1), height.max(1));
    }

    /// Add or replace a filter maker.
    pub fn register_filter_maker(
        &mut self,
        name: impl Into<String>,
        maker: impl FilterMaker + 'static,
    ) {
        self.filter_registry.register(name, maker);
    }

    /// Add or replace a shader maker.
    pub fn register_shader_maker(
        &mut self,
        name: impl Into<String>,
        maker: impl ShaderMaker + 'static,
    ) {
        self.shader_registry.register(name, maker);
    }

    // ---------------------------------------------------------------------
    // Frame
    // ---------------------------------------------------------------------

    /// Start recording a frame.
    ///
    /// Resources released since the previous `begin_frame` are destroyed
    /// first. Scissor, clip mask and transform start out disabled.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already being recorded.
    pub fn begin_frame(&mut self) {
        assert!(!self.in_frame, "begin_frame called twice without end_frame");
        self.flush_releases();
        self.in_frame = true;
        self.state = RenderState::default();
        self.seq.clear();
        self.layers.reset();
    }

    /// Build the engine graph for the recorded frame.
    ///
    /// The engine renders the committed graph after this returns, so
    /// releases stay queued until the next `begin_frame`.
    ///
    /// # Panics
    ///
    /// Panics if no frame is being recorded.
    pub fn end_frame(&mut self) -> GraphicsResult<FrameStats> {
        uiframe_core::profile_function!();
        assert!(self.in_frame, "end_frame called without begin_frame");

        if self.layers.depth() > 1 {
            log::warn!(
                "RenderInterface: {} layers still pushed at end of frame",
                self.layers.depth() - 1
            );
        }

        let mut externals =
            Vec::with_capacity(FIRST_POOLED_EXTERNAL + self.render_targets.size());
        externals.push(self.output);
        externals.push(self.background);
        externals.extend_from_slice(self.render_targets.resources());

        let result = self
            .builder
            .populate(&mut self.graph, &self.seq, &externals, self.viewport);

        self.seq.clear();
        self.layers.reset();
        self.in_frame = false;
        uiframe_core::frame_mark!();

        if let Ok(stats) = &result {
            log::debug!(
                "RenderInterface: frame with {} nodes, {} render objects, {} side links{}",
                stats.active_nodes,
                stats.render_objects,
                stats.side_links,
                if stats.rebuilt { " (rebuilt)" } else { "" }
            );
        }
        result
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    pub fn compile_geometry(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> GraphicsResult<GeometryHandle> {
        let geometry = self
            .resources
            .create_geometry(&GpuVertex::convert(vertices), indices)?;
        Ok(GeometryHandle(self.geometries.insert(geometry)))
    }

    /// Release compiled geometry.
    ///
    /// The engine resources are destroyed at the next `begin_frame`, after the
    /// last submitted frame has been rendered.
    ///
    /// # Panics
    ///
    /// Panics if `geometry` was already released.
    pub fn release_geometry(&mut self, geometry: GeometryHandle) {
        if geometry.is_null() {
            return;
        }
        match self.geometries.remove(geometry.0) {
            Some(id) => self.release(PendingRelease::Geometry(id)),
            None => panic!("release of stale geometry handle {geometry:?}"),
        }
    }

    /// Draw `geometry` at `translation`, sampling `texture` if given.
    ///
    /// # Panics
    ///
    /// Panics on stale handles.
    pub fn render_geometry(
        &mut self,
        geometry: GeometryHandle,
        translation: Vec2,
        texture: Option<TextureHandle>,
    ) {
        if geometry.is_null() {
            return;
        }
        let material = match texture {
            Some(texture) if !texture.is_null() => self.textures[texture.0].material,
            _ => self.untextured,
        };
        let kind = if self.state.clip_mask_enabled {
            PassKind::RenderWithClipMask
        } else {
            PassKind::Render
        };
        self.queue_draw(kind, geometry, translation, material);
    }

    fn queue_draw(
        &mut self,
        kind: PassKind,
        geometry: GeometryHandle,
        translation: Vec2,
        material: MaterialId,
    ) {
        let item = DrawItem {
            geometry: self.geometries[geometry.0],
            translation,
            material,
        };
        let settings = self.current_settings();
        self.seq.queue_draw(kind, &settings, item);
    }

    // ---------------------------------------------------------------------
    // Textures
    // ---------------------------------------------------------------------

    /// Load and premultiply an image file.
    ///
    /// Returns the texture and its size in pixels.
    #[cfg(feature = "texture-loading")]
    pub fn load_texture(
        &mut self,
        path: impl AsRef<Path>,
    ) -> GraphicsResult<(TextureHandle, (u32, u32))> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        let dimensions = image.dimensions();
        let mut pixels = image.into_raw();
        premultiply_alpha(&mut pixels);
        log::debug!(
            "RenderInterface: loaded {} ({}x{})",
            path.display(),
            dimensions.0,
            dimensions.1
        );
        let texture = self.generate_texture(&pixels, dimensions)?;
        Ok((texture, dimensions))
    }

    /// Create a texture from premultiplied RGBA8 pixels.
    pub fn generate_texture(
        &mut self,
        pixels: &[u8],
        dimensions: (u32, u32),
    ) -> GraphicsResult<TextureHandle> {
        let (width, height) = dimensions;
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "{width}x{height} texture needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        let descriptor = TextureDescriptor::new_2d(
            width,
            height,
            self.config.texture_format,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        );
        let texture = self.resources.create_texture(&descriptor, pixels)?;
        let material = match self
            .materials
            .acquire(textured_material(texture), &mut self.resources)
        {
            Ok(material) => material,
            Err(err) => {
                self.resources.destroy_texture(texture);
                return Err(err);
            }
        };
        Ok(TextureHandle(self.textures.insert(TextureEntry {
            texture,
            material,
            dimensions,
            pooled: false,
        })))
    }

    /// Size of `texture` in pixels, `None` for inert or stale handles.
    pub fn texture_dimensions(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture.0).map(|entry| entry.dimensions)
    }

    /// Release a texture.
    ///
    /// The engine resources are destroyed at the next `begin_frame`, after the
    /// last submitted frame has been rendered.
    ///
    /// Textures of saved layers return their render target to the pool.
    ///
    /// # Panics
    ///
    /// Panics if `texture` was already released.
    pub fn release_texture(&mut self, texture: TextureHandle) {
        if texture.is_null() {
            return;
        }
        match self.textures.remove(texture.0) {
            Some(entry) => self.release(PendingRelease::Texture(entry)),
            None => panic!("release of stale texture handle {texture:?}"),
        }
    }

    // ---------------------------------------------------------------------
    // Render state
    // ---------------------------------------------------------------------

    /// Enable or disable the scissor. The region is kept while disabled.
    pub fn enable_scissor(&mut self, enable: bool) {
        self.state.scissor_enabled = enable;
    }

    /// Scissor region in viewport pixels.
    pub fn set_scissor_region(&mut self, region: Rect) {
        self.state.scissor_region = region;
    }

    /// Transform applied to following draws, `None` for identity.
    pub fn set_transform(&mut self, transform: Option<Mat4>) {
        self.state.transform = transform;
    }

    pub fn enable_clip_mask(&mut self, enable: bool) {
        self.state.clip_mask_enabled = enable;
    }

    /// Render `geometry` into the clip mask.
    pub fn render_to_clip_mask(
        &mut self,
        operation: ClipMaskOperation,
        geometry: GeometryHandle,
        translation: Vec2,
    ) {
        if geometry.is_null() {
            return;
        }
        let kind = match operation {
            ClipMaskOperation::Set => {
                self.state.stencil_ref = 1;
                PassKind::ClipMaskSet
            }
            ClipMaskOperation::SetInverse => {
                self.state.stencil_ref = 1;
                PassKind::ClipMaskSetInverse
            }
            ClipMaskOperation::Intersect => PassKind::ClipMaskIntersect,
        };

        let item = DrawItem {
            geometry: self.geometries[geometry.0],
            translation,
            material: self.untextured,
        };
        let settings = PassSettings {
            stencil_ref: Some(self.state.stencil_ref),
            ..self.current_settings()
        };
        self.seq.queue_draw(kind, &settings, item);

        if operation == ClipMaskOperation::Intersect {
            self.state.stencil_ref = match self.state.stencil_ref.checked_add(1) {
                Some(next) => next,
                None => {
                    log::warn!("RenderInterface: clip mask intersected more than 255 times");
                    u8::MAX
                }
            };
        }
    }

    fn current_settings(&self) -> PassSettings {
        PassSettings {
            scissor: self
                .state
                .scissor_enabled
                .then_some(self.state.scissor_region),
            stencil_ref: self
                .state
                .clip_mask_enabled
                .then_some(self.state.stencil_ref),
            transform: self.state.transform,
        }
    }

    /// Settings of full-screen passes; they ignore the UI transform.
    fn screen_settings(&self) -> PassSettings {
        PassSettings {
            transform: None,
            ..self.current_settings()
        }
    }

    // ---------------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------------

    /// Push a transparent layer; following draws go into it.
    pub fn push_layer(&mut self) -> LayerHandle {
        self.layers.push(&mut self.seq)
    }

    /// Composite `source` into `destination` through `filters`.
    ///
    /// Inert filter handles are skipped. When source and destination are
    /// the same layer the filters are applied to it in place.
    ///
    /// # Panics
    ///
    /// Panics if a layer has been popped or a filter handle is stale.
    pub fn composite_layers(
        &mut self,
        source: LayerHandle,
        destination: LayerHandle,
        blend: BlendMode,
        filters: &[FilterHandle],
    ) {
        let settings = self.screen_settings();
        let options = CompositeOptions {
            material: match blend {
                BlendMode::Normal => self.composite,
                BlendMode::Replace => self.copy,
            },
            settings,
        };

        let filters: Vec<&dyn Filter> = filters
            .iter()
            .filter(|handle| !handle.is_null())
            .map(|handle| self.filters[handle.0].as_ref())
            .collect();
        self.layers.composite(
            &mut self.seq,
            source,
            destination,
            &options,
            !filters.is_empty(),
            |seq| {
                let mut ctx = FilterContext::new(seq, settings);
                for filter in &filters {
                    filter.apply(&mut ctx);
                }
            },
        );
    }

    /// Pop the top layer.
    ///
    /// # Panics
    ///
    /// Panics when only the root layer is left.
    pub fn pop_layer(&mut self) {
        self.layers.pop(&mut self.seq);
    }

    /// Copy the top layer into a pooled render target and return it as a texture.
    pub fn save_layer_as_texture(&mut self) -> GraphicsResult<TextureHandle> {
        let (target, slot) = self.claim_render_target()?;
        let material = match self
            .materials
            .acquire(textured_material(target), &mut self.resources)
        {
            Ok(material) => material,
            Err(err) => {
                self.render_targets.free(&target);
                return Err(err);
            }
        };
        self.record_save(slot);
        Ok(TextureHandle(self.textures.insert(TextureEntry {
            texture: target,
            material,
            dimensions: self.viewport,
            pooled: true,
        })))
    }

    /// Copy the top layer into a pooled render target and return a filter
    /// masking layers with it.
    pub fn save_layer_as_mask_image(&mut self) -> GraphicsResult<FilterHandle> {
        let (target, slot) = self.claim_render_target()?;
        let mut res = FilterResources {
            materials: &mut self.materials,
            backend: &mut self.resources,
            released_targets: &mut self.released_targets,
        };
        let filter = match MaskImageFilter::make(target, &mut res) {
            Ok(filter) => filter,
            Err(err) => {
                self.render_targets.free(&target);
                return Err(err);
            }
        };
        self.record_save(slot);
        Ok(FilterHandle(self.filters.insert(Box::new(filter))))
    }

    fn record_save(&mut self, slot: usize) {
        let settings = PassSettings {
            stencil_ref: None,
            ..self.screen_settings()
        };
        self.seq.add_pass(Pass::RenderToTexture(RenderToTexturePass {
            external: FIRST_POOLED_EXTERNAL + slot,
            settings,
        }));
    }

    fn render_target_descriptor(&self) -> TextureDescriptor {
        TextureDescriptor::new_2d(
            self.viewport.0,
            self.viewport.1,
            self.config.render_target_format,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
    }

    /// Claim a render target sized to the viewport, growing the pool if needed.
    fn claim_render_target(&mut self) -> GraphicsResult<(TextureId, usize)> {
        let descriptor = self.render_target_descriptor();
        let prefix = &self.config.node_prefix;
        let resources = &mut self.resources;
        let (target, slot) = self.render_targets.try_claim(|slot| {
            resources.create_render_target(
                &descriptor.clone().with_label(format!("{prefix}/SavedLayer{slot}")),
            )
        })?;
        let (width, height) = self.viewport;
        if let Err(err) = self.resources.resize_render_target(target, width, height) {
            self.render_targets.free(&target);
            return Err(err);
        }
        Ok((target, slot))
    }

    // ---------------------------------------------------------------------
    // Filters and shaders
    // ---------------------------------------------------------------------

    /// Compile filter `name`. Unknown names give [`FilterHandle::NULL`].
    pub fn compile_filter(
        &mut self,
        name: &str,
        params: &Dictionary,
    ) -> GraphicsResult<FilterHandle> {
        let mut res = FilterResources {
            materials: &mut self.materials,
            backend: &mut self.resources,
            released_targets: &mut self.released_targets,
        };
        match self.filter_registry.make(name, params, &mut res)? {
            Some(filter) => Ok(FilterHandle(self.filters.insert(filter))),
            None => {
                log::warn!("RenderInterface: unknown filter {name:?}");
                Ok(FilterHandle::NULL)
            }
        }
    }

    /// Release a filter.
    ///
    /// The engine resources are destroyed at the next `begin_frame`, after the
    /// last submitted frame has been rendered.
    ///
    /// # Panics
    ///
    /// Panics if `filter` was already released.
    pub fn release_filter(&mut self, filter: FilterHandle) {
        if filter.is_null() {
            return;
        }
        match self.filters.remove(filter.0) {
            Some(compiled) => self.release(PendingRelease::Filter(compiled)),
            None => panic!("release of stale filter handle {filter:?}"),
        }
    }

    /// Compile shader `name`. Unknown names give [`ShaderHandle::NULL`].
    pub fn compile_shader(
        &mut self,
        name: &str,
        params: &Dictionary,
    ) -> GraphicsResult<ShaderHandle> {
        let Some(descriptor) = self.shader_registry.make(name, params) else {
            log::warn!("RenderInterface: unknown shader {name:?}");
            return Ok(ShaderHandle::NULL);
        };
        let material = self.materials.acquire(descriptor, &mut self.resources)?;
        Ok(ShaderHandle(self.shaders.insert(material)))
    }

    /// Draw `geometry` with the material of `shader`.
    ///
    /// The built-in gradients do not sample a texture, so `_texture` only
    /// matters to engine shaders registered by the application.
    ///
    /// # Panics
    ///
    /// Panics on stale handles.
    pub fn render_shader(
        &mut self,
        shader: ShaderHandle,
        geometry: GeometryHandle,
        translation: Vec2,
        _texture: Option<TextureHandle>,
    ) {
        if shader.is_null() || geometry.is_null() {
            return;
        }
        let material = self.shaders[shader.0];
        let kind = if self.state.clip_mask_enabled {
            PassKind::RenderWithClipMask
        } else {
            PassKind::Render
        };
        self.queue_draw(kind, geometry, translation, material);
    }

    /// Release a shader.
    ///
    /// The engine resources are destroyed at the next `begin_frame`, after the
    /// last submitted frame has been rendered.
    ///
    /// # Panics
    ///
    /// Panics if `shader` was already released.
    pub fn release_shader(&mut self, shader: ShaderHandle) {
        if shader.is_null() {
            return;
        }
        match self.shaders.remove(shader.0) {
            Some(material) => self.release(PendingRelease::Shader(material)),
            None => panic!("release of stale shader handle {shader:?}"),
        }
    }

    // ---------------------------------------------------------------------
    // Releases
    // ---------------------------------------------------------------------

    /// Number of releases waiting for the next `begin_frame`.
    pub fn pending_releases(&self) -> usize {
        self.pending.len()
    }

    fn release(&mut self, release: PendingRelease) {
        self.pending.push(release);
    }

    fn flush_releases(&mut self) {
        if !self.pending.is_empty() {
            log::trace!("RenderInterface: {} deferred releases", self.pending.len());
        }
        for release in mem::take(&mut self.pending) {
            self.release_now(release);
        }
    }

    fn release_now(&mut self, release: PendingRelease) {
        match release {
            PendingRelease::Geometry(id) => self.resources.destroy_geometry(id),
            PendingRelease::Texture(entry) => {
                self.materials.release(entry.material, &mut self.resources);
                if entry.pooled {
                    self.render_targets.free(&entry.texture);
                } else {
                    self.resources.destroy_texture(entry.texture);
                }
            }
            PendingRelease::Filter(filter) => {
                filter.release(&mut FilterResources {
                    materials: &mut self.materials,
                    backend: &mut self.resources,
                    released_targets: &mut self.released_targets,
                });
            }
            PendingRelease::Shader(material) => {
                self.materials.release(material, &mut self.resources);
            }
        }
        for target in self.released_targets.drain(..) {
            self.render_targets.free(&target);
        }
    }
}

impl<G: FrameGraphBackend, R: ResourceBackend> Drop for RenderInterface<G, R> {
    fn drop(&mut self) {
        self.flush_releases();
        for id in self.geometries.drain() {
            self.release_now(PendingRelease::Geometry(id));
        }
        for entry in self.textures.drain() {
            self.release_now(PendingRelease::Texture(entry));
        }
        for filter in self.filters.drain() {
            self.release_now(PendingRelease::Filter(filter));
        }
        for material in self.shaders.drain() {
            self.release_now(PendingRelease::Shader(material));
        }
        self.materials.clear(&mut self.resources);
        for target in self.render_targets.resources() {
            self.resources.destroy_texture(*target);
        }
    }
}

/// Material drawing geometry textured with `texture`.
fn textured_material(texture: TextureId) -> MaterialDescriptor {
    MaterialDescriptor::new(programs::TEXTURED).with_texture(GEOMETRY_TEXTURE_UNIT, texture)
}

/// Multiply the colour channels of RGBA8 pixels by their alpha.
#[cfg(feature = "texture-loading")]
fn premultiply_alpha(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        for channel in &mut pixel[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::params::Variant;

    type TestInterface = RenderInterface<DummyBackend, DummyBackend>;

    fn interface() -> TestInterface {
        RenderInterface::new(
            RenderConfig::default().with_initial_render_targets(1),
            DummyBackend::new(),
            DummyBackend::new(),
            TextureId(1000),
            TextureId(1001),
            (64, 32),
        )
        .unwrap()
    }

    fn triangle(ui: &mut TestInterface) -> GeometryHandle {
        let vertices = [
            Vertex::new([0.0, 0.0], [255, 0, 0, 255], [0.0, 0.0]),
            Vertex::new([8.0, 0.0], [255, 0, 0, 255], [1.0, 0.0]),
            Vertex::new([0.0, 8.0], [255, 0, 0, 255], [0.0, 1.0]),
        ];
        ui.compile_geometry(&vertices, &[0, 1, 2]).unwrap()
    }

    #[test]
    fn test_builtin_materials_created() {
        let ui = interface();
        assert_eq!(ui.materials().len(), 3);
        assert_eq!(ui.resources().live_material_count(), 3);
        assert_eq!(ui.render_targets().size(), 1);
    }

    #[test]
    fn test_scissor_region_survives_disable() {
        let mut ui = interface();
        let geometry = triangle(&mut ui);
        let region = Rect::from_xywh(4, 4, 16, 8);

        ui.begin_frame();
        ui.set_scissor_region(region);
        ui.enable_scissor(true);
        ui.render_geometry(geometry, Vec2::zeros(), None);
        ui.enable_scissor(false);
        ui.render_geometry(geometry, Vec2::zeros(), None);
        ui.enable_scissor(true);
        ui.render_geometry(geometry, Vec2::zeros(), None);

        let scissors: Vec<_> = ui
            .sequence()
            .passes()
            .iter()
            .map(|pass| pass.settings().and_then(|s| s.scissor))
            .collect();
        assert_eq!(scissors, vec![Some(region), None, Some(region)]);
        ui.end_frame().unwrap();
    }

    #[test]
    fn test_clip_mask_references() {
        let mut ui = interface();
        let geometry = triangle(&mut ui);

        ui.begin_frame();
        ui.enable_clip_mask(true);
        ui.render_to_clip_mask(ClipMaskOperation::Set, geometry, Vec2::zeros());
        ui.render_to_clip_mask(ClipMaskOperation::Intersect, geometry, Vec2::zeros());
        ui.render_geometry(geometry, Vec2::zeros(), None);
        ui.render_to_clip_mask(ClipMaskOperation::SetInverse, geometry, Vec2::zeros());
        ui.render_geometry(geometry, Vec2::zeros(), None);

        let recorded: Vec<_> = ui
            .sequence()
            .passes()
            .iter()
            .map(|pass| (pass.kind(), pass.settings().and_then(|s| s.stencil_ref)))
            .collect();
        assert_eq!(
            recorded,
            vec![
                (PassKind::ClipMaskSet, Some(1)),
                (PassKind::ClipMaskIntersect, Some(1)),
                (PassKind::RenderWithClipMask, Some(2)),
                (PassKind::ClipMaskSetInverse, Some(1)),
                (PassKind::RenderWithClipMask, Some(1)),
            ]
        );
        ui.end_frame().unwrap();
    }

    #[test]
    fn test_textured_draw_uses_texture_material() {
        let mut ui = interface();
        let geometry = triangle(&mut ui);
        let texture = ui.generate_texture(&[255; 16], (2, 2)).unwrap();
        assert_eq!(ui.texture_dimensions(texture), Some((2, 2)));

        ui.begin_frame();
        ui.render_geometry(geometry, Vec2::zeros(), Some(texture));
        let material = ui.sequence().passes()[0].draw_batch().unwrap().items[0].material;
        let descriptor = ui.materials().descriptor(material).unwrap();
        assert_eq!(descriptor.program, programs::TEXTURED);
        ui.end_frame().unwrap();
    }

    #[test]
    fn test_generate_texture_validates_size() {
        let mut ui = interface();
        let err = ui.generate_texture(&[0; 15], (2, 2)).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        assert!(ui.generate_texture(&[], (0, 0)).is_err());
    }

    #[test]
    fn test_null_handles_are_inert() {
        let mut ui = interface();
        ui.begin_frame();
        ui.render_geometry(GeometryHandle::NULL, Vec2::zeros(), None);
        ui.render_shader(ShaderHandle::NULL, GeometryHandle::NULL, Vec2::zeros(), None);
        ui.release_filter(FilterHandle::NULL);
        ui.release_texture(TextureHandle::NULL);
        assert!(ui.sequence().is_empty());
        ui.end_frame().unwrap();
    }

    #[test]
    fn test_unknown_filter_is_null() {
        let mut ui = interface();
        let filter = ui.compile_filter("glow", &Dictionary::new()).unwrap();
        assert!(filter.is_null());
        let shader = ui
            .compile_shader("noise", &Dictionary::new().with("seed", Variant::Int(3)))
            .unwrap();
        assert!(shader.is_null());
    }

    #[test]
    #[should_panic(expected = "stale geometry handle")]
    fn test_double_release_panics() {
        let mut ui = interface();
        let geometry = triangle(&mut ui);
        ui.release_geometry(geometry);
        ui.release_geometry(geometry);
    }

    #[test]
    #[should_panic(expected = "begin_frame called twice")]
    fn test_nested_frames_panic() {
        let mut ui = interface();
        ui.begin_frame();
        ui.begin_frame();
    }

    #[test]
    fn test_releases_wait_for_next_frame() {
        let mut ui = interface();
        let geometry = triangle(&mut ui);
        let texture = ui.generate_texture(&[0; 4], (1, 1)).unwrap();
        let filter = ui
            .compile_filter("blur", &Dictionary::new().with("sigma", Variant::Float(2.0)))
            .unwrap();
        assert_eq!(ui.resources().live_geometry_count(), 1);

        ui.release_geometry(geometry);
        ui.release_texture(texture);
        ui.release_filter(filter);
        assert_eq!(ui.pending_releases(), 3);
        assert_eq!(ui.resources().live_geometry_count(), 1);

        ui.begin_frame();
        assert_eq!(ui.pending_releases(), 0);
        assert_eq!(ui.resources().live_geometry_count(), 0);
        // Only the built-in materials remain.
        assert_eq!(ui.materials().len(), 3);
        assert_eq!(ui.resources().live_texture_count(), 1);
        ui.end_frame().unwrap();
    }

    #[cfg(feature = "texture-loading")]
    #[test]
    fn test_premultiply_alpha() {
        let mut pixels = [200, 100, 50, 128, 10, 20, 30, 255, 90, 90, 90, 0];
        premultiply_alpha(&mut pixels);
        assert_eq!(pixels, [100, 50, 25, 128, 10, 20, 30, 255, 0, 0, 0, 0]);
    }
}
