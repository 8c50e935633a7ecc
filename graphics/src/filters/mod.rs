//! Post-process filters applied while compositing layers.
//!
//! A [`Filter`] records passes that run on the layer currently on the
//! primary chain. Filters are compiled once from a name and a parameter
//! [`Dictionary`] by the matching [`FilterMaker`] in the [`FilterRegistry`],
//! and hold engine materials until they are released.
//!
//! | Name | Parameters |
//! |------|------------|
//! | `blur` | `sigma` |
//! | `drop-shadow` | `sigma`, `color`, `offset` |
//! | `opacity` | `value` |
//! | `brightness`, `contrast`, `invert`, `grayscale`, `sepia`, `hue-rotate`, `saturate` | `value` |
//!
//! Mask images are not made by name; they wrap a saved layer, see
//! [`MaskImageFilter`].

mod blur;
mod colour_matrix;
mod drop_shadow;
mod single;

pub use blur::{BlurFilter, BlurFilterMaker};
pub use colour_matrix::{ColourMatrixFilterMaker, ColourMatrixKind};
pub use drop_shadow::{DropShadowFilter, DropShadowFilterMaker};
pub use single::{MaskImageFilter, OpacityFilterMaker, SingleMaterialFilter};

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::backend::{MaterialId, ResourceBackend, TextureId};
use crate::error::GraphicsResult;
use crate::graph::{ConnectionId, Pass, PassSequence, PassSettings, QuadPass};
use crate::materials::{MaterialCache, MaterialDescriptor};
use crate::params::Dictionary;

/// Recording access for [`Filter::apply`].
pub struct FilterContext<'a> {
    seq: &'a mut PassSequence,
    settings: PassSettings,
}

impl<'a> FilterContext<'a> {
    /// `settings` are the render settings current when the filter is applied.
    pub fn new(seq: &'a mut PassSequence, settings: PassSettings) -> Self {
        Self { seq, settings }
    }

    pub fn settings(&self) -> PassSettings {
        self.settings
    }

    pub fn add_pass(&mut self, pass: Pass) -> usize {
        self.seq.add_pass(pass)
    }

    /// Record a full-screen quad with `material` over the current layer.
    pub fn render_quad(&mut self, material: MaterialId, settings: PassSettings) {
        self.seq
            .add_pass(Pass::RenderQuad(QuadPass { material, settings }));
    }

    pub fn add_connection(&mut self) -> ConnectionId {
        self.seq.add_connection()
    }

    pub fn acquire_layer_buffer(&mut self) -> ConnectionId {
        self.seq.acquire_layer_buffer()
    }

    pub fn release_layer_buffer(&mut self, id: ConnectionId) {
        self.seq.release_layer_buffer(id);
    }
}

/// Engine resources available to makers and to [`Filter::release`].
pub struct FilterResources<'a> {
    pub materials: &'a mut MaterialCache,
    pub backend: &'a mut dyn ResourceBackend,
    /// Render targets to hand back to the render target pool.
    pub released_targets: &'a mut Vec<TextureId>,
}

impl FilterResources<'_> {
    pub fn acquire_material(&mut self, descriptor: MaterialDescriptor) -> GraphicsResult<MaterialId> {
        self.materials.acquire(descriptor, &mut *self.backend)
    }

    pub fn release_material(&mut self, material: MaterialId) {
        self.materials.release(material, &mut *self.backend);
    }
}

/// A compiled filter.
pub trait Filter: Debug {
    /// Record the filter's passes over the layer on the primary chain.
    fn apply(&self, ctx: &mut FilterContext<'_>);

    /// Release the engine resources held by the filter.
    fn release(&self, res: &mut FilterResources<'_>);
}

/// Compiles filters of one kind from parameters.
pub trait FilterMaker {
    fn make(&self, params: &Dictionary, res: &mut FilterResources<'_>)
    -> GraphicsResult<Box<dyn Filter>>;
}

/// Filter makers by name.
pub struct FilterRegistry {
    makers: BTreeMap<String, Box<dyn FilterMaker>>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl FilterRegistry {
    /// Registry without any maker.
    pub fn empty() -> Self {
        Self {
            makers: BTreeMap::new(),
        }
    }

    /// Registry with every built-in filter.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("blur", BlurFilterMaker);
        registry.register("drop-shadow", DropShadowFilterMaker);
        registry.register("opacity", OpacityFilterMaker);
        for kind in ColourMatrixKind::ALL {
            registry.register(kind.name(), ColourMatrixFilterMaker(kind));
        }
        registry
    }

    /// Register `maker` under `name`, replacing any previous maker.
    pub fn register(&mut self, name: impl Into<String>, maker: impl FilterMaker + 'static) {
        self.makers.insert(name.into(), Box::new(maker));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.makers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.makers.keys().map(String::as_str)
    }

    /// Compile a filter. Returns `Ok(None)` for unknown names.
    pub fn make(
        &self,
        name: &str,
        params: &Dictionary,
        res: &mut FilterResources<'_>,
    ) -> GraphicsResult<Option<Box<dyn Filter>>> {
        match self.makers.get(name) {
            Some(maker) => maker.make(params, res).map(Some),
            None => Ok(None),
        }
    }
}

impl Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("makers", &self.makers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::backend::DummyBackend;

    /// Backend, cache and target list for building [`FilterResources`].
    #[derive(Default)]
    pub struct Resources {
        pub backend: DummyBackend,
        pub materials: MaterialCache,
        pub targets: Vec<TextureId>,
    }

    impl Resources {
        pub fn get(&mut self) -> FilterResources<'_> {
            FilterResources {
                materials: &mut self.materials,
                backend: &mut self.backend,
                released_targets: &mut self.targets,
            }
        }
    }
}
