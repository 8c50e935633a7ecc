//! Material descriptors and the reference-counted material cache.
//!
//! A material is fully described by its [`MaterialDescriptor`]: the shader
//! program, blend state, bound textures and uniform parameters. Two equal
//! descriptors describe the same visual state, so the [`MaterialCache`]
//! creates one engine material per distinct descriptor and counts references
//! to it. The engine material is destroyed when the last reference is
//! released.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use uiframe_core::math::{Mat4, Vec2, Vec4};

use crate::backend::{MaterialId, ResourceBackend, TextureId};
use crate::error::GraphicsResult;

/// Engine program names used by the built-in materials.
pub mod programs {
    /// Untextured UI geometry.
    pub const UNLIT: &str = "Rml/Unlit";
    /// Textured UI geometry.
    pub const TEXTURED: &str = "Rml/Textured";
    /// Non-blending full-screen copy, used for `Replace` compositing.
    pub const COPY: &str = "Rml/Copy";
    /// Premultiplied alpha composite of one layer over another.
    pub const COMPOSITE: &str = "Rml/Composite";
    pub const HALFSAMPLE: &str = "Rml/Halfsample";
    pub const BLUR: &str = "Rml/Blur";
    pub const SHADOW: &str = "Rml/Shadow";
    pub const BLURLESS_SHADOW: &str = "Rml/BlurlessShadow";
    pub const OPACITY: &str = "Rml/Opacity";
    pub const COLOUR_MATRIX: &str = "Rml/ColourMatrix";
    pub const MASK: &str = "Rml/Mask";
    pub const GRADIENT: &str = "Rml/Gradient";
}

/// Uniform value attached to a material.
///
/// Floats compare and hash by bit pattern so descriptors can key a map.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec4(Vec4),
    Mat4(Mat4),
    Floats(Vec<f32>),
}

impl ParamValue {
    fn floats(&self) -> &[f32] {
        match self {
            Self::Int(_) => &[],
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v.as_slice(),
            Self::Vec4(v) => v.as_slice(),
            Self::Mat4(m) => m.as_slice(),
            Self::Floats(v) => v,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec4(_) => 3,
            Self::Mat4(_) => 4,
            Self::Floats(_) => 5,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => {
                self.tag() == other.tag()
                    && self.floats().len() == other.floats().len()
                    && self
                        .floats()
                        .iter()
                        .zip(other.floats())
                        .all(|(a, b)| a.to_bits() == b.to_bits())
            }
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        if let Self::Int(v) = self {
            v.hash(state);
        }
        for v in self.floats() {
            v.to_bits().hash(state);
        }
    }
}

/// Blend state of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialBlend {
    /// Premultiplied alpha blending.
    #[default]
    Premultiplied,
    /// Overwrite the destination.
    Replace,
}

/// Complete visual state of a material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialDescriptor {
    pub program: Cow<'static, str>,
    pub blend: MaterialBlend,
    /// Textures bound by unit name.
    pub textures: Vec<(Cow<'static, str>, TextureId)>,
    /// Uniform parameters by name, in declaration order.
    pub params: Vec<(Cow<'static, str>, ParamValue)>,
}

impl MaterialDescriptor {
    pub fn new(program: impl Into<Cow<'static, str>>) -> Self {
        Self {
            program: program.into(),
            blend: MaterialBlend::default(),
            textures: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn with_blend(mut self, blend: MaterialBlend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_texture(mut self, unit: impl Into<Cow<'static, str>>, texture: TextureId) -> Self {
        self.textures.push((unit.into(), texture));
        self
    }

    pub fn with_param(mut self, name: impl Into<Cow<'static, str>>, value: ParamValue) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Hash of the visual state.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug)]
struct CachedMaterial {
    id: MaterialId,
    refs: usize,
}

/// Deduplicating, reference-counted store of engine materials.
#[derive(Debug, Default)]
pub struct MaterialCache {
    by_state: HashMap<MaterialDescriptor, CachedMaterial>,
    by_id: HashMap<MaterialId, MaterialDescriptor>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct live materials.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Get a material for `descriptor`, creating it on first use.
    pub fn acquire(
        &mut self,
        descriptor: MaterialDescriptor,
        backend: &mut dyn ResourceBackend,
    ) -> GraphicsResult<MaterialId> {
        if let Some(cached) = self.by_state.get_mut(&descriptor) {
            cached.refs += 1;
            return Ok(cached.id);
        }
        let id = backend.create_material(&descriptor)?;
        log::trace!(
            "MaterialCache: created {:?} for {} ({:016x})",
            id,
            descriptor.program,
            descriptor.state_hash()
        );
        self.by_id.insert(id, descriptor.clone());
        self.by_state.insert(descriptor, CachedMaterial { id, refs: 1 });
        Ok(id)
    }

    /// Drop a reference; destroys the engine material on the last one.
    ///
    /// Returns true if the material was destroyed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live cached material.
    pub fn release(&mut self, id: MaterialId, backend: &mut dyn ResourceBackend) -> bool {
        let entry = self.entry_mut(id);
        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }
        if let Some(descriptor) = self.by_id.remove(&id) {
            self.by_state.remove(&descriptor);
        }
        backend.destroy_material(id);
        log::trace!("MaterialCache: destroyed {:?}", id);
        true
    }

    /// Current reference count of `id`, zero if unknown.
    pub fn ref_count(&self, id: MaterialId) -> usize {
        self.by_id
            .get(&id)
            .and_then(|descriptor| self.by_state.get(descriptor))
            .map_or(0, |cached| cached.refs)
    }

    /// Descriptor of a live material.
    pub fn descriptor(&self, id: MaterialId) -> Option<&MaterialDescriptor> {
        self.by_id.get(&id)
    }

    /// Destroy every material regardless of reference counts.
    pub fn clear(&mut self, backend: &mut dyn ResourceBackend) {
        for (id, _) in self.by_id.drain() {
            backend.destroy_material(id);
        }
        self.by_state.clear();
    }

    fn entry_mut(&mut self, id: MaterialId) -> &mut CachedMaterial {
        let cached = self
            .by_id
            .get(&id)
            .and_then(|descriptor| self.by_state.get_mut(descriptor));
        match cached {
            Some(cached) => cached,
            None => panic!("material {id:?} is not held by the cache"),
        }
    }
}
