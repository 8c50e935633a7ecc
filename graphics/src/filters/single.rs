//! Filters made of one full-screen material.

use crate::backend::{MaterialId, TextureId};
use crate::error::GraphicsResult;
use crate::materials::{MaterialDescriptor, ParamValue, programs};
use crate::params::Dictionary;

use super::{Filter, FilterContext, FilterMaker, FilterResources};

/// Renders one quad with its material over the current layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleMaterialFilter {
    material: MaterialId,
}

impl SingleMaterialFilter {
    pub fn new(material: MaterialId) -> Self {
        Self { material }
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}

impl Filter for SingleMaterialFilter {
    fn apply(&self, ctx: &mut FilterContext<'_>) {
        let settings = ctx.settings();
        ctx.render_quad(self.material, settings);
    }

    fn release(&self, res: &mut FilterResources<'_>) {
        res.release_material(self.material);
    }
}

/// `opacity`: scales the layer's alpha by `value` (1).
#[derive(Debug, Clone, Copy, Default)]
pub struct OpacityFilterMaker;

impl FilterMaker for OpacityFilterMaker {
    fn make(
        &self,
        params: &Dictionary,
        res: &mut FilterResources<'_>,
    ) -> GraphicsResult<Box<dyn Filter>> {
        let value = params.get_or("value", 1.0f32);
        let material = res.acquire_material(
            MaterialDescriptor::new(programs::OPACITY).with_param("value", ParamValue::Float(value)),
        )?;
        Ok(Box::new(SingleMaterialFilter::new(material)))
    }
}

/// Masks the current layer with a saved layer.
///
/// Owns the render target holding the saved layer and returns it to the
/// render target pool when released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskImageFilter {
    inner: SingleMaterialFilter,
    image: TextureId,
}

impl MaskImageFilter {
    /// Texture unit the mask image is bound to.
    pub const TEXTURE_UNIT: &'static str = "dstTex";

    pub fn make(image: TextureId, res: &mut FilterResources<'_>) -> GraphicsResult<Self> {
        let material = res.acquire_material(
            MaterialDescriptor::new(programs::MASK).with_texture(Self::TEXTURE_UNIT, image),
        )?;
        Ok(Self {
            inner: SingleMaterialFilter::new(material),
            image,
        })
    }

    pub fn image(&self) -> TextureId {
        self.image
    }
}

impl Filter for MaskImageFilter {
    fn apply(&self, ctx: &mut FilterContext<'_>) {
        self.inner.apply(ctx);
    }

    fn release(&self, res: &mut FilterResources<'_>) {
        self.inner.release(res);
        res.released_targets.push(self.image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::Resources;
    use crate::graph::{Pass, PassSequence, PassSettings};
    use crate::params::Variant;
    use std::borrow::Cow;
    use uiframe_core::math::Rect;

    #[test]
    fn test_opacity_value() {
        let mut res = Resources::default();
        let params = Dictionary::new().with("value", Variant::Float(0.25));
        OpacityFilterMaker.make(&params, &mut res.get()).unwrap();

        let descriptor = res.materials.descriptor(MaterialId(1)).unwrap();
        assert_eq!(descriptor.program, programs::OPACITY);
        assert_eq!(descriptor.param("value"), Some(&ParamValue::Float(0.25)));
    }

    #[test]
    fn test_single_quad_uses_current_settings() {
        let filter = SingleMaterialFilter::new(MaterialId(4));
        let settings = PassSettings {
            scissor: Some(Rect::from_xywh(1, 2, 3, 4)),
            ..Default::default()
        };
        let mut seq = PassSequence::new();
        filter.apply(&mut FilterContext::new(&mut seq, settings));

        match &seq.passes()[0] {
            Pass::RenderQuad(quad) => {
                assert_eq!(quad.material, MaterialId(4));
                assert_eq!(quad.settings, settings);
            }
            other => panic!("unexpected pass {other:?}"),
        }
    }

    #[test]
    fn test_mask_release_returns_target() {
        let mut res = Resources::default();
        let filter = MaskImageFilter::make(TextureId(77), &mut res.get()).unwrap();
        let descriptor = res.materials.descriptor(filter.inner.material()).unwrap();
        assert_eq!(
            descriptor.textures,
            vec![(Cow::Borrowed(MaskImageFilter::TEXTURE_UNIT), TextureId(77))]
        );

        filter.release(&mut res.get());
        assert_eq!(res.targets, vec![TextureId(77)]);
        assert!(res.materials.is_empty());
    }
}
