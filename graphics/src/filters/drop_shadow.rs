//! Drop shadow.

use uiframe_core::math::Vec2;

use crate::backend::MaterialId;
use crate::error::GraphicsResult;
use crate::graph::{CompositePass, Pass};
use crate::materials::{MaterialDescriptor, ParamValue, programs};
use crate::params::{Colour, Dictionary};

use super::blur::BlurFilter;
use super::single::SingleMaterialFilter;
use super::{Filter, FilterContext, FilterMaker, FilterResources};

/// Shadows with a sigma up to this are drawn without blurring.
const BLURLESS_SIGMA: f32 = 0.5;

/// Blurred drop shadow.
///
/// The layer is copied aside, its silhouette is drawn with the shadow
/// colour and offset and blurred, and the copy is composited over the
/// shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropShadowFilter {
    blur: BlurFilter,
    shadow: MaterialId,
    composite: MaterialId,
}

impl Filter for DropShadowFilter {
    fn apply(&self, ctx: &mut FilterContext<'_>) {
        let settings = ctx.settings();

        let copy_in = ctx.acquire_layer_buffer();
        let layer = ctx.add_connection();
        ctx.add_pass(Pass::Copy {
            copy_in,
            copy_out: layer,
        });

        ctx.render_quad(self.shadow, settings);
        self.blur.record(ctx, settings);

        let shadow = ctx.add_connection();
        ctx.add_pass(Pass::Swap {
            swap_in: layer,
            swap_out: Some(shadow),
        });
        let result = ctx.add_connection();
        ctx.add_pass(Pass::Composite(CompositePass {
            dst_in: Some(shadow),
            dst_out: result,
            material: self.composite,
            settings,
        }));
        let discarded = ctx.add_connection();
        ctx.add_pass(Pass::Swap {
            swap_in: result,
            swap_out: Some(discarded),
        });
        ctx.release_layer_buffer(discarded);
    }

    fn release(&self, res: &mut FilterResources<'_>) {
        self.blur.release_materials(res);
        res.release_material(self.shadow);
        res.release_material(self.composite);
    }
}

/// `drop-shadow`: `sigma` (0), `color` (transparent), `offset` (0, 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct DropShadowFilterMaker;

impl FilterMaker for DropShadowFilterMaker {
    fn make(
        &self,
        params: &Dictionary,
        res: &mut FilterResources<'_>,
    ) -> GraphicsResult<Box<dyn Filter>> {
        let sigma = params.get_or("sigma", 0.0f32);
        let colour = params.get_or("color", Colour::TRANSPARENT).premultiplied();
        let offset = params.get_or("offset", Vec2::zeros());

        if sigma > BLURLESS_SIGMA {
            let shadow = res.acquire_material(
                MaterialDescriptor::new(programs::SHADOW)
                    .with_param("offset", ParamValue::Vec2(offset))
                    .with_param("colour", ParamValue::Vec4(colour)),
            )?;
            let blend = MaterialDescriptor::new(programs::COMPOSITE);
            let composite = match res.acquire_material(blend) {
                Ok(composite) => composite,
                Err(err) => {
                    res.release_material(shadow);
                    return Err(err);
                }
            };
            let blur = match BlurFilter::make(sigma, res) {
                Ok(blur) => blur,
                Err(err) => {
                    res.release_material(shadow);
                    res.release_material(composite);
                    return Err(err);
                }
            };
            Ok(Box::new(DropShadowFilter {
                blur,
                shadow,
                composite,
            }))
        } else {
            let shadow = res.acquire_material(
                MaterialDescriptor::new(programs::BLURLESS_SHADOW)
                    .with_param("offset", ParamValue::Vec2(offset))
                    .with_param("colour", ParamValue::Vec4(colour)),
            )?;
            Ok(Box::new(SingleMaterialFilter::new(shadow)))
        }
    }
}
