//! Separable Gaussian blur.
//!
//! Large sigmas are handled by halfsampling the layer first: every
//! halfsample doubles the sample step, so the blur kernel never needs more
//! than [`NUM_WEIGHTS`] taps per direction.

use uiframe_core::math::{IVec2, Vec2};

use crate::backend::MaterialId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::graph::PassSettings;
use crate::materials::{MaterialDescriptor, ParamValue, programs};
use crate::params::Dictionary;

use super::{Filter, FilterContext, FilterMaker, FilterResources};

/// Taps per direction; matches the blur program.
pub const NUM_WEIGHTS: usize = 8;
/// Largest sigma blurred without halfsampling.
pub const MAX_SCALED_SIGMA: f32 = 3.0;
/// Halfsampling stops here; larger sigmas blur with a sparser kernel.
pub const MAX_HALFSAMPLES: u32 = 16;

/// Number of halfsamples and the resulting sample step for `sigma`.
pub fn halfsample_steps(sigma: f32) -> (u32, u32) {
    let mut halfsamples = 0;
    let mut step = 1u32;
    while halfsamples < MAX_HALFSAMPLES && sigma > MAX_SCALED_SIGMA * step as f32 {
        halfsamples += 1;
        step = step.saturating_mul(2);
    }
    (halfsamples, step)
}

/// Normalised Gaussian weights, centre first.
///
/// The centre tap is counted once and every other tap twice, as the
/// kernel is mirrored.
pub fn gaussian_weights(sigma: f32, step: u32) -> [f32; NUM_WEIGHTS] {
    let mut weights = [0.0; NUM_WEIGHTS];
    if sigma < 0.1 {
        weights[0] = 1.0;
        return weights;
    }
    let norm = (2.0 * std::f32::consts::PI).sqrt() * sigma;
    let mut total = 0.0;
    for (i, weight) in weights.iter_mut().enumerate() {
        let j = (i as u32 * step) as f32;
        *weight = (-(j * j) / (2.0 * sigma * sigma)).exp() / norm;
        total += if i == 0 { *weight } else { 2.0 * *weight };
    }
    for weight in &mut weights {
        *weight /= total;
    }
    weights
}

/// Compiled blur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurFilter {
    halfsample: MaterialId,
    blur_h: MaterialId,
    blur_v: MaterialId,
    halfsamples: u32,
}

impl BlurFilter {
    /// # Errors
    ///
    /// Fails with [`GraphicsError::InvalidParameter`] for a non-finite sigma.
    pub fn make(sigma: f32, res: &mut FilterResources<'_>) -> GraphicsResult<Self> {
        if !sigma.is_finite() {
            return Err(GraphicsError::InvalidParameter(format!(
                "blur sigma must be finite, got {sigma}"
            )));
        }
        let (halfsamples, step) = halfsample_steps(sigma);
        let scale = 1.0 / step as f32;
        let weights = gaussian_weights(sigma, step).to_vec();

        let halfsample = res.acquire_material(MaterialDescriptor::new(programs::HALFSAMPLE))?;
        let blur_h = res.acquire_material(
            MaterialDescriptor::new(programs::BLUR)
                .with_param("scale", ParamValue::Vec2(Vec2::new(scale, 1.0)))
                .with_param("direction", ParamValue::Vec2(Vec2::new(1.0, 0.0)))
                .with_param("weights", ParamValue::Floats(weights.clone())),
        )?;
        let blur_v = res.acquire_material(
            MaterialDescriptor::new(programs::BLUR)
                .with_param("scale", ParamValue::Vec2(Vec2::new(1.0, scale)))
                .with_param("direction", ParamValue::Vec2(Vec2::new(0.0, 1.0)))
                .with_param("weights", ParamValue::Floats(weights)),
        )?;
        Ok(Self {
            halfsample,
            blur_h,
            blur_v,
            halfsamples,
        })
    }

    pub fn halfsamples(&self) -> u32 {
        self.halfsamples
    }

    /// Record the blur passes with `base` as the current settings.
    pub fn record(&self, ctx: &mut FilterContext<'_>, base: PassSettings) {
        let mut settings = base;
        if self.halfsamples > 0 {
            if let Some(scissor) = settings.scissor.as_mut() {
                scissor.p0 = scissor.p0.map(|v| v / 2);
            }
            ctx.render_quad(self.halfsample, settings);
            for _ in 1..self.halfsamples {
                if let Some(scissor) = settings.scissor.as_mut() {
                    scissor.p0 = scissor.p0.map(|v| v / 2);
                    scissor.p1 = (scissor.p1 + IVec2::new(1, 1)).map(|v| v / 2);
                }
                ctx.render_quad(self.halfsample, settings);
            }
        }
        // The horizontal pass reads the halfsampled rows but writes full width.
        if let (Some(scissor), Some(original)) = (settings.scissor.as_mut(), base.scissor) {
            scissor.p0.x = original.p0.x;
            scissor.p1 = original.p1;
        }
        ctx.render_quad(self.blur_h, settings);
        ctx.render_quad(self.blur_v, base);
    }

    pub fn release_materials(&self, res: &mut FilterResources<'_>) {
        res.release_material(self.halfsample);
        res.release_material(self.blur_h);
        res.release_material(self.blur_v);
    }
}

impl Filter for BlurFilter {
    fn apply(&self, ctx: &mut FilterContext<'_>) {
        let base = ctx.settings();
        self.record(ctx, base);
    }

    fn release(&self, res: &mut FilterResources<'_>) {
        self.release_materials(res);
    }
}

/// `blur`: Gaussian blur with `sigma` (0) in pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlurFilterMaker;

impl FilterMaker for BlurFilterMaker {
    fn make(
        &self,
        params: &Dictionary,
        res: &mut FilterResources<'_>,
    ) -> GraphicsResult<Box<dyn Filter>> {
        let sigma = params.get_or("sigma", 0.0f32);
        Ok(Box::new(BlurFilter::make(sigma, res)?))
    }
}
