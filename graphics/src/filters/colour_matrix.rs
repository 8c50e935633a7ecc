//! Colour matrix filters.
//!
//! Each filter multiplies premultiplied colour by a 4x4 matrix whose last
//! column holds the constant offset.

use uiframe_core::math::{Mat4, mat4_from_rows};

use crate::error::GraphicsResult;
use crate::materials::{MaterialDescriptor, ParamValue, programs};
use crate::params::Dictionary;

use super::single::SingleMaterialFilter;
use super::{Filter, FilterMaker, FilterResources};

/// Filters expressed as a colour matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColourMatrixKind {
    Brightness,
    Contrast,
    Invert,
    Grayscale,
    Sepia,
    HueRotate,
    Saturate,
}

impl ColourMatrixKind {
    pub const ALL: [Self; 7] = [
        Self::Brightness,
        Self::Contrast,
        Self::Invert,
        Self::Grayscale,
        Self::Sepia,
        Self::HueRotate,
        Self::Saturate,
    ];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Invert => "invert",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::HueRotate => "hue-rotate",
            Self::Saturate => "saturate",
        }
    }

    /// Matrix for the filter's `value` parameter.
    pub fn matrix(self, value: f32) -> Mat4 {
        match self {
            Self::Brightness => scale_with_offset(value, 0.0),
            Self::Contrast => scale_with_offset(value, 0.5 - 0.5 * value),
            Self::Invert => {
                let value = value.clamp(0.0, 1.0);
                scale_with_offset(1.0 - 2.0 * value, value)
            }
            Self::Grayscale => {
                let luma = [0.2126, 0.7152, 0.0722];
                mix(luma, luma, luma, value)
            }
            Self::Sepia => mix(
                [0.393, 0.769, 0.189],
                [0.349, 0.686, 0.168],
                [0.272, 0.534, 0.131],
                value,
            ),
            Self::HueRotate => {
                let (s, c) = value.sin_cos();
                mat4_from_rows([
                    [
                        0.213 + 0.787 * c - 0.213 * s,
                        0.715 - 0.715 * c - 0.715 * s,
                        0.072 - 0.072 * c + 0.928 * s,
                        0.0,
                    ],
                    [
                        0.213 - 0.213 * c + 0.143 * s,
                        0.715 + 0.285 * c + 0.140 * s,
                        0.072 - 0.072 * c - 0.283 * s,
                        0.0,
                    ],
                    [
                        0.213 - 0.213 * c - 0.787 * s,
                        0.715 - 0.715 * c + 0.715 * s,
                        0.072 + 0.928 * c + 0.072 * s,
                        0.0,
                    ],
                    [0.0, 0.0, 0.0, 1.0],
                ])
            }
            Self::Saturate => mat4_from_rows([
                [0.213 + 0.787 * value, 0.715 - 0.715 * value, 0.072 - 0.072 * value, 0.0],
                [0.213 - 0.213 * value, 0.715 + 0.285 * value, 0.072 - 0.072 * value, 0.0],
                [0.213 - 0.213 * value, 0.715 - 0.715 * value, 0.072 + 0.928 * value, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
        }
    }
}

/// Uniform RGB scale plus a constant added to each RGB channel.
fn scale_with_offset(scale: f32, offset: f32) -> Mat4 {
    mat4_from_rows([
        [scale, 0.0, 0.0, offset],
        [0.0, scale, 0.0, offset],
        [0.0, 0.0, scale, offset],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Blend between identity and the given channel mixes by `amount`.
fn mix(r: [f32; 3], g: [f32; 3], b: [f32; 3], amount: f32) -> Mat4 {
    let keep = 1.0 - amount;
    mat4_from_rows([
        [r[0] * amount + keep, r[1] * amount, r[2] * amount, 0.0],
        [g[0] * amount, g[1] * amount + keep, g[2] * amount, 0.0],
        [b[0] * amount, b[1] * amount, b[2] * amount + keep, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Makes colour matrix filters of one kind from `value` (1).
#[derive(Debug, Clone, Copy)]
pub struct ColourMatrixFilterMaker(pub ColourMatrixKind);

impl FilterMaker for ColourMatrixFilterMaker {
    fn make(
        &self,
        params: &Dictionary,
        res: &mut FilterResources<'_>,
    ) -> GraphicsResult<Box<dyn Filter>> {
        let value = params.get_or("value", 1.0f32);
        let material = res.acquire_material(
            MaterialDescriptor::new(programs::COLOUR_MATRIX)
                .with_param("colourMatrix", ParamValue::Mat4(self.0.matrix(value))),
        )?;
        Ok(Box::new(SingleMaterialFilter::new(material)))
    }
}
