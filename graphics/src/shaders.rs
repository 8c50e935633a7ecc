//! Shaders for decorated geometry.
//!
//! A shader turns a name plus parameters into the material that geometry
//! is drawn with. The built-in shaders are gradients:
//!
//! | Name | Parameters |
//! |------|------------|
//! | `linear-gradient` | `p0`, `p1` |
//! | `radial-gradient` | `center`, `radius` |
//! | `conic-gradient` | `center`, `angle` |
//!
//! All gradients also take `repeating` and `color_stop_list`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use uiframe_core::math::Vec2;

use crate::materials::{MaterialDescriptor, ParamValue, programs};
use crate::params::{ColourStop, Dictionary};

/// Stops beyond this count are dropped.
pub const MAX_STOP_COLOURS: usize = 16;

/// Builds the material of a shader from its parameters.
pub trait ShaderMaker {
    fn make(&self, params: &Dictionary) -> MaterialDescriptor;
}

/// Gradient shape, as understood by the gradient program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientKind {
    Linear = 0,
    Radial = 1,
    Conic = 2,
}

impl GradientKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear-gradient",
            Self::Radial => "radial-gradient",
            Self::Conic => "conic-gradient",
        }
    }

    /// Gradient origin and scale from the shape parameters.
    fn placement(self, params: &Dictionary) -> (Vec2, Vec2) {
        match self {
            Self::Linear => {
                let p0 = params.get_or("p0", Vec2::zeros());
                let p1 = params.get_or("p1", Vec2::zeros());
                (p0, p1 - p0)
            }
            Self::Radial => {
                let center = params.get_or("center", Vec2::zeros());
                let radius = params.get_or("radius", Vec2::new(1.0, 1.0));
                (center, radius.map(|r| 1.0 / r))
            }
            Self::Conic => {
                let center = params.get_or("center", Vec2::zeros());
                let (sin, cos) = params.get_or("angle", 0.0f32).sin_cos();
                (center, Vec2::new(cos, sin))
            }
        }
    }
}

/// Makes gradient materials of one shape.
#[derive(Debug, Clone, Copy)]
pub struct GradientMaker(pub GradientKind);

impl ShaderMaker for GradientMaker {
    fn make(&self, params: &Dictionary) -> MaterialDescriptor {
        let (origin, scale) = self.0.placement(params);
        let repeating = params.get_or("repeating", false);

        let mut stops: Vec<ColourStop> = params.get_or("color_stop_list", Vec::new());
        if stops.len() > MAX_STOP_COLOURS {
            log::warn!(
                "{}: {} colour stops, only the first {MAX_STOP_COLOURS} are used",
                self.0.name(),
                stops.len()
            );
            stops.truncate(MAX_STOP_COLOURS);
        }

        let mut positions = vec![0.0; MAX_STOP_COLOURS];
        let mut colours = vec![0.0; MAX_STOP_COLOURS * 4];
        for (i, stop) in stops.iter().enumerate() {
            positions[i] = stop.position;
            colours[i * 4..i * 4 + 4].copy_from_slice(stop.colour.premultiplied().as_slice());
        }

        MaterialDescriptor::new(programs::GRADIENT)
            .with_param("gradientType", ParamValue::Int(self.0 as i32))
            .with_param("repeating", ParamValue::Int(repeating as i32))
            .with_param("origin", ParamValue::Vec2(origin))
            .with_param("scale", ParamValue::Vec2(scale))
            .with_param("numStops", ParamValue::Int(stops.len() as i32))
            .with_param("stopPositions", ParamValue::Floats(positions))
            .with_param("stopColours", ParamValue::Floats(colours))
    }
}

/// Shader makers by name.
pub struct ShaderRegistry {
    makers: BTreeMap<String, Box<dyn ShaderMaker>>,
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ShaderRegistry {
    pub fn empty() -> Self {
        Self {
            makers: BTreeMap::new(),
        }
    }

    /// Registry with the three gradient shapes.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for kind in [GradientKind::Linear, GradientKind::Radial, GradientKind::Conic] {
            registry.register(kind.name(), GradientMaker(kind));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, maker: impl ShaderMaker + 'static) {
        self.makers.insert(name.into(), Box::new(maker));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.makers.contains_key(name)
    }

    /// Material for shader `name`, `None` for unknown names.
    pub fn make(&self, name: &str, params: &Dictionary) -> Option<MaterialDescriptor> {
        self.makers.get(name).map(|maker| maker.make(params))
    }
}

impl Debug for ShaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderRegistry")
            .field("makers", &self.makers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Colour, Variant};

    fn stops(count: usize) -> Variant {
        Variant::ColourStops(
            (0..count)
                .map(|i| ColourStop {
                    position: i as f32 / count as f32,
                    colour: Colour::rgba(255, 255, 255, 255),
                })
                .collect(),
        )
    }

    #[test]
    fn test_linear_placement() {
        let params = Dictionary::new()
            .with("p0", Variant::Vec2(Vec2::new(10.0, 0.0)))
            .with("p1", Variant::Vec2(Vec2::new(30.0, 5.0)))
            .with("color_stop_list", stops(2));
        let material = ShaderRegistry::with_builtin()
            .make("linear-gradient", &params)
            .unwrap();

        assert_eq!(material.param("gradientType"), Some(&ParamValue::Int(0)));
        assert_eq!(material.param("origin"), Some(&ParamValue::Vec2(Vec2::new(10.0, 0.0))));
        assert_eq!(material.param("scale"), Some(&ParamValue::Vec2(Vec2::new(20.0, 5.0))));
        assert_eq!(material.param("numStops"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn test_radial_default_radius() {
        let material = GradientMaker(GradientKind::Radial).make(&Dictionary::new());
        assert_eq!(material.param("scale"), Some(&ParamValue::Vec2(Vec2::new(1.0, 1.0))));

        let params = Dictionary::new().with("radius", Variant::Vec2(Vec2::new(4.0, 2.0)));
        let material = GradientMaker(GradientKind::Radial).make(&params);
        assert_eq!(material.param("scale"), Some(&ParamValue::Vec2(Vec2::new(0.25, 0.5))));
    }

    #[test]
    fn test_conic_angle() {
        let params = Dictionary::new()
            .with("angle", Variant::Float(std::f32::consts::FRAC_PI_2))
            .with("repeating", Variant::Bool(true));
        let material = GradientMaker(GradientKind::Conic).make(&params);
        match material.param("scale") {
            Some(ParamValue::Vec2(scale)) => {
                assert!(scale.x.abs() < 1e-6);
                assert!((scale.y - 1.0).abs() < 1e-6);
            }
            other => panic!("unexpected scale {other:?}"),
        }
        assert_eq!(material.param("repeating"), Some(&ParamValue::Int(1)));
    }

    #[test]
    fn test_extra_stops_truncated() {
        let params = Dictionary::new().with("color_stop_list", stops(20));
        let material = GradientMaker(GradientKind::Linear).make(&params);
        assert_eq!(
            material.param("numStops"),
            Some(&ParamValue::Int(MAX_STOP_COLOURS as i32))
        );
    }

    #[test]
    fn test_unknown_shader() {
        assert!(ShaderRegistry::with_builtin()
            .make("plasma", &Dictionary::new())
            .is_none());
    }
}
