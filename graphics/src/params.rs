//! Named parameters for filters and shaders.
//!
//! The UI describes a filter or shader by name plus a [`Dictionary`] of
//! typed [`Variant`] values, e.g. `blur` with `sigma = 4.0`. Makers read
//! the values they know with [`Dictionary::get_or`] and fall back to their
//! defaults for anything missing or of the wrong type.

use std::collections::HashMap;

use uiframe_core::math::{Vec2, Vec4};

/// 8-bit RGBA colour, not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colour(pub [u8; 4]);

impl Colour {
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Premultiplied colour with components in `[0, 1]`.
    pub fn premultiplied(self) -> Vec4 {
        let [r, g, b, a] = self.0.map(|c| c as f32 / 255.0);
        Vec4::new(r * a, g * a, b * a, a)
    }
}

/// A gradient stop. `position` is a fraction along the gradient line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourStop {
    pub position: f32,
    pub colour: Colour,
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Colour(Colour),
    String(String),
    ColourStops(Vec<ColourStop>),
}

/// Conversion out of a [`Variant`].
pub trait FromVariant: Sized {
    /// Returns `None` if the variant holds another type.
    fn from_variant(value: &Variant) -> Option<Self>;
}

impl FromVariant for bool {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Bool(v) => Some(*v),
            Variant::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl FromVariant for i32 {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for f32 {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Float(v) => Some(*v),
            Variant::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl FromVariant for Vec2 {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Vec2(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for Colour {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Colour(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for String {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromVariant for Vec<ColourStop> {
    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::ColourStops(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Parameters of a filter or shader, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    values: HashMap<String, Variant>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: Variant) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Variant) -> Option<Variant> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.values.get(name)
    }

    /// Value of `name` converted to `T`, or `default`.
    pub fn get_or<T: FromVariant>(&self, name: &str, default: T) -> T {
        match self.values.get(name) {
            Some(value) => T::from_variant(value).unwrap_or_else(|| {
                log::warn!("Parameter {name} has unexpected type {value:?}, using default");
                default
            }),
            None => default,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_defaults() {
        let params = Dictionary::new()
            .with("sigma", Variant::Float(2.5))
            .with("repeating", Variant::Bool(true));

        assert_eq!(params.get_or("sigma", 0.0f32), 2.5);
        assert!(params.get_or("repeating", false));
        assert_eq!(params.get_or("missing", 1.0f32), 1.0);
    }

    #[test]
    fn test_mismatched_type_uses_default() {
        let params = Dictionary::new().with("offset", Variant::Float(3.0));
        assert_eq!(params.get_or("offset", Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_int_widens_to_float() {
        let params = Dictionary::new().with("value", Variant::Int(2));
        assert_eq!(params.get_or("value", 1.0f32), 2.0);
    }

    #[test]
    fn test_colour_premultiplied() {
        let colour = Colour::rgba(255, 0, 255, 51);
        let premultiplied = colour.premultiplied();
        assert!((premultiplied.x - 0.2).abs() < 1e-6);
        assert_eq!(premultiplied.y, 0.0);
        assert!((premultiplied.w - 0.2).abs() < 1e-6);
        assert_eq!(Colour::TRANSPARENT.premultiplied(), Vec4::zeros());
    }
}
