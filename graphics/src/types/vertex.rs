//! Vertex layouts for UI geometry.

use static_assertions::const_assert_eq;

/// Vertex as produced by the UI layout engine.
///
/// Colours are premultiplied 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 2],
    pub colour: [u8; 4],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 2], colour: [u8; 4], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            colour,
            tex_coord,
        }
    }
}

/// Vertex layout uploaded to the GPU: float2 position, float4 colour, float2 uv.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 2],
    pub colour: [f32; 4],
    pub tex_coord: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<GpuVertex>(), 32);

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position,
            colour: v.colour.map(|c| f32::from(c) / 255.0),
            tex_coord: v.tex_coord,
        }
    }
}

impl GpuVertex {
    /// Convert a slice of UI vertices.
    pub fn convert(vertices: &[Vertex]) -> Vec<Self> {
        vertices.iter().map(Self::from).collect()
    }

    /// View a slice of GPU vertices as raw bytes for upload.
    pub fn as_bytes(vertices: &[Self]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_conversion() {
        let v = Vertex::new([1.0, 2.0], [255, 0, 51, 255], [0.5, 0.25]);
        let gpu = GpuVertex::from(&v);
        assert_eq!(gpu.colour, [1.0, 0.0, 0.2, 1.0]);
        assert_eq!(gpu.position, [1.0, 2.0]);
        assert_eq!(gpu.tex_coord, [0.5, 0.25]);
    }

    #[test]
    fn test_as_bytes_length() {
        let vertices = GpuVertex::convert(&[Vertex::default(); 3]);
        assert_eq!(GpuVertex::as_bytes(&vertices).len(), 96);
    }
}
