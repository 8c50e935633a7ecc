//! Common types and descriptors for UI resources.
//!
//! This module contains texture formats, usage flags, descriptors and the
//! vertex layouts used by compiled geometry.

mod texture;
mod vertex;

pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
pub use vertex::{GpuVertex, Vertex};
