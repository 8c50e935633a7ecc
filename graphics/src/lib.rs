//! # uiframe graphics
//!
//! Translates a 2D UI draw stream into a per-frame GPU frame graph.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderInterface`] - Inbound UI calls: geometry, textures, scissor,
//!   clip masks, layers, filters and shaders
//! - [`graph`] - Pass recording, layer stack, node pool and graph population
//! - [`FrameGraphBackend`] / [`ResourceBackend`] - Ports implemented by the
//!   engine
//! - [`filters`] and [`shaders`] - Built-in post-process filters and gradients
//! - [`DummyBackend`] - Recording backend for tests and headless use
//!
//! ## Example
//!
//! ```ignore
//! use uiframe_graphics::{DummyBackend, RenderConfig, RenderInterface};
//!
//! let mut ui = RenderInterface::new(config, DummyBackend::new(), DummyBackend::new(), output, background, (800, 600))?;
//! ui.begin_frame();
//! let layer = ui.push_layer();
//! ui.render_geometry(button, Vec2::new(20.0, 40.0), None);
//! ui.composite_layers(layer, LayerHandle::ROOT, BlendMode::Normal, &[blur]);
//! ui.pop_layer();
//! ui.end_frame()?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod graph;
pub mod interface;
pub mod materials;
pub mod params;
pub mod shaders;
pub mod types;

// Re-export main types for convenience
#[cfg(feature = "dummy")]
pub use backend::DummyBackend;
pub use backend::{
    FrameGraphBackend, GeometryId, MaterialId, NodeId, NodeRef, RenderObject, ResourceBackend,
    TextureId,
};
pub use config::RenderConfig;
pub use error::{GraphicsError, GraphicsResult};
pub use filters::{Filter, FilterMaker, FilterRegistry};
pub use graph::{BlendMode, FrameStats, LayerHandle, Pass, PassKind, PassSequence, PassSettings};
pub use interface::{
    ClipMaskOperation, FilterHandle, GeometryHandle, RenderInterface, ShaderHandle, TextureHandle,
};
pub use materials::{MaterialBlend, MaterialCache, MaterialDescriptor, ParamValue};
pub use params::{Colour, ColourStop, Dictionary, Variant};
pub use shaders::{ShaderMaker, ShaderRegistry};
pub use types::{GpuVertex, TextureDescriptor, TextureFormat, TextureUsage, Vertex};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    uiframe_core::init();
    log::info!("uiframe graphics v{} initialized", VERSION);
}
