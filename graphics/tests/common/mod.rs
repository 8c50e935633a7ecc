//! Common utilities for frame graph integration tests.
//!
//! Every test drives a [`RenderInterface`] whose engine ports are two
//! recording [`DummyBackend`]s, so the committed topology and per-node state
//! can be inspected after `end_frame`.

use uiframe_core::math::Vec2;
use uiframe_graphics::{
    DummyBackend, GeometryHandle, RenderConfig, RenderInterface, TextureId, Vertex,
};

/// Interface under test.
pub type TestInterface = RenderInterface<DummyBackend, DummyBackend>;

/// External target receiving the composed UI.
pub const OUTPUT: TextureId = TextureId(9000);
/// External target the root layer starts from.
pub const BACKGROUND: TextureId = TextureId(9001);
pub const VIEWPORT: (u32, u32) = (320, 200);
/// Untextured, composite and copy materials created with the interface.
pub const BUILTIN_MATERIALS: usize = 3;

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn interface_with(config: RenderConfig) -> TestInterface {
    init_logging();
    RenderInterface::new(
        config,
        DummyBackend::new(),
        DummyBackend::new(),
        OUTPUT,
        BACKGROUND,
        VIEWPORT,
    )
    .expect("dummy backends create every resource")
}

pub fn interface() -> TestInterface {
    interface_with(RenderConfig::default())
}

/// Record an empty frame, carrying out the releases queued before it.
pub fn next_frame(ui: &mut TestInterface) {
    ui.begin_frame();
    ui.end_frame().expect("empty frame populates");
}

/// Compile an axis-aligned, untextured quad of `size` pixels.
pub fn quad(ui: &mut TestInterface, size: f32) -> GeometryHandle {
    let white = [255, 255, 255, 255];
    let vertices = [
        Vertex::new([0.0, 0.0], white, [0.0, 0.0]),
        Vertex::new([size, 0.0], white, [1.0, 0.0]),
        Vertex::new([0.0, size], white, [0.0, 1.0]),
        Vertex::new([size, size], white, [1.0, 1.0]),
    ];
    ui.compile_geometry(&vertices, &[0, 1, 2, 2, 1, 3])
        .expect("dummy backends create every resource")
}

/// Translation of the `i`-th element in a simple row layout.
#[allow(dead_code)]
pub fn slot(i: usize) -> Vec2 {
    Vec2::new(i as f32 * 24.0, 8.0)
}
