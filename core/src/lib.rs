//! # uiframe core
//!
//! Containers and math shared by the uiframe UI frame graph:
//!
//! - [`pool::ResourcePool`] - claim/free pool that only ever grows
//! - [`index::ObjectIndex`] - generational slot map for compiled objects
//! - [`math`] - vector/matrix aliases and pixel rectangles
//! - [`profiling`] - optional Tracy instrumentation

pub mod index;
pub mod math;
pub mod pool;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("uiframe core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
