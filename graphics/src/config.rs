//! Render interface configuration.

use crate::types::TextureFormat;

/// Configuration for a [`RenderInterface`](crate::RenderInterface).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Prefix for engine node names, e.g. `"Rml"` gives `"Rml/Render0"`.
    pub node_prefix: String,
    /// Render targets created up front for saved layers.
    pub initial_render_targets: usize,
    /// Upper bound of primary channels linked between consecutive nodes.
    pub max_primary_channels: u32,
    /// Format of render targets backing saved layers.
    pub render_target_format: TextureFormat,
    /// Format of textures uploaded from pixel data.
    pub texture_format: TextureFormat,
    /// Replace copies of layers that are popped right after compositing with null passes.
    pub elide_redundant_copies: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            node_prefix: "Rml".to_string(),
            initial_render_targets: 4,
            max_primary_channels: 3,
            render_target_format: TextureFormat::Rgba16Float,
            texture_format: TextureFormat::Rgba8Unorm,
            elide_redundant_copies: true,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.node_prefix = prefix.into();
        self
    }

    pub fn with_initial_render_targets(mut self, count: usize) -> Self {
        self.initial_render_targets = count;
        self
    }

    /// Set the primary channel limit. Values are clamped to `1..=3`.
    pub fn with_max_primary_channels(mut self, channels: u32) -> Self {
        self.max_primary_channels = channels.clamp(1, 3);
        self
    }

    pub fn with_render_target_format(mut self, format: TextureFormat) -> Self {
        self.render_target_format = format;
        self
    }

    pub fn with_texture_format(mut self, format: TextureFormat) -> Self {
        self.texture_format = format;
        self
    }

    pub fn with_copy_elision(mut self, enabled: bool) -> Self {
        self.elide_redundant_copies = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.node_prefix, "Rml");
        assert_eq!(config.initial_render_targets, 4);
        assert_eq!(config.max_primary_channels, 3);
        assert!(config.elide_redundant_copies);
    }

    #[test]
    fn test_builder_clamps_channels() {
        let config = RenderConfig::new()
            .with_max_primary_channels(8)
            .with_copy_elision(false);
        assert_eq!(config.max_primary_channels, 3);
        assert!(!config.elide_redundant_copies);
    }
}
