//! Population of active nodes.
//!
//! Runs after the graph is committed. Each pass writes its draw items and
//! settings into the node it was assigned through a [`PassWriter`]; the
//! per-object transforms are collected in a [`FrameArena`] and handed to the
//! engine in one batch at the end.

use uiframe_core::math::{FULL_REGION, Mat4, translation_2d};

use crate::backend::{FrameGraphBackend, MaterialId, NodeId, RenderObject};

use super::pass::{DrawBatch, PassSettings};

/// Frame-scoped storage for render object transforms.
#[derive(Debug, Default)]
pub struct FrameArena {
    transforms: Vec<Mat4>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop last frame's transforms and make room for `capacity` objects.
    pub fn reset(&mut self, capacity: usize) {
        self.transforms.clear();
        self.transforms.reserve(capacity);
    }

    /// Store a transform and return its index.
    pub fn push(&mut self, transform: Mat4) -> u32 {
        self.transforms.push(transform);
        (self.transforms.len() - 1) as u32
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Writes pass contents into engine nodes.
pub struct PassWriter<'a, B: FrameGraphBackend + ?Sized> {
    backend: &'a mut B,
    arena: &'a mut FrameArena,
    target_size: (u32, u32),
}

impl<'a, B: FrameGraphBackend + ?Sized> PassWriter<'a, B> {
    /// `target_size` is the viewport that scissor rectangles are relative to.
    pub fn new(backend: &'a mut B, arena: &'a mut FrameArena, target_size: (u32, u32)) -> Self {
        Self {
            backend,
            arena,
            target_size,
        }
    }

    /// Replace the node's render queue with the batch's items.
    pub fn write_batch(&mut self, node: NodeId, pass: u32, batch: &DrawBatch) {
        self.backend.clear_render_queue(node, pass);
        for item in &batch.items {
            let transform = self.arena.push(translation_2d(item.translation));
            self.backend.queue_render_object(
                node,
                pass,
                RenderObject {
                    geometry: item.geometry,
                    material: item.material,
                    transform,
                },
            );
        }
        self.write_settings(node, pass, &batch.settings);
        log::trace!(
            "PassWriter: {} objects queued into {node:?}",
            batch.items.len()
        );
    }

    /// Set the settings and, if given, the material of a full-screen node.
    pub fn write_quad(
        &mut self,
        node: NodeId,
        pass: u32,
        material: Option<MaterialId>,
        settings: &PassSettings,
    ) {
        self.write_settings(node, pass, settings);
        if let Some(material) = material {
            self.backend.set_material(node, pass, material);
        }
    }

    fn write_settings(&mut self, node: NodeId, pass: u32, settings: &PassSettings) {
        let (width, height) = self.target_size;
        let region = settings
            .scissor
            .map_or(FULL_REGION, |rect| rect.normalized(width, height));
        self.backend.set_scissor(node, pass, region);
        self.backend
            .set_stencil_reference(node, pass, settings.stencil_ref);
        self.backend
            .set_transform(node, pass, settings.transform.unwrap_or_else(Mat4::identity));
    }
}
