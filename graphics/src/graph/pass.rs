//! Pass records of the per-frame sequence.
//!
//! A [`Pass`] is one step of the UI frame: drawing geometry into the current
//! layer, moving layer buffers around, or running a full-screen material.
//! Every pass is executed by one engine node of the matching [`PassKind`].
//! Passes that move layers communicate through side connections on
//! [`SIDE_CHANNEL`], addressed by frame-scoped [`ConnectionId`]s.

use uiframe_core::math::{Mat4, Rect, Vec2};

use crate::backend::{FrameGraphBackend, GeometryId, MaterialId, NodeId};

use super::ConnectionId;
use super::connection::ConnectionMap;
use super::execute::PassWriter;

/// Channel used for side connections between non-adjacent nodes.
pub const SIDE_CHANNEL: u32 = 3;

/// Number of input and output channels of a node template.
///
/// Channels 0..3 form the primary chain: 0 is the current layer, 1 the
/// secondary scratch buffer, 2 the stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    pub inputs: u32,
    pub outputs: u32,
}

impl ChannelLayout {
    /// Layout of the graph entry node.
    pub const START: Self = Self::new(0, 3);
    /// Layout of the graph terminal node (result and output target).
    pub const END: Self = Self::new(2, 0);

    pub const fn new(inputs: u32, outputs: u32) -> Self {
        Self { inputs, outputs }
    }
}

/// Kind of a pass and of the node template that executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    /// Elided pass; gets no node.
    Null,
    Render,
    RenderWithClipMask,
    ClipMaskSet,
    ClipMaskSetInverse,
    ClipMaskIntersect,
    NewLayerBuffer,
    StartLayer,
    Swap,
    Copy,
    Composite,
    CompositeWithClipMask,
    /// Full-screen quad with a single material.
    RenderQuad,
    ClearSecondary,
    RenderToTexture,
}

impl PassKind {
    pub const COUNT: usize = 15;

    pub const ALL: [PassKind; Self::COUNT] = [
        Self::Null,
        Self::Render,
        Self::RenderWithClipMask,
        Self::ClipMaskSet,
        Self::ClipMaskSetInverse,
        Self::ClipMaskIntersect,
        Self::NewLayerBuffer,
        Self::StartLayer,
        Self::Swap,
        Self::Copy,
        Self::Composite,
        Self::CompositeWithClipMask,
        Self::RenderQuad,
        Self::ClearSecondary,
        Self::RenderToTexture,
    ];

    /// Position of this kind in [`PassKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Base name of the node template, without prefix or instance index.
    pub fn node_name(self) -> &'static str {
        match self {
            Self::Null => "",
            Self::Render => "Render",
            Self::RenderWithClipMask => "RenderWithStencil",
            Self::ClipMaskSet => "RenderToStencilSet",
            Self::ClipMaskSetInverse => "RenderToStencilSetInverse",
            Self::ClipMaskIntersect => "RenderToStencilIntersect",
            Self::NewLayerBuffer => "NewBuffer",
            Self::StartLayer => "StartLayer",
            Self::Swap => "Swap",
            Self::Copy => "Copy",
            Self::Composite => "Composite",
            Self::CompositeWithClipMask => "CompositeWithStencil",
            Self::RenderQuad => "RenderQuad",
            Self::ClearSecondary => "ClearSecondary",
            Self::RenderToTexture => "RenderToTexture",
        }
    }

    pub fn channels(self) -> ChannelLayout {
        match self {
            Self::Null => ChannelLayout::new(0, 0),
            Self::NewLayerBuffer | Self::StartLayer => ChannelLayout::new(3, 4),
            Self::Swap | Self::Copy | Self::Composite | Self::CompositeWithClipMask => {
                ChannelLayout::new(4, 4)
            }
            Self::RenderToTexture => ChannelLayout::new(4, 3),
            _ => ChannelLayout::new(3, 3),
        }
    }

    /// Sub-pass of the node template that receives queued state.
    pub fn queue_pass(self) -> u32 {
        match self {
            Self::RenderWithClipMask | Self::ClipMaskIntersect | Self::CompositeWithClipMask => 1,
            Self::ClipMaskSet | Self::ClipMaskSetInverse => 2,
            _ => 0,
        }
    }

    /// Returns true for kinds that draw queued geometry.
    pub fn is_render(self) -> bool {
        matches!(
            self,
            Self::Render
                | Self::RenderWithClipMask
                | Self::ClipMaskSet
                | Self::ClipMaskSetInverse
                | Self::ClipMaskIntersect
        )
    }
}

/// Render state captured when a pass is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PassSettings {
    /// Scissor rectangle in target pixels, `None` when disabled.
    pub scissor: Option<Rect>,
    /// Stencil reference, `None` when no clip mask is active.
    pub stencil_ref: Option<u8>,
    /// UI transform, `None` for identity.
    pub transform: Option<Mat4>,
}

/// Geometry queued into a render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub geometry: GeometryId,
    pub translation: Vec2,
    pub material: MaterialId,
}

/// Draw items sharing one settings snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawBatch {
    pub settings: PassSettings,
    pub items: Vec<DrawItem>,
}

impl DrawBatch {
    pub fn new(settings: PassSettings) -> Self {
        Self {
            settings,
            items: Vec::new(),
        }
    }
}

/// Composite the current layer into a destination buffer.
///
/// The destination arrives on the side channel as `dst_in` (a cleared
/// node-local buffer when `None`) and leaves, composited, as `dst_out`. The
/// current layer passes through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePass {
    pub dst_in: Option<ConnectionId>,
    pub dst_out: ConnectionId,
    /// Blend material; set on the node every frame.
    pub material: MaterialId,
    pub settings: PassSettings,
}

/// Full-screen quad over the current layer.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadPass {
    pub material: MaterialId,
    pub settings: PassSettings,
}

/// Copy the current layer into external render target `external`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderToTexturePass {
    pub external: usize,
    pub settings: PassSettings,
}

/// One recorded step of the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    Null,
    Render(DrawBatch),
    RenderWithClipMask(DrawBatch),
    ClipMaskSet(DrawBatch),
    ClipMaskSetInverse(DrawBatch),
    ClipMaskIntersect(DrawBatch),
    /// Publish a cleared buffer as `out`.
    NewLayerBuffer { out: ConnectionId },
    /// Publish a cleared layer buffer as `fresh`; paired with a [`Pass::Swap`].
    StartLayer { fresh: ConnectionId },
    /// Exchange the current layer with `swap_in`; the old layer leaves as `swap_out`.
    Swap {
        swap_in: ConnectionId,
        swap_out: Option<ConnectionId>,
    },
    /// Copy the current layer into buffer `copy_in`, publishing it as `copy_out`.
    Copy {
        copy_in: ConnectionId,
        copy_out: ConnectionId,
    },
    Composite(CompositePass),
    CompositeWithClipMask(CompositePass),
    RenderQuad(QuadPass),
    ClearSecondary,
    RenderToTexture(RenderToTexturePass),
}

impl Pass {
    /// Empty draw pass of a render `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` does not draw geometry.
    pub fn batch(kind: PassKind, settings: PassSettings) -> Self {
        let batch = DrawBatch::new(settings);
        match kind {
            PassKind::Render => Self::Render(batch),
            PassKind::RenderWithClipMask => Self::RenderWithClipMask(batch),
            PassKind::ClipMaskSet => Self::ClipMaskSet(batch),
            PassKind::ClipMaskSetInverse => Self::ClipMaskSetInverse(batch),
            PassKind::ClipMaskIntersect => Self::ClipMaskIntersect(batch),
            other => panic!("{other:?} passes do not draw geometry"),
        }
    }

    pub fn kind(&self) -> PassKind {
        match self {
            Self::Null => PassKind::Null,
            Self::Render(_) => PassKind::Render,
            Self::RenderWithClipMask(_) => PassKind::RenderWithClipMask,
            Self::ClipMaskSet(_) => PassKind::ClipMaskSet,
            Self::ClipMaskSetInverse(_) => PassKind::ClipMaskSetInverse,
            Self::ClipMaskIntersect(_) => PassKind::ClipMaskIntersect,
            Self::NewLayerBuffer { .. } => PassKind::NewLayerBuffer,
            Self::StartLayer { .. } => PassKind::StartLayer,
            Self::Swap { .. } => PassKind::Swap,
            Self::Copy { .. } => PassKind::Copy,
            Self::Composite(_) => PassKind::Composite,
            Self::CompositeWithClipMask(_) => PassKind::CompositeWithClipMask,
            Self::RenderQuad(_) => PassKind::RenderQuad,
            Self::ClearSecondary => PassKind::ClearSecondary,
            Self::RenderToTexture(_) => PassKind::RenderToTexture,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn draw_batch(&self) -> Option<&DrawBatch> {
        match self {
            Self::Render(batch)
            | Self::RenderWithClipMask(batch)
            | Self::ClipMaskSet(batch)
            | Self::ClipMaskSetInverse(batch)
            | Self::ClipMaskIntersect(batch) => Some(batch),
            _ => None,
        }
    }

    pub fn draw_batch_mut(&mut self) -> Option<&mut DrawBatch> {
        match self {
            Self::Render(batch)
            | Self::RenderWithClipMask(batch)
            | Self::ClipMaskSet(batch)
            | Self::ClipMaskSetInverse(batch)
            | Self::ClipMaskIntersect(batch) => Some(batch),
            _ => None,
        }
    }

    /// Settings snapshot, for passes that carry one.
    pub fn settings(&self) -> Option<&PassSettings> {
        match self {
            Self::Composite(pass) | Self::CompositeWithClipMask(pass) => Some(&pass.settings),
            Self::RenderQuad(pass) => Some(&pass.settings),
            Self::RenderToTexture(pass) => Some(&pass.settings),
            _ => self.draw_batch().map(|batch| &batch.settings),
        }
    }

    /// Number of queued draw items.
    pub fn draw_count(&self) -> usize {
        self.draw_batch().map_or(0, |batch| batch.items.len())
    }

    /// Register the side connections this pass produces and consumes.
    ///
    /// Inputs are resolved before outputs, so a pass never consumes its own output.
    pub fn add_extra_connections(&self, map: &mut ConnectionMap) {
        match self {
            Self::NewLayerBuffer { out } => map.set_out(*out, SIDE_CHANNEL),
            Self::StartLayer { fresh } => map.set_out(*fresh, SIDE_CHANNEL),
            Self::Swap { swap_in, swap_out } => {
                map.set_in(*swap_in, SIDE_CHANNEL);
                if let Some(out) = swap_out {
                    map.set_out(*out, SIDE_CHANNEL);
                }
            }
            Self::Copy { copy_in, copy_out } => {
                map.set_in(*copy_in, SIDE_CHANNEL);
                map.set_out(*copy_out, SIDE_CHANNEL);
            }
            Self::Composite(pass) | Self::CompositeWithClipMask(pass) => {
                if let Some(dst_in) = pass.dst_in {
                    map.set_in(dst_in, SIDE_CHANNEL);
                }
                map.set_out(pass.dst_out, SIDE_CHANNEL);
            }
            Self::RenderToTexture(pass) => map.set_external(pass.external, SIDE_CHANNEL),
            _ => {}
        }
    }

    /// Write queued draws, materials and settings into `node`.
    pub fn write_pass<B: FrameGraphBackend + ?Sized>(
        &self,
        node: NodeId,
        writer: &mut PassWriter<'_, B>,
    ) {
        let sub_pass = self.kind().queue_pass();
        match self {
            Self::Render(batch)
            | Self::RenderWithClipMask(batch)
            | Self::ClipMaskSet(batch)
            | Self::ClipMaskSetInverse(batch)
            | Self::ClipMaskIntersect(batch) => writer.write_batch(node, sub_pass, batch),
            Self::Composite(pass) | Self::CompositeWithClipMask(pass) => {
                writer.write_quad(node, sub_pass, Some(pass.material), &pass.settings)
            }
            Self::RenderQuad(pass) => {
                writer.write_quad(node, sub_pass, Some(pass.material), &pass.settings)
            }
            Self::RenderToTexture(pass) => writer.write_quad(node, sub_pass, None, &pass.settings),
            Self::Null
            | Self::NewLayerBuffer { .. }
            | Self::StartLayer { .. }
            | Self::Swap { .. }
            | Self::Copy { .. }
            | Self::ClearSecondary => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_index_matches_all() {
        for (i, kind) in PassKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_render_kinds() {
        let render: Vec<_> = PassKind::ALL.iter().filter(|k| k.is_render()).collect();
        assert_eq!(render.len(), 5);
        for kind in render {
            let pass = Pass::batch(*kind, PassSettings::default());
            assert_eq!(pass.kind(), *kind);
            assert_eq!(pass.draw_count(), 0);
        }
    }

    #[test]
    #[should_panic(expected = "do not draw geometry")]
    fn test_batch_rejects_layer_kinds() {
        Pass::batch(PassKind::Swap, PassSettings::default());
    }

    #[test]
    fn test_side_channel_layouts() {
        for kind in [PassKind::Swap, PassKind::Copy, PassKind::Composite] {
            assert!(kind.channels().inputs > SIDE_CHANNEL);
            assert!(kind.channels().outputs > SIDE_CHANNEL);
        }
        assert!(PassKind::StartLayer.channels().outputs > SIDE_CHANNEL);
        assert!(PassKind::RenderToTexture.channels().inputs > SIDE_CHANNEL);
        assert_eq!(PassKind::Render.channels(), ChannelLayout::new(3, 3));
    }

    #[test]
    fn test_queue_pass_indices() {
        assert_eq!(PassKind::Render.queue_pass(), 0);
        assert_eq!(PassKind::RenderWithClipMask.queue_pass(), 1);
        assert_eq!(PassKind::ClipMaskSet.queue_pass(), 2);
        assert_eq!(PassKind::ClipMaskSetInverse.queue_pass(), 2);
        assert_eq!(PassKind::ClipMaskIntersect.queue_pass(), 1);
        assert_eq!(PassKind::CompositeWithClipMask.queue_pass(), 1);
    }

    #[test]
    fn test_settings_access() {
        let settings = PassSettings {
            scissor: Some(Rect::from_xywh(0, 0, 10, 10)),
            ..Default::default()
        };
        let quad = Pass::RenderQuad(QuadPass {
            material: MaterialId(1),
            settings,
        });
        assert_eq!(quad.settings(), Some(&settings));
        assert_eq!(Pass::ClearSecondary.settings(), None);
    }
}
