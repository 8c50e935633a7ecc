//! UI frame graph.
//!
//! Every frame the UI draw stream is recorded into a [`PassSequence`]. At the
//! end of the frame the [`GraphBuilder`] maps the sequence onto reusable
//! engine nodes from the [`NodePool`], wires them into a chain and fills
//! each node's render queue.
//!
//! # Architecture
//!
//! | Layer | Type | Purpose |
//! |-------|------|---------|
//! | Interface | [`RenderInterface`](crate::RenderInterface) | Inbound UI calls |
//! | Layers | [`LayerStack`] | Push, composite and pop of offscreen layers |
//! | Sequence | [`PassSequence`] | Ordered passes of the current frame |
//! | **Builder** | [`GraphBuilder`] | Node assignment and wiring |
//! | Execution | [`PassWriter`] | Render queues and per-node state |
//!
//! # Channels
//!
//! Consecutive nodes are linked on the primary channels 0..3: current layer,
//! secondary scratch buffer and stencil. Buffers that skip nodes travel on
//! [`SIDE_CHANNEL`] and are matched by [`ConnectionId`] through the
//! [`ConnectionMap`].

mod builder;
mod connection;
mod execute;
mod layer;
mod node_pool;
mod pass;
mod sequence;

pub use builder::{FrameStats, GraphBuilder};
pub use connection::{ConnectionMap, ExternalLink, NodeLink};
pub use execute::{FrameArena, PassWriter};
pub use layer::{BlendMode, CompositeOptions, LayerHandle, LayerStack};
pub use node_pool::NodePool;
pub use pass::{
    ChannelLayout, CompositePass, DrawBatch, DrawItem, Pass, PassKind, PassSettings, QuadPass,
    RenderToTexturePass, SIDE_CHANNEL,
};
pub use sequence::PassSequence;

/// Frame-scoped id of a buffer travelling on the side channel.
///
/// Ids are handed out by [`PassSequence::add_connection`] and restart at 0
/// every frame. Each id is produced by exactly one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u32);

impl ConnectionId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}
