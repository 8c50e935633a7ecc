//! Frame graph assembly.
//!
//! [`GraphBuilder::populate`] turns the recorded [`PassSequence`] into
//! engine state: it grows the [`NodePool`] when needed, assigns nodes to
//! passes in sequence order, wires them into a chain, applies side and
//! external connections, commits, and finally writes every active node.

use uiframe_core::math::ortho_2d;

use crate::backend::{FrameGraphBackend, NodeId, NodeRef, TextureId};
use crate::error::GraphicsResult;

use super::connection::ConnectionMap;
use super::execute::{FrameArena, PassWriter};
use super::node_pool::NodePool;
use super::pass::{ChannelLayout, Pass, PassKind};
use super::sequence::PassSequence;

/// Summary of one populated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Nodes enabled for the frame.
    pub active_nodes: usize,
    /// Render objects queued across all nodes.
    pub render_objects: usize,
    /// Side and external links resolved through connection ids.
    pub side_links: usize,
    /// Whether the node pool had to be rebuilt.
    pub rebuilt: bool,
}

/// Maps pass sequences onto pooled engine nodes.
#[derive(Debug)]
pub struct GraphBuilder {
    pool: NodePool,
    connections: ConnectionMap,
    arena: FrameArena,
    max_primary_channels: u32,
}

impl GraphBuilder {
    pub fn new(node_prefix: impl Into<String>, max_primary_channels: u32) -> Self {
        Self {
            pool: NodePool::new(node_prefix),
            connections: ConnectionMap::new(),
            arena: FrameArena::new(),
            max_primary_channels,
        }
    }

    pub fn node_pool(&self) -> &NodePool {
        &self.pool
    }

    /// Connection map of the last populated frame.
    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    /// Build and populate the engine graph for `seq`.
    ///
    /// `externals` lists the output, the background and the pooled render
    /// targets; `target_size` is the viewport in pixels.
    ///
    /// # Panics
    ///
    /// Panics if a pass consumes a connection that no earlier pass produced.
    pub fn populate<B: FrameGraphBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        seq: &PassSequence,
        externals: &[TextureId],
        target_size: (u32, u32),
    ) -> GraphicsResult<FrameStats> {
        uiframe_core::profile_function!();

        let rebuilt = self
            .pool
            .ensure_capacity(backend, &seq.kind_counts(), externals)?;

        backend.clear_connections();
        self.connections.clear();
        self.arena.reset(seq.draw_count());

        let mut used = [0usize; PassKind::COUNT];
        let mut active: Vec<(NodeId, &Pass)> = Vec::with_capacity(seq.len());
        let mut prev = (NodeRef::Start, ChannelLayout::START);

        for pass in seq.passes().iter().filter(|pass| !pass.is_null()) {
            let kind = pass.kind();
            let node = self.pool.node(kind, used[kind.index()]);
            used[kind.index()] += 1;
            backend.set_node_enabled(node, true);

            let layout = kind.channels();
            let channels = prev
                .1
                .outputs
                .min(layout.inputs)
                .min(self.max_primary_channels);
            for channel in 0..channels {
                backend.connect(prev.0, channel, NodeRef::Node(node), channel);
            }

            self.connections.set_current(node);
            pass.add_extra_connections(&mut self.connections);

            log::trace!("GraphBuilder: {kind:?} -> {node:?} ({channels} primary channels)");
            prev = (NodeRef::Node(node), layout);
            active.push((node, pass));
        }

        for kind in PassKind::ALL {
            for node in &self.pool.nodes(kind)[used[kind.index()]..] {
                backend.set_node_enabled(*node, false);
            }
        }

        self.connections.apply(backend);
        backend.connect(prev.0, 0, NodeRef::End, 0);
        backend.connect_external(0, NodeRef::End, 1);
        backend.connect_external(1, NodeRef::Start, 0);
        backend.commit()?;

        let mut writer = PassWriter::new(backend, &mut self.arena, target_size);
        for (node, pass) in &active {
            pass.write_pass(*node, &mut writer);
        }

        let (width, height) = target_size;
        backend.set_projection(ortho_2d(width as f32, height as f32));
        backend.update_transforms(self.arena.transforms());

        let stats = FrameStats {
            active_nodes: active.len(),
            render_objects: self.arena.len(),
            side_links: self.connections.links().len() + self.connections.external_links().len(),
            rebuilt,
        };
        log::debug!(
            "GraphBuilder: {} nodes, {} objects, {} side links",
            stats.active_nodes,
            stats.render_objects,
            stats.side_links
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, GeometryId, MaterialId};
    use crate::graph::ConnectionId;
    use crate::graph::pass::{CompositePass, DrawItem, PassSettings};
    use uiframe_core::math::{FULL_REGION, Vec2};

    const EXTERNALS: [TextureId; 2] = [TextureId(100), TextureId(101)];

    fn render_then_composite() -> PassSequence {
        let mut seq = PassSequence::new();
        seq.queue_draw(
            PassKind::Render,
            &PassSettings::default(),
            DrawItem {
                geometry: GeometryId(1),
                translation: Vec2::new(3.0, 4.0),
                material: MaterialId(1),
            },
        );
        seq.add_pass(Pass::Composite(CompositePass {
            dst_in: None,
            dst_out: ConnectionId::new(1),
            material: MaterialId(2),
            settings: PassSettings::default(),
        }));
        seq
    }

    #[test]
    fn test_render_composite_chain() {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 3);
        let seq = render_then_composite();

        let stats = builder
            .populate(&mut backend, &seq, &EXTERNALS, (640, 480))
            .unwrap();

        assert_eq!(stats.active_nodes, 2);
        assert_eq!(backend.enabled_nodes().len(), 2);
        let render = builder.node_pool().node(PassKind::Render, 0);
        let composite = builder.node_pool().node(PassKind::Composite, 0);
        assert_eq!(
            backend.primary_chain(),
            vec![
                NodeRef::Start,
                NodeRef::Node(render),
                NodeRef::Node(composite),
                NodeRef::End
            ]
        );
        assert_eq!(
            backend.node_pass(render, 0).unwrap().scissor,
            Some(FULL_REGION)
        );
    }

    #[test]
    fn test_primary_channels_limited() {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 1);
        let seq = render_then_composite();
        builder
            .populate(&mut backend, &seq, &EXTERNALS, (64, 64))
            .unwrap();

        let render = builder.node_pool().node(PassKind::Render, 0);
        let into_render = backend
            .committed_links()
            .iter()
            .filter(|link| {
                matches!(link, crate::backend::dummy::DummyLink::Node { to, .. } if *to == NodeRef::Node(render))
            })
            .count();
        assert_eq!(into_render, 1);
    }

    #[test]
    fn test_transforms_uploaded_in_bulk() {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 3);
        let seq = render_then_composite();
        builder
            .populate(&mut backend, &seq, &EXTERNALS, (64, 64))
            .unwrap();

        assert_eq!(backend.transforms().len(), 1);
        assert_eq!(backend.transforms()[0][(0, 3)], 3.0);
        assert_eq!(backend.projection(), ortho_2d(64.0, 64.0));
    }

    #[test]
    fn test_empty_sequence_connects_start_to_end() {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 3);
        let stats = builder
            .populate(&mut backend, &PassSequence::new(), &EXTERNALS, (8, 8))
            .unwrap();
        assert_eq!(stats.active_nodes, 0);
        assert_eq!(backend.primary_chain(), vec![NodeRef::Start, NodeRef::End]);
    }

    #[test]
    #[should_panic(expected = "before it was produced")]
    fn test_unproduced_connection_panics() {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 3);
        let mut seq = PassSequence::new();
        seq.add_pass(Pass::Swap {
            swap_in: ConnectionId::new(5),
            swap_out: None,
        });
        let _ = builder.populate(&mut backend, &seq, &EXTERNALS, (8, 8));
    }
}
