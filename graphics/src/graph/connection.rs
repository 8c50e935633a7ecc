//! Resolution of side connections during graph assembly.
//!
//! While the builder walks the pass sequence it marks each node as current
//! and lets the pass register side connections. Outputs are recorded by
//! connection id; an input looks up the node that produced that id and
//! records a link. Links are applied after all primary connections.

use std::collections::HashMap;

use crate::backend::{FrameGraphBackend, NodeId, NodeRef};

use super::ConnectionId;

/// Side link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeLink {
    pub from: NodeId,
    pub from_channel: u32,
    pub to: NodeId,
    pub to_channel: u32,
}

/// Link from an external render target into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalLink {
    pub external: usize,
    pub to: NodeId,
    pub to_channel: u32,
}

/// Connection ids of the current frame mapped to producing nodes.
#[derive(Debug, Default)]
pub struct ConnectionMap {
    current: Option<NodeId>,
    outputs: HashMap<ConnectionId, (NodeId, u32)>,
    links: Vec<NodeLink>,
    externals: Vec<ExternalLink>,
}

impl ConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, keeping allocations.
    pub fn clear(&mut self) {
        self.current = None;
        self.outputs.clear();
        self.links.clear();
        self.externals.clear();
    }

    /// Node that following registrations refer to.
    pub fn set_current(&mut self, node: NodeId) {
        self.current = Some(node);
    }

    fn current(&self) -> NodeId {
        match self.current {
            Some(node) => node,
            None => panic!("connection registered before any node was made current"),
        }
    }

    /// The current node produces `id` on `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was already produced this frame.
    pub fn set_out(&mut self, id: ConnectionId, channel: u32) {
        let node = self.current();
        if let Some((producer, _)) = self.outputs.insert(id, (node, channel)) {
            panic!("connection {id:?} produced twice (by {producer:?} and {node:?})");
        }
    }

    /// The current node consumes `id` on `channel`.
    ///
    /// # Panics
    ///
    /// Panics if no node has produced `id` yet.
    pub fn set_in(&mut self, id: ConnectionId, channel: u32) {
        let node = self.current();
        let Some(&(from, from_channel)) = self.outputs.get(&id) else {
            panic!("connection {id:?} consumed by {node:?} before it was produced");
        };
        self.links.push(NodeLink {
            from,
            from_channel,
            to: node,
            to_channel: channel,
        });
    }

    /// The current node reads external render target `external` on `channel`.
    pub fn set_external(&mut self, external: usize, channel: u32) {
        let node = self.current();
        self.externals.push(ExternalLink {
            external,
            to: node,
            to_channel: channel,
        });
    }

    pub fn links(&self) -> &[NodeLink] {
        &self.links
    }

    pub fn external_links(&self) -> &[ExternalLink] {
        &self.externals
    }

    /// Node and channel that produced `id`, if any.
    pub fn producer(&self, id: ConnectionId) -> Option<(NodeId, u32)> {
        self.outputs.get(&id).copied()
    }

    /// Hand every collected link to the backend.
    pub fn apply<B: FrameGraphBackend + ?Sized>(&self, backend: &mut B) {
        for link in &self.links {
            backend.connect(
                NodeRef::Node(link.from),
                link.from_channel,
                NodeRef::Node(link.to),
                link.to_channel,
            );
        }
        for link in &self.externals {
            backend.connect_external(link.external, NodeRef::Node(link.to), link.to_channel);
        }
    }
}
