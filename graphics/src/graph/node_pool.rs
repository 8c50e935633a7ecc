//! Reusable engine nodes, grouped by pass kind.
//!
//! Nodes are created on demand and never destroyed; a frame that needs fewer
//! nodes than the pool holds disables the rest. Growing the pool requires
//! the engine to re-instantiate its graph, so capacity is doubled to the
//! next power of two and only re-evaluated when a frame runs short.

use crate::backend::{FrameGraphBackend, NodeId, NodeRef, TextureId};
use crate::error::GraphicsResult;

use super::pass::PassKind;

/// Engine nodes available to the graph builder.
#[derive(Debug)]
pub struct NodePool {
    prefix: String,
    nodes: [Vec<NodeId>; PassKind::COUNT],
    externals: Vec<TextureId>,
}

impl NodePool {
    /// Create an empty pool. Node names are `"<prefix>/<base><index>"`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            nodes: std::array::from_fn(|_| Vec::new()),
            externals: Vec::new(),
        }
    }

    /// Capacity for `required` nodes given the `current` capacity.
    pub fn grow_capacity(current: usize, required: usize) -> usize {
        if required == 0 {
            current
        } else {
            required.next_power_of_two().max(current)
        }
    }

    pub fn capacity(&self, kind: PassKind) -> usize {
        self.nodes[kind.index()].len()
    }

    pub fn nodes(&self, kind: PassKind) -> &[NodeId] {
        &self.nodes[kind.index()]
    }

    /// The `index`-th node of `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the pool holds fewer nodes of `kind`.
    pub fn node(&self, kind: PassKind, index: usize) -> NodeId {
        match self.nodes[kind.index()].get(index) {
            Some(node) => *node,
            None => panic!(
                "node pool holds {} {kind:?} nodes, node {index} requested",
                self.capacity(kind)
            ),
        }
    }

    /// Total number of nodes created.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// External render targets registered by the last rebuild.
    pub fn externals(&self) -> &[TextureId] {
        &self.externals
    }

    fn node_name(&self, kind: PassKind, index: usize) -> String {
        format!("{}/{}{index}", self.prefix, kind.node_name())
    }

    /// Make room for `counts` nodes of each kind, indexed by [`PassKind::index`].
    ///
    /// Rebuilds the engine graph when a kind is short or `externals` differ
    /// from the registered targets. Returns whether a rebuild happened.
    pub fn ensure_capacity<B: FrameGraphBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        counts: &[usize; PassKind::COUNT],
        externals: &[TextureId],
    ) -> GraphicsResult<bool> {
        let short = PassKind::ALL
            .iter()
            .any(|kind| *kind != PassKind::Null && counts[kind.index()] > self.capacity(*kind));
        if !short && self.externals == externals {
            return Ok(false);
        }
        uiframe_core::profile_scope!("node_pool_rebuild");

        backend.set_external_targets(externals);
        self.externals = externals.to_vec();

        backend.clear_connections();
        backend.connect(NodeRef::Start, 0, NodeRef::End, 0);
        backend.connect_external(0, NodeRef::End, 1);
        backend.connect_external(1, NodeRef::Start, 0);

        for kind in PassKind::ALL {
            if kind == PassKind::Null {
                continue;
            }
            let current = self.capacity(kind);
            let target = Self::grow_capacity(current, counts[kind.index()]);
            for index in current..target {
                let name = self.node_name(kind, index);
                let node = backend.create_node(kind, &name)?;
                self.nodes[kind.index()].push(node);
            }
            if target > current {
                log::debug!("NodePool: {kind:?} capacity {current} -> {target}");
            }
        }

        backend.commit()?;
        for node in self.nodes.iter().flatten() {
            backend.set_node_enabled(*node, false);
        }
        backend.clear_connections();

        log::debug!(
            "NodePool: rebuilt with {} nodes and {} external targets",
            self.len(),
            self.externals.len()
        );
        Ok(true)
    }
}
