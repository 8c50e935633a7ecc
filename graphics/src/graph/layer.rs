//! Layer stack: push, composite and pop of offscreen layers.
//!
//! The top layer is always the one on the primary chain (channel 0 of every
//! node). Every other layer lives on a side connection, identified by the
//! [`ConnectionId`] of the pass that last produced its buffer. Moving a layer
//! on or off the chain is a [`Pass::Swap`]; because every such move produces
//! a fresh id, each id has exactly one producer.
//!
//! # Example
//!
//! ```ignore
//! let mut layers = LayerStack::new(true);
//! let mut seq = PassSequence::new();
//!
//! let top = layers.push(&mut seq);
//! seq.queue_draw(PassKind::Render, &settings, item);
//! layers.composite(&mut seq, top, LayerHandle::ROOT, &options, false, |_| {});
//! layers.pop(&mut seq);
//! // StartLayer, Swap, Render, Composite, Swap
//! ```

use crate::backend::MaterialId;

use super::ConnectionId;
use super::pass::{CompositePass, Pass, PassSettings};
use super::sequence::PassSequence;

/// Handle to a layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(u32);

impl LayerHandle {
    /// The root layer, rendered into the output.
    pub const ROOT: Self = Self(0);

    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a composited layer is combined with its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Premultiplied alpha blending.
    #[default]
    Normal,
    /// Overwrite the destination without blending.
    Replace,
}

/// Per-call options of [`LayerStack::composite`].
#[derive(Debug, Clone)]
pub struct CompositeOptions {
    /// Blend material of the composite pass.
    pub material: MaterialId,
    /// Settings of the composite pass. A stencil reference selects
    /// [`Pass::CompositeWithClipMask`].
    pub settings: PassSettings,
}

impl CompositeOptions {
    /// Composite with `material` and default settings.
    pub fn new(material: MaterialId) -> Self {
        Self {
            material,
            settings: PassSettings::default(),
        }
    }
}

/// Passes that preserved a layer before filters ran on a copy of it.
#[derive(Debug, Clone, Copy)]
struct PreservedCopy {
    copy_pass: usize,
    swap_pass: usize,
    restore_pass: usize,
    copy_in: ConnectionId,
    released: ConnectionId,
}

#[derive(Debug, Clone, Copy, Default)]
struct Layer {
    /// Side connection holding the layer, `None` while it is on the chain.
    connection: Option<ConnectionId>,
    copy: Option<PreservedCopy>,
}

/// Stack of layers for the current frame.
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
    elide_copies: bool,
}

impl LayerStack {
    /// Create a stack holding only the root layer.
    pub fn new(elide_copies: bool) -> Self {
        Self {
            layers: vec![Layer::default()],
            elide_copies,
        }
    }

    /// Number of layers, at least 1.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn top(&self) -> LayerHandle {
        LayerHandle((self.layers.len() - 1) as u32)
    }

    /// Side connection holding `layer`, `None` for the layer on the chain.
    ///
    /// # Panics
    ///
    /// Panics if `layer` has been popped.
    pub fn connection(&self, layer: LayerHandle) -> Option<ConnectionId> {
        self.layer(layer).connection
    }

    /// Drop every layer except the root.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.layers.push(Layer::default());
    }

    fn layer(&self, handle: LayerHandle) -> &Layer {
        match self.layers.get(handle.index()) {
            Some(layer) => layer,
            None => panic!(
                "layer {} used after pop (depth {})",
                handle.index(),
                self.layers.len()
            ),
        }
    }

    fn side_connection(&self, index: usize) -> ConnectionId {
        match self.layers[index].connection {
            Some(id) => id,
            None => panic!("layer {index} is expected off the primary chain"),
        }
    }

    /// Push a fresh transparent layer and make it the top.
    pub fn push(&mut self, seq: &mut PassSequence) -> LayerHandle {
        let fresh = seq.add_connection();
        seq.add_pass(Pass::StartLayer { fresh });
        let displaced = seq.add_connection();
        seq.add_pass(Pass::Swap {
            swap_in: fresh,
            swap_out: Some(displaced),
        });

        if let Some(top) = self.layers.last_mut() {
            top.connection = Some(displaced);
        }
        self.layers.push(Layer::default());
        log::trace!("LayerStack: pushed layer {}", self.layers.len() - 1);
        self.top()
    }

    /// Composite `source` into `destination`.
    ///
    /// `apply_filters` records the filter passes; they run on the primary
    /// chain, on a copy of `source` unless source and destination are the
    /// same layer, in which case the filters are applied in place and no
    /// composite pass is recorded.
    ///
    /// # Panics
    ///
    /// Panics if either handle has been popped.
    pub fn composite(
        &mut self,
        seq: &mut PassSequence,
        source: LayerHandle,
        destination: LayerHandle,
        options: &CompositeOptions,
        has_filters: bool,
        apply_filters: impl FnOnce(&mut PassSequence),
    ) {
        self.layer(source);
        self.layer(destination);
        let src = source.index();
        let dst = destination.index();
        let top = self.layers.len() - 1;

        // Bring the source onto the chain.
        let displaced = src != top;
        if displaced {
            let swap_in = self.side_connection(src);
            let swap_out = seq.add_connection();
            seq.add_pass(Pass::Swap {
                swap_in,
                swap_out: Some(swap_out),
            });
            self.layers[top].connection = Some(swap_out);
            self.layers[src] = Layer::default();
        }

        if src == dst {
            apply_filters(seq);
            if displaced {
                self.restore_top(seq, src, None);
            }
            return;
        }

        // Keep the original source when filters would overwrite it.
        let preserved = if has_filters {
            let copy_in = seq.acquire_layer_buffer();
            let copy_out = seq.add_connection();
            let copy_pass = seq.add_pass(Pass::Copy { copy_in, copy_out });
            let saved = seq.add_connection();
            let swap_pass = seq.add_pass(Pass::Swap {
                swap_in: copy_out,
                swap_out: Some(saved),
            });
            Some((saved, copy_pass, swap_pass, copy_in))
        } else {
            None
        };

        apply_filters(seq);

        let dst_out = seq.add_connection();
        let composite = CompositePass {
            dst_in: Some(self.side_connection(dst)),
            dst_out,
            material: options.material,
            settings: options.settings,
        };
        if options.settings.stencil_ref.is_some() {
            seq.add_pass(Pass::CompositeWithClipMask(composite));
        } else {
            seq.add_pass(Pass::Composite(composite));
        }
        self.layers[dst] = Layer {
            connection: Some(dst_out),
            copy: None,
        };

        match (preserved, displaced) {
            (Some((saved, copy_pass, swap_pass, copy_in)), false) => {
                let released = seq.add_connection();
                let restore_pass = seq.add_pass(Pass::Swap {
                    swap_in: saved,
                    swap_out: Some(released),
                });
                seq.release_layer_buffer(released);
                self.layers[src].copy = Some(PreservedCopy {
                    copy_pass,
                    swap_pass,
                    restore_pass,
                    copy_in,
                    released,
                });
            }
            (Some((saved, ..)), true) => self.restore_top(seq, src, Some(saved)),
            (None, true) => self.restore_top(seq, src, None),
            (None, false) => {}
        }
    }

    /// Swap the displaced top back onto the chain.
    ///
    /// The buffer on the chain becomes layer `src` unless `saved` already
    /// holds its original, in which case it is released as a spare.
    fn restore_top(&mut self, seq: &mut PassSequence, src: usize, saved: Option<ConnectionId>) {
        let top = self.layers.len() - 1;
        let swap_in = self.side_connection(top);
        let swap_out = seq.add_connection();
        seq.add_pass(Pass::Swap {
            swap_in,
            swap_out: Some(swap_out),
        });
        match saved {
            Some(saved) => {
                seq.release_layer_buffer(swap_out);
                self.layers[src].connection = Some(saved);
            }
            None => self.layers[src].connection = Some(swap_out),
        }
        self.layers[top].connection = None;
    }

    /// Pop the top layer and bring the layer below back onto the chain.
    ///
    /// # Panics
    ///
    /// Panics when only the root layer is left.
    pub fn pop(&mut self, seq: &mut PassSequence) {
        assert!(self.layers.len() > 1, "cannot pop the root layer");
        let popped = self.layers.pop().unwrap_or_default();

        if self.elide_copies {
            if let Some(copy) = popped.copy {
                self.elide_copy(seq, copy);
            }
        }

        let new_top = self.layers.len() - 1;
        let swap_in = self.side_connection(new_top);
        let spare = seq.add_connection();
        seq.add_pass(Pass::Swap {
            swap_in,
            swap_out: Some(spare),
        });
        seq.release_layer_buffer(spare);
        self.layers[new_top] = Layer::default();
        log::trace!("LayerStack: popped to depth {}", self.layers.len());
    }

    /// Drop the copy that preserved a layer if nothing used the original since.
    fn elide_copy(&mut self, seq: &mut PassSequence, copy: PreservedCopy) {
        let untouched = seq.len().checked_sub(1) == Some(copy.restore_pass);
        if untouched && seq.withdraw_layer_buffer(copy.released) {
            seq.nullify(copy.copy_pass);
            seq.nullify(copy.swap_pass);
            seq.nullify(copy.restore_pass);
            seq.release_layer_buffer(copy.copy_in);
        }
    }

    /// Connections currently held by layers off the chain.
    pub fn side_connections(&self) -> Vec<ConnectionId> {
        self.layers.iter().filter_map(|layer| layer.connection).collect()
    }
}
