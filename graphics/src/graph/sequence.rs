//! Per-frame pass sequence.
//!
//! Draw calls are batched into the last pass when kind and settings match,
//! which keeps the number of engine nodes proportional to state changes
//! rather than to draw calls.

use super::ConnectionId;
use super::pass::{DrawBatch, DrawItem, Pass, PassKind, PassSettings};

/// Passes recorded for the current frame.
#[derive(Debug, Default)]
pub struct PassSequence {
    passes: Vec<Pass>,
    next_connection: u32,
    spare_buffers: Vec<ConnectionId>,
}

impl PassSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Kinds of the recorded passes, in order.
    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(Pass::kind).collect()
    }

    /// Append a pass and return its index.
    pub fn add_pass(&mut self, pass: Pass) -> usize {
        log::trace!("PassSequence: recording {:?}", pass.kind());
        self.passes.push(pass);
        self.passes.len() - 1
    }

    /// Return the last pass if it has `kind` and `settings`, otherwise open a new one.
    ///
    /// # Panics
    ///
    /// Panics if `kind` does not draw geometry.
    pub fn get_or_open_batch(&mut self, kind: PassKind, settings: &PassSettings) -> &mut DrawBatch {
        let reuse = self.passes.last().is_some_and(|last| {
            last.kind() == kind
                && last
                    .draw_batch()
                    .is_some_and(|batch| batch.settings == *settings)
        });
        if !reuse {
            self.add_pass(Pass::batch(kind, *settings));
        }
        match self.passes.last_mut().and_then(Pass::draw_batch_mut) {
            Some(batch) => batch,
            None => unreachable!("a draw pass was just ensured at the end"),
        }
    }

    /// Queue one draw item, batching with the previous pass when possible.
    pub fn queue_draw(&mut self, kind: PassKind, settings: &PassSettings, item: DrawItem) {
        self.get_or_open_batch(kind, settings).items.push(item);
    }

    /// Allocate a new frame-scoped connection id.
    pub fn add_connection(&mut self) -> ConnectionId {
        let id = ConnectionId::new(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// Number of connection ids handed out this frame.
    pub fn connection_count(&self) -> u32 {
        self.next_connection
    }

    /// Get a buffer on the side channel to copy into.
    ///
    /// Reuses the most recently released buffer, or records a
    /// [`Pass::NewLayerBuffer`] producing a new one.
    pub fn acquire_layer_buffer(&mut self) -> ConnectionId {
        if let Some(id) = self.spare_buffers.pop() {
            return id;
        }
        let out = self.add_connection();
        self.add_pass(Pass::NewLayerBuffer { out });
        out
    }

    /// Make a buffer that is no longer needed available to [`acquire_layer_buffer`](Self::acquire_layer_buffer).
    pub fn release_layer_buffer(&mut self, id: ConnectionId) {
        self.spare_buffers.push(id);
    }

    /// Withdraw `id` from the spare buffers. Returns false if it was not spare.
    pub fn withdraw_layer_buffer(&mut self, id: ConnectionId) -> bool {
        match self.spare_buffers.iter().rposition(|spare| *spare == id) {
            Some(pos) => {
                self.spare_buffers.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn spare_buffers(&self) -> &[ConnectionId] {
        &self.spare_buffers
    }

    /// Replace the pass at `index` by [`Pass::Null`].
    pub fn nullify(&mut self, index: usize) {
        log::trace!(
            "PassSequence: eliding {:?} at {index}",
            self.passes[index].kind()
        );
        self.passes[index] = Pass::Null;
    }

    /// Number of non-null passes of each kind, indexed by [`PassKind::index`].
    pub fn kind_counts(&self) -> [usize; PassKind::COUNT] {
        let mut counts = [0; PassKind::COUNT];
        for pass in self.passes.iter().filter(|pass| !pass.is_null()) {
            counts[pass.kind().index()] += 1;
        }
        counts
    }

    /// Total number of queued draw items.
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(Pass::draw_count).sum()
    }

    /// Reset for the next frame, keeping allocations. Connection ids restart at 0.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.spare_buffers.clear();
        self.next_connection = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GeometryId, MaterialId};
    use rstest::rstest;
    use uiframe_core::math::{Mat4, Rect, Vec2};

    fn item(n: u64) -> DrawItem {
        DrawItem {
            geometry: GeometryId(n),
            translation: Vec2::new(n as f32, 0.0),
            material: MaterialId(1),
        }
    }

    #[rstest]
    #[case::one(1)]
    #[case::few(3)]
    #[case::many(100)]
    fn test_identical_settings_coalesce(#[case] count: u64) {
        let mut seq = PassSequence::new();
        let settings = PassSettings {
            scissor: Some(Rect::from_xywh(0, 0, 20, 20)),
            stencil_ref: None,
            transform: Some(Mat4::new_scaling(2.0)),
        };
        for n in 0..count {
            seq.queue_draw(PassKind::Render, &settings, item(n));
        }
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.draw_count(), count as usize);
        let batch = seq.passes()[0].draw_batch().unwrap();
        assert_eq!(batch.items[0].geometry, GeometryId(0));
    }

    #[test]
    fn test_setting_change_opens_pass() {
        let mut seq = PassSequence::new();
        let plain = PassSettings::default();
        let scissored = PassSettings {
            scissor: Some(Rect::from_xywh(1, 1, 5, 5)),
            ..plain
        };
        seq.queue_draw(PassKind::Render, &plain, item(0));
        seq.queue_draw(PassKind::Render, &scissored, item(1));
        seq.queue_draw(PassKind::Render, &scissored, item(2));
        seq.queue_draw(PassKind::Render, &plain, item(3));
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.passes()[0].settings(), Some(&plain));
        assert_eq!(seq.passes()[1].draw_count(), 2);
    }

    #[test]
    fn test_kind_change_opens_pass() {
        let mut seq = PassSequence::new();
        let settings = PassSettings::default();
        seq.queue_draw(PassKind::Render, &settings, item(0));
        seq.queue_draw(PassKind::ClipMaskSet, &settings, item(1));
        seq.queue_draw(PassKind::Render, &settings, item(2));
        assert_eq!(
            seq.kinds(),
            vec![PassKind::Render, PassKind::ClipMaskSet, PassKind::Render]
        );
    }

    #[test]
    fn test_no_batching_across_layer_passes() {
        let mut seq = PassSequence::new();
        let settings = PassSettings::default();
        seq.queue_draw(PassKind::Render, &settings, item(0));
        seq.add_pass(Pass::ClearSecondary);
        seq.queue_draw(PassKind::Render, &settings, item(1));
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_layer_buffers_reuse_released() {
        let mut seq = PassSequence::new();
        let first = seq.acquire_layer_buffer();
        assert_eq!(seq.kinds(), vec![PassKind::NewLayerBuffer]);
        seq.release_layer_buffer(first);
        assert_eq!(seq.acquire_layer_buffer(), first);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_withdraw_layer_buffer() {
        let mut seq = PassSequence::new();
        let id = seq.add_connection();
        seq.release_layer_buffer(id);
        assert!(seq.withdraw_layer_buffer(id));
        assert!(!seq.withdraw_layer_buffer(id));
        assert!(seq.spare_buffers().is_empty());
    }

    #[test]
    fn test_clear_resets_connections() {
        let mut seq = PassSequence::new();
        seq.add_connection();
        seq.add_connection();
        seq.add_pass(Pass::ClearSecondary);
        seq.clear();
        assert!(seq.is_empty());
        assert_eq!(seq.add_connection(), ConnectionId::new(0));
    }

    #[test]
    fn test_kind_counts_skip_null() {
        let mut seq = PassSequence::new();
        seq.add_pass(Pass::ClearSecondary);
        let index = seq.add_pass(Pass::ClearSecondary);
        seq.nullify(index);
        let counts = seq.kind_counts();
        assert_eq!(counts[PassKind::ClearSecondary.index()], 1);
        assert_eq!(counts[PassKind::Null.index()], 0);
    }
}
