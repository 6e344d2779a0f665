//! Frame-scoped geometry batches.
//!
//! A batch is sized once per frame with `start(n)`, filled with exactly `n`
//! `append` calls, and closed with `end()`. A closed batch accepts neither
//! appends nor another `end()` until it is started again. The backing array
//! is reused as long as `n` stays the same from frame to frame.

use std::rc::Rc;

use crate::api::{BufferKind, GraphicsApi, RawHandle};

use super::handle::BufferHandle;
use super::records::Record;

/// Host-side array of records with a write cursor.
#[derive(Debug)]
pub struct GeometryBatch<R: Record> {
    backing: Box<[R]>,
    len: usize,
    /// Between `start` and `end`.
    open: bool,
    reallocations: u64,
}

impl<R: Record> Default for GeometryBatch<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> GeometryBatch<R> {
    pub fn new() -> Self {
        Self {
            backing: Box::default(),
            len: 0,
            open: false,
            reallocations: 0,
        }
    }

    /// Prepares the batch for exactly `capacity` records.
    ///
    /// The backing array is replaced only when `capacity` changes; the cursor
    /// is always rewound.
    pub fn start(&mut self, capacity: usize) {
        if capacity != self.backing.len() {
            self.backing = vec![R::zeroed(); capacity].into_boxed_slice();
            self.reallocations += 1;
        }
        self.len = 0;
        self.open = true;
    }

    #[inline]
    pub fn append(&mut self, record: R) {
        assert!(self.open, "batch appended without start");
        assert!(
            self.len < self.backing.len(),
            "batch overflow: append beyond capacity {}",
            self.backing.len()
        );
        self.backing[self.len] = record;
        self.len += 1;
    }

    /// Closes the batch and returns its records.
    pub fn end(&mut self) -> &[R] {
        assert!(self.open, "batch ended without start");
        assert!(
            self.len == self.backing.len(),
            "batch underfilled: {} of {} records appended",
            self.len,
            self.backing.len()
        );
        self.open = false;
        &self.backing
    }

    /// True between `start` and `end`.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.backing.len()
    }

    /// Records appended since the last `start`.
    pub fn records(&self) -> &[R] {
        &self.backing[..self.len]
    }

    /// Number of times the backing array has been replaced.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}

/// A geometry batch paired with the API buffer it uploads into.
pub struct GpuBatch<A: GraphicsApi, R: Record> {
    batch: GeometryBatch<R>,
    buffer: BufferHandle<A>,
}

impl<A: GraphicsApi, R: Record> GpuBatch<A, R> {
    pub fn new(api: &Rc<A>, kind: BufferKind) -> Self {
        Self {
            batch: GeometryBatch::new(),
            buffer: BufferHandle::new(Rc::clone(api), api.create_buffer(kind)),
        }
    }

    #[inline]
    pub fn start(&mut self, capacity: usize) {
        self.batch.start(capacity);
    }

    #[inline]
    pub fn append(&mut self, record: R) {
        self.batch.append(record);
    }

    /// Closes the batch and uploads it in one transfer.
    ///
    /// Returns the vertex or index count the batch contributes to a draw;
    /// an empty batch uploads nothing and returns zero.
    pub fn end(&mut self, api: &A) -> u32 {
        let records = self.batch.end();
        if records.is_empty() {
            return 0;
        }
        let count = element_count(records.len(), R::ELEMENTS_PER_RECORD);
        api.upload_buffer(self.buffer.raw(), bytemuck::cast_slice(records));
        count
    }

    pub fn buffer(&self) -> RawHandle {
        self.buffer.raw()
    }

    pub fn batch(&self) -> &GeometryBatch<R> {
        &self.batch
    }
}

/// Vertices or indices drawn for `records` records.
fn element_count(records: usize, per_record: u32) -> u32 {
    u32::try_from(records)
        .ok()
        .and_then(|n| n.checked_mul(per_record))
        .expect("batch too large: element count exceeds the u32 draw range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, RecordingApi};
    use crate::render::records::{SpringElement, TileElement};

    fn spring(a: u32, b: u32) -> SpringElement {
        SpringElement {
            point_a: a,
            point_b: b,
        }
    }

    // ── geometry batch ────────────────────────────────────────────────────

    #[test]
    fn start_append_end_fills_exactly() {
        let mut batch = GeometryBatch::new();
        batch.start(2);
        batch.append(spring(0, 1));
        batch.append(spring(1, 2));
        assert_eq!(batch.end(), &[spring(0, 1), spring(1, 2)]);
    }

    #[test]
    fn restart_with_same_capacity_is_idempotent() {
        let mut batch = GeometryBatch::<SpringElement>::new();
        batch.start(4);
        let before = batch.reallocations();

        batch.start(4);
        batch.start(4);

        assert_eq!(batch.len(), 0);
        assert_eq!(batch.capacity(), 4);
        assert_eq!(batch.reallocations(), before);
    }

    #[test]
    fn restart_rewinds_cursor() {
        let mut batch = GeometryBatch::new();
        batch.start(1);
        batch.append(spring(3, 4));
        batch.start(1);
        assert!(batch.is_empty());
        assert!(batch.records().is_empty());
    }

    #[test]
    fn capacity_change_reallocates_to_exact_size() {
        let mut batch = GeometryBatch::<TileElement>::new();
        batch.start(10);
        batch.start(3);
        assert_eq!(batch.capacity(), 3);
        assert_eq!(batch.reallocations(), 2);

        batch.start(0);
        assert_eq!(batch.capacity(), 0);
        assert!(batch.end().is_empty());
    }

    #[test]
    #[should_panic(expected = "batch overflow")]
    fn append_past_capacity_panics() {
        let mut batch = GeometryBatch::new();
        batch.start(1);
        batch.append(spring(0, 1));
        batch.append(spring(1, 2));
    }

    #[test]
    #[should_panic(expected = "batch ended without start")]
    fn end_without_start_panics() {
        let mut batch = GeometryBatch::<SpringElement>::new();
        let _ = batch.end();
    }

    #[test]
    #[should_panic(expected = "batch ended without start")]
    fn second_end_panics() {
        let mut batch = GeometryBatch::new();
        batch.start(1);
        batch.append(spring(0, 1));
        let _ = batch.end();
        let _ = batch.end();
    }

    #[test]
    #[should_panic(expected = "batch appended without start")]
    fn append_after_end_panics() {
        let mut batch = GeometryBatch::new();
        batch.start(0);
        let _ = batch.end();
        batch.append(spring(0, 1));
    }

    #[test]
    fn start_reopens_closed_batch() {
        let mut batch = GeometryBatch::new();
        batch.start(1);
        batch.append(spring(0, 1));
        let _ = batch.end();
        assert!(!batch.is_open());

        batch.start(1);
        assert!(batch.is_open());
        batch.append(spring(2, 3));
        assert_eq!(batch.end(), &[spring(2, 3)]);
    }

    #[test]
    #[should_panic(expected = "batch underfilled")]
    fn end_before_full_panics() {
        let mut batch = GeometryBatch::new();
        batch.start(2);
        batch.append(spring(0, 1));
        let _ = batch.end();
    }

    // ── gpu batch ─────────────────────────────────────────────────────────

    #[test]
    fn end_uploads_whole_array_once() {
        let api = Rc::new(RecordingApi::new());
        let mut batch = GpuBatch::new(&api, BufferKind::Index);

        batch.start(3);
        for i in 0..3 {
            batch.append(spring(i, i + 1));
        }
        let count = batch.end(&api);

        assert_eq!(count, 6);
        let uploads: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::UploadBuffer { .. }))
            .collect();
        assert_eq!(
            uploads,
            vec![ApiCall::UploadBuffer {
                buffer: batch.buffer(),
                len: 24,
            }]
        );

        let bytes = api.buffer_contents(batch.buffer()).unwrap();
        let indices: &[u32] = bytemuck::cast_slice(&bytes);
        assert_eq!(indices, &[0, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn empty_batch_uploads_nothing() {
        let api = Rc::new(RecordingApi::new());
        let mut batch = GpuBatch::<_, TileElement>::new(&api, BufferKind::Vertex);
        batch.start(0);
        assert_eq!(batch.end(&api), 0);
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, ApiCall::UploadBuffer { .. })));
    }

    #[test]
    fn element_count_scales_by_record_width() {
        assert_eq!(element_count(3, 4), 12);
        assert_eq!(element_count(0, 3), 0);
        assert_eq!(element_count(u32::MAX as usize, 1), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "batch too large")]
    fn element_count_overflow_panics() {
        element_count(u32::MAX as usize / 2, 4);
    }

    #[test]
    fn dropping_gpu_batch_releases_buffer() {
        let api = Rc::new(RecordingApi::new());
        let batch = GpuBatch::<_, SpringElement>::new(&api, BufferKind::Index);
        assert_eq!(api.live_buffers(), 1);
        drop(batch);
        assert_eq!(api.live_buffers(), 0);
    }
}
