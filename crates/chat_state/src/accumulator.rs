//! Message accumulation - The append-only transcript buffer
//!
//! Frames are appended verbatim in arrival order. There is no frame parsing,
//! deduplication or turn splitting; whatever markup the server sends is part
//! of the transcript.

/// Emitted once for every append that made the buffer longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthEvent {
    /// Bytes appended by this frame.
    pub appended: usize,
    /// Buffer length after the append.
    pub total_len: usize,
}

/// Owns the transcript of the current connection.
#[derive(Debug, Clone, Default)]
pub struct MessageAccumulator {
    buffer: String,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw frame. Empty frames do not grow the buffer and yield no event.
    pub fn on_frame(&mut self, raw: &str) -> Option<GrowthEvent> {
        if raw.is_empty() {
            return None;
        }

        self.buffer.push_str(raw);
        Some(GrowthEvent {
            appended: raw.len(),
            total_len: self.buffer.len(),
        })
    }

    /// Clear the transcript for a new connection.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
