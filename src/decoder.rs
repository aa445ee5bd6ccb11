use crate::accumulator::ChunkAccumulator;
use crate::parser::{parse_buffer, try_parse, ParseOutcome};

/// Incremental decoder turning transport chunks into update frames.
///
/// Owns the accumulator; each [`feed`](Self::feed) appends a chunk, parses the
/// buffer, and keeps whatever was not consumed for the next call.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    accumulator: ChunkAccumulator,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk and collect any frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> ParseOutcome {
        self.accumulator.append(chunk);
        let outcome = parse_buffer(self.accumulator.take());
        self.accumulator.replace(outcome.remainder.clone());
        outcome
    }

    /// Text waiting for more data.
    pub fn pending(&self) -> &str {
        self.accumulator.as_str()
    }

    /// Decode whatever is left once the transport has ended.
    ///
    /// The tail segment held back by [`parse_buffer`] is given one last parse
    /// attempt here; blank tails produce nothing.
    pub fn finish(&mut self) -> ParseOutcome {
        self.accumulator.finish();
        let tail = self.accumulator.take();
        let mut outcome = ParseOutcome::default();
        if tail.trim().is_empty() {
            return outcome;
        }
        match try_parse(&tail) {
            Ok(frame) => outcome.frames.push(frame),
            Err(e) => outcome.errors.push(e),
        }
        outcome
    }
}
