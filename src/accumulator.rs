/// Growing text buffer fed by transport chunks.
///
/// Bytes are decoded as UTF-8 with carry state: a multi-byte sequence split
/// across two chunks is held back until the rest arrives, so the decoded text
/// is the same as decoding the whole stream at once. Invalid sequences are
/// replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    buffer: String,
    carry: Vec<u8>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport chunk to the buffer.
    pub fn append(&mut self, chunk: &[u8]) {
        if self.carry.is_empty() {
            self.decode_into_buffer(chunk);
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.extend_from_slice(chunk);
            self.decode_into_buffer(&joined);
        }
    }

    fn decode_into_buffer(&mut self, mut bytes: &[u8]) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = bytes.split_at(e.valid_up_to());
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            bytes = &rest[len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes.
                            self.carry.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// The decoded text accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.carry.is_empty()
    }

    /// Take the whole buffer, leaving it empty. Carry bytes are kept.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Replace the buffer with the unconsumed remainder of a parse.
    pub fn replace(&mut self, remainder: String) {
        self.buffer = remainder;
    }

    /// Flush any held-back bytes at end of stream (lossily).
    pub fn finish(&mut self) {
        if !self.carry.is_empty() {
            let carry = std::mem::take(&mut self.carry);
            self.buffer.push_str(&String::from_utf8_lossy(&carry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_plain_text() {
        let mut acc = ChunkAccumulator::new();
        acc.append(b"{\"a\":");
        acc.append(b"1}");
        assert_eq!(acc.as_str(), "{\"a\":1}");
    }

    #[test]
    fn test_split_multibyte_sequence() {
        let text = "1152×896";
        let bytes = text.as_bytes();
        let cut = text.find('×').unwrap() + 1;

        let mut acc = ChunkAccumulator::new();
        acc.append(&bytes[..cut]);
        assert_eq!(acc.as_str(), "1152");
        acc.append(&bytes[cut..]);
        assert_eq!(acc.as_str(), text);
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "héllo — wörld 🎨";
        let mut acc = ChunkAccumulator::new();
        for b in text.as_bytes() {
            acc.append(std::slice::from_ref(b));
        }
        assert_eq!(acc.as_str(), text);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let mut acc = ChunkAccumulator::new();
        acc.append(&[b'a', 0xFF, b'b']);
        assert_eq!(acc.as_str(), "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_flushes_dangling_bytes() {
        let mut acc = ChunkAccumulator::new();
        acc.append(&[b'x', 0xE2, 0x82]);
        assert_eq!(acc.as_str(), "x");
        assert!(!acc.is_empty());
        acc.finish();
        assert!(acc.as_str().starts_with('x'));
        assert!(acc.as_str().contains('\u{FFFD}'));
    }

    #[test]
    fn test_take_and_replace() {
        let mut acc = ChunkAccumulator::new();
        acc.append(b"abc");
        assert_eq!(acc.take(), "abc");
        assert!(acc.is_empty());
        acc.replace("tail".to_string());
        assert_eq!(acc.as_str(), "tail");
    }
}
