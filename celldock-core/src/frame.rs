//! Framing on the host link: start/end delimited, typed, length-prefixed packets.

/// Start-of-frame marker.
pub const START_MARKER: u8 = b'>';
/// End-of-frame marker.
pub const END_MARKER: u8 = b'<';

/// Start marker + kind byte + length byte.
const HEADER_LEN: usize = 3;
/// Accumulator bound while no start marker is present anywhere.
const MAX_PENDING: usize = 1024;

/// Packet kind on the host link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// 6-byte rack snapshot.
    Storage = 0x01,
    /// ASCII command token (`INSPECT`, `RDY_FOR_RESULT`, a verdict).
    Command = 0x02,
    /// Free-form UTF-8 text, informational only.
    Log = 0x03,
}

impl FrameKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameKind::Storage),
            0x02 => Some(FrameKind::Command),
            0x03 => Some(FrameKind::Log),
            _ => None,
        }
    }
}

/// Encode one frame: `start, kind, length, payload, end`.
/// The payload length must fit the one-byte length field; an oversize
/// payload is a caller contract violation, never a silent truncation.
pub fn encode_frame(kind: FrameKind, payload: &[u8]) -> Result<Vec<u8>, FrameEncodeError> {
    if payload.len() > u8::MAX as usize {
        return Err(FrameEncodeError::PayloadTooLarge(payload.len()));
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
    out.push(START_MARKER);
    out.push(kind as u8);
    out.push(payload.len() as u8);
    out.extend_from_slice(payload);
    out.push(END_MARKER);
    Ok(out)
}

/// Error encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("payload of {0} bytes does not fit the one-byte length field")]
    PayloadTooLarge(usize),
}

/// A structurally valid frame as read off the stream. The kind byte is
/// kept raw; dispatch decides what an unknown kind means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub kind: u8,
    pub payload: Vec<u8>,
}

/// Incremental decoder over a continuous byte stream. Feed arbitrary
/// slices with `push`, then pull complete frames with `next_frame`.
///
/// Corrupt input self-heals: when the byte at the computed frame end is
/// not the end marker, the start marker was spurious and exactly one
/// leading byte is dropped before rescanning.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete frame, if the accumulator holds one.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        loop {
            let start = match self.buf.iter().position(|&b| b == START_MARKER) {
                Some(i) => i,
                None => {
                    if self.buf.len() > MAX_PENDING {
                        self.buf.clear();
                    }
                    return None;
                }
            };
            self.buf.drain(..start);
            if self.buf.len() < HEADER_LEN {
                return None;
            }
            let payload_len = self.buf[2] as usize;
            let full_len = HEADER_LEN + payload_len + 1;
            if self.buf.len() < full_len {
                return None;
            }
            if self.buf[full_len - 1] != END_MARKER {
                self.buf.drain(..1);
                continue;
            }
            let kind = self.buf[1];
            let payload = self.buf[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
            self.buf.drain(..full_len);
            return Some(RawFrame { kind, payload });
        }
    }

    /// Feed bytes and collect every frame they complete.
    pub fn drain(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        self.push(bytes);
        let mut out = Vec::new();
        while let Some(frame) = self.next_frame() {
            out.push(frame);
        }
        out
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buf.len()
    }
}
