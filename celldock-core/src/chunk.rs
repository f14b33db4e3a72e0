//! Chunked broadcast codec: split a payload too large for one advertisement
//! into `D:<index>/<total>:<fragment>` chunks and reassemble them.
//!
//! The broadcast channel is a mailbox with one slot: an asynchronous poller
//! only ever sees the latest advertised value and there is no delivery
//! acknowledgment. The sender therefore dwells on each fragment long enough
//! for a 10-100 ms poller to observe it before the next overwrite, and
//! clears the channel after the last fragment as the completion boundary.

use std::collections::HashMap;
use std::time::Duration;

/// Maximum fragment length in bytes per advertisement.
pub const FRAGMENT_LEN: usize = 18;
/// Dwell between advertisements.
pub const CHUNK_GAP: Duration = Duration::from_millis(250);
/// Reassembly deadline before the requester gives up and clears its channel.
pub const REASSEMBLY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Split `text` into the full advertisement sequence. Indices are 1-based
/// and dense; the sender broadcasts these in order with [`CHUNK_GAP`]
/// between them, then advertises nothing.
pub fn fragment_advertisements(text: &str) -> Vec<String> {
    let fragments = split_fragments(text);
    let total = fragments.len();
    fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| format!("D:{}/{}:{}", i + 1, total, fragment))
        .collect()
}

/// Fixed-size split that never cuts a UTF-8 sequence. The rack JSON is
/// ASCII, so in practice every fragment except the last is 18 bytes.
fn split_fragments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut cut = rest.len().min(FRAGMENT_LEN);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (fragment, tail) = rest.split_at(cut);
        out.push(fragment);
        rest = tail;
    }
    out
}

/// Progress of one reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkProgress {
    /// Not all indices observed yet.
    Pending,
    /// All indices `1..=total` observed; the concatenated payload.
    Complete(String),
}

/// Receiver side: index -> fragment map. `total` is taken from the first
/// fragment observed; duplicates are idempotent no-ops; completion occurs
/// when every index `1..=total` has been seen, in any order.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    fragments: HashMap<u16, String>,
    expected_total: Option<u16>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observed advertisement. Values that are not well-formed
    /// `D:` chunks are ignored.
    pub fn observe(&mut self, advertisement: &str) -> ChunkProgress {
        let Some((index, total, fragment)) = parse_advertisement(advertisement) else {
            return ChunkProgress::Pending;
        };
        let expected = *self.expected_total.get_or_insert(total);
        self.fragments
            .entry(index)
            .or_insert_with(|| fragment.to_owned());
        if (1..=expected).all(|i| self.fragments.contains_key(&i)) {
            let mut text = String::new();
            for i in 1..=expected {
                if let Some(fragment) = self.fragments.get(&i) {
                    text.push_str(fragment);
                }
            }
            ChunkProgress::Complete(text)
        } else {
            ChunkProgress::Pending
        }
    }
}

fn parse_advertisement(advertisement: &str) -> Option<(u16, u16, &str)> {
    let rest = advertisement.strip_prefix("D:")?;
    let (header, fragment) = rest.split_once(':')?;
    let (index, total) = header.split_once('/')?;
    let index: u16 = index.parse().ok()?;
    let total: u16 = total.parse().ok()?;
    if index == 0 || total == 0 || index > total {
        return None;
    }
    Some((index, total, fragment))
}
