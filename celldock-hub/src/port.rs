//! Host link seam on the brain hub: framed packets out, decoded response
//! lines in.

use std::time::Duration;

use celldock_core::frame::FrameKind;

/// The brain's side of the host byte stream.
///
/// `send` is fire-and-forget: the link has no delivery feedback the brain
/// could act on, so implementations log and drop on transport errors.
/// `poll_response` yields the payload text of the next Command frame
/// decoded from the host, waiting at most `wait` for one to arrive.
pub trait HostPort {
    fn send(&mut self, kind: FrameKind, payload: &[u8]);
    fn poll_response(&mut self, wait: Duration) -> Option<String>;
}
