//! External collaborator traits.
//!
//! The channel never performs I/O itself; it hands finished IRC command
//! lines to a [`Connection`] supplied by the owner and re-exports
//! [`crate::handle::HandleRegistry`] here alongside it since both are the
//! "interfaces this core uses" rather than implements.

pub use crate::handle::HandleRegistry;

/// Fire-and-forget line sender standing in for the socket/line-parser
/// layer. The channel treats every send as fire-and-forget per §5's
/// concurrency model — it does not await per line, so backpressure is
/// entirely the connection's concern.
pub trait Connection {
    /// Sends one complete IRC command line (no trailing CRLF) to the server.
    fn send_line(&self, line: &str);
}
