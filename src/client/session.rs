//! Session lifecycle: who owns the connection pool, and when it goes away.

use crate::transport::HttpTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// The one shared resource behind a client: the transport (and with it the
/// connection pool) plus the closed flag.
///
/// Every concurrent operation issued through a client reads the same session
/// via `Arc`; nothing mutates it after construction except `close()`. The
/// pool itself is released when the last `Arc` drops, so in-flight calls that
/// raced a `close()` finish cleanly before the connections go away.
pub(crate) struct ClientSession {
    transport: HttpTransport,
    closed: AtomicBool,
}

impl ClientSession {
    pub(crate) fn new(transport: HttpTransport) -> Self {
        Self {
            transport,
            closed: AtomicBool::new(false),
        }
    }

    /// Access the transport for one attempt.
    ///
    /// # Panics
    ///
    /// Panics if the session was closed. Using a closed client is a
    /// programming error and fails fast rather than degrading silently.
    pub(crate) fn transport(&self) -> &HttpTransport {
        assert!(
            !self.closed.load(Ordering::Acquire),
            "client used after close(); create a new client instead"
        );
        &self.transport
    }

    /// Mark the session closed. Idempotent: the second and later calls are
    /// no-ops.
    pub(crate) fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("client session closed");
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> ClientSession {
        let transport =
            HttpTransport::new("http://127.0.0.1:9", "key", Duration::from_secs(1)).unwrap();
        ClientSession::new(transport)
    }

    #[test]
    fn double_close_is_a_noop() {
        let s = session();
        assert!(!s.is_closed());
        s.close();
        s.close();
        assert!(s.is_closed());
    }

    #[test]
    #[should_panic(expected = "used after close")]
    fn use_after_close_panics() {
        let s = session();
        s.close();
        let _ = s.transport();
    }
}
