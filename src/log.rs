//! Logging sink used by the event loop to report packet activity and errors.
//!
//! The core never assumes a particular logging backend is linked in; it
//! depends only on the [`LogSink`] trait, matching the way the rest of the
//! crate depends on traits at every external seam rather than on a concrete
//! transport or channel type.

use crate::error::Error;

/// A sink for diagnostic messages produced by the MQTT worker.
///
/// A sink cannot itself fail the client: `log` takes `&self` and returns
/// nothing, so a logging backend that is unavailable or full simply drops
/// the message.
pub trait LogSink {
    /// Record a human-readable trace of worker activity, e.g. a packet name.
    fn trace(&self, msg: &str);

    /// Record an error observed by the worker.
    fn error(&self, msg: &str, err: Error);
}

/// A [`LogSink`] that discards everything. Useful for tests and for
/// applications that have no logging backend wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl LogSink for NoopLog {
    fn trace(&self, _msg: &str) {}
    fn error(&self, _msg: &str, _err: Error) {}
}

/// A [`LogSink`] backed by `defmt`, for embedded targets.
#[cfg(feature = "defmt")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefmtLog;

#[cfg(feature = "defmt")]
impl LogSink for DefmtLog {
    fn trace(&self, msg: &str) {
        defmt::trace!("{}", msg);
    }

    fn error(&self, msg: &str, err: Error) {
        defmt::error!("{}: {}", msg, err);
    }
}

/// A [`LogSink`] backed by `std::println!`, for host-side testing and tools.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLog;

#[cfg(feature = "std")]
impl LogSink for StdLog {
    fn trace(&self, msg: &str) {
        std::println!("{msg}");
    }

    fn error(&self, msg: &str, err: Error) {
        std::println!("{msg}: {err:?}");
    }
}
