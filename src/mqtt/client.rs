//! Top-level entry point: turn a transport and a channel pair into a
//! [`Handle`]/[`Worker`] pair.

use crate::log::LogSink;
use crate::mqtt::channel::Shared;
use crate::mqtt::dispatcher::Handle;
use crate::mqtt::worker::{ErrorHandler, PublishHandler, Worker};
use crate::transport::Transport;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Build the application-facing [`Handle`] and the worker that drives it.
///
/// `name` is a human-readable identifier for this client instance; the
/// worker passes it to the log sink as the context for every reported
/// error, which matters once an application runs more than one client
/// (e.g. independent connections to two brokers) and needs to tell their
/// log lines apart. `shared` is typically a `static` owned by the caller
/// (the channel types cannot themselves allocate, so they need a home with
/// a long enough lifetime to outlive both the application tasks and the
/// worker task). Clone the returned `Handle` freely across tasks; spawn
/// `worker.run()` once, on its own task.
///
/// # Examples
///
/// ```rust,no_run
/// use embedded_mqtt::mqtt::channel::{DefaultRawMutex, Shared};
/// use embedded_mqtt::mqtt::client::init;
/// use embedded_mqtt::mqtt::worker::NoopHandlers;
/// use embedded_mqtt::log::NoopLog;
/// # use embedded_mqtt::transport::{AsyncClose, AsyncConnection, AsyncRead, AsyncWrite};
/// # struct MockConnection;
/// # impl AsyncConnection for MockConnection {}
/// # impl AsyncRead for MockConnection {
/// #     type Error = ();
/// #     async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
/// # }
/// # impl AsyncWrite for MockConnection {
/// #     type Error = ();
/// #     async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> { Ok(0) }
/// #     async fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl AsyncClose for MockConnection {
/// #     type Error = ();
/// #     async fn close(self) -> Result<(), Self::Error> { Ok(()) }
/// # }
///
/// static SHARED: Shared<DefaultRawMutex> = Shared::new();
///
/// fn build(connection: MockConnection) {
///     let (_handle, _worker) = init("sensor-node", &SHARED, connection, NoopLog, NoopHandlers);
/// }
/// ```
pub fn init<'a, M, T, L, H>(
    name: &'static str,
    shared: &'a Shared<M>,
    transport: T,
    log: L,
    handlers: H,
) -> (Handle<'a, M>, Worker<'a, M, T, L, H>)
where
    M: RawMutex,
    T: Transport,
    L: LogSink,
    H: PublishHandler + ErrorHandler,
{
    (Handle::new(name, shared), Worker::new(name, shared, transport, log, handlers))
}
