//! An MQTT 3.1.1 client for cooperatively-scheduled embedded runtimes.
//!
//! This module implements the full client: the wire [`codec`] and
//! [`packet`] layer, the connection [`state`] machine, the [`channel`]
//! types and [`dispatcher::Handle`] applications call into, and the
//! [`worker::Worker`] event loop that drives the transport.
//!
//! # Examples
//!
//! ```rust,no_run
//! use embedded_mqtt::mqtt::channel::Shared;
//! use embedded_mqtt::mqtt::channel::DefaultRawMutex;
//! use embedded_mqtt::mqtt::client::init;
//! use embedded_mqtt::mqtt::packet::QoS;
//! use embedded_mqtt::mqtt::worker::NoopHandlers;
//! use embedded_mqtt::log::NoopLog;
//! # use embedded_mqtt::transport::{AsyncClose, AsyncConnection, AsyncRead, AsyncWrite};
//! # struct MockConnection;
//! # impl AsyncConnection for MockConnection {}
//! # impl AsyncRead for MockConnection {
//! #     type Error = ();
//! #     async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl AsyncWrite for MockConnection {
//! #     type Error = ();
//! #     async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> { Ok(0) }
//! #     async fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl AsyncClose for MockConnection {
//! #     type Error = ();
//! #     async fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! static SHARED: Shared<DefaultRawMutex> = Shared::new();
//!
//! async fn run(connection: MockConnection) {
//!     let (handle, mut worker) = init("sensor-node", &SHARED, connection, NoopLog, NoopHandlers);
//!     // spawn `worker.run()` as its own task on your executor, then:
//!     // handle.connect().await?;
//!     // handle.publish("sensors/temperature", b"23.5", QoS::AtMostOnce).await?;
//!     let _ = (handle, &mut worker);
//! }
//! ```

pub mod channel;
pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod packet;
pub mod state;
pub mod worker;

pub use client::init;
pub use dispatcher::Handle;
pub use packet::{QoS, Will};
pub use worker::Worker;
