//! # embedded-mqtt
//!
//! An MQTT v3.1.1 client for cooperatively-scheduled embedded runtimes. The
//! client establishes a session with a broker over any byte-oriented duplex
//! transport, publishes and subscribes, and hands inbound publications to a
//! callback — all without assuming a heap, a thread scheduler, or a
//! particular executor.
//!
//! ## Architecture
//!
//! - [`transport`]: the duplex byte-stream abstraction the worker drives.
//! - [`mqtt::codec`] / [`mqtt::packet`]: wire format for each control packet.
//! - [`mqtt::state`]: the connection state machine.
//! - [`mqtt::channel`] / [`mqtt::dispatcher`]: the command channel and the
//!   application-facing [`mqtt::Handle`].
//! - [`mqtt::worker`]: the event loop that owns the transport and the
//!   session and multiplexes commands against inbound broker traffic.
//! - [`error`]: the crate's single error type.
//! - [`log`]: the logging sink the worker reports through.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! embedded-mqtt = "0.1.0"
//! ```
//!
//! ### Basic connect and publish
//!
//! ```rust,no_run
//! use embedded_mqtt::mqtt::channel::{DefaultRawMutex, Shared};
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
//! async fn run(connection: MockConnection) -> Result<(), embedded_mqtt::error::Error> {
//!     let (handle, mut worker) = init("sensor-node", &SHARED, connection, NoopLog, NoopHandlers);
//!     // Spawn `worker.run()` on your executor before issuing commands.
//!     let _ = &mut worker;
//!     handle.connect().await?;
//!     handle.publish("sensors/temperature", b"23.5", QoS::AtMostOnce).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: enable `std`-backed conveniences such as [`log::StdLog`].
//! - `defmt`: enable `defmt`-backed logging and `defmt::Format` on
//!   [`error::Error`], for embedded debugging.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![doc(html_root_url = "https://shishir-dey.github.io/embedded-mqtt/")]

/// The crate's single error type.
pub mod error;

/// Logging sink used by the event loop.
pub mod log;

/// Byte-stream transport abstraction.
pub mod transport;

/// The MQTT 3.1.1 client: codec, state machine, command dispatcher, and
/// event loop.
pub mod mqtt;
