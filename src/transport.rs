//! Byte-stream transport abstraction.
//!
//! The worker treats the broker connection as an opaque, duplex byte stream.
//! It never constructs sockets itself; callers provide any type implementing
//! [`AsyncConnection`] — a TCP/TLS socket, a serial link, or a test fixture.
//!
//! # Examples
//!
//! ```rust,no_run
//! use embedded_mqtt::transport::{AsyncClose, AsyncConnection, AsyncRead, AsyncWrite};
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
//! ```

#![allow(async_fn_in_trait)]

use crate::error::Error;

/// Trait for reading bytes from a connection asynchronously.
pub trait AsyncRead {
    /// Associated error type for read operations.
    type Error: core::fmt::Debug;

    /// Read into `buf`, returning the number of bytes read. `Ok(0)` means
    /// the connection has been closed by the remote end.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Trait for writing bytes to a connection asynchronously.
pub trait AsyncWrite {
    /// Associated error type for write operations.
    type Error: core::fmt::Debug;

    /// Write `buf`, returning the number of bytes written. The
    /// implementation may write fewer bytes than requested.
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered write data.
    async fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Trait for closing a connection asynchronously.
pub trait AsyncClose {
    /// Associated error type for close operations.
    type Error: core::fmt::Debug;

    /// Close the connection and free any associated resources.
    async fn close(self) -> Result<(), Self::Error>;
}

/// A complete asynchronous duplex connection to an MQTT broker.
pub trait AsyncConnection: AsyncRead + AsyncWrite + AsyncClose {}

/// Extension trait layering the codec's "short read/write is an error"
/// contract on top of the partial-transfer primitives above.
///
/// Blanket-implemented for every [`AsyncConnection`] so the worker and the
/// packet encoders/decoders never touch `read`/`write` directly.
pub trait Transport: AsyncConnection {
    /// Read exactly `buf.len()` bytes, looping over partial reads.
    ///
    /// Fails with [`Error::TransportIo`] on a closed connection or any
    /// underlying read error.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut total = 0;
        while total < buf.len() {
            match self.read(&mut buf[total..]).await {
                Ok(0) => return Err(Error::TransportIo),
                Ok(n) => total += n,
                Err(_) => return Err(Error::TransportIo),
            }
        }
        Ok(())
    }

    /// Write all of `buf`, looping over partial writes, then flush.
    ///
    /// Fails with [`Error::TransportIo`] on a closed connection or any
    /// underlying write error.
    async fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut total = 0;
        while total < buf.len() {
            match self.write(&buf[total..]).await {
                Ok(0) => return Err(Error::TransportIo),
                Ok(n) => total += n,
                Err(_) => return Err(Error::TransportIo),
            }
        }
        self.flush().await.map_err(|_| Error::TransportIo)
    }

    /// Read a single byte.
    async fn read_u8(&mut self) -> Result<u8, Error> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b).await?;
        Ok(b[0])
    }
}

impl<T: AsyncConnection> Transport for T {}
