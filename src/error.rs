//! Common error type for the MQTT client.

/// Errors that can occur while encoding, decoding, or driving an MQTT session.
///
/// This enum is deliberately flat: callers match on a kind, not a nested
/// cause chain. It is designed to be simple and portable for `no_std`
/// environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A transport read or write returned fewer bytes than requested, or the
    /// connection closed mid-operation.
    TransportIo,
    /// A caller-provided value violates a size bound (an MQTT string too
    /// long, a buffer that does not fit its fixed-capacity field).
    InvalidArgument,
    /// A remaining-length field used more than 4 continuation bytes.
    MalformedLength,
    /// A response packet's remaining length did not match the fixed size
    /// expected for its type.
    MalformedSize,
    /// An inbound response packet's type did not match the outstanding
    /// request.
    UnexpectedResponse,
    /// The broker's CONNACK carried a non-zero return code.
    ConnectRejected,
    /// The broker's SUBACK granted a QoS greater than 2.
    SubscribeRejected,
    /// A command was issued that the current connection state does not
    /// honour.
    WrongState,
    /// Any other response-handler validation failure.
    ProtocolOther,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::TransportIo => defmt::write!(f, "TransportIo"),
            Error::InvalidArgument => defmt::write!(f, "InvalidArgument"),
            Error::MalformedLength => defmt::write!(f, "MalformedLength"),
            Error::MalformedSize => defmt::write!(f, "MalformedSize"),
            Error::UnexpectedResponse => defmt::write!(f, "UnexpectedResponse"),
            Error::ConnectRejected => defmt::write!(f, "ConnectRejected"),
            Error::SubscribeRejected => defmt::write!(f, "SubscribeRejected"),
            Error::WrongState => defmt::write!(f, "WrongState"),
            Error::ProtocolOther => defmt::write!(f, "ProtocolOther"),
        }
    }
}
