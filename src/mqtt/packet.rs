//! MQTT 3.1.1 control packet encoders and decoders.
//!
//! Each function here is responsible for exactly one packet type: building
//! the wire bytes for an outbound packet, or validating and extracting the
//! fields of an inbound one. The event loop (`worker`) owns sequencing;
//! this module owns byte layout.

use crate::mqtt::codec::{
    encode_mqtt_string, encode_remaining_length, read_u16, write_fixed_header, write_mqtt_string,
};
use crate::error::Error;
use crate::transport::Transport;
use heapless::{String, Vec};

// Packet type values (high nibble of the fixed-header first byte).
pub(crate) const CONNECT: u8 = 1;
pub(crate) const CONNACK: u8 = 2;
pub(crate) const PUBLISH: u8 = 3;
pub(crate) const PUBACK: u8 = 4;
pub(crate) const PUBREC: u8 = 5;
pub(crate) const PUBREL: u8 = 6;
pub(crate) const PUBCOMP: u8 = 7;
pub(crate) const SUBSCRIBE: u8 = 8;
pub(crate) const SUBACK: u8 = 9;
pub(crate) const UNSUBSCRIBE: u8 = 10;
pub(crate) const UNSUBACK: u8 = 11;
pub(crate) const PINGREQ: u8 = 12;
pub(crate) const PINGRESP: u8 = 13;
pub(crate) const DISCONNECT: u8 = 14;

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4;
const KEEP_ALIVE_SECONDS: u16 = 300;

/// Fixed packet identifiers. The client drives at most one outstanding
/// request at a time, so a single constant per command family is enough —
/// there is never a second in-flight publish/subscribe/unsubscribe to
/// disambiguate.
pub(crate) const PACKET_ID_PUBLISH: u16 = 1;
pub(crate) const PACKET_ID_SUBSCRIBE: u16 = 1;
pub(crate) const PACKET_ID_UNSUBSCRIBE: u16 = 2;

/// Human-readable name for a packet type, for logging. A pure lookup
/// function rather than a table indexed by callers directly, so adding a
/// packet type cannot desynchronise a name from its constant.
pub(crate) fn name_of(packet_type: u8) -> &'static str {
    match packet_type {
        CONNECT => "CONNECT",
        CONNACK => "CONNACK",
        PUBLISH => "PUBLISH",
        PUBACK => "PUBACK",
        PUBREC => "PUBREC",
        PUBREL => "PUBREL",
        PUBCOMP => "PUBCOMP",
        SUBSCRIBE => "SUBSCRIBE",
        SUBACK => "SUBACK",
        UNSUBSCRIBE => "UNSUBSCRIBE",
        UNSUBACK => "UNSUBACK",
        PINGREQ => "PINGREQ",
        PINGRESP => "PINGRESP",
        DISCONNECT => "DISCONNECT",
        _ => "UNKNOWN",
    }
}

/// Quality of Service levels for MQTT messages.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// At most once delivery.
    AtMostOnce = 0,
    /// At least once delivery.
    AtLeastOnce = 1,
    /// Exactly once delivery. Accepted on the outbound path but the
    /// PUBREC/PUBREL/PUBCOMP completion handshake is not driven (see the
    /// design notes on QoS 2).
    ExactlyOnce = 2,
}

impl QoS {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }
}

/// A last-will message to register with the broker at connect time.
#[derive(Debug, Clone)]
pub struct Will<'a> {
    /// Topic the will message is published to.
    pub topic: &'a str,
    /// Will message payload.
    pub payload: &'a [u8],
    /// QoS the will is published at.
    pub qos: QoS,
    /// Whether the will message is retained.
    pub retain: bool,
}

/// Write a CONNECT packet.
///
/// `client_id` may be empty; callers wanting a generated identifier should
/// substitute one before calling (the wire encoding itself accepts an empty
/// client-id string, which most brokers will reject — see `dispatcher`).
pub async fn write_connect<T: Transport>(
    transport: &mut T,
    client_id: &str,
    will: Option<&Will<'_>>,
    user_name: Option<&str>,
    password: Option<&[u8]>,
) -> Result<(), Error> {
    let mut connect_flags: u8 = 0x02; // clean session, always set
    if let Some(w) = will {
        connect_flags |= 0x04;
        connect_flags |= (w.qos as u8) << 3;
        if w.retain {
            connect_flags |= 0x20;
        }
    }
    if user_name.is_some() {
        connect_flags |= 0x80;
    }
    if password.is_some() {
        connect_flags |= 0x40;
    }

    let mut payload_length: usize = 2 + client_id.len();
    if let Some(w) = will {
        payload_length += 2 + w.topic.len();
        payload_length += 2 + w.payload.len();
    }
    if let Some(u) = user_name {
        payload_length += 2 + u.len();
    }
    if let Some(p) = password {
        payload_length += 2 + p.len();
    }
    if payload_length > u16::MAX as usize {
        return Err(Error::InvalidArgument);
    }

    // protocol name + level + flags + keep-alive + payload-length
    let remaining = 12 + payload_length;

    write_fixed_header(transport, CONNECT, 0, remaining).await?;

    let mut vh: Vec<u8, 12> = Vec::new();
    encode_mqtt_string(&mut vh, PROTOCOL_NAME)?;
    vh.push(PROTOCOL_LEVEL).map_err(|_| Error::InvalidArgument)?;
    vh.push(connect_flags).map_err(|_| Error::InvalidArgument)?;
    vh.extend_from_slice(&KEEP_ALIVE_SECONDS.to_be_bytes())
        .map_err(|_| Error::InvalidArgument)?;
    vh.extend_from_slice(&(payload_length as u16).to_be_bytes())
        .map_err(|_| Error::InvalidArgument)?;
    transport.write_all(&vh).await?;

    write_mqtt_string_allow_empty(transport, client_id.as_bytes()).await?;
    if let Some(w) = will {
        write_mqtt_string_allow_empty(transport, w.topic.as_bytes()).await?;
        write_mqtt_string_allow_empty(transport, w.payload).await?;
    }
    if let Some(u) = user_name {
        write_mqtt_string_allow_empty(transport, u.as_bytes()).await?;
    }
    if let Some(p) = password {
        write_mqtt_string_allow_empty(transport, p).await?;
    }
    Ok(())
}

/// `write_mqtt_string` rejects empty strings (payloads are allowed to be
/// empty; client IDs and wills are not, but the wire format itself does not
/// distinguish the two, so CONNECT writes its strings through this
/// empty-tolerant helper instead).
async fn write_mqtt_string_allow_empty<T: Transport>(
    transport: &mut T,
    s: &[u8],
) -> Result<(), Error> {
    if s.len() > u16::MAX as usize {
        return Err(Error::InvalidArgument);
    }
    transport
        .write_all(&(s.len() as u16).to_be_bytes())
        .await?;
    transport.write_all(s).await
}

/// Read and validate a CONNACK body (the fixed header has already been
/// consumed by the caller). Returns `Ok(())` on an accepted connection.
pub async fn read_connack<T: Transport>(transport: &mut T, remaining_length: usize) -> Result<(), Error> {
    if remaining_length != 2 {
        return Err(Error::MalformedSize);
    }
    let mut body = [0u8; 2];
    transport.read_exact(&mut body).await?;
    if body[0] != 0 {
        return Err(Error::ProtocolOther);
    }
    match body[1] {
        0 => Ok(()),
        _ => Err(Error::ConnectRejected),
    }
}

/// Write a PUBLISH packet. `qos` greater than zero encodes a packet
/// identifier into the variable header.
pub async fn write_publish<T: Transport>(
    transport: &mut T,
    topic: &str,
    payload: &[u8],
    qos: QoS,
) -> Result<(), Error> {
    if topic.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let flags = (qos as u8) << 1;
    let mut remaining = 2 + topic.len() + payload.len();
    if !matches!(qos, QoS::AtMostOnce) {
        remaining += 2;
    }
    write_fixed_header(transport, PUBLISH, flags, remaining).await?;
    write_mqtt_string(transport, topic.as_bytes()).await?;
    if !matches!(qos, QoS::AtMostOnce) {
        transport
            .write_all(&PACKET_ID_PUBLISH.to_be_bytes())
            .await?;
    }
    transport.write_all(payload).await
}

/// Validate a PUBACK body against the packet identifier the client used for
/// its outstanding QoS-1 publish.
pub async fn read_puback<T: Transport>(transport: &mut T, remaining_length: usize) -> Result<(), Error> {
    if remaining_length != 2 {
        return Err(Error::MalformedSize);
    }
    let id = read_u16(transport).await?;
    if id != PACKET_ID_PUBLISH {
        return Err(Error::ProtocolOther);
    }
    Ok(())
}

/// Maximum topic length accepted on the inbound PUBLISH path.
pub const MAX_INBOUND_TOPIC: usize = 127;
/// Maximum payload length accepted on the inbound PUBLISH path.
pub const MAX_INBOUND_PAYLOAD: usize = 1024;

/// The topic and payload of an inbound PUBLISH, and the QoS it was sent at.
#[derive(Debug, Clone)]
pub struct InboundPublish {
    /// Topic the message was published on.
    pub topic: String<{ MAX_INBOUND_TOPIC }>,
    /// Message payload.
    pub payload: Vec<u8, { MAX_INBOUND_PAYLOAD }>,
    /// QoS the publish carried.
    pub qos: QoS,
}

/// Read an inbound PUBLISH body (fixed header already consumed) in full,
/// buffering topic and payload before returning. This differs from a
/// design that hands the caller a raw stream to drain: if a callback fails
/// partway through reading a caller-driven stream the transport desyncs for
/// every subsequent packet, whereas buffering here keeps that failure mode
/// local to one packet.
pub async fn read_publish<T: Transport>(
    transport: &mut T,
    flags: u8,
    remaining_length: usize,
) -> Result<InboundPublish, Error> {
    let qos = QoS::from_byte((flags >> 1) & 0x3).ok_or(Error::ProtocolOther)?;

    let topic_len = read_u16(transport).await? as usize;
    if topic_len > MAX_INBOUND_TOPIC {
        return Err(Error::MalformedSize);
    }
    let mut topic_bytes = [0u8; MAX_INBOUND_TOPIC];
    transport.read_exact(&mut topic_bytes[..topic_len]).await?;
    let topic = String::from_utf8(
        Vec::from_slice(&topic_bytes[..topic_len]).map_err(|_| Error::MalformedSize)?,
    )
    .map_err(|_| Error::ProtocolOther)?;

    let id_len = if matches!(qos, QoS::AtMostOnce) { 0 } else { 2 };
    let mut packet_id = [0u8; 2];
    if id_len == 2 {
        transport.read_exact(&mut packet_id).await?;
    }

    let header_len = 2 + topic_len + id_len;
    if remaining_length < header_len {
        return Err(Error::MalformedSize);
    }
    let payload_len = remaining_length - header_len;
    if payload_len > MAX_INBOUND_PAYLOAD {
        return Err(Error::MalformedSize);
    }
    let mut payload: Vec<u8, { MAX_INBOUND_PAYLOAD }> = Vec::new();
    payload
        .resize_default(payload_len)
        .map_err(|_| Error::MalformedSize)?;
    transport.read_exact(&mut payload).await?;

    match qos {
        QoS::AtLeastOnce => write_puback(transport, u16::from_be_bytes(packet_id)).await?,
        QoS::ExactlyOnce => write_pubrec(transport, u16::from_be_bytes(packet_id)).await?,
        QoS::AtMostOnce => {}
    }

    Ok(InboundPublish {
        topic,
        payload,
        qos,
    })
}

async fn write_puback<T: Transport>(transport: &mut T, packet_id: u16) -> Result<(), Error> {
    write_fixed_header(transport, PUBACK, 0, 2).await?;
    transport.write_all(&packet_id.to_be_bytes()).await
}

async fn write_pubrec<T: Transport>(transport: &mut T, packet_id: u16) -> Result<(), Error> {
    write_fixed_header(transport, PUBREC, 0, 2).await?;
    transport.write_all(&packet_id.to_be_bytes()).await
}

/// Consume (and discard) a PUBREC, PUBREL, or PUBCOMP body. QoS-2
/// completion is not driven on the outbound path (see design notes); these
/// are read so the transport stays framed, not acted upon.
pub async fn read_and_discard<T: Transport>(transport: &mut T, remaining_length: usize) -> Result<(), Error> {
    let mut discarded = 0;
    let mut scratch = [0u8; 8];
    while discarded < remaining_length {
        let n = (remaining_length - discarded).min(scratch.len());
        transport.read_exact(&mut scratch[..n]).await?;
        discarded += n;
    }
    Ok(())
}

/// Write a SUBSCRIBE packet with a single topic filter.
pub async fn write_subscribe<T: Transport>(
    transport: &mut T,
    topic: &str,
    qos: QoS,
) -> Result<(), Error> {
    if topic.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let remaining = 2 + 2 + topic.len() + 1;
    write_fixed_header(transport, SUBSCRIBE, 2, remaining).await?;
    transport
        .write_all(&PACKET_ID_SUBSCRIBE.to_be_bytes())
        .await?;
    write_mqtt_string(transport, topic.as_bytes()).await?;
    transport.write_all(&[qos as u8]).await
}

/// Validate a SUBACK body, returning the granted QoS.
pub async fn read_suback<T: Transport>(transport: &mut T, remaining_length: usize) -> Result<QoS, Error> {
    if remaining_length != 3 {
        return Err(Error::MalformedSize);
    }
    let id = read_u16(transport).await?;
    if id != PACKET_ID_SUBSCRIBE {
        return Err(Error::ProtocolOther);
    }
    let code = transport.read_u8().await?;
    if code == 0x80 {
        return Err(Error::SubscribeRejected);
    }
    QoS::from_byte(code).ok_or(Error::SubscribeRejected)
}

/// Write an UNSUBSCRIBE packet with a single topic filter.
pub async fn write_unsubscribe<T: Transport>(transport: &mut T, topic: &str) -> Result<(), Error> {
    if topic.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let remaining = 2 + 2 + topic.len();
    write_fixed_header(transport, UNSUBSCRIBE, 2, remaining).await?;
    transport
        .write_all(&PACKET_ID_UNSUBSCRIBE.to_be_bytes())
        .await?;
    write_mqtt_string(transport, topic.as_bytes()).await
}

/// Validate an UNSUBACK body.
pub async fn read_unsuback<T: Transport>(transport: &mut T, remaining_length: usize) -> Result<(), Error> {
    if remaining_length != 2 {
        return Err(Error::MalformedSize);
    }
    let id = read_u16(transport).await?;
    if id != PACKET_ID_UNSUBSCRIBE {
        return Err(Error::ProtocolOther);
    }
    Ok(())
}

/// Write a PINGREQ packet.
pub async fn write_pingreq<T: Transport>(transport: &mut T) -> Result<(), Error> {
    write_fixed_header(transport, PINGREQ, 0, 0).await
}

/// Validate an (empty) PINGRESP body.
pub async fn read_pingresp(remaining_length: usize) -> Result<(), Error> {
    if remaining_length != 0 {
        return Err(Error::MalformedSize);
    }
    Ok(())
}

/// Write a DISCONNECT packet.
pub async fn write_disconnect<T: Transport>(transport: &mut T) -> Result<(), Error> {
    write_fixed_header(transport, DISCONNECT, 0, 0).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{AsyncClose, AsyncConnection, AsyncRead, AsyncWrite};
    use futures::executor::block_on;
    use heapless::Vec as HVec;

    struct MockTransport {
        out: HVec<u8, 256>,
        inbox: HVec<u8, 256>,
        cursor: usize,
    }

    impl MockTransport {
        fn new(inbox: &[u8]) -> Self {
            Self {
                out: HVec::new(),
                inbox: HVec::from_slice(inbox).unwrap(),
                cursor: 0,
            }
        }
    }

    impl AsyncRead for MockTransport {
        type Error = ();
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let remaining = &self.inbox[self.cursor..];
            if remaining.is_empty() {
                return Ok(0);
            }
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.cursor += n;
            Ok(n)
        }
    }

    impl AsyncWrite for MockTransport {
        type Error = ();
        async fn write(&mut self, buf: &[u8]) -> Result<usize, ()> {
            self.out.extend_from_slice(buf).map_err(|_| ())?;
            Ok(buf.len())
        }
        async fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl AsyncClose for MockTransport {
        type Error = ();
        async fn close(self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl AsyncConnection for MockTransport {}

    #[test]
    fn connect_wire_matches_scenario() {
        block_on(async {
            let mut t = MockTransport::new(&[]);
            write_connect(&mut t, "simba_mqtt", None, None, None)
                .await
                .unwrap();
            let expected_prefix: [u8; 14] = [
                0x10, 0x18, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x02, 0x01, 0x2C, 0x00, 0x0C,
            ];
            assert_eq!(&t.out[..14], &expected_prefix);
        });
    }

    #[test]
    fn publish_qos1_wire_matches_scenario() {
        block_on(async {
            let mut t = MockTransport::new(&[]);
            write_publish(&mut t, "a", b"hi", QoS::AtLeastOnce).await.unwrap();
            assert_eq!(
                &t.out[..],
                &[0x32, 0x07, 0x00, 0x01, b'a', 0x00, 0x01, b'h', b'i']
            );
        });
    }

    #[test]
    fn subscribe_wire_matches_scenario() {
        block_on(async {
            let mut t = MockTransport::new(&[]);
            write_subscribe(&mut t, "x", QoS::AtLeastOnce).await.unwrap();
            assert_eq!(&t.out[..], &[0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b'x', 0x01]);
        });
    }

    #[test]
    fn connack_accepted_is_ok() {
        block_on(async {
            let mut t = MockTransport::new(&[0x00, 0x00]);
            read_connack(&mut t, 2).await.unwrap();
        });
    }

    #[test]
    fn connack_rejected_is_connect_rejected() {
        block_on(async {
            let mut t = MockTransport::new(&[0x00, 0x05]);
            assert_eq!(read_connack(&mut t, 2).await.unwrap_err(), Error::ConnectRejected);
        });
    }

    #[test]
    fn suback_granted_qos3_is_rejected() {
        block_on(async {
            let mut t = MockTransport::new(&[0x00, 0x01, 0x80]);
            assert_eq!(read_suback(&mut t, 3).await.unwrap_err(), Error::SubscribeRejected);
        });
    }

    #[test]
    fn name_of_covers_every_packet_type() {
        assert_eq!(name_of(CONNECT), "CONNECT");
        assert_eq!(name_of(PUBLISH), "PUBLISH");
        assert_eq!(name_of(PINGRESP), "PINGRESP");
        assert_eq!(name_of(0x0f), "UNKNOWN");
    }
}
