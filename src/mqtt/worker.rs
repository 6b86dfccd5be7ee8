//! The event loop: the single task that owns the session and the
//! transport, multiplexing the command channel against inbound broker
//! traffic.

use crate::mqtt::channel::{Command, Shared};
use crate::mqtt::codec::read_fixed_header;
use crate::error::Error;
use crate::log::LogSink;
use crate::mqtt::packet::{self, QoS};
use crate::mqtt::state::{Outstanding, Session};
use crate::transport::Transport;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Invoked by the worker for every fully-read inbound PUBLISH.
pub trait PublishHandler {
    /// Handle one inbound publish. A returned error is passed to the
    /// worker's [`ErrorHandler`] but does not stop the event loop.
    async fn on_publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), Error>;
}

/// Invoked by the worker for every error it observes, whether
/// command-originated or not.
pub trait ErrorHandler {
    /// Handle one error. Any error this itself returns is not escalated
    /// further — the worker logs it and continues.
    async fn on_error(&mut self, err: Error);
}

/// A [`PublishHandler`]/[`ErrorHandler`] pair that does nothing. Useful
/// when an application only ever publishes and never subscribes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

impl PublishHandler for NoopHandlers {
    async fn on_publish(&mut self, _topic: &str, _payload: &[u8], _qos: QoS) -> Result<(), Error> {
        Ok(())
    }
}

impl ErrorHandler for NoopHandlers {
    async fn on_error(&mut self, _err: Error) {}
}

/// The worker task. Owns the transport, the session state, and the
/// application callbacks; `Handle`s only ever touch the channels.
pub struct Worker<'a, M: RawMutex, T: Transport, L: LogSink, H> {
    name: &'static str,
    shared: &'a Shared<M>,
    transport: T,
    log: L,
    handlers: H,
    session: Session,
}

impl<'a, M: RawMutex, T: Transport, L: LogSink, H> core::fmt::Debug for Worker<'a, M, T, L, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<'a, M, T, L, H> Worker<'a, M, T, L, H>
where
    M: RawMutex,
    T: Transport,
    L: LogSink,
    H: PublishHandler + ErrorHandler,
{
    pub(crate) fn new(name: &'static str, shared: &'a Shared<M>, transport: T, log: L, handlers: H) -> Self {
        Self {
            name,
            shared,
            transport,
            log,
            handlers,
            session: Session::Disconnected,
        }
    }

    /// Run the event loop forever (or until the transport fails in a way
    /// that does not recover — the loop itself never returns on error; a
    /// supervising task decides whether to rebuild the `Worker`).
    pub async fn run(&mut self) -> ! {
        loop {
            let outcome = match select(self.shared.cmd_in.receive(), read_fixed_header(&mut self.transport)).await
            {
                Either::First(command) => self.dispatch_command(command).await,
                Either::Second(Ok(header)) => self.dispatch_inbound(header).await,
                Either::Second(Err(e)) => Err(e),
            };
            if let Err(e) = outcome {
                self.log.error(self.name, e);
                self.handlers.on_error(e).await;
            }
        }
    }

    async fn reply(&self, result: Result<(), Error>) {
        self.shared.cmd_out.send(result).await;
    }

    async fn dispatch_command(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Connect(options) => {
                if !self.session.may_connect() {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                let client_id = if options.client_id.is_empty() {
                    crate::mqtt::dispatcher::DEFAULT_CLIENT_ID
                } else {
                    options.client_id.as_str()
                };
                let will = options.will();
                let user_name = options.user_name.as_deref();
                let password = options.password.as_deref();
                self.session = Session::Connecting;
                self.log.trace(packet::name_of(packet::CONNECT));
                match packet::write_connect(&mut self.transport, client_id, will.as_ref(), user_name, password).await
                {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.session = Session::Disconnected;
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
            Command::Disconnect => {
                if matches!(self.session, Session::Disconnected) {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                self.log.trace(packet::name_of(packet::DISCONNECT));
                let result = packet::write_disconnect(&mut self.transport).await;
                self.session = Session::Disconnected;
                self.reply(result).await;
                result
            }
            Command::Ping => {
                if !self.session.may_dispatch(Outstanding::Ping) {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                self.log.trace(packet::name_of(packet::PINGREQ));
                match packet::write_pingreq(&mut self.transport).await {
                    Ok(()) => {
                        self.session = Session::Awaiting(Outstanding::Ping);
                        Ok(())
                    }
                    Err(e) => {
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
            Command::Publish(msg) => {
                if !self.session.may_dispatch(Outstanding::Publish) {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                self.log.trace(packet::name_of(packet::PUBLISH));
                match packet::write_publish(&mut self.transport, &msg.topic, &msg.payload, msg.qos).await {
                    Ok(()) => {
                        if matches!(msg.qos, QoS::AtMostOnce) {
                            // No acknowledgement is expected; the result is
                            // immediate and the session stays Connected.
                            self.reply(Ok(())).await;
                            Ok(())
                        } else {
                            self.session = Session::Awaiting(Outstanding::Publish);
                            Ok(())
                        }
                    }
                    Err(e) => {
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
            Command::Subscribe(msg) => {
                if !self.session.may_dispatch(Outstanding::Subscribe) {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                self.log.trace(packet::name_of(packet::SUBSCRIBE));
                match packet::write_subscribe(&mut self.transport, &msg.topic, msg.qos).await {
                    Ok(()) => {
                        self.session = Session::Awaiting(Outstanding::Subscribe);
                        Ok(())
                    }
                    Err(e) => {
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
            Command::Unsubscribe(msg) => {
                if !self.session.may_dispatch(Outstanding::Unsubscribe) {
                    self.reply(Err(Error::WrongState)).await;
                    return Err(Error::WrongState);
                }
                self.log.trace(packet::name_of(packet::UNSUBSCRIBE));
                match packet::write_unsubscribe(&mut self.transport, &msg.topic).await {
                    Ok(()) => {
                        self.session = Session::Awaiting(Outstanding::Unsubscribe);
                        Ok(())
                    }
                    Err(e) => {
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
        }
    }

    async fn dispatch_inbound(&mut self, header: crate::mqtt::codec::FixedHeader) -> Result<(), Error> {
        use packet::{CONNACK, PINGRESP, PUBACK, PUBCOMP, PUBLISH, PUBREC, PUBREL, SUBACK, UNSUBACK};

        match header.packet_type {
            t if t == PUBLISH => {
                self.log.trace(packet::name_of(packet::PUBLISH));
                let inbound = packet::read_publish(&mut self.transport, header.flags, header.remaining_length).await?;
                let result = self.handlers.on_publish(&inbound.topic, &inbound.payload, inbound.qos).await;
                if let Err(e) = result {
                    self.handlers.on_error(e).await;
                }
                Ok(())
            }
            t if t == CONNACK => {
                self.log.trace(packet::name_of(packet::CONNACK));
                if !matches!(self.session, Session::Connecting) {
                    return self.unexpected().await;
                }
                match packet::read_connack(&mut self.transport, header.remaining_length).await {
                    Ok(()) => {
                        self.session = Session::Connected;
                        self.reply(Ok(())).await;
                        Ok(())
                    }
                    Err(e) => {
                        self.session = Session::Disconnected;
                        self.reply(Err(e)).await;
                        Err(e)
                    }
                }
            }
            t if t == PUBACK => {
                self.log.trace(packet::name_of(packet::PUBACK));
                if !self.session.expects(Outstanding::Publish) {
                    return self.unexpected().await;
                }
                let result = packet::read_puback(&mut self.transport, header.remaining_length).await;
                self.session = Session::Connected;
                self.reply(result).await;
                result
            }
            t if t == SUBACK => {
                self.log.trace(packet::name_of(packet::SUBACK));
                if !self.session.expects(Outstanding::Subscribe) {
                    return self.unexpected().await;
                }
                let result = packet::read_suback(&mut self.transport, header.remaining_length).await;
                self.session = Session::Connected;
                self.reply(result.map(|_granted| ())).await;
                result.map(|_| ())
            }
            t if t == UNSUBACK => {
                self.log.trace(packet::name_of(packet::UNSUBACK));
                if !self.session.expects(Outstanding::Unsubscribe) {
                    return self.unexpected().await;
                }
                let result = packet::read_unsuback(&mut self.transport, header.remaining_length).await;
                self.session = Session::Connected;
                self.reply(result).await;
                result
            }
            t if t == PINGRESP => {
                self.log.trace(packet::name_of(packet::PINGRESP));
                if !self.session.expects(Outstanding::Ping) {
                    return self.unexpected().await;
                }
                let result = packet::read_pingresp(header.remaining_length).await;
                self.session = Session::Connected;
                self.reply(result).await;
                result
            }
            t if t == PUBREC || t == PUBREL || t == PUBCOMP => {
                self.log.trace(packet::name_of(header.packet_type));
                packet::read_and_discard(&mut self.transport, header.remaining_length).await
            }
            _ => {
                packet::read_and_discard(&mut self.transport, header.remaining_length).await?;
                Err(Error::ProtocolOther)
            }
        }
    }

    /// An inbound response arrived whose type does not match the current
    /// outstanding request. Only reply on `cmd_out` if a caller is
    /// actually waiting (state is `Connecting`/`Awaiting`); a response
    /// arriving with no request outstanding at all — `Disconnected` (no
    /// command ever issued) or `Connected` (the previous one already
    /// completed) — has no pending caller to notify.
    async fn unexpected(&mut self) -> Result<(), Error> {
        if matches!(self.session, Session::Connecting | Session::Awaiting(_)) {
            self.reply(Err(Error::UnexpectedResponse)).await;
        }
        Err(Error::UnexpectedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLog;
    use crate::mqtt::channel::{ConnectOptions, DefaultRawMutex, Shared};
    use crate::transport::{AsyncClose, AsyncConnection, AsyncRead, AsyncWrite};
    use futures::executor::block_on;
    use heapless::Vec as HVec;

    struct MockTransport {
        out: HVec<u8, 256>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self { out: HVec::new() }
        }
    }

    impl AsyncRead for MockTransport {
        type Error = ();
        async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
            Ok(0)
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

    /// Drives the default-substitution branch in `dispatch_command`, not
    /// `write_connect` called directly with a literal client id.
    #[test]
    fn connect_with_empty_client_id_substitutes_default_on_the_wire() {
        block_on(async {
            let shared: Shared<DefaultRawMutex> = Shared::new();
            let mut worker = Worker::new("test", &shared, MockTransport::new(), NoopLog, NoopHandlers);
            worker
                .dispatch_command(Command::Connect(ConnectOptions::default()))
                .await
                .unwrap();
            let expected_prefix: [u8; 14] = [
                0x10, 0x18, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x02, 0x01, 0x2C, 0x00, 0x0C,
            ];
            assert_eq!(&worker.transport.out[..14], &expected_prefix);
        });
    }
}
