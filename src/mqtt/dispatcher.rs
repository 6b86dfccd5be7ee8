//! Application-facing handle. Translates the public API into [`Command`]
//! values sent to the worker and awaits the matching [`CommandResult`].

use crate::mqtt::channel::{Command, ConnectOptions, Message, Shared, MAX_CLIENT_ID, MAX_PAYLOAD, MAX_TOPIC};
use crate::error::Error;
use crate::mqtt::packet::QoS;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::{String, Vec};

/// The default client identifier substituted when [`ConnectOptions`] (or
/// the simpler [`Handle::connect`] call) leaves `client_id` empty.
pub const DEFAULT_CLIENT_ID: &str = "simba_mqtt";

/// A cheaply-`Copy`-able handle to a running [`Worker`](crate::mqtt::worker::Worker).
///
/// `Handle` owns no mutable client state itself — only the two channel ends
/// and a reference to the dispatch lock that serialises round trips across
/// clones (see [`Shared`]). Every method here is the application-facing
/// half of the protocol described in the command dispatcher: build a
/// command, send it, await exactly one result.
pub struct Handle<'a, M: RawMutex> {
    name: &'static str,
    shared: &'a Shared<M>,
}

impl<'a, M: RawMutex> Clone for Handle<'a, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: RawMutex> Copy for Handle<'a, M> {}

impl<'a, M: RawMutex> core::fmt::Debug for Handle<'a, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handle").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<'a, M: RawMutex> Handle<'a, M> {
    pub(crate) fn new(name: &'static str, shared: &'a Shared<M>) -> Self {
        Self { name, shared }
    }

    /// The human-readable name this client was [`init`](crate::mqtt::client::init)ed with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    async fn call(&self, command: Command) -> Result<(), Error> {
        let _guard = self.shared.dispatch_lock.lock().await;
        self.shared.cmd_in.send(command).await;
        self.shared.cmd_out.receive().await
    }

    /// Establish a session using default connect options (clean session,
    /// no will, the crate's default client identifier).
    pub async fn connect(&self) -> Result<(), Error> {
        self.connect_with(ConnectOptions::default()).await
    }

    /// Establish a session with explicit connect options.
    pub async fn connect_with(&self, options: ConnectOptions) -> Result<(), Error> {
        self.call(Command::Connect(options)).await
    }

    /// Tear down the session.
    pub async fn disconnect(&self) -> Result<(), Error> {
        self.call(Command::Disconnect).await
    }

    /// Send a keep-alive ping.
    pub async fn ping(&self) -> Result<(), Error> {
        self.call(Command::Ping).await
    }

    /// Publish `payload` to `topic` at the given QoS.
    pub async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), Error> {
        let message = build_message(topic, payload, qos)?;
        self.call(Command::Publish(message)).await
    }

    /// Subscribe to `topic` requesting the given QoS.
    pub async fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), Error> {
        let message = build_message(topic, &[], qos)?;
        self.call(Command::Subscribe(message)).await
    }

    /// Unsubscribe from `topic`.
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), Error> {
        let message = build_message(topic, &[], QoS::AtMostOnce)?;
        self.call(Command::Unsubscribe(message)).await
    }
}

fn build_message(topic: &str, payload: &[u8], qos: QoS) -> Result<Message, Error> {
    Ok(Message {
        topic: String::try_from(topic).map_err(|_| Error::InvalidArgument)?,
        payload: Vec::from_slice(payload).map_err(|_| Error::InvalidArgument)?,
        qos,
    })
}

/// Build [`ConnectOptions`] from borrowed fields, copying them into the
/// bounded owned buffers a [`Command::Connect`] needs. Mirrors the simple
/// `Options` struct the client previously exposed for its synchronous
/// `connect()` call, now producing a value that can cross the command
/// channel.
pub fn connect_options(
    client_id: &str,
    user_name: Option<&str>,
    password: Option<&[u8]>,
) -> Result<ConnectOptions, Error> {
    Ok(ConnectOptions {
        client_id: String::<MAX_CLIENT_ID>::try_from(client_id).map_err(|_| Error::InvalidArgument)?,
        will_topic: None,
        will_payload: None,
        will_qos: QoS::AtMostOnce,
        will_retain: false,
        user_name: user_name
            .map(String::<MAX_CLIENT_ID>::try_from)
            .transpose()
            .map_err(|_| Error::InvalidArgument)?,
        password: password
            .map(Vec::<u8, MAX_CLIENT_ID>::from_slice)
            .transpose()
            .map_err(|_| Error::InvalidArgument)?,
    })
}

/// Build [`ConnectOptions`] with a last-will message attached.
pub fn connect_options_with_will(
    client_id: &str,
    will_topic: &str,
    will_payload: &[u8],
    will_qos: QoS,
    will_retain: bool,
) -> Result<ConnectOptions, Error> {
    let mut opts = connect_options(client_id, None, None)?;
    opts.will_topic = Some(String::<MAX_TOPIC>::try_from(will_topic).map_err(|_| Error::InvalidArgument)?);
    opts.will_payload = Some(Vec::<u8, MAX_PAYLOAD>::from_slice(will_payload).map_err(|_| Error::InvalidArgument)?);
    opts.will_qos = will_qos;
    opts.will_retain = will_retain;
    Ok(opts)
}
