//! Command and response channels linking application tasks to the worker.
//!
//! Both directions are modelled as capacity-1 `embassy_sync` channels. A
//! true rendezvous channel (capacity 0) would give an exact match for "at
//! most one command in flight", but no commonly available `no_std` async
//! channel offers capacity 0, and the dispatcher already awaits its
//! response before returning (see `dispatcher`), which gives the same
//! at-most-one-in-flight guarantee a capacity-0 channel would.

use crate::error::Error;
use crate::mqtt::packet::{QoS, Will};
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use heapless::{String, Vec};

/// The mutex embassy-sync channels use to guard their internal queue. A
/// `critical-section` backed mutex works on any target with a
/// `critical-section` implementation registered, which is the lowest
/// common denominator across bare-metal and host builds alike.
pub use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex as DefaultRawMutex;

/// Maximum client identifier length accepted by [`Command::Connect`].
pub const MAX_CLIENT_ID: usize = 64;
/// Maximum topic length accepted by outbound commands.
pub const MAX_TOPIC: usize = 128;
/// Maximum payload length accepted by [`Command::Publish`].
pub const MAX_PAYLOAD: usize = 1024;

/// Connect-time options, owned and bounded so they fit in a [`Command`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Client identifier. Empty means "let the client substitute a
    /// default".
    pub client_id: String<MAX_CLIENT_ID>,
    /// Optional last-will topic/payload/QoS/retain, flattened into owned
    /// bounded fields since `Command` cannot borrow a `Will<'a>` across the
    /// channel.
    pub will_topic: Option<String<MAX_TOPIC>>,
    /// Will payload, present iff `will_topic` is.
    pub will_payload: Option<Vec<u8, MAX_PAYLOAD>>,
    /// Will QoS, present iff `will_topic` is.
    pub will_qos: QoS,
    /// Whether the will message should be retained.
    pub will_retain: bool,
    /// Optional user name.
    pub user_name: Option<String<MAX_CLIENT_ID>>,
    /// Optional password.
    pub password: Option<Vec<u8, MAX_CLIENT_ID>>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            will_topic: None,
            will_payload: None,
            will_qos: QoS::AtMostOnce,
            will_retain: false,
            user_name: None,
            password: None,
        }
    }
}

impl ConnectOptions {
    pub(crate) fn will(&self) -> Option<Will<'_>> {
        let topic = self.will_topic.as_deref()?;
        let payload = self.will_payload.as_deref()?;
        Some(Will {
            topic,
            payload,
            qos: self.will_qos,
            retain: self.will_retain,
        })
    }
}

/// A message to publish or subscribe/unsubscribe to, owned and bounded.
#[derive(Debug, Clone)]
pub struct Message {
    /// Topic name (publish) or topic filter (subscribe/unsubscribe).
    pub topic: String<MAX_TOPIC>,
    /// Payload. Unused for subscribe/unsubscribe.
    pub payload: Vec<u8, MAX_PAYLOAD>,
    /// QoS to publish at, or to request for a subscription.
    pub qos: QoS,
}

/// A command sent from an application task to the worker over `cmd_in`.
///
/// Values are owned: caller-provided bytes are copied into bounded buffers
/// when the command is built (see `dispatcher`), rather than borrowed
/// across the channel. A prior design passed a pointer to the caller's
/// stack-resident struct through the channel, valid only because the
/// caller blocked synchronously until the worker was done with it; an
/// owned value sidesteps that lifetime coupling entirely now that the API
/// is `async` rather than blocking.
#[derive(Debug, Clone)]
pub enum Command {
    /// Establish a session.
    Connect(ConnectOptions),
    /// Tear down the session.
    Disconnect,
    /// Send a keep-alive ping.
    Ping,
    /// Publish a message.
    Publish(Message),
    /// Subscribe to a topic filter.
    Subscribe(Message),
    /// Unsubscribe from a topic filter.
    Unsubscribe(Message),
}

/// The result of a dispatched command, sent from the worker to the
/// application task over `cmd_out`.
pub type CommandResult = Result<(), Error>;

/// Capacity-1 channel type used for both `cmd_in` and `cmd_out`.
pub type CmdChannel<M, T> = Channel<M, T, 1>;

/// The channel pair a [`Worker`](crate::mqtt::worker::Worker) and every cloned
/// [`Handle`](crate::mqtt::dispatcher::Handle) share.
///
/// `dispatch_lock` serialises whole round trips (send a command, await its
/// result) across every `Handle` clone. Channel backpressure alone only
/// guarantees that `cmd_in` holds one command at a time — it does not stop
/// a second task from enqueueing its own command the instant the worker
/// has dequeued the first, before that first command's result has reached
/// `cmd_out`. The lock closes that gap so the single-outstanding-request
/// invariant holds regardless of how many tasks hold a `Handle`.
pub struct Shared<M: embassy_sync::blocking_mutex::raw::RawMutex> {
    /// Application task -> worker.
    pub cmd_in: CmdChannel<M, Command>,
    /// Worker -> application task.
    pub cmd_out: CmdChannel<M, CommandResult>,
    /// Serialises dispatch round trips across cloned handles.
    pub dispatch_lock: Mutex<M, ()>,
}

impl<M: embassy_sync::blocking_mutex::raw::RawMutex> Shared<M> {
    /// Construct an empty, unconnected channel pair.
    pub const fn new() -> Self {
        Self {
            cmd_in: Channel::new(),
            cmd_out: Channel::new(),
            dispatch_lock: Mutex::new(()),
        }
    }
}

impl<M: embassy_sync::blocking_mutex::raw::RawMutex> Default for Shared<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: embassy_sync::blocking_mutex::raw::RawMutex> core::fmt::Debug for Shared<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Shared").finish_non_exhaustive()
    }
}
