//! Connection state and the single outstanding-request slot.

/// The kind of request currently awaiting a broker response.
///
/// Only one of these can be in flight at a time; see [`Session`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outstanding {
    /// A PINGREQ awaiting PINGRESP.
    Ping,
    /// A QoS-1 or QoS-2 PUBLISH awaiting PUBACK/PUBREC.
    Publish,
    /// A SUBSCRIBE awaiting SUBACK.
    Subscribe,
    /// An UNSUBSCRIBE awaiting UNSUBACK.
    Unsubscribe,
}

/// Connection state and outstanding-request slot, combined into a single
/// tagged representation.
///
/// A prior design tracked these as two independent fields (a connected flag
/// plus a free-standing "what are we waiting for" integer), which made
/// combinations like "outstanding publish while disconnected" representable
/// even though the event loop never produces them. Folding both concerns
/// into one enum makes those combinations impossible to construct instead of
/// merely documented as invalid.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Session {
    /// No connection attempt has succeeded; only `connect` is honoured.
    Disconnected,
    /// CONNECT has been written; awaiting CONNACK.
    Connecting,
    /// Session established, no request outstanding. The worker is blocked
    /// in `select` in this state.
    Connected,
    /// Session established, one non-connect request in flight.
    Awaiting(Outstanding),
}

impl Session {
    /// Whether an application command of this outstanding kind may be
    /// dispatched from the current state.
    ///
    /// `connect` is handled separately by the dispatcher since it is the
    /// only command valid from [`Session::Disconnected`].
    pub fn may_dispatch(&self, _kind: Outstanding) -> bool {
        matches!(self, Session::Connected)
    }

    /// Whether `connect` may be dispatched from the current state.
    pub fn may_connect(&self) -> bool {
        matches!(self, Session::Disconnected)
    }

    /// Whether an inbound response packet whose matching request is `kind`
    /// may be accepted given the current outstanding slot.
    pub fn expects(&self, kind: Outstanding) -> bool {
        matches!(self, Session::Awaiting(k) if *k == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_only_honours_connect() {
        let s = Session::Disconnected;
        assert!(s.may_connect());
        assert!(!s.may_dispatch(Outstanding::Ping));
    }

    #[test]
    fn connected_honours_non_connect_commands() {
        let s = Session::Connected;
        assert!(!s.may_connect());
        assert!(s.may_dispatch(Outstanding::Publish));
    }

    #[test]
    fn awaiting_rejects_further_dispatch() {
        let s = Session::Awaiting(Outstanding::Subscribe);
        assert!(!s.may_dispatch(Outstanding::Ping));
        assert!(s.expects(Outstanding::Subscribe));
        assert!(!s.expects(Outstanding::Ping));
    }
}
