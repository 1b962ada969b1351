//! Port probing: tri-state outcomes and the TCP/UDP probe engine.
//!
//! The probe functions take the network as an injected dial capability
//! (see [`dial`]) so the inference logic can be exercised in tests without
//! touching real sockets.

pub mod dial;
pub mod tcp;
pub mod udp;

pub use dial::{NetTcpDial, NetUdpDial, TcpDial, UdpDial, UdpProbeSocket};
pub use udp::Recovery;

use serde::Serialize;
use std::fmt;

/// Outcome of probing a single port.
///
/// `Pending` is the default and the only incomplete state; it marks a probe
/// that has not run yet. The probe functions themselves only ever return
/// `Open` or `Closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// The port rejected or failed the probe.
    Closed,
    /// The probe has not completed yet.
    #[default]
    Pending,
    /// A service accepted the connection or answered the probe.
    Open,
}

impl ProbeStatus {
    /// Whether a verdict has been reached.
    pub const fn is_complete(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the port was found open.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the port was found closed.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Pending => write!(f, "pending"),
            Self::Open => write!(f, "open"),
        }
    }
}
