//! TCP probe.
//!
//! A single connect attempt decides the verdict: completing the handshake
//! means something is listening, any failure means nothing reachable is.
//! This is the most reliable probe but also the most visible one, since it
//! completes the full three-way handshake before hanging up.

use crate::probe::dial::TcpDial;
use crate::probe::ProbeStatus;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// Probe one TCP port with a single connect attempt.
///
/// The connection is dropped as soon as the verdict is known. No retries,
/// and no timeout beyond what the operating system applies to connect.
pub async fn probe<D: TcpDial>(dial: &D, target: IpAddr, port: u16) -> ProbeStatus {
    let addr = SocketAddr::new(target, port);
    match dial.dial(addr).await {
        Ok(stream) => {
            drop(stream);
            ProbeStatus::Open
        }
        Err(e) => {
            debug!(%addr, error = %e, "tcp dial failed");
            ProbeStatus::Closed
        }
    }
}
