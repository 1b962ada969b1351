//! UDP probe.
//!
//! UDP is connectionless, so openness has to be inferred. An answer means a
//! responder is there; an ICMP-mapped error on the receive means the port
//! was actively rejected; silence until the deadline is the signature of an
//! open service that simply does not reply to unsolicited datagrams, and is
//! reported open.

use crate::probe::dial::{UdpDial, UdpProbeSocket};
use crate::probe::ProbeStatus;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Payload sent to coax a response out of whatever is listening.
const PROBE_PAYLOAD: &[u8] = b"sounder udp probe";

/// How long to wait for an answer before calling the port open-but-quiet.
const READ_DEADLINE: Duration = Duration::from_secs(1);

/// Policy for a failed or short send on an already-validated socket.
///
/// A write fault at that point indicates a programming or environment
/// error, not a closed port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recovery {
    /// Panic, taking the worker down.
    #[default]
    FailFast,
    /// Log the fault and report the port closed.
    Absorb,
}

/// Probe one UDP port: send a single datagram, then make exactly one
/// receive attempt bounded by a one-second deadline.
///
/// The socket is released on every exit path.
pub async fn probe<D: UdpDial>(
    dial: &D,
    target: IpAddr,
    port: u16,
    recovery: Recovery,
) -> ProbeStatus {
    let addr = SocketAddr::new(target, port);
    let socket = match dial.dial(addr).await {
        Ok(socket) => socket,
        Err(e) => {
            debug!(%addr, error = %e, "udp dial failed");
            return ProbeStatus::Closed;
        }
    };

    // Probing the very socket we are sending from would always look open;
    // that degenerate loopback case reports closed instead.
    if socket.local_addr().ok() == Some(addr) {
        debug!(%addr, "udp probe of own socket");
        return ProbeStatus::Closed;
    }

    match socket.send(PROBE_PAYLOAD).await {
        Ok(n) if n == PROBE_PAYLOAD.len() => {}
        outcome => match recovery {
            Recovery::FailFast => panic!("udp send to {addr} failed: {outcome:?}"),
            Recovery::Absorb => {
                warn!(%addr, ?outcome, "udp send failed, reporting closed");
                return ProbeStatus::Closed;
            }
        },
    }

    let mut buf = [0u8; 512];
    match timeout(READ_DEADLINE, socket.recv(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            debug!(%addr, bytes = n, "udp response received");
            ProbeStatus::Open
        }
        Ok(Ok(_)) => {
            debug!(%addr, "udp empty response");
            ProbeStatus::Closed
        }
        Ok(Err(e)) => {
            // Typically a connection-refused surfaced from an ICMP
            // port-unreachable message.
            debug!(%addr, error = %e, "udp recv failed");
            ProbeStatus::Closed
        }
        Err(_) => ProbeStatus::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted behavior for one probe run.
    #[derive(Clone, Copy)]
    struct Script {
        dial_fails: bool,
        local_is_target: bool,
        send: SendScript,
        recv: RecvScript,
    }

    #[derive(Clone, Copy)]
    enum SendScript {
        Full,
        Short,
        Fail,
    }

    #[derive(Clone, Copy)]
    enum RecvScript {
        Answer(usize),
        Refused,
        Silent,
    }

    impl Default for Script {
        fn default() -> Self {
            Self {
                dial_fails: false,
                local_is_target: false,
                send: SendScript::Full,
                recv: RecvScript::Silent,
            }
        }
    }

    /// Counters observed by tests after the socket is gone.
    #[derive(Default)]
    struct Telemetry {
        closes: AtomicUsize,
        sends: AtomicUsize,
    }

    struct ScriptedSocket {
        script: Script,
        peer: SocketAddr,
        telemetry: Arc<Telemetry>,
    }

    impl Drop for ScriptedSocket {
        fn drop(&mut self) {
            self.telemetry.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl UdpProbeSocket for ScriptedSocket {
        fn local_addr(&self) -> io::Result<SocketAddr> {
            if self.script.local_is_target {
                Ok(self.peer)
            } else {
                Ok("127.0.0.1:49152".parse().unwrap())
            }
        }

        async fn send(&self, payload: &[u8]) -> io::Result<usize> {
            self.telemetry.sends.fetch_add(1, Ordering::SeqCst);
            match self.script.send {
                SendScript::Full => Ok(payload.len()),
                SendScript::Short => Ok(payload.len() - 1),
                SendScript::Fail => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
            }
        }

        async fn recv(&self, _buf: &mut [u8]) -> io::Result<usize> {
            match self.script.recv {
                RecvScript::Answer(n) => Ok(n),
                RecvScript::Refused => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
                RecvScript::Silent => std::future::pending().await,
            }
        }
    }

    struct ScriptedDial {
        script: Script,
        telemetry: Arc<Telemetry>,
    }

    impl ScriptedDial {
        fn new(script: Script) -> (Self, Arc<Telemetry>) {
            let telemetry = Arc::new(Telemetry::default());
            (
                Self {
                    script,
                    telemetry: Arc::clone(&telemetry),
                },
                telemetry,
            )
        }
    }

    #[async_trait]
    impl UdpDial for ScriptedDial {
        type Socket = ScriptedSocket;

        async fn dial(&self, addr: SocketAddr) -> io::Result<ScriptedSocket> {
            if self.script.dial_fails {
                Err(io::Error::from(io::ErrorKind::AddrNotAvailable))
            } else {
                Ok(ScriptedSocket {
                    script: self.script,
                    peer: addr,
                    telemetry: Arc::clone(&self.telemetry),
                })
            }
        }
    }

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[tokio::test]
    async fn dial_failure_is_closed_without_io() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            dial_fails: true,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.sends.load(Ordering::SeqCst), 0);
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn probing_own_socket_is_closed_before_sending() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            local_is_target: true,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.sends.load(Ordering::SeqCst), 0);
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn response_bytes_mean_open() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            recv: RecvScript::Answer(12),
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_open());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_response_means_closed() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            recv: RecvScript::Answer(0),
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn icmp_refusal_means_closed() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            recv: RecvScript::Refused,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_until_the_deadline_means_open() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            recv: RecvScript::Silent,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::FailFast).await;

        assert!(status.is_open());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "udp send")]
    async fn send_failure_panics_under_fail_fast() {
        let (dial, _telemetry) = ScriptedDial::new(Script {
            send: SendScript::Fail,
            ..Script::default()
        });

        probe(&dial, localhost(), 53, Recovery::FailFast).await;
    }

    #[tokio::test]
    async fn send_failure_is_closed_under_absorb() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            send: SendScript::Fail,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::Absorb).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_send_is_a_write_fault() {
        let (dial, telemetry) = ScriptedDial::new(Script {
            send: SendScript::Short,
            ..Script::default()
        });

        let status = probe(&dial, localhost(), 53, Recovery::Absorb).await;

        assert!(status.is_closed());
        assert_eq!(telemetry.closes.load(Ordering::SeqCst), 1);
    }
}
