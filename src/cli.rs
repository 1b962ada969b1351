//! Command-line interface definitions.
//!
//! Uses `clap` derive macros for declarative argument parsing, plus the
//! port-specification parser and hostname resolution.

use crate::error::ScanError;
use clap::{Parser, ValueEnum};
use std::fmt;
use std::net::IpAddr;

/// A concurrent TCP/UDP port scanner.
#[derive(Parser, Debug)]
#[command(name = "sounder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP/UDP port scanner", long_about = None)]
pub struct Args {
    /// Target IP address or hostname to scan
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g. "80", "80,443", "1-1024", "22,80,8000-8080")
    #[arg(short, long, default_value = "1-1000")]
    pub ports: String,

    /// Probe protocol
    #[arg(short = 'P', long, value_enum, default_value = "tcp")]
    pub protocol: Protocol,

    /// Number of concurrent probe workers
    #[arg(short, long, default_value = "8")]
    pub workers: usize,

    /// Maximum probe starts per second per worker (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    pub rate: u32,

    /// Emit the report as JSON instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase diagnostic verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Probe protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    /// TCP connect probing
    Tcp,
    /// UDP send/receive probing
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Parse a port specification into a sorted, deduplicated port list.
///
/// Accepts single ports, comma-separated lists, and inclusive ranges;
/// every value must fall in 1-65535.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>, ScanError> {
    if spec.trim().is_empty() {
        return Err(ScanError::InvalidPortSpec("no ports given".to_string()));
    }

    let mut ports = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_port(lo)?;
                let hi = parse_port(hi)?;
                if lo > hi {
                    return Err(ScanError::InvalidPortSpec(format!(
                        "descending range \"{part}\""
                    )));
                }
                ports.extend(lo..=hi);
            }
            None => ports.push(parse_port(part)?),
        }
    }

    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

fn parse_port(s: &str) -> Result<u16, ScanError> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|_| ScanError::InvalidPortSpec(format!("bad port number \"{s}\"")))?;
    if port == 0 {
        return Err(ScanError::InvalidPortSpec(
            "port 0 is not probeable".to_string(),
        ));
    }
    Ok(port)
}

/// Resolve a hostname or IP address string to an address.
pub async fn resolve_target(target: &str) -> Result<IpAddr, ScanError> {
    // An IP literal needs no lookup.
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
    use trust_dns_resolver::TokioAsyncResolver;

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let response = resolver
        .lookup_ip(target)
        .await
        .map_err(|e| ScanError::Resolve(format!("{target}: {e}")))?;

    response
        .iter()
        .next()
        .ok_or_else(|| ScanError::Resolve(format!("{target}: no addresses found")))
}
