//! # Sounder - A Concurrent TCP/UDP Port Scanner
//!
//! Sounder classifies each port on a host as open or closed, using TCP
//! connect attempts and UDP send/receive probing, with concurrency bounded
//! by a fixed worker pool and an optional cap on the probe start rate.
//!
//! ## Features
//!
//! - **TCP and UDP probing**: connect-based TCP verdicts, timing-based UDP
//!   inference
//! - **Bounded concurrency**: a fixed worker pool drains a bounded queue,
//!   with optional per-worker rate pacing
//! - **Injected dialing**: probe logic takes the network as a capability,
//!   so it tests without sockets
//! - **Service names**: open ports are annotated from a well-known-port
//!   table
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sounder::probe::{self, NetTcpDial};
//! use std::net::IpAddr;
//!
//! #[tokio::main]
//! async fn main() {
//!     let target: IpAddr = "192.168.1.1".parse().unwrap();
//!     let status = probe::tcp::probe(&NetTcpDial, target, 80).await;
//!     println!("Port 80 is {}", status);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`probe`] - Tri-state probe outcomes, dial capabilities, and the
//!   TCP/UDP inference logic
//! - [`workflow`] - The bounded worker-pool scheduler
//! - [`scan`] - The driver tying ports, jobs, and results together
//! - [`services`] - Well-known service name lookup
//! - [`cli`] / [`output`] - Argument parsing and report rendering
//! - [`error`] - Error types

pub mod cli;
pub mod error;
pub mod output;
pub mod probe;
pub mod scan;
pub mod services;
pub mod workflow;

// Re-export commonly used types
pub use cli::Protocol;
pub use error::{ScanError, ScanResult, WorkflowError};
pub use probe::ProbeStatus;
pub use scan::{run_scan, ScanConfig, ScanReport};
pub use workflow::{WorkItem, Workflow, WorkflowStats};
