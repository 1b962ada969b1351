//! Scan driver.
//!
//! Turns a port list into probe jobs, feeds them through a [`Workflow`],
//! and correlates the out-of-order completions back into per-port result
//! slots before assembling the report.

use crate::cli::Protocol;
use crate::error::{ScanError, ScanResult};
use crate::probe::{self, NetTcpDial, NetUdpDial, ProbeStatus, Recovery};
use crate::services;
use crate::workflow::{WorkItem, Workflow};
use async_trait::async_trait;
use futures::future::BoxFuture;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Everything a scan run needs to know.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Resolved target address.
    pub target: IpAddr,
    /// What the user asked for, kept for display.
    pub target_hostname: String,
    /// Probe protocol.
    pub protocol: Protocol,
    /// Ports to probe, one job each.
    pub ports: Vec<u16>,
    /// Worker pool size.
    pub workers: usize,
    /// Maximum probe starts per second per worker (0 = unlimited).
    pub max_rate: u32,
    /// Draw a progress bar on stderr while scanning.
    pub show_progress: bool,
}

/// One open port with its likely service name.
#[derive(Debug, Clone, Serialize)]
pub struct OpenPort {
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
}

/// Complete scan results.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub ip_address: String,
    pub protocol: String,
    pub ports_scanned: usize,
    pub open_ports: Vec<OpenPort>,
    pub duration_ms: u64,
    pub probes_completed: usize,
    pub probes_unthrottled: usize,
}

type ProbeBody = Box<dyn FnOnce() -> BoxFuture<'static, ProbeStatus> + Send>;

/// A single port probe queued into the workflow.
///
/// The port doubles as the correlation identity: completions come back in
/// arbitrary order, and the driver maps each one to its result slot by
/// port, never by position.
pub struct ProbeJob {
    port: u16,
    status: ProbeStatus,
    body: Option<ProbeBody>,
}

impl ProbeJob {
    /// Build the job for one port, capturing target, protocol, and port by
    /// value so each job probes exactly the port it was built for.
    fn new(target: IpAddr, protocol: Protocol, port: u16) -> Self {
        let body: ProbeBody = Box::new(move || {
            Box::pin(async move {
                match protocol {
                    Protocol::Tcp => probe::tcp::probe(&NetTcpDial, target, port).await,
                    Protocol::Udp => {
                        probe::udp::probe(&NetUdpDial, target, port, Recovery::FailFast).await
                    }
                }
            })
        });
        Self {
            port,
            status: ProbeStatus::default(),
            body: Some(body),
        }
    }
}

#[async_trait]
impl WorkItem for ProbeJob {
    async fn execute(mut self, output: &mpsc::Sender<Self>) {
        if let Some(body) = self.body.take() {
            self.status = body().await;
        }
        debug!(port = self.port, status = %self.status, "probe finished");
        let _ = output.send(self).await;
    }
}

/// Execute a complete port scan.
pub async fn run_scan(config: ScanConfig) -> ScanResult<ScanReport> {
    let total = config.ports.len();
    if total == 0 {
        return Err(ScanError::EmptyPortList);
    }

    info!(
        target = %config.target,
        protocol = %config.protocol,
        ports = total,
        workers = config.workers,
        rate = config.max_rate,
        "starting scan"
    );

    // Capacity sized to the exact job count, per the workflow's contract.
    let mut workflow = Workflow::new(total, config.workers, config.max_rate)?;

    let progress = config.show_progress.then(|| {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb
    });

    let start = Instant::now();

    // One result slot per port. Completions arrive unordered, so each
    // dequeued job is routed to its slot through this index.
    let mut slots: Vec<(u16, ProbeStatus)> = config
        .ports
        .iter()
        .map(|&port| (port, ProbeStatus::default()))
        .collect();
    let slot_index: HashMap<u16, usize> = config
        .ports
        .iter()
        .enumerate()
        .map(|(slot, &port)| (port, slot))
        .collect();

    for &port in &config.ports {
        workflow
            .enqueue(ProbeJob::new(config.target, config.protocol, port))
            .await;
        if let Some(pb) = &progress {
            pb.tick();
        }
    }

    for slot in 0..slots.len() {
        while !slots[slot].1.is_complete() {
            let Some(job) = workflow.dequeue().await else {
                break;
            };
            if let Some(pb) = &progress {
                pb.inc(1);
                if job.status.is_open() {
                    pb.set_message(format!("found open port {}", job.port));
                }
            }
            if let Some(&at) = slot_index.get(&job.port) {
                slots[at].1 = job.status;
            }
        }
    }

    let duration = start.elapsed();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let stats = workflow.destroy().await;

    let open_ports: Vec<OpenPort> = slots
        .iter()
        .filter(|(_, status)| status.is_open())
        .map(|&(port, _)| OpenPort {
            port,
            service: services::lookup(port, config.protocol),
        })
        .collect();

    info!(
        open = open_ports.len(),
        elapsed_ms = duration.as_millis() as u64,
        "scan finished"
    );

    Ok(ScanReport {
        target: config.target_hostname,
        ip_address: config.target.to_string(),
        protocol: config.protocol.to_string(),
        ports_scanned: total,
        open_ports,
        duration_ms: duration.as_millis() as u64,
        probes_completed: stats.completed,
        probes_unthrottled: stats.unthrottled,
    })
}
