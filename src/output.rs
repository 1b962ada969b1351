//! Report rendering.
//!
//! Plain text for humans, JSON for machines. Only open ports are listed;
//! everything else was closed or unreachable and stays silent.

use crate::scan::ScanReport;
use console::style;
use std::io::{self, Write};

/// Print the report as human-readable text.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    if report.open_ports.is_empty() {
        writeln!(
            out,
            "No open {} ports on {} ({}).",
            report.protocol, report.target, report.ip_address
        )?;
    } else {
        writeln!(
            out,
            "Open {} ports on {} ({}):",
            report.protocol, report.target, report.ip_address
        )?;
        for open in &report.open_ports {
            match open.service {
                Some(name) => {
                    writeln!(out, "  {:>5}  {}", style(open.port).green().bold(), name)?
                }
                None => writeln!(out, "  {:>5}", style(open.port).green().bold())?,
            }
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} {} ports scanned in {:.2}s ({} probes completed, {} unthrottled)",
        style("Done:").bold(),
        report.ports_scanned,
        report.duration_ms as f64 / 1000.0,
        report.probes_completed,
        report.probes_unthrottled
    )?;

    Ok(())
}

/// Print the report as a JSON document.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    println!("{json}");
    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}
