//! Report output.
//!
//! Records are written as they arrive from concurrent polls, so the writer is
//! shared behind a lock and each record is written in one piece.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use printsight_common::{Result, encode};

use crate::config::ReportFormat;
use crate::error::ConnectionError;
use crate::status::DeviceStatus;

/// Counts for one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub polled: usize,
    pub failed: usize,
}

/// Writes status records and connection failures.
pub struct Reporter {
    format: ReportFormat,
    out: Mutex<Box<dyn Write + Send>>,
    polled: AtomicUsize,
    failed: AtomicUsize,
}

impl Reporter {
    pub fn new(format: ReportFormat, out: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            out: Mutex::new(out),
            polled: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// A reporter writing to stdout.
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(format, Box::new(std::io::stdout()))
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        // A panic mid-write leaves at worst a torn record; keep reporting.
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(bytes)?;
        out.flush()?;
        Ok(())
    }

    /// Write one status record.
    pub fn report(&self, status: &DeviceStatus) -> Result<()> {
        self.polled.fetch_add(1, Ordering::Relaxed);

        let bytes = match self.format.encoding() {
            None => {
                let mut text = status.render();
                text.push('\n');
                text.into_bytes()
            }
            Some(format) => {
                let mut bytes = encode(status, format)?;
                if self.format == ReportFormat::Json {
                    bytes.push(b'\n');
                }
                bytes
            }
        };
        self.write(&bytes)
    }

    /// Log a failed poll and, for text output, print one error line.
    pub fn report_error(&self, host: &str, error: &ConnectionError) -> Result<()> {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(device = %host, error = %error, "Device unreachable");

        match self.format {
            ReportFormat::Text => self.write(format!("Error: {}: {}\n\n", host, error).as_bytes()),
            // Machine-readable streams carry records only.
            ReportFormat::Json | ReportFormat::Cbor => Ok(()),
        }
    }

    /// Counts since the last call, then reset.
    pub fn take_summary(&self) -> PassSummary {
        PassSummary {
            polled: self.polled.swap(0, Ordering::Relaxed),
            failed: self.failed.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Clonable in-memory sink.
    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Sink {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    fn unreachable(host: &str) -> ConnectionError {
        ConnectionError::Handshake {
            address: host.to_string(),
            reason: "Request timed out".to_string(),
        }
    }

    #[test]
    fn test_text_report() {
        let sink = Sink::default();
        let reporter = Reporter::new(ReportFormat::Text, Box::new(sink.clone()));

        reporter.report(&DeviceStatus::new("10.0.0.5:161")).unwrap();
        reporter
            .report_error("10.0.0.6:161", &unreachable("10.0.0.6:161"))
            .unwrap();

        let text = String::from_utf8(sink.contents()).unwrap();
        assert!(text.starts_with("Printer: 10.0.0.5:161\n"));
        assert!(text.contains("Error: 10.0.0.6:161: Device 10.0.0.6:161 did not answer"));
        assert_eq!(reporter.take_summary(), PassSummary { polled: 1, failed: 1 });
        assert_eq!(reporter.take_summary(), PassSummary::default());
    }

    #[test]
    fn test_json_report_is_one_line_per_record() {
        let sink = Sink::default();
        let reporter = Reporter::new(ReportFormat::Json, Box::new(sink.clone()));

        let mut status = DeviceStatus::new("10.0.0.5:161");
        status.total_pages = 1200;
        reporter.report(&status).unwrap();
        reporter.report(&DeviceStatus::new("10.0.0.7:161")).unwrap();
        reporter
            .report_error("10.0.0.6:161", &unreachable("10.0.0.6:161"))
            .unwrap();

        let text = String::from_utf8(sink.contents()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let decoded: DeviceStatus = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn test_cbor_report_decodes() {
        let sink = Sink::default();
        let reporter = Reporter::new(ReportFormat::Cbor, Box::new(sink.clone()));

        let status = DeviceStatus::new("10.0.0.5:161");
        reporter.report(&status).unwrap();

        let decoded: DeviceStatus = printsight_common::decode_auto(&sink.contents()).unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn test_poisoned_writer_still_reports() {
        let sink = Sink::default();
        let reporter = Arc::new(Reporter::new(ReportFormat::Text, Box::new(sink.clone())));

        let holder = reporter.clone();
        let result = std::thread::spawn(move || {
            let _out = holder.out.lock().unwrap();
            panic!("writer panicked");
        })
        .join();
        assert!(result.is_err());
        assert!(reporter.out.is_poisoned());

        reporter.report(&DeviceStatus::new("10.0.0.5:161")).unwrap();

        let text = String::from_utf8(sink.contents()).unwrap();
        assert!(text.starts_with("Printer: 10.0.0.5:161\n"));
    }
}
