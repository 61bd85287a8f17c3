//! # btlq-mon
//!
//! Replays a capture stream of controller quality-report events through
//! the vendor decoders.
//!
//! The capture is a file (or stdin) with one JSON object per line carrying
//! a manufacturer identifier and a hex payload. Each event is routed to
//! the Intel or AOSP decoder, printed as a summary line, and appended to
//! the record journal when journaling is enabled. `--follow` keeps polling
//! the capture file for appended events, the way a live event channel
//! would deliver them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use btlq::capture;
use btlq::config::Config;
use btlq::journal::RecordJournal;
use btlq::report;
use btlq::sink::{ReportSink, StdoutSink};

/// Decode Bluetooth controller link-quality telemetry from a capture
/// stream
#[derive(Parser, Debug)]
#[command(name = "btlq-mon", version, about)]
struct Args {
    /// Capture file to read quality-report events from, or `-` for stdin
    capture: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep polling the capture file for appended events
    #[arg(short, long)]
    follow: bool,
}

/// Outcome counters for one monitor run
#[derive(Debug, Default, PartialEq, Eq)]
struct Stats {
    /// Events decoded into a record
    decoded: u64,

    /// Events that were not a decodable report (foreign vendor, other
    /// telemetry subtype)
    skipped: u64,

    /// Events with a malformed vendor payload
    failed: u64,

    /// Capture lines that were not valid JSON/hex
    malformed: u64,
}

/// Process one capture line: parse, route, report, journal
///
/// Blank lines and `#` comments are ignored. Malformed lines are counted
/// and skipped so one bad line does not end the run.
fn handle_line(
    line: &str,
    sink: Option<&mut dyn ReportSink>,
    journal: Option<&mut RecordJournal>,
    stats: &mut Stats,
) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    let event = match capture::parse_capture_line(line) {
        Ok(event) => event,
        Err(err) => {
            stats.malformed += 1;
            warn!("skipping malformed capture line: {}", err);
            return;
        }
    };

    match report::decode_quality_report(&event) {
        Ok(record) => {
            stats.decoded += 1;
            if let Some(sink) = sink {
                sink.line(&record.to_string());
            }
            if let Some(journal) = journal {
                if let Err(err) = journal.append(&record) {
                    warn!("journal write failed: {}", err);
                }
            }
        }
        Err(err) if err.is_benign() => {
            stats.skipped += 1;
            debug!("skipping report: {}", err);
        }
        Err(err) => {
            stats.failed += 1;
            warn!("decode failed: {}", err);
        }
    }
}

/// Read the next line, polling for more in follow mode
///
/// Returns `None` at end of input; in follow mode end of file just waits
/// one poll interval and tries again.
async fn next_event_line(
    reader: &mut (impl AsyncBufRead + Unpin),
    follow: bool,
    poll: Duration,
) -> io::Result<Option<String>> {
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf).await? == 0 {
            if follow {
                sleep(poll).await;
                continue;
            }
            return Ok(None);
        }
        return Ok(Some(buf));
    }
}

/// Set up the tracing subscriber per configuration
///
/// RUST_LOG overrides the configured level. The returned guard must stay
/// alive for the non-blocking file writer to flush.
fn init_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    match &config.log.file {
        Some(file) => {
            let path = std::path::Path::new(file);
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => std::path::Path::new("."),
            };
            let name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "btlq-mon.log".into());

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config);

    info!("btlq-mon v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut reader: Box<dyn AsyncBufRead + Unpin> = if args.capture == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.capture)
            .await
            .with_context(|| format!("opening capture file {}", args.capture))?;
        Box::new(BufReader::new(file))
    };

    let mut journal = if config.telemetry.enabled {
        let journal = RecordJournal::new(&config.telemetry)?;
        info!("journaling decoded records under {}", journal.dir().display());
        Some(journal)
    } else {
        None
    };

    // Follow mode only makes sense for files; stdin blocks on its own.
    let follow = args.follow && args.capture != "-";
    let poll = Duration::from_millis(config.monitor.poll_interval_ms);

    let mut sink = StdoutSink;
    let mut stats = Stats::default();

    if follow {
        info!("following {} (poll every {:?})", args.capture, poll);
    }

    loop {
        tokio::select! {
            line = next_event_line(&mut reader, follow, poll) => {
                match line? {
                    Some(line) => {
                        let sink: Option<&mut dyn ReportSink> = if config.monitor.print_reports {
                            Some(&mut sink)
                        } else {
                            None
                        };
                        handle_line(&line, sink, journal.as_mut(), &mut stats);
                    }
                    None => break,
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!(
        "decoded {} reports, skipped {} foreign or unsupported, {} decode failures, {} malformed lines",
        stats.decoded, stats.skipped, stats.failed, stats.malformed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that collects lines for assertions.
    #[derive(Default)]
    struct TestSink {
        lines: Vec<String>,
    }

    impl ReportSink for TestSink {
        fn line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    const INTEL_LINE: &str = r#"{"manufacturer": 2, "report": "03 01 01 05 4a 02 34 12"}"#;

    #[test]
    fn test_handle_line_decodes_and_prints() {
        let mut sink = TestSink::default();
        let mut stats = Stats::default();

        handle_line(INTEL_LINE, Some(&mut sink), None, &mut stats);

        assert_eq!(stats.decoded, 1);
        assert_eq!(sink.lines.len(), 1);
        assert!(sink.lines[0].contains("acl handle 0x1234"));
    }

    #[test]
    fn test_handle_line_without_sink() {
        let mut stats = Stats::default();
        handle_line(INTEL_LINE, None, None, &mut stats);
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn test_handle_line_skips_comments_and_blanks() {
        let mut stats = Stats::default();
        handle_line("", None, None, &mut stats);
        handle_line("   \n", None, None, &mut stats);
        handle_line("# a comment", None, None, &mut stats);
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_handle_line_counts_benign_skips() {
        // Event type 0x00 is a system exception, not a link quality report.
        let line = r#"{"manufacturer": 2, "report": "03 01 01 00"}"#;
        let mut sink = TestSink::default();
        let mut stats = Stats::default();

        handle_line(line, Some(&mut sink), None, &mut stats);

        assert_eq!(stats.skipped, 1);
        assert!(sink.lines.is_empty());
    }

    #[test]
    fn test_handle_line_counts_decode_failures() {
        // Unknown subevent tag 0x02.
        let line = r#"{"manufacturer": 2, "report": "03 02 01 00"}"#;
        let mut stats = Stats::default();

        handle_line(line, None, None, &mut stats);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn test_handle_line_counts_malformed_lines() {
        let mut stats = Stats::default();
        handle_line("{not json", None, None, &mut stats);
        handle_line(r#"{"manufacturer": 2, "report": "zz"}"#, None, None, &mut stats);
        assert_eq!(stats.malformed, 2);
    }

    #[tokio::test]
    async fn test_next_event_line_reads_until_eof() {
        let data: &[u8] = b"one\ntwo\n";
        let mut reader = BufReader::new(data);
        let poll = Duration::from_millis(1);

        assert_eq!(
            next_event_line(&mut reader, false, poll).await.unwrap(),
            Some("one\n".to_string())
        );
        assert_eq!(
            next_event_line(&mut reader, false, poll).await.unwrap(),
            Some("two\n".to_string())
        );
        assert_eq!(next_event_line(&mut reader, false, poll).await.unwrap(), None);
    }
}
