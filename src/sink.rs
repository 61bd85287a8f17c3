//! Trait abstraction for diagnostic report output to enable testing
//!
//! Decoded records and decode failures are reported as human-readable lines
//! through a [`ReportSink`]. The `process_*` entry points take the sink as
//! an `Option` and skip all formatting work when none is attached, so a
//! caller that only wants the boolean outcome pays nothing for strings it
//! never sees.

/// Consumer of formatted diagnostic lines
pub trait ReportSink {
    /// Consume one formatted line (no trailing newline)
    fn line(&mut self, line: &str);
}

impl<F: FnMut(&str)> ReportSink for F {
    fn line(&mut self, line: &str) {
        self(line)
    }
}

/// Sink that prints each line to stdout
///
/// Used by the `btlq-mon` binary when report printing is enabled.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn line(&mut self, line: &str) {
        println!("{}", line);
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;

    /// Mock sink that records every line for assertions
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub lines: Vec<String>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ReportSink for RecordingSink {
        fn line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }
}
