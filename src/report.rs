//! # Quality Report Events
//!
//! The event shape handed over by the management event channel, and the
//! manufacturer router that picks the vendor decoder for it. Intel
//! controllers get the extended telemetry decoder; everything else takes
//! the generic AOSP path, whose own subevent check rejects foreign
//! payloads.

use serde::Serialize;
use std::fmt;

use crate::aosp::{self, BqrRecord};
use crate::error::DecodeError;
use crate::intel::decoder;
use crate::intel::protocol::{is_intel_manufacturer, TelemetryRecord};
use crate::sink::ReportSink;

/// One quality report event from the management channel
///
/// Carries the controller's manufacturer identifier and the opaque vendor
/// payload; what the payload means is entirely up to the vendor decoder
/// the manufacturer routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReport {
    /// Bluetooth SIG company identifier of the controller
    pub manufacturer: u16,

    /// Opaque vendor report payload
    pub data: Vec<u8>,
}

/// A successfully decoded quality report of either vendor format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "vendor", rename_all = "lowercase")]
pub enum DecodedReport {
    Intel(TelemetryRecord),
    Aosp(BqrRecord),
}

impl fmt::Display for DecodedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedReport::Intel(record) => record.fmt(f),
            DecodedReport::Aosp(record) => record.fmt(f),
        }
    }
}

/// Decode a quality report event into a structured record
///
/// Callers that need field access use this; the sink output of the
/// `process_*` path is diagnostic text, not a data format.
pub fn decode_quality_report(report: &QualityReport) -> Result<DecodedReport, DecodeError> {
    if is_intel_manufacturer(report.manufacturer) {
        decoder::decode_telemetry(&report.data).map(DecodedReport::Intel)
    } else {
        aosp::decode_quality_report(&report.data).map(DecodedReport::Aosp)
    }
}

/// Decode a quality report event and report the outcome
///
/// Boolean entry point for event dispatchers: routes by manufacturer and
/// folds any decode error into `false`. Formatting only happens when a
/// sink is attached.
pub fn process_quality_report(report: &QualityReport, sink: Option<&mut dyn ReportSink>) -> bool {
    if is_intel_manufacturer(report.manufacturer) {
        decoder::process_telemetry_report(report, sink)
    } else {
        aosp::process_quality_report(report, sink)
    }
}
