//! # Intel Telemetry Decoder
//!
//! Walks the TLV stream of an extended telemetry event and assembles a
//! [`TelemetryRecord`]. Every TLV is validated against the dispatch table
//! before its value is read: unknown tags, length mismatches and values
//! extending past the buffer end all abort the decode with no record.

use tracing::debug;

use super::protocol::*;
use super::table::{self, Slot, Subevent};
use crate::error::DecodeError;
use crate::report::QualityReport;
use crate::sink::ReportSink;

/// Per-pass scratch record, zeroed at the start of each decode
///
/// Holds both link layouts while the stream is walked; which one ends up in
/// the returned record is decided by the first connection-handle tag seen.
#[derive(Debug, Default)]
struct Scratch {
    event_type: u8,
    link_type: LinkType,
    acl: AclLinkStats,
    sco: ScoLinkStats,
}

impl Scratch {
    /// Write one validated TLV value into its destination field
    ///
    /// The caller guarantees `value` is exactly `subevent.value_len()`
    /// bytes, so the fixed-size reads below cannot go out of bounds.
    fn store(&mut self, subevent: &Subevent, value: &[u8]) {
        match subevent.slot {
            Slot::EventType => self.event_type = value[0],

            Slot::AclConnHandle => {
                self.acl.conn_handle = read_u16(value, 0);
                self.select_link(LinkType::Acl);
            }
            Slot::AclRxHecErrors => self.acl.rx_hec_errors = read_u32(value, 0),
            Slot::AclRxCrcErrors => self.acl.rx_crc_errors = read_u32(value, 0),
            Slot::AclPacketsFromHost => self.acl.packets_from_host = read_u32(value, 0),
            Slot::AclTxPackets => self.acl.tx_packets = read_u32(value, 0),
            Slot::AclTxPacketsRetry(i) => self.acl.tx_packets_retry[i] = read_u32(value, 0),
            Slot::AclTxPacketsByType(i) => self.acl.tx_packets_by_type[i] = read_u32(value, 0),
            Slot::AclRxPackets => self.acl.rx_packets = read_u32(value, 0),
            Slot::AclLinkThroughput => self.acl.link_throughput = read_u32(value, 0),
            Slot::AclMaxPacketLatency => self.acl.max_packet_latency = read_u32(value, 0),
            Slot::AclAvgPacketLatency => self.acl.avg_packet_latency = read_u32(value, 0),

            Slot::ScoConnHandle => {
                self.sco.conn_handle = read_u16(value, 0);
                self.select_link(LinkType::Sco);
            }
            Slot::ScoPacketsFromHost => self.sco.packets_from_host = read_u32(value, 0),
            Slot::ScoTxPackets => self.sco.tx_packets = read_u32(value, 0),
            Slot::ScoRxPayloadLost => self.sco.rx_payload_lost = read_u32(value, 0),
            Slot::ScoTxPayloadLost => self.sco.tx_payload_lost = read_u32(value, 0),
            Slot::ScoRxNoSyncErrors => read_u32_array(&mut self.sco.rx_no_sync_errors, value),
            Slot::ScoRxHecErrors => read_u32_array(&mut self.sco.rx_hec_errors, value),
            Slot::ScoRxCrcErrors => read_u32_array(&mut self.sco.rx_crc_errors, value),
            Slot::ScoRxNakErrors => read_u32_array(&mut self.sco.rx_nak_errors, value),
            Slot::ScoTxFailedWifiCoex => read_u32_array(&mut self.sco.tx_failed_wifi_coex, value),
            Slot::ScoRxFailedWifiCoex => read_u32_array(&mut self.sco.rx_failed_wifi_coex, value),
            Slot::ScoSamplesInsertedByCdc => {
                self.sco.samples_inserted_by_cdc = read_u32(value, 0)
            }
            Slot::ScoSamplesDropped => self.sco.samples_dropped = read_u32(value, 0),
            Slot::ScoMuteSamples => self.sco.mute_samples = read_u32(value, 0),
            Slot::ScoPlcInjections => self.sco.plc_injections = read_u32(value, 0),
        }
    }

    /// Set the link discriminant; the first handle tag seen wins and later
    /// handle tags never overwrite it.
    fn select_link(&mut self, link_type: LinkType) {
        if self.link_type == LinkType::Unknown {
            self.link_type = link_type;
        }
    }

    fn into_record(self) -> TelemetryRecord {
        let link = match self.link_type {
            LinkType::Unknown => LinkStats::Unknown,
            LinkType::Acl => LinkStats::Acl(self.acl),
            LinkType::Sco => LinkStats::Sco(self.sco),
        };
        TelemetryRecord {
            event_type: self.event_type,
            link,
        }
    }
}

fn read_u16(value: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([value[at], value[at + 1]])
}

fn read_u32(value: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([value[at], value[at + 1], value[at + 2], value[at + 3]])
}

/// Decode a 5-element array value, one little-endian u32 per element
fn read_u32_array(dest: &mut [u32; INTEL_NUM_SLOTS], value: &[u8]) {
    for (i, element) in dest.iter_mut().enumerate() {
        *element = read_u32(value, i * 4);
    }
}

/// Decode an Intel extended telemetry payload
///
/// # Arguments
///
/// * `data` - Vendor event payload: `[sub_opcode][TLV...]`
///
/// # Returns
///
/// * `Result<TelemetryRecord>` - Decoded record, or the first error hit
///
/// # Errors
///
/// Returns error if:
/// - The payload is empty (`TooShort`)
/// - The sub-opcode is not extended telemetry (`WrongSubopcode`)
/// - A tag is not in the dispatch table (`UnknownSubevent`)
/// - A declared length disagrees with the table (`LengthMismatch`)
/// - A TLV header or value extends past the buffer end (`BufferOverrun`)
/// - The event type is not a link quality report (`UnsupportedEventType`,
///   a benign outcome for telemetry subtypes this crate does not decode)
///
/// The decode succeeds only when the cursor lands exactly on the buffer
/// end; no partial record is ever returned.
pub fn decode_telemetry(data: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::TooShort { len: 0, min: 1 });
    }

    if data[0] != TELEMETRY_SUB_OPCODE {
        return Err(DecodeError::WrongSubopcode { found: data[0] });
    }

    let mut scratch = Scratch::default();
    let mut pos = 1;

    while pos < data.len() {
        // The id and length bytes must both be inside the buffer before
        // either is trusted.
        let id = data[pos];
        if data.len() - pos < 2 {
            return Err(DecodeError::BufferOverrun { id });
        }
        let length = data[pos + 1];

        let subevent = table::lookup(id).ok_or(DecodeError::UnknownSubevent { id })?;

        if length != subevent.value_len() {
            return Err(DecodeError::LengthMismatch { id, length });
        }

        // Bounds check precedes every field write.
        let value_start = pos + 2;
        let value_end = value_start + length as usize;
        if value_end > data.len() {
            return Err(DecodeError::BufferOverrun { id });
        }

        scratch.store(subevent, &data[value_start..value_end]);

        // Only link quality reports are decoded; other telemetry subtypes
        // abort the pass as soon as the event-type tag is seen.
        if subevent.slot == Slot::EventType && scratch.event_type != LINK_QUALITY_REPORT {
            return Err(DecodeError::UnsupportedEventType {
                event_type: scratch.event_type,
            });
        }

        pos = value_end;
    }

    Ok(scratch.into_record())
}

/// Decode an Intel quality report event and report the outcome
///
/// Boolean entry point for callers that only dispatch events. The record
/// summary (or the error) is formatted only when a sink is attached;
/// benign mismatches produce no sink line at all.
pub fn process_telemetry_report(
    report: &QualityReport,
    sink: Option<&mut dyn ReportSink>,
) -> bool {
    match decode_telemetry(&report.data) {
        Ok(record) => {
            if let Some(sink) = sink {
                sink.line(&record.to_string());
            }
            true
        }
        Err(err) => {
            if !err.is_benign() {
                debug!("intel telemetry decode failed: {}", err);
                if let Some(sink) = sink {
                    sink.line(&format!("error: {}", err));
                }
            }
            false
        }
    }
}
