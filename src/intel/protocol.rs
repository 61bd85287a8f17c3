//! # Intel Extended Telemetry Protocol
//!
//! Constants and record types for Intel controller extended telemetry.
//!
//! The wire format is a vendor event payload of `[sub_opcode][TLV...]`
//! where each TLV subevent is `[id: u8][length: u8][value: length bytes]`
//! and all multi-byte values are little-endian. A report describes either
//! an ACL link or a SCO/eSCO link; which one is decided by the
//! connection-handle tag that appears in the stream.

use serde::Serialize;
use std::fmt;

/// Bluetooth SIG company identifier assigned to Intel
pub const COMPANY_ID_INTEL: u16 = 0x0002;

/// Sub-opcode marking a vendor event payload as extended telemetry
pub const TELEMETRY_SUB_OPCODE: u8 = 0x03;

/// Per-slot counters in each SCO error array
pub const INTEL_NUM_SLOTS: usize = 5;

/// Retry buckets in the ACL retry counter array (0, 1, 2, 3, more)
pub const INTEL_NUM_RETRIES: usize = 5;

/// BR/EDR packet types tracked by the ACL per-type tx counters
/// (DH1, DH3, DH5, 2-DH1, 2-DH3, 2-DH5, 3-DH1, 3-DH3, 3-DH5)
pub const INTEL_NUM_PACKET_TYPES: usize = 9;

// Telemetry event types carried by the EXT_EVENT_TYPE subevent.
pub const SYSTEM_EXCEPTION: u8 = 0x00;
pub const FATAL_EXCEPTION: u8 = 0x01;
pub const DEBUG_EXCEPTION: u8 = 0x02;
pub const CONNECTION_EVENT: u8 = 0x03;
pub const DISCONNECTION_EVENT: u8 = 0x04;
/// The only event type that is decoded into a record
pub const LINK_QUALITY_REPORT: u8 = 0x05;

/// Subevent tag carrying the telemetry event type of the whole report
pub const EXT_EVENT_TYPE: u8 = 0x01;

// ACL link quality subevent tags.
pub const ACL_CONNECTION_HANDLE: u8 = 0x4a;
pub const ACL_RX_HEC_ERRORS: u8 = 0x4b;
pub const ACL_RX_CRC_ERRORS: u8 = 0x4c;
pub const ACL_PACKETS_FROM_HOST: u8 = 0x4d;
pub const ACL_TX_PACKETS: u8 = 0x4e;
/// First of five consecutive tags, one per retry bucket
pub const ACL_TX_PACKETS_RETRY_BASE: u8 = 0x4f;
/// First of nine consecutive tags, one per BR/EDR packet type
pub const ACL_TX_PACKETS_BY_TYPE_BASE: u8 = 0x54;
pub const ACL_RX_PACKETS: u8 = 0x5d;
pub const ACL_LINK_THROUGHPUT: u8 = 0x5e;
pub const ACL_MAX_PACKET_LATENCY: u8 = 0x5f;
pub const ACL_AVG_PACKET_LATENCY: u8 = 0x60;

// SCO/eSCO link quality subevent tags.
pub const SCO_CONNECTION_HANDLE: u8 = 0x6a;
pub const SCO_PACKETS_FROM_HOST: u8 = 0x6b;
pub const SCO_TX_PACKETS: u8 = 0x6c;
pub const SCO_RX_PAYLOAD_LOST: u8 = 0x6d;
pub const SCO_TX_PAYLOAD_LOST: u8 = 0x6e;
pub const SCO_RX_NO_SYNC_ERRORS: u8 = 0x6f;
pub const SCO_RX_HEC_ERRORS: u8 = 0x70;
pub const SCO_RX_CRC_ERRORS: u8 = 0x71;
pub const SCO_RX_NAK_ERRORS: u8 = 0x72;
pub const SCO_TX_FAILED_WIFI_COEX: u8 = 0x73;
pub const SCO_RX_FAILED_WIFI_COEX: u8 = 0x74;
pub const SCO_SAMPLES_INSERTED_BY_CDC: u8 = 0x75;
pub const SCO_SAMPLES_DROPPED: u8 = 0x76;
pub const SCO_MUTE_SAMPLES: u8 = 0x77;
pub const SCO_PLC_INJECTIONS: u8 = 0x78;

/// Check whether a company identifier belongs to an Intel controller
pub fn is_intel_manufacturer(manufacturer: u16) -> bool {
    manufacturer == COMPANY_ID_INTEL
}

/// Human-readable name of a telemetry event type
pub fn event_type_name(event_type: u8) -> &'static str {
    match event_type {
        SYSTEM_EXCEPTION => "system exception",
        FATAL_EXCEPTION => "fatal exception",
        DEBUG_EXCEPTION => "debug exception",
        CONNECTION_EVENT => "connection event",
        DISCONNECTION_EVENT => "disconnection event",
        LINK_QUALITY_REPORT => "link quality report",
        _ => "unknown event type",
    }
}

/// Link discriminant of a telemetry decode pass
///
/// Set by the first connection-handle tag seen in a stream and never
/// overwritten for the rest of the pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    #[default]
    Unknown,
    Acl,
    Sco,
}

/// Link quality counters for one ACL connection
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AclLinkStats {
    /// Connection handle of the reported link
    pub conn_handle: u16,

    /// Packets received with a header error
    pub rx_hec_errors: u32,

    /// Packets received with a payload CRC error
    pub rx_crc_errors: u32,

    /// Packets handed to the controller by the host
    pub packets_from_host: u32,

    /// Packets transmitted over the air
    pub tx_packets: u32,

    /// Transmitted packets by retry count (0, 1, 2, 3, more)
    pub tx_packets_retry: [u32; INTEL_NUM_RETRIES],

    /// Transmitted packets by BR/EDR packet type
    pub tx_packets_by_type: [u32; INTEL_NUM_PACKET_TYPES],

    /// Packets received over the air
    pub rx_packets: u32,

    /// Estimated link throughput in bytes per second
    pub link_throughput: u32,

    /// Worst packet latency observed, in milliseconds
    pub max_packet_latency: u32,

    /// Average packet latency, in milliseconds
    pub avg_packet_latency: u32,
}

impl fmt::Display for AclLinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "acl handle 0x{:04x}: host->ctrl {}, tx {} (retry {:?}, by type {:?}), \
             rx {}, hec errors {}, crc errors {}, throughput {}, latency max/avg {}/{}",
            self.conn_handle,
            self.packets_from_host,
            self.tx_packets,
            self.tx_packets_retry,
            self.tx_packets_by_type,
            self.rx_packets,
            self.rx_hec_errors,
            self.rx_crc_errors,
            self.link_throughput,
            self.max_packet_latency,
            self.avg_packet_latency,
        )
    }
}

/// Link quality counters for one SCO/eSCO connection
///
/// The six error arrays hold one counter per slot offset; the scalar
/// counters at the end describe the audio path (clock drift compensation,
/// dropped and muted samples, packet loss concealment).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScoLinkStats {
    /// Connection handle of the reported link
    pub conn_handle: u16,

    /// Packets handed to the controller by the host
    pub packets_from_host: u32,

    /// Packets transmitted over the air
    pub tx_packets: u32,

    /// Received packets with lost payload
    pub rx_payload_lost: u32,

    /// Transmitted packets with lost payload
    pub tx_payload_lost: u32,

    /// Receive failures due to missing sync, per slot
    pub rx_no_sync_errors: [u32; INTEL_NUM_SLOTS],

    /// Receive header errors, per slot
    pub rx_hec_errors: [u32; INTEL_NUM_SLOTS],

    /// Receive payload CRC errors, per slot
    pub rx_crc_errors: [u32; INTEL_NUM_SLOTS],

    /// Received NAKs, per slot
    pub rx_nak_errors: [u32; INTEL_NUM_SLOTS],

    /// Transmissions skipped for wifi coexistence, per slot
    pub tx_failed_wifi_coex: [u32; INTEL_NUM_SLOTS],

    /// Receptions skipped for wifi coexistence, per slot
    pub rx_failed_wifi_coex: [u32; INTEL_NUM_SLOTS],

    /// Samples inserted by clock drift compensation
    pub samples_inserted_by_cdc: u32,

    /// Samples dropped by clock drift compensation
    pub samples_dropped: u32,

    /// Samples muted on the audio path
    pub mute_samples: u32,

    /// Packet loss concealment injections
    pub plc_injections: u32,
}

impl fmt::Display for ScoLinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sco handle 0x{:04x}: host->ctrl {}, tx {}, payload lost rx/tx {}/{}, \
             cdc inserted {}, dropped {}, mute {}, plc {}",
            self.conn_handle,
            self.packets_from_host,
            self.tx_packets,
            self.rx_payload_lost,
            self.tx_payload_lost,
            self.samples_inserted_by_cdc,
            self.samples_dropped,
            self.mute_samples,
            self.plc_injections,
        )
    }
}

/// Link statistics of a decoded telemetry record
///
/// `Unknown` means the stream carried no connection-handle tag, which is
/// legal for a report with no per-link payload.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "link_type", rename_all = "snake_case")]
pub enum LinkStats {
    #[default]
    Unknown,
    Acl(AclLinkStats),
    Sco(ScoLinkStats),
}

impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStats::Unknown => write!(f, "no link statistics"),
            LinkStats::Acl(acl) => acl.fmt(f),
            LinkStats::Sco(sco) => sco.fmt(f),
        }
    }
}

/// One decoded Intel extended telemetry report
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryRecord {
    /// Telemetry event type (always [`LINK_QUALITY_REPORT`] for records
    /// produced by the decoder when the tag was present)
    pub event_type: u8,

    /// Per-link counters, keyed by the link type seen in the stream
    pub link: LinkStats,
}

impl TelemetryRecord {
    /// Link discriminant selected during the decode pass
    pub fn link_type(&self) -> LinkType {
        match self.link {
            LinkStats::Unknown => LinkType::Unknown,
            LinkStats::Acl(_) => LinkType::Acl,
            LinkStats::Sco(_) => LinkType::Sco,
        }
    }

    /// Connection handle of the reported link, if one was present
    pub fn conn_handle(&self) -> Option<u16> {
        match &self.link {
            LinkStats::Unknown => None,
            LinkStats::Acl(acl) => Some(acl.conn_handle),
            LinkStats::Sco(sco) => Some(sco.conn_handle),
        }
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "intel telemetry [{}] {}",
            event_type_name(self.event_type),
            self.link
        )
    }
}
