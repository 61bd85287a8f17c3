//! # AOSP Bluetooth Quality Report Decoder
//!
//! Decodes the AOSP BQR vendor event, a fixed-layout little-endian record.
//! There is no TLV structure; every field sits at a fixed offset behind the
//! subevent code. The record may be followed by a Vendor Specific Parameter
//! region, which is ignored for lack of a standard way of reading it.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::DecodeError;
use crate::report::QualityReport;
use crate::sink::ReportSink;

/// Subevent code marking a vendor event as a Bluetooth quality report
pub const BQR_SUBEVENT_CODE: u8 = 0x58;

/// Fixed wire size of a quality report, subevent code included
///
/// The variable vendor-specific tail is excluded from the minimum.
pub const BQR_MIN_SIZE: usize = 49;

/// One decoded AOSP Bluetooth quality report
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BqrRecord {
    /// Report subtype (monitor mode, approaching LSTO, A2DP choppy, ...)
    pub quality_report_id: u8,

    /// BR/EDR packet type of the connection
    pub packet_type: u8,

    /// Connection handle of the reported link
    pub conn_handle: u16,

    /// Role of the local device on the connection (central/peripheral)
    pub conn_role: u8,

    /// Transmit power level, -30 to 20 dBm
    pub tx_power_level: i8,

    /// Received signal strength, -127 to 20 dBm
    pub rssi: i8,

    /// Signal-to-noise ratio in dB
    pub snr: u8,

    /// AFH channels marked unused
    pub unused_afh_channel_count: u8,

    /// AFH channels selected despite non-ideal quality
    pub afh_select_unideal_channel_count: u8,

    /// Link supervision timeout
    pub lsto: u16,

    /// Piconet clock at the time of the report
    pub conn_piconet_clock: u32,

    /// Retransmitted packets
    pub retransmission_count: u32,

    /// Slots with no packet received
    pub no_rx_count: u32,

    /// NAKs received
    pub nak_count: u32,

    /// Timestamp of the last transmitted packet that was acknowledged
    pub last_tx_ack_timestamp: u32,

    /// Times the controller flowed off the host
    pub flow_off_count: u32,

    /// Timestamp of the last flow-on
    pub last_flow_on_timestamp: u32,

    /// Bytes dropped to buffer overflow
    pub buffer_overflow_bytes: u32,

    /// Bytes of silence inserted on buffer underflow
    pub buffer_underflow_bytes: u32,
}

impl fmt::Display for BqrRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aosp bqr id {} handle 0x{:04x}: role {}, tx power {} dbm, rssi {} dbm, \
             snr {} db, retransmissions {}, no-rx {}, naks {}, flow-off {}, \
             buffer over/underflow {}/{}",
            self.quality_report_id,
            self.conn_handle,
            self.conn_role,
            self.tx_power_level,
            self.rssi,
            self.snr,
            self.retransmission_count,
            self.no_rx_count,
            self.nak_count,
            self.flow_off_count,
            self.buffer_overflow_bytes,
            self.buffer_underflow_bytes,
        )
    }
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Decode an AOSP quality report payload
///
/// # Arguments
///
/// * `data` - Vendor event payload: `[subevent_code][fixed record][tail...]`
///
/// # Returns
///
/// * `Result<BqrRecord>` - Decoded record with any trailing bytes ignored
///
/// # Errors
///
/// Returns error if:
/// - The payload is empty or below the fixed record size (`TooShort`)
/// - The subevent code is not a quality report (`WrongSubevent`, checked
///   before the size check)
pub fn decode_quality_report(data: &[u8]) -> Result<BqrRecord, DecodeError> {
    let subevent_code = *data.first().ok_or(DecodeError::TooShort {
        len: 0,
        min: BQR_MIN_SIZE,
    })?;

    if subevent_code != BQR_SUBEVENT_CODE {
        return Err(DecodeError::WrongSubevent {
            found: subevent_code,
        });
    }

    if data.len() < BQR_MIN_SIZE {
        return Err(DecodeError::TooShort {
            len: data.len(),
            min: BQR_MIN_SIZE,
        });
    }

    Ok(BqrRecord {
        quality_report_id: data[1],
        packet_type: data[2],
        conn_handle: read_u16(data, 3),
        conn_role: data[5],
        tx_power_level: data[6] as i8,
        rssi: data[7] as i8,
        snr: data[8],
        unused_afh_channel_count: data[9],
        afh_select_unideal_channel_count: data[10],
        lsto: read_u16(data, 11),
        conn_piconet_clock: read_u32(data, 13),
        retransmission_count: read_u32(data, 17),
        no_rx_count: read_u32(data, 21),
        nak_count: read_u32(data, 25),
        last_tx_ack_timestamp: read_u32(data, 29),
        flow_off_count: read_u32(data, 33),
        last_flow_on_timestamp: read_u32(data, 37),
        buffer_overflow_bytes: read_u32(data, 41),
        buffer_underflow_bytes: read_u32(data, 45),
    })
}

/// Decode an AOSP quality report event and report the outcome
///
/// Boolean entry point mirroring the Intel wrapper: the record summary (or
/// the error) is formatted only when a sink is attached, and benign
/// mismatches produce no sink line.
pub fn process_quality_report(
    report: &QualityReport,
    sink: Option<&mut dyn ReportSink>,
) -> bool {
    match decode_quality_report(&report.data) {
        Ok(record) => {
            if let Some(sink) = sink {
                sink.line(&record.to_string());
            }
            true
        }
        Err(err) => {
            if !err.is_benign() {
                debug!("aosp quality report decode failed: {}", err);
                if let Some(sink) = sink {
                    sink.line(&format!("error: {}", err));
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::mocks::RecordingSink;

    /// Build a minimum-size report with recognizable field values.
    fn sample_report() -> Vec<u8> {
        let mut data = vec![
            BQR_SUBEVENT_CODE,
            0x01, // quality_report_id
            0x02, // packet_type (DH1)
            0x0b, 0x00, // conn_handle = 0x000b
            0x00, // conn_role = central
            0xec, // tx_power_level = -20
            0xb0, // rssi = -80
            0x14, // snr = 20
            0x05, // unused_afh_channel_count
            0x02, // afh_select_unideal_channel_count
            0x00, 0x20, // lsto = 0x2000
        ];
        for counter in [
            0x0001_0000u32, // conn_piconet_clock
            10,             // retransmission_count
            20,             // no_rx_count
            30,             // nak_count
            0x1234_5678,    // last_tx_ack_timestamp
            2,              // flow_off_count
            0x1234_9999,    // last_flow_on_timestamp
            512,            // buffer_overflow_bytes
            256,            // buffer_underflow_bytes
        ] {
            data.extend_from_slice(&counter.to_le_bytes());
        }
        assert_eq!(data.len(), BQR_MIN_SIZE);
        data
    }

    #[test]
    fn test_decode_minimum_size_report() {
        let record = decode_quality_report(&sample_report()).unwrap();

        assert_eq!(record.quality_report_id, 1);
        assert_eq!(record.packet_type, 2);
        assert_eq!(record.conn_handle, 0x000b);
        assert_eq!(record.conn_role, 0);
        assert_eq!(record.tx_power_level, -20);
        assert_eq!(record.rssi, -80);
        assert_eq!(record.snr, 20);
        assert_eq!(record.unused_afh_channel_count, 5);
        assert_eq!(record.afh_select_unideal_channel_count, 2);
        assert_eq!(record.lsto, 0x2000);
        assert_eq!(record.conn_piconet_clock, 0x0001_0000);
        assert_eq!(record.retransmission_count, 10);
        assert_eq!(record.no_rx_count, 20);
        assert_eq!(record.nak_count, 30);
        assert_eq!(record.last_tx_ack_timestamp, 0x1234_5678);
        assert_eq!(record.flow_off_count, 2);
        assert_eq!(record.last_flow_on_timestamp, 0x1234_9999);
        assert_eq!(record.buffer_overflow_bytes, 512);
        assert_eq!(record.buffer_underflow_bytes, 256);
    }

    #[test]
    fn test_decode_one_byte_short_fails() {
        let mut data = sample_report();
        data.pop();
        assert_eq!(
            decode_quality_report(&data),
            Err(DecodeError::TooShort {
                len: BQR_MIN_SIZE - 1,
                min: BQR_MIN_SIZE
            })
        );
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert_eq!(
            decode_quality_report(&[]),
            Err(DecodeError::TooShort {
                len: 0,
                min: BQR_MIN_SIZE
            })
        );
    }

    #[test]
    fn test_decode_ignores_vendor_tail() {
        let mut data = sample_report();
        let expected = decode_quality_report(&data).unwrap();

        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_quality_report(&data).unwrap(), expected);
    }

    #[test]
    fn test_decode_wrong_subevent() {
        let mut data = sample_report();
        data[0] = 0x57;

        let err = decode_quality_report(&data).unwrap_err();
        assert_eq!(err, DecodeError::WrongSubevent { found: 0x57 });
        assert!(err.is_benign());
    }

    #[test]
    fn test_subevent_check_precedes_size_check() {
        // A short buffer with a foreign subevent code is a mismatch, not a
        // truncation.
        let data = [0x57, 0x01, 0x02];
        assert_eq!(
            decode_quality_report(&data),
            Err(DecodeError::WrongSubevent { found: 0x57 })
        );
    }

    #[test]
    fn test_signed_fields_sign_extend() {
        let mut data = sample_report();
        data[6] = 0x14; // +20 dbm
        data[7] = 0x81; // -127 dbm

        let record = decode_quality_report(&data).unwrap();
        assert_eq!(record.tx_power_level, 20);
        assert_eq!(record.rssi, -127);
    }

    #[test]
    fn test_process_report_emits_summary() {
        let report = QualityReport {
            manufacturer: 0x001d,
            data: sample_report(),
        };
        let mut sink = RecordingSink::new();

        assert!(process_quality_report(&report, Some(&mut sink)));
        assert_eq!(sink.lines.len(), 1);
        assert!(sink.lines[0].contains("handle 0x000b"));
        assert!(sink.lines[0].contains("rssi -80 dbm"));
    }

    #[test]
    fn test_process_report_benign_failure_is_silent() {
        let report = QualityReport {
            manufacturer: 0x001d,
            data: vec![0x59, 0x00, 0x00],
        };
        let mut sink = RecordingSink::new();

        assert!(!process_quality_report(&report, Some(&mut sink)));
        assert!(sink.lines.is_empty());
    }

    #[test]
    fn test_process_report_truncated_stream_reports_error() {
        let mut data = sample_report();
        data.truncate(30);
        let report = QualityReport {
            manufacturer: 0x001d,
            data,
        };
        let mut sink = RecordingSink::new();

        assert!(!process_quality_report(&report, Some(&mut sink)));
        assert_eq!(sink.lines.len(), 1);
        assert!(sink.lines[0].contains("below the 49 byte minimum"));
    }

    #[test]
    fn test_display_is_single_line() {
        let record = decode_quality_report(&sample_report()).unwrap();
        let line = record.to_string();
        assert!(line.starts_with("aosp bqr id 1"));
        assert!(!line.contains('\n'));
    }
}
