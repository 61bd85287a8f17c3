//! # Intel Telemetry Encoder
//!
//! Builds well-formed extended telemetry payloads from records. The
//! decoder never needs this; it exists to produce fixtures for round-trip
//! tests and synthetic capture files.

use super::protocol::*;

/// Append one TLV with a little-endian u16 value
pub fn push_tlv_u16(frame: &mut Vec<u8>, id: u8, value: u16) {
    frame.push(id);
    frame.push(2);
    frame.extend_from_slice(&value.to_le_bytes());
}

/// Append one TLV with a little-endian u32 value
pub fn push_tlv_u32(frame: &mut Vec<u8>, id: u8, value: u32) {
    frame.push(id);
    frame.push(4);
    frame.extend_from_slice(&value.to_le_bytes());
}

/// Append one TLV carrying a per-slot array, one little-endian u32 per
/// element
pub fn push_tlv_u32_array(frame: &mut Vec<u8>, id: u8, values: &[u32; INTEL_NUM_SLOTS]) {
    frame.push(id);
    frame.push((values.len() * 4) as u8);
    for value in values {
        frame.extend_from_slice(&value.to_le_bytes());
    }
}

/// Encode a telemetry record as a complete vendor event payload
///
/// The payload starts with the telemetry sub-opcode and carries the event
/// type first, then every field of the record's link side in table order,
/// the same order Intel controllers emit. Decoding the result reproduces
/// the record exactly.
pub fn encode_telemetry_frame(record: &TelemetryRecord) -> Vec<u8> {
    let mut frame = vec![TELEMETRY_SUB_OPCODE];

    frame.push(EXT_EVENT_TYPE);
    frame.push(1);
    frame.push(record.event_type);

    match &record.link {
        LinkStats::Unknown => {}
        LinkStats::Acl(acl) => encode_acl_stats(&mut frame, acl),
        LinkStats::Sco(sco) => encode_sco_stats(&mut frame, sco),
    }

    frame
}

fn encode_acl_stats(frame: &mut Vec<u8>, acl: &AclLinkStats) {
    push_tlv_u16(frame, ACL_CONNECTION_HANDLE, acl.conn_handle);
    push_tlv_u32(frame, ACL_RX_HEC_ERRORS, acl.rx_hec_errors);
    push_tlv_u32(frame, ACL_RX_CRC_ERRORS, acl.rx_crc_errors);
    push_tlv_u32(frame, ACL_PACKETS_FROM_HOST, acl.packets_from_host);
    push_tlv_u32(frame, ACL_TX_PACKETS, acl.tx_packets);
    for (i, &count) in acl.tx_packets_retry.iter().enumerate() {
        push_tlv_u32(frame, ACL_TX_PACKETS_RETRY_BASE + i as u8, count);
    }
    for (i, &count) in acl.tx_packets_by_type.iter().enumerate() {
        push_tlv_u32(frame, ACL_TX_PACKETS_BY_TYPE_BASE + i as u8, count);
    }
    push_tlv_u32(frame, ACL_RX_PACKETS, acl.rx_packets);
    push_tlv_u32(frame, ACL_LINK_THROUGHPUT, acl.link_throughput);
    push_tlv_u32(frame, ACL_MAX_PACKET_LATENCY, acl.max_packet_latency);
    push_tlv_u32(frame, ACL_AVG_PACKET_LATENCY, acl.avg_packet_latency);
}

fn encode_sco_stats(frame: &mut Vec<u8>, sco: &ScoLinkStats) {
    push_tlv_u16(frame, SCO_CONNECTION_HANDLE, sco.conn_handle);
    push_tlv_u32(frame, SCO_PACKETS_FROM_HOST, sco.packets_from_host);
    push_tlv_u32(frame, SCO_TX_PACKETS, sco.tx_packets);
    push_tlv_u32(frame, SCO_RX_PAYLOAD_LOST, sco.rx_payload_lost);
    push_tlv_u32(frame, SCO_TX_PAYLOAD_LOST, sco.tx_payload_lost);
    push_tlv_u32_array(frame, SCO_RX_NO_SYNC_ERRORS, &sco.rx_no_sync_errors);
    push_tlv_u32_array(frame, SCO_RX_HEC_ERRORS, &sco.rx_hec_errors);
    push_tlv_u32_array(frame, SCO_RX_CRC_ERRORS, &sco.rx_crc_errors);
    push_tlv_u32_array(frame, SCO_RX_NAK_ERRORS, &sco.rx_nak_errors);
    push_tlv_u32_array(frame, SCO_TX_FAILED_WIFI_COEX, &sco.tx_failed_wifi_coex);
    push_tlv_u32_array(frame, SCO_RX_FAILED_WIFI_COEX, &sco.rx_failed_wifi_coex);
    push_tlv_u32(frame, SCO_SAMPLES_INSERTED_BY_CDC, sco.samples_inserted_by_cdc);
    push_tlv_u32(frame, SCO_SAMPLES_DROPPED, sco.samples_dropped);
    push_tlv_u32(frame, SCO_MUTE_SAMPLES, sco.mute_samples);
    push_tlv_u32(frame, SCO_PLC_INJECTIONS, sco.plc_injections);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::table;

    #[test]
    fn test_frame_starts_with_sub_opcode_and_event_type() {
        let record = TelemetryRecord {
            event_type: LINK_QUALITY_REPORT,
            link: LinkStats::Unknown,
        };
        let frame = encode_telemetry_frame(&record);
        assert_eq!(frame, vec![0x03, 0x01, 0x01, 0x05]);
    }

    #[test]
    fn test_every_emitted_tlv_matches_the_table() {
        let record = TelemetryRecord {
            event_type: LINK_QUALITY_REPORT,
            link: LinkStats::Sco(ScoLinkStats {
                conn_handle: 1,
                ..Default::default()
            }),
        };
        let frame = encode_telemetry_frame(&record);

        let mut pos = 1;
        while pos < frame.len() {
            let subevent = table::lookup(frame[pos]).expect("emitted tag must be in the table");
            assert_eq!(frame[pos + 1], subevent.value_len());
            pos += 2 + frame[pos + 1] as usize;
        }
        assert_eq!(pos, frame.len());
    }

    #[test]
    fn test_values_are_little_endian() {
        let mut frame = Vec::new();
        push_tlv_u16(&mut frame, ACL_CONNECTION_HANDLE, 0x1234);
        assert_eq!(frame, vec![0x4a, 0x02, 0x34, 0x12]);

        let mut frame = Vec::new();
        push_tlv_u32(&mut frame, ACL_TX_PACKETS, 0x0102_0304);
        assert_eq!(frame, vec![0x4e, 0x04, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_array_tlv_layout() {
        let mut frame = Vec::new();
        push_tlv_u32_array(&mut frame, SCO_RX_NAK_ERRORS, &[1, 2, 3, 4, 5]);

        assert_eq!(frame[0], SCO_RX_NAK_ERRORS);
        assert_eq!(frame[1], 20);
        assert_eq!(frame.len(), 22);
        assert_eq!(&frame[2..6], &1u32.to_le_bytes());
        assert_eq!(&frame[18..22], &5u32.to_le_bytes());
    }
}
