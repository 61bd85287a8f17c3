//! # Intel Subevent Dispatch Table
//!
//! Static mapping from a telemetry TLV tag to the size, element count and
//! destination field of its value. The table drives the decoder: a tag not
//! listed here makes the whole decode fail, and a TLV whose declared length
//! disagrees with `size * elements` is rejected before anything is written.

use super::protocol::*;

/// Destination field of a decoded subevent value
///
/// Selects where in the scratch record a value lands, replacing the raw
/// struct-offset arithmetic a packed-struct layout would need. Array
/// destinations carry the element index when the wire spreads one logical
/// array over consecutive single-element tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Telemetry event type of the whole report
    EventType,

    // ACL link quality fields.
    AclConnHandle,
    AclRxHecErrors,
    AclRxCrcErrors,
    AclPacketsFromHost,
    AclTxPackets,
    AclTxPacketsRetry(usize),
    AclTxPacketsByType(usize),
    AclRxPackets,
    AclLinkThroughput,
    AclMaxPacketLatency,
    AclAvgPacketLatency,

    // SCO/eSCO link quality fields.
    ScoConnHandle,
    ScoPacketsFromHost,
    ScoTxPackets,
    ScoRxPayloadLost,
    ScoTxPayloadLost,
    ScoRxNoSyncErrors,
    ScoRxHecErrors,
    ScoRxCrcErrors,
    ScoRxNakErrors,
    ScoTxFailedWifiCoex,
    ScoRxFailedWifiCoex,
    ScoSamplesInsertedByCdc,
    ScoSamplesDropped,
    ScoMuteSamples,
    ScoPlcInjections,
}

/// One entry of the subevent dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subevent {
    /// TLV tag identifying the subevent
    pub id: u8,

    /// Byte width of one element (1, 2 or 4)
    pub size: u8,

    /// Number of elements in the value (1, or 5 for per-slot arrays)
    pub elements: u8,

    /// Destination field of the decoded value
    pub slot: Slot,
}

impl Subevent {
    /// Exact value length the tag must declare
    pub fn value_len(&self) -> u8 {
        self.size * self.elements
    }
}

/// Subevent dispatch table, ordered by tag
///
/// The ACL retry and by-type counters arrive as runs of single-element tags
/// (0x4f..=0x53 and 0x54..=0x5c), one tag per array element; the SCO error
/// counters arrive as single 5-element tags.
pub const SUBEVENT_TABLE: &[Subevent] = &[
    Subevent { id: EXT_EVENT_TYPE, size: 1, elements: 1, slot: Slot::EventType },

    // ACL audio link quality subevents.
    Subevent { id: 0x4a, size: 2, elements: 1, slot: Slot::AclConnHandle },
    Subevent { id: 0x4b, size: 4, elements: 1, slot: Slot::AclRxHecErrors },
    Subevent { id: 0x4c, size: 4, elements: 1, slot: Slot::AclRxCrcErrors },
    Subevent { id: 0x4d, size: 4, elements: 1, slot: Slot::AclPacketsFromHost },
    Subevent { id: 0x4e, size: 4, elements: 1, slot: Slot::AclTxPackets },
    Subevent { id: 0x4f, size: 4, elements: 1, slot: Slot::AclTxPacketsRetry(0) },
    Subevent { id: 0x50, size: 4, elements: 1, slot: Slot::AclTxPacketsRetry(1) },
    Subevent { id: 0x51, size: 4, elements: 1, slot: Slot::AclTxPacketsRetry(2) },
    Subevent { id: 0x52, size: 4, elements: 1, slot: Slot::AclTxPacketsRetry(3) },
    Subevent { id: 0x53, size: 4, elements: 1, slot: Slot::AclTxPacketsRetry(4) },
    Subevent { id: 0x54, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(0) },
    Subevent { id: 0x55, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(1) },
    Subevent { id: 0x56, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(2) },
    Subevent { id: 0x57, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(3) },
    Subevent { id: 0x58, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(4) },
    Subevent { id: 0x59, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(5) },
    Subevent { id: 0x5a, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(6) },
    Subevent { id: 0x5b, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(7) },
    Subevent { id: 0x5c, size: 4, elements: 1, slot: Slot::AclTxPacketsByType(8) },
    Subevent { id: 0x5d, size: 4, elements: 1, slot: Slot::AclRxPackets },
    Subevent { id: 0x5e, size: 4, elements: 1, slot: Slot::AclLinkThroughput },
    Subevent { id: 0x5f, size: 4, elements: 1, slot: Slot::AclMaxPacketLatency },
    Subevent { id: 0x60, size: 4, elements: 1, slot: Slot::AclAvgPacketLatency },

    // SCO/eSCO audio link quality subevents.
    Subevent { id: 0x6a, size: 2, elements: 1, slot: Slot::ScoConnHandle },
    Subevent { id: 0x6b, size: 4, elements: 1, slot: Slot::ScoPacketsFromHost },
    Subevent { id: 0x6c, size: 4, elements: 1, slot: Slot::ScoTxPackets },
    Subevent { id: 0x6d, size: 4, elements: 1, slot: Slot::ScoRxPayloadLost },
    Subevent { id: 0x6e, size: 4, elements: 1, slot: Slot::ScoTxPayloadLost },
    Subevent { id: 0x6f, size: 4, elements: 5, slot: Slot::ScoRxNoSyncErrors },
    Subevent { id: 0x70, size: 4, elements: 5, slot: Slot::ScoRxHecErrors },
    Subevent { id: 0x71, size: 4, elements: 5, slot: Slot::ScoRxCrcErrors },
    Subevent { id: 0x72, size: 4, elements: 5, slot: Slot::ScoRxNakErrors },
    Subevent { id: 0x73, size: 4, elements: 5, slot: Slot::ScoTxFailedWifiCoex },
    Subevent { id: 0x74, size: 4, elements: 5, slot: Slot::ScoRxFailedWifiCoex },
    Subevent { id: 0x75, size: 4, elements: 1, slot: Slot::ScoSamplesInsertedByCdc },
    Subevent { id: 0x76, size: 4, elements: 1, slot: Slot::ScoSamplesDropped },
    Subevent { id: 0x77, size: 4, elements: 1, slot: Slot::ScoMuteSamples },
    Subevent { id: 0x78, size: 4, elements: 1, slot: Slot::ScoPlcInjections },
];

/// Look up the table entry for a TLV tag
///
/// Linear scan, first match wins. `None` means the tag is unknown and the
/// stream cannot be decoded.
pub fn lookup(id: u8) -> Option<&'static Subevent> {
    SUBEVENT_TABLE.iter().find(|subevent| subevent.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_tags() {
        let subevent = lookup(EXT_EVENT_TYPE).unwrap();
        assert_eq!(subevent.size, 1);
        assert_eq!(subevent.elements, 1);
        assert_eq!(subevent.slot, Slot::EventType);

        let subevent = lookup(ACL_CONNECTION_HANDLE).unwrap();
        assert_eq!(subevent.size, 2);
        assert_eq!(subevent.elements, 1);
        assert_eq!(subevent.slot, Slot::AclConnHandle);

        let subevent = lookup(SCO_RX_NO_SYNC_ERRORS).unwrap();
        assert_eq!(subevent.size, 4);
        assert_eq!(subevent.elements, 5);
        assert_eq!(subevent.value_len(), 20);
    }

    #[test]
    fn test_lookup_unknown_tags() {
        assert!(lookup(0x00).is_none());
        assert!(lookup(0x02).is_none());
        assert!(lookup(0x49).is_none());
        assert!(lookup(0x61).is_none());
        assert!(lookup(0x69).is_none());
        assert!(lookup(0x79).is_none());
        assert!(lookup(0xff).is_none());
    }

    #[test]
    fn test_no_duplicate_tags() {
        for (i, a) in SUBEVENT_TABLE.iter().enumerate() {
            for b in &SUBEVENT_TABLE[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate tag 0x{:02x}", a.id);
            }
        }
    }

    #[test]
    fn test_value_lengths_fit_length_byte() {
        // Every declared value must be expressible by the u8 length field.
        for subevent in SUBEVENT_TABLE {
            assert!(subevent.size as usize * subevent.elements as usize <= u8::MAX as usize);
            assert!(matches!(subevent.size, 1 | 2 | 4));
            assert!(matches!(subevent.elements, 1 | 5));
        }
    }

    #[test]
    fn test_retry_and_by_type_runs_are_complete() {
        for i in 0..INTEL_NUM_RETRIES {
            let subevent = lookup(ACL_TX_PACKETS_RETRY_BASE + i as u8).unwrap();
            assert_eq!(subevent.slot, Slot::AclTxPacketsRetry(i));
        }
        for i in 0..INTEL_NUM_PACKET_TYPES {
            let subevent = lookup(ACL_TX_PACKETS_BY_TYPE_BASE + i as u8).unwrap();
            assert_eq!(subevent.slot, Slot::AclTxPacketsByType(i));
        }
    }

    #[test]
    fn test_sco_array_tags_are_five_element() {
        for id in [
            SCO_RX_NO_SYNC_ERRORS,
            SCO_RX_HEC_ERRORS,
            SCO_RX_CRC_ERRORS,
            SCO_RX_NAK_ERRORS,
            SCO_TX_FAILED_WIFI_COEX,
            SCO_RX_FAILED_WIFI_COEX,
        ] {
            let subevent = lookup(id).unwrap();
            assert_eq!(subevent.size, 4);
            assert_eq!(subevent.elements as usize, INTEL_NUM_SLOTS);
        }
    }

    #[test]
    fn test_handle_tags_are_u16() {
        for id in [ACL_CONNECTION_HANDLE, SCO_CONNECTION_HANDLE] {
            let subevent = lookup(id).unwrap();
            assert_eq!(subevent.size, 2);
            assert_eq!(subevent.elements, 1);
        }
    }
}
