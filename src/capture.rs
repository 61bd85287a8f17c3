//! # Capture Line Parsing
//!
//! Parses quality-report events out of a capture stream, one JSON object
//! per line with the vendor payload as a hex string. Whitespace inside the
//! hex string is tolerated so payloads can be pasted from btmon-style hex
//! dumps.

use serde::Deserialize;

use crate::error::Result;
use crate::report::QualityReport;

/// Wire shape of one capture line
#[derive(Debug, Deserialize)]
struct CaptureLine {
    /// Bluetooth SIG company identifier of the controller
    manufacturer: u16,

    /// Hex-encoded vendor report payload
    report: String,
}

/// Parse one capture line into a quality report event
///
/// # Arguments
///
/// * `line` - One line of the capture stream, e.g.
///   `{"manufacturer": 2, "report": "03 01 01 05"}`
///
/// # Errors
///
/// Returns error if the line is not valid JSON, is missing a field, or
/// carries a payload that is not valid hex.
pub fn parse_capture_line(line: &str) -> Result<QualityReport> {
    let parsed: CaptureLine = serde_json::from_str(line)?;

    let compact: String = parsed
        .report
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let data = hex::decode(compact)?;

    Ok(QualityReport {
        manufacturer: parsed.manufacturer,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BtlqError;

    #[test]
    fn test_parse_compact_hex() {
        let event = parse_capture_line(r#"{"manufacturer": 2, "report": "03010105"}"#).unwrap();
        assert_eq!(event.manufacturer, 0x0002);
        assert_eq!(event.data, vec![0x03, 0x01, 0x01, 0x05]);
    }

    #[test]
    fn test_parse_spaced_hex() {
        let event =
            parse_capture_line(r#"{"manufacturer": 29, "report": "58 01  02\t0b 00"}"#).unwrap();
        assert_eq!(event.manufacturer, 0x001d);
        assert_eq!(event.data, vec![0x58, 0x01, 0x02, 0x0b, 0x00]);
    }

    #[test]
    fn test_parse_empty_payload() {
        let event = parse_capture_line(r#"{"manufacturer": 2, "report": ""}"#).unwrap();
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        let err = parse_capture_line("not json at all").unwrap_err();
        assert!(matches!(err, BtlqError::Json(_)));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let err = parse_capture_line(r#"{"manufacturer": 2}"#).unwrap_err();
        assert!(matches!(err, BtlqError::Json(_)));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let err = parse_capture_line(r#"{"manufacturer": 2, "report": "zz"}"#).unwrap_err();
        assert!(matches!(err, BtlqError::Hex(_)));

        // Odd digit count is also invalid.
        let err = parse_capture_line(r#"{"manufacturer": 2, "report": "030"}"#).unwrap_err();
        assert!(matches!(err, BtlqError::Hex(_)));
    }
}
