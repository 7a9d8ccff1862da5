//! Classification of log records into syslog text or link-layer frames

use rusticata_macros::newtype_enum;

use crate::demux::LogRecord;
use crate::error::ConvertError;

/// Syslog severity code (RFC 5424)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Severity(pub u8);

newtype_enum! {
impl display Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}
}

impl Severity {
    /// Map a Zephyr log level label to a syslog severity
    ///
    /// Messages without level are informational.
    pub fn from_label(label: Option<&str>) -> Result<Severity, ConvertError> {
        match label {
            None | Some("inf") => Ok(Severity::Informational),
            Some("err") => Ok(Severity::Error),
            Some("wrn") => Ok(Severity::Warning),
            Some("dbg") => Ok(Severity::Debug),
            Some(other) => Err(ConvertError::UnknownSeverity(other.to_owned())),
        }
    }
}

/// Content of a record, ready to be written
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    Text { text: String, severity: Severity },
    Frame { data: Vec<u8> },
}

impl Payload {
    /// Build the syslog message for a text payload: `<severity>text`
    pub fn syslog_pdu(text: &str, severity: Severity) -> Vec<u8> {
        format!("<{}>{}", severity.0, text).into_bytes()
    }
}

/// Keep the hex digits of a dump, cutting each line at the ASCII column
pub fn strip_hexdump(dump: &str) -> String {
    dump.lines()
        .map(|line| line.split('|').next().unwrap_or(""))
        .flat_map(|hex| hex.chars().filter(|c| !c.is_whitespace()))
        .collect()
}

/// Decode a hex dump such as
///
/// ```text
/// 01 03 0c 00                                      |....
/// ```
pub fn decode_hexdump(dump: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hexdump(dump))
}

/// Decide whether a record holds text or a frame
///
/// The severity label is checked for every record, since an unknown label
/// means the log format is not understood.
pub fn classify(record: &LogRecord, frame_marker: &str) -> Result<Payload, ConvertError> {
    let severity = Severity::from_label(record.priority.as_deref())?;
    match record.text.split_once(frame_marker) {
        Some((_, dump)) => {
            let data = decode_hexdump(dump).map_err(|source| ConvertError::HexDecode {
                device: record.device,
                source,
            })?;
            Ok(Payload::Frame { data })
        }
        None => Ok(Payload::Text {
            text: record.text.clone(),
            severity,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn record(priority: Option<&str>, text: &str) -> LogRecord {
        LogRecord {
            timestamp: 0,
            device: Some(1),
            priority: priority.map(str::to_owned),
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(Severity::from_label(None).unwrap(), Severity(6));
        assert_eq!(Severity::from_label(Some("err")).unwrap(), Severity(3));
        assert_eq!(Severity::from_label(Some("wrn")).unwrap(), Severity(4));
        assert_eq!(Severity::from_label(Some("inf")).unwrap(), Severity(6));
        assert_eq!(Severity::from_label(Some("dbg")).unwrap(), Severity(7));
        match Severity::from_label(Some("crit")) {
            Err(ConvertError::UnknownSeverity(l)) => assert_eq!(l, "crit"),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn test_text_record() {
        let p = classify(&record(Some("err"), "hello"), "!HCI!").expect("classify");
        assert_eq!(
            p,
            Payload::Text {
                text: "hello".to_owned(),
                severity: Severity::Error
            }
        );
        assert_eq!(Payload::syslog_pdu("hello", Severity::Error), b"<3>hello");
    }

    #[test]
    fn test_frame_record() {
        let text = "h4: tx !HCI!\n\
                    00 00 00 01 01 03 0c 00  |........\n\
                    ff                       |.";
        let p = classify(&record(Some("dbg"), text), "!HCI!").expect("classify");
        assert_eq!(
            p,
            Payload::Frame {
                data: hex!("00 00 00 01 01 03 0c 00 ff").to_vec()
            }
        );
    }

    #[test]
    fn test_frame_on_marker_line() {
        let p = classify(&record(None, "!HCI! 04 0e 04 01 03 0c 00"), "!HCI!").expect("classify");
        assert_eq!(
            p,
            Payload::Frame {
                data: hex!("04 0e 04 01 03 0c 00").to_vec()
            }
        );
    }

    #[test]
    fn test_invalid_hexdump() {
        for dump in &["!HCI! 0", "!HCI! zz", "!HCI!\n01 0g"] {
            match classify(&record(None, dump), "!HCI!") {
                Err(e @ ConvertError::HexDecode { .. }) => assert!(e.is_record_error()),
                r => panic!("unexpected result {:?}", r),
            }
        }
    }

    #[test]
    fn test_unknown_severity_on_frame() {
        let r = classify(&record(Some("???"), "!HCI! 00"), "!HCI!");
        assert!(matches!(r, Err(ConvertError::UnknownSeverity(_))));
    }
}
