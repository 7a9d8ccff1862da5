use crate::error::ConvertError;
use crate::exported_pdu::SYSLOG_DISSECTOR;
use crate::Linktype;

/// Layout of the input log
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputMode {
    /// Log of a single device, without simulator prefix
    Plain,
    /// Simulator output, lines prefixed with `d_XX: @HH:MM:SS.ssssss  `
    Bsim,
}

/// Conversion parameters
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub mode: InputMode,
    /// Text announcing a frame hex dump in a log message
    pub frame_marker: String,
    /// Link type of the decoded frames
    pub frame_linktype: Linktype,
    /// Interface name prefix for log messages
    pub log_prefix: String,
    /// Interface name prefix for frames
    pub frame_prefix: String,
    /// Dissector named in the exported PDU header of log messages
    pub dissector: String,
    /// Device name used for lines not written by a device
    pub untagged_label: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            mode: InputMode::Plain,
            frame_marker: "!HCI!".to_owned(),
            frame_linktype: Linktype::BLUETOOTH_HCI_H4_WITH_PHDR,
            log_prefix: "log_".to_owned(),
            frame_prefix: "frame_".to_owned(),
            dissector: SYSLOG_DISSECTOR.to_owned(),
            untagged_label: "None".to_owned(),
        }
    }
}

impl ConverterConfig {
    /// Default configuration for the given input layout
    pub fn with_mode(mode: InputMode) -> ConverterConfig {
        ConverterConfig {
            mode,
            ..ConverterConfig::default()
        }
    }

    /// Reject settings that would produce a misleading capture
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.frame_marker.is_empty() {
            return Err(ConvertError::EmptyFrameMarker);
        }
        if self.frame_linktype.as_u16().is_none() {
            return Err(ConvertError::LinktypeOutOfRange(self.frame_linktype.0));
        }
        Ok(())
    }

    /// Name of a device, as used in interface names
    pub fn device_label(&self, device: Option<u8>) -> String {
        match device {
            Some(d) => d.to_string(),
            None => self.untagged_label.clone(),
        }
    }

    pub fn log_interface(&self, device: Option<u8>) -> String {
        format!("{}{}", self.log_prefix, self.device_label(device))
    }

    pub fn frame_interface(&self, device: Option<u8>) -> String {
        format!("{}{}", self.frame_prefix, self.device_label(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConverterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_interface(Some(7)), "log_7");
        assert_eq!(config.log_interface(None), "log_None");
        assert_eq!(config.frame_interface(Some(12)), "frame_12");
    }

    #[test]
    fn test_empty_frame_marker() {
        let config = ConverterConfig {
            frame_marker: String::new(),
            ..ConverterConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConvertError::EmptyFrameMarker)));
    }

    #[test]
    fn test_linktype_out_of_range() {
        for lt in &[65_536, 65_537, -1] {
            let config = ConverterConfig {
                frame_linktype: Linktype(*lt),
                ..ConverterConfig::default()
            };
            match config.validate() {
                Err(ConvertError::LinktypeOutOfRange(v)) => assert_eq!(v, *lt),
                r => panic!("unexpected result {:?}", r),
            }
        }
        let config = ConverterConfig {
            frame_linktype: Linktype(65_535),
            ..ConverterConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
