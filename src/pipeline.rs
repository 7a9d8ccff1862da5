use std::io::{BufRead, Write};

use crate::classify::{classify, Payload};
use crate::config::{ConverterConfig, InputMode};
use crate::demux::{DeviceDemux, LineDemux, LogRecord, SequentialDemux};
use crate::error::ConvertError;
use crate::exported_pdu::exported_pdu;
use crate::line::normalize_line;
use crate::writer::PcapNGWriter;
use crate::Linktype;

/// Counters describing a finished conversion
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConversionSummary {
    pub lines: usize,
    /// Records produced by the demultiplexer
    pub records: usize,
    pub packets: usize,
    /// Records dropped because their frame could not be decoded
    pub dropped: usize,
    /// Unterminated messages discarded at end of input
    pub discarded: usize,
    pub interfaces: usize,
}

/// Log to PCAPNG converter
///
/// The input is read once, line by line, and blocks are written as soon as
/// a record is complete.
///
/// ## Example
///
/// ```rust
/// use bsim_pcapng::{Converter, ConverterConfig, InputMode};
///
/// # fn main() -> Result<(), bsim_pcapng::ConvertError> {
/// let log = "d_01: @00:00:01.000000  [ts] <err> hello\n";
/// let converter = Converter::new(ConverterConfig::with_mode(InputMode::Bsim));
/// let mut capture = Vec::new();
/// let summary = converter.convert(log.as_bytes(), &mut capture)?;
/// assert_eq!(summary.packets, 1);
/// assert_eq!(summary.interfaces, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Converter {
        Converter { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn demux(&self) -> Box<dyn LineDemux> {
        match self.config.mode {
            InputMode::Plain => Box::new(SequentialDemux::new()),
            InputMode::Bsim => Box::new(DeviceDemux::new()),
        }
    }

    /// Convert the whole input, writing a capture to `output`
    ///
    /// Records with an invalid frame dump are dropped and counted. Any other
    /// error stops the conversion. An invalid configuration is rejected before
    /// anything is written.
    pub fn convert<R: BufRead, W: Write>(
        &self,
        mut input: R,
        output: W,
    ) -> Result<ConversionSummary, ConvertError> {
        self.config.validate()?;
        let mut writer = PcapNGWriter::new(output)?;
        let mut demux = self.demux();
        let mut summary = ConversionSummary::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            summary.lines += 1;
            let line = normalize_line(&String::from_utf8_lossy(&buf));
            if let Some(record) = demux.push_line(&line) {
                summary.records += 1;
                match self.emit(&record, &mut writer) {
                    Ok(()) => (),
                    Err(e) if e.is_record_error() => {
                        log::warn!("line {}: record dropped: {}", summary.lines, e);
                        summary.dropped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        summary.discarded = demux.finish();
        summary.packets = writer.num_packets();
        summary.interfaces = writer.interfaces().len();
        writer.into_inner()?;
        log::info!("{:?}", summary);
        Ok(summary)
    }

    /// Classify a record, and write it on the interface of its device
    pub fn emit<W: Write>(
        &self,
        record: &LogRecord,
        writer: &mut PcapNGWriter<W>,
    ) -> Result<(), ConvertError> {
        match classify(record, &self.config.frame_marker)? {
            Payload::Text { text, severity } => {
                let pdu = exported_pdu(&self.config.dissector, &Payload::syslog_pdu(&text, severity))?;
                writer.output_on_interface(
                    &self.config.log_interface(record.device),
                    Linktype::WIRESHARK_UPPER_PDU,
                    record.timestamp,
                    &pdu,
                )
            }
            Payload::Frame { data } => writer.output_on_interface(
                &self.config.frame_interface(record.device),
                self.config.frame_linktype,
                record.timestamp,
                &data,
            ),
        }
    }
}
