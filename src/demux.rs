//! Routing of log lines to per-device message assemblers
//!
//! Two front-ends exist, selected by [`InputMode`](crate::InputMode):
//!
//! - [`DeviceDemux`] for simulator output, where each line is prefixed with
//!   the device that wrote it,
//! - [`SequentialDemux`] for the output of a single device.
//!
//! Both implement [`LineDemux`], and produce [`LogRecord`]s with a timestamp
//! that never falls back to zero once a time has been seen.

use std::collections::HashMap;

use crate::assembler::{AssembledMessage, MessageAssembler};
use crate::line::{parse_bsim_line, LogLine};

/// A complete log message, attributed to a device
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogRecord {
    /// Time in microseconds
    pub timestamp: u64,
    /// Device number, or `None` for lines not written by a device
    pub device: Option<u8>,
    pub priority: Option<String>,
    pub text: String,
}

/// Common interface of line demultiplexers
pub trait LineDemux {
    /// Process one input line, and return the record it completes, if any
    fn push_line(&mut self, line: &str) -> Option<LogRecord>;

    /// Terminate processing, discarding unterminated messages
    ///
    /// Return the number of discarded messages.
    fn finish(&mut self) -> usize;
}

/// Most recent known time, used for lines carrying no timestamp
#[derive(Debug, Default)]
struct Clock {
    last_us: u64,
}

impl Clock {
    fn observe(&mut self, timestamp: Option<u64>) -> u64 {
        if let Some(ts) = timestamp {
            self.last_us = ts;
        }
        self.last_us
    }
}

/// Demultiplexer for interleaved simulator output
///
/// One [`MessageAssembler`] is created per device on first sight, and kept
/// until the demultiplexer is dropped.
#[derive(Debug, Default)]
pub struct DeviceDemux {
    assemblers: HashMap<u8, MessageAssembler>,
    clock: Clock,
}

impl DeviceDemux {
    pub fn new() -> DeviceDemux {
        DeviceDemux::default()
    }

    /// Number of devices seen so far
    pub fn num_devices(&self) -> usize {
        self.assemblers.len()
    }

    /// Process an already split line
    pub fn push(&mut self, line: LogLine) -> Option<LogRecord> {
        let timestamp = self.clock.observe(line.timestamp);
        match line.device {
            Some(device) => {
                let assembler = self.assemblers.entry(device).or_insert_with(|| {
                    log::debug!("new device d_{:02}", device);
                    MessageAssembler::new()
                });
                let msg = assembler.feed(&line.text)?;
                Some(LogRecord {
                    timestamp,
                    device: Some(device),
                    priority: msg.priority,
                    text: msg.text,
                })
            }
            None => Some(LogRecord {
                timestamp,
                device: None,
                priority: None,
                text: line.text,
            }),
        }
    }
}

impl LineDemux for DeviceDemux {
    fn push_line(&mut self, line: &str) -> Option<LogRecord> {
        self.push(parse_bsim_line(line))
    }

    fn finish(&mut self) -> usize {
        let mut devices: Vec<_> = self.assemblers.drain().collect();
        devices.sort_by_key(|(device, _)| *device);
        devices
            .into_iter()
            .filter_map(|(device, assembler)| assembler.finish().map(|msg| (device, msg)))
            .inspect(|(device, msg)| log_discarded(*device, msg))
            .count()
    }
}

/// Demultiplexer for the log of a single device
///
/// Records are attributed to device `0` and timed with the logger timestamp.
#[derive(Debug, Default)]
pub struct SequentialDemux {
    assembler: MessageAssembler,
    clock: Clock,
}

impl SequentialDemux {
    pub fn new() -> SequentialDemux {
        SequentialDemux::default()
    }
}

impl LineDemux for SequentialDemux {
    fn push_line(&mut self, line: &str) -> Option<LogRecord> {
        let msg = self.assembler.feed(line)?;
        Some(LogRecord {
            timestamp: self.clock.observe(msg.timestamp),
            device: Some(0),
            priority: msg.priority,
            text: msg.text,
        })
    }

    fn finish(&mut self) -> usize {
        match std::mem::take(&mut self.assembler).finish() {
            Some(msg) => {
                log_discarded(0, &msg);
                1
            }
            None => 0,
        }
    }
}

fn log_discarded(device: u8, msg: &AssembledMessage) {
    log::warn!(
        "end of input inside a message from device {}, discarding {} bytes",
        device,
        msg.text.len()
    );
}
