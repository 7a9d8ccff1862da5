//! # Simulation log to PCAPNG converter
//!
//! This crate turns the text output of Bluetooth simulations (several
//! simulated devices running Zephyr, writing colored and sometimes multi-line
//! log messages to a shared stream) into a PCAPNG capture. Each device gets
//! its own interfaces:
//!
//! - `log_<device>` carries log messages as syslog packets, wrapped in
//!   exported PDU headers (`WIRESHARK_UPPER_PDU` link type),
//! - `frame_<device>` carries the link-layer frames found as hex dumps in the
//!   log messages.
//!
//! Processing is done in one pass:
//!
//! 1. [`parse_bsim_line`] splits the simulator prefix from each line,
//! 2. a [`DeviceDemux`] feeds each line to the [`MessageAssembler`] of its
//!    device, which joins multi-line messages,
//! 3. [`classify`] decides whether a message is text or a frame,
//! 4. a [`PcapNGWriter`] declares interfaces on first use and writes packets.
//!
//! # Example
//!
//! ```rust
//! use bsim_pcapng::*;
//!
//! # fn main() -> Result<(), ConvertError> {
//! let log = "\
//! d_00: @00:00:01.000000  [00:00:01.000,000] \x1b[0m<inf> main: booted\x1b[0m
//! d_00: @00:00:01.000100  [00:00:01.000,100] \x1b[0m<dbg> h4: tx !HCI!
//! d_00: @00:00:01.000100  00 00 00 01 01 03 0c 00   |........\x1b[0m
//! ";
//! let converter = Converter::new(ConverterConfig::with_mode(InputMode::Bsim));
//! let mut capture = Vec::new();
//! let summary = converter.convert(log.as_bytes(), &mut capture)?;
//! assert_eq!(summary.packets, 2);
//!
//! for block in parse_blocks_le(&capture)? {
//!     if let Block::InterfaceDescription(idb) = block {
//!         println!("interface {:?}: {}", idb.if_name(), idb.linktype);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod assembler;
mod classify;
mod config;
mod demux;
mod error;
mod line;
mod linktype;
mod pipeline;
mod serialize;
mod writer;
mod zlog;

pub use assembler::*;
pub use classify::*;
pub use config::*;
pub use demux::*;
pub use error::*;
pub use line::*;
pub use linktype::*;
pub use pipeline::*;
pub use serialize::*;
pub use writer::*;
pub use zlog::*;

pub mod exported_pdu;
pub mod pcapng;
pub use pcapng::*;
