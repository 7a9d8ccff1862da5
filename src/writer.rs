use std::collections::HashMap;
use std::io::Write;

use crate::error::ConvertError;
use crate::pcapng::{EnhancedPacketBlock, InterfaceDescriptionBlock, SectionHeaderBlock};
use crate::serialize::ToVec;
use crate::Linktype;

/// Mapping of (interface name, link type) to interface id
///
/// Ids are allocated in first-use order, starting at 0, and never reused.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    ids: HashMap<(String, Linktype), u32>,
    interfaces: Vec<(String, Linktype)>,
}

impl InterfaceRegistry {
    pub fn new() -> InterfaceRegistry {
        InterfaceRegistry::default()
    }

    /// Return the id of the interface, and true if it was just created
    pub fn get_or_create(&mut self, name: &str, linktype: Linktype) -> (u32, bool) {
        if let Some(&id) = self.ids.get(&(name.to_owned(), linktype)) {
            return (id, false);
        }
        let id = self.interfaces.len() as u32;
        self.interfaces.push((name.to_owned(), linktype));
        self.ids.insert((name.to_owned(), linktype), id);
        (id, true)
    }

    pub fn get(&self, id: u32) -> Option<(&str, Linktype)> {
        self.interfaces
            .get(id as usize)
            .map(|(name, linktype)| (name.as_str(), *linktype))
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

/// Streaming PCAPNG writer
///
/// The section header is written on creation. Interface description blocks
/// are written the first time an interface is used, so that every packet
/// follows the description of its interface.
///
/// ## Example
///
/// ```rust
/// use bsim_pcapng::{Linktype, PcapNGWriter};
///
/// # fn main() -> Result<(), bsim_pcapng::ConvertError> {
/// let mut writer = PcapNGWriter::new(Vec::new())?;
/// writer.output_on_interface("frame_0", Linktype::ETHERNET, 1_000_000, &[0xff; 14])?;
/// let capture = writer.into_inner()?;
/// assert_eq!(capture.len(), 28 + 36 + 48);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PcapNGWriter<W: Write> {
    sink: W,
    interfaces: InterfaceRegistry,
    num_packets: usize,
}

impl<W: Write> PcapNGWriter<W> {
    /// Create a writer, and write the section header block
    pub fn new(mut sink: W) -> Result<PcapNGWriter<W>, ConvertError> {
        let shb = SectionHeaderBlock::new().to_vec()?;
        sink.write_all(&shb)?;
        Ok(PcapNGWriter {
            sink,
            interfaces: InterfaceRegistry::new(),
            num_packets: 0,
        })
    }

    /// Return the id of an interface, declaring it if needed
    pub fn interface_id(&mut self, name: &str, linktype: Linktype) -> Result<u32, ConvertError> {
        if linktype.as_u16().is_none() {
            return Err(ConvertError::LinktypeOutOfRange(linktype.0));
        }
        let (id, created) = self.interfaces.get_or_create(name, linktype);
        if created {
            log::info!("new interface {}: {} (linktype {})", id, name, linktype);
            let idb = InterfaceDescriptionBlock::new(linktype, name).to_vec()?;
            self.sink.write_all(&idb)?;
        }
        Ok(id)
    }

    /// Write a packet on an already declared interface
    pub fn write_packet(
        &mut self,
        if_id: u32,
        timestamp_us: u64,
        data: &[u8],
    ) -> Result<(), ConvertError> {
        if self.interfaces.get(if_id).is_none() {
            return Err(ConvertError::UnregisteredInterface(if_id));
        }
        let epb = EnhancedPacketBlock::new(if_id, timestamp_us, data).to_vec()?;
        self.sink.write_all(&epb)?;
        self.num_packets += 1;
        Ok(())
    }

    /// Write a packet on the named interface, declaring it if needed
    pub fn output_on_interface(
        &mut self,
        name: &str,
        linktype: Linktype,
        timestamp_us: u64,
        data: &[u8],
    ) -> Result<(), ConvertError> {
        let if_id = self.interface_id(name, linktype)?;
        self.write_packet(if_id, timestamp_us, data)
    }

    pub fn interfaces(&self) -> &InterfaceRegistry {
        &self.interfaces
    }

    pub fn num_packets(&self) -> usize {
        self.num_packets
    }

    /// Flush and return the underlying sink
    pub fn into_inner(mut self) -> Result<W, ConvertError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcapng::{parse_blocks_le, Block};

    #[test]
    fn test_registry_first_use_order() {
        let mut reg = InterfaceRegistry::new();
        assert_eq!(reg.get_or_create("log_1", Linktype::WIRESHARK_UPPER_PDU), (0, true));
        assert_eq!(reg.get_or_create("frame_1", Linktype::ETHERNET), (1, true));
        assert_eq!(reg.get_or_create("log_1", Linktype::WIRESHARK_UPPER_PDU), (0, false));
        // same name, other link type: other interface
        assert_eq!(reg.get_or_create("log_1", Linktype::RAW), (2, true));
        assert_eq!(reg.get_or_create("frame_1", Linktype::ETHERNET), (1, false));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get(2), Some(("log_1", Linktype::RAW)));
        assert_eq!(reg.get(3), None);
    }

    #[test]
    fn test_undeclared_interface() {
        let mut w = PcapNGWriter::new(Vec::new()).expect("writer");
        match w.write_packet(0, 0, b"x") {
            Err(ConvertError::UnregisteredInterface(0)) => (),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn test_linktype_out_of_range() {
        let mut w = PcapNGWriter::new(Vec::new()).expect("writer");
        match w.output_on_interface("frame_0", Linktype(65_537), 0, b"\x01") {
            Err(ConvertError::LinktypeOutOfRange(65_537)) => (),
            r => panic!("unexpected result {:?}", r),
        }
        // nothing was declared or written
        assert!(w.interfaces().is_empty());
        assert_eq!(w.num_packets(), 0);
        assert_eq!(w.into_inner().expect("flush").len(), 28);
    }

    #[test]
    fn test_descriptions_precede_packets() {
        let mut w = PcapNGWriter::new(Vec::new()).expect("writer");
        w.output_on_interface("a", Linktype::RAW, 1, b"one").expect("write");
        w.output_on_interface("b", Linktype::RAW, 2, b"two").expect("write");
        w.output_on_interface("a", Linktype::RAW, 3, b"three").expect("write");
        assert_eq!(w.num_packets(), 3);
        let bytes = w.into_inner().expect("flush");
        let blocks = parse_blocks_le(&bytes).expect("parse");
        assert_eq!(blocks.len(), 6);
        let mut declared = 0;
        for block in &blocks[1..] {
            match block {
                Block::InterfaceDescription(_) => declared += 1,
                Block::EnhancedPacket(epb) => assert!(epb.if_id < declared),
                Block::SectionHeader(_) => panic!("second section header"),
            }
        }
        assert_eq!(declared, 2);
    }
}
