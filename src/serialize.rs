use crate::pcapng::*;
use cookie_factory::bytes::{le_i64, le_u16, le_u32};
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use rusticata_macros::align32;
use std::io::Write;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation (little-endian).
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation (little-endian). Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

impl<'a> ToVec for PcapNGOption<'a> {
    fn fix(&mut self) {
        self.len = self.value.len() as u16;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::new();
        gen(pcapngoption_le(self), &mut v).map(|res| res.0.to_vec())
    }
}

// The value is written up to `len`, then padded, whatever its stored padding.
fn pcapngoption_le<'a, 'b: 'a, W: Write + 'a>(i: &'b PcapNGOption) -> impl SerializeFn<W> + 'a {
    let value = i.as_bytes().unwrap_or_else(|| i.value());
    tuple((
        le_u16(i.code.0),
        le_u16(i.len),
        slice(value),
        padding_for(value.len() as u32),
    ))
}

fn options_length(options: &[PcapNGOption]) -> usize {
    options
        .iter()
        .map(|o| align32!(4 + o.as_bytes().map_or(o.value.len(), <[u8]>::len)))
        .sum()
}

fn fix_options(options: &mut Vec<PcapNGOption>) {
    options.retain(|e| e.code != OptionCode::EndOfOpt);
    if options.is_empty() {
        // No EndOfOpt is required if there are no options.
    } else {
        options.push(PcapNGOption::end_of_options())
    }
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    /// Check and correct all fields: use magic, version and fix lengths fields
    ///
    /// The section length is left untouched: it is never patched once the
    /// capture is written.
    fn fix(&mut self) {
        self.block_type = SHB_MAGIC;
        self.bom = BOM_MAGIC;
        self.major_version = 1;
        self.minor_version = 0;
        fix_options(&mut self.options);
        // fix length
        let length = (28 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(28);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.bom),
                le_u16(self.major_version),
                le_u16(self.minor_version),
                le_i64(self.section_len),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    /// Check and correct all fields: use magic and fix lengths fields
    fn fix(&mut self) {
        self.block_type = IDB_MAGIC;
        self.reserved = 0;
        fix_options(&mut self.options);
        // fix length
        let length = (20 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    /// Serialize to bytes representation. Do not check values
    ///
    /// Fails if the link type does not fit in the 16-bit field.
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let linktype = self
            .linktype
            .as_u16()
            .ok_or(GenError::CustomError(self.linktype.0 as u32))?;
        let mut v = Vec::with_capacity(64);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u16(linktype),
                le_u16(self.reserved),
                le_u32(self.snaplen),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    /// Check and correct all fields: use magic, set captured lengths and fix lengths fields
    fn fix(&mut self) {
        self.block_type = EPB_MAGIC;
        self.caplen = self.data.len() as u32;
        if self.origlen < self.caplen {
            self.origlen = self.caplen;
        }
        fix_options(&mut self.options);
        // fix length
        let length = (32 + self.data.len() + options_length(&self.options)) as u32;
        self.block_len1 = align32!(length);
        self.block_len2 = self.block_len1;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.data.len() + 36);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.if_id),
                le_u32(self.ts_high),
                le_u32(self.ts_low),
                le_u32(self.caplen),
                le_u32(self.origlen),
                slice(self.data),
                padding_for(self.data.len() as u32),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for Block<'a> {
    fn fix(&mut self) {
        match self {
            Block::SectionHeader(b) => b.fix(),
            Block::InterfaceDescription(b) => b.fix(),
            Block::EnhancedPacket(b) => b.fix(),
        }
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        match self {
            Block::SectionHeader(b) => b.to_vec_raw(),
            Block::InterfaceDescription(b) => b.to_vec_raw(),
            Block::EnhancedPacket(b) => b.to_vec_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pcapng::*;
    use cookie_factory::GenError;
    use crate::serialize::ToVec;
    use crate::Linktype;
    use hex_literal::hex;

    #[test]
    fn test_serialize_shb() {
        let v = SectionHeaderBlock::new().to_vec().expect("serialize");
        assert_eq!(
            v,
            hex!(
                "
0a 0d 0d 0a 1c 00 00 00 4d 3c 2b 1a 01 00 00 00
ff ff ff ff ff ff ff ff 1c 00 00 00"
            )
        );
        let (rem, shb) = parse_sectionheaderblock_le(&v).expect("parse");
        assert!(rem.is_empty());
        assert!(!shb.big_endian());
        assert_eq!(shb.section_len, -1);
    }

    #[test]
    fn test_serialize_idb() {
        let v = InterfaceDescriptionBlock::new(Linktype::WIRESHARK_UPPER_PDU, "log_1")
            .to_vec()
            .expect("serialize");
        assert_eq!(
            v,
            hex!(
                "
01 00 00 00 24 00 00 00 fc 00 00 00 ff ff ff ff
02 00 05 00 6c 6f 67 5f 31 00 00 00 00 00 00 00
24 00 00 00"
            )
        );
        let (rem, idb) = parse_interfacedescriptionblock_le(&v).expect("parse");
        assert!(rem.is_empty());
        assert_eq!(idb.linktype, Linktype::WIRESHARK_UPPER_PDU);
        assert_eq!(idb.snaplen, SNAPLEN_UNLIMITED);
        assert_eq!(idb.if_name(), Some("log_1"));
        assert_eq!(idb.options.len(), 2);
    }

    #[test]
    fn test_serialize_idb_aligned_name() {
        // name length multiple of 4: no padding
        let v = InterfaceDescriptionBlock::new(Linktype::ETHERNET, "eth0")
            .to_vec()
            .expect("serialize");
        assert_eq!(v.len(), 20 + 8 + 4);
        assert_eq!(&v[16..24], b"\x02\x00\x04\x00eth0");
    }

    #[test]
    fn test_serialize_idb_linktype_range() {
        let v = InterfaceDescriptionBlock::new(Linktype(0xffff), "x")
            .to_vec()
            .expect("serialize");
        assert_eq!(&v[8..10], b"\xff\xff");
        let r = InterfaceDescriptionBlock::new(Linktype(0x1_0001), "x").to_vec();
        assert!(matches!(r, Err(GenError::CustomError(0x1_0001))));
    }

    #[test]
    fn test_serialize_epb() {
        let data = hex!("00 00 00 01 01 03 0c 00 ff");
        let mut epb = EnhancedPacketBlock::new(3, 0x1_0000_0002, &data);
        let v = epb.to_vec().expect("serialize");
        assert_eq!(
            v,
            hex!(
                "
06 00 00 00 2c 00 00 00 03 00 00 00 01 00 00 00
02 00 00 00 09 00 00 00 09 00 00 00 00 00 00 01
01 03 0c 00 ff 00 00 00 2c 00 00 00"
            )
        );
        let (rem, parsed) = parse_enhancedpacketblock_le(&v).expect("parse");
        assert!(rem.is_empty());
        assert_eq!(parsed.if_id, 3);
        assert_eq!(parsed.timestamp(), 0x1_0000_0002);
        assert_eq!(parsed.packet_data(), &data[..]);
        assert!(!parsed.truncated());
        assert_eq!(parsed.block_len1, parsed.block_len2);
    }

    #[test]
    fn test_serialize_empty_epb() {
        let v = EnhancedPacketBlock::new(0, 0, &[]).to_vec().expect("serialize");
        assert_eq!(v.len(), 32);
        let (_, parsed) = parse_enhancedpacketblock_le(&v).expect("parse");
        assert!(parsed.packet_data().is_empty());
    }

    #[test]
    fn test_padding() {
        for len in 0..9 {
            let data = vec![0xaa; len];
            let v = EnhancedPacketBlock::new(0, 0, &data)
                .to_vec()
                .expect("serialize");
            assert_eq!(v.len() % 4, 0);
            let block_len = u32::from_le_bytes([v[4], v[5], v[6], v[7]]);
            assert_eq!(block_len as usize, v.len());
            assert_eq!(&v[v.len() - 4..], &v[4..8]);
            // explicit captured length holds the unpadded size
            assert_eq!(u32::from_le_bytes([v[20], v[21], v[22], v[23]]) as usize, len);
        }
    }

    #[test]
    fn test_fix_removes_inner_end_of_options() {
        let mut idb = InterfaceDescriptionBlock::new(Linktype::RAW, "x");
        idb.options.insert(0, PcapNGOption::end_of_options());
        let v = idb.to_vec().expect("serialize");
        let (_, parsed) = parse_interfacedescriptionblock_le(&v).expect("parse");
        assert_eq!(parsed.options.len(), 2);
        assert_eq!(parsed.options[0].code, OptionCode::IfName);
        assert_eq!(parsed.options[1].code, OptionCode::EndOfOpt);
    }

    #[test]
    fn test_block_roundtrip() {
        let data = b"<6>hello";
        let mut blocks = vec![
            Block::SectionHeader(SectionHeaderBlock::new()),
            Block::InterfaceDescription(InterfaceDescriptionBlock::new(Linktype::RAW, "a")),
            Block::EnhancedPacket(EnhancedPacketBlock::new(0, 42, data)),
        ];
        let mut bytes = Vec::new();
        for b in blocks.iter_mut() {
            bytes.extend(b.to_vec().expect("serialize"));
        }
        let parsed = parse_blocks_le(&bytes).expect("parse");
        let lengths: Vec<_> = parsed.iter().map(Block::block_len).collect();
        assert_eq!(lengths, vec![28, 32, 40]);
        assert_eq!(lengths.iter().sum::<u32>() as usize, bytes.len());
        let magics: Vec<_> = parsed.iter().map(Block::magic).collect();
        assert_eq!(magics, vec![SHB_MAGIC, IDB_MAGIC, EPB_MAGIC]);
        assert!(parsed[2].is_data_block());
    }
}
