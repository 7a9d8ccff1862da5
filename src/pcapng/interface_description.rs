use nom::error::ParseError;
use nom::number::complete::{le_u16, le_u32};
use nom::IResult;

use crate::error::ConvertError;
use crate::Linktype;

use super::*;

/// Snapshot length meaning that packets are never truncated
pub const SNAPLEN_UNLIMITED: u32 = 0xFFFF_FFFF;

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> InterfaceDescriptionBlock<'a> {
    /// Describe an interface with the given link type and `if_name` option
    ///
    /// Timestamps use the default resolution (microseconds), so no
    /// `if_tsresol` option is added.
    pub fn new(linktype: Linktype, name: &str) -> InterfaceDescriptionBlock<'a> {
        InterfaceDescriptionBlock {
            block_type: IDB_MAGIC,
            block_len1: 0,
            linktype,
            reserved: 0,
            snaplen: SNAPLEN_UNLIMITED,
            options: vec![PcapNGOption::new(OptionCode::IfName, name.as_bytes())],
            block_len2: 0,
        }
    }

    /// Return the `if_name` option value, if present and valid UTF-8
    ///
    /// If the option is present multiple times, the first value is returned.
    pub fn if_name(&self) -> Option<&str> {
        options_get_as_str(&self.options, OptionCode::IfName)
    }
}

impl<'a> PcapNGBlockParser<'a, InterfaceDescriptionBlock<'a>> for InterfaceDescriptionBlock<'a> {
    const HDR_SZ: usize = 20;
    const MAGIC: u32 = IDB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], InterfaceDescriptionBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, linktype) = le_u16(i)?;
        let (i, reserved) = le_u16(i)?;
        let (i, snaplen) = le_u32(i)?;
        // read options
        let (i, options) = opt_parse_options::<E>(i, block_len1 as usize, 20)?;
        let block = InterfaceDescriptionBlock {
            block_type,
            block_len1,
            linktype: Linktype(linktype as i32),
            reserved,
            snaplen,
            options,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Interface Description Block (little-endian)
pub fn parse_interfacedescriptionblock_le(
    i: &[u8],
) -> IResult<&[u8], InterfaceDescriptionBlock, ConvertError> {
    ng_block_parser::<InterfaceDescriptionBlock, _, _>()(i)
}
