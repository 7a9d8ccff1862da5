//! PCAPNG blocks
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! Only the blocks needed to describe a single-section capture are handled:
//! [`SectionHeaderBlock`], [`InterfaceDescriptionBlock`] and
//! [`EnhancedPacketBlock`]. They are built by the [`PcapNGWriter`](crate::PcapNGWriter),
//! serialized with [`ToVec`](crate::ToVec), and can be read back with
//! [`parse_block_le`] (all blocks are written as little-endian).
//!
//! ## Block layout
//!
//! ```text
//!  0               1               2               3
//! +---------------+---------------+---------------+---------------+
//! |                          Block Type                           |
//! +---------------+---------------+---------------+---------------+
//! |                      Block Total Length                       |
//! +---------------+---------------+---------------+---------------+
//! /                 Block Body (padded to 32 bits)                /
//! +---------------+---------------+---------------+---------------+
//! |                      Block Total Length                       |
//! +---------------+---------------+---------------+---------------+
//! ```

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::error::{ErrorKind, ParseError};
use nom::multi::many0;
use nom::number::complete::le_u32;
use nom::{Err, IResult};

use crate::error::ConvertError;

mod enhanced_packet;
mod interface_description;
mod option;
mod section_header;

pub use enhanced_packet::*;
pub use interface_description::*;
pub use option::*;
pub use section_header::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

trait PcapNGBlockParser<'a, O: 'a> {
    /// Minimum block size, in bytes
    const HDR_SZ: usize;
    /// Little-endian magic number for this block type
    const MAGIC: u32;

    // caller function must have tested header type(magic) and length
    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], O, E>;
}

/// Create a block parser function for block type `P`
fn ng_block_parser<'a, P, O, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], O, E>
where
    P: PcapNGBlockParser<'a, O>,
    O: 'a,
    E: ParseError<&'a [u8]>,
{
    move |i: &'a [u8]| {
        let (i, block_type) = le_u32(i)?;
        let (i, block_len1) = le_u32(i)?;
        if block_len1 < P::HDR_SZ as u32 || block_len1 % 4 != 0 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        if block_type != P::MAGIC {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        // 12 is block_type (4) + block_len1 (4) + block_len2 (4)
        let (i, block_content) = take(block_len1 - 12)(i)?;
        let (i, block_len2) = le_u32(i)?;
        if block_len2 != block_len1 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        let (_, b) = P::inner_parse(block_type, block_len1, block_content, block_len2)?;
        // return the remaining bytes from the container, not content
        Ok((i, b))
    }
}

/// A block from a PcapNG file
#[derive(Debug)]
pub enum Block<'a> {
    SectionHeader(SectionHeaderBlock<'a>),
    InterfaceDescription(InterfaceDescriptionBlock<'a>),
    EnhancedPacket(EnhancedPacketBlock<'a>),
}

impl<'a> Block<'a> {
    /// Returns true if blocks contains a network packet
    pub fn is_data_block(&self) -> bool {
        matches!(self, &Block::EnhancedPacket(_))
    }

    /// Return the magic number of the block
    pub fn magic(&self) -> u32 {
        match self {
            Block::SectionHeader(_) => SHB_MAGIC,
            Block::InterfaceDescription(_) => IDB_MAGIC,
            Block::EnhancedPacket(_) => EPB_MAGIC,
        }
    }

    /// Return the total length, as declared in the block header
    pub fn block_len(&self) -> u32 {
        match self {
            Block::SectionHeader(b) => b.block_len1,
            Block::InterfaceDescription(b) => b.block_len1,
            Block::EnhancedPacket(b) => b.block_len1,
        }
    }
}

/// Parse any block written by this crate (little-endian)
pub fn parse_block_le(i: &[u8]) -> IResult<&[u8], Block, ConvertError> {
    match le_u32::<_, ConvertError>(i) {
        Ok((_, id)) => match id {
            SHB_MAGIC => map(parse_sectionheaderblock_le, Block::SectionHeader)(i),
            IDB_MAGIC => map(
                parse_interfacedescriptionblock_le,
                Block::InterfaceDescription,
            )(i),
            EPB_MAGIC => map(parse_enhancedpacketblock_le, Block::EnhancedPacket)(i),
            _ => Err(Err::Error(ConvertError::UnexpectedBlock(id))),
        },
        Err(e) => Err(e),
    }
}

/// Parse a complete capture into its list of blocks
///
/// Fails if trailing data does not form a complete block.
pub fn parse_blocks_le(i: &[u8]) -> Result<Vec<Block>, ConvertError> {
    match many0(parse_block_le)(i) {
        Ok((rem, blocks)) if rem.is_empty() => Ok(blocks),
        Ok((rem, _)) => match parse_block_le(rem) {
            Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(e),
            _ => Err(ConvertError::NomError(ErrorKind::Eof)),
        },
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(e),
        Err(Err::Incomplete(_)) => Err(ConvertError::NomError(ErrorKind::Complete)),
    }
}
