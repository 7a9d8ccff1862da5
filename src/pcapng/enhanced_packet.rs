use nom::bytes::complete::take;
use nom::error::{ErrorKind, ParseError};
use nom::number::complete::le_u32;
use nom::{Err, IResult};
use rusticata_macros::align32;

use crate::error::ConvertError;

use super::*;

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// When parsed, the `data` field is stored with the padding. Use
/// [`packet_data`](EnhancedPacketBlock::packet_data) to get the captured
/// bytes only.
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    /// Raw data from packet
    pub data: &'a [u8],
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Packet captured on interface `if_id` at `timestamp_us` (microseconds)
    ///
    /// Packets are never truncated: captured and original lengths are equal.
    pub fn new(if_id: u32, timestamp_us: u64, data: &'a [u8]) -> EnhancedPacketBlock<'a> {
        EnhancedPacketBlock {
            block_type: EPB_MAGIC,
            block_len1: 0,
            if_id,
            ts_high: (timestamp_us >> 32) as u32,
            ts_low: timestamp_us as u32,
            caplen: data.len() as u32,
            origlen: data.len() as u32,
            data,
            options: Vec::new(),
            block_len2: 0,
        }
    }

    /// Return the timestamp, in units of the interface resolution
    /// (microseconds for interfaces created by this crate)
    #[inline]
    pub fn timestamp(&self) -> u64 {
        (u64::from(self.ts_high) << 32) | u64::from(self.ts_low)
    }

    pub fn truncated(&self) -> bool {
        self.origlen != self.caplen
    }

    /// Return the captured data, without padding
    pub fn packet_data(&self) -> &[u8] {
        let caplen = self.caplen as usize;
        if caplen < self.data.len() {
            &self.data[..caplen]
        } else {
            self.data
        }
    }
}

impl<'a> PcapNGBlockParser<'a, EnhancedPacketBlock<'a>> for EnhancedPacketBlock<'a> {
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = EPB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], EnhancedPacketBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, if_id) = le_u32(i)?;
        let (i, ts_high) = le_u32(i)?;
        let (i, ts_low) = le_u32(i)?;
        let (i, caplen) = le_u32(i)?;
        let (i, origlen) = le_u32(i)?;
        // read packet data
        // align32 can overflow
        if caplen >= u32::MAX - 4 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        let padded_length = align32!(caplen);
        let (i, data) = take(padded_length)(i)?;
        // read options
        let current_offset = (32 + padded_length) as usize;
        let (i, options) = opt_parse_options::<E>(i, block_len1 as usize, current_offset)?;
        let block = EnhancedPacketBlock {
            block_type,
            block_len1,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data,
            options,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Enhanced Packet Block (little-endian)
pub fn parse_enhancedpacketblock_le(
    i: &[u8],
) -> IResult<&[u8], EnhancedPacketBlock, ConvertError> {
    ng_block_parser::<EnhancedPacketBlock, _, _>()(i)
}
