use std::borrow::Cow;

use nom::bytes::complete::take;
use nom::combinator::{complete, map_parser};
use nom::error::ParseError;
use nom::multi::many0;
use nom::number::complete::le_u16;
use nom::IResult;
use rusticata_macros::{align32, newtype_enum};

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    IfName = 2,
}
}

#[derive(Debug)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    /// Value length, without padding
    pub len: u16,
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNGOption<'a> {
    /// Build an option holding a copy of `value`
    pub fn new(code: OptionCode, value: &[u8]) -> PcapNGOption<'static> {
        PcapNGOption {
            code,
            len: value.len() as u16,
            value: Cow::Owned(value.to_vec()),
        }
    }

    pub fn end_of_options() -> PcapNGOption<'static> {
        PcapNGOption {
            code: OptionCode::EndOfOpt,
            len: 0,
            value: Cow::Borrowed(&[]),
        }
    }

    /// Return a reference to the option value, as raw bytes (not related to the `len` field)
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }

    /// Return a reference to the option value, using the `len` field to limit it, or None if length is invalid
    pub fn as_bytes(&self) -> Option<&[u8]> {
        let len = usize::from(self.len);
        if len <= self.value.len() {
            Some(&self.value[..len])
        } else {
            None
        }
    }

    /// Return the option value as UTF-8 text, or None
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Parse a pcap-ng Option (little-endian)
///
/// The value is returned with its padding.
pub fn parse_option_le<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption, E> {
    let (i, code) = le_u16(i)?;
    let (i, len) = le_u16(i)?;
    let (i, value) = take(align32!(len as u32))(i)?;
    let option = PcapNGOption {
        code: OptionCode(code),
        len,
        value: Cow::Borrowed(value),
    };
    Ok((i, option))
}

pub(crate) fn opt_parse_options<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
    len: usize,
    opt_offset: usize,
) -> IResult<&'i [u8], Vec<PcapNGOption>, E> {
    if len > opt_offset {
        map_parser(take(len - opt_offset), many0(complete(parse_option_le::<E>)))(i)
    } else {
        Ok((i, Vec::new()))
    }
}

/// Return the first option with the given code, as text
pub fn options_get_as_str<'a>(options: &'a [PcapNGOption], code: OptionCode) -> Option<&'a str> {
    options.iter().find(|o| o.code == code).and_then(|o| o.as_str())
}
