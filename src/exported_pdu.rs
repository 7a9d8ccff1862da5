//! Exported PDU framing, for the `WIRESHARK_UPPER_PDU` (252) link type
//!
//! The packet starts with a list of tag/length/value items telling the
//! analyzer how to decode the payload, terminated by an end-of-options tag.
//! Contrary to pcapng options, tags and lengths are big-endian and values are
//! not padded.

use cookie_factory::bytes::be_u16;
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use nom::bytes::complete::{tag, take};
use nom::multi::many_till;
use nom::number::complete::be_u16 as parse_be_u16;
use nom::IResult;
use std::io::Write;

/* values from epan/exported_pdu.h */

pub const EXP_PDU_TAG_END_OF_OPT: u16 = 0;
pub const EXP_PDU_TAG_PROTO_NAME: u16 = 12;
pub const EXP_PDU_TAG_DISSECTOR_TABLE_NAME: u16 = 14;

/// Name of the dissector decoding syslog messages
pub const SYSLOG_DISSECTOR: &str = "syslog";

#[derive(Debug)]
pub struct ExportedTlv<'a> {
    pub t: u16,
    pub l: u16,
    pub v: &'a [u8],
}

impl<'a> ExportedTlv<'a> {
    pub fn new(t: u16, v: &'a [u8]) -> ExportedTlv<'a> {
        ExportedTlv {
            t,
            l: v.len() as u16,
            v,
        }
    }
}

fn exported_tlv_be<'a, 'b: 'a, W: Write + 'a>(i: &'b ExportedTlv) -> impl SerializeFn<W> + 'a {
    tuple((be_u16(i.t), be_u16(i.l), slice(i.v)))
}

/// Serialize TLVs, the end-of-options tag and the payload
pub fn exported_pdu_to_vec(tlvs: &[ExportedTlv], payload: &[u8]) -> Result<Vec<u8>, GenError> {
    let tlv_len: usize = tlvs.iter().map(|t| 4 + t.v.len()).sum();
    let mut v = Vec::with_capacity(tlv_len + 4 + payload.len());
    gen(
        tuple((
            many_ref(tlvs, exported_tlv_be),
            be_u16(EXP_PDU_TAG_END_OF_OPT),
            be_u16(0),
            slice(payload),
        )),
        &mut v,
    )
    .map(|res| res.0.to_vec())
}

/// Frame `payload` for decoding by the dissector named `dissector`
pub fn exported_pdu(dissector: &str, payload: &[u8]) -> Result<Vec<u8>, GenError> {
    let tlvs = [ExportedTlv::new(EXP_PDU_TAG_PROTO_NAME, dissector.as_bytes())];
    exported_pdu_to_vec(&tlvs, payload)
}

pub fn parse_exported_tlv(i: &[u8]) -> IResult<&[u8], ExportedTlv> {
    let (i, t) = parse_be_u16(i)?;
    let (i, l) = parse_be_u16(i)?;
    let (i, v) = take(l)(i)?;
    Ok((i, ExportedTlv { t, l, v }))
}

/// Parse TLVs up to the end-of-options tag, returning them and the payload
pub fn parse_many_exported_tlv(i: &[u8]) -> IResult<&[u8], Vec<ExportedTlv>> {
    many_till(parse_exported_tlv, tag(b"\x00\x00\x00\x00"))(i).map(|(rem, (v, _))| (rem, v))
}

/// Return the dissector name and payload of an exported PDU
pub fn get_exported_pdu_payload(i: &[u8]) -> Option<(&str, &[u8])> {
    let (payload, tlvs) = parse_many_exported_tlv(i).ok()?;
    let name = tlvs
        .iter()
        .find(|tlv| tlv.t == EXP_PDU_TAG_PROTO_NAME)
        .map(|tlv| tlv.v)?;
    let name = std::str::from_utf8(name).ok()?;
    Some((name, payload))
}
