//! Splitting of raw simulator output lines
//!
//! The simulator prefixes every line written by a simulated device with the
//! device number and the simulated time:
//!
//! ```text
//! d_01: @00:00:01.000000  [00:00:00.998,000] <inf> bt_hci_core: HCI transport ready
//! ```
//!
//! Everything else (output of the scripts driving the simulation, for
//! example) has no prefix and is kept verbatim.

use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::char;
use nom::combinator::{map_res, rest, verify};
use nom::sequence::{delimited, tuple};
use nom::IResult;

/// One line of simulator output
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogLine {
    /// Simulated time, in microseconds
    pub timestamp: Option<u64>,
    pub device: Option<u8>,
    /// Line content after the prefix (or the full line if there was none)
    pub text: String,
}

impl LogLine {
    /// Line without simulator prefix
    pub fn untagged<S: Into<String>>(text: S) -> LogLine {
        LogLine {
            timestamp: None,
            device: None,
            text: text.into(),
        }
    }

    #[inline]
    pub fn is_tagged(&self) -> bool {
        self.device.is_some()
    }
}

/// Remove line terminator and NUL characters from a line read from the log
pub fn normalize_line(raw: &str) -> String {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.replace('\0', "")
}

fn digits<'a>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

fn number<'a, T: std::str::FromStr>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, T> {
    map_res(digits(n), str::parse::<T>)
}

/// Parse a `HH:MM:SS.ssssss` clock value, returning microseconds
pub fn parse_clock_us(i: &str) -> IResult<&str, u64> {
    let (i, (hours, _, minutes, _, seconds, _, micros)) = tuple((
        number::<u64>(2),
        char(':'),
        verify(number::<u64>(2), |m: &u64| *m < 60),
        char(':'),
        verify(number::<u64>(2), |s: &u64| *s < 60),
        char('.'),
        number::<u64>(6),
    ))(i)?;
    let us = ((hours * 60 + minutes) * 60 + seconds) * 1_000_000 + micros;
    Ok((i, us))
}

fn bsim_prefix(i: &str) -> IResult<&str, (u8, u64)> {
    let (i, device) = delimited(tag("d_"), number::<u8>(2), tag(": @"))(i)?;
    let (i, timestamp) = parse_clock_us(i)?;
    let (i, _) = tag("  ")(i)?;
    Ok((i, (device, timestamp)))
}

/// Split a line into simulated time, device number and residual text
///
/// Lines not starting with the `d_XX: @HH:MM:SS.ssssss  ` prefix are returned
/// untouched, with neither timestamp nor device.
pub fn parse_bsim_line(line: &str) -> LogLine {
    match tuple((bsim_prefix, rest))(line) {
        Ok((_, ((device, timestamp), text))) => LogLine {
            timestamp: Some(timestamp),
            device: Some(device),
            text: text.to_owned(),
        },
        Err(_) => {
            log::debug!("untagged line: {:?}", line);
            LogLine::untagged(line)
        }
    }
}
