//! Zephyr log message markers
//!
//! With colors enabled, the Zephyr logger writes every message as
//!
//! ```text
//! [SGR][00:00:01.123,456] SGR<err> module: first line
//! continuation line
//! last line ESC[0m
//! ```
//!
//! The bracketed timestamp and `<prio>` form the *start marker*, the final
//! `ESC[0m` reset is the *end marker*. Only the text in between belongs to the
//! message.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1, take_while1};
use nom::character::complete::char;
use nom::combinator::{all_consuming, eof, opt, recognize};
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

use crate::line::parse_clock_us;

const SGR_RESET: &str = "\x1b[0m";

/// Start of a log message
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StartMarker<'a> {
    /// Raw timestamp, as printed by the logger
    pub timestamp: &'a str,
    pub priority: &'a str,
    /// True if a color sequence precedes the priority
    pub styled: bool,
}

/// Fields of one line of Zephyr log output
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ZlogLine<'a> {
    pub start: Option<StartMarker<'a>>,
    pub message: &'a str,
    /// True if the line is terminated by the color reset sequence
    pub end: bool,
}

impl<'a> ZlogLine<'a> {
    /// Return true if no other line belongs to this message
    ///
    /// A start marker without color cannot be followed by an end marker, so
    /// uncolored messages always fit on one line.
    pub fn is_self_contained(&self) -> bool {
        match self.start {
            Some(start) => self.end || !start.styled,
            None => true,
        }
    }

    #[inline]
    pub fn priority(&self) -> Option<&'a str> {
        self.start.map(|s| s.priority)
    }

    /// Decode the message timestamp, if present and in `HH:MM:SS.mmm,uuu` format
    pub fn timestamp_us(&self) -> Option<u64> {
        self.start.and_then(|s| parse_zlog_time(s.timestamp))
    }
}

fn sgr(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag("\x1b["),
        take_while1(|c: char| c.is_ascii_digit() || c == ';'),
        char('m'),
    )))(i)
}

fn start_marker(i: &str) -> IResult<&str, StartMarker> {
    let (i, timestamp) = delimited(char('['), take_till(|c: char| c == ']'), tag("] "))(i)?;
    let (i, style) = opt(sgr)(i)?;
    let (i, priority) = delimited(char('<'), take_till1(|c: char| c == '>'), tag("> "))(i)?;
    let marker = StartMarker {
        timestamp,
        priority,
        styled: style.is_some(),
    };
    Ok((i, marker))
}

fn zlog_body(i: &str) -> IResult<&str, ZlogLine> {
    let (i, start) = opt(start_marker)(i)?;
    let (i, message) = take_till(|c: char| c == '\x1b')(i)?;
    let (i, end) = opt(tag(SGR_RESET))(i)?;
    let (i, _) = eof(i)?;
    let line = ZlogLine {
        start,
        message,
        end: end.is_some(),
    };
    Ok((i, line))
}

// A line holding only the reset sequence terminates a message, so the leading
// color sequence is optional only when the line does not parse without it.
fn zlog_line(i: &str) -> IResult<&str, ZlogLine> {
    alt((zlog_body, preceded(sgr, zlog_body)))(i)
}

/// Split a line into Zephyr log fields
///
/// Returns `None` if the line contains escape sequences in unexpected places
/// (inside the message text, for example).
pub fn parse_zlog_line(line: &str) -> Option<ZlogLine> {
    zlog_line(line).ok().map(|(_, l)| l)
}

/// Convert a `HH:MM:SS.mmm,uuu` logger timestamp to microseconds
pub fn parse_zlog_time(timestamp: &str) -> Option<u64> {
    let compact = timestamp.replace(',', "");
    let us = all_consuming(parse_clock_us)(compact.as_str())
        .ok()
        .map(|(_, us)| us);
    us
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_single_line() {
        let l = parse_zlog_line("\x1b[1;31m[00:00:01.123,456] \x1b[0m<err> hci: failed\x1b[0m")
            .expect("zlog line");
        let start = l.start.expect("start marker");
        assert_eq!(start.timestamp, "00:00:01.123,456");
        assert_eq!(start.priority, "err");
        assert!(start.styled);
        assert_eq!(l.message, "hci: failed");
        assert!(l.end);
        assert!(l.is_self_contained());
        assert_eq!(l.timestamp_us(), Some(1_123_456));
    }

    #[test]
    fn test_colored_first_line() {
        let l = parse_zlog_line("[00:00:02.000,000] \x1b[0m<inf> main: multi").expect("zlog line");
        assert_eq!(l.priority(), Some("inf"));
        assert!(!l.end);
        assert!(!l.is_self_contained());
    }

    #[test]
    fn test_continuation_lines() {
        let l = parse_zlog_line("  rest of message").expect("zlog line");
        assert_eq!(l.start, None);
        assert_eq!(l.message, "  rest of message");
        assert!(!l.end);

        let l = parse_zlog_line("last line\x1b[0m").expect("zlog line");
        assert_eq!(l.start, None);
        assert_eq!(l.message, "last line");
        assert!(l.end);

        let l = parse_zlog_line("\x1b[0m").expect("zlog line");
        assert_eq!(l.message, "");
        assert!(l.end);
    }

    #[test]
    fn test_uncolored_start() {
        let l = parse_zlog_line("[ts] <err> hello").expect("zlog line");
        assert_eq!(l.priority(), Some("err"));
        assert_eq!(l.message, "hello");
        assert!(!l.end);
        assert!(l.is_self_contained());
        assert_eq!(l.timestamp_us(), None);
    }

    #[test]
    fn test_escape_inside_message() {
        assert!(parse_zlog_line("abc\x1b[1mdef").is_none());
        assert!(parse_zlog_line("abc\x1b[0mdef").is_none());
    }

    #[test]
    fn test_zlog_time() {
        assert_eq!(parse_zlog_time("00:01:00.000,001"), Some(60_000_001));
        assert_eq!(parse_zlog_time("1234"), None);
    }
}
