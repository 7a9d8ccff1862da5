//! Reassembly of multi-line log messages
//!
//! A [`MessageAssembler`] is fed one line at a time and returns a message
//! once all of its lines have been seen.

use crate::zlog::{parse_zlog_line, ZlogLine};

/// A complete log message
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembledMessage {
    /// Timestamp printed by the logger, in microseconds
    pub timestamp: Option<u64>,
    pub priority: Option<String>,
    pub text: String,
}

impl AssembledMessage {
    fn from_line(line: &ZlogLine) -> AssembledMessage {
        AssembledMessage {
            timestamp: line.timestamp_us(),
            priority: line.priority().map(str::to_owned),
            text: line.message.to_owned(),
        }
    }

    fn raw(text: &str) -> AssembledMessage {
        AssembledMessage {
            timestamp: None,
            priority: None,
            text: text.to_owned(),
        }
    }
}

#[derive(Debug)]
enum AssemblerState {
    Idle,
    /// Start marker seen, end marker not yet
    Accumulating(AssembledMessage),
}

/// Per-device message reassembly state machine
#[derive(Debug)]
pub struct MessageAssembler {
    state: AssemblerState,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        MessageAssembler::new()
    }
}

impl MessageAssembler {
    pub fn new() -> MessageAssembler {
        MessageAssembler {
            state: AssemblerState::Idle,
        }
    }

    /// Return true if a message has been started but not terminated
    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, AssemblerState::Accumulating(_))
    }

    /// Feed one line, and return the message it completes, if any
    ///
    /// Continuation lines only contribute their text: their own priority and
    /// timestamp are ignored.
    pub fn feed(&mut self, line: &str) -> Option<AssembledMessage> {
        let zlog = parse_zlog_line(line);
        if zlog.is_none() {
            log::debug!("line not in zlog format, kept as-is: {:?}", line);
        }
        match std::mem::replace(&mut self.state, AssemblerState::Idle) {
            AssemblerState::Idle => match zlog {
                Some(l) if !l.is_self_contained() => {
                    self.state = AssemblerState::Accumulating(AssembledMessage::from_line(&l));
                    None
                }
                Some(l) => Some(AssembledMessage::from_line(&l)),
                None => Some(AssembledMessage::raw(line)),
            },
            AssemblerState::Accumulating(mut pending) => {
                pending.text.push('\n');
                match zlog {
                    Some(l) => {
                        pending.text.push_str(l.message);
                        if l.end {
                            return Some(pending);
                        }
                    }
                    None => pending.text.push_str(line),
                }
                self.state = AssemblerState::Accumulating(pending);
                None
            }
        }
    }

    /// Drop the state machine at end of input
    ///
    /// An unterminated message is discarded, and returned for reporting.
    pub fn finish(self) -> Option<AssembledMessage> {
        match self.state {
            AssemblerState::Idle => None,
            AssemblerState::Accumulating(pending) => Some(pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_messages() {
        let mut a = MessageAssembler::new();
        let m = a
            .feed("[00:00:01.000,000] \x1b[0m<inf> main: ready\x1b[0m")
            .expect("complete message");
        assert_eq!(m.priority.as_deref(), Some("inf"));
        assert_eq!(m.timestamp, Some(1_000_000));
        assert_eq!(m.text, "main: ready");

        let m = a.feed("plain text").expect("complete message");
        assert_eq!(m.priority, None);
        assert_eq!(m.text, "plain text");
        assert!(!a.is_accumulating());
    }

    #[test]
    fn test_multi_line_message() {
        let mut a = MessageAssembler::new();
        assert_eq!(a.feed("\x1b[1;33m[00:00:02.000,000] \x1b[1;33m<wrn> dump: first"), None);
        assert!(a.is_accumulating());
        assert_eq!(a.feed("second"), None);
        // continuation priority is ignored
        assert_eq!(a.feed("[00:00:03.000,000] \x1b[0m<err> third"), None);
        let m = a.feed("fourth\x1b[0m").expect("complete message");
        assert_eq!(m.priority.as_deref(), Some("wrn"));
        assert_eq!(m.timestamp, Some(2_000_000));
        assert_eq!(m.text, "dump: first\nsecond\nthird\nfourth");
        assert!(!a.is_accumulating());
        assert_eq!(a.finish(), None);
    }

    #[test]
    fn test_malformed_continuation_kept_verbatim() {
        let mut a = MessageAssembler::new();
        assert_eq!(a.feed("[t] \x1b[0m<dbg> start"), None);
        assert_eq!(a.feed("odd \x1b[7m line"), None);
        let m = a.feed("\x1b[0m").expect("complete message");
        assert_eq!(m.text, "start\nodd \x1b[7m line\n");
    }

    #[test]
    fn test_unterminated_message_discarded() {
        let mut a = MessageAssembler::new();
        assert_eq!(a.feed("[t] \x1b[0m<inf> never ends"), None);
        assert_eq!(a.feed("more"), None);
        let partial = a.finish().expect("partial message");
        assert_eq!(partial.text, "never ends\nmore");
    }
}
