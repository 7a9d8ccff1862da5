use cookie_factory::GenError;
use nom::error::{ErrorKind, ParseError};
use std::fmt;
use std::io;

/// Errors raised while converting a log to a capture, or reading one back
#[derive(Debug)]
pub enum ConvertError {
    /// Frame hex dump could not be decoded. Only this record is lost.
    HexDecode {
        device: Option<u8>,
        source: hex::FromHexError,
    },
    /// Severity label missing from the syslog table
    UnknownSeverity(String),
    /// Packet referencing an interface id that was never declared
    UnregisteredInterface(u32),
    /// Link type not representable in the 16-bit interface description field
    LinktypeOutOfRange(i32),
    /// Frame marker is empty, so it would match every record
    EmptyFrameMarker,

    Io(io::Error),
    Serialize(GenError),

    /// Block magic not handled by the capture reader
    UnexpectedBlock(u32),
    NomError(ErrorKind),
}

impl ConvertError {
    /// Return true if the error only affects the current record
    pub fn is_record_error(&self) -> bool {
        matches!(self, ConvertError::HexDecode { .. })
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::HexDecode {
                device: Some(d),
                source,
            } => write!(f, "invalid frame hex dump from device {}: {}", d, source),
            ConvertError::HexDecode {
                device: None,
                source,
            } => write!(f, "invalid frame hex dump: {}", source),
            ConvertError::UnknownSeverity(label) => write!(f, "unknown log severity <{}>", label),
            ConvertError::UnregisteredInterface(id) => {
                write!(f, "packet references undeclared interface {}", id)
            }
            ConvertError::LinktypeOutOfRange(lt) => {
                write!(f, "link type {} does not fit in 16 bits", lt)
            }
            ConvertError::EmptyFrameMarker => write!(f, "frame marker must not be empty"),
            ConvertError::Io(e) => write!(f, "I/O error: {}", e),
            ConvertError::Serialize(e) => write!(f, "block serialization failed: {:?}", e),
            ConvertError::UnexpectedBlock(magic) => write!(f, "unexpected block type 0x{:08x}", magic),
            ConvertError::NomError(kind) => write!(f, "block parsing failed: {:?}", kind),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::HexDecode { source, .. } => Some(source),
            ConvertError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(e: io::Error) -> Self {
        ConvertError::Io(e)
    }
}

impl From<GenError> for ConvertError {
    fn from(e: GenError) -> Self {
        match e {
            GenError::IoError(e) => ConvertError::Io(e),
            e => ConvertError::Serialize(e),
        }
    }
}

impl<I> ParseError<I> for ConvertError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        ConvertError::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        ConvertError::NomError(kind)
    }
}
