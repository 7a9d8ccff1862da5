use rusticata_macros::newtype_enum;
use std::convert::TryFrom;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    RAW = 101,

    // Bluetooth HCI UART transport layer, prefixed with a 4-byte direction
    // pseudo-header (0 = controller to host, 1 = host to controller).
    BLUETOOTH_HCI_H4_WITH_PHDR = 201,

    //  Upper-layer protocol saves from Wireshark
    WIRESHARK_UPPER_PDU = 252,
}
}

impl Linktype {
    /// Return the value as stored in an interface description block, or
    /// `None` if it does not fit in 16 bits
    pub fn as_u16(self) -> Option<u16> {
        u16::try_from(self.0).ok()
    }
}
