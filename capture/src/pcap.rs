// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk layout of classic pcap files.
//!
//! The header structs are laid out exactly as they appear in the file and
//! are converted to bytes with `zerocopy`. Byte order is not a property of
//! the structs: [`FileHeader::to_bytes`] and [`PacketHeader::to_bytes`]
//! take the [`ByteOrder`] the file was opened with.

use std::mem::size_of;
use std::time::Duration;
use zerocopy::AsBytes;
use zerocopy_derive::{AsBytes, FromBytes, FromZeroes};

/// Size of the global file header in bytes.
pub const FILE_HEADER_LEN: usize = size_of::<FileHeader>();

/// Size of a per-record header in bytes.
pub const PACKET_HEADER_LEN: usize = size_of::<PacketHeader>();

/// Byte order of every multi-byte field in a capture file.
///
/// Readers tell the two apart from the magic number, but a writer never
/// switches order once the file header has been written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ByteOrder {
    /// Network byte order.
    #[default]
    Big,
    /// Little-endian.
    Little,
}

impl ByteOrder {
    /// Converts a native value to its representation in this byte order.
    ///
    /// The conversion is its own inverse, so it also turns an in-file
    /// representation back into a native value.
    pub fn order_u32(self, value: u32) -> u32 {
        match self {
            ByteOrder::Big => value.to_be(),
            ByteOrder::Little => value.to_le(),
        }
    }

    /// 16-bit counterpart of [`ByteOrder::order_u32`].
    pub fn order_u16(self, value: u16) -> u16 {
        match self {
            ByteOrder::Big => value.to_be(),
            ByteOrder::Little => value.to_le(),
        }
    }
}

/// Resolution of the sub-second timestamp field.
///
/// The resolution is announced to readers through the magic number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPrecision {
    /// `ts_subsec` holds nanoseconds.
    #[default]
    Nanosecond,
    /// `ts_subsec` holds microseconds.
    Microsecond,
}

impl TimestampPrecision {
    /// Magic number announcing this precision.
    pub fn magic(self) -> u32 {
        match self {
            TimestampPrecision::Nanosecond => 0xa1b23c4d,
            TimestampPrecision::Microsecond => 0xa1b2c3d4,
        }
    }

    /// Sub-second remainder of `timestamp` in this precision's unit.
    pub fn subsec(self, timestamp: Duration) -> u32 {
        match self {
            TimestampPrecision::Nanosecond => timestamp.subsec_nanos(),
            TimestampPrecision::Microsecond => timestamp.subsec_micros(),
        }
    }
}

/// Represents the link layer header type of a pcap capture.
///
/// These values specify the framing of every packet in the file. For the
/// complete registry refer to https://www.tcpdump.org/linktypes.html
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkType {
    /// Null link type (BSD loopback), a 4-byte host-order family header.
    Null = 0,
    /// Ethernet
    Ethernet = 1,
    /// Raw IP; each packet begins with an IPv4 or IPv6 header.
    Raw = 101,
    /// Raw IPv4
    Ipv4 = 228,
    /// Raw IPv6
    Ipv6 = 229,
}

impl From<LinkType> for u16 {
    fn from(val: LinkType) -> Self {
        val as u16
    }
}

impl From<LinkType> for u32 {
    fn from(val: LinkType) -> Self {
        val as u32
    }
}

/// Represents the global header of a pcap capture file.
///
/// # File Header format
/// ```text
///                         1                   2                   3
///     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  0 |                          Magic Number                         |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  4 |          Major Version        |         Minor Version         |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  8 |                           Reserved1                           |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// 12 |                           Reserved2                           |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// 16 |                            SnapLen                            |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// 20 | FCS |f|0 0 0 0 0 0 0 0 0 0 0 0|         LinkType              |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The drawing is in big-endian order. The last word is a single 32-bit
/// field: FCS flags in the upper half, link type in the lower half, so a
/// little-endian file stores the link type first.
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic number identifying the format and timestamp precision.
    pub magic: u32,
    /// Major version of the pcap format.
    pub version_major: u16,
    /// Minor version of the pcap format.
    pub version_minor: u16,
    /// Unused, always zero.
    pub reserved1: u32,
    /// Unused, always zero.
    pub reserved2: u32,
    /// Declared maximum number of bytes stored per record.
    pub snaplen: u32,
    /// FCS flags (upper 16 bits) and link type (lower 16 bits).
    pub linktype: u32,
}

impl FileHeader {
    const VERSION_MAJOR: u16 = 2u16;
    const VERSION_MINOR: u16 = 4u16;
    const RESERVED_1: u32 = 0;
    const RESERVED_2: u32 = 0;

    /// Builds the header for a file of the given link type. FCS flags are
    /// left at zero.
    pub fn new(precision: TimestampPrecision, snaplen: u32, link_type: LinkType) -> Self {
        FileHeader {
            magic: precision.magic(),
            version_major: FileHeader::VERSION_MAJOR,
            version_minor: FileHeader::VERSION_MINOR,
            reserved1: FileHeader::RESERVED_1,
            reserved2: FileHeader::RESERVED_2,
            snaplen,
            linktype: link_type.into(),
        }
    }

    /// Encodes the header exactly as it is written to the file.
    pub fn to_bytes(&self, order: ByteOrder) -> [u8; FILE_HEADER_LEN] {
        let mut bytes = [0u8; FILE_HEADER_LEN];
        bytes.copy_from_slice(self.reorder(order).as_bytes());
        bytes
    }

    fn reorder(&self, order: ByteOrder) -> Self {
        FileHeader {
            magic: order.order_u32(self.magic),
            version_major: order.order_u16(self.version_major),
            version_minor: order.order_u16(self.version_minor),
            reserved1: order.order_u32(self.reserved1),
            reserved2: order.order_u32(self.reserved2),
            snaplen: order.order_u32(self.snaplen),
            linktype: order.order_u32(self.linktype),
        }
    }
}

/// Represents the header prepended to each packet in a pcap capture file.
///
/// # Fields
/// ```text
///                        1                   2                   3
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  0 |                      Timestamp (Seconds)                      |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  4 |            Timestamp (Microseconds or nanoseconds)            |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  8 |                    Captured Packet Length                     |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// 12 |                    Original Packet Length                     |
///    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// 16 /                                                               /
///    /                          Packet Data                          /
///    /                        variable length                        /
///    /                                                               /
///    +---------------------------------------------------------------+
/// ```
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    /// Timestamp of the captured packet (seconds).
    pub tv_sec: u32,
    /// Timestamp of the captured packet (sub-second part).
    pub tv_subsec: u32,
    /// Number of bytes captured from the packet.
    pub caplen: u32,
    /// Original length of the packet on the network.
    pub len: u32,
}

impl PacketHeader {
    /// Builds the header of an untruncated record of `len` bytes.
    ///
    /// Seconds past `u32::MAX` wrap, as in every classic pcap writer.
    pub fn new(timestamp: Duration, precision: TimestampPrecision, len: u32) -> Self {
        PacketHeader {
            tv_sec: timestamp.as_secs() as u32,
            tv_subsec: precision.subsec(timestamp),
            caplen: len,
            len,
        }
    }

    /// Encodes the header exactly as it is written to the file.
    pub fn to_bytes(&self, order: ByteOrder) -> [u8; PACKET_HEADER_LEN] {
        let ordered = PacketHeader {
            tv_sec: order.order_u32(self.tv_sec),
            tv_subsec: order.order_u32(self.tv_subsec),
            caplen: order.order_u32(self.caplen),
            len: order.order_u32(self.len),
        };
        let mut bytes = [0u8; PACKET_HEADER_LEN];
        bytes.copy_from_slice(ordered.as_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromBytes;

    #[test]
    fn test_header_sizes() {
        assert_eq!(FILE_HEADER_LEN, 24);
        assert_eq!(PACKET_HEADER_LEN, 16);
    }

    #[test]
    fn test_file_header_big_endian() {
        let header = FileHeader::new(TimestampPrecision::Nanosecond, 128 * 1024, LinkType::Raw);
        let expected: [u8; 24] = [
            0xa1, 0xb2, 0x3c, 0x4d, // magic
            0x00, 0x02, 0x00, 0x04, // version 2.4
            0x00, 0x00, 0x00, 0x00, // reserved 1
            0x00, 0x00, 0x00, 0x00, // reserved 2
            0x00, 0x02, 0x00, 0x00, // snaplen
            0x00, 0x00, 0x00, 0x65, // fcs, linktype
        ];
        assert_eq!(header.to_bytes(ByteOrder::Big), expected);
    }

    #[test]
    fn test_file_header_little_endian() {
        let header = FileHeader::new(TimestampPrecision::Nanosecond, 128 * 1024, LinkType::Raw);
        let expected: [u8; 24] = [
            0x4d, 0x3c, 0xb2, 0xa1, // magic
            0x02, 0x00, 0x04, 0x00, // version 2.4
            0x00, 0x00, 0x00, 0x00, // reserved 1
            0x00, 0x00, 0x00, 0x00, // reserved 2
            0x00, 0x00, 0x02, 0x00, // snaplen
            0x65, 0x00, 0x00, 0x00, // linktype, fcs
        ];
        assert_eq!(header.to_bytes(ByteOrder::Little), expected);
    }

    #[test]
    fn test_microsecond_magic() {
        let header = FileHeader::new(TimestampPrecision::Microsecond, 65535, LinkType::Null);
        assert_eq!(&header.to_bytes(ByteOrder::Big)[..4], &[0xa1, 0xb2, 0xc3, 0xd4]);
        assert_eq!(&header.to_bytes(ByteOrder::Little)[..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
    }

    #[test]
    fn test_file_header_decodes_with_zerocopy() {
        let header = FileHeader::new(TimestampPrecision::Nanosecond, 4096, LinkType::Ipv6);
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let bytes = header.to_bytes(order);
            let raw = FileHeader::read_from(&bytes[..]).unwrap();
            assert_eq!(raw.reorder(order), header);
        }
    }

    #[test]
    fn test_packet_header_nanoseconds() {
        let header =
            PacketHeader::new(Duration::new(1, 500), TimestampPrecision::Nanosecond, 0x0102);
        let expected: [u8; 16] = [
            0x00, 0x00, 0x00, 0x01, // seconds
            0x00, 0x00, 0x01, 0xf4, // nanoseconds
            0x00, 0x00, 0x01, 0x02, // captured length
            0x00, 0x00, 0x01, 0x02, // original length
        ];
        assert_eq!(header.to_bytes(ByteOrder::Big), expected);
    }

    #[test]
    fn test_packet_header_microseconds_little_endian() {
        let header =
            PacketHeader::new(Duration::new(5, 1_234_567), TimestampPrecision::Microsecond, 3);
        assert_eq!(header.tv_subsec, 1234);
        let expected: [u8; 16] = [
            0x05, 0x00, 0x00, 0x00, // seconds
            0xd2, 0x04, 0x00, 0x00, // microseconds
            0x03, 0x00, 0x00, 0x00, // captured length
            0x03, 0x00, 0x00, 0x00, // original length
        ];
        assert_eq!(header.to_bytes(ByteOrder::Little), expected);
    }

    #[test]
    fn test_subsec_is_remainder_after_seconds() {
        let timestamp = Duration::new(1_700_000_000, 999_999_999);
        assert_eq!(TimestampPrecision::Nanosecond.subsec(timestamp), 999_999_999);
        assert_eq!(TimestampPrecision::Microsecond.subsec(timestamp), 999_999);
    }

    #[test]
    fn test_link_type_values() {
        assert_eq!(u16::from(LinkType::Null), 0);
        assert_eq!(u16::from(LinkType::Raw), 101);
        assert_eq!(u32::from(LinkType::Ipv4), 228);
    }
}
