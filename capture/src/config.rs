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

//! Per-file capture settings.
//!
//! A [`CaptureConfig`] is handed to the writer once, at construction. It
//! decides every constant of the global header and the byte order of the
//! whole file; none of it can change while the file is open.

use crate::pcap::{ByteOrder, FileHeader, LinkType, TimestampPrecision};

/// Declared snapshot length: 128 KiB.
pub const DEFAULT_SNAPLEN: u32 = 128 * 1024;

/// Settings fixed for the lifetime of one capture file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Byte order of every multi-byte field.
    pub byte_order: ByteOrder,
    /// Framing of the captured packets.
    pub link_type: LinkType,
    /// Resolution of record timestamps.
    pub precision: TimestampPrecision,
    /// Snapshot length announced in the header. Records longer than this are
    /// still written in full.
    pub snaplen: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig::raw_ip()
    }
}

impl CaptureConfig {
    /// Big-endian capture of bare IP packets.
    pub fn raw_ip() -> Self {
        CaptureConfig {
            byte_order: ByteOrder::Big,
            link_type: LinkType::Raw,
            precision: TimestampPrecision::Nanosecond,
            snaplen: DEFAULT_SNAPLEN,
        }
    }

    /// Little-endian capture of packets carrying a BSD loopback header.
    pub fn loopback() -> Self {
        CaptureConfig {
            byte_order: ByteOrder::Little,
            link_type: LinkType::Null,
            precision: TimestampPrecision::Nanosecond,
            snaplen: DEFAULT_SNAPLEN,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_link_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn with_precision(mut self, precision: TimestampPrecision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_snaplen(mut self, snaplen: u32) -> Self {
        self.snaplen = snaplen;
        self
    }

    /// Global header described by this configuration.
    pub fn file_header(&self) -> FileHeader {
        FileHeader::new(self.precision, self.snaplen, self.link_type)
    }
}
