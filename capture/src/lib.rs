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

//! A writer for classic pcap (packet capture) files.
//!
//! The tunnel hands every packet it observes to a [`CaptureWriter`], which
//! appends it to a file that tcpdump, Wireshark and friends can open.
//!
//! # Features
//!
//! * **Thread safe:** one writer can be shared by every thread that sees
//!   packets; each record is written under a lock and never interleaves with
//!   another.
//! * **Configurable layout:** byte order, link type, timestamp precision and
//!   snapshot length are chosen once per file through [`CaptureConfig`].
//! * **Fail fast:** short writes and I/O errors are returned to the caller
//!   as [`CaptureError`] values, never retried or hidden.
//! * **Deterministic timestamps:** the wall clock sits behind the [`Clock`]
//!   trait so tests can pin it.
//!
//! ```ignore
//! let writer = CaptureWriter::create("/tmp/tun.pcap", CaptureConfig::raw_ip())?;
//! writer.capture(&[&ip_header, &payload])?;
//! writer.close()?;
//! ```

/// Sources of record timestamps.
pub mod clock;
/// Per-file settings.
pub mod config;
/// Error type of the writer.
pub mod error;
/// Binary layout of pcap headers.
pub mod pcap;
/// The thread-safe capture writer.
pub mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
pub use pcap::{ByteOrder, LinkType, TimestampPrecision};
pub use writer::{CaptureStats, CaptureWriter};
