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

//! A pcap writer that many threads can append to.
//!
//! [`CaptureWriter`] owns one sink. The global header is written when the
//! writer is built; after that every call to [`CaptureWriter::capture`]
//! appends one record under a mutex, so records from concurrent callers
//! never interleave.
//!
//! Failed writes are reported and never repaired. After a
//! [`CaptureError::Record`] the file may end in a partial record and must be
//! treated like a capture cut short by a crash.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use log::{info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::pcap::{PacketHeader, FILE_HEADER_LEN, PACKET_HEADER_LEN};

/// Running totals of a capture file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Number of complete records appended.
    pub records: u64,
    /// Size of the file in bytes, global header included.
    pub bytes: u64,
}

/// The sink and everything that must change together with it.
struct Sink<W> {
    output: W,
    stats: CaptureStats,
}

impl<W: Write> Sink<W> {
    fn append(&mut self, header: &[u8], buffers: &[&[u8]], size: u64) -> io::Result<()> {
        write_exact(&mut self.output, header)?;
        for buf in buffers.iter().filter(|buf| !buf.is_empty()) {
            write_exact(&mut self.output, buf)?;
        }
        self.output.flush()?;
        self.stats.records += 1;
        self.stats.bytes += PACKET_HEADER_LEN as u64 + size;
        Ok(())
    }
}

/// Hands `buf` to the sink in one call.
///
/// A write that accepts fewer bytes than offered is an error of kind
/// `WriteZero`. Only `Interrupted`, which transfers nothing, is retried.
fn write_exact<W: Write>(output: &mut W, buf: &[u8]) -> io::Result<()> {
    loop {
        match output.write(buf) {
            Ok(n) if n == buf.len() => return Ok(()),
            Ok(n) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("short write {} of {}", n, buf.len()),
                ))
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Writes packets to a classic pcap file.
///
/// The writer is `Sync` when the sink is `Send`; share it behind an `Arc`
/// and call [`CaptureWriter::capture`] from as many threads as needed.
pub struct CaptureWriter<W: Write = File> {
    destination: String,
    config: CaptureConfig,
    clock: Box<dyn Clock>,
    sink: Mutex<Sink<W>>,
}

impl CaptureWriter<File> {
    /// Creates (or truncates) the file at `path` and writes the global header.
    pub fn create(path: impl AsRef<Path>, config: CaptureConfig) -> Result<Self> {
        let path = path.as_ref();
        let destination = path.display().to_string();
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map_err(|source| {
                warn!("{destination}: open failed: {source}");
                CaptureError::Open { destination: destination.clone(), source }
            })?;
        Self::from_writer(file, destination, config)
    }
}

impl<W: Write> CaptureWriter<W> {
    /// Takes ownership of an open sink and writes the global header to it.
    ///
    /// `destination` only labels errors and log lines. If the header cannot
    /// be written the sink is flushed and dropped, and the header error is
    /// returned; a failure to flush is not reported.
    pub fn from_writer(
        mut output: W,
        destination: impl Into<String>,
        config: CaptureConfig,
    ) -> Result<Self> {
        let destination = destination.into();
        let header = config.file_header().to_bytes(config.byte_order);
        if let Err(source) = write_exact(&mut output, &header).and_then(|()| output.flush()) {
            warn!("{destination}: writing header failed: {source}");
            let _ = output.flush();
            drop(output);
            return Err(CaptureError::Header { destination, source });
        }
        info!(
            "{destination}: capture started, link type {:?}, {:?} endian, {:?} timestamps",
            config.link_type, config.byte_order, config.precision
        );
        Ok(CaptureWriter {
            destination,
            config,
            clock: Box::new(SystemClock),
            sink: Mutex::new(Sink {
                output,
                stats: CaptureStats { records: 0, bytes: FILE_HEADER_LEN as u64 },
            }),
        })
    }

    /// Replaces the clock used to timestamp records.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Appends one record holding the concatenation of `buffers`.
    ///
    /// The buffers form a single packet; they exist so that callers can pass
    /// a header and a body without copying them together. The timestamp is
    /// taken before the lock, so under contention records may appear out of
    /// timestamp order.
    pub fn capture(&self, buffers: &[&[u8]]) -> Result<()> {
        let size: u64 = buffers.iter().map(|buf| buf.len() as u64).sum();
        let len = u32::try_from(size).map_err(|_| CaptureError::RecordTooLarge {
            destination: self.destination.clone(),
            size,
        })?;
        let header = PacketHeader::new(self.clock.now(), self.config.precision, len)
            .to_bytes(self.config.byte_order);

        // A poisoned lock means a sink panicked mid-record, which leaves the
        // file in the same state as a failed write.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(source) = sink.append(&header, buffers, size) {
            warn!("{}: writing record of {} bytes failed: {}", self.destination, size, source);
            return Err(CaptureError::Record { destination: self.destination.clone(), source });
        }
        trace!("{}: record {} ({} bytes)", self.destination, sink.stats.records, size);
        Ok(())
    }

    /// Appends one record holding `packet`.
    pub fn capture_packet(&self, packet: &[u8]) -> Result<()> {
        self.capture(&[packet])
    }

    /// Flushes and releases the sink.
    pub fn close(self) -> Result<()> {
        let Sink { mut output, stats } =
            self.sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        let flushed = output.flush();
        drop(output);
        flushed.map_err(|source| {
            warn!("{}: closing failed: {}", self.destination, source);
            CaptureError::Close { destination: self.destination.clone(), source }
        })?;
        info!(
            "{}: capture closed, {} records, {} bytes",
            self.destination, stats.records, stats.bytes
        );
        Ok(())
    }

    /// Destination identifier given at construction.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Records and bytes written so far.
    pub fn stats(&self) -> CaptureStats {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner).stats
    }
}
