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

use std::io;
use thiserror::Error;

/// Errors returned by [`crate::writer::CaptureWriter`].
///
/// Every variant names the destination so that a caller juggling several
/// capture files can tell which one failed.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The destination could not be opened for writing.
    #[error("{destination}: {source}")]
    Open {
        /// Destination identifier, usually a path.
        destination: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Writing the global file header failed. No writer was created.
    #[error("{destination}: writing header: {source}")]
    Header {
        /// Destination identifier, usually a path.
        destination: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Writing a record failed. The file may end in a partial record.
    #[error("{destination}: writing record: {source}")]
    Record {
        /// Destination identifier, usually a path.
        destination: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The packet does not fit the 32-bit length fields. Nothing was written.
    #[error("{destination}: record of {size} bytes exceeds the pcap length field")]
    RecordTooLarge {
        /// Destination identifier, usually a path.
        destination: String,
        /// Total payload size of the rejected packet.
        size: u64,
    },
    /// Releasing the sink failed.
    #[error("{destination}: closing: {source}")]
    Close {
        /// Destination identifier, usually a path.
        destination: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl CaptureError {
    /// Kind of the underlying I/O error, if the failure came from the sink.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            CaptureError::Open { source, .. }
            | CaptureError::Header { source, .. }
            | CaptureError::Record { source, .. }
            | CaptureError::Close { source, .. } => Some(source.kind()),
            CaptureError::RecordTooLarge { .. } => None,
        }
    }
}

/// Result type of capture operations.
pub type Result<A> = std::result::Result<A, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_destination_and_operation() {
        let err = CaptureError::Header {
            destination: "/tmp/tun.pcap".to_string(),
            source: io::Error::new(io::ErrorKind::WriteZero, "short write 3 of 24"),
        };
        assert_eq!(err.to_string(), "/tmp/tun.pcap: writing header: short write 3 of 24");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::WriteZero));
    }

    #[test]
    fn test_record_too_large_has_no_io_kind() {
        let err = CaptureError::RecordTooLarge { destination: "sink".to_string(), size: 1 << 33 };
        assert_eq!(err.io_kind(), None);
        assert!(err.to_string().starts_with("sink: record of 8589934592 bytes"));
    }
}
