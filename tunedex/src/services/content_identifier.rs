//! Content identity for catalog records
//!
//! Calculates the SHA-256 of a file's full byte stream. The identity depends only on content:
//! the same bytes at two paths share one identity, and renames or moves keep it stable.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};

/// Read buffer size (1MB chunks bound memory per concurrent worker)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Hex-encoded SHA-256 of a byte stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentIdentity(String);

impl ContentIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streaming content hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentIdentifier;

impl ContentIdentifier {
    pub fn new() -> Self {
        Self
    }

    /// Hash everything `reader` yields, consuming it exactly once
    ///
    /// Returns the identity and the number of bytes hashed. Any read error aborts the hash;
    /// a partial digest is never returned.
    pub fn identify_reader<R: Read>(&self, mut reader: R) -> io::Result<(ContentIdentity, u64)> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok((ContentIdentity(format!("{:x}", hasher.finalize())), total))
    }
}
