//! SHA-256 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing the content
//! digest that keys the index. Files are read in fixed-size chunks into a
//! single running SHA-256 state, so memory use does not depend on file size.
//! The result is returned as a lowercase hexadecimal string.
//!
//! The file handle is scoped to [`Hasher::full_hash`] and is closed before
//! the digest (or error) is returned.
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("book.epub")).unwrap();
//! assert_eq!(digest.len(), 64);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::HashError;

/// Default read buffer size (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 8 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher with a custom read buffer size.
    ///
    /// A size of zero falls back to [`DEFAULT_BUFFER_SIZE`].
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: if buffer_size == 0 {
                DEFAULT_BUFFER_SIZE
            } else {
                buffer_size
            },
        }
    }

    /// Read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Compute the digest of the entire file content.
    ///
    /// Identical byte content always yields the same digest, regardless of
    /// the path it is read from.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails.
    /// Interrupted reads are retried.
    pub fn full_hash(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Compute the digest of everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than [`ErrorKind::Interrupted`].
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
        let mut state = Sha256::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            // Only the bytes actually read belong to the content.
            state.update(&buffer[..read]);
        }

        Ok(format!("{:x}", state.finalize()))
    }

    /// Compute the digest of an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }
}
