//! Checksum calculation using SHA-256
//!
//! Files are streamed through the hasher in fixed-size chunks, so memory use
//! does not depend on file size. A failure part way through a file is an
//! error; no partial digest is ever returned.

use crate::error::ItemError;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of a SHA-256 digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Raw digest bytes
pub type Digest = [u8; DIGEST_LEN];

/// Read buffer size for streaming
const CHUNK_SIZE: usize = 64 * 1024;

/// Stream everything from `reader` through SHA-256
pub fn checksum_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hasher.finalize().into())
}

/// Open `path` and compute its digest
///
/// The file handle is dropped before returning on every path.
pub fn checksum_file(path: &Path) -> Result<Digest, ItemError> {
    let file = File::open(path).map_err(|source| ItemError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    checksum_reader(file).map_err(|source| ItemError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercase hex encoding of a digest
pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Digest as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    /// Fails after handing out a few bytes
    struct FlakyReader {
        remaining: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(0x5a);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_empty_input() {
        let digest = checksum_reader(io::empty()).unwrap();
        assert_eq!(to_hex(&digest), EMPTY_SHA256);
    }

    #[test]
    fn test_known_vector() {
        let digest = checksum_reader(&b"abc"[..]).unwrap();
        assert_eq!(
            to_hex(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_matches_one_shot_digest_across_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = checksum_reader(&data[..]).unwrap();
        let expected: Digest = Sha256::digest(&data).into();
        assert_eq!(streamed, expected);
    }

    #[test]
    fn test_read_error_is_not_a_digest() {
        let err = checksum_reader(FlakyReader { remaining: 100 }).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_checksum_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();
        file.flush().unwrap();

        let digest = checksum_file(file.path()).unwrap();
        let expected: Digest = Sha256::digest(b"Hello, World!").into();
        assert_eq!(digest, expected);
        assert_eq!(to_hex(&digest).len(), DIGEST_LEN * 2);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.bin");
        let err = checksum_file(&missing).unwrap_err();
        assert!(matches!(err, ItemError::Open { .. }));
        assert_eq!(err.path(), missing.as_path());
    }
}
