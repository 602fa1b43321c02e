//! Content analysis module
//!
//! Provides streaming SHA-256 digests over file contents.

pub mod checksum;

pub use checksum::{checksum_file, checksum_reader, to_hex, Digest, DIGEST_LEN};
