//! Core types, constants and the library error enum.

use std::path::PathBuf;

use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plaintext chunk size for reading source file bodies (100 MiB).
///
/// This is a constant of the archive format: every body chunk except the last
/// one of a file carries exactly this many plaintext bytes. Decoders accept
/// whatever chunk sizes an encoder produced.
pub const SOURCE_CHUNK_SIZE: usize = 100 * 1024 * 1024;

/// Default cap on the accounted file bytes per batch (200 MiB).
pub const DEFAULT_MAX_BATCH_SIZE: u64 = 200 * 1024 * 1024;

/// What a walked entry is. Serialized as the integer tag `0`/`1` inside
/// record metadata, so the wire encoding is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File = 0,
    Directory = 1,
}

impl Serialize for EntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(EntryKind::File),
            1 => Ok(EntryKind::Directory),
            other => Err(D::Error::custom(format!("invalid filetype tag {other}"))),
        }
    }
}

/// One walked source entry.
///
/// `relative_path` is slash-separated with no leading or trailing slash; the
/// source root itself never appears as an entry. Directories carry size 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub relative_path: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum EncDirError {
    #[error("invalid configuration: {0}")]
    Config(&'static str),
    #[error("source directory {} doesn't exist", .0.display())]
    SourceMissing(PathBuf),
    #[error("output directory {} is not writable", .0.display())]
    OutputUnwritable(PathBuf),
    #[error("failed to walk source tree")]
    Walk(#[from] walkdir::Error),
    #[error("non-unicode path: {}", .0.display())]
    NonUnicodePath(PathBuf),
    #[error("failed to initialize cipher")]
    CryptoInit,
    #[error("encryption failure: {0}")]
    Encrypt(&'static str),
    #[error("decryption failure: {0}")]
    Decrypt(&'static str),
    #[error("framing violation: {0}")]
    Framing(String),
    #[error("invalid metadata")]
    Metadata(#[from] serde_json::Error),
    #[error("filedata doesn't match for file {0}")]
    DataMismatch(String),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_wire_tags() {
        assert_eq!(serde_json::to_string(&EntryKind::File).unwrap(), "0");
        assert_eq!(serde_json::to_string(&EntryKind::Directory).unwrap(), "1");
    }

    #[test]
    fn entry_kind_rejects_unknown_tag() {
        assert!(serde_json::from_str::<EntryKind>("2").is_err());
        assert_eq!(
            serde_json::from_str::<EntryKind>("1").unwrap(),
            EntryKind::Directory
        );
    }
}
