//! The delimiter-framed record stream inside one batch.
//!
//! Grammar of a batch's plaintext stream (before compression):
//!
//! ```text
//! batch       := record+
//! record      := dir_record | file_record
//! dir_record  := METADATA_CT '$'
//! file_record := METADATA_CT '?' CHUNK_CT ( '?' CHUNK_CT )* '$'
//! ```
//!
//! `METADATA_CT` and `CHUNK_CT` are base64 AES-CBC ciphertexts, so the two
//! delimiter bytes never appear inside them. Metadata decrypts to the
//! compact JSON object `{"p":<path>,"t":0|1}`; chunks decrypt to raw file
//! bytes. All records of one batch share the batch's IV.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::types::{EncDirError, EntryKind};

/// Terminates a record.
pub const RECORD_END: u8 = b'$';
/// Separates metadata from the body, and body chunks from each other.
pub const BODY_SEP: u8 = b'?';

/// The per-record metadata object on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RecordMeta {
    #[serde(rename = "p")]
    pub path: String,
    #[serde(rename = "t")]
    pub kind: EntryKind,
}

/// Emits framed records for one batch into the batch's artifact stream.
///
/// Tracks written metadata and filedata byte counts for the summary log.
pub struct RecordWriter<'a, W: Write> {
    writer: &'a mut W,
    key: &'a [u8; 32],
    iv: [u8; 16],
    metadata_bytes: u64,
    filedata_bytes: u64,
}

impl<'a, W: Write> RecordWriter<'a, W> {
    pub fn new(writer: &'a mut W, key: &'a [u8; 32], iv: [u8; 16]) -> Self {
        Self {
            writer,
            key,
            iv,
            metadata_bytes: 0,
            filedata_bytes: 0,
        }
    }

    /// Emit a directory record: metadata followed by `$`.
    pub fn directory(&mut self, path: &str) -> Result<(), EncDirError> {
        self.write_metadata(path, EntryKind::Directory)?;
        self.delimiter(RECORD_END)
    }

    /// Emit a file record, draining the chunk iterator: metadata, `?`, then
    /// the encrypted chunks separated by `?`, closed with `$`.
    pub fn file<I>(&mut self, path: &str, chunks: I) -> Result<(), EncDirError>
    where
        I: IntoIterator<Item = Result<(usize, Vec<u8>), EncDirError>>,
    {
        self.write_metadata(path, EntryKind::File)?;
        self.delimiter(BODY_SEP)?;

        for chunk in chunks {
            let (index, data) = chunk?;
            if index > 0 {
                self.delimiter(BODY_SEP)?;
            }
            let ciphertext = crypto::encrypt_block(&data, self.key, &self.iv)?;
            self.writer.write_all(&ciphertext)?;
            self.filedata_bytes += ciphertext.len() as u64;
        }

        self.delimiter(RECORD_END)
    }

    /// `(metadata_bytes, filedata_bytes)` written so far.
    pub fn written(&self) -> (u64, u64) {
        (self.metadata_bytes, self.filedata_bytes)
    }

    fn write_metadata(&mut self, path: &str, kind: EntryKind) -> Result<(), EncDirError> {
        let meta = serde_json::to_vec(&RecordMeta {
            path: path.to_owned(),
            kind,
        })?;
        let ciphertext = crypto::encrypt_block(&meta, self.key, &self.iv)?;
        self.writer.write_all(&ciphertext)?;
        self.metadata_bytes += ciphertext.len() as u64;
        Ok(())
    }

    fn delimiter(&mut self, byte: u8) -> Result<(), EncDirError> {
        self.writer.write_all(&[byte])?;
        self.metadata_bytes += 1;
        Ok(())
    }
}

/// Whether the sink wants a file's body chunks.
///
/// `Skip` suppresses body decryption entirely; the decoder still consumes
/// the framing.
pub enum Body {
    Consume,
    Skip,
}

/// Receiver for decoded entries. Decrypt extracts to disk; validate compares
/// against an already-extracted tree.
pub trait EntrySink {
    fn directory(&mut self, path: &str) -> Result<(), EncDirError>;
    fn file_begin(&mut self, path: &str) -> Result<Body, EncDirError>;
    fn file_chunk(&mut self, data: &[u8]) -> Result<(), EncDirError>;
    fn file_end(&mut self) -> Result<(), EncDirError>;
}

/// Streaming decoder for one artifact's framed record stream.
///
/// Reads one byte at a time, accumulating ciphertext into the sector buffer
/// until a delimiter flips the state. A `?` before any metadata begins a
/// file; a `$` closes the current record. At artifact EOF the state must be
/// fully reset or the artifact is malformed.
pub struct BatchDecoder<'a, S: EntrySink> {
    key: &'a [u8; 32],
    iv: [u8; 16],
    sink: &'a mut S,
    sector: Vec<u8>,
    in_file: bool,
    skip_body: bool,
}

impl<'a, S: EntrySink> BatchDecoder<'a, S> {
    pub fn new(key: &'a [u8; 32], iv: [u8; 16], sink: &'a mut S) -> Self {
        Self {
            key,
            iv,
            sink,
            sector: Vec::new(),
            in_file: false,
            skip_body: false,
        }
    }

    /// Consume one artifact's decompressed byte stream to the end.
    pub fn decode<R: Read>(mut self, reader: R) -> Result<(), EncDirError> {
        for byte in reader.bytes() {
            match byte? {
                RECORD_END if !self.in_file => {
                    let meta = self.decode_metadata()?;
                    if meta.kind != EntryKind::Directory {
                        return Err(EncDirError::Framing(format!(
                            "expected directory metadata for {}, got a file record",
                            meta.path
                        )));
                    }
                    self.sink.directory(&meta.path)?;
                    self.reset();
                }
                RECORD_END => {
                    self.flush_chunk()?;
                    self.sink.file_end()?;
                    self.reset();
                }
                BODY_SEP if !self.in_file => {
                    let meta = self.decode_metadata()?;
                    if meta.kind != EntryKind::File {
                        return Err(EncDirError::Framing(format!(
                            "expected file metadata for {}, got a directory record",
                            meta.path
                        )));
                    }
                    self.skip_body = matches!(self.sink.file_begin(&meta.path)?, Body::Skip);
                    self.in_file = true;
                    self.sector.clear();
                }
                BODY_SEP => {
                    self.flush_chunk()?;
                    self.sector.clear();
                }
                other => self.sector.push(other),
            }
        }

        if self.in_file || !self.sector.is_empty() {
            return Err(EncDirError::Framing(
                "artifact ended in the middle of a record".into(),
            ));
        }
        Ok(())
    }

    fn decode_metadata(&self) -> Result<RecordMeta, EncDirError> {
        let plaintext = crypto::decrypt_block(&self.sector, self.key, &self.iv)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn flush_chunk(&mut self) -> Result<(), EncDirError> {
        if !self.skip_body {
            let plaintext = crypto::decrypt_block(&self.sector, self.key, &self.iv)?;
            self.sink.file_chunk(&plaintext)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.sector.clear();
        self.in_file = false;
        self.skip_body = false;
    }
}
