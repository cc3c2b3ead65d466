//! Numbered artifact files and the gzip stream around them.
//!
//! Artifacts are named by a zero-padded 1-based sequence number so plain
//! filename order is batch order; there is no manifest, index or header.
//! Hidden files (leading `.`) in the artifact directory are invisible to
//! every operation.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::types::EncDirError;

const ARTIFACT_SUFFIX: &str = ".data";
const NUMBER_WIDTH: usize = 32;

/// Filename for the artifact holding batch `seq` (1-based).
pub fn artifact_name(seq: u64) -> String {
    format!("{:0width$}{}", seq, ARTIFACT_SUFFIX, width = NUMBER_WIDTH)
}

/// List artifact filenames in the directory in ascending order.
///
/// Directories and hidden files are skipped; everything else counts, so a
/// foreign file in the artifact directory will surface as a framing error
/// downstream rather than being silently ignored.
pub fn list_artifacts(dir: &Path) -> Result<Vec<String>, EncDirError> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => return Err(EncDirError::NonUnicodePath(dir.join(raw))),
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Number of artifacts already present in the output directory; an encrypt
/// run skips this many batches and IV chain positions.
pub fn resume_shift(dir: &Path) -> Result<usize, EncDirError> {
    Ok(list_artifacts(dir)?.len())
}

/// One batch's output file: a buffered gzip stream over the numbered
/// artifact. Must be [`finish`](ArtifactWriter::finish)ed so the compressor
/// trailer is flushed before the file handle closes.
pub struct ArtifactWriter {
    inner: BufWriter<GzEncoder<File>>,
}

impl ArtifactWriter {
    pub fn create(dir: &Path, seq: u64) -> Result<Self, EncDirError> {
        let path = dir.join(artifact_name(seq));
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        Ok(Self {
            inner: BufWriter::new(encoder),
        })
    }

    pub fn finish(self) -> Result<(), EncDirError> {
        let encoder = self
            .inner
            .into_inner()
            .map_err(|e| EncDirError::Io(e.into_error()))?;
        encoder.finish()?;
        Ok(())
    }
}

impl Write for ArtifactWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Open an artifact for reading as a buffered decompressed byte stream.
pub fn open_artifact(path: &Path) -> Result<BufReader<GzDecoder<BufReader<File>>>, EncDirError> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    Ok(BufReader::with_capacity(64 * 1024, decoder))
}

/// Absolute path of artifact `name` inside `dir`.
pub fn artifact_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}
