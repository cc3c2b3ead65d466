//! Source tree walking and chunked file reading.
//!
//! The walk is deterministic: pre-order, lexicographic among siblings, so a
//! re-run over an unchanged tree always yields the same entry list (and
//! therefore the same batch plan, which the resume mode depends on).

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::types::{EncDirError, Entry, EntryKind};

/// Walk the source root and collect entries in archive order.
///
/// The root itself is not an entry. Empty regular files are skipped with a
/// warning; they are never recorded and decrypt never recreates them.
/// Symlinks and other non-regular files are skipped as well.
pub fn walk_source(root: &Path) -> Result<Vec<Entry>, EncDirError> {
    let mut entries = Vec::new();

    for item in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let item = item?;
        let relative_path = relative_posix(root, item.path())?;

        let file_type = item.file_type();
        if file_type.is_dir() {
            entries.push(Entry {
                relative_path,
                kind: EntryKind::Directory,
                size: 0,
            });
        } else if file_type.is_file() {
            let size = item.metadata()?.len();
            if size == 0 {
                warn!("empty file detected, ignoring: {relative_path}");
                continue;
            }
            entries.push(Entry {
                relative_path,
                kind: EntryKind::File,
                size,
            });
        } else {
            warn!("skipping non-regular file: {relative_path}");
        }
    }

    Ok(entries)
}

/// Slash-separated path of `path` relative to `root`, no leading slash.
fn relative_posix(root: &Path, path: &Path) -> Result<String, EncDirError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(s) => parts.push(s),
            None => return Err(EncDirError::NonUnicodePath(path.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}

/// Pull-style iterator over a file body in fixed-size plaintext chunks.
///
/// Every chunk except the last is exactly `chunk_size` bytes; the caller
/// drives the iteration, so one chunk buffer is the peak working set.
pub struct FileChunks {
    reader: BufReader<File>,
    chunk_size: usize,
    index: usize,
    finished: bool,
}

impl FileChunks {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, EncDirError> {
        if chunk_size == 0 {
            return Err(EncDirError::Config("chunk size must be positive"));
        }
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
            chunk_size,
            index: 0,
            finished: false,
        })
    }

    fn fill_chunk(&mut self, buf: &mut Vec<u8>) -> Result<usize, EncDirError> {
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl Iterator for FileChunks {
    type Item = Result<(usize, Vec<u8>), EncDirError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        let filled = match self.fill_chunk(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        if filled == 0 {
            self.finished = true;
            return None;
        }
        if filled < self.chunk_size {
            self.finished = true;
        }
        buf.truncate(filled);

        let index = self.index;
        self.index += 1;
        Some(Ok((index, buf)))
    }
}
