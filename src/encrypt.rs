//! The encrypt driver: walk, plan, resume, then write batches in order.

use tracing::info;

use crate::artifact::{resume_shift, ArtifactWriter};
use crate::config::Context;
use crate::frame::RecordWriter;
use crate::kdf::IvChain;
use crate::planner::plan_batches;
use crate::types::{EncDirError, EntryKind, SOURCE_CHUNK_SIZE};
use crate::walk::{walk_source, FileChunks};

/// Counters from a completed encrypt run.
#[derive(Debug, Default)]
pub struct EncryptReport {
    /// Entries collected by the walk (after empty-file elision).
    pub entries: usize,
    /// Artifacts written by this run; 0 when the archive was already
    /// complete.
    pub artifacts: usize,
    /// Ciphertext bytes of metadata and delimiters.
    pub metadata_bytes: u64,
    /// Ciphertext bytes of file bodies.
    pub filedata_bytes: u64,
}

pub(crate) fn run(context: &Context) -> Result<EncryptReport, EncDirError> {
    let entries = walk_source(&context.source)?;
    let total_bytes: u64 = entries.iter().map(|e| e.size).sum();
    info!("processing {} entries, {} bytes", entries.len(), total_bytes);

    let mut report = EncryptReport {
        entries: entries.len(),
        ..Default::default()
    };

    let batches = plan_batches(entries, context.cap);

    // A resumed run continues after the artifacts already present: their
    // batches are skipped and the IV chain is fast-forwarded past them, so
    // one decrypt pass reads old and new artifacts in lockstep.
    let shift = resume_shift(&context.output)?;
    if shift > 0 {
        info!("resuming after {shift} existing artifacts");
    }

    let mut chain = IvChain::new(context.iv0);
    chain.skip(shift)?;

    for (index, batch) in batches.iter().enumerate().skip(shift) {
        let iv = chain.advance()?;

        let mut artifact = ArtifactWriter::create(&context.output, (index + 1) as u64)?;
        let mut records = RecordWriter::new(&mut artifact, &context.key, iv);

        for entry in &batch.entries {
            match entry.kind {
                EntryKind::Directory => records.directory(&entry.relative_path)?,
                EntryKind::File => {
                    let path = context.source.join(&entry.relative_path);
                    let chunks = FileChunks::open(&path, SOURCE_CHUNK_SIZE)?;
                    records.file(&entry.relative_path, chunks)?;
                }
            }
        }

        let (metadata_bytes, filedata_bytes) = records.written();
        report.metadata_bytes += metadata_bytes;
        report.filedata_bytes += filedata_bytes;

        artifact.finish()?;
        report.artifacts += 1;
    }

    info!(
        "encrypted {} bytes of metadata and {} bytes of filedata",
        report.metadata_bytes, report.filedata_bytes
    );

    Ok(report)
}
