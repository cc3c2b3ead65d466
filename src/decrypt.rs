//! The decrypt driver: read artifacts in filename order and rebuild the tree.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::artifact::{artifact_path, list_artifacts, open_artifact};
use crate::config::Context;
use crate::frame::{BatchDecoder, Body, EntrySink};
use crate::kdf::IvChain;
use crate::types::EncDirError;

/// Counters from a completed decrypt run.
#[derive(Debug, Default)]
pub struct DecryptReport {
    pub artifacts: usize,
}

/// Sink that materializes decoded entries under the output directory.
///
/// Output files are opened in append mode at their metadata record and
/// closed at the record's terminating `$`; a failed run leaves whatever was
/// written.
struct ExtractSink<'a> {
    output: &'a Path,
    current: Option<File>,
}

impl EntrySink for ExtractSink<'_> {
    fn directory(&mut self, path: &str) -> Result<(), EncDirError> {
        fs::create_dir_all(self.output.join(path))?;
        Ok(())
    }

    fn file_begin(&mut self, path: &str) -> Result<Body, EncDirError> {
        let full = self.output.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().append(true).create(true).open(full)?;
        self.current = Some(file);
        Ok(Body::Consume)
    }

    fn file_chunk(&mut self, data: &[u8]) -> Result<(), EncDirError> {
        match &mut self.current {
            Some(file) => Ok(file.write_all(data)?),
            None => Err(EncDirError::Framing("file chunk outside a file record".into())),
        }
    }

    fn file_end(&mut self) -> Result<(), EncDirError> {
        self.current = None;
        Ok(())
    }
}

pub(crate) fn run(context: &Context) -> Result<DecryptReport, EncDirError> {
    let names = list_artifacts(&context.source)?;
    let mut chain = IvChain::new(context.iv0);

    for name in &names {
        let iv = chain.advance()?;
        let reader = open_artifact(&artifact_path(&context.source, name))?;
        let mut sink = ExtractSink {
            output: &context.output,
            current: None,
        };
        BatchDecoder::new(&context.key, iv, &mut sink).decode(reader)?;
    }

    info!("decrypted {} artifacts", names.len());
    Ok(DecryptReport {
        artifacts: names.len(),
    })
}
