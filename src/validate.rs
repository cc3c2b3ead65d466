//! The validate driver: decrypt in place and compare against an
//! already-extracted tree without rewriting anything.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::info;

use crate::artifact::{artifact_path, list_artifacts, open_artifact};
use crate::config::Context;
use crate::frame::{BatchDecoder, Body, EntrySink};
use crate::kdf::IvChain;
use crate::types::EncDirError;

/// Counters from a completed validate run.
#[derive(Debug, Default)]
pub struct ValidateReport {
    pub artifacts: usize,
}

/// Sink that checks decoded file bodies byte-for-byte against the extracted
/// tree. Directories need no action; files whose basename is on the ignore
/// list are skipped before their body is even decrypted.
struct VerifySink<'a> {
    output: &'a Path,
    ignored: &'a [String],
    reader: Option<BufReader<File>>,
    current_path: String,
}

impl EntrySink for VerifySink<'_> {
    fn directory(&mut self, _path: &str) -> Result<(), EncDirError> {
        Ok(())
    }

    fn file_begin(&mut self, path: &str) -> Result<Body, EncDirError> {
        let full = self.output.join(path);
        self.current_path = full.display().to_string();

        let basename = path.rsplit('/').next().unwrap_or(path);
        if self.ignored.iter().any(|name| name == basename) {
            return Ok(Body::Skip);
        }

        self.reader = Some(BufReader::new(File::open(full)?));
        Ok(Body::Consume)
    }

    fn file_chunk(&mut self, data: &[u8]) -> Result<(), EncDirError> {
        let reader = match &mut self.reader {
            Some(reader) => reader,
            None => {
                return Err(EncDirError::Framing(
                    "file chunk outside a file record".into(),
                ))
            }
        };

        let mut expected = vec![0u8; data.len()];
        reader.read_exact(&mut expected)?;
        if expected != data {
            return Err(EncDirError::DataMismatch(self.current_path.clone()));
        }
        Ok(())
    }

    fn file_end(&mut self) -> Result<(), EncDirError> {
        self.reader = None;
        Ok(())
    }
}

pub(crate) fn run(context: &Context) -> Result<ValidateReport, EncDirError> {
    let names = list_artifacts(&context.source)?;
    let mut chain = IvChain::new(context.iv0);

    for name in &names {
        let iv = chain.advance()?;
        let reader = open_artifact(&artifact_path(&context.source, name))?;
        let mut sink = VerifySink {
            output: &context.output,
            ignored: &context.ignored,
            reader: None,
            current_path: String::new(),
        };
        BatchDecoder::new(&context.key, iv, &mut sink).decode(reader)?;
    }

    info!("validated {} artifacts", names.len());
    Ok(ValidateReport {
        artifacts: names.len(),
    })
}
