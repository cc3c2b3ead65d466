//! Run configuration and the derived cipher context.
//!
//! Nothing here is process-wide: the caller builds a [`Config`] and each
//! driver call derives its own key/IV state from it.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use zeroize::Zeroize;

use crate::kdf;
use crate::types::{EncDirError, DEFAULT_MAX_BATCH_SIZE};

/// Where the 32-byte AES key comes from.
pub enum KeySource {
    /// Derive the key from a password (iterated SHA-256).
    Password(SecretString),
    /// Use a raw 32-byte key directly, bypassing derivation. The IV chain
    /// still seeds from the key bytes.
    Raw([u8; 32]),
}

/// Explicit configuration record handed to [`encrypt`](crate::encrypt),
/// [`decrypt`](crate::decrypt) and [`validate`](crate::validate).
///
/// For encrypt, `source_dir` is the tree to archive and `output_dir`
/// receives the artifacts. For decrypt and validate, `source_dir` holds the
/// artifacts and `output_dir` is the extracted tree.
pub struct Config {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub key: KeySource,
    /// Cap on accounted file bytes per batch.
    pub max_batch_size: u64,
    /// Basenames whose file bodies validate skips entirely.
    pub ignored_files: Vec<String>,
}

impl Config {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        key: KeySource,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            key,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            ignored_files: vec![".DS_Store".to_owned()],
        }
    }

    /// Validate the directories and derive the cipher state.
    ///
    /// The output directory is created if missing; a missing source
    /// directory is fatal.
    pub(crate) fn open(&self) -> Result<Context, EncDirError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(EncDirError::Config("empty output directory provided"));
        }

        let key = match &self.key {
            KeySource::Password(password) => kdf::derive_key(password)?,
            KeySource::Raw(raw) => *raw,
        };

        let output = trim_trailing_slash(&self.output_dir);

        if !output.exists() {
            fs::create_dir_all(&output)
                .map_err(|_| EncDirError::OutputUnwritable(output.clone()))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&output, fs::Permissions::from_mode(0o755))?;
            }
        }
        if !self.source_dir.exists() {
            return Err(EncDirError::SourceMissing(self.source_dir.clone()));
        }

        let iv0 = kdf::derive_initial_iv(&key)?;

        Ok(Context {
            key,
            iv0,
            source: self.source_dir.clone(),
            output,
            cap: self.max_batch_size,
            ignored: self.ignored_files.clone(),
        })
    }
}

/// Drop a single trailing `/` from the configured output directory.
fn trim_trailing_slash(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.len() > 1 && s.ends_with('/') => PathBuf::from(&s[..s.len() - 1]),
        _ => path.to_path_buf(),
    }
}

/// Derived per-run state owned by a single driver invocation.
pub(crate) struct Context {
    pub key: [u8; 32],
    pub iv0: [u8; 16],
    pub source: PathBuf,
    pub output: PathBuf,
    pub cap: u64,
    pub ignored: Vec<String>,
}

impl Drop for Context {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(
            dir.path(),
            dir.path().join("out"),
            KeySource::Password(SecretString::new("".into())),
        );
        assert!(matches!(config.open(), Err(EncDirError::Config(_))));
    }

    #[test]
    fn missing_source_is_fatal_and_output_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = Config::new(
            dir.path().join("nope"),
            &out,
            KeySource::Password(SecretString::new("pw".into())),
        );
        assert!(matches!(config.open(), Err(EncDirError::SourceMissing(_))));
        assert!(out.is_dir());
    }

    #[test]
    fn trailing_slash_on_output_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();

        let with_slash = format!("{}/out/", dir.path().display());
        let config = Config::new(&source, with_slash, KeySource::Raw([7u8; 32]));
        let context = config.open().unwrap();
        assert_eq!(context.output, dir.path().join("out"));
        assert!(context.output.is_dir());
    }

    #[test]
    fn raw_key_skips_derivation() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(
            dir.path(),
            dir.path().join("out"),
            KeySource::Raw([7u8; 32]),
        );
        let context = config.open().unwrap();
        assert_eq!(context.key, [7u8; 32]);
    }
}
