#![forbid(unsafe_code)]
//! # enc_dir — batched encryption for directory trees.
//!
//! `enc_dir` archives a directory into an ordered sequence of opaque,
//! size-capped `.data` artifacts from which the tree (paths, structure, file
//! bodies) can be rebuilt given the original password. A validation mode
//! re-reads the artifacts and compares them against an already-extracted
//! tree without rewriting files.
//!
//! ## Format
//! - The walked tree is packed into batches whose accounted file bytes stay
//!   under a configurable cap; a file larger than the cap gets a batch of
//!   its own.
//! - Each batch becomes one gzip-compressed artifact holding a stream of
//!   `$`/`?`-delimited records: encrypted JSON metadata per entry, followed
//!   by encrypted 100 MiB body chunks for files.
//! - Blocks are AES-256-CBC with PKCS#7 padding, base64-armored. The key is
//!   an iterated SHA-256 of the password; each batch's IV is the next link
//!   of a hash chain seeded from the key, so artifacts carry no key or IV
//!   material and must be traversed in order.
//! - An interrupted encrypt can be re-run against the same directories: it
//!   continues after the artifacts already present.
//!
//! ## Example: round-trip a tree
//! ```no_run
//! use enc_dir::{Config, KeySource};
//! use secrecy::SecretString;
//!
//! let password = SecretString::new("correct horse".into());
//! let config = Config::new("./photos", "./encrypted", KeySource::Password(password));
//! enc_dir::encrypt(&config)?;
//!
//! let password = SecretString::new("correct horse".into());
//! let restore = Config::new("./encrypted", "./restored", KeySource::Password(password));
//! enc_dir::decrypt(&restore)?;
//! # Ok::<(), enc_dir::EncDirError>(())
//! ```
//!
//! Safety notes
//! - The ciphertext is unauthenticated CBC: tampering is only caught by the
//!   padding sanity check, metadata parsing, or validate mode. Protects data
//!   at rest against readers, not against active attackers.

mod artifact;
mod config;
mod crypto;
mod decrypt;
mod encrypt;
mod frame;
mod kdf;
mod planner;
mod types;
mod validate;
mod walk;

pub use config::{Config, KeySource};
pub use decrypt::DecryptReport;
pub use encrypt::EncryptReport;
pub use planner::{plan_batches, Batch};
pub use types::{EncDirError, Entry, EntryKind, DEFAULT_MAX_BATCH_SIZE, SOURCE_CHUNK_SIZE};
pub use validate::ValidateReport;

/// Encrypt the configured source tree into batch artifacts under the output
/// directory, continuing after any artifacts already present.
pub fn encrypt(config: &Config) -> Result<EncryptReport, EncDirError> {
    let context = config.open()?;
    encrypt::run(&context)
}

/// Rebuild a tree under the output directory from the artifacts in the
/// source directory.
pub fn decrypt(config: &Config) -> Result<DecryptReport, EncDirError> {
    let context = config.open()?;
    decrypt::run(&context)
}

/// Compare the artifacts in the source directory against the
/// already-extracted tree under the output directory.
pub fn validate(config: &Config) -> Result<ValidateReport, EncDirError> {
    let context = config.open()?;
    validate::run(&context)
}
