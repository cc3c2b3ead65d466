#![forbid(unsafe_code)]
//! CLI for `enc_dir`: encrypt, decrypt or validate a directory archive.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use enc_dir::{Config, KeySource, DEFAULT_MAX_BATCH_SIZE};
use hex::decode as hex_decode;
use secrecy::SecretString;
use tracing::info;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "enc-dir",
    version,
    about = "Encrypt a directory tree into batched, gzip-compressed artifacts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a source tree into numbered batch artifacts
    Encrypt(ModeArgs),
    /// Rebuild a tree from a directory of batch artifacts
    Decrypt(ModeArgs),
    /// Compare batch artifacts against an already-decrypted tree
    Validate(ModeArgs),
}

#[derive(Args, Debug)]
struct ModeArgs {
    /// Source directory: the tree to encrypt, or the artifact directory for
    /// decrypt/validate
    #[arg(short = 's', long = "source", default_value = ".")]
    source: PathBuf,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output", default_value = "./encrypted")]
    output: PathBuf,

    /// Password; prompted interactively when neither this nor --key-hex is
    /// given
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Raw 32-byte key as 64 hex characters, bypassing password derivation
    #[arg(short = 'k', long = "key-hex", conflicts_with = "password")]
    key_hex: Option<String>,

    /// Max encrypted batch file size in bytes
    #[arg(short = 'b', long = "batch-size", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    batch_size: u64,

    /// Comma-separated basenames whose contents validate skips
    #[arg(short = 'i', long = "ignore", default_value = ".DS_Store")]
    ignore: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let started = Instant::now();

    match cli.cmd {
        Command::Encrypt(args) => {
            let config = build_config(args)?;
            enc_dir::encrypt(&config).context("failed to encrypt data")?;
            info!("encrypt finished in {} seconds", started.elapsed().as_secs());
        }
        Command::Decrypt(args) => {
            let config = build_config(args)?;
            enc_dir::decrypt(&config).context("failed to decrypt data")?;
            info!("decrypt finished in {} seconds", started.elapsed().as_secs());
        }
        Command::Validate(args) => {
            let config = build_config(args)?;
            enc_dir::validate(&config).context("failed to validate data")?;
            info!("validate finished in {} seconds", started.elapsed().as_secs());
        }
    }

    Ok(())
}

fn build_config(args: ModeArgs) -> Result<Config> {
    let key = if let Some(hex_str) = args.key_hex {
        let bytes = hex_decode(hex_str).context("invalid key hex")?;
        if bytes.len() != 32 {
            bail!("key must be 32 bytes (64 hex chars)");
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        KeySource::Raw(key)
    } else {
        let password = match args.password {
            Some(p) => p,
            None => rpassword::prompt_password("Password: ")?,
        };
        KeySource::Password(SecretString::new(password.into_boxed_str()))
    };

    let mut config = Config::new(args.source, args.output, key);
    config.max_batch_size = args.batch_size;
    config.ignored_files = args.ignore.split(',').map(str::to_owned).collect();
    Ok(config)
}
