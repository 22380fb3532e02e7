//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use fastget_transfer::TransferOptions;

use crate::config::Config;

#[derive(Clone, Debug, Parser)]
#[command(name = "fastget", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Args {
    /// Remote file; relative paths resolve against the remote home.
    pub remote: String,

    /// Local destination; relative paths resolve against the working directory.
    pub local: PathBuf,

    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reads kept in flight at once.
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    /// Bytes requested per read.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Text encoding of the written file (`binary` writes bytes verbatim).
    #[arg(long, short = 'e')]
    pub encoding: Option<String>,

    /// Octal permission bits for a newly created file, e.g. 640.
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<u32>,

    /// Local directory served as the remote `/`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Remote home directory.
    #[arg(long)]
    pub home: Option<String>,
}

impl Args {
    /// Loads the configuration this run asks for, with the session overrides applied.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(home) = &self.home {
            config.home = home.clone();
        }
        Ok(config)
    }

    /// `config`'s transfer defaults with any flags given on the command line.
    pub fn transfer_options(&self, config: &Config) -> TransferOptions {
        let mut options = config.transfer_options();
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if let Some(chunk_size) = self.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }
        if let Some(encoding) = &self.encoding {
            options = options.with_encoding(encoding.clone());
        }
        if let Some(mode) = self.mode {
            options = options.with_mode(mode);
        }
        options
    }
}

fn parse_mode(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    let mode = u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))?;
    if mode > 0o7777 {
        return Err(format!("mode {s} is out of range"));
    }
    Ok(mode)
}
