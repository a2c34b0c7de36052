//! Command-line driver for splinter: split a file into ASCII fragments and
//! reassemble fragments back into their originals.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use splinter_core::HashAlgorithm;
use splinter_store::{discover_groups, scan_and_reassemble, split_file_default, JoinOptions, SplitOptions};

#[derive(Parser, Debug)]
#[command(name = "splinter", about = "Split files into ASCII fragments and reassemble them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a file into fragment records under an output directory.
    Split {
        /// File to fragment.
        #[arg(short, long)]
        input: PathBuf,
        /// Directory fragments are written into (created if missing).
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Pass-phrase enabling RC4 encryption of fragment payloads.
        #[arg(short, long)]
        password: Option<String>,
        /// Maximum fragment size in bytes.
        #[arg(long, default_value_t = 22_000_000)]
        max_size: u64,
        /// Width of the fragment size distribution below `max_size`.
        #[arg(long, default_value_t = 4_000_000)]
        size_range: u64,
        /// Digest algorithm: md5, sha1, sha224, sha256, sha384, sha512.
        #[arg(long, default_value = "sha1")]
        hash_func: String,
        /// Emit progress messages.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Scan a directory for fragments and reassemble every complete group.
    Join {
        /// Directory to scan for fragment files.
        #[arg(short, long)]
        input_dir: PathBuf,
        /// Directory restored files are written into (defaults to `input_dir`).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Pass-phrase used to decrypt fragments that were encrypted on split.
        #[arg(short, long)]
        password: Option<String>,
        /// Delete fragment files after a group is successfully reassembled.
        #[arg(long, default_value_t = true, overrides_with = "keep_originals")]
        remove_originals: bool,
        /// Keep fragment files after reassembly (overrides --remove-originals).
        #[arg(long, default_value_t = false, overrides_with = "remove_originals")]
        keep_originals: bool,
        /// Overwrite an existing output file that doesn't already match.
        #[arg(long)]
        overwrite: bool,
        /// Digest algorithm: md5, sha1, sha224, sha256, sha384, sha512.
        #[arg(long, default_value = "sha1")]
        hash_func: String,
        /// Emit progress messages.
        #[arg(short, long)]
        verbose: bool,
    },
    /// List fragment groups found in a directory without writing anything.
    Scan {
        /// Directory to scan for fragment files.
        #[arg(short, long)]
        input_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Split { input, output_dir, password, max_size, size_range, hash_func, verbose } => {
            let opts = SplitOptions {
                max_size,
                size_range,
                password,
                hash_func: HashAlgorithm::parse(&hash_func)?,
                verbose,
            };
            let fragments = split_file_default(&input, &output_dir, &opts)
                .with_context(|| format!("splitting {}", input.display()))?;
            for fragment in &fragments {
                println!("{}", fragment.display());
            }
            eprintln!("wrote {} fragment(s)", fragments.len());
        }
        Command::Join {
            input_dir,
            output_dir,
            password,
            remove_originals,
            keep_originals,
            overwrite,
            hash_func,
            verbose,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| input_dir.clone());
            let opts = JoinOptions {
                password,
                remove_originals: remove_originals && !keep_originals,
                overwrite,
                hash_func: HashAlgorithm::parse(&hash_func)?,
                verbose,
            };
            let mut restored_count = 0;
            for restored in scan_and_reassemble(&input_dir, &output_dir, opts)
                .with_context(|| format!("scanning {}", input_dir.display()))?
            {
                let path = restored?;
                println!("{}", path.display());
                restored_count += 1;
            }
            eprintln!("restored {restored_count} file(s)");
        }
        Command::Scan { input_dir } => {
            let groups = discover_groups(&input_dir)
                .with_context(|| format!("scanning {}", input_dir.display()))?;
            for group in groups.values() {
                let file_hash = group.file_hash().unwrap_or("?");
                let file_name = group.file_name().unwrap_or("?");
                let fragment_count = group.fragments().len();
                let status = match group.plan() {
                    Ok(_) => "complete",
                    Err(_) => "incomplete",
                };
                println!("{file_hash}  {file_name}  fragments={fragment_count}  {status}");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_known_subcommands() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_requires_input_and_output_dir() {
        let result = Cli::try_parse_from(["splinter", "split"]);
        assert!(result.is_err());
    }

    #[test]
    fn split_parses_with_defaults() {
        let cli = Cli::try_parse_from([
            "splinter", "split", "--input", "a.bin", "--output-dir", "frags",
        ])
        .unwrap();
        match cli.command {
            Command::Split { max_size, size_range, hash_func, .. } => {
                assert_eq!(max_size, 22_000_000);
                assert_eq!(size_range, 4_000_000);
                assert_eq!(hash_func, "sha1");
            }
            other => panic!("expected Split, got {other:?}"),
        }
    }
}
