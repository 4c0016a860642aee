//! Command-line front end for the `bytepatch` diff/patch engine.
//!
//! `bytepatch diff OLD NEW` writes a textual patch; `bytepatch apply OLD
//! PATCH` fuzzily applies it and writes the result. Both subcommands
//! accept an optional TOML config file for the bitap/patch-margin knobs
//! (see [`bytepatch::PatchConfig`]); everything else is plain `std::fs`
//! I/O plumbed through `anyhow`.

use anyhow::{Context, Result};
use bytepatch::{BuildConfig, ByteSpan, Patch, PatchConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bytepatch", about = "Byte-level Myers/diff-match-patch engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML file overriding the default bitap/patch knobs.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Diff OLD against NEW and write a textual patch.
    Diff {
        old: PathBuf,
        new: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply PATCH to OLD and write the result.
    Apply {
        old: PathBuf,
        patch: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Padding length passed to `Patch::apply` (default: one margin).
        #[arg(long)]
        padding: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Diff { old, new, output } => run_diff(&old, &new, output.as_deref(), &config),
        Command::Apply { old, patch, output, padding } => {
            run_apply(&old, &patch, output.as_deref(), padding, &config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PatchConfig> {
    let Some(path) = path else {
        return Ok(PatchConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

fn run_diff(old: &Path, new: &Path, output: Option<&Path>, config: &PatchConfig) -> Result<()> {
    let l = read_span(old)?;
    let r = read_span(new)?;

    info!(old = %old.display(), new = %new.display(), "computing diff");
    let d = bytepatch::diff(&l, &r, &BuildConfig::default());
    let p = Patch::from_diff_with_source(&l, &d, config);
    let text = p.to_text();

    write_output(output, text.as_bytes())
}

fn run_apply(
    old: &Path,
    patch_path: &Path,
    output: Option<&Path>,
    padding: Option<usize>,
    config: &PatchConfig,
) -> Result<()> {
    let l = read_span(old)?;
    let patch_text = std::fs::read_to_string(patch_path)
        .with_context(|| format!("reading patch file {}", patch_path.display()))?;
    let p = Patch::parse(&patch_text, config)
        .with_context(|| format!("parsing patch file {}", patch_path.display()))?;

    info!(old = %old.display(), patch = %patch_path.display(), "applying patch");
    let (patched, mask) = match padding {
        Some(n) => p.apply(&l, n)?,
        None => p.apply_default(&l)?,
    };

    let failed: Vec<usize> = mask.failed_indices().collect();
    for &idx in &failed {
        warn!(fragment = idx, "patch fragment did not apply");
    }

    write_output(output, patched.as_bytes())?;

    if !failed.is_empty() {
        anyhow::bail!("{} of {} patch fragments did not apply", failed.len(), mask.len());
    }
    Ok(())
}

fn read_span(path: &Path) -> Result<ByteSpan> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(ByteSpan::from(bytes))
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display())),
        None => {
            use std::io::Write;
            std::io::stdout().write_all(bytes).context("writing to stdout")
        }
    }
}
