use crate::cli::FlattenCli;
use crate::config;
use crate::error::{ReadflowError, Result};
use crate::exit_code;
use crate::runner::manifest::{self, ManifestEntry, RunManifest};
use crate::runner::warn_duplicate_destinations;
use crate::scan::{self, PathPair};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

pub const TOOL_NAME: &str = "flatten-joins";

#[derive(Debug, Default)]
pub struct FlattenSummary {
    pub copied: usize,
    pub entries: Vec<ManifestEntry>,
}

pub fn execute_flatten(cli: &FlattenCli) -> Result<i32> {
    let args = &cli.run;
    let cfg = config::load_config(args.config.as_deref())?;
    let pairs = scan::find_pairs(&args.input_dir, &args.output_dir, &cfg.flatten.rule())?;
    warn_duplicate_destinations(&pairs);

    let mut stdout = io::stdout().lock();
    let summary = flatten(&pairs, &args.output_dir, args.print_only, &mut stdout)?;

    if let Some(path) = args.manifest.as_deref().filter(|_| !args.print_only) {
        let record = RunManifest::new(TOOL_NAME, &args.output_dir, summary.entries);
        manifest::write_manifest(path, &record)?;
    }

    if args.verbose {
        writeln!(
            stdout,
            "Copied {} files to {}",
            summary.copied,
            args.output_dir.display()
        )?;
    }
    Ok(exit_code::SUCCESS)
}

/// Copies every pair into `output_dir`, creating it first when needed. With
/// `print_only` the equivalent actions are written to `out` instead and the
/// filesystem is left alone.
pub fn flatten(
    pairs: &[PathPair],
    output_dir: &Path,
    print_only: bool,
    out: &mut impl Write,
) -> Result<FlattenSummary> {
    let mut summary = FlattenSummary::default();
    if pairs.is_empty() {
        return Ok(summary);
    }

    if print_only {
        // Repeated per pair; nothing is created here.
        let missing = !output_dir.is_dir();
        for pair in pairs {
            if missing {
                writeln!(out, "If it doesn't exist: mkdir {}", output_dir.display())?;
            }
            writeln!(
                out,
                "copy {} {}",
                pair.source.display(),
                pair.destination.display()
            )?;
        }
        return Ok(summary);
    }

    if ensure_output_dir(output_dir)? {
        info!(dir = %output_dir.display(), "created output directory");
    }
    for pair in pairs {
        let digest = copy_file(&pair.source, &pair.destination)?;
        summary.copied += 1;
        info!(
            source = %pair.source.display(),
            destination = %pair.destination.display(),
            "copied"
        );
        summary.entries.push(ManifestEntry {
            source: pair.source.clone(),
            destination: pair.destination.clone(),
            sha256: Some(digest),
            exit_code: None,
            ok: true,
        });
    }
    Ok(summary)
}

/// Creates `dir` (one level only). Returns whether it was created; an
/// existing directory is accepted, an existing non-directory is not.
pub fn ensure_output_dir(dir: &Path) -> Result<bool> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if dir.is_dir() {
                Ok(false)
            } else {
                Err(ReadflowError::NotADirectory(dir.display().to_string()))
            }
        }
        Err(e) => Err(ReadflowError::file(dir, e)),
    }
}

/// Truncates `destination`, streams `source` into it and returns the
/// hex SHA-256 of the bytes written.
fn copy_file(source: &Path, destination: &Path) -> Result<String> {
    let target = File::create(destination).map_err(|e| ReadflowError::file(destination, e))?;
    let mut reader = File::open(source).map_err(|e| ReadflowError::file(source, e))?;
    let mut writer = HashingWriter::new(target);
    io::copy(&mut reader, &mut writer).map_err(|e| ReadflowError::file(destination, e))?;
    writer.flush().map_err(|e| ReadflowError::file(destination, e))?;
    Ok(writer.finish())
}

struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
