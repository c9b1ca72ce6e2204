use crate::cli::TrimCli;
use crate::config;
use crate::error::{ReadflowError, Result};
use crate::exit_code;
use crate::runner::manifest::{self, ManifestEntry, RunManifest};
use crate::runner::warn_duplicate_destinations;
use crate::scan::filesystem::expand_home;
use crate::scan::{self, PathPair};
use crate::types::config::{FailurePolicy, TrimConfig};
use std::borrow::Cow;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

pub const TOOL_NAME: &str = "trim-reads";

const STDERR_TAIL_LINES: usize = 5;

/// A program plus its arguments, spawned directly rather than through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ExternalCommand {
    /// `<command...> <source> <destination> <steps...>`
    pub fn for_pair(cfg: &TrimConfig, pair: &PathPair) -> Result<Self> {
        let (program, leading) = cfg.split_command()?;
        let mut args: Vec<OsString> = leading
            .iter()
            .map(|token| OsString::from(expand_home(token)))
            .collect();
        args.push(pair.source.clone().into_os_string());
        args.push(pair.destination.clone().into_os_string());
        args.extend(cfg.steps.iter().map(OsString::from));
        Ok(Self {
            program: expand_home(program),
            args,
        })
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

/// Renders the shell line equivalent to running the command with its
/// output discarded.
impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        write!(f, " >> /dev/null")
    }
}

/// Single-quotes `token` unless every character is safe unquoted in sh.
fn shell_quote(token: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !token.is_empty() && token.chars().all(safe) {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', "'\\''")))
    }
}

#[derive(Debug, Clone)]
pub struct TrimJob {
    pub pair: PathPair,
    pub command: ExternalCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimFailure {
    pub source: String,
    pub code: String,
    pub stderr: String,
}

#[derive(Debug, Default)]
pub struct TrimSummary {
    /// Commands built, whether or not they ran or succeeded.
    pub built: usize,
    pub failures: Vec<TrimFailure>,
    pub entries: Vec<ManifestEntry>,
}

pub fn execute_trim(cli: &TrimCli) -> Result<i32> {
    let args = &cli.run;
    let mut cfg = config::load_config(args.config.as_deref())?;
    if let Some(policy) = cli.on_failure {
        cfg.trim.on_failure = policy.into();
    }

    let pairs = scan::find_pairs(&args.input_dir, &args.output_dir, &cfg.trim.rule())?;
    warn_duplicate_destinations(&pairs);
    let jobs = build_jobs(&pairs, &cfg.trim)?;

    let mut stdout = io::stdout().lock();
    let summary = if args.print_only {
        print_jobs(&jobs, &mut stdout)?
    } else {
        if !jobs.is_empty() && !args.output_dir.is_dir() {
            return Err(ReadflowError::PathNotFound(
                args.output_dir.display().to_string(),
            ));
        }
        run_jobs(&jobs, cfg.trim.on_failure)?
    };

    let failed = summary.failures.len();
    for failure in &summary.failures {
        eprintln!(
            "trim failed: {} (exit {}): {}",
            failure.source, failure.code, failure.stderr
        );
    }

    if let Some(path) = args.manifest.as_deref().filter(|_| !args.print_only) {
        let record = RunManifest::new(TOOL_NAME, &args.output_dir, summary.entries);
        manifest::write_manifest(path, &record)?;
    }

    if args.verbose {
        writeln!(
            stdout,
            "Trimmed {} files to {}",
            summary.built,
            args.output_dir.display()
        )?;
    }

    if failed > 0 {
        Ok(exit_code::TRIM_FAILURES)
    } else {
        Ok(exit_code::SUCCESS)
    }
}

/// Builds every command up front; nothing runs here.
pub fn build_jobs(pairs: &[PathPair], cfg: &TrimConfig) -> Result<Vec<TrimJob>> {
    pairs
        .iter()
        .map(|pair| {
            Ok(TrimJob {
                command: ExternalCommand::for_pair(cfg, pair)?,
                pair: pair.clone(),
            })
        })
        .collect()
}

pub fn print_jobs(jobs: &[TrimJob], out: &mut impl Write) -> Result<TrimSummary> {
    for job in jobs {
        writeln!(out, "{}", job.command)?;
    }
    Ok(TrimSummary {
        built: jobs.len(),
        ..TrimSummary::default()
    })
}

/// Runs the jobs one after another. A command that cannot be started is
/// always fatal; a non-zero exit follows `policy`.
pub fn run_jobs(jobs: &[TrimJob], policy: FailurePolicy) -> Result<TrimSummary> {
    let mut summary = TrimSummary {
        built: jobs.len(),
        ..TrimSummary::default()
    };

    for job in jobs {
        let source = job.pair.source.display().to_string();
        debug!(command = %job.command, "running");
        let output = job
            .command
            .to_command()
            .output()
            .map_err(|error| ReadflowError::Spawn {
                program: job.command.program.clone(),
                error,
            })?;

        let ok = output.status.success();
        summary.entries.push(ManifestEntry {
            source: job.pair.source.clone(),
            destination: job.pair.destination.clone(),
            sha256: None,
            exit_code: output.status.code(),
            ok,
        });

        if ok {
            info!(source = %source, destination = %job.pair.destination.display(), "trimmed");
            continue;
        }

        let failure = TrimFailure {
            source,
            code: describe_status(output.status),
            stderr: stderr_tail(&output.stderr),
        };
        if policy == FailurePolicy::Abort {
            return Err(ReadflowError::TrimFailed {
                source_path: failure.source,
                code: failure.code,
                stderr: failure.stderr,
            });
        }
        summary.failures.push(failure);
    }
    Ok(summary)
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn pair(source: &str, destination: &str) -> PathPair {
        PathPair {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
        }
    }

    fn shell_config(script: &str) -> TrimConfig {
        TrimConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            steps: vec!["MINLEN:36".to_string()],
            ..TrimConfig::default()
        }
    }

    #[test]
    fn default_command_matches_trimmomatic_single_end_call() {
        let job = ExternalCommand::for_pair(
            &TrimConfig::default(),
            &pair("/in/x/reads.fastq", "/out/x.trm_dbc_paired.fastq"),
        )
        .expect("default command should build");
        let rendered = job.to_string();

        assert_eq!(job.program, "java");
        assert!(rendered.starts_with("java -jar "));
        assert!(rendered.contains("Trimmomatic-0.36/trimmomatic-0.36.jar SE /in/x/reads.fastq"));
        assert!(rendered.ends_with(
            "/out/x.trm_dbc_paired.fastq LEADING:3 TRAILING:3 SLIDINGWINDOW:4:15 MINLEN:36 >> /dev/null"
        ));
    }

    #[test]
    fn print_jobs_writes_one_line_per_command() {
        let pairs = vec![
            pair("/in/a/reads.fastq", "/out/a.trm_dbc_paired.fastq"),
            pair("/in/b/reads.fastq", "/out/b.trm_dbc_paired.fastq"),
        ];
        let jobs = build_jobs(&pairs, &TrimConfig::default()).expect("jobs should build");
        let mut out = Vec::new();

        let summary = print_jobs(&jobs, &mut out).expect("print should succeed");

        assert_eq!(summary.built, 2);
        let printed = String::from_utf8(out).expect("output is utf8");
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("/in/b/reads.fastq /out/b.trm_dbc_paired.fastq"));
    }

    #[test]
    fn run_jobs_executes_in_order_and_counts_successes() {
        let dir = TempDir::new().expect("temp dir should be created");
        let input = dir.path().join("x/reads.fastq");
        fs::create_dir_all(dir.path().join("x")).expect("dir should create");
        fs::write(&input, "@x\nACGT\n+\nIIII\n").expect("reads should write");
        let output = dir.path().join("x.trm_dbc_paired.fastq");

        let jobs = build_jobs(
            &[PathPair {
                source: input.clone(),
                destination: output.clone(),
            }],
            &shell_config("cp \"$0\" \"$1\""),
        )
        .expect("jobs should build");
        let summary = run_jobs(&jobs, FailurePolicy::Continue).expect("run should succeed");

        assert_eq!(summary.built, 1);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.entries[0].exit_code, Some(0));
        assert_eq!(
            fs::read_to_string(output).expect("trimmed output should exist"),
            "@x\nACGT\n+\nIIII\n"
        );
    }

    #[test]
    fn run_jobs_continue_collects_failures_with_stderr() {
        let jobs = build_jobs(
            &[
                pair("/in/a/reads.fastq", "/out/a.fastq"),
                pair("/in/b/reads.fastq", "/out/b.fastq"),
            ],
            &shell_config("echo \"no quality scores in $0\" >&2; exit 4"),
        )
        .expect("jobs should build");

        let summary = run_jobs(&jobs, FailurePolicy::Continue).expect("continue never errors");

        assert_eq!(summary.built, 2);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].code, "4");
        assert_eq!(
            summary.failures[0].stderr,
            "no quality scores in /in/a/reads.fastq"
        );
        assert!(summary.entries.iter().all(|entry| !entry.ok));
    }

    #[test]
    fn run_jobs_abort_stops_at_first_failure() {
        let dir = TempDir::new().expect("temp dir should be created");
        let marker = dir.path().join("ran");
        let script = format!("echo run >> {}; exit 1", marker.display());
        let jobs = build_jobs(
            &[
                pair("/in/a/reads.fastq", "/out/a.fastq"),
                pair("/in/b/reads.fastq", "/out/b.fastq"),
            ],
            &shell_config(&script),
        )
        .expect("jobs should build");

        let result = run_jobs(&jobs, FailurePolicy::Abort);

        assert!(matches!(result, Err(ReadflowError::TrimFailed { .. })));
        assert_eq!(
            fs::read_to_string(marker).expect("marker should exist"),
            "run\n"
        );
    }

    #[test]
    fn run_jobs_reports_missing_program() {
        let cfg = TrimConfig {
            command: vec!["readflow-no-such-trimmer".to_string()],
            ..TrimConfig::default()
        };
        let jobs = build_jobs(&[pair("/in/a/reads.fastq", "/out/a.fastq")], &cfg)
            .expect("jobs should build");

        let result = run_jobs(&jobs, FailurePolicy::Continue);
        assert!(matches!(result, Err(ReadflowError::Spawn { .. })));
    }

    #[test]
    fn build_jobs_rejects_blank_program() {
        let cfg = TrimConfig {
            command: vec![String::new(), "java".to_string()],
            ..TrimConfig::default()
        };
        let result = build_jobs(&[pair("/in/a/reads.fastq", "/out/a.fastq")], &cfg);
        assert!(matches!(result, Err(ReadflowError::ConfigParse(_))));
    }

    #[test]
    fn display_quotes_tokens_the_shell_would_split() {
        let cfg = TrimConfig {
            command: vec!["java".to_string(), "-jar".to_string(), "/opt/my tools/t.jar".to_string()],
            steps: vec!["MINLEN:36".to_string()],
            ..TrimConfig::default()
        };
        let job = ExternalCommand::for_pair(
            &cfg,
            &pair("/in/sample 1/reads.fastq", "/out/it's.fastq"),
        )
        .expect("command should build");

        assert_eq!(
            job.to_string(),
            "java -jar '/opt/my tools/t.jar' '/in/sample 1/reads.fastq' '/out/it'\\''s.fastq' MINLEN:36 >> /dev/null"
        );
    }

    #[cfg(unix)]
    #[test]
    fn for_pair_passes_non_utf8_paths_through_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = PathBuf::from(OsStr::from_bytes(b"/in/s\xff/reads.fastq"));
        let job = ExternalCommand::for_pair(
            &TrimConfig::default(),
            &PathPair {
                source: source.clone(),
                destination: PathBuf::from("/out/s.fastq"),
            },
        )
        .expect("command should build");

        assert_eq!(job.args[3], source.into_os_string());
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = b"1\n2\n3\n4\n5\n6\n7\n";
        assert_eq!(stderr_tail(stderr), "3 | 4 | 5 | 6 | 7");
        assert_eq!(stderr_tail(b""), "");
    }
}
