use crate::error::{ReadflowError, Result};
use crate::scan::PairRule;
use serde::Deserialize;

pub const DEFAULT_JOIN_MATCH: &str = "fastqjoin.join.fastq";
pub const DEFAULT_JOIN_SUFFIX: &str = ".paired.fastq";
pub const DEFAULT_READS_MATCH: &str = "reads.fastq";
pub const DEFAULT_TRIM_SUFFIX: &str = ".trm_dbc_paired.fastq";
pub const DEFAULT_TRIMMOMATIC_JAR: &str = "~/bin/Trimmomatic-0.36/trimmomatic-0.36.jar";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadflowConfig {
    #[serde(default)]
    pub flatten: FlattenConfig,
    #[serde(default)]
    pub trim: TrimConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlattenConfig {
    #[serde(default = "default_join_match")]
    pub match_name: String,
    #[serde(default = "default_join_suffix")]
    pub suffix: String,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            match_name: default_join_match(),
            suffix: default_join_suffix(),
        }
    }
}

impl FlattenConfig {
    pub fn rule(&self) -> PairRule {
        PairRule::new(&self.match_name, &self.suffix)
    }
}

fn default_join_match() -> String {
    DEFAULT_JOIN_MATCH.to_string()
}

fn default_join_suffix() -> String {
    DEFAULT_JOIN_SUFFIX.to_string()
}

/// What to do when the trimming tool exits unsuccessfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and move on to the next sample.
    #[default]
    Continue,
    /// Stop at the first failed sample.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrimConfig {
    #[serde(default = "default_reads_match")]
    pub match_name: String,
    #[serde(default = "default_trim_suffix")]
    pub suffix: String,
    /// Program and leading arguments; source, destination and steps follow.
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    #[serde(default = "default_steps")]
    pub steps: Vec<String>,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            match_name: default_reads_match(),
            suffix: default_trim_suffix(),
            command: default_command(),
            steps: default_steps(),
            on_failure: FailurePolicy::default(),
        }
    }
}

impl TrimConfig {
    pub fn rule(&self) -> PairRule {
        PairRule::new(&self.match_name, &self.suffix)
    }

    /// The program to spawn and the arguments placed before each sample's
    /// paths. The program token must not be blank.
    pub fn split_command(&self) -> Result<(&str, &[String])> {
        match self.command.split_first() {
            Some((program, leading)) if !program.trim().is_empty() => Ok((program.as_str(), leading)),
            _ => Err(ReadflowError::ConfigParse(
                "trim.command must name a program".to_string(),
            )),
        }
    }
}

fn default_reads_match() -> String {
    DEFAULT_READS_MATCH.to_string()
}

fn default_trim_suffix() -> String {
    DEFAULT_TRIM_SUFFIX.to_string()
}

fn default_command() -> Vec<String> {
    ["java", "-jar", DEFAULT_TRIMMOMATIC_JAR, "SE"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn default_steps() -> Vec<String> {
    ["LEADING:3", "TRAILING:3", "SLIDINGWINDOW:4:15", "MINLEN:36"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

impl ReadflowConfig {
    pub fn validate(&self) -> Result<()> {
        validate_rule("flatten", &self.flatten.match_name, &self.flatten.suffix)?;
        validate_rule("trim", &self.trim.match_name, &self.trim.suffix)?;
        self.trim.split_command()?;
        Ok(())
    }
}

fn validate_rule(section: &str, match_name: &str, suffix: &str) -> Result<()> {
    if match_name.is_empty() {
        return Err(ReadflowError::ConfigParse(format!(
            "{section}.match_name must not be empty"
        )));
    }
    for (key, value) in [("match_name", match_name), ("suffix", suffix)] {
        if value.contains('/') || value.contains(std::path::MAIN_SEPARATOR) {
            return Err(ReadflowError::ConfigParse(format!(
                "{section}.{key} must be a bare file name: {value}"
            )));
        }
    }
    Ok(())
}
