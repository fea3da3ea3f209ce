// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::compile::{Compiler, SupplementalPolicy};

/// Env var naming a YAML config file, used when none is given on the command line.
pub const CONFIG_ENV_VAR: &str = "CSV_COMPILER_CONFIG";

/// Where and how a run writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub output_dir: PathBuf,
    pub csv_file_name: String,
    pub xlsx_file_name: String,
    pub parquet_file_name: String,
    pub log_file_name: String,
    pub summary_file_name: String,
    pub write_parquet: bool,
    pub malformed_supplemental: SupplementalPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            csv_file_name: "master_compiled_data.csv".into(),
            xlsx_file_name: "master_compiled_data.xlsx".into(),
            parquet_file_name: "master_compiled_data.parquet".into(),
            log_file_name: "processing_log.txt".into(),
            summary_file_name: "summary.json".into(),
            write_parquet: true,
            malformed_supplemental: SupplementalPolicy::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("parsing compiler config")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_yaml_str(&text)
            .with_context(|| format!("in config {}", path.display()))?;
        debug!(?cfg, "loaded config");
        Ok(cfg)
    }

    /// Config from an explicit path, else from `$CSV_COMPILER_CONFIG`, else defaults.
    pub fn resolve(cli_path: Option<&str>) -> Result<Self> {
        match cli_path
            .map(PathBuf::from)
            .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::new(self.malformed_supplemental)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file_name)
    }

    pub fn xlsx_path(&self) -> PathBuf {
        self.output_dir.join(&self.xlsx_file_name)
    }

    pub fn parquet_path(&self) -> PathBuf {
        self.output_dir.join(&self.parquet_file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file_name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_yaml_is_default() -> Result<()> {
        assert_eq!(CompilerConfig::from_yaml_str("")?, CompilerConfig::default());
        Ok(())
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let cfg = CompilerConfig::from_yaml_str(
            "output_dir: /tmp/out\nmalformed_supplemental: detail_only\nwrite_parquet: false\n",
        )?;
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.malformed_supplemental, SupplementalPolicy::DetailOnly);
        assert!(!cfg.write_parquet);
        assert_eq!(cfg.csv_file_name, "master_compiled_data.csv");
        assert_eq!(cfg.xlsx_path(), PathBuf::from("/tmp/out/master_compiled_data.xlsx"));
        assert_eq!(cfg.csv_path(), PathBuf::from("/tmp/out/master_compiled_data.csv"));
        assert_eq!(cfg.compiler().policy(), SupplementalPolicy::DetailOnly);
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CompilerConfig::from_yaml_str("ouput_dir: typo\n").is_err());
        assert!(CompilerConfig::from_yaml_str("malformed_supplemental: ignore\n").is_err());
    }

    #[test]
    fn load_reads_file_and_tolerates_missing() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "csv_file_name: results.csv")?;
        let cfg = CompilerConfig::load(tmp.path())?;
        assert_eq!(cfg.csv_file_name, "results.csv");

        let missing = tmp.path().with_extension("nope.yaml");
        assert_eq!(CompilerConfig::load(&missing)?, CompilerConfig::default());
        Ok(())
    }
}
