//! Loading service configuration (project, coverage report layout, generation) from TOML.
//!
//! See `ServiceConfig` for the expected schema. Every section and key is optional.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::coverage::ClassDetails;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ServiceConfig {
  #[serde(default)]
  pub project: ProjectCfg,
  #[serde(default)]
  pub coverage: CoverageCfg,
  #[serde(default)]
  pub generation: GenerationCfg,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProjectCfg {
  pub name: String,
  /// Branch assumed when a build event doesn't name one.
  pub default_branch: String,
}

impl Default for ProjectCfg {
  fn default() -> Self {
    Self { name: "project".into(), default_branch: "main".into() }
  }
}

/// Where JaCoCo writes its report: `<results_path>/<package>/<Class><source_suffix>`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoverageCfg {
  pub results_path: PathBuf,
  pub csv_path: PathBuf,
  pub source_suffix: String,
}

impl Default for CoverageCfg {
  fn default() -> Self {
    Self {
      results_path: "target/site/jacoco".into(),
      csv_path: "target/site/jacoco/jacoco.csv".into(),
      source_suffix: ".java.html".into(),
    }
  }
}

impl CoverageCfg {
  pub fn class_details(&self, package_name: &str, class_name: &str) -> ClassDetails {
    ClassDetails::in_report(&self.results_path, &self.csv_path, &self.source_suffix, package_name, class_name)
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GenerationCfg {
  /// Fixed RNG seed for line selection; random when absent.
  #[serde(default)]
  pub seed: Option<u64>,
}

pub fn parse_config(s: &str) -> Result<ServiceConfig, toml::de::Error> {
  toml::from_str::<ServiceConfig>(s)
}

/// Attempt to load `ServiceConfig` from COVQUEST_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<ServiceConfig> {
  let path = std::env::var("COVQUEST_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "covquest", %path, "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "covquest", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "covquest", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
