//! State shared by challenges anchored to one class on one branch.

use serde::{Deserialize, Serialize};

use super::Lifecycle;
use crate::coverage::{ClassDetails, CoverageError, CoverageReportAccessor};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverageBase {
  pub(super) lifecycle: Lifecycle,
  pub(super) class: ClassDetails,
  pub(super) branch: String,
  /// Class line coverage (percent) when the challenge was created.
  pub(super) coverage: f64,
  /// Class line coverage (percent) when the challenge was solved.
  pub(super) solved_coverage: Option<f64>,
}

impl CoverageBase {
  /// Reads the class's current coverage as the creation-time figure.
  pub fn new(
    class: ClassDetails,
    branch: impl Into<String>,
    reports: &dyn CoverageReportAccessor,
  ) -> Result<Self, CoverageError> {
    let coverage = reports.coverage_percentage(&class)?;
    Ok(Self::with_coverage(class, branch, coverage))
  }

  pub fn with_coverage(class: ClassDetails, branch: impl Into<String>, coverage: f64) -> Self {
    Self {
      lifecycle: Lifecycle::new(),
      class,
      branch: branch.into(),
      coverage,
      solved_coverage: None,
    }
  }

  pub fn class(&self) -> &ClassDetails {
    &self.class
  }

  pub fn branch(&self) -> &str {
    &self.branch
  }

  pub fn coverage(&self) -> f64 {
    self.coverage
  }

  pub fn solved_coverage(&self) -> Option<f64> {
    self.solved_coverage
  }

  pub fn is_solved(&self) -> bool {
    self.lifecycle.is_solved()
  }

  /// Stamps the solve time and the coverage seen at that moment, once.
  pub(super) fn mark_solved(&mut self, coverage: f64) -> bool {
    if !self.lifecycle.mark_solved() {
      return false;
    }
    self.solved_coverage = Some(coverage);
    true
  }
}
