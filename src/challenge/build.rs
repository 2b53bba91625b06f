//! "Keep the build green": solved by the first successful build.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{BuildOutcome, EvaluationContext, Lifecycle, XmlElement};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BuildChallenge {
  pub(super) lifecycle: Lifecycle,
}

impl BuildChallenge {
  pub fn new() -> Self {
    Self { lifecycle: Lifecycle::new() }
  }

  /// Once solved, the outcome is no longer looked at.
  pub fn is_solved(&mut self, _ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    if self.lifecycle.is_solved() {
      return true;
    }
    if !outcome.is_success() {
      return false;
    }
    self.lifecycle.mark_solved();
    info!(target: "challenge", solved = self.lifecycle.solved(), "BuildChallenge solved");
    true
  }

  /// A future build can always succeed.
  pub fn is_solvable(&self, _ctx: &EvaluationContext<'_>, _outcome: &BuildOutcome) -> bool {
    true
  }

  pub fn score(&self) -> u32 {
    1
  }

  pub fn print_to_xml(&self, reason: &str, indentation: &str) -> String {
    XmlElement::new(indentation, "BuildChallenge", self.lifecycle.created(), self.lifecycle.solved()).finish(reason)
  }
}

impl fmt::Display for BuildChallenge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Let the Build run successfully")
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::challenge::BuildResult;
  use crate::coverage::fake::FakeReports;

  fn outcome(result: BuildResult) -> BuildOutcome {
    BuildOutcome::new(result)
  }

  #[test]
  fn solves_on_first_success_and_stays_solved() {
    let reports = FakeReports::default();
    let ctx = EvaluationContext::new(HashMap::new(), &reports);
    let mut c = BuildChallenge::new();

    let seen: Vec<bool> = [BuildResult::Failure, BuildResult::Failure, BuildResult::Success]
      .into_iter()
      .map(|r| c.is_solved(&ctx, &outcome(r)))
      .collect();
    assert_eq!(seen, vec![false, false, true]);

    let solved = c.lifecycle.solved();
    assert_ne!(solved, 0);
    assert!(c.is_solved(&ctx, &outcome(BuildResult::Failure)));
    assert!(c.is_solved(&ctx, &outcome(BuildResult::Success)));
    assert_eq!(c.lifecycle.solved(), solved);
  }

  #[test]
  fn unstable_and_aborted_do_not_count() {
    let reports = FakeReports::default();
    let ctx = EvaluationContext::new(HashMap::new(), &reports);
    let mut c = BuildChallenge::new();
    assert!(!c.is_solved(&ctx, &outcome(BuildResult::Unstable)));
    assert!(!c.is_solved(&ctx, &outcome(BuildResult::Aborted)));
    assert_eq!(c.lifecycle.solved(), 0);
  }

  #[test]
  fn always_solvable_with_minimum_score() {
    let reports = FakeReports::default();
    let ctx = EvaluationContext::new(HashMap::new(), &reports);
    let c = BuildChallenge::new();
    assert!(c.is_solvable(&ctx, &outcome(BuildResult::Failure)));
    assert!(c.is_solvable(&ctx, &outcome(BuildResult::NotBuilt)));
    assert_eq!(c.score(), 1);
  }

  #[test]
  fn xml_carries_timestamps_and_optional_reason() {
    let c = BuildChallenge::new();
    let created = c.lifecycle.created();
    assert_eq!(
      c.print_to_xml("", "  "),
      format!("  <BuildChallenge created=\"{created}\" solved=\"0\"/>")
    );
    assert_eq!(
      c.print_to_xml("Not solvable", ""),
      format!("<BuildChallenge created=\"{created}\" solved=\"0\" reason=\"Not solvable\"/>")
    );
  }
}
