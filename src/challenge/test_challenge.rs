//! "Write a new test": solved when the branch's test count grows and the
//! assigned user touched a test file after the commit the challenge was made on.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{BuildOutcome, EvaluationContext, Lifecycle, XmlElement};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestChallenge {
  pub(super) lifecycle: Lifecycle,
  /// Baseline: test changes made in this commit don't count.
  current_commit: String,
  test_count: u32,
  user: String,
  branch: String,
  #[serde(default)]
  test_count_solved: u32,
}

impl TestChallenge {
  pub fn new(current_commit: impl Into<String>, test_count: u32, user: impl Into<String>, branch: impl Into<String>) -> Self {
    Self {
      lifecycle: Lifecycle::new(),
      current_commit: current_commit.into(),
      test_count,
      user: user.into(),
      branch: branch.into(),
      test_count_solved: 0,
    }
  }

  pub fn user(&self) -> &str {
    &self.user
  }

  pub fn current_commit(&self) -> &str {
    &self.current_commit
  }

  /// Only evaluated on its own branch: other branches carry other test counts.
  pub fn is_solved(&mut self, ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    if self.lifecycle.is_solved() {
      return true;
    }
    if ctx.branch() != Some(self.branch.as_str()) {
      return false;
    }
    let Some(count) = outcome.test_count else {
      return false;
    };
    if count <= self.test_count {
      return false;
    }
    let authored = outcome
      .changed_tests
      .iter()
      .filter(|t| t.commit.as_deref() != Some(self.current_commit.as_str()))
      .any(|t| t.author == self.user);
    if !authored {
      return false;
    }
    self.lifecycle.mark_solved();
    self.test_count_solved = count;
    info!(target: "challenge", user = %self.user, branch = %self.branch, tests = count, "TestChallenge solved");
    true
  }

  /// Solvable while its branch exists; assumed to exist when the host doesn't say.
  pub fn is_solvable(&self, _ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    match &outcome.branches {
      Some(branches) => branches.iter().any(|b| *b == self.branch),
      None => true,
    }
  }

  pub fn score(&self) -> u32 {
    1
  }

  pub fn print_to_xml(&self, reason: &str, indentation: &str) -> String {
    XmlElement::new(indentation, "TestChallenge", self.lifecycle.created(), self.lifecycle.solved())
      .attr("tests", self.test_count)
      .attr("testsAtSolved", self.test_count_solved)
      .finish(reason)
  }
}

impl fmt::Display for TestChallenge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Write a new test in branch {}", self.branch)
  }
}
