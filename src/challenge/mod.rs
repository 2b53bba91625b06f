//! Challenge engine: the closed set of challenge kinds and the contract they share.
//!
//! Every challenge answers the same questions for the host on each build:
//!   - is it solved now? (one-time transition, idempotent afterwards)
//!   - can it still be solved? (lets the host retire stale challenges)
//!   - what is it worth, and how does it render (sentence + XML element)?
//!
//! Evaluation never fails the caller: report faults are logged and read as "no".

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coverage::CoverageReportAccessor;
use crate::util::now_millis;

mod build;
mod coverage_base;
mod line_coverage;
mod test_challenge;
mod xml;

pub use build::BuildChallenge;
pub use coverage_base::CoverageBase;
pub use line_coverage::{select_line, LineCoverageChallenge};
pub use test_challenge::TestChallenge;
pub use xml::XmlElement;

/// Key under which the host passes the branch being evaluated.
pub const BRANCH_KEY: &str = "branch";

/// What the host knows at evaluation time: named parameters plus the report accessor.
pub struct EvaluationContext<'a> {
  constants: HashMap<String, String>,
  reports: &'a dyn CoverageReportAccessor,
}

impl<'a> EvaluationContext<'a> {
  pub fn new(constants: HashMap<String, String>, reports: &'a dyn CoverageReportAccessor) -> Self {
    Self { constants, reports }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.constants.get(key).map(String::as_str)
  }

  pub fn branch(&self) -> Option<&str> {
    self.get(BRANCH_KEY)
  }

  pub fn reports(&self) -> &'a dyn CoverageReportAccessor {
    self.reports
  }
}

/// Final result of a completed build, as the CI host reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
  Success,
  Unstable,
  Failure,
  NotBuilt,
  Aborted,
}

/// A test file touched since the previous build, with its author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedTest {
  pub author: String,
  pub path: String,
  /// Commit that touched the file; `None` when the host doesn't track it.
  #[serde(default)]
  pub commit: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildOutcome {
  pub result: BuildResult,
  /// Total number of tests the build ran, if the host counted them.
  #[serde(default)]
  pub test_count: Option<u32>,
  /// Test files changed since the last build. The host scopes these; test
  /// challenges additionally drop changes made in their own baseline commit.
  #[serde(default)]
  pub changed_tests: Vec<ChangedTest>,
  /// Branches that still exist in the project, if the host knows them.
  #[serde(default)]
  pub branches: Option<Vec<String>>,
}

impl BuildOutcome {
  pub fn new(result: BuildResult) -> Self {
    Self { result, test_count: None, changed_tests: Vec::new(), branches: None }
  }

  pub fn is_success(&self) -> bool {
    self.result == BuildResult::Success
  }
}

/// Whether a challenge can still be solved, as seen by one evaluation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solvability {
  Solvable,
  /// The target is gone or was covered without solving the challenge.
  Stale,
  /// Reports could not be read this pass; ask again on the next build.
  Undetermined,
}

impl Solvability {
  pub fn is_solvable(self) -> bool {
    self == Solvability::Solvable
  }

  fn from_bool(solvable: bool) -> Self {
    if solvable {
      Solvability::Solvable
    } else {
      Solvability::Stale
    }
  }
}

/// Solve time in epoch millis; 0 means unsolved. Can only be set once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolvedAt(u64);

impl SolvedAt {
  pub fn millis(self) -> u64 {
    self.0
  }

  pub fn is_solved(self) -> bool {
    self.0 != 0
  }

  /// Returns false (and changes nothing) if already solved.
  fn mark(&mut self, at: u64) -> bool {
    if self.is_solved() {
      return false;
    }
    self.0 = at.max(1);
    true
  }
}

/// Creation and solve timestamps every challenge carries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lifecycle {
  created: u64,
  solved: SolvedAt,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self { created: now_millis(), solved: SolvedAt::default() }
  }

  pub fn created(&self) -> u64 {
    self.created
  }

  pub fn solved(&self) -> u64 {
    self.solved.millis()
  }

  pub fn is_solved(&self) -> bool {
    self.solved.is_solved()
  }

  fn mark_solved(&mut self) -> bool {
    self.solved.mark(now_millis())
  }
}

impl Default for Lifecycle {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Challenge {
  Build(BuildChallenge),
  LineCoverage(LineCoverageChallenge),
  Test(TestChallenge),
}

impl Challenge {
  /// Element name used in the XML export.
  pub fn type_name(&self) -> &'static str {
    match self {
      Challenge::Build(_) => "BuildChallenge",
      Challenge::LineCoverage(_) => "LineCoverageChallenge",
      Challenge::Test(_) => "TestChallenge",
    }
  }

  pub fn is_solved(&mut self, ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    match self {
      Challenge::Build(c) => c.is_solved(ctx, outcome),
      Challenge::LineCoverage(c) => c.is_solved(ctx, outcome),
      Challenge::Test(c) => c.is_solved(ctx, outcome),
    }
  }

  /// False when stale, and also when reports were unreadable this pass.
  pub fn is_solvable(&self, ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    self.solvability(ctx, outcome).is_solvable()
  }

  /// Like `is_solvable`, but tells a stale challenge apart from a read fault.
  pub fn solvability(&self, ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> Solvability {
    match self {
      Challenge::Build(c) => Solvability::from_bool(c.is_solvable(ctx, outcome)),
      Challenge::LineCoverage(c) => c.solvability(ctx, outcome),
      Challenge::Test(c) => Solvability::from_bool(c.is_solvable(ctx, outcome)),
    }
  }

  pub fn score(&self) -> u32 {
    match self {
      Challenge::Build(c) => c.score(),
      Challenge::LineCoverage(c) => c.score(),
      Challenge::Test(c) => c.score(),
    }
  }

  fn lifecycle(&self) -> &Lifecycle {
    match self {
      Challenge::Build(c) => &c.lifecycle,
      Challenge::LineCoverage(c) => &c.base.lifecycle,
      Challenge::Test(c) => &c.lifecycle,
    }
  }

  pub fn created(&self) -> u64 {
    self.lifecycle().created()
  }

  pub fn solved(&self) -> u64 {
    self.lifecycle().solved()
  }

  /// Single self-closing element; `reason` is appended last when non-empty.
  pub fn print_to_xml(&self, reason: &str, indentation: &str) -> String {
    match self {
      Challenge::Build(c) => c.print_to_xml(reason, indentation),
      Challenge::LineCoverage(c) => c.print_to_xml(reason, indentation),
      Challenge::Test(c) => c.print_to_xml(reason, indentation),
    }
  }

  pub fn tool_tip(&self) -> Option<String> {
    match self {
      Challenge::LineCoverage(c) => Some(c.tool_tip()),
      Challenge::Build(_) | Challenge::Test(_) => None,
    }
  }
}

impl fmt::Display for Challenge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Challenge::Build(c) => fmt::Display::fmt(c, f),
      Challenge::LineCoverage(c) => fmt::Display::fmt(c, f),
      Challenge::Test(c) => fmt::Display::fmt(c, f),
    }
  }
}

impl From<BuildChallenge> for Challenge {
  fn from(c: BuildChallenge) -> Self {
    Challenge::Build(c)
  }
}

impl From<LineCoverageChallenge> for Challenge {
  fn from(c: LineCoverageChallenge) -> Self {
    Challenge::LineCoverage(c)
  }
}

impl From<TestChallenge> for Challenge {
  fn from(c: TestChallenge) -> Self {
    Challenge::Test(c)
  }
}
