//! "Cover this line": a not-covered or partially-covered line picked at random.
//!
//! The target is identified by its source text, not its number: reports are
//! re-rendered on every build and unrelated edits shift line numbers. The flip
//! side is that whitespace edits to the line make the challenge stale, and
//! identical lines in one class can't be told apart.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{BuildOutcome, CoverageBase, EvaluationContext, Solvability, XmlElement};
use crate::coverage::{CoverageLine, CoverageTag};
use crate::util::trunc_for_log;

/// Class coverage (percent) from which every line is worth the top score.
const HIGH_COVERAGE_THRESHOLD: f64 = 80.0;

/// Pick uniformly among lines that are not fully covered.
pub fn select_line<'a, R: Rng + ?Sized>(lines: &'a [CoverageLine], rng: &mut R) -> Option<&'a CoverageLine> {
  let candidates: Vec<&CoverageLine> = lines
    .iter()
    .filter(|l| l.tag != CoverageTag::FullyCovered)
    .collect();
  candidates.choose(rng).copied()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineCoverageChallenge {
  pub(super) base: CoverageBase,
  line_number: u32,
  line_content: String,
  coverage_type: CoverageTag,
  #[serde(default)]
  branch_hint: Option<String>,
}

impl LineCoverageChallenge {
  /// Freeze the selected line. Fully covered lines are never valid targets.
  pub fn new(base: CoverageBase, line: &CoverageLine) -> Option<Self> {
    if line.tag == CoverageTag::FullyCovered {
      return None;
    }
    Some(Self {
      base,
      line_number: line.number,
      line_content: line.text.clone(),
      coverage_type: line.tag,
      branch_hint: line.title.clone(),
    })
  }

  pub fn base(&self) -> &CoverageBase {
    &self.base
  }

  pub fn line_number(&self) -> u32 {
    self.line_number
  }

  pub fn line_content(&self) -> &str {
    &self.line_content
  }

  pub fn coverage_type(&self) -> CoverageTag {
    self.coverage_type
  }

  /// A not-covered target is also solved by partial coverage.
  fn counts_as_covered(&self, tag: CoverageTag) -> bool {
    match tag {
      CoverageTag::FullyCovered => true,
      CoverageTag::PartiallyCovered => self.coverage_type == CoverageTag::NotCovered,
      CoverageTag::NotCovered => false,
    }
  }

  pub fn is_solved(&mut self, ctx: &EvaluationContext<'_>, _outcome: &BuildOutcome) -> bool {
    if self.base.is_solved() {
      return true;
    }
    let class = &self.base.class;
    let lines = match ctx.reports().lines(class) {
      Ok(lines) => lines,
      Err(e) => {
        warn!(target: "challenge", class = %class.class_name, error = %e, "Could not read coverage markup; treating as unsolved");
        return false;
      }
    };
    let covered = lines
      .iter()
      .any(|l| self.counts_as_covered(l.tag) && l.text == self.line_content);
    if !covered {
      return false;
    }
    let coverage = match ctx.reports().coverage_percentage(class) {
      Ok(pct) => pct,
      Err(e) => {
        warn!(target: "challenge", class = %class.class_name, error = %e, "Could not read coverage summary; treating as unsolved");
        return false;
      }
    };
    self.base.mark_solved(coverage);
    info!(
      target: "challenge",
      class = %self.base.class.class_name,
      line = self.line_number,
      content = %trunc_for_log(&self.line_content, 80),
      coverage,
      "LineCoverageChallenge solved"
    );
    true
  }

  pub fn is_solvable(&self, ctx: &EvaluationContext<'_>, outcome: &BuildOutcome) -> bool {
    self.solvability(ctx, outcome).is_solvable()
  }

  /// Stale once the target text is no longer among the incompletely covered
  /// lines. Challenges from other branches are never judged here.
  ///
  /// Unreadable reports leave the answer open for this pass only. That includes
  /// a covered target whose summary can't be read: `is_solved` declined it, and
  /// the next build gets to solve it.
  pub fn solvability(&self, ctx: &EvaluationContext<'_>, _outcome: &BuildOutcome) -> Solvability {
    if ctx.branch() != Some(self.base.branch.as_str()) {
      return Solvability::Solvable;
    }
    let class = &self.base.class;
    let lines = match ctx.reports().lines(class) {
      Ok(lines) => lines,
      Err(e) => {
        warn!(target: "challenge", class = %class.class_name, error = %e, "Could not read coverage markup; solvability undetermined");
        return Solvability::Undetermined;
      }
    };
    let tags: Vec<CoverageTag> = lines
      .iter()
      .filter(|l| l.text == self.line_content)
      .map(|l| l.tag)
      .collect();
    if tags.iter().any(|t| *t != CoverageTag::FullyCovered) {
      return Solvability::Solvable;
    }
    if tags.iter().any(|t| self.counts_as_covered(*t)) {
      if let Err(e) = ctx.reports().coverage_percentage(class) {
        warn!(target: "challenge", class = %class.class_name, error = %e, "Target covered but summary unreadable; solvability undetermined");
        return Solvability::Undetermined;
      }
    }
    Solvability::Stale
  }

  /// Judged on the coverage frozen at creation, not re-read from the current
  /// report: scoring does no I/O and a challenge's worth never changes.
  pub fn score(&self) -> u32 {
    if self.base.coverage >= HIGH_COVERAGE_THRESHOLD || self.coverage_type == CoverageTag::PartiallyCovered {
      3
    } else {
      2
    }
  }

  pub fn tool_tip(&self) -> String {
    match &self.branch_hint {
      Some(hint) => format!("Line content: {}\n{}", self.line_content, hint),
      None => format!("Line content: {}", self.line_content),
    }
  }

  pub fn print_to_xml(&self, reason: &str, indentation: &str) -> String {
    let lifecycle = &self.base.lifecycle;
    XmlElement::new(indentation, "LineCoverageChallenge", lifecycle.created(), lifecycle.solved())
      .attr("class", &self.base.class.class_name)
      .attr("line", self.line_number)
      .attr("coverage", format!("{:.2}", self.base.coverage))
      .attr("coverageAtSolved", format!("{:.2}", self.base.solved_coverage.unwrap_or(0.0)))
      .finish(reason)
  }
}

impl fmt::Display for LineCoverageChallenge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Write a test to cover line {} in class {} in package {} (created for branch {})",
      self.line_number, self.base.class.class_name, self.base.class.package_name, self.base.branch
    )
  }
}
