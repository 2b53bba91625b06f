//! Challenge generation. Randomness is always passed in so callers (and tests)
//! decide how it is seeded.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::challenge::{select_line, BuildChallenge, Challenge, CoverageBase, LineCoverageChallenge, TestChallenge};
use crate::coverage::{ClassDetails, CoverageError, CoverageReportAccessor};

#[derive(Debug, Error)]
pub enum GenerationError {
  #[error(transparent)]
  Coverage(#[from] CoverageError),
  #[error("class {class} has no uncovered or partially covered lines")]
  NoUncoveredLines { class: String },
}

pub struct ChallengeFactory<'a> {
  reports: &'a dyn CoverageReportAccessor,
}

impl<'a> ChallengeFactory<'a> {
  pub fn new(reports: &'a dyn CoverageReportAccessor) -> Self {
    Self { reports }
  }

  /// Pick one incompletely covered line of `class` and pin it.
  #[instrument(level = "debug", skip_all, fields(class = %class.class_name, %branch))]
  pub fn generate_line_coverage<R: Rng + ?Sized>(
    &self,
    class: ClassDetails,
    branch: &str,
    rng: &mut R,
  ) -> Result<LineCoverageChallenge, GenerationError> {
    let lines = self.reports.lines(&class)?;
    let Some(line) = select_line(&lines, rng) else {
      return Err(GenerationError::NoUncoveredLines { class: class.class_name });
    };
    let line = line.clone();
    let class_name = class.class_name.clone();
    let base = CoverageBase::new(class, branch, self.reports)?;
    let challenge = LineCoverageChallenge::new(base, &line)
      .ok_or(GenerationError::NoUncoveredLines { class: class_name })?;
    info!(
      target: "challenge",
      class = %challenge.base().class().class_name,
      line = line.number,
      tag = line.tag.as_str(),
      coverage = challenge.base().coverage(),
      "Generated LineCoverageChallenge"
    );
    Ok(challenge)
  }

  pub fn generate_build(&self) -> BuildChallenge {
    debug!(target: "challenge", "Generated BuildChallenge");
    BuildChallenge::new()
  }

  pub fn generate_test(&self, commit: &str, test_count: u32, user: &str, branch: &str) -> TestChallenge {
    debug!(target: "challenge", %user, %branch, test_count, "Generated TestChallenge");
    TestChallenge::new(commit, test_count, user, branch)
  }

  /// Line challenge for the class; a fully covered class yields a build challenge instead.
  pub fn generate_for_class<R: Rng + ?Sized>(
    &self,
    class: ClassDetails,
    branch: &str,
    rng: &mut R,
  ) -> Result<Challenge, GenerationError> {
    match self.generate_line_coverage(class, branch, rng) {
      Ok(c) => Ok(c.into()),
      Err(GenerationError::NoUncoveredLines { class }) => {
        info!(target: "challenge", %class, "Class fully covered; falling back to BuildChallenge");
        Ok(self.generate_build().into())
      }
      Err(e) => Err(e),
    }
  }
}
